//! The authoritative cash-and-position state of one backtest.
//!
//! Two cash pools, two FIFO lot books and the trade log. The pools never
//! share cash: a buy of one kind draws only from its own pool and a sell
//! credits only its own pool. Requests the ledger cannot honour come back as
//! [`Rejected`] and leave every field untouched.

use std::collections::VecDeque;

use chrono::NaiveDate;

use super::config::{CapitalConfig, ExecutionConfig};
use super::execution::calculate_commission;
use super::lot::{Kind, Lot, Side, Trade};

/// Float slack when comparing cash and share totals.
const TOLERANCE: f64 = 1e-9;

/// Why the ledger declined a request. A capacity outcome, not an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejected {
    #[error("buy costs {required:.2} but {kind} pool holds {available:.2}")]
    InsufficientCash {
        kind: Kind,
        required: f64,
        available: f64,
    },

    #[error("sell of {requested} shares exceeds {open} open {kind} shares")]
    InsufficientShares {
        kind: Kind,
        requested: f64,
        open: f64,
    },

    #[error("commission {commission:.2} exceeds sale proceeds {gross:.2}")]
    CommissionExceedsProceeds { gross: f64, commission: f64 },

    #[error("order has no shares")]
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Book {
    cash: f64,
    lots: VecDeque<Lot>,
    realized_pnl: f64,
}

impl Book {
    fn open_shares(&self) -> f64 {
        self.lots.iter().map(|l| l.shares).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionLedger {
    accumulation: Book,
    rotation: Book,
    /// Filled half-tier reductions since the last full reduction or flat book.
    partial_reductions: u32,
    trades: Vec<Trade>,
    execution: ExecutionConfig,
}

impl PositionLedger {
    pub fn new(capital: &CapitalConfig, execution: ExecutionConfig) -> Self {
        PositionLedger {
            accumulation: Book {
                cash: capital.accumulation,
                ..Book::default()
            },
            rotation: Book {
                cash: capital.rotation,
                ..Book::default()
            },
            partial_reductions: 0,
            trades: Vec::new(),
            execution,
        }
    }

    fn book(&self, kind: Kind) -> &Book {
        match kind {
            Kind::Accumulation => &self.accumulation,
            Kind::Rotation => &self.rotation,
        }
    }

    fn book_mut(&mut self, kind: Kind) -> &mut Book {
        match kind {
            Kind::Accumulation => &mut self.accumulation,
            Kind::Rotation => &mut self.rotation,
        }
    }

    pub fn cash(&self, kind: Kind) -> f64 {
        self.book(kind).cash
    }

    /// Open lots of `kind`, oldest first.
    pub fn lots(&self, kind: Kind) -> impl Iterator<Item = &Lot> {
        self.book(kind).lots.iter()
    }

    pub fn open_shares(&self, kind: Kind) -> f64 {
        self.book(kind).open_shares()
    }

    pub fn has_open(&self, kind: Kind) -> bool {
        !self.book(kind).lots.is_empty()
    }

    pub fn realized_pnl(&self, kind: Kind) -> f64 {
        self.book(kind).realized_pnl
    }

    pub fn partial_reductions(&self) -> u32 {
        self.partial_reductions
    }

    /// Count one filled half-tier reduction.
    pub fn record_partial_reduction(&mut self) {
        self.partial_reductions += 1;
    }

    /// A filled top-tier reduction starts the count over, even when a lot
    /// bought on the same bar is still open.
    pub fn reset_partial_reductions(&mut self) {
        self.partial_reductions = 0;
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn market_value(&self, kind: Kind, price: f64) -> f64 {
        self.lots(kind).map(|l| l.market_value(price)).sum()
    }

    /// Unrealized return of the whole `kind` book at `price`, measured
    /// against total cost basis. `None` when the book is flat.
    pub fn unrealized_return(&self, kind: Kind, price: f64) -> Option<f64> {
        let cost: f64 = self.lots(kind).map(Lot::cost).sum();
        if cost <= 0.0 {
            return None;
        }
        Some(self.market_value(kind, price) / cost - 1.0)
    }

    /// Both pools plus every open lot valued at `price`. Read-only.
    pub fn mark_to_market(&self, price: f64) -> f64 {
        self.accumulation.cash
            + self.rotation.cash
            + self.market_value(Kind::Accumulation, price)
            + self.market_value(Kind::Rotation, price)
    }

    pub fn buy(
        &mut self,
        date: NaiveDate,
        kind: Kind,
        shares: f64,
        price: f64,
    ) -> Result<Trade, Rejected> {
        if shares <= 0.0 || !shares.is_finite() {
            return Err(Rejected::Empty);
        }
        let amount = shares * price;
        let commission = calculate_commission(amount, &self.execution);
        let required = amount + commission;

        let book = self.book_mut(kind);
        if required > book.cash + TOLERANCE {
            return Err(Rejected::InsufficientCash {
                kind,
                required,
                available: book.cash,
            });
        }

        book.cash = (book.cash - required).max(0.0);
        book.lots.push_back(Lot {
            open_date: date,
            kind,
            shares,
            cost_basis: required / shares,
        });

        let trade = Trade {
            date,
            kind,
            side: Side::Buy,
            shares,
            price,
            amount,
            commission,
            resulting_cash: book.cash,
            realized_pnl: None,
        };
        self.trades.push(trade.clone());
        Ok(trade)
    }

    /// Close `shares` of `kind`, oldest lots first.
    pub fn sell(
        &mut self,
        date: NaiveDate,
        kind: Kind,
        shares: f64,
        price: f64,
    ) -> Result<Trade, Rejected> {
        if shares <= 0.0 || !shares.is_finite() {
            return Err(Rejected::Empty);
        }
        let open = self.open_shares(kind);
        if shares > open + TOLERANCE {
            return Err(Rejected::InsufficientShares {
                kind,
                requested: shares,
                open,
            });
        }
        let amount = shares * price;
        let commission = calculate_commission(amount, &self.execution);
        if commission > amount {
            return Err(Rejected::CommissionExceedsProceeds {
                gross: amount,
                commission,
            });
        }

        let book = self.book_mut(kind);
        let mut remaining = shares;
        let mut gross_pnl = 0.0;
        while remaining > TOLERANCE {
            let Some(lot) = book.lots.front_mut() else {
                break;
            };
            let closed = remaining.min(lot.shares);
            gross_pnl += (price - lot.cost_basis) * closed;
            lot.shares -= closed;
            remaining -= closed;
            if lot.shares <= TOLERANCE {
                book.lots.pop_front();
            }
        }

        let realized = gross_pnl - commission;
        book.cash += amount - commission;
        book.realized_pnl += realized;
        let resulting_cash = book.cash;
        let flat = book.lots.is_empty();

        if kind == Kind::Accumulation && flat {
            self.partial_reductions = 0;
        }

        let trade = Trade {
            date,
            kind,
            side: Side::Sell,
            shares,
            price,
            amount,
            commission,
            resulting_cash,
            realized_pnl: Some(realized),
        };
        self.trades.push(trade.clone());
        Ok(trade)
    }
}
