//! Open lots and executed trades.

use std::fmt;

use chrono::NaiveDate;

/// Which sub-account a lot or trade belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Long-horizon DCA book.
    Accumulation,
    /// Short-horizon T-trade book.
    Rotation,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Accumulation => "accumulation",
            Kind::Rotation => "rotation",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub open_date: NaiveDate,
    pub kind: Kind,
    pub shares: f64,
    /// Fill price plus buy commission spread over the shares.
    pub cost_basis: f64,
}

impl Lot {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn cost(&self) -> f64 {
        self.shares * self.cost_basis
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares * (price - self.cost_basis)
    }

    /// Gain (positive) or loss (negative) as a fraction of cost basis.
    pub fn return_pct(&self, price: f64) -> f64 {
        price / self.cost_basis - 1.0
    }

    pub fn should_stop_loss(&self, price: f64, stop_loss: f64) -> bool {
        if stop_loss == 0.0 {
            return false;
        }
        -self.return_pct(price) > stop_loss
    }

    pub fn should_take_profit(&self, price: f64, take_profit: f64) -> bool {
        if take_profit == 0.0 {
            return false;
        }
        self.return_pct(price) >= take_profit
    }
}

/// One execution. Appended to the ledger's log, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub kind: Kind,
    pub side: Side,
    pub shares: f64,
    /// Fill price after slippage.
    pub price: f64,
    /// shares * price, before commission.
    pub amount: f64,
    pub commission: f64,
    /// Cash left in this kind's pool after the trade.
    pub resulting_cash: f64,
    /// Net P&L of the lots a sell closed; `None` for buys.
    pub realized_pnl: Option<f64>,
}

impl Trade {
    /// Shares added to (+) or removed from (-) the kind's open total.
    pub fn signed_shares(&self) -> f64 {
        match self.side {
            Side::Buy => self.shares,
            Side::Sell => -self.shares,
        }
    }
}
