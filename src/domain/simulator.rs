//! Bar-by-bar backtest driver.
//!
//! Per bar, in order:
//! 1. evaluate signals against the ledger as it stood at the start of the bar
//! 2. accumulation buy, then accumulation reduction
//! 3. rotation buy, then rotation close
//! 4. record mark-to-market equity
//!
//! Sells size off the shares open at the start of the bar, and FIFO matching
//! means they never touch a lot bought on the same bar. Lots still open after
//! the last bar stay open.

use chrono::NaiveDate;
use tracing::debug;

use super::config::{
    AccumulationConfig, BacktestConfig, CapitalConfig, ExecutionConfig, RotationConfig,
};
use super::execution::{atr_factor, size_buy, size_sell};
use super::indicator::IndicatorSet;
use super::ledger::{PositionLedger, Rejected};
use super::lot::{Kind, Side, Trade};
use super::signal::{ReduceTier, SignalEvaluator};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// A signal that fired but could not be executed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclinedAction {
    pub date: NaiveDate,
    pub kind: Kind,
    pub side: Side,
    pub reason: Rejected,
}

/// Frozen end state of one simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub ledger: PositionLedger,
    pub equity_curve: Vec<EquityPoint>,
    pub declined: Vec<DeclinedAction>,
    /// Close of the final bar; open lots are valued at it.
    pub last_close: Option<f64>,
}

impl BacktestResult {
    pub fn trades(&self) -> &[Trade] {
        self.ledger.trades()
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionSimulator {
    capital: CapitalConfig,
    accumulation: AccumulationConfig,
    rotation: RotationConfig,
    execution: ExecutionConfig,
    evaluator: SignalEvaluator,
}

impl ExecutionSimulator {
    pub fn new(config: &BacktestConfig) -> Self {
        ExecutionSimulator {
            capital: config.capital.clone(),
            accumulation: config.accumulation.clone(),
            rotation: config.rotation.clone(),
            execution: config.execution.clone(),
            evaluator: SignalEvaluator::new(config.accumulation.clone(), config.rotation.clone()),
        }
    }

    pub fn run(&self, sets: &[IndicatorSet]) -> BacktestResult {
        let mut ledger = PositionLedger::new(&self.capital, self.execution.clone());
        let mut equity_curve = Vec::with_capacity(sets.len());
        let mut declined = Vec::new();

        for set in sets {
            let signals = self.evaluator.evaluate(set, &ledger);
            let opening_accumulation = ledger.open_shares(Kind::Accumulation);
            let opening_rotation = ledger.open_shares(Kind::Rotation);

            if signals.start_or_continue_accumulation {
                let amount = self.accumulation_amount(set);
                self.buy(&mut ledger, &mut declined, set, Kind::Accumulation, amount);
            }

            let tier = signals.reduce_accumulation;
            if tier != ReduceTier::None {
                let filled = self.sell(
                    &mut ledger,
                    &mut declined,
                    set,
                    Kind::Accumulation,
                    opening_accumulation,
                    tier.fraction(),
                );
                match tier {
                    ReduceTier::Half if filled => ledger.record_partial_reduction(),
                    ReduceTier::Full if filled => ledger.reset_partial_reductions(),
                    _ => {}
                }
            }

            if signals.add_rotation {
                let amount = self.rotation.amount * atr_factor(set.atr_ratio());
                self.buy(&mut ledger, &mut declined, set, Kind::Rotation, amount);
            }

            if signals.close_rotation {
                self.sell(
                    &mut ledger,
                    &mut declined,
                    set,
                    Kind::Rotation,
                    opening_rotation,
                    1.0,
                );
            }

            equity_curve.push(EquityPoint {
                date: set.date,
                equity: ledger.mark_to_market(set.close),
            });
        }

        BacktestResult {
            ledger,
            equity_curve,
            declined,
            last_close: sets.last().map(|s| s.close),
        }
    }

    /// Base amount scaled by valuation (cheap buys more, rich buys less) and
    /// by volatility when ATR is enabled.
    fn accumulation_amount(&self, set: &IndicatorSet) -> f64 {
        let cfg = &self.accumulation;
        let valuation = match set.valuation.ready() {
            Some(p) if p < cfg.cheap_percentile => cfg.cheap_multiplier,
            Some(p) if p > cfg.overheat_percentile => cfg.rich_multiplier,
            _ => 1.0,
        };
        cfg.amount * valuation * atr_factor(set.atr_ratio())
    }

    fn buy(
        &self,
        ledger: &mut PositionLedger,
        declined: &mut Vec<DeclinedAction>,
        set: &IndicatorSet,
        kind: Kind,
        amount: f64,
    ) {
        let available = ledger.cash(kind);
        let outcome = if available < amount {
            Err(Rejected::InsufficientCash {
                kind,
                required: amount,
                available,
            })
        } else {
            match size_buy(amount, set.close, &self.execution) {
                Some(fill) => ledger.buy(set.date, kind, fill.shares, fill.price),
                None => Err(Rejected::Empty),
            }
        };
        record(declined, set.date, kind, Side::Buy, outcome);
    }

    fn sell(
        &self,
        ledger: &mut PositionLedger,
        declined: &mut Vec<DeclinedAction>,
        set: &IndicatorSet,
        kind: Kind,
        open_shares: f64,
        fraction: f64,
    ) -> bool {
        let outcome = match size_sell(open_shares, fraction, set.close, &self.execution) {
            Some(fill) => ledger.sell(set.date, kind, fill.shares, fill.price),
            None => Err(Rejected::Empty),
        };
        record(declined, set.date, kind, Side::Sell, outcome)
    }
}

fn record(
    declined: &mut Vec<DeclinedAction>,
    date: NaiveDate,
    kind: Kind,
    side: Side,
    outcome: Result<Trade, Rejected>,
) -> bool {
    match outcome {
        Ok(trade) => {
            debug!(
                %date,
                %kind,
                %side,
                shares = trade.shares,
                price = trade.price,
                cash = trade.resulting_cash,
                "filled"
            );
            true
        }
        Err(reason) => {
            debug!(%date, %kind, %side, %reason, "declined");
            declined.push(DeclinedAction {
                date,
                kind,
                side,
                reason,
            });
            false
        }
    }
}
