//! Per-bar trading signals.
//!
//! A pure function of one [`IndicatorSet`] and a read-only view of the ledger
//! as it stood at the start of the bar. While any input is still warming up
//! every signal is false.

use super::config::{AccumulationConfig, RotationConfig};
use super::indicator::IndicatorSet;
use super::ledger::PositionLedger;
use super::lot::Kind;

/// How much of the accumulation book to sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReduceTier {
    #[default]
    None,
    Half,
    Full,
}

impl ReduceTier {
    pub fn fraction(&self) -> f64 {
        match self {
            ReduceTier::None => 0.0,
            ReduceTier::Half => 0.5,
            ReduceTier::Full => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalBundle {
    pub start_or_continue_accumulation: bool,
    pub reduce_accumulation: ReduceTier,
    pub add_rotation: bool,
    pub close_rotation: bool,
    /// Some open rotation lot has lost more than the stop-loss fraction.
    pub stop_loss_triggered: bool,
    /// Some open rotation lot has gained at least the take-profit fraction.
    pub take_profit_triggered: bool,
}

#[derive(Debug, Clone)]
pub struct SignalEvaluator {
    accumulation: AccumulationConfig,
    rotation: RotationConfig,
}

impl SignalEvaluator {
    pub fn new(accumulation: AccumulationConfig, rotation: RotationConfig) -> Self {
        SignalEvaluator {
            accumulation,
            rotation,
        }
    }

    pub fn evaluate(&self, set: &IndicatorSet, ledger: &PositionLedger) -> SignalBundle {
        if !set.is_ready() {
            return SignalBundle::default();
        }
        let (Some(lower), Some(upper), Some(down_on_surge), Some(volume), Some(valuation)) = (
            set.in_lower_band(),
            set.in_upper_band(),
            set.price_down_on_surge(),
            set.volume.ready(),
            set.valuation.ready(),
        ) else {
            return SignalBundle::default();
        };

        let stop_loss_triggered = ledger
            .lots(Kind::Rotation)
            .any(|lot| lot.should_stop_loss(set.close, self.rotation.stop_loss));
        let take_profit_triggered = ledger
            .lots(Kind::Rotation)
            .any(|lot| lot.should_take_profit(set.close, self.rotation.take_profit));

        SignalBundle {
            start_or_continue_accumulation: self.accumulation_due(set, ledger, lower),
            reduce_accumulation: self.reduce_tier(set, ledger, valuation),
            add_rotation: self.rotation_confirmations(ledger, lower, down_on_surge)
                >= self.rotation.confirmations,
            close_rotation: ledger.has_open(Kind::Rotation)
                && ((upper && volume.surge) || stop_loss_triggered || take_profit_triggered),
            stop_loss_triggered,
            take_profit_triggered,
        }
    }

    /// Entry on a lower-band excursion; afterwards the schedule keeps buying
    /// while the book is open.
    fn accumulation_due(&self, set: &IndicatorSet, ledger: &PositionLedger, lower: bool) -> bool {
        lower
            || (ledger.has_open(Kind::Accumulation) && self.accumulation.schedule.is_due(set.date))
    }

    fn reduce_tier(
        &self,
        set: &IndicatorSet,
        ledger: &PositionLedger,
        valuation: f64,
    ) -> ReduceTier {
        let Some(profit) = ledger.unrealized_return(Kind::Accumulation, set.close) else {
            return ReduceTier::None;
        };
        let cfg = &self.accumulation;

        if profit >= cfg.full_profit {
            ReduceTier::Full
        } else if profit > cfg.half_profit
            && valuation > cfg.overheat_percentile
            && ledger.partial_reductions() < cfg.max_partial_reductions
        {
            ReduceTier::Half
        } else {
            ReduceTier::None
        }
    }

    fn rotation_confirmations(
        &self,
        ledger: &PositionLedger,
        lower: bool,
        down_on_surge: bool,
    ) -> usize {
        [down_on_surge, lower, !ledger.has_open(Kind::Rotation)]
            .into_iter()
            .filter(|&c| c)
            .count()
    }
}
