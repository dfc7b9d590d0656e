//! Performance statistics over a finished backtest.
//!
//! Degenerate inputs never panic: an empty or single-point curve gives zero
//! returns and `None` for the risk-adjusted ratios, as does a flat curve.

use chrono::Datelike;

use super::config::CapitalConfig;
use super::ledger::PositionLedger;
use super::lot::{Kind, Side, Trade};
use super::simulator::{BacktestResult, EquityPoint};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

/// Per-book totals.
#[derive(Debug, Clone, PartialEq)]
pub struct BookSummary {
    pub buys: usize,
    pub sells: usize,
    pub winning_sells: usize,
    pub realized_pnl: f64,
    pub commission: f64,
    pub final_cash: f64,
    pub open_shares: f64,
    /// Open shares valued at the last close.
    pub market_value: f64,
}

impl BookSummary {
    fn compute(kind: Kind, ledger: &PositionLedger, last_close: f64) -> Self {
        let trades: Vec<&Trade> = ledger.trades().iter().filter(|t| t.kind == kind).collect();
        let sells: Vec<&&Trade> = trades.iter().filter(|t| t.side == Side::Sell).collect();
        BookSummary {
            buys: trades.len() - sells.len(),
            sells: sells.len(),
            winning_sells: sells
                .iter()
                .filter(|t| t.realized_pnl.is_some_and(|p| p > 0.0))
                .count(),
            realized_pnl: ledger.realized_pnl(kind),
            commission: trades.iter().map(|t| t.commission).sum(),
            final_cash: ledger.cash(kind),
            open_shares: ledger.open_shares(kind),
            market_value: ledger.market_value(kind, last_close),
        }
    }

    pub fn win_rate(&self) -> Option<f64> {
        (self.sells > 0).then(|| self.winning_sells as f64 / self.sells as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearReturn {
    pub year: i32,
    pub total_return: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    /// Largest peak-to-trough decline as a fraction of the peak.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub accumulation: BookSummary,
    pub rotation: BookSummary,
    pub declined_actions: usize,
    pub yearly_returns: Vec<YearReturn>,
}

impl PerformanceSummary {
    pub fn compute(result: &BacktestResult, capital: &CapitalConfig, risk_free_rate: f64) -> Self {
        let curve = &result.equity_curve;
        let initial_capital = capital.total();

        let final_equity = curve.last().map(|p| p.equity).unwrap_or(initial_capital);
        let total_return = if initial_capital > 0.0 {
            final_equity / initial_capital - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(curve);
        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(curve, daily_rf);

        let last_close = result.last_close.unwrap_or(0.0);

        PerformanceSummary {
            initial_capital,
            final_equity,
            total_return,
            annualized_return: annualize(total_return, curve),
            max_drawdown,
            max_drawdown_duration,
            sharpe_ratio,
            sortino_ratio,
            accumulation: BookSummary::compute(Kind::Accumulation, &result.ledger, last_close),
            rotation: BookSummary::compute(Kind::Rotation, &result.ledger, last_close),
            declined_actions: result.declined.len(),
            yearly_returns: compute_yearly_returns(curve, initial_capital),
        }
    }

    pub fn total_trades(&self) -> usize {
        self.accumulation.buys + self.accumulation.sells + self.rotation.buys + self.rotation.sells
    }
}

/// Geometric annualization over the calendar span of the curve.
fn annualize(total_return: f64, curve: &[EquityPoint]) -> f64 {
    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return 0.0;
    };
    let days = (last.date - first.date).num_days();
    if days <= 0 || !total_return.is_finite() {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(CALENDAR_DAYS_PER_YEAR / days as f64) - 1.0
}

fn compute_drawdown(curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut duration = 0usize;

    for point in curve {
        if point.equity >= peak {
            peak = point.equity;
            duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            duration += 1;
            max_duration = max_duration.max(duration);
        }
    }

    (max_dd, max_duration)
}

fn compute_risk_adjusted(curve: &[EquityPoint], daily_rf: f64) -> (Option<f64>, Option<f64>) {
    if curve.len() < 2 {
        return (None, None);
    }

    let returns: Vec<f64> = curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let excess = mean - daily_rf;

    let sharpe = (stddev > 0.0).then(|| excess / stddev * TRADING_DAYS_PER_YEAR.sqrt());

    let downside = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum::<f64>()
        / n;
    let downside_stddev = downside.sqrt();
    let sortino =
        (downside_stddev > 0.0).then(|| excess / downside_stddev * TRADING_DAYS_PER_YEAR.sqrt());

    (sharpe, sortino)
}

/// Return per calendar year, each measured from the previous year's closing
/// equity (the starting capital for the first year).
fn compute_yearly_returns(curve: &[EquityPoint], initial_capital: f64) -> Vec<YearReturn> {
    let mut years = Vec::new();
    let mut base = initial_capital;
    let mut i = 0;

    while i < curve.len() {
        let year = curve[i].date.year();
        let mut end = curve[i].equity;
        while i < curve.len() && curve[i].date.year() == year {
            end = curve[i].equity;
            i += 1;
        }
        let total_return = if base > 0.0 { end / base - 1.0 } else { 0.0 };
        years.push(YearReturn { year, total_return });
        base = end;
    }

    years
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::ExecutionConfig;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_equity_curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                equity: v,
            })
            .collect()
    }

    fn capital(total: f64) -> CapitalConfig {
        CapitalConfig {
            accumulation: total,
            rotation: 0.0,
        }
    }

    fn make_result(values: &[f64]) -> BacktestResult {
        BacktestResult {
            ledger: PositionLedger::new(&capital(values[0]), ExecutionConfig::default()),
            equity_curve: make_equity_curve(values),
            declined: Vec::new(),
            last_close: Some(100.0),
        }
    }

    #[test]
    fn total_return() {
        let summary = PerformanceSummary::compute(
            &make_result(&[100_000.0, 110_000.0]),
            &capital(100_000.0),
            0.0,
        );
        assert_relative_eq!(summary.total_return, 0.10, epsilon = 1e-12);

        let summary = PerformanceSummary::compute(
            &make_result(&[100_000.0, 90_000.0]),
            &capital(100_000.0),
            0.0,
        );
        assert_relative_eq!(summary.total_return, -0.10, epsilon = 1e-12);
    }

    #[test]
    fn single_point_curve_is_degenerate() {
        let summary =
            PerformanceSummary::compute(&make_result(&[100_000.0]), &capital(100_000.0), 0.05);
        assert_eq!(summary.total_return, 0.0);
        assert_eq!(summary.annualized_return, 0.0);
        assert_eq!(summary.max_drawdown, 0.0);
        assert_eq!(summary.sharpe_ratio, None);
        assert_eq!(summary.sortino_ratio, None);
    }

    #[test]
    fn empty_curve_is_degenerate() {
        let result = BacktestResult {
            ledger: PositionLedger::new(&capital(1_000.0), ExecutionConfig::default()),
            equity_curve: Vec::new(),
            declined: Vec::new(),
            last_close: None,
        };
        let summary = PerformanceSummary::compute(&result, &capital(1_000.0), 0.0);
        assert_eq!(summary.final_equity, 1_000.0);
        assert_eq!(summary.total_return, 0.0);
        assert!(summary.yearly_returns.is_empty());
    }

    #[test]
    fn flat_curve_has_no_ratio() {
        let summary = PerformanceSummary::compute(
            &make_result(&[100.0, 100.0, 100.0]),
            &capital(100.0),
            0.0,
        );
        assert_eq!(summary.sharpe_ratio, None);
    }

    #[test]
    fn annualized_uses_calendar_span() {
        let curve = vec![
            EquityPoint {
                date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                equity: 100.0,
            },
            EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                equity: 110.0,
            },
        ];
        assert_relative_eq!(annualize(0.10, &curve), 0.10, epsilon = 1e-12);

        let two_years = vec![
            curve[0].clone(),
            EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                equity: 121.0,
            },
        ];
        // 730 days
        assert_relative_eq!(annualize(0.21, &two_years), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn max_drawdown() {
        let curve = make_equity_curve(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]);
        let (dd, _) = compute_drawdown(&curve);
        assert_relative_eq!(dd, (110.0 - 80.0) / 110.0);
    }

    #[test]
    fn max_drawdown_duration() {
        let curve = make_equity_curve(&[100.0, 110.0, 100.0, 90.0, 85.0, 95.0]);
        let (_, duration) = compute_drawdown(&curve);
        assert_eq!(duration, 4);
    }

    #[test]
    fn sharpe_ratio_positive() {
        let values: Vec<f64> = (0..253).map(|i| 100_000.0 * (1.0 + 0.001 * i as f64)).collect();
        let curve = make_equity_curve(&values);
        let (sharpe, sortino) = compute_risk_adjusted(&curve, 0.0);
        assert!(sharpe.unwrap() > 0.0);
        // never a down day
        assert_eq!(sortino, None);
    }

    #[test]
    fn sortino_ratio_finite() {
        let curve = make_equity_curve(&[100.0, 101.0, 100.5, 101.5, 100.0, 102.0]);
        let (sharpe, sortino) = compute_risk_adjusted(&curve, 0.0);
        assert!(sharpe.unwrap().is_finite());
        assert!(sortino.unwrap().is_finite());
    }

    #[test]
    fn yearly_returns_chain() {
        let curve = vec![
            EquityPoint {
                date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
                equity: 100.0,
            },
            EquityPoint {
                date: NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(),
                equity: 110.0,
            },
            EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                equity: 99.0,
            },
        ];
        let years = compute_yearly_returns(&curve, 100.0);
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2023);
        assert_relative_eq!(years[0].total_return, 0.10, epsilon = 1e-12);
        assert_eq!(years[1].year, 2024);
        assert_relative_eq!(years[1].total_return, -0.10, epsilon = 1e-12);
    }

    #[test]
    fn book_summary_counts_per_kind() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut ledger = PositionLedger::new(
            &CapitalConfig {
                accumulation: 10_000.0,
                rotation: 10_000.0,
            },
            ExecutionConfig::default(),
        );
        ledger.buy(day, Kind::Accumulation, 10.0, 100.0).unwrap();
        ledger.buy(day, Kind::Rotation, 10.0, 100.0).unwrap();
        ledger.sell(day, Kind::Rotation, 10.0, 110.0).unwrap();

        let result = BacktestResult {
            ledger,
            equity_curve: make_equity_curve(&[20_000.0, 20_200.0]),
            declined: Vec::new(),
            last_close: Some(120.0),
        };
        let summary = PerformanceSummary::compute(
            &result,
            &CapitalConfig {
                accumulation: 10_000.0,
                rotation: 10_000.0,
            },
            0.0,
        );

        assert_eq!(summary.accumulation.buys, 1);
        assert_eq!(summary.accumulation.sells, 0);
        assert_relative_eq!(summary.accumulation.market_value, 1_200.0);
        assert_eq!(summary.accumulation.win_rate(), None);
        assert_eq!(summary.rotation.sells, 1);
        assert_relative_eq!(summary.rotation.realized_pnl, 100.0);
        assert_relative_eq!(summary.rotation.final_cash, 10_100.0);
        assert_eq!(summary.rotation.win_rate(), Some(1.0));
        assert_eq!(summary.total_trades(), 3);
    }
}
