//! CSV report adapter.
//!
//! Layout under the output directory:
//! - `<CODE>/trades.csv`, `<CODE>/equity.csv`, `<CODE>/declined.csv`
//! - `<CODE>/summary.csv` (one flat row), `<CODE>/yearly_returns.csv`
//! - `batch_summary.csv`, one row per symbol including failures

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::backtest::BacktestReport;
use crate::domain::batch::BatchOutcome;
use crate::domain::error::DcaError;
use crate::domain::lot::Trade;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::simulator::DeclinedAction;
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct TradeRow {
    date: String,
    kind: &'static str,
    side: &'static str,
    shares: f64,
    price: f64,
    amount: f64,
    commission: f64,
    resulting_cash: f64,
    realized_pnl: Option<f64>,
}

impl From<&Trade> for TradeRow {
    fn from(t: &Trade) -> Self {
        TradeRow {
            date: t.date.to_string(),
            kind: t.kind.as_str(),
            side: t.side.as_str(),
            shares: t.shares,
            price: t.price,
            amount: t.amount,
            commission: t.commission,
            resulting_cash: t.resulting_cash,
            realized_pnl: t.realized_pnl,
        }
    }
}

#[derive(Serialize)]
struct EquityRow {
    date: String,
    equity: f64,
}

#[derive(Serialize)]
struct DeclinedRow {
    date: String,
    kind: &'static str,
    side: &'static str,
    reason: String,
}

impl From<&DeclinedAction> for DeclinedRow {
    fn from(d: &DeclinedAction) -> Self {
        DeclinedRow {
            date: d.date.to_string(),
            kind: d.kind.as_str(),
            side: d.side.as_str(),
            reason: d.reason.to_string(),
        }
    }
}

#[derive(Serialize)]
struct SummaryRow {
    code: String,
    initial_capital: f64,
    final_equity: f64,
    total_return: f64,
    annualized_return: f64,
    max_drawdown: f64,
    max_drawdown_duration: usize,
    sharpe_ratio: Option<f64>,
    sortino_ratio: Option<f64>,
    accumulation_buys: usize,
    accumulation_sells: usize,
    accumulation_realized_pnl: f64,
    accumulation_cash: f64,
    accumulation_market_value: f64,
    rotation_buys: usize,
    rotation_sells: usize,
    rotation_realized_pnl: f64,
    rotation_win_rate: Option<f64>,
    rotation_cash: f64,
    rotation_market_value: f64,
    declined_actions: usize,
}

impl SummaryRow {
    fn new(code: &str, s: &PerformanceSummary) -> Self {
        SummaryRow {
            code: code.to_string(),
            initial_capital: s.initial_capital,
            final_equity: s.final_equity,
            total_return: s.total_return,
            annualized_return: s.annualized_return,
            max_drawdown: s.max_drawdown,
            max_drawdown_duration: s.max_drawdown_duration,
            sharpe_ratio: s.sharpe_ratio,
            sortino_ratio: s.sortino_ratio,
            accumulation_buys: s.accumulation.buys,
            accumulation_sells: s.accumulation.sells,
            accumulation_realized_pnl: s.accumulation.realized_pnl,
            accumulation_cash: s.accumulation.final_cash,
            accumulation_market_value: s.accumulation.market_value,
            rotation_buys: s.rotation.buys,
            rotation_sells: s.rotation.sells,
            rotation_realized_pnl: s.rotation.realized_pnl,
            rotation_win_rate: s.rotation.win_rate(),
            rotation_cash: s.rotation.final_cash,
            rotation_market_value: s.rotation.market_value,
            declined_actions: s.declined_actions,
        }
    }
}

#[derive(Serialize)]
struct YearRow {
    year: i32,
    total_return: f64,
}

#[derive(Serialize)]
struct BatchRow {
    code: String,
    status: &'static str,
    error: String,
    total_return: Option<f64>,
    annualized_return: Option<f64>,
    max_drawdown: Option<f64>,
    sharpe_ratio: Option<f64>,
    trades: Option<usize>,
    final_equity: Option<f64>,
}

impl From<&BatchOutcome> for BatchRow {
    fn from(o: &BatchOutcome) -> Self {
        match &o.result {
            Ok(report) => {
                let s = &report.summary;
                BatchRow {
                    code: o.code.clone(),
                    status: "ok",
                    error: String::new(),
                    total_return: Some(s.total_return),
                    annualized_return: Some(s.annualized_return),
                    max_drawdown: Some(s.max_drawdown),
                    sharpe_ratio: s.sharpe_ratio,
                    trades: Some(s.total_trades()),
                    final_equity: Some(s.final_equity),
                }
            }
            Err(e) => BatchRow {
                code: o.code.clone(),
                status: "error",
                error: e.to_string(),
                total_return: None,
                annualized_return: None,
                max_drawdown: None,
                sharpe_ratio: None,
                trades: None,
                final_equity: None,
            },
        }
    }
}

fn write_rows<T: Serialize>(
    path: &Path,
    rows: impl IntoIterator<Item = T>,
) -> Result<(), DcaError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &BacktestReport, output_dir: &Path) -> Result<(), DcaError> {
        let dir = output_dir.join(&report.code);
        fs::create_dir_all(&dir)?;

        write_rows(&dir.join("trades.csv"), report.trades.iter().map(TradeRow::from))?;
        write_rows(
            &dir.join("equity.csv"),
            report.equity_curve.iter().map(|p| EquityRow {
                date: p.date.to_string(),
                equity: p.equity,
            }),
        )?;
        write_rows(&dir.join("declined.csv"), report.declined.iter().map(DeclinedRow::from))?;
        write_rows(
            &dir.join("summary.csv"),
            [SummaryRow::new(&report.code, &report.summary)],
        )?;
        write_rows(
            &dir.join("yearly_returns.csv"),
            report.summary.yearly_returns.iter().map(|y| YearRow {
                year: y.year,
                total_return: y.total_return,
            }),
        )?;

        info!(code = %report.code, dir = %dir.display(), "report written");
        Ok(())
    }

    fn write_batch(&self, outcomes: &[BatchOutcome], output_dir: &Path) -> Result<(), DcaError> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join("batch_summary.csv");
        write_rows(&path, outcomes.iter().map(BatchRow::from))?;
        info!(path = %path.display(), symbols = outcomes.len(), "batch summary written");
        Ok(())
    }
}
