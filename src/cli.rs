//! CLI definition and dispatch.

use chrono::{NaiveDate, Weekday};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::batch::{run_batch, BatchOutcome};
use crate::domain::config::{
    AccumulationConfig, BacktestConfig, CapitalConfig, ExecutionConfig, IndicatorConfig,
    RotationConfig, Schedule,
};
use crate::domain::error::DcaError;
use crate::domain::universe::resolve_codes;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "dcatrader", about = "Accumulation and rotation backtester")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest for one or more symbols
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated codes, overriding [backtest] codes
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            code,
            output,
        } => run_backtest(&config, code.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { config, code } => run_info(&config, code.as_deref()),
    }
}

fn fail(err: &DcaError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, DcaError> {
    FileConfigAdapter::from_file(path)
}

fn parse_date(
    adapter: &dyn ConfigPort,
    key: &str,
    default: NaiveDate,
) -> Result<NaiveDate, DcaError> {
    match adapter.get_string("backtest", key) {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            DcaError::invalid(
                "backtest",
                key,
                "invalid date format (expected YYYY-MM-DD)",
            )
        }),
        None => Ok(default),
    }
}

fn get_usize(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, DcaError> {
    let value = adapter.get_int(section, key, default as i64)?;
    usize::try_from(value).map_err(|_| DcaError::invalid(section, key, "must not be negative"))
}

fn get_u32(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: u32,
) -> Result<u32, DcaError> {
    let value = adapter.get_int(section, key, i64::from(default))?;
    u32::try_from(value).map_err(|_| DcaError::invalid(section, key, "out of range"))
}

fn parse_schedule(adapter: &dyn ConfigPort, default: Schedule) -> Result<Schedule, DcaError> {
    let kind = adapter.get_string("accumulation", "schedule");
    let weekday = adapter.get_string("accumulation", "weekday");

    let parse_weekday = |s: &str| {
        s.trim().parse::<Weekday>().map_err(|_| {
            DcaError::invalid("accumulation", "weekday", format!("unknown weekday {s:?}"))
        })
    };

    match kind.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
        Some(k) if k == "daily" => Ok(Schedule::Daily),
        Some(k) if k == "weekly" => match weekday {
            Some(day) => Ok(Schedule::Weekly(parse_weekday(day.as_str())?)),
            None => Ok(match default {
                Schedule::Weekly(day) => Schedule::Weekly(day),
                Schedule::Daily => Schedule::Weekly(Weekday::Mon),
            }),
        },
        Some(other) => Err(DcaError::invalid(
            "accumulation",
            "schedule",
            format!("expected daily or weekly, got {other:?}"),
        )),
        None => match (default, weekday) {
            (Schedule::Weekly(_), Some(day)) => Ok(Schedule::Weekly(parse_weekday(day.as_str())?)),
            (schedule, _) => Ok(schedule),
        },
    }
}

/// Read every section into a [`BacktestConfig`]. Missing keys keep their
/// defaults; the result is validated before it is returned.
pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, DcaError> {
    let defaults = BacktestConfig::default();
    let ind = IndicatorConfig::default();
    let acc = AccumulationConfig::default();
    let rot = RotationConfig::default();
    let exe = ExecutionConfig::default();
    let cap = CapitalConfig::default();

    let config = BacktestConfig {
        start_date: parse_date(adapter, "start_date", defaults.start_date)?,
        end_date: parse_date(adapter, "end_date", defaults.end_date)?,
        capital: CapitalConfig {
            accumulation: adapter.get_double("capital", "accumulation", cap.accumulation)?,
            rotation: adapter.get_double("capital", "rotation", cap.rotation)?,
        },
        indicators: IndicatorConfig {
            macd_fast: get_usize(adapter, "indicators", "macd_fast", ind.macd_fast)?,
            macd_slow: get_usize(adapter, "indicators", "macd_slow", ind.macd_slow)?,
            macd_signal: get_usize(adapter, "indicators", "macd_signal", ind.macd_signal)?,
            band_window: get_usize(adapter, "indicators", "band_window", ind.band_window)?,
            band_upper_quantile: adapter.get_double(
                "indicators",
                "band_upper_quantile",
                ind.band_upper_quantile,
            )?,
            band_lower_quantile: adapter.get_double(
                "indicators",
                "band_lower_quantile",
                ind.band_lower_quantile,
            )?,
            volume_window: get_usize(adapter, "indicators", "volume_window", ind.volume_window)?,
            volume_surge_ratio: adapter.get_double(
                "indicators",
                "volume_surge_ratio",
                ind.volume_surge_ratio,
            )?,
            volume_shrink_ratio: adapter.get_double(
                "indicators",
                "volume_shrink_ratio",
                ind.volume_shrink_ratio,
            )?,
            valuation_window: get_usize(
                adapter,
                "indicators",
                "valuation_window",
                ind.valuation_window,
            )?,
            atr_period: get_usize(adapter, "indicators", "atr_period", ind.atr_period)?,
        },
        accumulation: AccumulationConfig {
            amount: adapter.get_double("accumulation", "amount", acc.amount)?,
            schedule: parse_schedule(adapter, acc.schedule)?,
            cheap_percentile: adapter.get_double(
                "accumulation",
                "cheap_percentile",
                acc.cheap_percentile,
            )?,
            cheap_multiplier: adapter.get_double(
                "accumulation",
                "cheap_multiplier",
                acc.cheap_multiplier,
            )?,
            overheat_percentile: adapter.get_double(
                "accumulation",
                "overheat_percentile",
                acc.overheat_percentile,
            )?,
            rich_multiplier: adapter.get_double(
                "accumulation",
                "rich_multiplier",
                acc.rich_multiplier,
            )?,
            half_profit: adapter.get_double("accumulation", "half_profit", acc.half_profit)?,
            full_profit: adapter.get_double("accumulation", "full_profit", acc.full_profit)?,
            max_partial_reductions: get_u32(
                adapter,
                "accumulation",
                "max_partial_reductions",
                acc.max_partial_reductions,
            )?,
        },
        rotation: RotationConfig {
            amount: adapter.get_double("rotation", "amount", rot.amount)?,
            confirmations: get_usize(adapter, "rotation", "confirmations", rot.confirmations)?,
            stop_loss: adapter.get_double("rotation", "stop_loss", rot.stop_loss)?,
            take_profit: adapter.get_double("rotation", "take_profit", rot.take_profit)?,
        },
        execution: ExecutionConfig {
            commission_rate: adapter.get_double(
                "execution",
                "commission_rate",
                exe.commission_rate,
            )?,
            min_commission: adapter.get_double("execution", "min_commission", exe.min_commission)?,
            slippage_rate: adapter.get_double("execution", "slippage_rate", exe.slippage_rate)?,
            lot_size: get_u32(adapter, "execution", "lot_size", exe.lot_size)?,
        },
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", defaults.risk_free_rate)?,
    };

    config.validate()?;
    Ok(config)
}

pub fn data_dir(adapter: &dyn ConfigPort) -> PathBuf {
    adapter
        .get_string("backtest", "data_dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn output_dir(adapter: &dyn ConfigPort, output_override: Option<&Path>) -> PathBuf {
    output_override
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("backtest", "output_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("reports"))
}

fn run_backtest(
    config_path: &Path,
    code_override: Option<&str>,
    output_override: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let data_port = CsvAdapter::new(data_dir(&adapter));
    let configured = adapter.get_string("backtest", "codes");
    let codes = match resolve_codes(code_override, configured.as_deref(), &data_port) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    run_backtest_pipeline(
        &data_port,
        &CsvReportAdapter::new(),
        &config,
        &codes,
        &output_dir(&adapter, output_override),
    )
}

/// Run `codes` in parallel, print a console summary and write reports.
///
/// Succeeds when at least one symbol produced a report. When every symbol
/// failed the exit code of the first failure is returned.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    config: &BacktestConfig,
    codes: &[String],
    output_dir: &Path,
) -> ExitCode {
    eprintln!("Running backtest: {} codes", codes.len());

    let outcomes = match run_batch(data_port, codes, config, None) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    print_summary(&outcomes);

    for report in outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
        if let Err(e) = report_port.write(report, output_dir) {
            return fail(&e);
        }
    }
    if let Err(e) = report_port.write_batch(&outcomes, output_dir) {
        return fail(&e);
    }
    eprintln!("\nReports written to: {}", output_dir.display());

    match outcomes.iter().find_map(|o| o.result.as_ref().err()) {
        Some(e) if !outcomes.iter().any(BatchOutcome::is_ok) => e.into(),
        _ => ExitCode::SUCCESS,
    }
}

fn print_summary(outcomes: &[BatchOutcome]) {
    eprintln!("\n=== Results ===");
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => {
                let s = &report.summary;
                let sharpe = s
                    .sharpe_ratio
                    .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
                eprintln!(
                    "  {}:  {:.2}% total, {:.2}% annualized, -{:.1}% max dd, sharpe {}, {} trades",
                    outcome.code,
                    s.total_return * 100.0,
                    s.annualized_return * 100.0,
                    s.max_drawdown * 100.0,
                    sharpe,
                    s.total_trades(),
                );
            }
            Err(e) => eprintln!("  {}:  failed ({e})", outcome.code),
        }
    }
}

pub fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    if let Some(codes) = adapter.get_string("backtest", "codes") {
        match crate::domain::universe::parse_codes(&codes) {
            Ok(parsed) => eprintln!("  codes: {}", parsed.join(", ")),
            Err(e) => return fail(&DcaError::from(e)),
        }
    }
    eprintln!(
        "  capital: {:.0} accumulation / {:.0} rotation",
        config.capital.accumulation, config.capital.rotation
    );
    eprintln!("  warm-up: {} bars", config.indicators.warmup_bars());

    info!("configuration valid");
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

pub fn run_list_symbols(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let dir = data_dir(&adapter);
    let symbols = match CsvAdapter::new(dir.clone()).list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", dir.display());
    } else {
        for symbol in &symbols {
            println!("{symbol}");
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

pub fn run_info(config_path: &Path, code: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let data_port = CsvAdapter::new(data_dir(&adapter));
    let configured = adapter.get_string("backtest", "codes");
    let codes = match resolve_codes(code, configured.as_deref(), &data_port) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    for c in &codes {
        match data_port.get_data_range(c) {
            Ok(Some((first, last, count))) => {
                println!("{c}: {count} bars, {first} to {last}");
            }
            Ok(None) => eprintln!("{c}: no data found"),
            Err(e) => eprintln!("error querying {c}: {e}"),
        }
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backtest_subcommand() {
        let cli = Cli::try_parse_from([
            "dcatrader",
            "--log-level",
            "debug",
            "backtest",
            "-c",
            "cfg.ini",
            "--code",
            "510300",
            "-o",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Command::Backtest {
                config,
                code,
                output,
            } => {
                assert_eq!(config, PathBuf::from("cfg.ini"));
                assert_eq!(code.as_deref(), Some("510300"));
                assert_eq!(output, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn log_level_defaults_to_info() {
        let cli = Cli::try_parse_from(["dcatrader", "validate", "-c", "cfg.ini"]).unwrap();
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn schedule_parsing() {
        let adapter =
            FileConfigAdapter::from_string("[accumulation]\nschedule = weekly\nweekday = fri\n")
                .unwrap();
        assert_eq!(
            parse_schedule(&adapter, Schedule::Weekly(Weekday::Mon)).unwrap(),
            Schedule::Weekly(Weekday::Fri)
        );

        let adapter = FileConfigAdapter::from_string("[accumulation]\nschedule = Daily\n").unwrap();
        assert_eq!(
            parse_schedule(&adapter, Schedule::Weekly(Weekday::Mon)).unwrap(),
            Schedule::Daily
        );

        let adapter =
            FileConfigAdapter::from_string("[accumulation]\nschedule = monthly\n").unwrap();
        assert!(parse_schedule(&adapter, Schedule::Daily)
            .unwrap_err()
            .is_config());
    }

    #[test]
    fn negative_window_is_invalid() {
        let adapter = FileConfigAdapter::from_string("[indicators]\nband_window = -3\n").unwrap();
        let err = build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, DcaError::ConfigInvalid { key, .. } if key == "band_window"));
    }
}
