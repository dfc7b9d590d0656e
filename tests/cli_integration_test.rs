//! CLI integration tests.
//!
//! Tests cover:
//! - INI parsing into `BacktestConfig` (build_backtest_config)
//! - validate and list-symbols commands against files on disk
//! - The backtest pipeline with `MockDataPort`
//! - End-to-end `backtest` from parsed arguments through CSV reports

mod common;

use clap::Parser;
use common::*;
use dcatrader::adapters::csv_report_adapter::CsvReportAdapter;
use dcatrader::adapters::file_config_adapter::FileConfigAdapter;
use dcatrader::cli::{self, Cli};
use dcatrader::domain::config::Schedule;
use dcatrader::domain::error::DcaError;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ExitCode has no PartialEq; compare the Debug rendering instead.
fn assert_exit(actual: ExitCode, expected: u8) {
    assert_eq!(
        format!("{actual:?}"),
        format!("{:?}", ExitCode::from(expected)),
    );
}

fn write_csv(dir: &Path, code: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    fs::write(dir.join(format!("{code}.csv")), content).unwrap();
}

const FULL_INI: &str = r#"
[backtest]
start_date = 2020-01-01
end_date = 2024-12-31
codes = 510300,159915
risk_free_rate = 0.02

[capital]
accumulation = 70000
rotation = 30000

[indicators]
macd_fast = 5
macd_slow = 12
macd_signal = 4
band_window = 30
band_upper_quantile = 0.9
band_lower_quantile = 0.1
volume_window = 10
volume_surge_ratio = 2.0
volume_shrink_ratio = 0.5
valuation_window = 120
atr_period = 14

[accumulation]
amount = 2000
schedule = weekly
weekday = wed
cheap_percentile = 0.1
cheap_multiplier = 2.0
overheat_percentile = 0.9
rich_multiplier = 0.25
half_profit = 0.2
full_profit = 0.4
max_partial_reductions = 2

[rotation]
amount = 3000
confirmations = 3
stop_loss = 0.08
take_profit = 0.15

[execution]
commission_rate = 0.0003
min_commission = 5
slippage_rate = 0.001
lot_size = 100
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(FULL_INI).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();

        assert_eq!(config.start_date, date(2020, 1, 1));
        assert_eq!(config.end_date, date(2024, 12, 31));
        assert!((config.risk_free_rate - 0.02).abs() < f64::EPSILON);
        assert!((config.capital.accumulation - 70_000.0).abs() < f64::EPSILON);
        assert!((config.capital.rotation - 30_000.0).abs() < f64::EPSILON);

        assert_eq!(config.indicators.macd_fast, 5);
        assert_eq!(config.indicators.macd_slow, 12);
        assert_eq!(config.indicators.macd_signal, 4);
        assert_eq!(config.indicators.band_window, 30);
        assert!((config.indicators.band_upper_quantile - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.indicators.volume_window, 10);
        assert_eq!(config.indicators.valuation_window, 120);
        assert_eq!(config.indicators.atr_period, 14);

        assert!((config.accumulation.amount - 2000.0).abs() < f64::EPSILON);
        assert_eq!(
            config.accumulation.schedule,
            Schedule::Weekly(chrono::Weekday::Wed)
        );
        assert_eq!(config.accumulation.max_partial_reductions, 2);

        assert_eq!(config.rotation.confirmations, 3);
        assert!((config.rotation.take_profit - 0.15).abs() < f64::EPSILON);

        assert_eq!(config.execution.lot_size, 100);
        assert!((config.execution.min_commission - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn build_backtest_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ncodes = X\n").unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();
        let defaults = dcatrader::domain::config::BacktestConfig::default();
        assert_eq!(config, defaults);
    }

    #[test]
    fn build_backtest_config_invalid_date_format() {
        let ini = "[backtest]\nstart_date = 2020/01/01\nend_date = 2024-12-31\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, DcaError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn build_backtest_config_rejects_reversed_dates() {
        let ini = "[backtest]\nstart_date = 2024-01-01\nend_date = 2020-01-01\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        assert!(cli::build_backtest_config(&adapter).unwrap_err().is_config());
    }

    #[test]
    fn build_backtest_config_rejects_out_of_range_values() {
        let ini = "[rotation]\nstop_loss = 1.5\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, DcaError::ConfigInvalid { section, .. } if section == "rotation"));
    }

    #[test]
    fn malformed_numbers_are_rejected_not_defaulted() {
        for (ini, bad_key) in [
            ("[rotation]\nstop_loss = 5%\n", "stop_loss"),
            ("[indicators]\nband_window = twenty\n", "band_window"),
            ("[capital]\naccumulation = 70,000\n", "accumulation"),
            ("[execution]\nlot_size = 1e2\n", "lot_size"),
        ] {
            let adapter = FileConfigAdapter::from_string(ini).unwrap();
            let err = cli::build_backtest_config(&adapter).unwrap_err();
            assert!(
                matches!(&err, DcaError::ConfigInvalid { key, .. } if key == bad_key),
                "{ini:?} gave {err}"
            );
        }
    }

    #[test]
    fn nan_full_profit_is_rejected() {
        let ini = "[accumulation]\nfull_profit = nan\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, DcaError::ConfigInvalid { key, .. } if key == "full_profit"));
    }
}

mod commands {
    use super::*;

    #[test]
    fn validate_valid_config_succeeds() {
        let file = write_temp_ini(FULL_INI);
        assert_exit(cli::run_validate(file.path()), 0);
    }

    #[test]
    fn validate_missing_file_is_config_error() {
        assert_exit(cli::run_validate(Path::new("/nonexistent/path/config.ini")), 2);
    }

    #[test]
    fn validate_bad_codes_is_config_error() {
        let file = write_temp_ini("[backtest]\ncodes = A,,B\n");
        assert_exit(cli::run_validate(file.path()), 2);
    }

    #[test]
    fn validate_malformed_number_is_config_error() {
        let file = write_temp_ini("[rotation]\nstop_loss = 5%\n");
        assert_exit(cli::run_validate(file.path()), 2);
    }

    #[test]
    fn list_symbols_reads_data_dir() {
        let data = tempfile::TempDir::new().unwrap();
        write_csv(data.path(), "510300", &wave_bars(date(2024, 1, 1), 5, 4.0));
        let ini = format!("[backtest]\ndata_dir = {}\n", data.path().display());
        let file = write_temp_ini(&ini);
        assert_exit(cli::run_list_symbols(file.path()), 0);
    }

    #[test]
    fn list_symbols_missing_dir_is_provider_error() {
        let file = write_temp_ini("[backtest]\ndata_dir = /nonexistent/data/dir\n");
        assert_exit(cli::run_list_symbols(file.path()), 3);
    }
}

mod pipeline_mock {
    use super::*;

    #[test]
    fn pipeline_writes_reports() {
        let port = MockDataPort::new()
            .with_bars("AAA", wave_bars(date(2023, 1, 2), 120, 10.0))
            .with_bars("BBB", wave_bars(date(2023, 1, 2), 120, 25.0));
        let out = tempfile::TempDir::new().unwrap();
        let codes = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];

        let exit = cli::run_backtest_pipeline(
            &port,
            &CsvReportAdapter::new(),
            &short_window_config(),
            &codes,
            out.path(),
        );

        assert_exit(exit, 0);
        assert!(out.path().join("AAA").join("trades.csv").is_file());
        assert!(out.path().join("BBB").join("summary.csv").is_file());
        assert!(!out.path().join("CCC").exists());

        let batch = fs::read_to_string(out.path().join("batch_summary.csv")).unwrap();
        assert_eq!(batch.lines().count(), 4);
        assert!(batch.contains("CCC,error"));
    }

    #[test]
    fn pipeline_all_failed_returns_first_error_code() {
        let port = MockDataPort::new().with_error("AAA", "timeout");
        let out = tempfile::TempDir::new().unwrap();
        let exit = cli::run_backtest_pipeline(
            &port,
            &CsvReportAdapter::new(),
            &short_window_config(),
            &["AAA".to_string()],
            out.path(),
        );
        assert_exit(exit, 3);
    }
}

mod end_to_end {
    use super::*;

    #[test]
    fn backtest_command_from_arguments() {
        let data = tempfile::TempDir::new().unwrap();
        let out = tempfile::TempDir::new().unwrap();
        write_csv(data.path(), "510300", &wave_bars(date(2023, 1, 2), 150, 4.0));
        write_csv(data.path(), "159915", &wave_bars(date(2023, 1, 2), 150, 2.5));

        let ini = format!(
            "[backtest]\ndata_dir = {}\n\n[indicators]\nmacd_fast = 3\nmacd_slow = 6\n\
             macd_signal = 3\nband_window = 5\nvolume_window = 5\nvaluation_window = 10\n\n\
             [accumulation]\nschedule = daily\n",
            data.path().display()
        );
        let file = write_temp_ini(&ini);

        let cli = Cli::try_parse_from([
            "dcatrader".to_string(),
            "backtest".to_string(),
            "-c".to_string(),
            file.path().display().to_string(),
            "-o".to_string(),
            out.path().display().to_string(),
        ])
        .unwrap();
        assert_exit(cli::run(cli), 0);

        for code in ["510300", "159915"] {
            let equity = fs::read_to_string(out.path().join(code).join("equity.csv")).unwrap();
            assert_eq!(equity.lines().count(), 151);
        }
        let batch = fs::read_to_string(out.path().join("batch_summary.csv")).unwrap();
        // list_symbols order
        let codes: Vec<&str> = batch
            .lines()
            .skip(1)
            .filter_map(|l| l.split(',').next())
            .collect();
        assert_eq!(codes, ["159915", "510300"]);
    }

    #[test]
    fn code_override_limits_the_run() {
        let data = tempfile::TempDir::new().unwrap();
        let out = tempfile::TempDir::new().unwrap();
        write_csv(data.path(), "510300", &wave_bars(date(2023, 1, 2), 40, 4.0));
        write_csv(data.path(), "159915", &wave_bars(date(2023, 1, 2), 40, 2.5));
        let ini = format!(
            "[backtest]\ndata_dir = {}\noutput_dir = {}\ncodes = 510300,159915\n",
            data.path().display(),
            out.path().display()
        );
        let file = write_temp_ini(&ini);

        let cli = Cli::try_parse_from([
            "dcatrader".to_string(),
            "backtest".to_string(),
            "-c".to_string(),
            file.path().display().to_string(),
            "--code".to_string(),
            "159915".to_string(),
        ])
        .unwrap();
        assert_exit(cli::run(cli), 0);

        assert!(out.path().join("159915").is_dir());
        assert!(!out.path().join("510300").exists());
    }
}
