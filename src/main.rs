use clap::Parser;
use dcatrader::cli::{run, Cli};
use dcatrader::logging::init_logging;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    run(cli)
}
