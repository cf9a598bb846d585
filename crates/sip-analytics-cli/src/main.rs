mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::report::ReportArgs;
use commands::rolling::RollingArgs;
use commands::sip::SipArgs;

/// SIP analytics over index price histories
#[derive(Parser)]
#[command(
    name = "sipa",
    version,
    about = "Monthly SIP simulation and rolling XIRR analytics",
    long_about = "Simulates a fixed monthly systematic investment plan over a daily \
                  index price history, computes money-weighted annualised returns \
                  (XIRR) over the full history and over rolling windows, and renders \
                  Markdown valuation reports."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a monthly SIP and compute the whole-history XIRR
    Sip(SipArgs),
    /// Rolling SIP XIRR over trailing windows with summary statistics
    Rolling(RollingArgs),
    /// Write a full Markdown valuation report
    Report(ReportArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Sip(args) => commands::sip::run_sip(args),
        Commands::Rolling(args) => commands::rolling::run_rolling(args),
        Commands::Report(args) => commands::report::run_report(args),
        Commands::Version => {
            println!("sipa {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
