use clap::Args;
use serde_json::{json, Value};
use std::fs;

use sip_analytics_core::accumulator::{self, SipInput};
use sip_analytics_core::rolling::{self, RollingInput};

use crate::input;
use crate::output::markdown;

/// Arguments for the Markdown valuation report
#[derive(Args)]
pub struct ReportArgs {
    /// Path to the price history CSV
    #[arg(long)]
    pub csv: String,

    /// Path to write the Markdown report to
    #[arg(long)]
    pub out: String,

    /// Index label shown in the report header
    #[arg(long, default_value = "Index SIP")]
    pub title: String,

    /// Monthly SIP amount
    #[arg(long, default_value = "1000")]
    pub amount: f64,

    /// Window lengths in years (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub horizons: Option<Vec<u32>>,
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sip_input = SipInput {
        prices: input::prices::read_csv(&args.csv)?,
        monthly_amount: args.amount,
    };
    let sip = accumulator::calculate_sip(&sip_input)?;

    let rolling_input = RollingInput {
        records: sip.result.records.clone(),
        monthly_amount: args.amount,
        horizons_years: args.horizons,
    };
    let rolling = rolling::calculate_rolling(&rolling_input)?;

    let report = markdown::render_report(&args.title, args.amount, &sip.result, &rolling.result);
    fs::write(&args.out, report)
        .map_err(|e| format!("Failed to write '{}': {}", args.out, e))?;

    Ok(json!({
        "written": args.out,
        "months": sip.result.records.len(),
        "valuation_date": sip.result.valuation_date,
        "final_value": sip.result.final_value,
        "xirr": sip.result.xirr,
    }))
}
