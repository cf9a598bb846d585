use clap::Args;
use serde_json::Value;

use sip_analytics_core::accumulator;
use sip_analytics_core::rolling::{self, RollingInput};

use super::sip::{load_sip_input, SipArgs};

/// Arguments for rolling return evaluation
#[derive(Args)]
pub struct RollingArgs {
    #[command(flatten)]
    pub sip: SipArgs,

    /// Window lengths in years (comma-separated, e.g. "1,3,5")
    #[arg(long, value_delimiter = ',')]
    pub horizons: Option<Vec<u32>>,
}

pub fn run_rolling(args: RollingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sip_input = load_sip_input(&args.sip)?;
    let sip = accumulator::calculate_sip(&sip_input)?;

    let rolling_input = RollingInput {
        records: sip.result.records,
        monthly_amount: sip_input.monthly_amount,
        horizons_years: args.horizons,
    };
    let result = rolling::calculate_rolling(&rolling_input)?;
    Ok(serde_json::to_value(result)?)
}
