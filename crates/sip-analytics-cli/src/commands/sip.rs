use clap::Args;
use serde_json::Value;

use sip_analytics_core::accumulator::{self, SipInput};

use crate::input;

/// Arguments for the SIP simulation
#[derive(Args)]
pub struct SipArgs {
    /// Path to the price history CSV
    #[arg(long)]
    pub csv: Option<String>,

    /// Path to a JSON SipInput file (overrides --csv)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly SIP amount
    #[arg(long, default_value = "1000")]
    pub amount: f64,
}

pub fn run_sip(args: SipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sip_input = load_sip_input(&args)?;
    let result = accumulator::calculate_sip(&sip_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Shared input resolution for the sip and rolling commands: JSON file,
/// piped stdin, then CSV with flag-level amount.
pub fn load_sip_input(args: &SipArgs) -> Result<SipInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_json(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    if let Some(ref path) = args.csv {
        return Ok(SipInput {
            prices: input::prices::read_csv(path)?,
            monthly_amount: args.amount,
        });
    }
    Err("--csv <prices.csv>, --input <file.json> or piped stdin required".into())
}
