//! Rolling SIP return windows over the monthly record sequence.
//!
//! Each window re-prices the SIP as if it had started at the window's first
//! month: one purchase per record inside the window plus a terminal
//! valuation at the window's last month-end. The terminal value counts only
//! units bought inside the window; units carried in from earlier months are
//! excluded from both legs.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::accumulator::MonthlyRecord;
use crate::error::SipError;
use crate::solver;
use crate::types::*;
use crate::SipResult;

/// Horizons reported by default, in years
pub const DEFAULT_HORIZONS_YEARS: [u32; 6] = [1, 3, 5, 7, 10, 15];

/// Input for rolling return evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingInput {
    /// Monthly records produced by the accumulator, in month order
    pub records: Vec<MonthlyRecord>,
    /// Fixed amount invested each month, matching the accumulator run
    pub monthly_amount: f64,
    /// Window lengths in years; defaults to 1/3/5/7/10/15
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizons_years: Option<Vec<u32>>,
}

/// Rolling rate series for one horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingSeries {
    pub horizon_years: u32,
    /// One slot per record index; `None` means insufficient history at that
    /// index or no rate found for the window
    pub rates: Vec<Option<Rate>>,
    pub summary: RollingSummary,
}

/// Mean/min/max over the defined rates of one horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingSummary {
    pub mean: Option<Rate>,
    pub min: Option<Rate>,
    pub max: Option<Rate>,
}

/// Output of rolling return evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingOutput {
    pub horizons: Vec<RollingSeries>,
}

/// Evaluate rolling SIP returns for every record index and horizon.
pub fn calculate_rolling(input: &RollingInput) -> SipResult<ComputationOutput<RollingOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if !input.monthly_amount.is_finite() || input.monthly_amount <= 0.0 {
        return Err(SipError::InvalidInput {
            field: "monthly_amount".into(),
            reason: "must be a positive amount".into(),
        });
    }

    let horizons = input
        .horizons_years
        .clone()
        .unwrap_or_else(|| DEFAULT_HORIZONS_YEARS.to_vec());
    if horizons.iter().any(|&h| h == 0) {
        return Err(SipError::InvalidInput {
            field: "horizons_years".into(),
            reason: "horizons must be positive".into(),
        });
    }

    if input.records.is_empty() {
        warnings.push("no monthly records; every horizon series is empty".into());
    }

    let series: Vec<RollingSeries> = horizons
        .iter()
        .map(|&h| {
            let months = (12 * h) as usize;
            let rates = horizon_series(&input.records, months, input.monthly_amount);
            let summary = summarise(&rates);
            RollingSeries {
                horizon_years: h,
                rates,
                summary,
            }
        })
        .collect();

    let assumptions = serde_json::json!({
        "monthly_amount": input.monthly_amount,
        "horizons_years": horizons,
        "months": input.records.len(),
    });

    Ok(with_metadata(
        "Rolling SIP XIRR over trailing monthly windows",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        RollingOutput { horizons: series },
    ))
}

/// One rate slot per record index for a single horizon.
///
/// Window computations are independent and read-only over `records`, and
/// results land in per-index slots, so the parallel and sequential paths
/// produce identical output.
fn horizon_series(records: &[MonthlyRecord], months: usize, monthly_amount: f64) -> Vec<Option<Rate>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..records.len())
            .into_par_iter()
            .map(|i| window_rate(records, i, months, monthly_amount))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..records.len())
            .map(|i| window_rate(records, i, months, monthly_amount))
            .collect()
    }
}

/// XIRR of the trailing `months`-long window ending at `index`, or `None`
/// when there is not enough history.
fn window_rate(
    records: &[MonthlyRecord],
    index: usize,
    months: usize,
    monthly_amount: f64,
) -> Option<Rate> {
    let start = (index + 1).checked_sub(months)?;
    let window = &records[start..=index];

    let mut flows: Vec<CashFlow> = window
        .iter()
        .map(|r| CashFlow {
            date: r.sip_date,
            amount: -monthly_amount,
        })
        .collect();

    let window_units: f64 = window.iter().map(|r| r.units_bought).sum();
    let last = &records[index];
    flows.push(CashFlow {
        date: last.month_end,
        amount: window_units * last.month_end_nav,
    });

    solver::xirr(&flows)
}

fn summarise(rates: &[Option<Rate>]) -> RollingSummary {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for rate in rates.iter().flatten() {
        count += 1;
        sum += rate;
        min = min.min(*rate);
        max = max.max(*rate);
    }
    if count == 0 {
        return RollingSummary {
            mean: None,
            min: None,
            max: None,
        };
    }
    RollingSummary {
        mean: Some(sum / count as f64),
        min: Some(min),
        max: Some(max),
    }
}
