//! XIRR root-finding over irregularly dated cash flows.

use crate::types::{CashFlow, Rate};

pub const DEFAULT_TOLERANCE: f64 = 1e-7;
pub const DEFAULT_MAX_ITERATIONS: u32 = 200;

/// Upper-endpoint widening attempts before giving up on a sign change.
const MAX_BRACKET_EXPANSIONS: u32 = 60;

const DAYS_PER_YEAR: f64 = 365.0;

/// Net present value of `flows` discounted at annual `rate`.
///
/// The base date is the first flow in list order; callers are responsible
/// for a consistent ordering. Rates at or below -100% discount to
/// `+infinity` so the bisection bracket can never leave the valid domain.
pub fn xnpv(rate: Rate, flows: &[CashFlow]) -> f64 {
    if rate <= -1.0 {
        return f64::INFINITY;
    }
    let Some(first) = flows.first() else {
        return 0.0;
    };
    let base = first.date;
    flows
        .iter()
        .map(|cf| {
            let years = (cf.date - base).num_days() as f64 / DAYS_PER_YEAR;
            cf.amount / (1.0 + rate).powf(years)
        })
        .sum()
}

/// Annualised internal rate of return for a set of dated cash flows.
///
/// Returns `None` when no rate exists. That is a normal domain outcome for
/// degenerate flow sets (all one sign, or no sign change inside the search
/// bracket), not an error; downstream consumers render it as "NA".
pub fn xirr(flows: &[CashFlow]) -> Option<Rate> {
    xirr_with(flows, DEFAULT_TOLERANCE, DEFAULT_MAX_ITERATIONS)
}

/// [`xirr`] with explicit convergence controls.
///
/// Root-finding is bracketed bisection, never an unguarded Newton step: NPV
/// over irregular dates is not guaranteed monotone outside a bracket, and a
/// gradient step can diverge for extreme flow patterns. Bisection cannot
/// leave the bracket and the iteration cap bounds worst-case latency. When
/// the budget runs out before `|NPV| < tolerance`, the final bracket
/// midpoint is returned rather than failing; its error is bounded by half
/// the remaining bracket width.
pub fn xirr_with(flows: &[CashFlow], tolerance: f64, max_iterations: u32) -> Option<Rate> {
    let has_outflow = flows.iter().any(|cf| cf.amount < 0.0);
    let has_inflow = flows.iter().any(|cf| cf.amount > 0.0);
    if !has_outflow || !has_inflow {
        return None;
    }

    let mut low = -0.9999;
    let mut high = 1.0;
    let mut f_low = xnpv(low, flows);
    let mut f_high = xnpv(high, flows);

    // Widen the upper endpoint until the bracket straddles a root.
    let mut expansions = 0;
    while f_low * f_high > 0.0 && expansions < MAX_BRACKET_EXPANSIONS {
        high = high * 2.0 + 0.5;
        f_high = xnpv(high, flows);
        expansions += 1;
    }

    if f_low * f_high > 0.0 {
        // Last attempt: push the lower endpoint closer to -100%.
        low = -0.999999;
        f_low = xnpv(low, flows);
    }

    if f_low * f_high > 0.0 {
        return None;
    }

    for _ in 0..max_iterations {
        let mid = (low + high) / 2.0;
        let f_mid = xnpv(mid, flows);
        if f_mid.abs() < tolerance {
            return Some(mid);
        }
        if f_low * f_mid < 0.0 {
            high = mid;
        } else {
            low = mid;
            f_low = f_mid;
        }
    }

    Some((low + high) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_xirr_one_year_ten_percent() {
        // 365 days apart, so the year fraction is exactly 1.0
        let flows = vec![
            CashFlow { date: date(2021, 1, 1), amount: -100.0 },
            CashFlow { date: date(2022, 1, 1), amount: 110.0 },
        ];
        let rate = xirr(&flows).unwrap();
        assert!((rate - 0.10).abs() < 1e-6);
    }

    #[test]
    fn test_xirr_undefined_without_sign_change() {
        let flows = vec![
            CashFlow { date: date(2021, 1, 1), amount: -100.0 },
            CashFlow { date: date(2021, 6, 1), amount: -100.0 },
        ];
        assert_eq!(xirr(&flows), None);

        let flows = vec![
            CashFlow { date: date(2021, 1, 1), amount: 100.0 },
            CashFlow { date: date(2021, 6, 1), amount: 100.0 },
        ];
        assert_eq!(xirr(&flows), None);
    }

    #[test]
    fn test_xirr_empty_flows() {
        assert_eq!(xirr(&[]), None);
    }

    #[test]
    fn test_xnpv_invalid_rate_is_infinite() {
        let flows = vec![
            CashFlow { date: date(2021, 1, 1), amount: -100.0 },
            CashFlow { date: date(2022, 1, 1), amount: 110.0 },
        ];
        assert!(xnpv(-1.0, &flows).is_infinite());
        assert!(xnpv(-1.5, &flows).is_infinite());
    }

    #[test]
    fn test_xirr_deterministic() {
        let flows = vec![
            CashFlow { date: date(2019, 3, 7), amount: -2500.0 },
            CashFlow { date: date(2020, 11, 19), amount: -1000.0 },
            CashFlow { date: date(2023, 6, 30), amount: 5200.0 },
        ];
        let a = xirr(&flows).unwrap();
        let b = xirr(&flows).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_xirr_converges_for_long_monthly_series() {
        // 20 years of monthly purchases ending in a large terminal gain
        let mut flows = Vec::new();
        for m in 0..240u32 {
            let year = 2004 + (m / 12) as i32;
            let month = 1 + (m % 12);
            flows.push(CashFlow {
                date: date(year, month, 1),
                amount: -1000.0,
            });
        }
        flows.push(CashFlow {
            date: date(2023, 12, 31),
            amount: 1_000_000.0,
        });
        let rate = xirr(&flows).unwrap();
        assert!(rate > 0.0 && rate < 1.0);
    }

    #[test]
    fn test_xirr_loss_making_series_is_negative() {
        let flows = vec![
            CashFlow { date: date(2020, 1, 1), amount: -1000.0 },
            CashFlow { date: date(2021, 1, 1), amount: -1000.0 },
            CashFlow { date: date(2022, 1, 1), amount: 900.0 },
        ];
        let rate = xirr(&flows).unwrap();
        assert!(rate < 0.0);
        assert!(rate > -1.0);
    }
}
