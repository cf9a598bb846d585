//! Monthly SIP simulation over a daily price series.
//!
//! Walks the sorted series in a single forward pass, buying a fixed amount
//! of units on the first observed trading date of each calendar month and
//! marking the position at each month's last observed close.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SipError;
use crate::solver;
use crate::types::*;
use crate::SipResult;

/// Input for a monthly SIP simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipInput {
    /// Price observations; stable-sorted ascending by date before use
    pub prices: Vec<PricePoint>,
    /// Fixed amount invested on the first trading day of each month
    pub monthly_amount: f64,
}

/// One row per calendar month present in the price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub month_start: NaiveDate,
    /// Last observed trading date within the month
    pub month_end: NaiveDate,
    /// Date of the month's purchase (first observed trading date)
    pub sip_date: NaiveDate,
    pub cumulative_invested: f64,
    pub cumulative_units: f64,
    pub month_end_nav: f64,
    /// Always `cumulative_units * month_end_nav`, unrounded
    pub portfolio_value: f64,
    /// Money-weighted return of all purchases so far, valued at month end
    pub xirr_to_date: Option<Rate>,
    /// Price paid for this month's purchase
    pub sip_nav: f64,
    pub units_bought: f64,
}

/// Result of walking the full price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipOutput {
    pub records: Vec<MonthlyRecord>,
    /// Every purchase outflow plus one terminal valuation inflow at the
    /// last price point, in date order
    pub cashflows: Vec<CashFlow>,
    pub valuation_date: NaiveDate,
    pub final_value: f64,
    /// Money-weighted annualised return over the whole history
    pub xirr: Option<Rate>,
}

/// Purchase and month-end state for the month currently being scanned.
struct OpenMonth {
    year: i32,
    month: u32,
    sip_date: NaiveDate,
    sip_nav: f64,
    units_bought: f64,
    last_date: NaiveDate,
    last_nav: f64,
}

impl OpenMonth {
    fn begin(point: &PricePoint, units: f64) -> Self {
        OpenMonth {
            year: point.date.year(),
            month: point.date.month(),
            sip_date: point.date,
            sip_nav: point.close,
            units_bought: units,
            last_date: point.date,
            last_nav: point.close,
        }
    }

    fn covers(&self, date: NaiveDate) -> bool {
        self.year == date.year() && self.month == date.month()
    }
}

/// Simulate a monthly SIP over `prices`, which must already be sorted
/// ascending by date.
///
/// A month's record is only materialized once every price point inside it
/// has been observed, so `month_end_nav` is always that month's last close;
/// a month with a single observation marks at its purchase price. An empty
/// series yields empty outputs with a zero-value sentinel valuation dated
/// today; callers must branch on emptiness before interpreting the
/// sentinel.
pub fn accumulate(prices: &[PricePoint], monthly_amount: f64) -> SipResult<SipOutput> {
    if !monthly_amount.is_finite() || monthly_amount <= 0.0 {
        return Err(SipError::InvalidInput {
            field: "monthly_amount".into(),
            reason: "must be a positive amount".into(),
        });
    }

    let mut records: Vec<MonthlyRecord> = Vec::new();
    let mut cashflows: Vec<CashFlow> = Vec::new();
    // Purchase outflows only, reused for each month's xirr_to_date
    let mut purchases: Vec<CashFlow> = Vec::new();
    let mut cumulative_units = 0.0;
    let mut cumulative_invested = 0.0;
    let mut open: Option<OpenMonth> = None;

    for point in prices {
        if let Some(month) = open.as_mut() {
            if month.covers(point.date) {
                month.last_date = point.date;
                month.last_nav = point.close;
                continue;
            }
        }

        // Crossing into a new month: emit the completed record first
        if let Some(finished) = open.take() {
            records.push(close_month(
                &finished,
                cumulative_invested,
                cumulative_units,
                &purchases,
            ));
        }

        // First trading date of the new month: execute the purchase
        let units = monthly_amount / point.close;
        cumulative_units += units;
        cumulative_invested += monthly_amount;
        let outflow = CashFlow {
            date: point.date,
            amount: -monthly_amount,
        };
        cashflows.push(outflow);
        purchases.push(outflow);
        open = Some(OpenMonth::begin(point, units));
    }

    let Some(finished) = open else {
        return Ok(SipOutput {
            records,
            cashflows,
            valuation_date: Utc::now().date_naive(),
            final_value: 0.0,
            xirr: None,
        });
    };
    let valuation_date = finished.last_date;
    let final_value = cumulative_units * finished.last_nav;
    records.push(close_month(
        &finished,
        cumulative_invested,
        cumulative_units,
        &purchases,
    ));

    // Terminal valuation inflow at the last available price point
    cashflows.push(CashFlow {
        date: valuation_date,
        amount: final_value,
    });
    let xirr = solver::xirr(&cashflows);

    Ok(SipOutput {
        records,
        cashflows,
        valuation_date,
        final_value,
        xirr,
    })
}

fn close_month(
    month: &OpenMonth,
    cumulative_invested: f64,
    cumulative_units: f64,
    purchases: &[CashFlow],
) -> MonthlyRecord {
    let portfolio_value = cumulative_units * month.last_nav;
    let mut flows = purchases.to_vec();
    flows.push(CashFlow {
        date: month.last_date,
        amount: portfolio_value,
    });
    let xirr_to_date = solver::xirr(&flows);

    MonthlyRecord {
        month_start: month.sip_date.with_day(1).unwrap_or(month.sip_date),
        month_end: month.last_date,
        sip_date: month.sip_date,
        cumulative_invested,
        cumulative_units,
        month_end_nav: month.last_nav,
        portfolio_value,
        xirr_to_date,
        sip_nav: month.sip_nav,
        units_bought: month.units_bought,
    }
}

/// Envelope-wrapped entry point used by the CLI: stable-sorts a copy of the
/// input prices, runs [`accumulate`] and attaches methodology metadata.
pub fn calculate_sip(input: &SipInput) -> SipResult<ComputationOutput<SipOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut prices = input.prices.clone();
    prices.sort_by_key(|p| p.date);

    let output = accumulate(&prices, input.monthly_amount)?;
    if output.records.is_empty() {
        warnings.push("price series is empty; outputs are empty".into());
    }

    let assumptions = serde_json::json!({
        "monthly_amount": input.monthly_amount,
        "observations": prices.len(),
        "day_count": "act/365f",
    });

    Ok(with_metadata(
        "Monthly SIP accumulation with money-weighted return (XIRR, bracketed bisection)",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(y: i32, m: u32, d: u32, close: f64) -> PricePoint {
        PricePoint { date: date(y, m, d), close }
    }

    fn flat_series(months: u32, close: f64) -> Vec<PricePoint> {
        (0..months)
            .map(|i| point(2020 + (i / 12) as i32, 1 + i % 12, 1, close))
            .collect()
    }

    #[test]
    fn test_empty_series_yields_sentinel() {
        let out = accumulate(&[], 1000.0).unwrap();
        assert!(out.records.is_empty());
        assert!(out.cashflows.is_empty());
        assert_eq!(out.final_value, 0.0);
        assert_eq!(out.xirr, None);
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let prices = flat_series(3, 100.0);
        assert!(accumulate(&prices, 0.0).is_err());
        assert!(accumulate(&prices, -500.0).is_err());
    }

    #[test]
    fn test_uniform_price_units_and_flat_return() {
        let prices = flat_series(6, 250.0);
        let out = accumulate(&prices, 1000.0).unwrap();

        assert_eq!(out.records.len(), 6);
        let expected_units = 6.0 * 1000.0 / 250.0;
        let last = out.records.last().unwrap();
        assert!((last.cumulative_units - expected_units).abs() < 1e-9);
        assert!((out.final_value - 6000.0).abs() < 1e-9);
        // Valuation price equals every purchase price, so the rate is ~0%
        assert!(out.xirr.unwrap().abs() < 1e-4);
    }

    #[test]
    fn test_cumulative_fields_are_monotone() {
        let prices = vec![
            point(2021, 1, 4, 100.0),
            point(2021, 1, 28, 110.0),
            point(2021, 2, 1, 120.0),
            point(2021, 2, 25, 115.0),
            point(2021, 3, 2, 90.0),
        ];
        let out = accumulate(&prices, 1000.0).unwrap();
        for pair in out.records.windows(2) {
            assert!(pair[1].cumulative_invested >= pair[0].cumulative_invested);
            assert!(pair[1].cumulative_units >= pair[0].cumulative_units);
        }
    }

    #[test]
    fn test_one_purchase_per_month_at_first_trading_date() {
        let prices = vec![
            point(2021, 1, 4, 100.0),
            point(2021, 1, 28, 110.0),
            point(2021, 2, 1, 120.0),
            point(2021, 2, 25, 115.0),
        ];
        let out = accumulate(&prices, 1000.0).unwrap();

        assert_eq!(out.records.len(), 2);
        let jan = &out.records[0];
        assert_eq!(jan.month_start, date(2021, 1, 1));
        assert_eq!(jan.sip_date, date(2021, 1, 4));
        assert_eq!(jan.sip_nav, 100.0);
        assert_eq!(jan.month_end, date(2021, 1, 28));
        assert_eq!(jan.month_end_nav, 110.0);
        assert!((jan.units_bought - 10.0).abs() < 1e-12);
        assert!((jan.portfolio_value - 10.0 * 110.0).abs() < 1e-9);

        let feb = &out.records[1];
        let units = 10.0 + 1000.0 / 120.0;
        assert!((feb.cumulative_units - units).abs() < 1e-9);
        assert!((feb.portfolio_value - units * 115.0).abs() < 1e-9);
        assert_eq!(feb.cumulative_invested, 2000.0);

        // Two purchases plus the terminal valuation
        assert_eq!(out.cashflows.len(), 3);
        assert_eq!(out.cashflows[2].date, date(2021, 2, 25));
        assert!((out.cashflows[2].amount - units * 115.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_month_series() {
        let prices = vec![point(2021, 5, 3, 80.0), point(2021, 5, 31, 88.0)];
        let out = accumulate(&prices, 1000.0).unwrap();

        assert_eq!(out.records.len(), 1);
        let rec = &out.records[0];
        assert_eq!(rec.sip_date, date(2021, 5, 3));
        assert_eq!(rec.month_end_nav, 88.0);
        assert_eq!(out.valuation_date, date(2021, 5, 31));
    }

    #[test]
    fn test_month_with_single_observation() {
        let prices = vec![point(2021, 1, 15, 100.0), point(2021, 2, 10, 105.0)];
        let out = accumulate(&prices, 1000.0).unwrap();

        let jan = &out.records[0];
        assert_eq!(jan.month_end, jan.sip_date);
        assert_eq!(jan.month_end_nav, jan.sip_nav);
    }

    #[test]
    fn test_accumulate_is_pure() {
        let prices = vec![
            point(2021, 1, 4, 100.0),
            point(2021, 2, 1, 95.0),
            point(2021, 3, 1, 130.0),
            point(2021, 3, 31, 124.0),
        ];
        let a = accumulate(&prices, 1000.0).unwrap();
        let b = accumulate(&prices, 1000.0).unwrap();
        assert_eq!(a.records, b.records);
        assert_eq!(a.cashflows, b.cashflows);
    }

    #[test]
    fn test_calculate_sip_sorts_input() {
        let input = SipInput {
            prices: vec![
                point(2021, 2, 1, 120.0),
                point(2021, 1, 4, 100.0),
                point(2021, 1, 28, 110.0),
            ],
            monthly_amount: 1000.0,
        };
        let out = calculate_sip(&input).unwrap();
        assert_eq!(out.result.records[0].sip_date, date(2021, 1, 4));
        assert!(out.warnings.is_empty());
    }
}
