//! Markdown valuation report: monthly SIP table, rolling return matrix and
//! per-horizon summary statistics.

use sip_analytics_core::accumulator::SipOutput;
use sip_analytics_core::rolling::RollingOutput;
use sip_analytics_core::types::Rate;

/// Render the full valuation report. Undefined rates print as "NA", never
/// as zero.
pub fn render_report(title: &str, monthly_amount: f64, sip: &SipOutput, rolling: &RollingOutput) -> String {
    let mut out = String::new();

    out.push_str(&format!("## Monthly SIP valuation for {}\n\n", title));
    out.push_str(&format!("- Monthly SIP amount: {}\n", format_currency(monthly_amount)));
    match sip.records.first() {
        Some(first) => out.push_str(&format!(
            "- First data month: {}\n",
            first.month_start.format("%b %Y")
        )),
        None => out.push_str("- First data month: N/A\n"),
    }
    out.push_str(&format!(
        "- Valuation date (last available): {}\n",
        sip.valuation_date.format("%d %b %Y")
    ));
    match sip.xirr {
        Some(rate) => out.push_str(&format!("- XIRR to date: {}\n\n", format_pct(rate))),
        None => out.push_str("- XIRR to date: Not available\n\n"),
    }

    out.push_str(
        "| Month | SIP Date | Invested (Cumulative) | Units (Cumulative) | Month-end NAV | Portfolio Value | XIRR to Date |\n",
    );
    out.push_str("|---|---:|---:|---:|---:|---:|---:|\n");
    for rec in &sip.records {
        out.push_str(&format!(
            "| {} | {} | {} | {:.6} | {} | {} | {} |\n",
            rec.month_end.format("%Y-%m"),
            rec.sip_date.format("%d %b %Y"),
            format_currency(rec.cumulative_invested),
            rec.cumulative_units,
            format_currency(rec.month_end_nav),
            format_currency(rec.portfolio_value),
            format_opt_pct(rec.xirr_to_date),
        ));
    }

    out.push_str("\n\n## Rolling returns (XIRR) based on monthly SIP cashflows\n\n");
    out.push_str(&format!(
        "Assumes a monthly SIP of {}; each window uses SIP cashflows within the window and terminal value at that month-end.\n\n",
        format_currency(monthly_amount)
    ));

    let mut header: Vec<String> = vec!["Month".into(), "Month-end NAV".into()];
    header.extend(rolling.horizons.iter().map(|s| format!("{}Y", s.horizon_years)));
    out.push_str(&format!("| {} |\n", header.join(" | ")));
    out.push_str(&format!("|{}\n", "---|".repeat(header.len())));

    for (i, rec) in sip.records.iter().enumerate() {
        let mut row: Vec<String> = vec![
            rec.month_end.format("%Y-%m").to_string(),
            format_currency(rec.month_end_nav),
        ];
        for series in &rolling.horizons {
            row.push(format_opt_pct(series.rates.get(i).copied().flatten()));
        }
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }

    out.push_str("\n### Rolling returns summary (XIRR)\n\n");
    out.push_str("| Horizon | Average | Minimum | Maximum |\n");
    out.push_str("|---|---:|---:|---:|\n");
    for series in &rolling.horizons {
        out.push_str(&format!(
            "| {}Y | {} | {} | {} |\n",
            series.horizon_years,
            format_opt_pct(series.summary.mean),
            format_opt_pct(series.summary.min),
            format_opt_pct(series.summary.max),
        ));
    }

    out
}

fn format_pct(rate: Rate) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn format_opt_pct(rate: Option<Rate>) -> String {
    match rate {
        Some(r) => format_pct(r),
        None => "NA".to_string(),
    }
}

/// Thousands-separated amount with two decimals, e.g. 1234567.8 → "1,234,567.80".
pub fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sip_analytics_core::accumulator::accumulate;
    use sip_analytics_core::rolling::{calculate_rolling, RollingInput};
    use sip_analytics_core::types::PricePoint;

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(1000.0), "1,000.00");
        assert_eq!(format_currency(14132.9), "14,132.90");
        assert_eq!(format_currency(1234567.891), "1,234,567.89");
        assert_eq!(format_currency(999.0), "999.00");
        assert_eq!(format_currency(-1500.5), "-1,500.50");
    }

    #[test]
    fn test_report_contains_tables_and_na_markers() {
        let prices: Vec<PricePoint> = (0..14u32)
            .map(|i| PricePoint {
                date: NaiveDate::from_ymd_opt(2020 + (i / 12) as i32, 1 + i % 12, 1).unwrap(),
                close: 100.0,
            })
            .collect();
        let sip = accumulate(&prices, 1000.0).unwrap();
        let rolling = calculate_rolling(&RollingInput {
            records: sip.records.clone(),
            monthly_amount: 1000.0,
            horizons_years: Some(vec![1, 3]),
        })
        .unwrap()
        .result;

        let report = render_report("TEST INDEX", 1000.0, &sip, &rolling);
        assert!(report.contains("## Monthly SIP valuation for TEST INDEX"));
        assert!(report.contains("- Monthly SIP amount: 1,000.00"));
        assert!(report.contains("| 1Y | "));
        // 3Y horizon has no valid windows over 14 months
        assert!(report.contains("| 3Y | NA | NA | NA |"));
        // First 11 months of the 1Y column are NA
        assert!(report.contains("| NA |"));
    }
}
