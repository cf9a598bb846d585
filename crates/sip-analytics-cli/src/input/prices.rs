use chrono::NaiveDate;
use csv::StringRecord;
use std::fs::File;
use std::io::Read;

use sip_analytics_core::types::PricePoint;

/// Accepted date column headers, in lookup order.
const DATE_HEADERS: [&str; 2] = ["Date", "date"];

/// Accepted close-price column headers, in lookup order. Provider exports
/// name the column differently per index family.
const CLOSE_HEADERS: [&str; 4] = ["Close", "Total Returns Index", "Close Price", "close"];

/// Load a price history CSV into a sorted series.
///
/// Rows with unparseable dates or prices are skipped rather than failing
/// the whole load; provider exports routinely interleave header repeats and
/// blank rows. Non-positive closes are dropped. The result is stable-sorted
/// ascending by date.
pub fn read_csv(path: &str) -> Result<Vec<PricePoint>, Box<dyn std::error::Error>> {
    let file = File::open(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    read_prices(file).map_err(|e| format!("Failed to parse '{}': {}", path, e).into())
}

/// Parse price rows from any CSV reader.
pub fn read_prices<R: Read>(reader: R) -> Result<Vec<PricePoint>, Box<dyn std::error::Error>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let date_idx = find_column(&headers, &DATE_HEADERS)
        .ok_or("no date column found (expected 'Date')")?;
    let close_idx = find_column(&headers, &CLOSE_HEADERS)
        .ok_or("no close-price column found (expected 'Close' or 'Total Returns Index')")?;

    let mut prices = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let Some(date) = row.get(date_idx).and_then(parse_date) else {
            continue;
        };
        let Some(close) = row.get(close_idx).and_then(parse_close) else {
            continue;
        };
        if close <= 0.0 {
            continue;
        }
        prices.push(PricePoint { date, close });
    }

    prices.sort_by_key(|p| p.date);
    Ok(prices)
}

fn find_column(headers: &StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|name| headers.iter().position(|h| h.trim() == *name))
}

/// Provider exports use "03 Jan 2005" style dates; ISO dates are accepted
/// as a fallback for hand-built files.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d %b %Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn parse_close(raw: &str) -> Option<f64> {
    raw.replace(',', "").trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reads_provider_format() {
        let csv = "Date,Close\n04 Jan 2021,\"14,132.90\"\n05 Jan 2021,14199.50\n";
        let prices = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].date, date(2021, 1, 4));
        assert!((prices[0].close - 14132.90).abs() < 1e-9);
    }

    #[test]
    fn test_accepts_total_returns_index_column() {
        let csv = "Index Name,Date,Total Returns Index\nNIFTY X,01 Feb 2021,25000.00\n";
        let prices = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].close, 25000.0);
    }

    #[test]
    fn test_skips_malformed_rows_and_sorts() {
        let csv = "Date,Close\n05 Jan 2021,101.0\nnot a date,102.0\n04 Jan 2021,-\n04 Jan 2021,100.0\n";
        let prices = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].date, date(2021, 1, 4));
        assert_eq!(prices[1].date, date(2021, 1, 5));
    }

    #[test]
    fn test_drops_non_positive_closes() {
        let csv = "Date,Close\n04 Jan 2021,0.0\n05 Jan 2021,100.0\n";
        let prices = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(prices.len(), 1);
    }

    #[test]
    fn test_iso_date_fallback() {
        let csv = "date,close\n2021-01-04,100.0\n";
        let prices = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(prices[0].date, date(2021, 1, 4));
    }

    #[test]
    fn test_missing_close_column_errors() {
        let csv = "Date,Open\n04 Jan 2021,100.0\n";
        assert!(read_prices(csv.as_bytes()).is_err());
    }
}
