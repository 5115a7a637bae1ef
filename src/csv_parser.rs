use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One row of the sales dataset. Immutable once loaded; bounds on the
/// numeric fields are enforced by the index builder, not here.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub date: NaiveDate,
    pub product: String,
    pub region: String,
    pub sales_amount: f64,
    pub customer_age: u32,
    pub satisfaction: f64,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Product")]
    product: String,
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Sales")]
    sales: String,
    #[serde(rename = "Customer_Age")]
    customer_age: String,
    #[serde(rename = "Customer_Satisfaction")]
    satisfaction: String,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let trimmed = s.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .map_err(|e| format!("Failed to parse date '{}': {}", s, e))
}

fn parse_number(s: &str, column: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse {} '{}': {}", column, s, e))
}

pub fn parse_csv(path: &Path) -> Result<Vec<Transaction>, String> {
    let mut file = File::open(path)
        .map_err(|e| format!("Failed to open CSV '{}': {}", path.display(), e))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| format!("Failed to read CSV '{}': {}", path.display(), e))?;

    // Strip UTF-8 BOM if present
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    parse_records(content.as_bytes())
}

pub fn parse_records<R: Read>(reader: R) -> Result<Vec<Transaction>, String> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut transactions = Vec::new();

    for (i, result) in csv_reader.deserialize().enumerate() {
        let raw: RawRecord = result
            .map_err(|e| format!("Failed to parse row {}: {}", i + 1, e))?;

        let tx = Transaction {
            date: parse_date(&raw.date).map_err(|e| format!("Row {}: {}", i + 1, e))?,
            product: raw.product,
            region: raw.region,
            sales_amount: parse_number(&raw.sales, "Sales")
                .map_err(|e| format!("Row {}: {}", i + 1, e))?,
            customer_age: raw
                .customer_age
                .trim()
                .parse::<u32>()
                .map_err(|e| format!("Row {}: Failed to parse Customer_Age '{}': {}", i + 1, raw.customer_age, e))?,
            satisfaction: parse_number(&raw.satisfaction, "Customer_Satisfaction")
                .map_err(|e| format!("Row {}: {}", i + 1, e))?,
        };

        transactions.push(tx);
    }

    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Product,Region,Sales,Customer_Age,Customer_Satisfaction
2024-01-15,Widget A,North,1200.50,34,4.2
2024-02-03,Widget B,South,890.00,45,3.8
";

    #[test]
    fn test_parse_sample_rows() {
        let txs = parse_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].product, "Widget A");
        assert_eq!(txs[0].region, "North");
        assert_eq!(txs[0].sales_amount, 1200.50);
        assert_eq!(txs[0].customer_age, 34);
        assert_eq!(txs[1].date, NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
    }

    #[test]
    fn test_parse_us_date_fallback() {
        let csv = "Date,Product,Region,Sales,Customer_Age,Customer_Satisfaction\n\
                   01/15/2024,Widget A,North,100.0,30,4.0\n";
        let txs = parse_records(csv.as_bytes()).unwrap();
        assert_eq!(txs[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_bad_date_reports_row() {
        let csv = "Date,Product,Region,Sales,Customer_Age,Customer_Satisfaction\n\
                   not-a-date,Widget A,North,100.0,30,4.0\n";
        let err = parse_records(csv.as_bytes()).unwrap_err();
        assert!(err.contains("Row 1"), "unexpected error: {}", err);
        assert!(err.contains("not-a-date"));
    }

    #[test]
    fn test_bad_amount_reports_column() {
        let csv = "Date,Product,Region,Sales,Customer_Age,Customer_Satisfaction\n\
                   2024-01-15,Widget A,North,abc,30,4.0\n";
        let err = parse_records(csv.as_bytes()).unwrap_err();
        assert!(err.contains("Sales"), "unexpected error: {}", err);
    }
}
