use std::collections::BTreeMap;
use std::fmt;

use crate::csv_parser::Transaction;

/// Precomputed aggregate summary of one dataset load. Built once, then
/// shared read-only; rebuilt only when the dataset is reloaded.
#[derive(Debug, Clone)]
pub struct StatsIndex {
    pub total_revenue: f64,
    pub average_transaction: f64,
    pub median_sales: f64,
    pub sales_std_dev: f64,
    pub best_selling_product: String,
    pub sales_by_product: BTreeMap<String, f64>,
    pub sales_by_region: BTreeMap<String, f64>,
    /// (year-month key, summed sales) pairs, chronologically ascending.
    /// Months with no records are absent rather than zero-filled.
    pub monthly_trend: Vec<(String, f64)>,
    pub avg_customer_age: f64,
    pub avg_satisfaction: f64,
}

#[derive(Debug)]
pub enum StatsError {
    EmptyDataset,
    MalformedRecord { row: usize, reason: String },
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsError::EmptyDataset => {
                write!(f, "Dataset is empty: no statistics can be computed")
            }
            StatsError::MalformedRecord { row, reason } => {
                write!(f, "Malformed record at row {}: {}", row, reason)
            }
        }
    }
}

impl std::error::Error for StatsError {}

fn validate(records: &[Transaction]) -> Result<(), StatsError> {
    for (i, tx) in records.iter().enumerate() {
        let row = i + 1;
        if !tx.sales_amount.is_finite() || tx.sales_amount < 0.0 {
            return Err(StatsError::MalformedRecord {
                row,
                reason: format!("sales amount {} is not a non-negative number", tx.sales_amount),
            });
        }
        if tx.customer_age == 0 {
            return Err(StatsError::MalformedRecord {
                row,
                reason: "customer age must be positive".to_string(),
            });
        }
        if !tx.satisfaction.is_finite() || !(1.0..=5.0).contains(&tx.satisfaction) {
            return Err(StatsError::MalformedRecord {
                row,
                reason: format!("satisfaction score {} is outside 1.0-5.0", tx.satisfaction),
            });
        }
    }
    Ok(())
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Sample standard deviation (n-1 denominator); 0.0 for a single value.
fn std_dev(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sum_sq / (n - 1) as f64).sqrt()
}

/// Build the immutable statistics index over one dataset load.
///
/// Aborts on the first out-of-bounds record rather than skipping it, so a
/// returned index always reflects the full input. Grouping is by exact,
/// case-sensitive label; ties for the best seller resolve to the
/// lexicographically smaller product label.
pub fn build_knowledge_base(records: &[Transaction]) -> Result<StatsIndex, StatsError> {
    if records.is_empty() {
        return Err(StatsError::EmptyDataset);
    }
    validate(records)?;

    let n = records.len() as f64;
    let total_revenue: f64 = records.iter().map(|tx| tx.sales_amount).sum();
    let average_transaction = total_revenue / n;

    let mut amounts: Vec<f64> = records.iter().map(|tx| tx.sales_amount).collect();
    amounts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_sales = median(&amounts);
    let sales_std_dev = std_dev(&amounts, average_transaction);

    let mut sales_by_product: BTreeMap<String, f64> = BTreeMap::new();
    let mut sales_by_region: BTreeMap<String, f64> = BTreeMap::new();
    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();

    for tx in records {
        *sales_by_product.entry(tx.product.clone()).or_insert(0.0) += tx.sales_amount;
        *sales_by_region.entry(tx.region.clone()).or_insert(0.0) += tx.sales_amount;
        let month_key = tx.date.format("%Y-%m").to_string();
        *by_month.entry(month_key).or_insert(0.0) += tx.sales_amount;
    }

    // BTreeMap iterates labels in ascending order, so keeping the champion
    // only on a strictly greater sum resolves ties lexicographically.
    let mut best_selling_product = String::new();
    let mut best_sum = f64::NEG_INFINITY;
    for (product, sum) in &sales_by_product {
        if *sum > best_sum {
            best_selling_product = product.clone();
            best_sum = *sum;
        }
    }

    // Year-month keys sort lexicographically in chronological order.
    let monthly_trend: Vec<(String, f64)> = by_month.into_iter().collect();

    let avg_customer_age = records.iter().map(|tx| tx.customer_age as f64).sum::<f64>() / n;
    let avg_satisfaction = records.iter().map(|tx| tx.satisfaction).sum::<f64>() / n;

    Ok(StatsIndex {
        total_revenue,
        average_transaction,
        median_sales,
        sales_std_dev,
        best_selling_product,
        sales_by_product,
        sales_by_region,
        monthly_trend,
        avg_customer_age,
        avg_satisfaction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(date: &str, product: &str, region: &str, amount: f64) -> Transaction {
        Transaction {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            product: product.to_string(),
            region: region.to_string(),
            sales_amount: amount,
            customer_age: 35,
            satisfaction: 4.0,
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx("2024-01-10", "Widget A", "North", 100.0),
            tx("2024-01-20", "Widget B", "South", 150.0),
            tx("2024-02-05", "Widget B", "North", 100.0),
            tx("2024-03-15", "Widget C", "East", 250.0),
        ]
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        match build_knowledge_base(&[]) {
            Err(StatsError::EmptyDataset) => {}
            other => panic!("expected EmptyDataset, got {:?}", other),
        }
    }

    #[test]
    fn test_product_sums_match_total_revenue() {
        let idx = build_knowledge_base(&sample()).unwrap();
        let product_sum: f64 = idx.sales_by_product.values().sum();
        let trend_sum: f64 = idx.monthly_trend.iter().map(|(_, v)| v).sum();
        assert!((product_sum - idx.total_revenue).abs() < 1e-6 * idx.total_revenue);
        assert!((trend_sum - idx.total_revenue).abs() < 1e-6 * idx.total_revenue);
    }

    #[test]
    fn test_best_seller_is_max_product() {
        let idx = build_knowledge_base(&sample()).unwrap();
        assert_eq!(idx.best_selling_product, "Widget B");
        assert!(idx.sales_by_product.contains_key(&idx.best_selling_product));
    }

    #[test]
    fn test_tie_breaks_to_lexicographically_smaller_label() {
        let records = vec![
            tx("2024-01-10", "A", "North", 100.0),
            tx("2024-01-11", "C", "North", 250.0),
            tx("2024-01-12", "B", "North", 250.0),
        ];
        let idx = build_knowledge_base(&records).unwrap();
        assert_eq!(idx.best_selling_product, "B");

        // Stable under input reordering
        let mut reversed = records;
        reversed.reverse();
        let idx2 = build_knowledge_base(&reversed).unwrap();
        assert_eq!(idx2.best_selling_product, "B");
    }

    #[test]
    fn test_same_month_different_years_are_distinct_buckets() {
        let records = vec![
            tx("2023-06-01", "Widget A", "North", 50.0),
            tx("2024-06-01", "Widget A", "North", 70.0),
        ];
        let idx = build_knowledge_base(&records).unwrap();
        assert_eq!(
            idx.monthly_trend,
            vec![("2023-06".to_string(), 50.0), ("2024-06".to_string(), 70.0)]
        );
    }

    #[test]
    fn test_monthly_trend_is_chronological() {
        let records = vec![
            tx("2024-03-01", "Widget A", "North", 10.0),
            tx("2024-01-01", "Widget A", "North", 20.0),
            tx("2024-02-01", "Widget A", "North", 30.0),
        ];
        let idx = build_knowledge_base(&records).unwrap();
        let months: Vec<&str> = idx.monthly_trend.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
    }

    #[test]
    fn test_median_even_and_odd() {
        let idx = build_knowledge_base(&sample()).unwrap();
        // sorted amounts: 100, 100, 150, 250
        assert_eq!(idx.median_sales, 125.0);

        let odd = vec![
            tx("2024-01-01", "A", "N", 10.0),
            tx("2024-01-02", "A", "N", 30.0),
            tx("2024-01-03", "A", "N", 20.0),
        ];
        assert_eq!(build_knowledge_base(&odd).unwrap().median_sales, 20.0);
    }

    #[test]
    fn test_std_dev_is_sample_form() {
        let records = vec![
            tx("2024-01-01", "A", "N", 10.0),
            tx("2024-01-02", "A", "N", 20.0),
            tx("2024-01-03", "A", "N", 30.0),
        ];
        let idx = build_knowledge_base(&records).unwrap();
        assert!((idx.sales_std_dev - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_record_std_dev_is_zero() {
        let records = vec![tx("2024-01-01", "A", "N", 10.0)];
        let idx = build_knowledge_base(&records).unwrap();
        assert_eq!(idx.sales_std_dev, 0.0);
        assert_eq!(idx.median_sales, 10.0);
    }

    #[test]
    fn test_negative_amount_is_malformed() {
        let records = vec![tx("2024-01-01", "A", "N", -5.0)];
        match build_knowledge_base(&records) {
            Err(StatsError::MalformedRecord { row, .. }) => assert_eq!(row, 1),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_bounds_age_and_satisfaction_are_malformed() {
        let mut bad_age = tx("2024-01-01", "A", "N", 5.0);
        bad_age.customer_age = 0;
        assert!(matches!(
            build_knowledge_base(&[bad_age]),
            Err(StatsError::MalformedRecord { .. })
        ));

        let mut bad_sat = tx("2024-01-01", "A", "N", 5.0);
        bad_sat.satisfaction = 5.5;
        assert!(matches!(
            build_knowledge_base(&[bad_sat]),
            Err(StatsError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let records = vec![
            tx("2024-01-01", "widget a", "north", 10.0),
            tx("2024-01-02", "Widget A", "North", 20.0),
        ];
        let idx = build_knowledge_base(&records).unwrap();
        assert_eq!(idx.sales_by_product.len(), 2);
        assert_eq!(idx.sales_by_region.len(), 2);
    }
}
