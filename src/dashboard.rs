use serde::Serialize;

use crate::csv_parser::Transaction;
use crate::stats::StatsIndex;

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub title: String,
    pub data: ChartData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub name: String,
    pub values: Vec<f64>,
}

/// Chart-ready aggregates for the dashboard page. Rendering stays with the
/// frontend; this only shapes the data. Built once per dataset load.
pub fn build_dashboard(records: &[Transaction], index: &StatsIndex) -> Vec<ChartSpec> {
    let mut charts = Vec::new();

    let (labels, values): (Vec<String>, Vec<f64>) = index
        .sales_by_product
        .iter()
        .map(|(label, total)| (label.clone(), *total))
        .unzip();
    charts.push(ChartSpec {
        chart_type: "bar".to_string(),
        title: "Sales by Product".to_string(),
        data: ChartData {
            labels,
            datasets: vec![Dataset { name: "USD".to_string(), values }],
        },
        height: Some(320),
    });

    let (labels, values): (Vec<String>, Vec<f64>) = index
        .sales_by_region
        .iter()
        .map(|(label, total)| (label.clone(), *total))
        .unzip();
    charts.push(ChartSpec {
        chart_type: "pie".to_string(),
        title: "Regional Distribution".to_string(),
        data: ChartData {
            labels,
            datasets: vec![Dataset { name: "USD".to_string(), values }],
        },
        height: Some(300),
    });

    let (labels, values): (Vec<String>, Vec<f64>) = index
        .monthly_trend
        .iter()
        .map(|(month, total)| (month.clone(), *total))
        .unzip();
    charts.push(ChartSpec {
        chart_type: "line".to_string(),
        title: "Monthly Sales Trend".to_string(),
        data: ChartData {
            labels,
            datasets: vec![Dataset { name: "USD".to_string(), values }],
        },
        height: Some(320),
    });

    let ages: Vec<f64> = records.iter().map(|tx| tx.customer_age as f64).collect();
    let (labels, values) = histogram(&ages, 20);
    charts.push(ChartSpec {
        chart_type: "bar".to_string(),
        title: "Customer Age Distribution".to_string(),
        data: ChartData {
            labels,
            datasets: vec![Dataset { name: "Customers".to_string(), values }],
        },
        height: Some(300),
    });

    let scores: Vec<f64> = records.iter().map(|tx| tx.satisfaction).collect();
    let (labels, values) = histogram(&scores, 20);
    charts.push(ChartSpec {
        chart_type: "bar".to_string(),
        title: "Customer Satisfaction".to_string(),
        data: ChartData {
            labels,
            datasets: vec![Dataset { name: "Customers".to_string(), values }],
        },
        height: Some(300),
    });

    charts
}

/// Fixed-width bins between the observed min and max. The final bin is
/// closed on both ends so the maximum value lands in it.
fn histogram(values: &[f64], bins: usize) -> (Vec<String>, Vec<f64>) {
    if values.is_empty() || bins == 0 {
        return (Vec::new(), Vec::new());
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if (max - min).abs() < f64::EPSILON {
        return (vec![format!("{:.1}", min)], vec![values.len() as f64]);
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0.0; bins];
    for v in values {
        let mut idx = ((v - min) / width) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        counts[idx] += 1.0;
    }

    let labels = (0..bins)
        .map(|i| {
            let lo = min + width * i as f64;
            let hi = lo + width;
            format!("{:.1}-{:.1}", lo, hi)
        })
        .collect();

    (labels, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::build_knowledge_base;
    use chrono::NaiveDate;

    fn tx(date: &str, product: &str, region: &str, amount: f64, age: u32) -> Transaction {
        Transaction {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            product: product.to_string(),
            region: region.to_string(),
            sales_amount: amount,
            customer_age: age,
            satisfaction: 3.5,
        }
    }

    #[test]
    fn test_product_chart_tracks_index_order() {
        let records = vec![
            tx("2024-01-01", "Widget B", "North", 200.0, 30),
            tx("2024-01-02", "Widget A", "South", 100.0, 40),
        ];
        let index = build_knowledge_base(&records).unwrap();
        let charts = build_dashboard(&records, &index);

        let product_chart = &charts[0];
        assert_eq!(product_chart.title, "Sales by Product");
        assert_eq!(product_chart.data.labels, vec!["Widget A", "Widget B"]);
        assert_eq!(product_chart.data.datasets[0].values, vec![100.0, 200.0]);
    }

    #[test]
    fn test_every_chart_keeps_labels_and_values_aligned() {
        let records = vec![
            tx("2024-01-01", "Widget A", "North", 100.0, 25),
            tx("2024-02-01", "Widget B", "South", 300.0, 55),
        ];
        let index = build_knowledge_base(&records).unwrap();
        for chart in build_dashboard(&records, &index) {
            for dataset in &chart.data.datasets {
                assert_eq!(chart.data.labels.len(), dataset.values.len(), "{}", chart.title);
            }
        }
    }

    #[test]
    fn test_histogram_counts_sum_to_input_len() {
        let values = vec![20.0, 25.0, 30.0, 35.0, 60.0, 61.0, 62.0];
        let (labels, counts) = histogram(&values, 5);
        assert_eq!(labels.len(), 5);
        assert_eq!(counts.iter().sum::<f64>(), values.len() as f64);
    }

    #[test]
    fn test_histogram_single_value_collapses_to_one_bin() {
        let (labels, counts) = histogram(&[4.0, 4.0, 4.0], 20);
        assert_eq!(labels.len(), 1);
        assert_eq!(counts, vec![3.0]);
    }

    #[test]
    fn test_chart_spec_wire_shape() {
        let chart = ChartSpec {
            chart_type: "bar".to_string(),
            title: "Sales by Product".to_string(),
            data: ChartData {
                labels: vec!["Widget A".to_string()],
                datasets: vec![Dataset { name: "USD".to_string(), values: vec![100.0] }],
            },
            height: None,
        };
        let value = serde_json::to_value(&chart).unwrap();
        assert_eq!(value["type"], "bar");
        assert!(value.get("height").is_none());
        assert_eq!(value["data"]["datasets"][0]["name"], "USD");
    }
}
