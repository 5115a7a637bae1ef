use std::collections::BTreeMap;

use crate::stats::StatsIndex;

/// A keyword-triggered fact emitter. Rules are evaluated in declaration
/// order and are non-exclusive: every rule whose trigger matches
/// contributes its lines.
struct TopicRule {
    triggers: &'static [&'static str],
    emit: fn(&StatsIndex) -> Vec<String>,
}

const TOPIC_RULES: &[TopicRule] = &[
    TopicRule {
        triggers: &["total", "revenue", "overall", "sum"],
        emit: revenue_facts,
    },
    TopicRule {
        triggers: &["average", "mean", "avg"],
        emit: average_facts,
    },
    TopicRule {
        triggers: &["product", "widget", "best", "top"],
        emit: product_facts,
    },
    TopicRule {
        triggers: &["region", "location", "area", "where"],
        emit: region_facts,
    },
    TopicRule {
        triggers: &["trend", "month", "time", "period"],
        emit: trend_facts,
    },
];

/// Assemble the context block for a question: every matching topic's fact
/// lines in fixed rule order, newline-joined. Total over any input; a
/// question matching nothing gets the overview fallback, never an empty
/// string.
pub fn retrieve_context(question: &str, index: &StatsIndex) -> String {
    let lowered = question.to_lowercase();

    let mut lines: Vec<String> = Vec::new();
    for rule in TOPIC_RULES {
        if rule.triggers.iter().any(|kw| lowered.contains(kw)) {
            lines.extend((rule.emit)(index));
        }
    }

    if lines.is_empty() {
        lines.push(format!(
            "Overview: Total Revenue ${}, Top Product: {}",
            format_amount(index.total_revenue),
            index.best_selling_product
        ));
    }

    lines.join("\n")
}

fn revenue_facts(index: &StatsIndex) -> Vec<String> {
    vec![format!("Total Revenue: ${}", format_amount(index.total_revenue))]
}

fn average_facts(index: &StatsIndex) -> Vec<String> {
    vec![
        format!("Average Transaction: ${}", format_amount(index.average_transaction)),
        format!("Average Customer Age: {:.1} years", index.avg_customer_age),
        format!("Average Satisfaction: {:.2}/5.0", index.avg_satisfaction),
    ]
}

fn product_facts(index: &StatsIndex) -> Vec<String> {
    vec![
        format!("Best Selling Product: {}", index.best_selling_product),
        format!("Sales by Product: {}", format_mapping(&index.sales_by_product)),
    ]
}

fn region_facts(index: &StatsIndex) -> Vec<String> {
    vec![format!("Sales by Region: {}", format_mapping(&index.sales_by_region))]
}

fn trend_facts(index: &StatsIndex) -> Vec<String> {
    let start = index.monthly_trend.len().saturating_sub(6);
    let entries: Vec<String> = index.monthly_trend[start..]
        .iter()
        .map(|(month, total)| format!("{} ${}", month, format_amount(*total)))
        .collect();
    vec![format!("Recent 6 Months Trend: {}", entries.join(", "))]
}

fn format_mapping(map: &BTreeMap<String, f64>) -> String {
    let entries: Vec<String> = map
        .iter()
        .map(|(label, total)| format!("{} ${}", label, format_amount(*total)))
        .collect();
    entries.join(", ")
}

/// Two decimal places with thousands separators, e.g. 1234567.891 -> "1,234,567.89".
pub(crate) fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (fixed.as_str(), "00"),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        let remaining = digits.len() - i;
        grouped.push(*c);
        if remaining > 1 && remaining % 3 == 1 {
            grouped.push(',');
        }
    }

    format!("{}.{}", grouped, frac_part)
}
