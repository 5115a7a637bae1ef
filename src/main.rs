mod ai;
mod chat;
mod config;
mod csv_parser;
mod dashboard;
mod evaluator;
mod retriever;
mod stats;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use ai::prompt::{build_user_prompt, SYSTEM_PROMPT};
use ai::LlmProvider;
use chat::{ChatState, SessionStore};
use config::Config;
use csv_parser::Transaction;
use retriever::{format_amount, retrieve_context};
use stats::StatsIndex;

const DEFAULT_DATA_PATH: &str = "data/sales_data.csv";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        println!("Usage: insightforge <command> [args]");
        println!("Commands:");
        println!("  serve [data.csv]                 start the assistant HTTP service");
        println!("  ask <question> [data.csv]        answer one question and exit");
        println!("  stats [data.csv]                 print the statistics index");
        println!("  eval [data.csv] [--retrieval-only]  run the evaluation harness");
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "serve" => {
            let config = Config::from_env()?;
            let data_path = args
                .get(2)
                .map(|s| s.to_string())
                .unwrap_or_else(|| config.data_path.clone());
            run_serve(&data_path, &config).await
        }
        "ask" => {
            let question = match args.get(2) {
                Some(q) => q.clone(),
                None => {
                    println!("Usage: insightforge ask <question> [data.csv]");
                    return Ok(());
                }
            };
            let config = Config::from_env()?;
            let data_path = args
                .get(3)
                .map(|s| s.to_string())
                .unwrap_or_else(|| config.data_path.clone());
            run_ask(&question, &data_path, &config).await
        }
        "stats" => {
            let data_path = args.get(2).map(|s| s.as_str()).unwrap_or(DEFAULT_DATA_PATH);
            run_stats(data_path)
        }
        "eval" => {
            let mut data_path = DEFAULT_DATA_PATH.to_string();
            let mut retrieval_only = false;

            for arg in &args[2..] {
                match arg.as_str() {
                    "--retrieval-only" => retrieval_only = true,
                    path if !path.starts_with("--") => data_path = path.to_string(),
                    _ => {}
                }
            }

            run_eval(&data_path, retrieval_only).await
        }
        other => {
            println!("Unknown command: {}", other);
            Ok(())
        }
    }
}

fn load_index(data_path: &str) -> Result<(Vec<Transaction>, StatsIndex), Box<dyn std::error::Error>> {
    let records = csv_parser::parse_csv(Path::new(data_path))?;
    let index = stats::build_knowledge_base(&records)?;
    info!(path = %data_path, records = records.len(), "dataset loaded");
    Ok((records, index))
}

async fn run_serve(data_path: &str, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (records, index) = load_index(data_path)?;
    let charts = dashboard::build_dashboard(&records, &index);

    let state = ChatState {
        llm: LlmProvider::new(config.anthropic_api_key.clone(), config.model.clone()),
        index: Arc::new(index),
        sessions: SessionStore::new(),
        charts: Arc::new(charts),
        transaction_count: records.len(),
    };

    let app = chat::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "insightforge listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_ask(question: &str, data_path: &str, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (_, index) = load_index(data_path)?;

    let context = retrieve_context(question, &index);
    info!(context_lines = context.lines().count(), "context retrieved");

    let llm = LlmProvider::new(config.anthropic_api_key.clone(), config.model.clone());
    let answer = llm.complete(SYSTEM_PROMPT, &build_user_prompt(&context, question)).await?;

    println!("{}", answer);
    Ok(())
}

fn run_stats(data_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (records, index) = load_index(data_path)?;

    println!("Sales Statistics ({} transactions)", records.len());
    println!("  Total Revenue:       ${}", format_amount(index.total_revenue));
    println!("  Average Transaction: ${}", format_amount(index.average_transaction));
    println!("  Median Sales:        ${}", format_amount(index.median_sales));
    println!("  Std Deviation:       ${}", format_amount(index.sales_std_dev));
    println!("  Best Seller:         {}", index.best_selling_product);
    println!("  Avg Customer Age:    {:.1} years", index.avg_customer_age);
    println!("  Avg Satisfaction:    {:.2}/5.0", index.avg_satisfaction);

    println!("\nSales by Product:");
    for (product, total) in &index.sales_by_product {
        println!("  - {}: ${}", product, format_amount(*total));
    }

    println!("\nSales by Region:");
    for (region, total) in &index.sales_by_region {
        println!("  - {}: ${}", region, format_amount(*total));
    }

    println!("\nMonthly Trend:");
    for (month, total) in &index.monthly_trend {
        println!("  - {}: ${}", month, format_amount(*total));
    }

    Ok(())
}

async fn run_eval(data_path: &str, retrieval_only: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, index) = load_index(data_path)?;

    let report = if retrieval_only {
        evaluator::run_retrieval_only(&index)
    } else {
        let config = Config::from_env()?;
        let llm = LlmProvider::new(config.anthropic_api_key.clone(), config.model.clone());
        evaluator::run_with_generator(&index, &llm).await?
    };

    evaluator::print_report(&report);
    Ok(())
}
