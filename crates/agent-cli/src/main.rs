//! Command-line runner for the financial analysis pipeline
//!
//! ```bash
//! export ANTHROPIC_API_KEY=...
//! export NEWS_API_KEY=...
//! analyst-cli analyze --symbol ACME --company "Acme Corp"
//! ```

use agent_analyst::{AnalysisPipeline, AnalystConfig, InvestmentReport};
use agent_utils::{AppConfig, init_tracing_with};
use agent_workflow::{CancellationHandle, StageRecord};
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "analyst-cli")]
#[command(about = "Run the multi-agent financial analysis from the command line", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one company and print the investment report
    Analyze {
        /// Ticker symbol, e.g. ACME
        #[arg(short, long)]
        symbol: String,

        /// Company name used for the news search
        #[arg(short, long)]
        company: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Give up after this many seconds, 0 for no limit
        #[arg(long, default_value_t = 600)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing_with(&AppConfig::from_env()?)?;

    let Command::Analyze {
        symbol,
        company,
        json,
        timeout,
    } = Args::parse().command;

    let symbol = symbol.trim().to_uppercase();
    let company = company.trim().to_string();
    anyhow::ensure!(
        !symbol.is_empty() && !company.is_empty(),
        "Missing required fields: symbol and company_name"
    );

    let config = AnalystConfig::from_env()?;
    let mut builder = AnalysisPipeline::builder_from_config(&config)
        .context("Failed to build the analysis pipeline")?;
    if let Some(deadline) = run_deadline(timeout) {
        builder = builder.deadline(deadline);
    }
    let pipeline = builder.build()?;

    let handle = CancellationHandle::new();
    let ctrl_c = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling analysis");
            ctrl_c.cancel();
        }
    });

    info!(%symbol, %company, "Running analysis");
    let (report, trace) = pipeline
        .run_with_trace(&company, &symbol, handle.signal())
        .await
        .context("An error occurred during the agent run")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report_table(&report));
        println!("{}", trace_table(&trace));
    }
    Ok(())
}

/// `0` disables the deadline, matching the server's `REQUEST_DEADLINE_SECS`
fn run_deadline(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn report_table(report: &InvestmentReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            format!("{} ({})", report.company_name, report.stock_symbol),
            report.report_date.clone(),
        ]);

    let rows = [
        ("Recommendation", report.investment_recommendation.to_string()),
        ("Confidence", format!("{:.0}/100", report.confidence_level)),
        ("Period", report.analysis_period.clone()),
        ("Executive summary", report.executive_summary.clone()),
        ("Quantitative", report.quantitative_summary.clone()),
        ("Qualitative", report.qualitative_summary.clone()),
        ("Rationale", report.recommendation_rationale.clone()),
        ("Risk", report.risk_assessment.clone()),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }
    table
}

fn trace_table(trace: &[StageRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Stage", "Time"]);
    for record in trace {
        table.add_row(vec![
            record.stage.clone(),
            format!("{:.1}s", record.elapsed_ms as f64 / 1000.0),
        ]);
    }
    table
}
