//! Script to assess a saved InfoExperto report from disk.
//!
//! Usage: `assess_report <report.json>`
//!
//! Accepts either the full provider response (`data.informe`) or a bare report and
//! prints the assessment as pretty JSON on stdout.

use anyhow::Context;
use credit_risk_api::assessment::assess;
use credit_risk_api::report::ExternalReport;
use std::env;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credit_risk_api=info".into()),
        )
        .init();

    let path = env::args()
        .nth(1)
        .context("usage: assess_report <report.json>")?;

    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let payload: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {} as JSON", path))?;

    let report = ExternalReport::from_payload(payload)
        .context("file does not contain a report object")?;

    let assessment = assess(&report);
    tracing::info!(
        "Assessed {}: tier {}",
        assessment.full_name,
        assessment.coarse_tier
    );

    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}
