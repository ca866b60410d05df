use std::path::Path;

use anyhow::Context;
use dss_core::indicators::IndicatorBundle;
use dss_core::recommendation::{Recommendation, RuleThresholds};
use dss_core::report::Report;
use dss_engine::rules;
use serde_json::Value;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RecommendArgs;
use crate::output;

/// Handle `dss recommend`.
pub fn handle(
    args: &RecommendArgs,
    thresholds: &RuleThresholds,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let source = read_input(&args.input)?;
    let bundle = parse_bundle(&source)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;
    let recommendations: Vec<Recommendation> = rules::recommend(&bundle, thresholds);
    tracing::debug!(
        indicators = bundle.len(),
        recommendations = recommendations.len(),
        "rules evaluated"
    );
    output::output(&recommendations, flags.format)
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        return std::io::read_to_string(std::io::stdin()).context("failed to read stdin");
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Accept either a bare bundle or a full report and return its bundle.
fn parse_bundle(source: &str) -> anyhow::Result<IndicatorBundle> {
    let value: Value = serde_json::from_str(source)?;
    if value.get("aoi").is_some() {
        let report: Report = serde_json::from_value(value)?;
        return Ok(report.indicators);
    }
    Ok(serde_json::from_value(value)?)
}
