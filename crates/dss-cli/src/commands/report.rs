use anyhow::Context;
use chrono::Utc;
use dss_arcgis::FeatureTransport;
use dss_core::indicators::IndicatorValue;
use dss_core::report::Report;
use dss_engine::{NarrativeGenerator, ReportEngine};

use crate::cli::root_commands::ReportArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::{self, TableOptions, table};

/// Handle `dss report`.
pub async fn handle<T: FeatureTransport, N: NarrativeGenerator>(
    args: &ReportArgs,
    engine: &ReportEngine<T, N>,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let request = args.place.request();
    let mut report = engine
        .report(&request)
        .await
        .with_context(|| format!("could not resolve '{}'", request.state))?;

    if !args.no_timestamp {
        report.meta.generated_at = Some(Utc::now());
    }

    match flags.format {
        OutputFormat::Table => {
            println!("{}", render_table(&report, TableOptions::from_env()));
            Ok(())
        }
        format => output::output(&report, format),
    }
}

/// Human view: the AOI line, the indicator table, the recommendations, and
/// the notes.
pub fn render_table(report: &Report, options: TableOptions) -> String {
    let aoi = &report.aoi;
    let place = [
        aoi.village.as_ref(),
        aoi.block.as_ref(),
        aoi.district.as_ref(),
        Some(&aoi.state),
    ]
    .into_iter()
    .flatten()
    .map(|level| level.name.as_str())
    .collect::<Vec<_>>()
    .join(", ");
    let centroid = aoi
        .centroid
        .map_or_else(|| "-".to_string(), |c| format!("{:.4}, {:.4}", c.lat, c.lon));

    let mut sections = vec![format!(
        "{place} (resolved at {} level; centroid {centroid})",
        aoi.resolved_level
    )];

    let rows = report
        .indicators
        .iter()
        .map(|(name, value)| indicator_row(name, value))
        .collect::<Vec<_>>();
    sections.push(table::render_table(
        &["indicator", "value", "status", "layer"],
        &rows,
        options,
    ));

    if report.recommendations.is_empty() {
        sections.push("No interventions recommended.".to_string());
    } else {
        let rows = report
            .recommendations
            .iter()
            .map(|r| {
                vec![
                    r.priority.to_string(),
                    r.intervention.label().to_string(),
                    r.rationale.clone(),
                ]
            })
            .collect::<Vec<_>>();
        sections.push(table::render_table(
            &["priority", "intervention", "rationale"],
            &rows,
            options,
        ));
    }

    if !report.meta.notes.is_empty() {
        let notes = report
            .meta
            .notes
            .iter()
            .map(|note| format!("  - {note}"))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Notes:\n{notes}"));
    }

    if let Some(narrative) = &report.narrative {
        sections.push(narrative.content.clone());
    }

    sections.join("\n\n")
}

fn indicator_row(name: &str, value: &IndicatorValue) -> Vec<String> {
    let (shown, status) = match value {
        IndicatorValue::Scalar { value, .. } => (format!("{value:.2}"), "ok".to_string()),
        IndicatorValue::Category { label, .. } => (label.clone(), "ok".to_string()),
        IndicatorValue::Absent { reason, .. } => ("-".to_string(), reason.to_string()),
    };
    vec![
        name.to_string(),
        shown,
        status,
        value.layer().unwrap_or("-").to_string(),
    ]
}
