use anyhow::Context;
use dss_arcgis::FeatureTransport;
use dss_core::aoi::{AoiContext, AoiSummary};
use dss_engine::{NarrativeGenerator, ReportEngine};
use serde::Serialize;

use crate::cli::root_commands::PlaceArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::{self, TableOptions, table};

#[derive(Debug, Serialize)]
struct Resolution {
    aoi: AoiSummary,
    notes: Vec<String>,
}

/// Handle `dss resolve`.
pub async fn handle<T: FeatureTransport, N: NarrativeGenerator>(
    args: &PlaceArgs,
    engine: &ReportEngine<T, N>,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let request = args.request();
    let aoi = engine
        .resolve(&request)
        .await
        .with_context(|| format!("could not resolve '{}'", request.state))?;

    match flags.format {
        OutputFormat::Table => {
            println!("{}", render_table(&aoi, TableOptions::from_env()));
            Ok(())
        }
        format => output::output(
            &Resolution {
                aoi: aoi.summary(),
                notes: aoi.notes().to_vec(),
            },
            format,
        ),
    }
}

fn render_table(aoi: &AoiContext, options: TableOptions) -> String {
    let rows = aoi
        .levels()
        .map(|level| {
            vec![
                level.level.to_string(),
                level.matched_name.clone(),
                level.code.clone().unwrap_or_else(|| "-".to_string()),
                level.source_layer.clone(),
                level
                    .centroid
                    .map_or_else(|| "-".to_string(), |c| format!("{:.4}, {:.4}", c.lat, c.lon)),
            ]
        })
        .collect::<Vec<_>>();
    let mut out = table::render_table(
        &["level", "name", "code", "layer", "centroid"],
        &rows,
        options,
    );
    for note in aoi.notes() {
        out.push_str("\n  - ");
        out.push_str(note);
    }
    out
}
