use std::path::PathBuf;

use clap::{Args, Subcommand};
use dss_engine::AoiRequest;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Build the full report for a place.
    Report(ReportArgs),
    /// Resolve a place to its administrative hierarchy only.
    Resolve(PlaceArgs),
    /// List the configured feature layers.
    Layers(LayersArgs),
    /// Run the rule engine over a saved indicator bundle or report.
    Recommend(RecommendArgs),
}

/// A place, from the state down.
#[derive(Clone, Debug, Args)]
pub struct PlaceArgs {
    /// State name or two-letter abbreviation
    pub state: String,

    /// District name
    #[arg(long)]
    pub district: Option<String>,

    /// Block (sub-district) name
    #[arg(long, requires = "district")]
    pub block: Option<String>,

    /// Village name
    #[arg(long, requires = "district")]
    pub village: Option<String>,
}

impl PlaceArgs {
    #[must_use]
    pub fn request(&self) -> AoiRequest {
        let mut request = AoiRequest::new(self.state.clone());
        if let Some(district) = &self.district {
            request = request.with_district(district.clone());
        }
        if let Some(block) = &self.block {
            request = request.with_block(block.clone());
        }
        if let Some(village) = &self.village {
            request = request.with_village(village.clone());
        }
        request
    }
}

#[derive(Clone, Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub place: PlaceArgs,

    /// Leave `meta.generated_at` empty so identical runs produce identical output
    #[arg(long)]
    pub no_timestamp: bool,
}

#[derive(Clone, Debug, Args)]
pub struct LayersArgs {
    /// Show only layers whose name contains this text
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct RecommendArgs {
    /// JSON file holding an indicator bundle or a full report (`-` for stdin)
    pub input: PathBuf,
}
