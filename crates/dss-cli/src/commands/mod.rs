use dss_config::DssConfig;

use crate::bootstrap;
use crate::cli::{Commands, GlobalFlags};

pub mod layers;
pub mod recommend;
pub mod report;
pub mod resolve;

/// Dispatch a parsed command to its handler.
///
/// Only `report` and `resolve` talk to the network; the other commands never
/// build an HTTP client.
pub async fn dispatch(
    command: Commands,
    config: &DssConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Report(args) => {
            let engine = bootstrap::engine(config)?;
            report::handle(&args, &engine, flags).await
        }
        Commands::Resolve(args) => {
            let engine = bootstrap::engine(config)?;
            resolve::handle(&args, &engine, flags).await
        }
        Commands::Layers(args) => {
            let registry = bootstrap::registry(config)?;
            layers::handle(&args, &registry, flags)
        }
        Commands::Recommend(args) => recommend::handle(&args, &config.rules, flags),
    }
}
