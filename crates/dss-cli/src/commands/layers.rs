use dss_core::layer::LayerSpec;
use dss_layers::LayerRegistry;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::LayersArgs;
use crate::output;

#[derive(Debug, Serialize, PartialEq, Eq)]
struct LayerRow {
    name: String,
    geometry: &'static str,
    roles: String,
    url: String,
}

impl LayerRow {
    fn from_spec(spec: &LayerSpec) -> Self {
        let roles = [
            ("name", &spec.name_field),
            ("state", &spec.state_field),
            ("district", &spec.district_field),
            ("parent", &spec.parent_field),
            ("code", &spec.code_field),
            ("value", &spec.value_field),
        ]
        .into_iter()
        .filter_map(|(role, field)| field.as_ref().map(|f| format!("{role}={f}")))
        .collect::<Vec<_>>()
        .join(" ");

        Self {
            name: spec.name.clone(),
            geometry: spec.geometry.as_str(),
            roles,
            url: spec.url.clone(),
        }
    }
}

/// Handle `dss layers`.
pub fn handle(
    args: &LayersArgs,
    registry: &LayerRegistry,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    output::output(&rows(registry, args.filter.as_deref()), flags.format)
}

fn rows(registry: &LayerRegistry, filter: Option<&str>) -> Vec<LayerRow> {
    let filter = filter.map(str::to_lowercase);
    registry
        .iter()
        .filter(|spec| {
            filter
                .as_deref()
                .is_none_or(|needle| spec.name.to_lowercase().contains(needle))
        })
        .map(LayerRow::from_spec)
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn filter_matches_names_case_insensitively() {
        let registry = LayerRegistry::builtin().unwrap();
        let names: Vec<String> = rows(&registry, Some("GROUNDWATER"))
            .into_iter()
            .map(|row| row.name)
            .collect();
        assert_eq!(
            names,
            [
                "groundwater_during_monsoon",
                "groundwater_post_monsoon",
                "groundwater_pre_monsoon",
            ]
        );
    }

    #[test]
    fn roles_list_only_bound_fields() {
        let mut spec = LayerSpec::new("wells", "https://example.test/wells/0");
        spec.value_field = Some("wl_mbgl".into());
        spec.state_field = Some("State".into());

        let row = LayerRow::from_spec(&spec);
        assert_eq!(row.roles, "state=State value=wl_mbgl");
        assert_eq!(row.geometry, "polygon");
    }

    #[test]
    fn every_configured_layer_is_listed() {
        let registry = LayerRegistry::builtin().unwrap();
        assert_eq!(rows(&registry, None).len(), registry.len());
    }
}
