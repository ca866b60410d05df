//! Parent scoping: the `stateField` / `districtField` clauses a layer needs
//! to be restricted to an AOI, written in the form the layer declares.

use dss_core::aoi::{AoiContext, ResolvedLevel};
use dss_core::enums::{AdminLevel, ValueForm};
use dss_core::filter::{Comparison, QueryFilter};
use dss_core::layer::LayerSpec;

/// A layer is keyed on a parent form the resolved AOI does not carry, so no
/// scope clause can be written for it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("layer '{layer}' expects the {level} {form}, which is unavailable for {parent}")]
pub struct Unscopable {
    pub layer: String,
    pub level: AdminLevel,
    pub form: ValueForm,
    pub parent: String,
}

/// Scope clauses for `layer` over `aoi`.
///
/// # Errors
///
/// [`Unscopable`] when a bound parent lacks the declared form.
pub fn scope_filter(layer: &LayerSpec, aoi: &AoiContext) -> Result<QueryFilter, Unscopable> {
    scoped(QueryFilter::new(), layer, aoi)
}

/// Append the scope clauses for `layer` to `filter`.
///
/// The state clause is added whenever the layer binds `state_field`; the
/// district clause only once a district has been resolved. A resolved parent
/// that lacks the requested form (a state without an abbreviation, a
/// district without a code) is an error, never an unscoped query.
///
/// # Errors
///
/// [`Unscopable`] naming the level and form that were missing.
pub fn scoped(
    mut filter: QueryFilter,
    layer: &LayerSpec,
    aoi: &AoiContext,
) -> Result<QueryFilter, Unscopable> {
    if let Some(field) = layer.state_field.as_deref() {
        push_parent(&mut filter, layer, field, Some(aoi.state()), layer.state_value)?;
    }
    if let Some(field) = layer.district_field.as_deref() {
        push_parent(&mut filter, layer, field, aoi.district(), layer.district_value)?;
    }
    Ok(filter)
}

fn push_parent(
    filter: &mut QueryFilter,
    layer: &LayerSpec,
    field: &str,
    parent: Option<&ResolvedLevel>,
    form: ValueForm,
) -> Result<(), Unscopable> {
    let Some(parent) = parent else {
        return Ok(());
    };
    let Some(value) = parent.value_as(form) else {
        tracing::debug!(
            layer = %layer.name,
            field,
            %form,
            parent = %parent.matched_name,
            "parent has no value in the declared form"
        );
        return Err(Unscopable {
            layer: layer.name.clone(),
            level: parent.level,
            form,
            parent: parent.matched_name.clone(),
        });
    };
    filter.push(field, value, comparison_for(form));
    Ok(())
}

/// Codes compare exactly; names and abbreviations case-insensitively.
#[must_use]
pub const fn comparison_for(form: ValueForm) -> Comparison {
    match form {
        ValueForm::Code => Comparison::Exact,
        ValueForm::Name | ValueForm::Abbreviation => Comparison::CaseInsensitive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dss_core::enums::AdminLevel;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn level(level: AdminLevel, name: &str, code: Option<&str>) -> ResolvedLevel {
        ResolvedLevel {
            level,
            matched_name: name.into(),
            code: code.map(str::to_string),
            abbreviation: None,
            source_layer: level.as_str().into(),
            centroid: None,
            attributes: BTreeMap::new(),
        }
    }

    fn tripura() -> AoiContext {
        let mut state = level(AdminLevel::State, "Tripura", Some("16"));
        state.abbreviation = Some("TR".into());
        AoiContext::new(state).unwrap()
    }

    fn layer(state_value: ValueForm, district_value: ValueForm) -> LayerSpec {
        LayerSpec {
            state_field: Some("State".into()),
            state_value,
            district_field: Some("District".into()),
            district_value,
            ..LayerSpec::new("scoped_layer", "https://example.test/scoped/0")
        }
    }

    #[test]
    fn state_only_before_district_resolves() {
        let filter =
            scope_filter(&layer(ValueForm::Abbreviation, ValueForm::Name), &tripura()).unwrap();
        assert_eq!(filter.to_where(), "UPPER(State) = UPPER('TR')");
    }

    #[test]
    fn district_clause_after_district_resolves() {
        let mut aoi = tripura();
        aoi.record(level(AdminLevel::District, "Dhalai", Some("270")))
            .unwrap();

        let filter = scope_filter(&layer(ValueForm::Name, ValueForm::Code), &aoi).unwrap();
        assert_eq!(
            filter.to_where(),
            "UPPER(State) = UPPER('Tripura') AND District = '270'"
        );
    }

    #[test]
    fn district_without_code_cannot_scope() {
        let mut aoi = tripura();
        aoi.record(level(AdminLevel::District, "Dhalai", None)).unwrap();

        let err = scope_filter(&layer(ValueForm::Code, ValueForm::Code), &aoi).unwrap_err();
        assert_eq!(err.level, AdminLevel::District);
        assert_eq!(err.form, ValueForm::Code);
        assert_eq!(
            err.to_string(),
            "layer 'scoped_layer' expects the district code, which is unavailable for Dhalai"
        );
    }

    #[test]
    fn state_without_abbreviation_cannot_scope() {
        let aoi = AoiContext::new(level(AdminLevel::State, "Orissa", Some("21"))).unwrap();
        let err = scope_filter(&layer(ValueForm::Abbreviation, ValueForm::Name), &aoi).unwrap_err();
        assert_eq!(err.level, AdminLevel::State);
        assert_eq!(err.form, ValueForm::Abbreviation);
    }

    #[test]
    fn unbound_layer_is_unscoped() {
        let spec = LayerSpec::new("aquifer", "https://example.test/aquifer/0");
        assert!(scope_filter(&spec, &tripura()).unwrap().is_empty());
    }

    #[test]
    fn scoped_keeps_existing_clauses_first() {
        let spec = LayerSpec {
            state_field: Some("State".into()),
            ..LayerSpec::new("district", "https://example.test/district/0")
        };
        let filter =
            scoped(QueryFilter::new().text("District", "Dhalai"), &spec, &tripura()).unwrap();
        assert_eq!(
            filter.to_where(),
            "UPPER(District) = UPPER('Dhalai') AND UPPER(State) = UPPER('Tripura')"
        );
    }
}
