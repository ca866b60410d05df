//! A scripted Tripura / Dhalai feature service shared by the pipeline tests.

#![allow(dead_code)]

use std::time::Duration;

use dss_arcgis::testing::{Reply, ScriptedTransport};
use dss_arcgis::{FeatureClient, RetryPolicy, TransportRequest};
use serde_json::{Value, json};

/// Twelve post-monsoon wells averaging 4.3 m bgl.
pub const POST_MONSOON_LEVELS: [f64; 12] = [3.8, 4.8, 3.8, 4.8, 3.8, 4.8, 3.8, 4.8, 3.8, 4.8, 3.8, 4.8];

pub fn square(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> Value {
    json!({"rings": [[[lon0, lat0], [lon0, lat1], [lon1, lat1], [lon1, lat0], [lon0, lat0]]]})
}

fn state() -> Reply {
    Reply::json(&json!({"features": [{
        "attributes": {
            "FID": 30, "State_FSI": "Tripura", "State_Name": "TR", "State_Cens": "16",
            "GA_sqkm": 10486, "Forest_201": 7726, "Per_GA_201": 73.68, "Scrub2019": 0
        },
        "geometry": square(91.0, 23.0, 92.5, 24.5)
    }]}))
}

fn district() -> Reply {
    Reply::json(&json!({"features": [{
        "attributes": {
            "FID": 211, "District": "Dhalai", "State": "TR",
            "Stage_of_d": 12.5, "Annual_Gro": 41.2, "Net_Ground": 330.1
        },
        "geometry": square(91.8, 23.7, 92.1, 24.1)
    }]}))
}

fn wells(levels: &[f64], field: &str) -> Reply {
    let rows: Vec<Value> = levels
        .iter()
        .enumerate()
        .map(|(i, level)| {
            let mut row = json!({"objectid": i + 1, "State": "Tripura"});
            row[field] = json!(level);
            row
        })
        .collect();
    Reply::features(&rows, Some(false))
}

fn aquifer() -> Reply {
    Reply::features(
        &[json!({"objectid": 7, "aquifer": "Alluvium", "aquifer_0": "", "new_code_14": "AL01"})],
        None,
    )
}

fn mgnrega() -> Reply {
    Reply::features(
        &[json!({
            "objectid": 1, "district_name": "Dhalai", "state_name": "Tripura",
            "number_of_jobcards_applied_for": 96000, "number_of_jobcards_issued": 95500,
            "registered_workers_total": 180000, "active_workers_total_workers": 120000,
            "active_workers_women": 60000
        })],
        None,
    )
}

fn facilities(req: &TransportRequest) -> Reply {
    let where_clause = req.param("where").unwrap_or_default();
    let offset = if where_clause.contains("Medical") { 0.02 } else { 0.05 };
    Reply::json(&json!({"features": [
        {"attributes": {"objectid": 1, "facilitycat": "x"}, "geometry": {"x": 91.95 + offset, "y": 23.9}},
        {"attributes": {"objectid": 2, "facilitycat": "x"}, "geometry": {"x": 91.95 + 2.0 * offset, "y": 23.9}}
    ]}))
}

/// Which upstream layer a request targets, by URL.
pub fn layer_of(req: &TransportRequest) -> &'static str {
    let url = req.url.as_str();
    if url.contains("state_boundary") {
        "state"
    } else if url.contains("district_boundary") {
        "district"
    } else if url.contains("IAB_Village") {
        "village"
    } else if url.contains("Water_Level_Depth/FeatureServer/1") {
        "groundwater_pre_monsoon"
    } else if url.contains("Water_Level_Depth/FeatureServer/2") {
        "groundwater_during_monsoon"
    } else if url.contains("Water_Level_Depth/FeatureServer/3") {
        "groundwater_post_monsoon"
    } else if url.contains("Major_Aquifers") {
        "aquifer"
    } else if url.contains("PMGSY") {
        "rural_facilities"
    } else if url.contains("MGNREGA") {
        "mgnrega_workers"
    } else {
        "unknown"
    }
}

/// Answer like the live services would for Tripura / Dhalai.
pub fn tripura(req: &TransportRequest) -> Reply {
    match layer_of(req) {
        "state" => state(),
        "district" => district(),
        "groundwater_post_monsoon" => wells(&POST_MONSOON_LEVELS, "wl_mbgl"),
        "aquifer" => aquifer(),
        "mgnrega_workers" => mgnrega(),
        "rural_facilities" => facilities(req),
        "unknown" => Reply::status(404),
        _ => Reply::empty(),
    }
}

/// Same answers, each delivered after `delay(layer)`.
pub fn delayed(delay: fn(&str) -> Duration) -> ScriptedTransport {
    ScriptedTransport::new(move |req| tripura(req).after(delay(layer_of(req))))
}

pub fn client(transport: ScriptedTransport) -> FeatureClient<ScriptedTransport> {
    FeatureClient::new(transport).with_retry(RetryPolicy::immediate(2))
}
