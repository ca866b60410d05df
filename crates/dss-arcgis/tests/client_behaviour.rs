//! Retry, pagination, and error mapping against the scripted transport.

use dss_arcgis::testing::{Reply, ScriptedTransport};
use dss_arcgis::{FeatureClient, FeatureQuery, PagingPolicy, QueryError, RetryPolicy};
use dss_core::enums::GeometryKind;
use dss_core::filter::QueryFilter;
use dss_core::geo::LatLon;
use dss_core::layer::LayerSpec;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn groundwater() -> LayerSpec {
    LayerSpec {
        fields: vec!["objectid".into(), "State".into(), "wl_mbgl".into()],
        state_field: Some("State".into()),
        value_field: Some("wl_mbgl".into()),
        id_field: Some("objectid".into()),
        ..LayerSpec::new("groundwater", "https://example.test/gw/FeatureServer/3")
    }
}

fn client(transport: ScriptedTransport) -> FeatureClient<ScriptedTransport> {
    FeatureClient::new(transport).with_retry(RetryPolicy::immediate(5))
}

fn rows(ids: std::ops::Range<u32>) -> Vec<Value> {
    ids.map(|i| json!({"objectid": i, "wl_mbgl": 4.0})).collect()
}

fn offset_of(request: &dss_arcgis::TransportRequest) -> usize {
    request
        .param("resultOffset")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn transient_failures_then_success() {
    let transport = ScriptedTransport::sequence([
        Reply::status(503),
        Reply::status(503),
        Reply::status(503),
        Reply::features(&rows(0..12), Some(false)),
    ]);
    let client = client(transport);

    let set = client
        .query(&groundwater(), &FeatureQuery::attribute(QueryFilter::new()))
        .await
        .unwrap();

    assert_eq!(set.len(), 12);
    assert_eq!(client.transport().request_count(), 4);
}

#[tokio::test]
async fn client_error_is_never_retried() {
    let transport = ScriptedTransport::sequence([Reply::status(400), Reply::empty()]);
    let client = client(transport);

    let err = client
        .query(&groundwater(), &FeatureQuery::attribute(QueryFilter::new()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        QueryError::Client {
            status: Some(400),
            ..
        }
    ));
    assert_eq!(client.transport().request_count(), 1);
}

#[tokio::test]
async fn embedded_error_body_is_a_client_error() {
    let transport = ScriptedTransport::sequence([Reply::service_error(400, "Invalid field: Stat")]);
    let client = client(transport);
    let filter = QueryFilter::new().text("Stat", "Tripura");

    let err = client
        .query(&groundwater(), &FeatureQuery::attribute(filter))
        .await
        .unwrap_err();

    match err {
        QueryError::Client {
            layer,
            status,
            message,
            query,
        } => {
            assert_eq!(layer, "groundwater");
            assert_eq!(status, Some(400));
            assert_eq!(message, "Invalid field: Stat");
            assert_eq!(query, "UPPER(Stat) = UPPER('Tripura')");
        }
        other => panic!("expected client error, got {other:?}"),
    }
    assert_eq!(client.transport().request_count(), 1);
}

#[tokio::test]
async fn retry_budget_exhaustion_is_transient() {
    let transport = ScriptedTransport::new(|_| Reply::network("connection reset"));
    let client = client(transport);

    let err = client
        .query(&groundwater(), &FeatureQuery::attribute(QueryFilter::new()))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        QueryError::Transient {
            layer: "groundwater".into(),
            attempts: 5,
            message: "network error: connection reset".into(),
        }
    );
    assert_eq!(client.transport().request_count(), 5);
}

#[tokio::test]
async fn embedded_server_error_is_retried() {
    let transport = ScriptedTransport::sequence([
        Reply::service_error(500, "Error performing query operation"),
        Reply::features(&rows(0..3), None),
    ]);
    let client = client(transport);

    let set = client
        .query(&groundwater(), &FeatureQuery::attribute(QueryFilter::new()))
        .await
        .unwrap();
    assert_eq!(set.len(), 3);
    assert_eq!(client.transport().request_count(), 2);
}

#[tokio::test]
async fn pages_are_followed_until_short_page() {
    let transport = ScriptedTransport::new(|req| match offset_of(req) {
        0 => Reply::features(&rows(0..100), None),
        100 => Reply::features(&rows(100..200), Some(true)),
        200 => Reply::features(&rows(200..237), None),
        _ => Reply::status(400),
    });
    let client = client(transport).with_paging(PagingPolicy {
        page_size: 100,
        max_pages: 50,
    });

    let set = client
        .query(&groundwater(), &FeatureQuery::attribute(QueryFilter::new()))
        .await
        .unwrap();

    assert_eq!(set.len(), 237);
    assert_eq!(set.pages, 3);
    assert!(!set.truncated);
    let offsets: Vec<usize> = client.transport().requests().iter().map(offset_of).collect();
    assert_eq!(offsets, [0, 100, 200]);
}

#[tokio::test]
async fn overlapping_pages_are_deduplicated() {
    let transport = ScriptedTransport::new(|req| match offset_of(req) {
        0 => Reply::features(&rows(0..10), Some(true)),
        // the service shifted under us: ids 5..9 come back again
        10 => Reply::features(&rows(5..15), Some(false)),
        _ => Reply::status(400),
    });
    let client = client(transport).with_paging(PagingPolicy {
        page_size: 10,
        max_pages: 50,
    });

    let set = client
        .query(&groundwater(), &FeatureQuery::attribute(QueryFilter::new()))
        .await
        .unwrap();

    let ids: Vec<u64> = set
        .features
        .iter()
        .filter_map(|f| f.attribute("objectid").and_then(Value::as_u64))
        .collect();
    assert_eq!(ids, (0..15).collect::<Vec<u64>>());
}

#[tokio::test]
async fn features_without_ids_are_never_collapsed() {
    let transport = ScriptedTransport::new(|req| match offset_of(req) {
        0 => Reply::features(
            &[
                json!({"objectid": 1, "wl_mbgl": 4.0}),
                json!({"wl_mbgl": 5.0}),
                json!({"objectid": null, "wl_mbgl": 5.0}),
            ],
            Some(true),
        ),
        3 => Reply::features(
            &[json!({"objectid": 1, "wl_mbgl": 4.0}), json!({"wl_mbgl": 5.0})],
            Some(false),
        ),
        _ => Reply::status(400),
    });
    let client = client(transport).with_paging(PagingPolicy {
        page_size: 3,
        max_pages: 50,
    });

    let set = client
        .query(&groundwater(), &FeatureQuery::attribute(QueryFilter::new()))
        .await
        .unwrap();

    // one repeated id dropped, all three id-less rows kept
    assert_eq!(set.len(), 4);
    assert_eq!(set.pages, 2);
}

#[tokio::test]
async fn empty_page_stops_even_when_more_is_claimed() {
    let transport = ScriptedTransport::new(|req| match offset_of(req) {
        0 => Reply::features(&rows(0..10), Some(true)),
        _ => Reply::features(&[], Some(true)),
    });
    let client = client(transport).with_paging(PagingPolicy {
        page_size: 10,
        max_pages: 50,
    });

    let set = client
        .query(&groundwater(), &FeatureQuery::attribute(QueryFilter::new()))
        .await
        .unwrap();
    assert_eq!(set.len(), 10);
    assert_eq!(set.pages, 2);
    assert!(!set.truncated);
}

#[tokio::test]
async fn page_cap_marks_result_truncated() {
    let transport = ScriptedTransport::new(|req| {
        let offset = u32::try_from(offset_of(req)).unwrap();
        Reply::features(&rows(offset..offset + 10), Some(true))
    });
    let client = client(transport).with_paging(PagingPolicy {
        page_size: 10,
        max_pages: 3,
    });

    let set = client
        .query(&groundwater(), &FeatureQuery::attribute(QueryFilter::new()))
        .await
        .unwrap();

    assert!(set.truncated);
    assert_eq!(set.pages, 3);
    assert_eq!(set.len(), 30);
    assert_eq!(client.transport().request_count(), 3);
}

#[tokio::test]
async fn spatial_query_against_wrong_geometry_never_hits_network() {
    let transport = ScriptedTransport::new(|_| Reply::empty());
    let client = client(transport);

    let err = client
        .query(
            &groundwater(),
            &FeatureQuery::point_in_polygon(LatLon::new(23.8, 91.9)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Client { status: None, .. }));

    let polygon_layer = LayerSpec {
        geometry: GeometryKind::Polygon,
        ..groundwater()
    };
    let err = client
        .query(
            &polygon_layer,
            &FeatureQuery::near_point(LatLon::new(23.8, 91.9), 5000.0, 5),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Client { status: None, .. }));
    assert_eq!(client.transport().request_count(), 0);
}

#[tokio::test]
async fn near_point_pages_the_radius_and_keeps_the_closest() {
    // storage order puts the closest facility on the last page
    let facilities: Vec<Value> = (0..6)
        .map(|i| {
            let lon = 92.10 - f64::from(i) * 0.029;
            json!({"attributes": {"objectid": i}, "geometry": {"x": lon, "y": 23.8}})
        })
        .collect();
    let transport = ScriptedTransport::new(move |request| {
        let offset = offset_of(request);
        let count: usize = request
            .param("resultRecordCount")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        let page: Vec<Value> = facilities.iter().skip(offset).take(count).cloned().collect();
        let exceeded = offset + count < facilities.len();
        Reply::json(&json!({"features": page, "exceededTransferLimit": exceeded}))
    });
    let client = client(transport)
        .with_token(Some("secret".into()))
        .with_paging(PagingPolicy {
            page_size: 2,
            max_pages: 10,
        });
    let layer = LayerSpec {
        geometry: GeometryKind::Point,
        ..groundwater()
    };

    let set = client
        .query(
            &layer,
            &FeatureQuery::near_point(LatLon::new(23.8, 91.95), 50_000.0, 2),
        )
        .await
        .unwrap();

    let ids: Vec<_> = set.features.iter().filter_map(|f| f.number("objectid")).collect();
    assert_eq!(ids, [5.0, 4.0]);
    assert!(!set.truncated);
    let requests = client.transport().requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.param("token") == Some("secret")));
    assert_eq!(requests[0].param("resultRecordCount"), Some("2"));
    assert_eq!(
        requests[0].url,
        "https://example.test/gw/FeatureServer/3/query"
    );
}
