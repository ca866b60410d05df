//! Query construction: filter, query kind, and the form parameters they imply.

use std::fmt;

use dss_core::enums::GeometryKind;
use dss_core::filter::QueryFilter;
use dss_core::geo::LatLon;
use dss_core::layer::LayerSpec;

/// Spatial component of a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryKind {
    /// `WHERE` clause only.
    Attribute,
    /// Polygons containing `point`. Polygon layers only.
    PointInPolygon { point: LatLon },
    /// The `limit` features closest to `point` within `radius_m`. Point layers only.
    NearPoint {
        point: LatLon,
        radius_m: f64,
        limit: u32,
    },
}

impl QueryKind {
    /// Geometry kind the layer must have, if the query is spatial.
    #[must_use]
    pub const fn required_geometry(&self) -> Option<GeometryKind> {
        match self {
            Self::Attribute => None,
            Self::PointInPolygon { .. } => Some(GeometryKind::Polygon),
            Self::NearPoint { .. } => Some(GeometryKind::Point),
        }
    }
}

/// A complete query against one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    pub filter: QueryFilter,
    pub kind: QueryKind,
    pub return_geometry: bool,
}

impl FeatureQuery {
    /// Attribute query returning geometry.
    #[must_use]
    pub const fn attribute(filter: QueryFilter) -> Self {
        Self {
            filter,
            kind: QueryKind::Attribute,
            return_geometry: true,
        }
    }

    /// Containing-polygon lookup; attributes only.
    #[must_use]
    pub const fn point_in_polygon(point: LatLon) -> Self {
        Self {
            filter: QueryFilter::new(),
            kind: QueryKind::PointInPolygon { point },
            return_geometry: false,
        }
    }

    /// Distance-bounded lookup returning point geometry.
    #[must_use]
    pub const fn near_point(point: LatLon, radius_m: f64, limit: u32) -> Self {
        Self {
            filter: QueryFilter::new(),
            kind: QueryKind::NearPoint {
                point,
                radius_m,
                limit,
            },
            return_geometry: true,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn without_geometry(mut self) -> Self {
        self.return_geometry = false;
        self
    }

    /// Record limit, for queries that carry one.
    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        match self.kind {
            QueryKind::NearPoint { limit, .. } => Some(limit),
            _ => None,
        }
    }

    /// Message for a geometry-kind mismatch, or `None` if the query fits.
    #[must_use]
    pub fn geometry_mismatch(&self, layer: &LayerSpec) -> Option<String> {
        let required = self.kind.required_geometry()?;
        (required != layer.geometry).then(|| {
            format!(
                "{} query requires a {} layer, but '{}' is a {} layer",
                self.kind_name(),
                required.as_str(),
                layer.name,
                layer.geometry.as_str()
            )
        })
    }

    const fn kind_name(&self) -> &'static str {
        match self.kind {
            QueryKind::Attribute => "attribute",
            QueryKind::PointInPolygon { .. } => "point-in-polygon",
            QueryKind::NearPoint { .. } => "near-point",
        }
    }

    /// Form parameters for one page.
    #[must_use]
    pub fn params(
        &self,
        layer: &LayerSpec,
        offset: usize,
        page_size: u32,
        token: Option<&str>,
    ) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = vec![
            ("where".into(), self.filter.to_where()),
            ("outFields".into(), layer.out_fields()),
            ("returnGeometry".into(), self.return_geometry.to_string()),
            ("outSR".into(), "4326".into()),
            ("resultOffset".into(), offset.to_string()),
            ("resultRecordCount".into(), page_size.to_string()),
        ];

        match self.kind {
            QueryKind::Attribute => {}
            QueryKind::PointInPolygon { point } => {
                params.extend(point_params(point));
                params.push(("spatialRel".into(), "esriSpatialRelWithin".into()));
            }
            QueryKind::NearPoint {
                point, radius_m, ..
            } => {
                params.extend(point_params(point));
                params.push(("spatialRel".into(), "esriSpatialRelIntersects".into()));
                params.push(("distance".into(), radius_m.to_string()));
                params.push(("units".into(), "esriMeters".into()));
            }
        }

        if let Some(token) = token {
            params.push(("token".into(), token.to_string()));
        }
        params.push(("f".into(), "json".into()));
        params
    }
}

fn point_params(point: LatLon) -> [(String, String); 3] {
    let geometry = serde_json::json!({
        "x": point.lon,
        "y": point.lat,
        "spatialReference": {"wkid": 4326}
    });
    [
        ("geometry".into(), geometry.to_string()),
        ("geometryType".into(), "esriGeometryPoint".into()),
        ("inSR".into(), "4326".into()),
    ]
}

/// Short description used in logs and client errors.
impl fmt::Display for FeatureQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            QueryKind::Attribute => write!(f, "{}", self.filter),
            QueryKind::PointInPolygon { point } => {
                write!(f, "{} within POINT({} {})", self.filter, point.lon, point.lat)
            }
            QueryKind::NearPoint {
                point,
                radius_m,
                limit,
            } => write!(
                f,
                "{} within {radius_m}m of POINT({} {}) limit {limit}",
                self.filter, point.lon, point.lat
            ),
        }
    }
}
