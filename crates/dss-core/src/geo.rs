//! Geometry helpers: Esri JSON geometry, centroids, and great-circle distance.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Mean earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Esri JSON geometry as returned by feature service queries (`outSR=4326`).
///
/// Positions are kept as `Vec<f64>` so that Z/M values do not break parsing;
/// only the first two ordinates (x = longitude, y = latitude) are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Geometry {
    Point { x: f64, y: f64 },
    Polygon { rings: Vec<Vec<Vec<f64>>> },
    Polyline { paths: Vec<Vec<Vec<f64>>> },
    Other(serde_json::Value),
}

impl Geometry {
    /// Representative point of the geometry.
    ///
    /// Polygons use the area-weighted centroid over all rings (Esri winds holes
    /// opposite to outer rings, so holes subtract). Degenerate polygons and
    /// polylines fall back to the mean of their vertices.
    #[must_use]
    pub fn centroid(&self) -> Option<LatLon> {
        match self {
            Self::Point { x, y } if x.is_finite() && y.is_finite() => Some(LatLon::new(*y, *x)),
            Self::Polygon { rings } => polygon_centroid(rings).or_else(|| vertex_mean(rings)),
            Self::Polyline { paths } => vertex_mean(paths),
            Self::Point { .. } | Self::Other(_) => None,
        }
    }
}

fn polygon_centroid(rings: &[Vec<Vec<f64>>]) -> Option<LatLon> {
    let mut twice_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;

    for ring in rings {
        let points: Vec<(f64, f64)> = ring.iter().filter_map(|p| xy(p)).collect();
        if points.len() < 3 {
            continue;
        }
        for (i, &(x0, y0)) in points.iter().enumerate() {
            let (x1, y1) = points[(i + 1) % points.len()];
            let cross = x0.mul_add(y1, -(x1 * y0));
            twice_area += cross;
            cx += (x0 + x1) * cross;
            cy += (y0 + y1) * cross;
        }
    }

    if twice_area.abs() < f64::EPSILON {
        return None;
    }
    let factor = 3.0 * twice_area;
    Some(LatLon::new(cy / factor, cx / factor))
}

fn vertex_mean(parts: &[Vec<Vec<f64>>]) -> Option<LatLon> {
    let points: Vec<(f64, f64)> = parts.iter().flatten().filter_map(|p| xy(p)).collect();
    if points.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    Some(LatLon::new(sy / n, sx / n))
}

fn xy(position: &[f64]) -> Option<(f64, f64)> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Some((*x, *y)),
        _ => None,
    }
}

/// Great-circle distance between two WGS84 points in kilometres.
#[must_use]
pub fn haversine_km(a: LatLon, b: LatLon) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let h = (lat1.cos() * lat2.cos()).mul_add(
        (d_lon / 2.0).sin().powi(2),
        (d_lat / 2.0).sin().powi(2),
    );
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Minimum great-circle distance from `base` to any of `points`.
pub fn min_distance_km(base: LatLon, points: impl IntoIterator<Item = LatLon>) -> Option<f64> {
    points
        .into_iter()
        .map(|p| haversine_km(base, p))
        .reduce(f64::min)
}
