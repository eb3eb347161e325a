use crate::model::{CountryRecord, Metric, Viewport};

const METERS_PER_DEGREE: f64 = 111_320.0;
const MAX_MARKER_RADIUS_DEG: f64 = 12.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub iso_code: String,
    pub lat: f64,
    pub long: f64,
    pub radius_deg: f64,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

pub fn marker_radius_m(value: u64, metric: Metric) -> f64 {
    (value as f64).sqrt() * metric.marker_multiplier()
}

/// One circle per country with a known, non-zero value for `metric`.
pub fn markers(records: &[CountryRecord], metric: Metric) -> Vec<Marker> {
    records
        .iter()
        .filter_map(|record| {
            let value = record.count(metric).filter(|v| *v > 0)?;
            let radius_deg =
                (marker_radius_m(value, metric) / METERS_PER_DEGREE).min(MAX_MARKER_RADIUS_DEG);
            Some(Marker {
                iso_code: record.iso_code.clone(),
                lat: record.coordinates.lat,
                long: record.coordinates.long,
                radius_deg,
                value,
            })
        })
        .collect()
}

/// Visible lon/lat window. The default zoom shows the whole world; each zoom
/// step halves the span, and the window is shifted to stay on the map.
pub fn bounds(viewport: &Viewport) -> MapBounds {
    let steps = i32::from(viewport.zoom) - i32::from(Viewport::DEFAULT_ZOOM);
    let lon_half = (180.0 / 2f64.powi(steps.max(0))).min(180.0);
    let lat_half = (lon_half / 2.0).min(90.0);
    MapBounds {
        x: window(viewport.center.long, lon_half, 180.0),
        y: window(viewport.center.lat, lat_half, 90.0),
    }
}

fn window(center: f64, half: f64, limit: f64) -> [f64; 2] {
    if half >= limit {
        return [-limit, limit];
    }
    let lo = center - half;
    let hi = center + half;
    if lo < -limit {
        [-limit, -limit + 2.0 * half]
    } else if hi > limit {
        [limit - 2.0 * half, limit]
    } else {
        [lo, hi]
    }
}
