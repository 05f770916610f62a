//! Center, zoom and bounds for the listings map.

use serde::Serialize;

use super::GeoPoint;

/// Used when nothing on the page carries usable coordinates (Budapest).
pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    lat: 47.4979,
    lng: 19.0402,
};
pub const SEARCH_ZOOM: u8 = 13;
pub const OVERVIEW_ZOOM: u8 = 4;
pub const BOUNDS_PADDING_PX: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    fn around(point: GeoPoint) -> Self {
        Self {
            south: point.lat,
            west: point.lng,
            north: point.lat,
            east: point.lng,
        }
    }

    fn extend(mut self, point: GeoPoint) -> Self {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Padding {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Padding {
    pub const fn uniform(px: u32) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: u8,
    pub bounds: Option<Bounds>,
    pub padding: Padding,
}

/// Picks the map center: the explicit search point when it is finite,
/// otherwise the mean of the listing coordinates, otherwise [`DEFAULT_CENTER`].
pub fn map_center(points: &[GeoPoint], search: Option<GeoPoint>) -> GeoPoint {
    if let Some(search) = search.filter(GeoPoint::is_finite) {
        return search;
    }

    let valid: Vec<&GeoPoint> = points.iter().filter(|p| p.is_finite()).collect();
    if valid.is_empty() {
        return DEFAULT_CENTER;
    }

    let count = valid.len() as f64;
    GeoPoint {
        lat: valid.iter().map(|p| p.lat).sum::<f64>() / count,
        lng: valid.iter().map(|p| p.lng).sum::<f64>() / count,
    }
}

/// Smallest box enclosing every finite point, or `None` when there are none.
pub fn fit_bounds(points: &[GeoPoint]) -> Option<Bounds> {
    let mut finite = points.iter().copied().filter(GeoPoint::is_finite);
    let first = finite.next()?;
    Some(finite.fold(Bounds::around(first), Bounds::extend))
}

pub fn plan_map_view(points: &[GeoPoint], search: Option<GeoPoint>) -> MapView {
    let searching = search.is_some_and(|p| p.is_finite());
    MapView {
        center: map_center(points, search),
        zoom: if searching { SEARCH_ZOOM } else { OVERVIEW_ZOOM },
        bounds: fit_bounds(points),
        padding: Padding::uniform(BOUNDS_PADDING_PX),
    }
}
