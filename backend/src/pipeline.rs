//! Distance annotation, radius filtering and ordering of search results.
//!
//! The database narrows listings by city, price, rooms and type. Everything
//! that depends on where the renter is searching from happens here, as one
//! pure function over the rows the query returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::geo::{haversine_km, GeoPoint};
use crate::models::Property;

/// What the pipeline needs to know about a row.
pub trait Listing {
    /// Coordinates, when both parts parse to finite numbers.
    fn location(&self) -> Option<GeoPoint>;
    fn price(&self) -> Option<i64>;
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

impl Listing for Property {
    fn location(&self) -> Option<GeoPoint> {
        GeoPoint::from_raw(&self.latitude, &self.longitude)
    }

    fn price(&self) -> Option<i64> {
        Some(i64::from(self.price))
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    Distance,
    PriceLow,
    PriceHigh,
    Newest,
}

/// Search-view state: where the renter searched from and how results are ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    pub origin: Option<GeoPoint>,
    /// Set once a location search has actually run. An origin left over from
    /// an earlier view does not annotate distances on its own.
    pub search_executed: bool,
    pub max_distance_km: Option<f64>,
    pub sort_by: Option<SortBy>,
}

impl SearchView {
    fn active_origin(&self) -> Option<GeoPoint> {
        self.origin.filter(|_| self.search_executed)
    }
}

/// A row with its distance from the search origin, if one could be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// Annotates, filters and sorts `items` according to `view`.
pub fn rank<T: Listing>(items: Vec<T>, view: &SearchView) -> Vec<Ranked<T>> {
    let mut ranked: Vec<Ranked<T>> = match view.active_origin() {
        Some(origin) => items
            .into_iter()
            .map(|item| {
                let distance = item.location().map(|at| haversine_km(at, origin));
                Ranked { item, distance }
            })
            .filter(|r| within_radius(r.distance, view.max_distance_km))
            .collect(),
        None => items
            .into_iter()
            .map(|item| Ranked { item, distance: None })
            .collect(),
    };

    if let Some(sort_by) = view.sort_by {
        ranked.sort_by(|a, b| compare(sort_by, a, b));
    }
    ranked
}

// Unknown distances always pass. A radius of zero or less is no radius, like the other
// zero-valued filters.
fn within_radius(distance: Option<f64>, max_km: Option<f64>) -> bool {
    match (distance, max_km) {
        (Some(d), Some(max)) if max > 0.0 => d <= max,
        _ => true,
    }
}

fn compare<T: Listing>(sort_by: SortBy, a: &Ranked<T>, b: &Ranked<T>) -> Ordering {
    let price = |r: &Ranked<T>| r.item.price().map_or(f64::INFINITY, |p| p as f64);
    let created = |r: &Ranked<T>| r.item.created_at().map_or(0, |t| t.timestamp_millis());

    match sort_by {
        SortBy::Distance => a
            .distance
            .unwrap_or(f64::INFINITY)
            .total_cmp(&b.distance.unwrap_or(f64::INFINITY)),
        SortBy::PriceLow => price(a).total_cmp(&price(b)),
        SortBy::PriceHigh => price(b).total_cmp(&price(a)),
        SortBy::Newest => created(b).cmp(&created(a)),
    }
}
