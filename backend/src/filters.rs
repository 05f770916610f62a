//! Server-side listing filters.

use serde::{Deserialize, Serialize};

use crate::models::{Property, PropertyType};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Country names that, typed into the city box, search the whole country.
pub const RECOGNIZED_COUNTRIES: &[&str] = &["Hungary"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilters {
    pub city: Option<String>,
    pub min_price: Option<i32>,
    pub max_price: Option<i32>,
    pub beds: Option<i32>,
    pub baths: Option<i32>,
    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// How the `city` filter is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationMatch<'a> {
    Country(&'static str),
    CityContains(&'a str),
}

impl PropertyFilters {
    pub fn location_match(&self) -> Option<LocationMatch<'_>> {
        let city = self.city.as_deref().filter(|c| !c.is_empty())?;
        let country = RECOGNIZED_COUNTRIES
            .iter()
            .copied()
            .find(|name| name.eq_ignore_ascii_case(city));
        Some(match country {
            Some(name) => LocationMatch::Country(name),
            None => LocationMatch::CityContains(city),
        })
    }

    // Zero behaves like an empty form field.
    pub fn min_price(&self) -> Option<i32> {
        self.min_price.filter(|v| *v != 0)
    }

    pub fn max_price(&self) -> Option<i32> {
        self.max_price.filter(|v| *v != 0)
    }

    pub fn beds(&self) -> Option<i32> {
        self.beds.filter(|v| *v != 0)
    }

    pub fn baths(&self) -> Option<i32> {
        self.baths.filter(|v| *v != 0)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l > 0)
            .map_or(DEFAULT_LIMIT, |l| l.min(MAX_LIMIT))
    }

    pub fn offset(&self) -> i64 {
        self.offset.filter(|o| *o > 0).unwrap_or(0)
    }

    /// In-process equivalent of the SQL `WHERE` clause.
    pub fn matches(&self, property: &Property) -> bool {
        let location = match self.location_match() {
            Some(LocationMatch::Country(country)) => property.country == country,
            Some(LocationMatch::CityContains(city)) => property
                .city
                .to_lowercase()
                .contains(&city.to_lowercase()),
            None => true,
        };

        location
            && self.min_price().map_or(true, |min| property.price >= min)
            && self.max_price().map_or(true, |max| property.price <= max)
            && self.beds().map_or(true, |beds| property.beds == beds)
            && self.baths().map_or(true, |baths| property.baths == baths)
            && self
                .property_type
                .map_or(true, |t| property.property_type == t.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_name_switches_to_country_match() {
        let filters = PropertyFilters {
            city: Some("hungary".into()),
            ..Default::default()
        };
        assert_eq!(filters.location_match(), Some(LocationMatch::Country("Hungary")));
    }

    #[test]
    fn other_values_match_city_substring() {
        let filters = PropertyFilters {
            city: Some("Buda".into()),
            ..Default::default()
        };
        assert_eq!(filters.location_match(), Some(LocationMatch::CityContains("Buda")));

        let empty = PropertyFilters {
            city: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(empty.location_match(), None);
    }

    #[test]
    fn zero_numeric_filters_are_unset() {
        let filters = PropertyFilters {
            min_price: Some(0),
            beds: Some(0),
            ..Default::default()
        };
        assert_eq!(filters.min_price(), None);
        assert_eq!(filters.beds(), None);
    }

    #[test]
    fn paging_defaults_and_caps() {
        assert_eq!(PropertyFilters::default().limit(), DEFAULT_LIMIT);
        assert_eq!(PropertyFilters::default().offset(), 0);

        let filters = PropertyFilters {
            limit: Some(5000),
            offset: Some(-3),
            ..Default::default()
        };
        assert_eq!(filters.limit(), MAX_LIMIT);
        assert_eq!(filters.offset(), 0);
    }
}
