use serde::{Deserialize, Serialize};

/// A validated latitude/longitude pair in degrees. Both parts are finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Builds a point only when both coordinates normalize to finite numbers.
    pub fn from_raw<'a, 'b>(
        lat: impl Into<RawCoordinate<'a>>,
        lng: impl Into<RawCoordinate<'b>>,
    ) -> Option<Self> {
        Some(Self {
            lat: to_number(lat)?,
            lng: to_number(lng)?,
        })
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// A coordinate as it arrives from storage or a request: a number, a numeric
/// string, or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawCoordinate<'a> {
    Number(f64),
    Text(&'a str),
    Missing,
}

impl From<f64> for RawCoordinate<'_> {
    fn from(value: f64) -> Self {
        RawCoordinate::Number(value)
    }
}

impl From<Option<f64>> for RawCoordinate<'_> {
    fn from(value: Option<f64>) -> Self {
        value.map_or(RawCoordinate::Missing, RawCoordinate::Number)
    }
}

impl<'a> From<&'a str> for RawCoordinate<'a> {
    fn from(value: &'a str) -> Self {
        RawCoordinate::Text(value)
    }
}

impl<'a> From<Option<&'a str>> for RawCoordinate<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(RawCoordinate::Missing, RawCoordinate::Text)
    }
}

impl<'a> From<&'a Option<String>> for RawCoordinate<'a> {
    fn from(value: &'a Option<String>) -> Self {
        value.as_deref().into()
    }
}

/// Normalizes a coordinate to a finite number.
///
/// Strings are trimmed and parsed strictly, so `"40.7abc"` is rejected rather
/// than truncated. NaN and infinities map to `None`.
pub fn to_number<'a>(value: impl Into<RawCoordinate<'a>>) -> Option<f64> {
    let number = match value.into() {
        RawCoordinate::Number(n) => n,
        RawCoordinate::Text(s) => s.trim().parse::<f64>().ok()?,
        RawCoordinate::Missing => return None,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_strings() {
        assert_eq!(to_number("40.7128"), Some(40.7128));
        assert_eq!(to_number(" -73.9 "), Some(-73.9));
    }

    #[test]
    fn rejects_missing_and_garbage() {
        assert_eq!(to_number(None::<&str>), None);
        assert_eq!(to_number(None::<f64>), None);
        assert_eq!(to_number("abc"), None);
        assert_eq!(to_number(""), None);
        assert_eq!(to_number("40.7abc"), None);
    }

    #[test]
    fn rejects_non_finite() {
        assert_eq!(to_number(f64::NAN), None);
        assert_eq!(to_number(f64::INFINITY), None);
        assert_eq!(to_number("Infinity"), None);
        assert_eq!(to_number("NaN"), None);
    }

    #[test]
    fn passes_numbers_through() {
        assert_eq!(to_number(19.0402), Some(19.0402));
        assert_eq!(to_number(Some(0.0)), Some(0.0));
    }

    #[test]
    fn point_needs_both_parts() {
        let lat = Some("47.4979".to_string());
        let lng: Option<String> = None;
        assert_eq!(GeoPoint::from_raw(&lat, &lng), None);

        let lng = Some("19.0402".to_string());
        assert_eq!(
            GeoPoint::from_raw(&lat, &lng),
            Some(GeoPoint { lat: 47.4979, lng: 19.0402 })
        );
    }
}
