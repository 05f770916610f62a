//! Forward geocoding (address → coordinates) over the Google Maps HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::geo::GeoPoint;

pub const GOOGLE_MAPS_BASE_URL: &str = "https://maps.googleapis.com";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Geocoding service answered {status}: {message}")]
    Service { status: String, message: String },
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// First match for `address`, or `None` when nothing matched.
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, GeocodeError>;
}

/// Geocodes `address`, logging and swallowing failures so callers can carry
/// on without distance features.
pub async fn locate(geocoder: &dyn Geocoder, address: &str) -> Option<GeoPoint> {
    match geocoder.geocode(address).await {
        Ok(Some(point)) => Some(point),
        Ok(None) => {
            log::info!("No geocoding match for {:?}", address);
            None
        }
        Err(e) => {
            log::warn!("Geocoding {:?} failed: {}", address, e);
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: GeoPoint,
}

impl GeocodeResponse {
    fn first_location(self) -> Result<Option<GeoPoint>, GeocodeError> {
        match self.status.as_str() {
            "" | "OK" | "ZERO_RESULTS" => Ok(self
                .results
                .into_iter()
                .next()
                .map(|r| r.geometry.location)
                .filter(GeoPoint::is_finite)),
            _ => Err(GeocodeError::Service {
                status: self.status,
                message: self.error_message.unwrap_or_default(),
            }),
        }
    }
}

pub struct GoogleGeocoder {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let url = format!("{}/maps/api/geocode/json", self.base_url);
        let mut query = vec![("address", address)];
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }

        let response: GeocodeResponse = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response.first_location()
    }
}
