use config::{Config, ConfigError, Environment};
use dotenv::dotenv;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::geocoding::GOOGLE_MAPS_BASE_URL;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Unset selects the in-memory store.
    pub database_url: Option<String>,
    pub port: u16,
    pub jwt_secret: String,
    pub owner_open_id: Option<String>,
    pub google_maps_api_key: Option<String>,
    pub geocoding_base_url: String,
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub upload_dir: String,
    pub public_upload_url: String,
    pub db_pool_max: u32,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_source(Environment::default())
    }

    /// Builds the config from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_source(Environment::default().source(Some(vars)))
    }

    fn from_source(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("port", 8080)?
            .set_default("geocoding_base_url", GOOGLE_MAPS_BASE_URL)?
            .set_default("upload_dir", "uploads")?
            .set_default("public_upload_url", "/uploads")?
            .set_default("db_pool_max", 10)?
            .set_default("http_timeout_secs", 10)?
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn database_url(&self) -> Option<&str> {
        non_empty(&self.database_url)
    }

    pub fn owner_open_id(&self) -> Option<&str> {
        non_empty(&self.owner_open_id)
    }

    pub fn google_maps_api_key(&self) -> Option<&str> {
        non_empty(&self.google_maps_api_key)
    }

    /// Geocoding needs a key unless the base URL points somewhere other than Google.
    pub fn geocoding_enabled(&self) -> bool {
        self.google_maps_api_key().is_some() || self.geocoding_base_url != GOOGLE_MAPS_BASE_URL
    }

    /// URL and key, only when both are set.
    pub fn email_service(&self) -> Option<(&str, &str)> {
        Some((non_empty(&self.email_api_url)?, non_empty(&self.email_api_key)?))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
