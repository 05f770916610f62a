use std::sync::Arc;

use crate::auth::AuthSettings;
use crate::db::MarketplaceRepository;
use crate::email::{DisabledMailer, Mailer};
use crate::geocoding::Geocoder;
use crate::storage::ImageStorage;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn MarketplaceRepository>,
    pub geocoder: Option<Arc<dyn Geocoder>>,
    pub mailer: Arc<dyn Mailer>,
    pub storage: Arc<dyn ImageStorage>,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn MarketplaceRepository>,
        auth: AuthSettings,
        storage: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            repository,
            geocoder: None,
            mailer: Arc::new(DisabledMailer),
            storage,
            auth,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}
