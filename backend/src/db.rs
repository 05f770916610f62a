//! Persistence for listings, favorites, inquiries and users.
//!
//! Handlers talk to [`MarketplaceRepository`]. `PgRepository` backs it with
//! Postgres through Diesel; `MemoryRepository` keeps everything in process for
//! tests and for running without a database.

use async_trait::async_trait;

use crate::filters::PropertyFilters;
use crate::models::{
    Contact, DashboardStats, Favorite, Inquiry, NewContact, NewProperty, Property,
    PropertyChanges, PropertyImage, Statistics, UpsertUser, User,
};

mod error;
mod memory;
mod postgres;

pub use error::{RepositoryError, RepositoryResult};
pub use memory::MemoryRepository;
pub use postgres::{PgRepository, PostgresConfig};

#[async_trait]
pub trait MarketplaceRepository: Send + Sync {
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Inserts the user on first sign-in, otherwise refreshes identity fields
    /// and `last_signed_in`.
    async fn upsert_user(&self, user: UpsertUser) -> RepositoryResult<User>;
    async fn get_user(&self, id: i32) -> RepositoryResult<Option<User>>;
    async fn get_user_by_open_id(&self, open_id: &str) -> RepositoryResult<Option<User>>;

    async fn search_properties(&self, filters: &PropertyFilters) -> RepositoryResult<Vec<Property>>;
    async fn get_property(&self, id: i32) -> RepositoryResult<Option<Property>>;
    /// Images of a listing ordered by `display_order`.
    async fn get_property_images(&self, property_id: i32) -> RepositoryResult<Vec<PropertyImage>>;
    /// Stores the listing and its images; image order follows `image_urls`.
    async fn create_property(
        &self,
        property: NewProperty,
        image_urls: Vec<String>,
    ) -> RepositoryResult<Property>;
    async fn update_property(
        &self,
        id: i32,
        changes: PropertyChanges,
    ) -> RepositoryResult<Property>;
    /// Removes the listing with its images, favorites and inquiries.
    async fn delete_property(&self, id: i32) -> RepositoryResult<()>;
    async fn list_properties_by_owner(&self, owner_id: i32) -> RepositoryResult<Vec<Property>>;

    /// Flips the favorite flag and returns the new state.
    async fn toggle_favorite(&self, user_id: i32, property_id: i32) -> RepositoryResult<bool>;
    async fn list_favorites(&self, user_id: i32) -> RepositoryResult<Vec<Favorite>>;
    async fn is_favorite(&self, user_id: i32, property_id: i32) -> RepositoryResult<bool>;

    async fn create_contact(&self, contact: NewContact) -> RepositoryResult<Contact>;
    /// Inquiries on listings owned by `owner_id`, newest first.
    async fn list_inquiries_for_owner(&self, owner_id: i32) -> RepositoryResult<Vec<Inquiry>>;

    async fn statistics(&self) -> RepositoryResult<Statistics>;
    async fn dashboard_stats(&self, owner_id: i32) -> RepositoryResult<DashboardStats>;
}
