//! Postgres repository implementation using Diesel.
//!
//! Diesel is synchronous, so every call checks a connection out of an r2d2
//! pool and runs on the blocking thread pool.

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use super::{MarketplaceRepository, RepositoryError, RepositoryResult};
use crate::filters::{LocationMatch, PropertyFilters};
use crate::models::{
    Contact, DashboardStats, Favorite, Inquiry, NewContact, NewFavorite, NewProperty,
    NewPropertyImage, NewUserRow, Property, PropertyChanges, PropertyImage, Role, Statistics,
    UpsertUser, User, UserChanges,
};
use crate::schema::{contacts, favorites, properties, property_images, users};

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_pool_size: u32,
    pub connection_timeout_sec: u64,
}

impl PostgresConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_pool_size: 10,
            connection_timeout_sec: 30,
        }
    }
}

pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn connect(config: &PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .build(manager)
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        log::info!(
            "Database pool ready with up to {} connections",
            config.max_pool_size
        );
        Ok(Self { pool })
    }

    pub fn run_migrations(&self) -> RepositoryResult<()> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| RepositoryError::Migration(e.to_string()))?;
        log::info!("Applied {} pending migrations", applied.len());
        Ok(())
    }

    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                log::error!("Failed to check out a connection for {}: {}", operation, e);
                RepositoryError::Connection(e.to_string())
            })?;
            f(&mut conn).map_err(|e| {
                log::error!("{} failed: {}", operation, e);
                RepositoryError::query(operation, e)
            })
        })
        .await
        .map_err(|e| RepositoryError::Internal(e.to_string()))?
    }
}

#[async_trait]
impl MarketplaceRepository for PgRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            let one: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("1"))
                .get_result(conn)?;
            Ok(one == 1)
        })
        .await
    }

    async fn upsert_user(&self, user: UpsertUser) -> RepositoryResult<User> {
        self.with_conn("upsert_user", move |conn| {
            let role = user.role.map(|r| r.as_str());
            let row = NewUserRow {
                open_id: &user.open_id,
                name: user.name.as_deref(),
                email: user.email.as_deref(),
                login_method: user.login_method.as_deref(),
                role: role.unwrap_or(Role::User.as_str()),
                last_signed_in: user.last_signed_in,
            };
            let changes = UserChanges {
                name: user.name.as_deref(),
                email: user.email.as_deref(),
                login_method: user.login_method.as_deref(),
                role,
                last_signed_in: user.last_signed_in,
                updated_at: Utc::now(),
            };
            diesel::insert_into(users::table)
                .values(&row)
                .on_conflict(users::open_id)
                .do_update()
                .set(&changes)
                .returning(User::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn get_user(&self, id: i32) -> RepositoryResult<Option<User>> {
        self.with_conn("get_user", move |conn| {
            users::table
                .find(id)
                .select(User::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn get_user_by_open_id(&self, open_id: &str) -> RepositoryResult<Option<User>> {
        let open_id = open_id.to_string();
        self.with_conn("get_user_by_open_id", move |conn| {
            users::table
                .filter(users::open_id.eq(open_id))
                .select(User::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn search_properties(
        &self,
        filters: &PropertyFilters,
    ) -> RepositoryResult<Vec<Property>> {
        let filters = filters.clone();
        self.with_conn("search_properties", move |conn| {
            let mut query = properties::table
                .select(Property::as_select())
                .into_boxed();

            match filters.location_match() {
                Some(LocationMatch::Country(country)) => {
                    query = query.filter(properties::country.eq(country));
                }
                Some(LocationMatch::CityContains(city)) => {
                    query = query.filter(properties::city.ilike(format!("%{}%", city)));
                }
                None => {}
            }
            if let Some(min) = filters.min_price() {
                query = query.filter(properties::price.ge(min));
            }
            if let Some(max) = filters.max_price() {
                query = query.filter(properties::price.le(max));
            }
            if let Some(beds) = filters.beds() {
                query = query.filter(properties::beds.eq(beds));
            }
            if let Some(baths) = filters.baths() {
                query = query.filter(properties::baths.eq(baths));
            }
            if let Some(kind) = filters.property_type {
                query = query.filter(properties::property_type.eq(kind.as_str()));
            }

            query
                .order(properties::id.asc())
                .limit(filters.limit())
                .offset(filters.offset())
                .load(conn)
        })
        .await
    }

    async fn get_property(&self, id: i32) -> RepositoryResult<Option<Property>> {
        self.with_conn("get_property", move |conn| {
            properties::table
                .find(id)
                .select(Property::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn get_property_images(&self, property_id: i32) -> RepositoryResult<Vec<PropertyImage>> {
        self.with_conn("get_property_images", move |conn| {
            property_images::table
                .filter(property_images::property_id.eq(property_id))
                .order((property_images::display_order.asc(), property_images::id.asc()))
                .select(PropertyImage::as_select())
                .load(conn)
        })
        .await
    }

    async fn create_property(
        &self,
        property: NewProperty,
        image_urls: Vec<String>,
    ) -> RepositoryResult<Property> {
        self.with_conn("create_property", move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let created: Property = diesel::insert_into(properties::table)
                    .values(&property)
                    .returning(Property::as_returning())
                    .get_result(conn)?;

                let images: Vec<NewPropertyImage<'_>> = image_urls
                    .iter()
                    .enumerate()
                    .map(|(order, url)| NewPropertyImage {
                        property_id: created.id,
                        image_url: url,
                        display_order: order as i32,
                    })
                    .collect();
                if !images.is_empty() {
                    diesel::insert_into(property_images::table)
                        .values(&images)
                        .execute(conn)?;
                }
                Ok(created)
            })
        })
        .await
    }

    async fn update_property(
        &self,
        id: i32,
        changes: PropertyChanges,
    ) -> RepositoryResult<Property> {
        let changes = PropertyChanges {
            updated_at: Some(Utc::now()),
            ..changes
        };
        self.with_conn("update_property", move |conn| {
            diesel::update(properties::table.find(id))
                .set(&changes)
                .returning(Property::as_returning())
                .get_result(conn)
                .optional()
        })
        .await?
        .ok_or(RepositoryError::NotFound {
            entity: "property",
            id,
        })
    }

    async fn delete_property(&self, id: i32) -> RepositoryResult<()> {
        let deleted = self
            .with_conn("delete_property", move |conn| {
                conn.transaction::<_, diesel::result::Error, _>(|conn| {
                    diesel::delete(
                        property_images::table.filter(property_images::property_id.eq(id)),
                    )
                    .execute(conn)?;
                    diesel::delete(favorites::table.filter(favorites::property_id.eq(id)))
                        .execute(conn)?;
                    diesel::delete(contacts::table.filter(contacts::property_id.eq(id)))
                        .execute(conn)?;
                    diesel::delete(properties::table.find(id)).execute(conn)
                })
            })
            .await?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound {
                entity: "property",
                id,
            });
        }
        Ok(())
    }

    async fn list_properties_by_owner(&self, owner_id: i32) -> RepositoryResult<Vec<Property>> {
        self.with_conn("list_properties_by_owner", move |conn| {
            properties::table
                .filter(properties::owner_id.eq(owner_id))
                .order(properties::created_at.desc())
                .select(Property::as_select())
                .load(conn)
        })
        .await
    }

    async fn toggle_favorite(&self, user_id: i32, property_id: i32) -> RepositoryResult<bool> {
        self.with_conn("toggle_favorite", move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let removed = diesel::delete(
                    favorites::table
                        .filter(favorites::user_id.eq(user_id))
                        .filter(favorites::property_id.eq(property_id)),
                )
                .execute(conn)?;
                if removed > 0 {
                    return Ok(false);
                }
                diesel::insert_into(favorites::table)
                    .values(&NewFavorite {
                        user_id,
                        property_id,
                    })
                    .on_conflict_do_nothing()
                    .execute(conn)?;
                Ok(true)
            })
        })
        .await
    }

    async fn list_favorites(&self, user_id: i32) -> RepositoryResult<Vec<Favorite>> {
        self.with_conn("list_favorites", move |conn| {
            favorites::table
                .filter(favorites::user_id.eq(user_id))
                .order(favorites::id.asc())
                .select(Favorite::as_select())
                .load(conn)
        })
        .await
    }

    async fn is_favorite(&self, user_id: i32, property_id: i32) -> RepositoryResult<bool> {
        self.with_conn("is_favorite", move |conn| {
            diesel::select(diesel::dsl::exists(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::property_id.eq(property_id)),
            ))
            .get_result(conn)
        })
        .await
    }

    async fn create_contact(&self, contact: NewContact) -> RepositoryResult<Contact> {
        self.with_conn("create_contact", move |conn| {
            diesel::insert_into(contacts::table)
                .values(&contact)
                .returning(Contact::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn list_inquiries_for_owner(&self, owner_id: i32) -> RepositoryResult<Vec<Inquiry>> {
        let rows: Vec<(Contact, Property)> = self
            .with_conn("list_inquiries_for_owner", move |conn| {
                contacts::table
                    .inner_join(properties::table)
                    .filter(properties::owner_id.eq(owner_id))
                    .order((contacts::created_at.desc(), contacts::id.desc()))
                    .select((Contact::as_select(), Property::as_select()))
                    .load(conn)
            })
            .await?;
        Ok(rows
            .into_iter()
            .map(|(contact, property)| Inquiry { contact, property })
            .collect())
    }

    async fn statistics(&self) -> RepositoryResult<Statistics> {
        self.with_conn("statistics", |conn| {
            Ok(Statistics {
                total_properties: properties::table.count().get_result(conn)?,
                total_cities: properties::table
                    .select(diesel::dsl::count(properties::city).aggregate_distinct())
                    .first(conn)?,
                total_users: users::table.count().get_result(conn)?,
            })
        })
        .await
    }

    async fn dashboard_stats(&self, owner_id: i32) -> RepositoryResult<DashboardStats> {
        self.with_conn("dashboard_stats", move |conn| {
            Ok(DashboardStats {
                total_properties: properties::table
                    .filter(properties::owner_id.eq(owner_id))
                    .count()
                    .get_result(conn)?,
                total_inquiries: contacts::table
                    .inner_join(properties::table)
                    .filter(properties::owner_id.eq(owner_id))
                    .count()
                    .get_result(conn)?,
                total_favorites: favorites::table
                    .inner_join(properties::table)
                    .filter(properties::owner_id.eq(owner_id))
                    .count()
                    .get_result(conn)?,
            })
        })
        .await
    }
}
