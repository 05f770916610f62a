//! In-memory repository for tests and for running without Postgres.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{MarketplaceRepository, RepositoryError, RepositoryResult};
use crate::filters::PropertyFilters;
use crate::models::{
    Contact, DashboardStats, Favorite, Inquiry, NewContact, NewProperty, Property,
    PropertyChanges, PropertyImage, Role, Statistics, UpsertUser, User,
};

#[derive(Clone, Default)]
pub struct MemoryRepository {
    data: Arc<RwLock<MemoryData>>,
}

#[derive(Default)]
struct MemoryData {
    users: BTreeMap<i32, User>,
    properties: BTreeMap<i32, Property>,
    images: Vec<PropertyImage>,
    // (user_id, property_id) is the uniqueness key.
    favorites: HashMap<(i32, i32), Favorite>,
    contacts: Vec<Contact>,
    next_id: i32,
}

impl MemoryData {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, MemoryData>> {
        self.data
            .read()
            .map_err(|_| RepositoryError::Internal("memory store lock poisoned".into()))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, MemoryData>> {
        self.data
            .write()
            .map_err(|_| RepositoryError::Internal("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl MarketplaceRepository for MemoryRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.read().is_ok())
    }

    async fn upsert_user(&self, user: UpsertUser) -> RepositoryResult<User> {
        let mut data = self.write()?;
        let now = Utc::now();

        if let Some(existing) = data.users.values_mut().find(|u| u.open_id == user.open_id) {
            if user.name.is_some() {
                existing.name = user.name;
            }
            if user.email.is_some() {
                existing.email = user.email;
            }
            if user.login_method.is_some() {
                existing.login_method = user.login_method;
            }
            if let Some(role) = user.role {
                existing.role = role.as_str().to_string();
            }
            existing.last_signed_in = user.last_signed_in;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let id = data.next_id();
        let created = User {
            id,
            open_id: user.open_id,
            name: user.name,
            email: user.email,
            login_method: user.login_method,
            role: user.role.unwrap_or(Role::User).as_str().to_string(),
            created_at: now,
            updated_at: now,
            last_signed_in: user.last_signed_in,
        };
        data.users.insert(id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: i32) -> RepositoryResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn get_user_by_open_id(&self, open_id: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.open_id == open_id)
            .cloned())
    }

    async fn search_properties(
        &self,
        filters: &PropertyFilters,
    ) -> RepositoryResult<Vec<Property>> {
        Ok(self
            .read()?
            .properties
            .values()
            .filter(|p| filters.matches(p))
            .skip(filters.offset() as usize)
            .take(filters.limit() as usize)
            .cloned()
            .collect())
    }

    async fn get_property(&self, id: i32) -> RepositoryResult<Option<Property>> {
        Ok(self.read()?.properties.get(&id).cloned())
    }

    async fn get_property_images(&self, property_id: i32) -> RepositoryResult<Vec<PropertyImage>> {
        let mut images: Vec<PropertyImage> = self
            .read()?
            .images
            .iter()
            .filter(|img| img.property_id == property_id)
            .cloned()
            .collect();
        images.sort_by_key(|img| (img.display_order, img.id));
        Ok(images)
    }

    async fn create_property(
        &self,
        property: NewProperty,
        image_urls: Vec<String>,
    ) -> RepositoryResult<Property> {
        let mut data = self.write()?;
        let now = Utc::now();
        let id = data.next_id();
        let created = Property {
            id,
            title: property.title,
            description: property.description,
            price: property.price,
            currency: property.currency,
            beds: property.beds,
            baths: property.baths,
            sqm: property.sqm,
            address: property.address,
            city: property.city,
            country: property.country,
            zip_code: property.zip_code,
            latitude: property.latitude,
            longitude: property.longitude,
            property_type: property.property_type,
            pet_friendly: property.pet_friendly,
            parking: property.parking,
            phone: property.phone,
            owner_id: property.owner_id,
            created_at: now,
            updated_at: now,
        };
        for (order, image_url) in image_urls.into_iter().enumerate() {
            let image_id = data.next_id();
            data.images.push(PropertyImage {
                id: image_id,
                property_id: id,
                image_url,
                display_order: order as i32,
                created_at: now,
            });
        }
        data.properties.insert(id, created.clone());
        Ok(created)
    }

    async fn update_property(
        &self,
        id: i32,
        changes: PropertyChanges,
    ) -> RepositoryResult<Property> {
        let mut data = self.write()?;
        let property = data.properties.get_mut(&id).ok_or(RepositoryError::NotFound {
            entity: "property",
            id,
        })?;
        changes.apply_to(property);
        property.updated_at = Utc::now();
        Ok(property.clone())
    }

    async fn delete_property(&self, id: i32) -> RepositoryResult<()> {
        let mut data = self.write()?;
        if data.properties.remove(&id).is_none() {
            return Err(RepositoryError::NotFound {
                entity: "property",
                id,
            });
        }
        data.images.retain(|img| img.property_id != id);
        data.favorites.retain(|(_, property_id), _| *property_id != id);
        data.contacts.retain(|c| c.property_id != id);
        Ok(())
    }

    async fn list_properties_by_owner(&self, owner_id: i32) -> RepositoryResult<Vec<Property>> {
        let mut owned: Vec<Property> = self
            .read()?
            .properties
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn toggle_favorite(&self, user_id: i32, property_id: i32) -> RepositoryResult<bool> {
        let mut data = self.write()?;
        let key = (user_id, property_id);
        if data.favorites.remove(&key).is_some() {
            return Ok(false);
        }
        let id = data.next_id();
        data.favorites.insert(
            key,
            Favorite {
                id,
                user_id,
                property_id,
                created_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn list_favorites(&self, user_id: i32) -> RepositoryResult<Vec<Favorite>> {
        let mut favorites: Vec<Favorite> = self
            .read()?
            .favorites
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        favorites.sort_by_key(|f| f.id);
        Ok(favorites)
    }

    async fn is_favorite(&self, user_id: i32, property_id: i32) -> RepositoryResult<bool> {
        Ok(self.read()?.favorites.contains_key(&(user_id, property_id)))
    }

    async fn create_contact(&self, contact: NewContact) -> RepositoryResult<Contact> {
        let mut data = self.write()?;
        let id = data.next_id();
        let created = Contact {
            id,
            property_id: contact.property_id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            message: contact.message,
            created_at: Utc::now(),
        };
        data.contacts.push(created.clone());
        Ok(created)
    }

    async fn list_inquiries_for_owner(&self, owner_id: i32) -> RepositoryResult<Vec<Inquiry>> {
        let data = self.read()?;
        let mut inquiries: Vec<Inquiry> = data
            .contacts
            .iter()
            .filter_map(|contact| {
                let property = data.properties.get(&contact.property_id)?;
                (property.owner_id == owner_id).then(|| Inquiry {
                    contact: contact.clone(),
                    property: property.clone(),
                })
            })
            .collect();
        inquiries.sort_by(|a, b| {
            b.contact
                .created_at
                .cmp(&a.contact.created_at)
                .then(b.contact.id.cmp(&a.contact.id))
        });
        Ok(inquiries)
    }

    async fn statistics(&self) -> RepositoryResult<Statistics> {
        let data = self.read()?;
        let mut cities: Vec<&str> = data.properties.values().map(|p| p.city.as_str()).collect();
        cities.sort_unstable();
        cities.dedup();
        Ok(Statistics {
            total_properties: data.properties.len() as i64,
            total_cities: cities.len() as i64,
            total_users: data.users.len() as i64,
        })
    }

    async fn dashboard_stats(&self, owner_id: i32) -> RepositoryResult<DashboardStats> {
        let data = self.read()?;
        let owns = |property_id: &i32| {
            data.properties
                .get(property_id)
                .is_some_and(|p| p.owner_id == owner_id)
        };
        Ok(DashboardStats {
            total_properties: data
                .properties
                .values()
                .filter(|p| p.owner_id == owner_id)
                .count() as i64,
            total_inquiries: data
                .contacts
                .iter()
                .filter(|c| owns(&c.property_id))
                .count() as i64,
            total_favorites: data
                .favorites
                .keys()
                .filter(|(_, property_id)| owns(property_id))
                .count() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;

    fn listing(owner_id: i32, city: &str, country: &str, price: i32, beds: i32) -> NewProperty {
        NewProperty {
            title: format!("{beds}BR in {city}"),
            description: None,
            price,
            currency: "HUF".into(),
            beds,
            baths: 1,
            sqm: Some(50),
            address: "1 Main Street".into(),
            city: city.into(),
            country: country.into(),
            zip_code: None,
            latitude: Some("47.4979".into()),
            longitude: Some("19.0402".into()),
            property_type: PropertyType::Apartment.as_str().into(),
            pet_friendly: false,
            parking: false,
            phone: None,
            owner_id,
        }
    }

    fn sign_in(open_id: &str) -> UpsertUser {
        UpsertUser {
            open_id: open_id.into(),
            name: Some("Anna".into()),
            email: Some("anna@example.com".into()),
            login_method: Some("google".into()),
            role: None,
            last_signed_in: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_per_identity() {
        let repo = MemoryRepository::new();
        let first = repo.upsert_user(sign_in("oid-1")).await.unwrap();
        let again = repo
            .upsert_user(UpsertUser {
                name: None,
                role: Some(Role::Admin),
                ..sign_in("oid-1")
            })
            .await
            .unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(again.name.as_deref(), Some("Anna"));
        assert!(again.is_admin());
        assert_eq!(repo.statistics().await.unwrap().total_users, 1);
    }

    #[tokio::test]
    async fn search_applies_city_and_country_filters() {
        let repo = MemoryRepository::new();
        repo.create_property(listing(1, "Budapest", "Hungary", 1200, 1), vec![]).await.unwrap();
        repo.create_property(listing(1, "Debrecen", "Hungary", 700, 2), vec![]).await.unwrap();
        repo.create_property(listing(1, "Vienna", "Austria", 1500, 2), vec![]).await.unwrap();

        let by_country = PropertyFilters {
            city: Some("HUNGARY".into()),
            ..Default::default()
        };
        assert_eq!(repo.search_properties(&by_country).await.unwrap().len(), 2);

        let by_city = PropertyFilters {
            city: Some("buda".into()),
            ..Default::default()
        };
        let found = repo.search_properties(&by_city).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].city, "Budapest");

        let two_beds_under_1000 = PropertyFilters {
            max_price: Some(1000),
            beds: Some(2),
            ..Default::default()
        };
        let found = repo.search_properties(&two_beds_under_1000).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].city, "Debrecen");
    }

    #[tokio::test]
    async fn search_pages_results() {
        let repo = MemoryRepository::new();
        for price in 1..=5 {
            repo.create_property(listing(1, "Szeged", "Hungary", price * 100, 1), vec![])
                .await
                .unwrap();
        }
        let page = PropertyFilters {
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        };
        let prices: Vec<i32> = repo
            .search_properties(&page)
            .await
            .unwrap()
            .iter()
            .map(|p| p.price)
            .collect();
        assert_eq!(prices, vec![300, 400]);
    }

    #[tokio::test]
    async fn toggle_flips_favorite_state() {
        let repo = MemoryRepository::new();
        assert!(repo.toggle_favorite(1, 10).await.unwrap());
        assert!(repo.is_favorite(1, 10).await.unwrap());
        assert_eq!(repo.list_favorites(1).await.unwrap().len(), 1);

        assert!(!repo.toggle_favorite(1, 10).await.unwrap());
        assert!(!repo.is_favorite(1, 10).await.unwrap());
        assert!(repo.list_favorites(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn images_come_back_in_display_order() {
        let repo = MemoryRepository::new();
        let urls = vec!["a.jpg".to_string(), "b.jpg".to_string(), "c.jpg".to_string()];
        let property = repo
            .create_property(listing(1, "Pécs", "Hungary", 800, 1), urls)
            .await
            .unwrap();

        let images = repo.get_property_images(property.id).await.unwrap();
        let urls: Vec<&str> = images.iter().map(|i| i.image_url.as_str()).collect();
        assert_eq!(urls, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[tokio::test]
    async fn delete_cascades_to_dependents() {
        let repo = MemoryRepository::new();
        let property = repo
            .create_property(listing(1, "Győr", "Hungary", 900, 1), vec!["x.jpg".into()])
            .await
            .unwrap();
        repo.toggle_favorite(2, property.id).await.unwrap();
        repo.create_contact(NewContact {
            property_id: property.id,
            name: "Béla".into(),
            email: "bela@example.com".into(),
            phone: None,
            message: "Is it available?".into(),
        })
        .await
        .unwrap();

        repo.delete_property(property.id).await.unwrap();

        assert!(repo.get_property(property.id).await.unwrap().is_none());
        assert!(repo.get_property_images(property.id).await.unwrap().is_empty());
        assert!(!repo.is_favorite(2, property.id).await.unwrap());
        assert!(repo.list_inquiries_for_owner(1).await.unwrap().is_empty());
        assert!(repo.delete_property(property.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let repo = MemoryRepository::new();
        let property = repo
            .create_property(listing(1, "Eger", "Hungary", 900, 1), vec![])
            .await
            .unwrap();

        let updated = repo
            .update_property(
                property.id,
                PropertyChanges {
                    price: Some(950),
                    description: Some("Freshly painted".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 950);
        assert_eq!(updated.description.as_deref(), Some("Freshly painted"));
        assert_eq!(updated.title, property.title);

        let missing = repo.update_property(9999, PropertyChanges::default()).await;
        assert!(missing.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn dashboard_counts_only_owned_listings() {
        let repo = MemoryRepository::new();
        let mine = repo
            .create_property(listing(1, "Budapest", "Hungary", 1000, 1), vec![])
            .await
            .unwrap();
        let theirs = repo
            .create_property(listing(2, "Budapest", "Hungary", 1000, 1), vec![])
            .await
            .unwrap();
        for property_id in [mine.id, theirs.id] {
            repo.create_contact(NewContact {
                property_id,
                name: "Renter".into(),
                email: "renter@example.com".into(),
                phone: None,
                message: "Hello".into(),
            })
            .await
            .unwrap();
        }
        repo.toggle_favorite(5, mine.id).await.unwrap();
        repo.toggle_favorite(6, mine.id).await.unwrap();

        let stats = repo.dashboard_stats(1).await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_properties: 1,
                total_inquiries: 1,
                total_favorites: 2,
            }
        );
        let inquiries = repo.list_inquiries_for_owner(1).await.unwrap();
        assert_eq!(inquiries.len(), 1);
        assert_eq!(inquiries[0].property.id, mine.id);

        let totals = repo.statistics().await.unwrap();
        assert_eq!(totals.total_properties, 2);
        assert_eq!(totals.total_cities, 1);
    }
}
