use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::{contacts, favorites, properties, property_images, users};

/// Kind of rental listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Studio,
    Apartment,
    House,
    Room,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Studio => "studio",
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Room => "room",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_signed_in: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }

    /// Name used when addressing the user in emails.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Property Owner")
    }
}

/// Identity fields refreshed every time a user signs in.
#[derive(Debug, Clone)]
pub struct UpsertUser {
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Option<Role>,
    pub last_signed_in: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub open_id: &'a str,
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub login_method: Option<&'a str>,
    pub role: &'a str,
    pub last_signed_in: DateTime<Utc>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChanges<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub login_method: Option<&'a str>,
    pub role: Option<&'a str>,
    pub last_signed_in: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = properties)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub price: i32,
    pub currency: String,
    pub beds: i32,
    pub baths: i32,
    pub sqm: Option<i32>,
    pub address: String,
    pub city: String,
    pub country: String,
    pub zip_code: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    #[serde(rename = "type")]
    pub property_type: String,
    pub pet_friendly: bool,
    pub parking: bool,
    pub phone: Option<String>,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = properties)]
pub struct NewProperty {
    pub title: String,
    pub description: Option<String>,
    pub price: i32,
    pub currency: String,
    pub beds: i32,
    pub baths: i32,
    pub sqm: Option<i32>,
    pub address: String,
    pub city: String,
    pub country: String,
    pub zip_code: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub property_type: String,
    pub pet_friendly: bool,
    pub parking: bool,
    pub phone: Option<String>,
    pub owner_id: i32,
}

/// Partial update of a listing. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = properties)]
pub struct PropertyChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i32>,
    pub beds: Option<i32>,
    pub baths: Option<i32>,
    pub sqm: Option<i32>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub pet_friendly: Option<bool>,
    pub parking: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PropertyChanges {
    /// Applies the set fields to an in-memory row.
    pub fn apply_to(&self, property: &mut Property) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(value) = &self.$field {
                    property.$field = value.clone();
                })*
            };
        }
        macro_rules! set_opt {
            ($($field:ident),*) => {
                $(if let Some(value) = &self.$field {
                    property.$field = Some(value.clone());
                })*
            };
        }
        set!(title, price, beds, baths, address, city, country, pet_friendly, parking, updated_at);
        set_opt!(description, sqm, zip_code, latitude, longitude);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = property_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct PropertyImage {
    pub id: i32,
    pub property_id: i32,
    pub image_url: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = property_images)]
pub(crate) struct NewPropertyImage<'a> {
    pub property_id: i32,
    pub image_url: &'a str,
    pub display_order: i32,
}

/// A listing together with its gallery, as returned by the detail lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: Property,
    pub images: Vec<PropertyImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = favorites)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: i32,
    pub user_id: i32,
    pub property_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = favorites)]
pub(crate) struct NewFavorite {
    pub user_id: i32,
    pub property_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = contacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i32,
    pub property_id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = contacts)]
pub struct NewContact {
    pub property_id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

/// An inquiry paired with the listing it was sent about.
#[derive(Debug, Clone, Serialize)]
pub struct Inquiry {
    pub contact: Contact,
    pub property: Property,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_properties: i64,
    pub total_cities: i64,
    pub total_users: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_properties: i64,
    pub total_inquiries: i64,
    pub total_favorites: i64,
}
