use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::{ApiPath, ApiQuery};
use crate::filters::PropertyFilters;
use crate::geo::map_view::{plan_map_view, MapView};
use crate::geo::{format_distance, to_number, GeoPoint};
use crate::geocoding;
use crate::models::{NewProperty, Property, PropertyChanges, PropertyDetail, PropertyType};
use crate::pipeline::{rank, Listing, Ranked, SearchView, SortBy};
use crate::state::AppState;

/// Query string of the listing search: database filters plus the search origin.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub city: Option<String>,
    pub min_price: Option<i32>,
    pub max_price: Option<i32>,
    pub beds: Option<i32>,
    pub baths: Option<i32>,
    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    /// Free-text place to search around when no coordinates are given.
    pub near: Option<String>,
    pub max_distance: Option<f64>,
    pub sort_by: Option<SortBy>,
}

impl SearchQuery {
    fn filters(&self) -> PropertyFilters {
        PropertyFilters {
            city: self.city.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            beds: self.beds,
            baths: self.baths,
            property_type: self.property_type,
            limit: self.limit,
            offset: self.offset,
        }
    }

    fn explicit_origin(&self) -> Option<GeoPoint> {
        GeoPoint::from_raw(&self.lat, &self.lng)
    }

    async fn origin(&self, state: &AppState) -> Option<GeoPoint> {
        if let Some(origin) = self.explicit_origin() {
            return Some(origin);
        }
        let near = self.near.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        let geocoder = state.geocoder.as_deref()?;
        geocoding::locate(geocoder, near).await
    }
}

async fn run_search(
    state: &AppState,
    query: &SearchQuery,
) -> Result<(Option<GeoPoint>, Vec<Ranked<Property>>), AppError> {
    let rows = state.repository.search_properties(&query.filters()).await?;
    let origin = query.origin(state).await;
    let view = SearchView {
        origin,
        search_executed: origin.is_some(),
        max_distance_km: query.max_distance,
        sort_by: query.sort_by,
    };
    Ok((origin, rank(rows, &view)))
}

/// Lists properties matching the filters, ranked around the search origin.
pub async fn search_properties(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Ranked<Property>>>, AppError> {
    let (_, results) = run_search(&state, &query).await?;
    log::info!("Search returned {} properties", results.len());
    Ok(Json(results))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    pub id: i32,
    pub title: String,
    pub price: i32,
    pub currency: String,
    pub position: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// `distance` for the marker popup, e.g. `"450 m"` or `"12.3 km"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MapResponse {
    #[serde(flatten)]
    pub view: MapView,
    pub markers: Vec<MapMarker>,
}

/// Map center, zoom and bounds for the same result set the search returns.
pub async fn property_map(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<MapResponse>, AppError> {
    let (origin, results) = run_search(&state, &query).await?;

    let markers: Vec<MapMarker> = results
        .into_iter()
        .filter_map(|ranked| {
            let position = ranked.item.location()?;
            Some(MapMarker {
                id: ranked.item.id,
                title: ranked.item.title,
                price: ranked.item.price,
                currency: ranked.item.currency,
                position,
                distance: ranked.distance,
                distance_label: ranked.distance.map(format_distance),
            })
        })
        .collect();
    let points: Vec<GeoPoint> = markers.iter().map(|m| m.position).collect();

    Ok(Json(MapResponse {
        view: plan_map_view(&points, origin),
        markers,
    }))
}

pub async fn get_property(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<PropertyDetail>, AppError> {
    log::info!("Fetching property with ID: {}", id);
    let property = find_property(&state, id).await?;
    let images = state.repository.get_property_images(id).await?;
    Ok(Json(PropertyDetail { property, images }))
}

/// A coordinate sent either as a JSON number or as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CoordinateInput {
    Number(f64),
    Text(String),
}

impl CoordinateInput {
    fn value(&self) -> Option<f64> {
        match self {
            CoordinateInput::Number(n) => to_number(*n),
            CoordinateInput::Text(s) => to_number(s.as_str()),
        }
    }
}

/// Normalizes a coordinate pair for storage; anything unusable is dropped.
fn coordinates(lat: &Option<CoordinateInput>, lng: &Option<CoordinateInput>) -> Option<GeoPoint> {
    Some(GeoPoint {
        lat: lat.as_ref()?.value()?,
        lng: lng.as_ref()?.value()?,
    })
}

fn default_currency() -> String {
    "HUF".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyInput {
    pub title: String,
    pub description: Option<String>,
    pub price: i32,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub beds: i32,
    pub baths: i32,
    pub sqm: Option<i32>,
    pub address: String,
    pub city: String,
    pub country: String,
    pub zip_code: Option<String>,
    pub latitude: Option<CoordinateInput>,
    pub longitude: Option<CoordinateInput>,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default)]
    pub pet_friendly: bool,
    #[serde(default)]
    pub parking: bool,
    pub phone: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl CreatePropertyInput {
    fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("title", &self.title),
            ("address", &self.address),
            ("city", &self.city),
            ("country", &self.country),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AppError::BadRequest(format!("{} is required", field)));
        }
        if self.price < 0 || self.beds < 0 || self.baths < 0 || self.sqm.is_some_and(|s| s < 0) {
            return Err(AppError::BadRequest(
                "price, beds, baths and sqm must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    fn into_new_property(
        self,
        owner_id: i32,
        location: Option<GeoPoint>,
    ) -> (NewProperty, Vec<String>) {
        let property = NewProperty {
            title: self.title,
            description: self.description,
            price: self.price,
            currency: self.currency,
            beds: self.beds,
            baths: self.baths,
            sqm: self.sqm,
            address: self.address,
            city: self.city,
            country: self.country,
            zip_code: self.zip_code,
            latitude: location.map(|p| p.lat.to_string()),
            longitude: location.map(|p| p.lng.to_string()),
            property_type: self.property_type.as_str().to_string(),
            pet_friendly: self.pet_friendly,
            parking: self.parking,
            phone: self.phone,
            owner_id,
        };
        (property, self.image_urls)
    }
}

pub async fn create_property(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<CreatePropertyInput>,
) -> Result<Json<Property>, AppError> {
    input.validate()?;

    let mut location = coordinates(&input.latitude, &input.longitude);
    if location.is_none() {
        if let Some(geocoder) = state.geocoder.as_deref() {
            let address = format!("{}, {}, {}", input.address, input.city, input.country);
            location = geocoding::locate(geocoder, &address).await;
        }
    }

    let (new_property, image_urls) = input.into_new_property(user.id, location);
    let property = state
        .repository
        .create_property(new_property, image_urls)
        .await?;
    log::info!("User {} listed property {}", user.id, property.id);
    Ok(Json(property))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyInput {
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
    pub latitude: Option<CoordinateInput>,
    pub longitude: Option<CoordinateInput>,
    pub pet_friendly: Option<bool>,
    pub parking: Option<bool>,
}

impl From<UpdatePropertyInput> for PropertyChanges {
    fn from(input: UpdatePropertyInput) -> Self {
        // Coordinates only change as a valid pair.
        let location = coordinates(&input.latitude, &input.longitude);
        PropertyChanges {
            title: input.title,
            description: input.description,
            price: input.price,
            beds: input.beds,
            baths: input.baths,
            sqm: input.sqm,
            address: input.address,
            city: input.city,
            country: input.country,
            zip_code: input.zip_code,
            latitude: location.map(|p| p.lat.to_string()),
            longitude: location.map(|p| p.lng.to_string()),
            pet_friendly: input.pet_friendly,
            parking: input.parking,
            updated_at: Some(Utc::now()),
        }
    }
}

pub async fn update_property(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i32>,
    Json(input): Json<UpdatePropertyInput>,
) -> Result<Json<Property>, AppError> {
    let property = find_property(&state, id).await?;
    if property.owner_id != user.id {
        return Err(AppError::Forbidden("You can only update your own properties".to_string()));
    }

    let updated = state.repository.update_property(id, input.into()).await?;
    log::info!("User {} updated property {}", user.id, id);
    Ok(Json(updated))
}

pub async fn delete_property(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Value>, AppError> {
    let property = find_property(&state, id).await?;
    if property.owner_id != user.id {
        return Err(AppError::Forbidden("You can only delete your own properties".to_string()));
    }

    state.repository.delete_property(id).await?;
    log::info!("User {} deleted property {}", user.id, id);
    Ok(Json(json!({ "success": true })))
}

pub(crate) async fn find_property(state: &AppState, id: i32) -> Result<Property, AppError> {
    state
        .repository
        .get_property(id)
        .await?
        .ok_or_else(|| {
            log::info!("Property {} not found", id);
            AppError::NotFound("Property not found".to_string())
        })
}
