//! Renter inquiries about a listing.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::email::{self, RenterDetails};
use crate::error::AppError;
use crate::models::{Contact, NewContact, Property};
use crate::property::find_property;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryInput {
    pub property_id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

impl InquiryInput {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() || self.message.trim().is_empty() {
            return Err(AppError::BadRequest("name and message are required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(AppError::BadRequest("A valid email address is required".to_string()));
        }
        Ok(())
    }
}

pub async fn create_inquiry(
    State(state): State<AppState>,
    Json(input): Json<InquiryInput>,
) -> Result<Json<Value>, AppError> {
    input.validate()?;
    let property = find_property(&state, input.property_id).await?;

    let contact = state
        .repository
        .create_contact(NewContact {
            property_id: input.property_id,
            name: input.name,
            email: input.email,
            phone: input.phone.filter(|p| !p.trim().is_empty()),
            message: input.message,
        })
        .await?;
    log::info!("Stored inquiry {} for property {}", contact.id, property.id);

    notify(&state, &property, &contact).await;
    Ok(Json(json!({ "success": true })))
}

// Mail problems are logged inside `deliver` and never fail the inquiry.
async fn notify(state: &AppState, property: &Property, contact: &Contact) {
    let owner = match state.repository.get_user(property.owner_id).await {
        Ok(owner) => owner,
        Err(e) => {
            log::warn!("Could not load owner of property {}: {}", property.id, e);
            None
        }
    };
    let landlord_name = owner
        .as_ref()
        .map_or("Property Owner", |o| o.display_name())
        .to_string();

    match owner.as_ref().and_then(|o| o.email.as_deref()) {
        Some(landlord_email) => {
            let renter = RenterDetails {
                name: &contact.name,
                email: &contact.email,
                phone: contact.phone.as_deref(),
                message: &contact.message,
            };
            let mail = email::landlord_notification(
                landlord_email,
                &landlord_name,
                &property.title,
                renter,
            );
            email::deliver(state.mailer.as_ref(), &mail).await;
        }
        None => log::warn!("Property {} has no landlord email; skipping notification", property.id),
    }

    let confirmation =
        email::renter_confirmation(&contact.email, &contact.name, &property.title, &landlord_name);
    email::deliver(state.mailer.as_ref(), &confirmation).await;
}
