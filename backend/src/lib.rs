//! Rental listing marketplace backend: listings, favorites, inquiries and the
//! location-aware search that ranks listings by distance.

pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod extract;
pub mod favorite;
pub mod filters;
pub mod geo;
pub mod geocoding;
pub mod inquiry;
pub mod landlord;
pub mod models;
pub mod pipeline;
pub mod property;
pub mod routes;
pub mod schema;
pub mod session;
pub mod state;
pub mod statistics;
pub mod storage;
pub mod upload;
