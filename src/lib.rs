//! Student-housing marketplace client: listing search and filtering,
//! favorites and collections, listing management and accounts, backed by a
//! hosted backend-as-a-service or, when none is configured, a static catalogue.

pub mod app;
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod favorites;
pub mod listings;
pub mod models;
pub mod profile;
pub mod store;

pub use app::App;
pub use error::{Error, Result};
