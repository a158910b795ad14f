//! Data layer module
//!
//! Handles persistence of local users and their linked provider identities.

mod database;
mod models;

pub use database::Database;
pub use models::*;
