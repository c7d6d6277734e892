//! Nourish API - REST client for the nutrition service.
//!
//! The [`RestClient`] speaks the service's `{ success, data, message }`
//! envelope and attaches a user-facing message to every failure. The
//! [`sources`] adapters plug it into the cached stores in nourish-sync.

pub mod client;
pub mod sources;
pub mod types;

pub use client::{ApiConfig, RestClient};
pub use sources::{FavoriteTarget, FavoritesSource, GoalsSource, ProgressSource};
pub use types::{ApiResponse, TodayProgress, WaterUpdate};
