//! Nourish Core - Domain Model and Shared Types
//!
//! Defines the domain entities synced by the client (daily progress, goals,
//! favorites), the error taxonomy used across the workspace, and the cache
//! policy table. The synchronization machinery itself lives in nourish-sync.

pub mod config;
pub mod dates;
pub mod entities;
pub mod error;

pub use config::CachePolicy;
pub use dates::{day_key, is_today, today_local};
pub use entities::{
    DailyProgress, FavoriteSet, Goal, GoalStatus, MacroProgress, Macros, Meal, MealSlots,
    Milestone, ProgressPoint, Recipe, WaterProgress, Workout,
};
pub use error::{
    CacheError, MutationError, NourishError, NourishResult, RemoteError, StorageError,
};
