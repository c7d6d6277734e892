//! Remote-source adapters binding the REST client to the cached stores.
//!
//! One adapter per domain collection. Each holds the user context it needs
//! so the store can stay generic over ids.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::RestClient;
use nourish_core::{dates, DailyProgress, FavoriteSet, Goal, RemoteError};
use nourish_sync::RemoteSource;

/// Today's progress for a user. The entity id is the user id.
pub struct ProgressSource {
    client: Arc<RestClient>,
}

impl ProgressSource {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteSource<DailyProgress> for ProgressSource {
    async fn fetch_entity(&self, user_id: &str) -> Result<DailyProgress, RemoteError> {
        self.client.today_progress(user_id).await
    }

    async fn mutate_entity(
        &self,
        user_id: &str,
        patch: Value,
    ) -> Result<DailyProgress, RemoteError> {
        self.client
            .update_daily_progress(user_id, &dates::today_local(), patch)
            .await
    }
}

/// The user's goal list. Fetches take the user id; mutations take the goal
/// id and re-read the list so the store always holds the server's ordering.
pub struct GoalsSource {
    client: Arc<RestClient>,
    user_id: String,
}

impl GoalsSource {
    pub fn new(client: Arc<RestClient>, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl RemoteSource<Vec<Goal>> for GoalsSource {
    async fn fetch_entity(&self, user_id: &str) -> Result<Vec<Goal>, RemoteError> {
        self.client.goals(user_id).await
    }

    async fn mutate_entity(&self, goal_id: &str, patch: Value) -> Result<Vec<Goal>, RemoteError> {
        self.client.update_goal(goal_id, patch).await?;
        self.client.goals(&self.user_id).await
    }
}

/// What a favorites patch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteTarget {
    Meal,
    Recipe,
}

/// Interpret a favorites patch: `{ "favorite": bool, "target": "recipe"? }`.
/// The target defaults to a meal, the common case.
pub fn favorite_patch(patch: &Value) -> (bool, FavoriteTarget) {
    let favorite = patch
        .get("favorite")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let target = match patch.get("target").and_then(Value::as_str) {
        Some("recipe") => FavoriteTarget::Recipe,
        _ => FavoriteTarget::Meal,
    };
    (favorite, target)
}

/// The user's favorites. Mutations take the meal/recipe id being toggled.
pub struct FavoritesSource {
    client: Arc<RestClient>,
    user_id: String,
}

impl FavoritesSource {
    pub fn new(client: Arc<RestClient>, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl RemoteSource<FavoriteSet> for FavoritesSource {
    async fn fetch_entity(&self, user_id: &str) -> Result<FavoriteSet, RemoteError> {
        self.client.favorites(user_id).await
    }

    async fn mutate_entity(&self, item_id: &str, patch: Value) -> Result<FavoriteSet, RemoteError> {
        let (favorite, target) = favorite_patch(&patch);
        match target {
            FavoriteTarget::Meal => {
                self.client
                    .update_favorite(&self.user_id, item_id, favorite)
                    .await
            }
            FavoriteTarget::Recipe => {
                self.client
                    .toggle_favorite_recipe(&self.user_id, item_id, favorite)
                    .await
            }
        }
    }
}
