//! REST client for the Nourish service.
//!
//! Every endpoint maps its transport failures to a [`RemoteError`] carrying
//! the user-facing message for that action; the sync core surfaces those
//! messages verbatim when it has nothing cached to fall back on.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::types::{ApiResponse, TodayProgress, WaterUpdate};
use nourish_core::{DailyProgress, FavoriteSet, Goal, RemoteError};

/// Connection settings for the service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.nourish.app".to_string(),
            auth_token: None,
            request_timeout_ms: 15_000,
        }
    }
}

/// Typed HTTP client over the service's REST surface.
#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

impl RestClient {
    pub fn new(config: &ApiConfig) -> Result<Self, RemoteError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::network(format!("Failed to initialize API client: {e}")))?;

        let mut auth_header = HeaderMap::new();
        if let Some(token) = &config.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| RemoteError::network(format!("Invalid auth token: {e}")))?;
            auth_header.insert(AUTHORIZATION, value);
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and unwrap the service envelope. Transport and HTTP
    /// failures surface as `user_message`; a malformed body is a decode
    /// error.
    async fn request_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        user_message: &str,
    ) -> Result<T, RemoteError> {
        let response = builder
            .headers(self.auth_header.clone())
            .send()
            .await
            .map_err(|_| RemoteError::network(user_message))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Http {
                status: status.as_u16(),
                message: user_message.to_string(),
            });
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode {
                reason: e.to_string(),
            })?;
        Ok(envelope.data)
    }

    // === Progress ===

    pub async fn today_progress(&self, user_id: &str) -> Result<DailyProgress, RemoteError> {
        let payload: TodayProgress = self
            .request_json(
                self.client.get(self.url(&format!("/progress/today/{user_id}"))),
                "Failed to get today progress. Please try again.",
            )
            .await?;
        Ok(payload.progress)
    }

    pub async fn update_daily_progress(
        &self,
        user_id: &str,
        date: &str,
        progress: Value,
    ) -> Result<DailyProgress, RemoteError> {
        self.request_json(
            self.client
                .put(self.url(&format!("/progress/{user_id}/daily")))
                .json(&json!({ "date": date, "progress": progress })),
            "Failed to update daily progress. Please try again.",
        )
        .await
    }

    pub async fn complete_meal(
        &self,
        user_id: &str,
        date: &str,
        meal_type: &str,
        meal_id: &str,
    ) -> Result<DailyProgress, RemoteError> {
        self.request_json(
            self.client
                .put(self.url(&format!("/progress/meal/{user_id}/{meal_id}")))
                .json(&json!({ "date": date, "mealType": meal_type, "mealId": meal_id })),
            "Failed to complete meal. Please try again.",
        )
        .await
    }

    pub async fn add_water_glass(
        &self,
        user_id: &str,
        date: &str,
        glasses: u32,
    ) -> Result<DailyProgress, RemoteError> {
        let payload: WaterUpdate = self
            .request_json(
                self.client
                    .post(self.url(&format!("/progress/water/{user_id}")))
                    .json(&json!({ "glasses": glasses, "date": date })),
                "Failed to add water glass. Please try again.",
            )
            .await?;
        Ok(payload.progress)
    }

    // === Goals ===

    pub async fn goals(&self, user_id: &str) -> Result<Vec<Goal>, RemoteError> {
        self.request_json(
            self.client.get(self.url(&format!("/goals/{user_id}"))),
            "Failed to fetch goals. Please try again.",
        )
        .await
    }

    pub async fn create_goal(&self, goal: Value) -> Result<Goal, RemoteError> {
        self.request_json(
            self.client.post(self.url("/goals")).json(&goal),
            "Failed to create goal. Please try again.",
        )
        .await
    }

    pub async fn update_goal(&self, goal_id: &str, updates: Value) -> Result<Goal, RemoteError> {
        self.request_json(
            self.client
                .put(self.url(&format!("/goals/{goal_id}")))
                .json(&updates),
            "Failed to update goal. Please try again.",
        )
        .await
    }

    pub async fn delete_goal(&self, goal_id: &str) -> Result<(), RemoteError> {
        let _: Value = self
            .request_json(
                self.client.delete(self.url(&format!("/goals/{goal_id}"))),
                "Failed to delete goal. Please try again.",
            )
            .await?;
        Ok(())
    }

    pub async fn add_goal_progress(
        &self,
        goal_id: &str,
        value: f64,
        date: Option<&str>,
    ) -> Result<Goal, RemoteError> {
        self.request_json(
            self.client
                .post(self.url(&format!("/goals/{goal_id}/progress")))
                .json(&json!({ "value": value, "date": date })),
            "Failed to update goal progress. Please try again.",
        )
        .await
    }

    pub async fn update_milestone(
        &self,
        goal_id: &str,
        milestone_id: &str,
        completed: bool,
    ) -> Result<Goal, RemoteError> {
        self.request_json(
            self.client
                .put(self.url(&format!("/goals/{goal_id}/milestones/{milestone_id}")))
                .json(&json!({ "completed": completed })),
            "Failed to update milestone. Please try again.",
        )
        .await
    }

    // === Favorites ===

    pub async fn favorites(&self, user_id: &str) -> Result<FavoriteSet, RemoteError> {
        self.request_json(
            self.client.get(self.url(&format!("/favorites/{user_id}"))),
            "Failed to fetch favorites. Please try again.",
        )
        .await
    }

    pub async fn update_favorite(
        &self,
        user_id: &str,
        meal_id: &str,
        favorite: bool,
    ) -> Result<FavoriteSet, RemoteError> {
        self.request_json(
            self.client
                .put(self.url(&format!("/favorites/{user_id}/meals/{meal_id}")))
                .json(&json!({ "favorite": favorite })),
            "Failed to update favorite meal. Please try again.",
        )
        .await
    }

    pub async fn toggle_favorite_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
        favorite: bool,
    ) -> Result<FavoriteSet, RemoteError> {
        self.request_json(
            self.client
                .put(self.url(&format!("/favorites/{user_id}/recipes/{recipe_id}")))
                .json(&json!({ "favorite": favorite })),
            "Failed to update favorite recipe. Please try again.",
        )
        .await
    }
}
