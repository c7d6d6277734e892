//! Wire types for the Nourish service.

use nourish_core::DailyProgress;
use serde::Deserialize;

/// The service's standard response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of `GET /progress/today/{userId}`.
///
/// The service also sends derived `stats`; the client recomputes those, so
/// they are not modeled here.
#[derive(Debug, Deserialize)]
pub struct TodayProgress {
    pub progress: DailyProgress,
}

/// Payload of `POST /progress/water/{userId}`.
#[derive(Debug, Deserialize)]
pub struct WaterUpdate {
    pub progress: DailyProgress,
}
