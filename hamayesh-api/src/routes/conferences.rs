/// Conference endpoints
///
/// # Endpoints
///
/// ```text
/// GET /v1/conferences/:id/statistics
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use hamayesh_shared::models::conference::{ConferenceStatistics, ScheduleStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dashboard summary for one conference
#[derive(Debug, Serialize, Deserialize)]
pub struct ConferenceStatisticsResponse {
    pub conference_id: Uuid,
    pub name: String,

    /// Upcoming, ongoing or ended relative to now
    pub schedule: ScheduleStatus,

    pub statistics: ConferenceStatistics,

    /// Completed assignments in percent
    pub completion_rate: f64,
}

/// Conference statistics handler
///
/// # Errors
///
/// - `404 Not Found`: unknown conference
/// - `503 Service Unavailable`: store outage
pub async fn conference_statistics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ConferenceStatisticsResponse>> {
    let conference = state.store.find_conference(id).await?;
    let statistics = state.store.conference_statistics(conference.id).await?;

    Ok(Json(ConferenceStatisticsResponse {
        conference_id: conference.id,
        schedule: conference.schedule_status(Utc::now()),
        name: conference.name,
        completion_rate: statistics.completion_rate(),
        statistics,
    }))
}
