/// Task endpoints
///
/// Per-task completion counts, bulk assignment to a set of persons and the
/// deletion cascade.
///
/// # Endpoints
///
/// ```text
/// GET    /v1/tasks/:id/statistics
/// POST   /v1/tasks/:id/bulk-assign
/// POST   /v1/tasks/:id/bulk-unassign
/// DELETE /v1/tasks/:id
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use hamayesh_shared::{
    assignment::{self, BulkReport},
    auth::middleware::AuthContext,
    models::person_task::TaskCompletionStats,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Persons a task is assigned to or removed from
#[derive(Debug, Deserialize, Validate)]
pub struct BulkAssignmentRequest {
    #[validate(length(min = 1, max = 500, message = "Between 1 and 500 persons per request"))]
    pub person_ids: Vec<Uuid>,
}

/// Completion counts of one task
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskStatisticsResponse {
    pub task_id: Uuid,
    pub statistics: TaskCompletionStats,

    /// Completed assignments in percent
    pub completion_rate: f64,
}

/// Task completion statistics
///
/// # Errors
///
/// - `404 Not Found`: unknown task
pub async fn task_statistics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskStatisticsResponse>> {
    let statistics = state.store.task_completion_stats(id).await?;

    Ok(Json(TaskStatisticsResponse {
        task_id: id,
        completion_rate: statistics.completion_rate(),
        statistics,
    }))
}

/// Assigns the task to every listed person
///
/// # Errors
///
/// - `404 Not Found`: unknown task
/// - `422 Unprocessable Entity`: empty or oversized list, or a person of
///   another conference; nothing is written
pub async fn bulk_assign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<BulkAssignmentRequest>,
) -> ApiResult<Json<BulkReport>> {
    req.validate()?;

    let report =
        assignment::bulk_assign_task(state.store.as_ref(), id, req.person_ids.into_iter().collect()).await?;
    tracing::info!(user_id = %auth.user_id, task_id = %id, granted = report.granted, "Bulk assignment applied");

    Ok(Json(report))
}

/// Removes the task from every listed person
///
/// # Errors
///
/// Same as [`bulk_assign`].
pub async fn bulk_unassign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<BulkAssignmentRequest>,
) -> ApiResult<Json<BulkReport>> {
    req.validate()?;

    let report =
        assignment::bulk_unassign_task(state.store.as_ref(), id, req.person_ids.into_iter().collect()).await?;
    tracing::info!(user_id = %auth.user_id, task_id = %id, revoked = report.revoked, "Bulk unassignment applied");

    Ok(Json(report))
}

/// Deletion summary
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteTaskResponse {
    pub task_id: Uuid,

    /// Assignments removed together with the task
    pub revoked: u64,
}

/// Deletes a task and every assignment referencing it
///
/// # Errors
///
/// - `404 Not Found`: unknown task
/// - `503 Service Unavailable`: store outage, nothing was deleted
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteTaskResponse>> {
    let revoked = assignment::delete_task(state.store.as_ref(), id).await?;

    tracing::info!(user_id = %auth.user_id, task_id = %id, revoked, "Task deleted via API");

    Ok(Json(DeleteTaskResponse { task_id: id, revoked }))
}
