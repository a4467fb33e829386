/// Category endpoints
///
/// Saving a category's task set is where assignments propagate: every
/// person in the category gains the added tasks and loses the removed ones
/// in the same commit.
///
/// # Endpoints
///
/// ```text
/// GET    /v1/categories/:id/tasks
/// PUT    /v1/categories/:id/tasks
/// POST   /v1/categories/:id/task-changes
/// DELETE /v1/categories/:id
/// ```

use std::collections::BTreeSet;

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use hamayesh_shared::{
    assignment::{self, ApplyReport},
    auth::middleware::AuthContext,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Current task set of a category
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryTasksResponse {
    pub category_id: Uuid,
    pub conference_id: Uuid,
    pub task_ids: Vec<Uuid>,
}

/// Full replacement of a category's task set
#[derive(Debug, Deserialize, Validate)]
pub struct SaveCategoryTasksRequest {
    #[validate(length(max = 500, message = "At most 500 tasks per category"))]
    pub task_ids: Vec<Uuid>,
}

/// Explicit delta; a task may not appear in both lists
#[derive(Debug, Deserialize, Validate)]
pub struct TaskChangesRequest {
    #[serde(default)]
    #[validate(length(max = 500, message = "At most 500 added tasks per request"))]
    pub added: Vec<Uuid>,

    #[serde(default)]
    #[validate(length(max = 500, message = "At most 500 removed tasks per request"))]
    pub removed: Vec<Uuid>,
}

/// Deletion summary
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteCategoryResponse {
    pub category_id: Uuid,

    /// Persons whose category was cleared
    pub detached: u64,
}

/// Lists the tasks attached to a category
///
/// # Errors
///
/// - `404 Not Found`: unknown category
pub async fn get_category_tasks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CategoryTasksResponse>> {
    let category = state.store.find_category(id).await?;
    let task_ids = state.store.category_task_ids(category.id).await?;

    Ok(Json(CategoryTasksResponse {
        category_id: category.id,
        conference_id: category.conference_id,
        task_ids: task_ids.into_iter().collect(),
    }))
}

/// Replaces the task set and propagates the difference to every member
///
/// A category deleted in the meantime yields an empty report with a
/// warning instead of an error.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: too many tasks, or a task from another conference
/// - `503 Service Unavailable`: store outage, nothing was written
pub async fn save_category_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<SaveCategoryTasksRequest>,
) -> ApiResult<Json<ApplyReport>> {
    req.validate()?;

    let task_ids: BTreeSet<Uuid> = req.task_ids.into_iter().collect();
    let report = assignment::save_category_tasks(state.store.as_ref(), id, task_ids).await?;

    tracing::info!(
        user_id = %auth.user_id,
        category_id = %id,
        members = report.members,
        granted = report.granted,
        revoked = report.revoked,
        "Category tasks saved"
    );

    Ok(Json(report))
}

/// Applies an explicit add/remove delta to a category's members
///
/// Only member assignments change; the category's own task set is left as
/// it is, so members may end up holding tasks the category does not list.
/// Use `PUT /v1/categories/:id/tasks` to edit the set and its members
/// together.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: a task is both added and removed, or
///   belongs to another conference
/// - `503 Service Unavailable`: store outage, nothing was written
pub async fn apply_task_changes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<TaskChangesRequest>,
) -> ApiResult<Json<ApplyReport>> {
    req.validate()?;

    let report = assignment::apply_category_task_change(
        state.store.as_ref(),
        id,
        req.added.into_iter().collect(),
        req.removed.into_iter().collect(),
    )
    .await?;

    tracing::info!(
        user_id = %auth.user_id,
        category_id = %id,
        granted = report.granted,
        revoked = report.revoked,
        "Category task changes applied"
    );

    Ok(Json(report))
}

/// Deletes a category; its persons keep their assignments
///
/// # Errors
///
/// - `404 Not Found`: unknown category
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteCategoryResponse>> {
    let detached = assignment::delete_category(state.store.as_ref(), id).await?;

    tracing::info!(user_id = %auth.user_id, category_id = %id, detached, "Category deleted via API");

    Ok(Json(DeleteCategoryResponse {
        category_id: id,
        detached,
    }))
}
