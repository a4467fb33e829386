/// Person endpoints
///
/// Direct assignment edits, category moves and the badge check-in lookup.
/// Moving a person does not touch their assignments; only category task
/// edits propagate.
///
/// # Endpoints
///
/// ```text
/// GET    /v1/persons/by-code/:hash
/// PUT    /v1/persons/:id/category
/// GET    /v1/persons/:id/tasks
/// PUT    /v1/persons/:id/tasks/:task_id
/// DELETE /v1/persons/:id/tasks/:task_id
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap},
    Extension, Json,
};
use hamayesh_shared::{
    assignment,
    auth::middleware::AuthContext,
    models::{person::Person, person_task::PersonTask},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category move; `null` removes the person from any category
#[derive(Debug, Deserialize)]
pub struct MovePersonRequest {
    pub category_id: Option<Uuid>,
}

/// Assignment upsert body
#[derive(Debug, Default, Deserialize)]
pub struct AssignTaskRequest {
    #[serde(default)]
    pub completed: bool,
}

/// Assignments held by one person
#[derive(Debug, Serialize, Deserialize)]
pub struct PersonTasksResponse {
    pub person_id: Uuid,
    pub tasks: Vec<PersonTask>,
}

/// Badge scan result
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckInResponse {
    pub person: Person,
    pub full_name: String,
    pub tasks: Vec<PersonTask>,
}

/// Revocation result
#[derive(Debug, Serialize, Deserialize)]
pub struct RevokeTaskResponse {
    pub person_id: Uuid,
    pub task_id: Uuid,

    /// `false` if the person did not hold the task
    pub revoked: bool,
}

/// Looks a person up by the SHA-256 digest printed on their badge
///
/// # Errors
///
/// - `400 Bad Request`: not a 64-character hex digest
/// - `404 Not Found`: no person carries this digest
pub async fn find_by_code(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> ApiResult<Json<CheckInResponse>> {
    if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::BadRequest(
            "Badge code must be a 64-character hex digest".to_string(),
        ));
    }

    let person = state
        .store
        .find_person_by_hashed_code(&hash.to_ascii_lowercase())
        .await?;
    let tasks = state.store.find_person_tasks(person.id).await?;

    Ok(Json(CheckInResponse {
        full_name: person.full_name(),
        person,
        tasks,
    }))
}

/// Moves a person into another category of their conference
///
/// # Errors
///
/// - `404 Not Found`: unknown person or category
/// - `422 Unprocessable Entity`: the category belongs to another conference
pub async fn move_person(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<MovePersonRequest>,
) -> ApiResult<Json<Person>> {
    let person = assignment::move_person(state.store.as_ref(), id, req.category_id).await?;
    tracing::debug!(user_id = %auth.user_id, person_id = %id, "Person category updated");
    Ok(Json(person))
}

/// Lists a person's assignments
pub async fn list_person_tasks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PersonTasksResponse>> {
    let person = state.store.find_person(id).await?;
    let tasks = state.store.find_person_tasks(person.id).await?;

    Ok(Json(PersonTasksResponse {
        person_id: person.id,
        tasks,
    }))
}

/// Parses the optional assignment body
///
/// An empty body means "assign, not completed". Anything else must be JSON
/// with a JSON content type.
fn assign_body(headers: &HeaderMap, body: &Bytes) -> ApiResult<AssignTaskRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AssignTaskRequest::default());
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Err(ApiError::BadRequest(
            "Expected request with `Content-Type: application/json`".to_string(),
        ));
    }

    let Json(req) = Json::<AssignTaskRequest>::from_bytes(body)?;
    Ok(req)
}

/// Assigns a task to a person or updates its completion flag
///
/// # Errors
///
/// - `400 Bad Request`: malformed JSON or missing JSON content type
/// - `404 Not Found`: unknown person or task
/// - `422 Unprocessable Entity`: wrongly typed body, or the task belongs to
///   another conference
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<PersonTask>> {
    let req = assign_body(&headers, &body)?;
    let row = assignment::assign_task(state.store.as_ref(), id, task_id, req.completed).await?;
    tracing::debug!(user_id = %auth.user_id, person_id = %id, task_id = %task_id, "Assignment stored");
    Ok(Json(row))
}

/// Removes one assignment
///
/// # Errors
///
/// - `404 Not Found`: unknown person
pub async fn revoke_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RevokeTaskResponse>> {
    let revoked = assignment::revoke_task(state.store.as_ref(), id, task_id).await?;
    tracing::debug!(user_id = %auth.user_id, person_id = %id, task_id = %task_id, revoked, "Assignment revoked");

    Ok(Json(RevokeTaskResponse {
        person_id: id,
        task_id,
        revoked,
    }))
}
