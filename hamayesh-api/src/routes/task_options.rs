/// Task widget endpoint
///
/// The admin form calls this whenever its conference selector changes. The
/// response tells it which tasks are eligible, which of the previously
/// checked tasks survive, and how every option should be rendered.
///
/// # Endpoint
///
/// ```text
/// GET /v1/task-options?conference_id=<uuid>&selected=<uuid>,<uuid>
/// ```
///
/// Both parameters are optional. Without `conference_id` the widget state is
/// `no_conference_selected`.
///
/// # Response
///
/// ```json
/// {
///   "conference_id": "...",
///   "eligible": ["..."],
///   "selected": ["..."],
///   "dropped": ["..."],
///   "widget": { "state": "options", "options": [{ "task_id": "...", "title": "Check-in", "visible": true, "checked": true }] },
///   "warnings": []
/// }
/// ```
///
/// An unknown `conference_id` yields `no_tasks_available` plus a warning
/// naming the missing conference.

use std::collections::BTreeSet;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Json,
};
use hamayesh_shared::{
    filter::{eligible_task_list, reconcile_selection, render_state, TaskOption, WidgetState},
    models::task::TaskFilter,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query string
#[derive(Debug, Deserialize)]
pub struct TaskOptionsQuery {
    /// Newly selected conference
    pub conference_id: Option<Uuid>,

    /// Comma-separated IDs of the tasks checked so far
    pub selected: Option<String>,
}

/// Widget update
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskOptionsResponse {
    pub conference_id: Option<Uuid>,

    /// Tasks that may be attached in this conference
    pub eligible: Vec<Uuid>,

    /// Selection after dropping ineligible tasks
    pub selected: Vec<Uuid>,

    /// Previously checked tasks that were deselected
    pub dropped: Vec<Uuid>,

    pub widget: WidgetState,

    /// Non-fatal problems, e.g. a conference that no longer exists
    pub warnings: Vec<String>,
}

/// Parses a comma-separated UUID list; blank entries are ignored
pub fn parse_id_list(raw: Option<&str>) -> ApiResult<BTreeSet<Uuid>> {
    let Some(raw) = raw else {
        return Ok(BTreeSet::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| ApiError::BadRequest(format!("Invalid task ID in selected: {}", s)))
        })
        .collect()
}

/// Conference selection change handler
///
/// # Errors
///
/// - `400 Bad Request`: malformed `conference_id` or `selected`
/// - `503 Service Unavailable`: the store could not be queried; the client
///   keeps its current widget and retries on the next interaction
pub async fn task_options(
    State(state): State<AppState>,
    Query(query): Query<TaskOptionsQuery>,
) -> ApiResult<Json<TaskOptionsResponse>> {
    let selected = parse_id_list(query.selected.as_deref())?;

    let mut warnings = Vec::new();
    if let Some(conference_id) = query.conference_id {
        match state.store.find_conference(conference_id).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!(conference_id = %conference_id, "Task options requested for unknown conference");
                warnings.push(e.to_string());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let tasks = eligible_task_list(state.store.as_ref(), query.conference_id).await?;
    let eligible: BTreeSet<Uuid> = tasks.iter().map(|t| t.id).collect();
    let reconciled = reconcile_selection(&selected, &eligible);
    let dropped: BTreeSet<Uuid> = selected.difference(&reconciled).copied().collect();

    let mut options: Vec<TaskOption> = tasks.iter().map(TaskOption::from).collect();
    if !dropped.is_empty() {
        // Dropped tasks are still listed so the client can hide and uncheck them
        let others = state
            .store
            .find_tasks(&TaskFilter::with_ids(dropped.iter().copied()))
            .await?;
        options.extend(others.iter().map(TaskOption::from));
    }

    let widget = render_state(query.conference_id, &eligible, &reconciled, &options);

    tracing::debug!(
        conference_id = ?query.conference_id,
        eligible = eligible.len(),
        dropped = dropped.len(),
        "Task options computed"
    );

    Ok(Json(TaskOptionsResponse {
        conference_id: query.conference_id,
        eligible: eligible.into_iter().collect(),
        selected: reconciled.into_iter().collect(),
        dropped: dropped.into_iter().collect(),
        widget,
        warnings,
    }))
}
