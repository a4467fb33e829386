/// Conference-scoped task filter engine
///
/// Decides which tasks may be attached to a category or person once a
/// conference has been selected, and derives the visible/checked state of a
/// task multi-select from that decision.
///
/// The computations are plain functions over sets. [`TaskWidget`] is the
/// stateful binding a presentation layer drives on every conference change.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
/// use hamayesh_shared::filter::reconcile_selection;
/// use uuid::Uuid;
///
/// let (a, c) = (Uuid::new_v4(), Uuid::new_v4());
/// let selected: BTreeSet<Uuid> = [a].into();
/// let eligible: BTreeSet<Uuid> = [c].into();
/// assert!(reconcile_selection(&selected, &eligible).is_empty());
/// ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::task::{Task, TaskFilter};
use crate::store::EntityStore;

/// Active tasks of a conference, in store order
///
/// `None` means no conference is selected; the store is not queried.
pub async fn eligible_task_list(
    store: &dyn EntityStore,
    conference_id: Option<Uuid>,
) -> DomainResult<Vec<Task>> {
    match conference_id {
        Some(id) => store.find_tasks(&TaskFilter::eligible_in(id)).await,
        None => Ok(Vec::new()),
    }
}

/// IDs of the tasks eligible for assignment within a conference
///
/// A task is eligible when it belongs to the conference and is active.
///
/// # Errors
///
/// Returns `StoreUnavailable` if the store cannot be queried.
pub async fn eligible_tasks(
    store: &dyn EntityStore,
    conference_id: Option<Uuid>,
) -> DomainResult<BTreeSet<Uuid>> {
    let tasks = eligible_task_list(store, conference_id).await?;
    Ok(tasks.into_iter().map(|t| t.id).collect())
}

/// Drops every selected task that is not eligible
pub fn reconcile_selection(selected: &BTreeSet<Uuid>, eligible: &BTreeSet<Uuid>) -> BTreeSet<Uuid> {
    selected.intersection(eligible).copied().collect()
}

/// One entry of a task multi-select
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOption {
    /// Task
    pub task_id: Uuid,

    /// Label shown next to the checkbox
    pub title: String,

    /// Owning conference; `None` until the presentation layer resolves it
    pub conference_id: Option<Uuid>,
}

impl From<&Task> for TaskOption {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id,
            title: task.title.clone(),
            conference_id: Some(task.conference_id),
        }
    }
}

/// Rendered state of one option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionState {
    pub task_id: Uuid,
    pub title: String,
    pub visible: bool,
    pub checked: bool,
}

/// What the widget shows
///
/// The two empty states are distinct so "pick a conference" is never
/// confused with "this conference has no tasks".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "options", rename_all = "snake_case")]
pub enum WidgetState {
    /// No conference chosen yet
    NoConferenceSelected,

    /// Conference chosen but it has no active tasks; create tasks first
    NoTasksAvailable,

    /// Per-option visibility and check state
    Options(Vec<OptionState>),
}

/// Derives the widget state
///
/// An option is visible if its task is eligible or if its conference is not
/// resolved yet. It is checked if its task is selected.
pub fn render_state(
    conference_id: Option<Uuid>,
    eligible: &BTreeSet<Uuid>,
    selected: &BTreeSet<Uuid>,
    options: &[TaskOption],
) -> WidgetState {
    if conference_id.is_none() {
        return WidgetState::NoConferenceSelected;
    }
    if eligible.is_empty() {
        return WidgetState::NoTasksAvailable;
    }

    WidgetState::Options(
        options
            .iter()
            .map(|option| OptionState {
                task_id: option.task_id,
                title: option.title.clone(),
                visible: eligible.contains(&option.task_id) || option.conference_id.is_none(),
                checked: selected.contains(&option.task_id),
            })
            .collect(),
    )
}

/// Stateful task multi-select bound to a conference selector
///
/// Every conference change re-queries eligibility; nothing is cached between
/// conferences. When the store fails, the widget keeps showing its last
/// known-good state, raises an error indicator and remembers the requested
/// conference so the next [`TaskWidget::interact`] can try once more.
#[derive(Debug, Clone, Default)]
pub struct TaskWidget {
    conference_id: Option<Uuid>,
    eligible: BTreeSet<Uuid>,
    selected: BTreeSet<Uuid>,
    options: Vec<TaskOption>,
    error: Option<String>,
    pending: Option<Option<Uuid>>,
}

impl TaskWidget {
    /// A widget with no conference selected
    pub fn new(options: Vec<TaskOption>, selected: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            options,
            selected: selected.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Handles a conference selection change
    ///
    /// # Errors
    ///
    /// Returns the store error after recording it; the displayed state is
    /// left as it was.
    pub async fn select_conference(
        &mut self,
        store: &dyn EntityStore,
        conference_id: Option<Uuid>,
    ) -> DomainResult<()> {
        let tasks = match eligible_task_list(store, conference_id).await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(
                    conference_id = ?conference_id,
                    error = %e,
                    "Eligible task lookup failed, keeping previous state"
                );
                self.error = Some(e.to_string());
                self.pending = Some(conference_id);
                return Err(e);
            }
        };

        let eligible: BTreeSet<Uuid> = tasks.iter().map(|t| t.id).collect();
        for task in &tasks {
            if !self.options.iter().any(|o| o.task_id == task.id) {
                self.options.push(TaskOption::from(task));
            }
        }

        let before = self.selected.len();
        self.selected = reconcile_selection(&self.selected, &eligible);
        debug!(
            conference_id = ?conference_id,
            eligible = eligible.len(),
            dropped = before - self.selected.len(),
            "Task widget conference changed"
        );

        self.conference_id = conference_id;
        self.eligible = eligible;
        self.error = None;
        self.pending = None;
        Ok(())
    }

    /// Called on any user interaction; re-queries a failed change once
    pub async fn interact(&mut self, store: &dyn EntityStore) -> DomainResult<()> {
        match self.pending.take() {
            Some(conference_id) => self.select_conference(store, conference_id).await,
            None => Ok(()),
        }
    }

    /// Flips the check state of an eligible task
    ///
    /// Returns the new state, or `None` if the task is not eligible.
    pub fn toggle(&mut self, task_id: Uuid) -> Option<bool> {
        if !self.eligible.contains(&task_id) {
            return None;
        }
        if self.selected.remove(&task_id) {
            Some(false)
        } else {
            self.selected.insert(task_id);
            Some(true)
        }
    }

    /// Current widget state
    pub fn render(&self) -> WidgetState {
        render_state(self.conference_id, &self.eligible, &self.selected, &self.options)
    }

    pub fn conference_id(&self) -> Option<Uuid> {
        self.conference_id
    }

    pub fn eligible(&self) -> &BTreeSet<Uuid> {
        &self.eligible
    }

    pub fn selected(&self) -> &BTreeSet<Uuid> {
        &self.selected
    }

    /// Transient error indicator, cleared by the next successful query
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a failed conference change awaits a retry
    pub fn has_pending_change(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::CreateTask;
    use crate::store::memory::MemoryStore;

    fn set(ids: &[Uuid]) -> BTreeSet<Uuid> {
        ids.iter().copied().collect()
    }

    fn option_for(state: &WidgetState, task_id: Uuid) -> OptionState {
        match state {
            WidgetState::Options(options) => options
                .iter()
                .find(|o| o.task_id == task_id)
                .cloned()
                .expect("option should be rendered"),
            other => panic!("expected options, got {:?}", other),
        }
    }

    #[test]
    fn test_reconcile_selection_is_idempotent() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let selected = set(&[a, b]);
        let eligible = set(&[b, c]);

        let once = reconcile_selection(&selected, &eligible);
        let twice = reconcile_selection(&once, &eligible);

        assert_eq!(once, set(&[b]));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_render_state_empty_states_are_distinct() {
        let a = Uuid::new_v4();
        let options = vec![TaskOption {
            task_id: a,
            title: "A".to_string(),
            conference_id: None,
        }];

        assert_eq!(
            render_state(None, &BTreeSet::new(), &BTreeSet::new(), &options),
            WidgetState::NoConferenceSelected
        );
        assert_eq!(
            render_state(Some(Uuid::new_v4()), &BTreeSet::new(), &set(&[a]), &options),
            WidgetState::NoTasksAvailable
        );
    }

    #[test]
    fn test_render_state_unresolved_options_stay_visible() {
        let conference = Uuid::new_v4();
        let (eligible_task, foreign_task, unresolved_task) =
            (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let options = vec![
            TaskOption {
                task_id: eligible_task,
                title: "Eligible".to_string(),
                conference_id: Some(conference),
            },
            TaskOption {
                task_id: foreign_task,
                title: "Foreign".to_string(),
                conference_id: Some(Uuid::new_v4()),
            },
            TaskOption {
                task_id: unresolved_task,
                title: "Unresolved".to_string(),
                conference_id: None,
            },
        ];

        let state = render_state(Some(conference), &set(&[eligible_task]), &set(&[eligible_task]), &options);

        let eligible = option_for(&state, eligible_task);
        assert!(eligible.visible);
        assert!(eligible.checked);
        assert!(!option_for(&state, foreign_task).visible);
        assert!(option_for(&state, unresolved_task).visible);
    }

    #[tokio::test]
    async fn test_eligible_tasks_excludes_inactive_and_foreign() {
        let store = MemoryStore::new();
        let x = store.create_conference("X").await;
        let y = store.create_conference("Y").await;
        let active = store.create_task(CreateTask::new(x.id, "Badge pickup")).await;
        let mut inactive = CreateTask::new(x.id, "Old task");
        inactive.is_active = false;
        store.create_task(inactive).await;
        store.create_task(CreateTask::new(y.id, "Other")).await;

        let eligible = eligible_tasks(&store, Some(x.id)).await.unwrap();
        assert_eq!(eligible, set(&[active.id]));
    }

    #[tokio::test]
    async fn test_no_conference_does_not_query_store() {
        let store = MemoryStore::new();
        store.set_available(false);

        let eligible = eligible_tasks(&store, None).await.unwrap();
        assert!(eligible.is_empty());
    }

    #[tokio::test]
    async fn test_conference_without_tasks_shows_no_tasks_available() {
        let store = MemoryStore::new();
        let empty = store.create_conference("Empty").await;

        let mut widget = TaskWidget::default();
        widget.select_conference(&store, Some(empty.id)).await.unwrap();

        assert!(widget.eligible().is_empty());
        assert_eq!(widget.render(), WidgetState::NoTasksAvailable);
    }

    #[tokio::test]
    async fn test_switching_conference_deselects_foreign_tasks() {
        let store = MemoryStore::new();
        let x = store.create_conference("X").await;
        let y = store.create_conference("Y").await;
        let a = store.create_task(CreateTask::new(x.id, "A")).await;
        let b = store.create_task(CreateTask::new(x.id, "B")).await;
        let c = store.create_task(CreateTask::new(y.id, "C")).await;

        let options = [&a, &b, &c].into_iter().map(TaskOption::from).collect();
        let mut widget = TaskWidget::new(options, Vec::new());
        assert_eq!(widget.render(), WidgetState::NoConferenceSelected);

        widget.select_conference(&store, Some(x.id)).await.unwrap();
        assert_eq!(widget.toggle(a.id), Some(true));
        assert_eq!(widget.selected(), &set(&[a.id]));

        widget.select_conference(&store, Some(y.id)).await.unwrap();
        assert_eq!(widget.eligible(), &set(&[c.id]));
        assert!(widget.selected().is_empty());

        let state = widget.render();
        let a_state = option_for(&state, a.id);
        assert!(!a_state.visible);
        assert!(!a_state.checked);
        assert!(!option_for(&state, b.id).visible);
        assert!(option_for(&state, c.id).visible);
    }

    #[tokio::test]
    async fn test_toggle_ignores_ineligible_tasks() {
        let store = MemoryStore::new();
        let x = store.create_conference("X").await;
        store.create_task(CreateTask::new(x.id, "A")).await;

        let mut widget = TaskWidget::default();
        widget.select_conference(&store, Some(x.id)).await.unwrap();

        assert_eq!(widget.toggle(Uuid::new_v4()), None);
        assert!(widget.selected().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_keeps_last_known_good_state() {
        let store = MemoryStore::new();
        let x = store.create_conference("X").await;
        let y = store.create_conference("Y").await;
        let a = store.create_task(CreateTask::new(x.id, "A")).await;
        let c = store.create_task(CreateTask::new(y.id, "C")).await;

        let mut widget = TaskWidget::new(Vec::new(), [a.id]);
        widget.select_conference(&store, Some(x.id)).await.unwrap();
        let before = widget.render();

        store.set_available(false);
        let err = widget.select_conference(&store, Some(y.id)).await.unwrap_err();
        assert!(err.is_transient());
        assert!(widget.error().is_some());
        assert!(widget.has_pending_change());
        assert_eq!(widget.conference_id(), Some(x.id));
        assert_eq!(widget.selected(), &set(&[a.id]));
        assert_eq!(widget.render(), before);

        // Still down: the interaction retries once and keeps the old state
        assert!(widget.interact(&store).await.is_err());
        assert_eq!(widget.conference_id(), Some(x.id));

        store.set_available(true);
        widget.interact(&store).await.unwrap();
        assert_eq!(widget.conference_id(), Some(y.id));
        assert_eq!(widget.eligible(), &set(&[c.id]));
        assert!(widget.selected().is_empty());
        assert!(widget.error().is_none());
        assert!(!widget.has_pending_change());

        // Nothing pending: interacting is a no-op even while the store is down
        store.set_available(false);
        assert!(widget.interact(&store).await.is_ok());
    }
}
