/// Task model and database operations
///
/// A task is a unit of work scoped to exactly one conference. Tasks are
/// attached to categories (`category_tasks`) and assigned to persons
/// (`person_tasks`); both references are removed when the task is deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     conference_id UUID NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_required BOOLEAN NOT NULL DEFAULT FALSE,
///     due_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use hamayesh_shared::models::task::{Task, CreateTask, TaskFilter};
/// use hamayesh_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let conference_id = Uuid::new_v4();
///
/// Task::create(&pool, CreateTask::new(conference_id, "Collect badge")).await?;
///
/// let active = Task::find(&pool, &TaskFilter::eligible_in(conference_id)).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str =
    "id, conference_id, title, description, is_active, is_required, due_at, created_at, updated_at";

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning conference
    pub conference_id: Uuid,

    /// Short title shown in selection widgets
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Only active tasks are eligible for new assignments
    pub is_active: bool,

    /// Whether every attendee is expected to complete it
    pub is_required: bool,

    /// Optional deadline
    pub due_at: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Owning conference
    pub conference_id: Uuid,

    /// Title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Defaults to true
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Defaults to false
    #[serde(default)]
    pub is_required: bool,

    /// Optional deadline
    pub due_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl CreateTask {
    /// Active, optional task with no description or deadline
    pub fn new(conference_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            conference_id,
            title: title.into(),
            description: None,
            is_active: default_active(),
            is_required: false,
            due_at: None,
        }
    }
}

/// Typed task lookup
///
/// Every field narrows the result; an empty filter matches all tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Restrict to one conference
    pub conference_id: Option<Uuid>,

    /// Restrict by active flag
    pub active: Option<bool>,

    /// Restrict to these IDs
    pub ids: Option<Vec<Uuid>>,
}

impl TaskFilter {
    /// Active tasks of a conference, i.e. the tasks eligible for assignment
    pub fn eligible_in(conference_id: Uuid) -> Self {
        Self {
            conference_id: Some(conference_id),
            active: Some(true),
            ids: None,
        }
    }

    /// Tasks with the given IDs, whatever their conference
    pub fn with_ids(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            ids: Some(ids.into_iter().collect()),
            ..Default::default()
        }
    }

    /// In-memory counterpart of the SQL predicate
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(conference_id) = self.conference_id {
            if task.conference_id != conference_id {
                return false;
            }
        }
        if let Some(active) = self.active {
            if task.is_active != active {
                return false;
            }
        }
        if let Some(ref ids) = self.ids {
            if !ids.contains(&task.id) {
                return false;
            }
        }
        true
    }
}

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (conference_id, title, description, is_active, is_required, due_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(data.conference_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.is_active)
        .bind(data.is_required)
        .bind(data.due_at)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Finds tasks matching a filter, oldest first
    pub async fn find(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {} FROM tasks WHERE TRUE", TASK_COLUMNS);
        let mut bind_count = 0;

        if filter.conference_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND conference_id = ${}", bind_count));
        }
        if filter.active.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND is_active = ${}", bind_count));
        }
        if filter.ids.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND id = ANY(${})", bind_count));
        }

        query.push_str(" ORDER BY created_at ASC, id ASC");

        let mut q = sqlx::query_as::<_, Task>(&query);

        if let Some(conference_id) = filter.conference_id {
            q = q.bind(conference_id);
        }
        if let Some(active) = filter.active {
            q = q.bind(active);
        }
        if let Some(ref ids) = filter.ids {
            q = q.bind(ids.clone());
        }

        let tasks = q.fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Deletes a task and revokes every assignment referencing it
    ///
    /// Runs in one transaction. Returns the number of revoked PersonTask rows,
    /// or `None` if the task did not exist.
    pub async fn delete_with_assignments(pool: &PgPool, id: Uuid) -> Result<Option<u64>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let revoked = sqlx::query("DELETE FROM person_tasks WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM category_tasks WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(revoked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(conference_id: Uuid, is_active: bool) -> Task {
        Task {
            id: Uuid::new_v4(),
            conference_id,
            title: "Pick up badge".to_string(),
            description: None,
            is_active,
            is_required: false,
            due_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_eligible_in() {
        let conference = Uuid::new_v4();
        let filter = TaskFilter::eligible_in(conference);

        assert!(filter.matches(&task(conference, true)));
        assert!(!filter.matches(&task(conference, false)));
        assert!(!filter.matches(&task(Uuid::new_v4(), true)));
    }

    #[test]
    fn test_filter_with_ids() {
        let a = task(Uuid::new_v4(), true);
        let b = task(Uuid::new_v4(), false);
        let filter = TaskFilter::with_ids([a.id]);

        assert!(filter.matches(&a));
        assert!(!filter.matches(&b));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(TaskFilter::default().matches(&task(Uuid::new_v4(), false)));
    }

    #[test]
    fn test_create_task_defaults() {
        let data: CreateTask = serde_json::from_value(serde_json::json!({
            "conference_id": Uuid::nil(),
            "title": "Lunch",
            "description": null,
            "due_at": null
        }))
        .unwrap();

        assert!(data.is_active);
        assert!(!data.is_required);
    }
}
