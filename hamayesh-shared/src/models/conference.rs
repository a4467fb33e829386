/// Conference model and database operations
///
/// A conference is the top-level scope: it owns categories, tasks and
/// persons, and deleting it cascades to all of them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE conferences (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     starts_at TIMESTAMPTZ NOT NULL,
///     ends_at TIMESTAMPTZ NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CHECK (ends_at >= starts_at)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use hamayesh_shared::models::conference::{Conference, CreateConference};
/// use hamayesh_shared::db::pool::{create_pool, DatabaseConfig};
/// use chrono::{Duration, Utc};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let conference = Conference::create(&pool, CreateConference {
///     name: "RustFest".to_string(),
///     description: None,
///     starts_at: Utc::now(),
///     ends_at: Utc::now() + Duration::days(2),
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Conference model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conference {
    /// Unique conference ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// When the conference starts
    pub starts_at: DateTime<Utc>,

    /// When the conference ends
    pub ends_at: DateTime<Utc>,

    /// Inactive conferences are hidden from selection lists
    pub is_active: bool,

    /// When the conference was created
    pub created_at: DateTime<Utc>,

    /// When the conference was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new conference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConference {
    /// Display name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Start timestamp
    pub starts_at: DateTime<Utc>,

    /// End timestamp (must not precede `starts_at`)
    pub ends_at: DateTime<Utc>,
}

/// Where a conference sits relative to a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScheduleStatus {
    /// Not started yet
    Upcoming { days_left: i64 },

    /// Running now; `days_left` counts down to the end
    Ongoing { days_left: i64 },

    /// Already over
    Ended,
}

/// Aggregated counts for a conference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConferenceStatistics {
    /// Registered persons
    pub total_attendees: i64,

    /// Tasks defined in the conference
    pub total_tasks: i64,

    /// Categories defined in the conference
    pub total_categories: i64,

    /// PersonTask rows for the conference's tasks
    pub total_assignments: i64,

    /// Completed PersonTask rows
    pub completed_assignments: i64,
}

impl ConferenceStatistics {
    /// Completion percentage rounded to two decimals (0 when nothing is assigned)
    pub fn completion_rate(&self) -> f64 {
        if self.total_assignments == 0 {
            return 0.0;
        }
        let rate = self.completed_assignments as f64 / self.total_assignments as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

impl Conference {
    /// Computes the schedule status at `now`
    pub fn schedule_status(&self, now: DateTime<Utc>) -> ScheduleStatus {
        if now < self.starts_at {
            ScheduleStatus::Upcoming {
                days_left: (self.starts_at - now).num_days(),
            }
        } else if now <= self.ends_at {
            ScheduleStatus::Ongoing {
                days_left: (self.ends_at - now).num_days(),
            }
        } else {
            ScheduleStatus::Ended
        }
    }

    /// Creates a new conference
    ///
    /// # Errors
    ///
    /// Returns an error if the schedule check fails or the database is unreachable
    pub async fn create(pool: &PgPool, data: CreateConference) -> Result<Self, sqlx::Error> {
        let conference = sqlx::query_as::<_, Conference>(
            r#"
            INSERT INTO conferences (name, description, starts_at, ends_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, starts_at, ends_at, is_active, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.starts_at)
        .bind(data.ends_at)
        .fetch_one(pool)
        .await?;

        Ok(conference)
    }

    /// Finds a conference by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let conference = sqlx::query_as::<_, Conference>(
            r#"
            SELECT id, name, description, starts_at, ends_at, is_active, created_at, updated_at
            FROM conferences
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(conference)
    }

    /// Collects attendee/task/category counts and assignment completion
    pub async fn statistics(pool: &PgPool, id: Uuid) -> Result<ConferenceStatistics, sqlx::Error> {
        let stats = sqlx::query_as::<_, ConferenceStatistics>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM persons WHERE conference_id = $1) AS total_attendees,
                (SELECT COUNT(*) FROM tasks WHERE conference_id = $1) AS total_tasks,
                (SELECT COUNT(*) FROM categories WHERE conference_id = $1) AS total_categories,
                (SELECT COUNT(*)
                   FROM person_tasks pt
                   JOIN tasks t ON t.id = pt.task_id
                  WHERE t.conference_id = $1) AS total_assignments,
                (SELECT COUNT(*)
                   FROM person_tasks pt
                   JOIN tasks t ON t.id = pt.task_id
                  WHERE t.conference_id = $1 AND pt.completed) AS completed_assignments
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }

    /// Deletes a conference
    ///
    /// ⚠️  Cascades to every category, task, person and assignment it owns.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM conferences WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
