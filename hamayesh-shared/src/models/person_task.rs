/// PersonTask (assignment) model and database operations
///
/// One row per (person, task) pair. `completed_at` follows the `completed`
/// flag: it is stamped when the flag turns true and cleared when it turns
/// false.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE person_tasks (
///     person_id UUID NOT NULL REFERENCES persons(id) ON DELETE CASCADE,
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     completed_at TIMESTAMPTZ,
///     notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (person_id, task_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Assignment of a task to a person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersonTask {
    /// Assigned person
    pub person_id: Uuid,

    /// Assigned task
    pub task_id: Uuid,

    /// Completion flag
    pub completed: bool,

    /// When the task was completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Free-form notes
    pub notes: Option<String>,

    /// When the assignment was created
    pub created_at: DateTime<Utc>,

    /// When the assignment was last updated
    pub updated_at: DateTime<Utc>,
}

/// Completion counts for one task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskCompletionStats {
    /// PersonTask rows for the task
    pub total_assignments: i64,

    /// Rows marked completed
    pub completed: i64,

    /// Rows still open
    pub pending: i64,
}

impl TaskCompletionStats {
    /// Completion percentage rounded to two decimals (0 when unassigned)
    pub fn completion_rate(&self) -> f64 {
        if self.total_assignments == 0 {
            return 0.0;
        }
        let rate = self.completed as f64 / self.total_assignments as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

impl PersonTask {
    /// Counts a task's assignments by completion
    pub async fn completion_stats(pool: &PgPool, task_id: Uuid) -> Result<TaskCompletionStats, sqlx::Error> {
        let stats = sqlx::query_as::<_, TaskCompletionStats>(
            r#"
            SELECT COUNT(*) AS total_assignments,
                   COUNT(*) FILTER (WHERE completed) AS completed,
                   COUNT(*) FILTER (WHERE NOT completed) AS pending
            FROM person_tasks
            WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }

    /// Lists a person's assignments, oldest first
    pub async fn list_by_person(pool: &PgPool, person_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PersonTask>(
            r#"
            SELECT person_id, task_id, completed, completed_at, notes, created_at, updated_at
            FROM person_tasks
            WHERE person_id = $1
            ORDER BY created_at ASC, task_id ASC
            "#,
        )
        .bind(person_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Creates or updates an assignment with the given completion flag
    pub async fn upsert<'e, E>(
        executor: E,
        person_id: Uuid,
        task_id: Uuid,
        completed: bool,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, PersonTask>(
            r#"
            INSERT INTO person_tasks (person_id, task_id, completed, completed_at)
            VALUES ($1, $2, $3, CASE WHEN $3 THEN NOW() END)
            ON CONFLICT (person_id, task_id) DO UPDATE
            SET completed = EXCLUDED.completed,
                completed_at = CASE
                    WHEN EXCLUDED.completed AND person_tasks.completed THEN person_tasks.completed_at
                    WHEN EXCLUDED.completed THEN NOW()
                END,
                updated_at = NOW()
            RETURNING person_id, task_id, completed, completed_at, notes, created_at, updated_at
            "#,
        )
        .bind(person_id)
        .bind(task_id)
        .bind(completed)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    /// Grants a pending assignment unless one already exists
    ///
    /// Existing rows, completed or not, are left untouched. Returns whether a
    /// row was inserted.
    pub async fn insert_if_absent<'e, E>(
        executor: E,
        person_id: Uuid,
        task_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO person_tasks (person_id, task_id)
            VALUES ($1, $2)
            ON CONFLICT (person_id, task_id) DO NOTHING
            "#,
        )
        .bind(person_id)
        .bind(task_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes an assignment. Returns whether a row was removed.
    pub async fn delete<'e, E>(executor: E, person_id: Uuid, task_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM person_tasks WHERE person_id = $1 AND task_id = $2")
            .bind(person_id)
            .bind(task_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_completion_rate() {
        let stats = TaskCompletionStats {
            total_assignments: 3,
            completed: 1,
            pending: 2,
        };
        assert_eq!(stats.completion_rate(), 33.33);
        assert_eq!(TaskCompletionStats::default().completion_rate(), 0.0);
    }
}
