/// Category model and database operations
///
/// Categories group the persons of a conference and carry a default task
/// set (`category_tasks`). Category names are unique within a conference.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     conference_id UUID NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
///     name VARCHAR(64) NOT NULL,
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (conference_id, name)
/// );
///
/// CREATE TABLE category_tasks (
///     category_id UUID NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (category_id, task_id)
/// );
/// ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Category model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Unique category ID
    pub id: Uuid,

    /// Owning conference
    pub conference_id: Uuid,

    /// Name, unique within the conference
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// When the category was created
    pub created_at: DateTime<Utc>,

    /// When the category was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    /// Owning conference
    pub conference_id: Uuid,

    /// Name
    pub name: String,

    /// Optional description
    pub description: Option<String>,
}

impl Category {
    /// Creates a new category with an empty task set
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already used in the conference
    /// (`categories_conference_name_key`) or the database is unreachable
    pub async fn create(pool: &PgPool, data: CreateCategory) -> Result<Self, sqlx::Error> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (conference_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, conference_id, name, description, created_at, updated_at
            "#,
        )
        .bind(data.conference_id)
        .bind(data.name)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(category)
    }

    /// Finds a category by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, conference_id, name, description, created_at, updated_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(category)
    }

    /// Returns the category's task set
    pub async fn task_ids<'e, E>(executor: E, id: Uuid) -> Result<BTreeSet<Uuid>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT task_id FROM category_tasks WHERE category_id = $1")
                .bind(id)
                .fetch_all(executor)
                .await?;

        Ok(rows.into_iter().map(|(task_id,)| task_id).collect())
    }

    /// Adds a task to the category's set (no-op if already present)
    pub async fn add_task<'e, E>(executor: E, id: Uuid, task_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO category_tasks (category_id, task_id)
            VALUES ($1, $2)
            ON CONFLICT (category_id, task_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(task_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a task from the category's set
    pub async fn remove_task<'e, E>(executor: E, id: Uuid, task_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result =
            sqlx::query("DELETE FROM category_tasks WHERE category_id = $1 AND task_id = $2")
                .bind(id)
                .bind(task_id)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Touches `updated_at` after the task set changed
    pub async fn touch<'e, E>(executor: E, id: Uuid) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("UPDATE categories SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Deletes a category and detaches its persons
    ///
    /// Persons keep their PersonTask rows; only `category_id` is cleared.
    /// Returns the number of detached persons, or `None` if the category did
    /// not exist.
    pub async fn delete_detaching_persons(pool: &PgPool, id: Uuid) -> Result<Option<u64>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let detached = sqlx::query(
            "UPDATE persons SET category_id = NULL, updated_at = NOW() WHERE category_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(detached))
    }
}
