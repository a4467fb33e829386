/// PostgreSQL-backed entity store
///
/// Thin adapter from [`EntityStore`] to the sqlx model operations. Batches
/// run inside one transaction: a request interrupted halfway leaves nothing
/// behind.
///
/// # Example
///
/// ```no_run
/// use hamayesh_shared::db::pool::{create_pool, DatabaseConfig};
/// use hamayesh_shared::store::{EntityStore, postgres::PgStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AssignmentBatch, BatchOutcome, EntityStore};
use crate::db;
use crate::error::{DomainError, DomainResult};
use crate::models::{
    category::Category,
    conference::{Conference, ConferenceStatistics},
    person::Person,
    person_task::{PersonTask, TaskCompletionStats},
    task::{Task, TaskFilter},
};

/// Entity store over a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn ping(&self) -> DomainResult<()> {
        db::pool::ping(&self.pool).await?;
        Ok(())
    }

    async fn find_conference(&self, id: Uuid) -> DomainResult<Conference> {
        Conference::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| DomainError::not_found("conference", id))
    }

    async fn find_tasks(&self, filter: &TaskFilter) -> DomainResult<Vec<Task>> {
        Ok(Task::find(&self.pool, filter).await?)
    }

    async fn find_task(&self, id: Uuid) -> DomainResult<Task> {
        Task::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| DomainError::not_found("task", id))
    }

    async fn find_category(&self, id: Uuid) -> DomainResult<Category> {
        Category::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| DomainError::not_found("category", id))
    }

    async fn category_task_ids(&self, id: Uuid) -> DomainResult<BTreeSet<Uuid>> {
        Ok(Category::task_ids(&self.pool, id).await?)
    }

    async fn find_person(&self, id: Uuid) -> DomainResult<Person> {
        Person::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| DomainError::not_found("person", id))
    }

    async fn find_person_by_hashed_code(&self, hashed_code: &str) -> DomainResult<Person> {
        Person::find_by_hashed_code(&self.pool, hashed_code)
            .await?
            .ok_or_else(|| DomainError::PersonCodeNotFound(hashed_code.to_string()))
    }

    async fn find_persons(&self, ids: &[Uuid]) -> DomainResult<Vec<Person>> {
        Ok(Person::find_by_ids(&self.pool, ids).await?)
    }

    async fn find_persons_by_category(&self, category_id: Uuid) -> DomainResult<Vec<Person>> {
        Ok(Person::list_by_category(&self.pool, category_id).await?)
    }

    async fn set_person_category(&self, person_id: Uuid, category_id: Option<Uuid>) -> DomainResult<Person> {
        Person::set_category(&self.pool, person_id, category_id)
            .await?
            .ok_or_else(|| DomainError::not_found("person", person_id))
    }

    async fn find_person_tasks(&self, person_id: Uuid) -> DomainResult<Vec<PersonTask>> {
        Ok(PersonTask::list_by_person(&self.pool, person_id).await?)
    }

    async fn upsert_person_task(
        &self,
        person_id: Uuid,
        task_id: Uuid,
        completed: bool,
    ) -> DomainResult<PersonTask> {
        Ok(PersonTask::upsert(&self.pool, person_id, task_id, completed).await?)
    }

    async fn delete_person_task(&self, person_id: Uuid, task_id: Uuid) -> DomainResult<bool> {
        Ok(PersonTask::delete(&self.pool, person_id, task_id).await?)
    }

    async fn commit_assignments(&self, batch: AssignmentBatch) -> DomainResult<BatchOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut outcome = BatchOutcome::default();

        if let Some(ref set) = batch.category_tasks {
            let current = Category::task_ids(&mut *tx, set.category_id).await?;

            for task_id in current.difference(&set.task_ids) {
                Category::remove_task(&mut *tx, set.category_id, *task_id).await?;
            }
            for task_id in set.task_ids.difference(&current) {
                Category::add_task(&mut *tx, set.category_id, *task_id).await?;
            }
            Category::touch(&mut *tx, set.category_id).await?;
        }

        for key in &batch.grants {
            if PersonTask::insert_if_absent(&mut *tx, key.person_id, key.task_id).await? {
                outcome.granted += 1;
            }
        }

        for key in &batch.revocations {
            if PersonTask::delete(&mut *tx, key.person_id, key.task_id).await? {
                outcome.revoked += 1;
            }
        }

        if let Err(e) = tx.commit().await {
            warn!(error = %e, "Assignment batch commit failed");
            return Err(e.into());
        }

        debug!(
            granted = outcome.granted,
            revoked = outcome.revoked,
            "Assignment batch committed"
        );
        Ok(outcome)
    }

    async fn delete_task(&self, id: Uuid) -> DomainResult<u64> {
        Task::delete_with_assignments(&self.pool, id)
            .await?
            .ok_or_else(|| DomainError::not_found("task", id))
    }

    async fn delete_category(&self, id: Uuid) -> DomainResult<u64> {
        Category::delete_detaching_persons(&self.pool, id)
            .await?
            .ok_or_else(|| DomainError::not_found("category", id))
    }

    async fn conference_statistics(&self, conference_id: Uuid) -> DomainResult<ConferenceStatistics> {
        self.find_conference(conference_id).await?;
        Ok(Conference::statistics(&self.pool, conference_id).await?)
    }

    async fn task_completion_stats(&self, task_id: Uuid) -> DomainResult<TaskCompletionStats> {
        self.find_task(task_id).await?;
        Ok(PersonTask::completion_stats(&self.pool, task_id).await?)
    }
}
