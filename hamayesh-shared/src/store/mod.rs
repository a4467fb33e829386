/// Entity store abstraction
///
/// The filter engine and the assignment rule never talk to PostgreSQL
/// directly; they go through [`EntityStore`], which has two implementations:
///
/// - [`postgres::PgStore`]: the production store (sqlx + PostgreSQL)
/// - [`memory::MemoryStore`]: an in-process store for tests and local runs,
///   with a switch to simulate outages
///
/// # Atomicity
///
/// Every mutation that must land all-or-nothing is expressed as an
/// [`AssignmentBatch`] and handed to [`EntityStore::commit_assignments`],
/// which applies it in a single transaction.
///
/// # Example
///
/// ```
/// use hamayesh_shared::store::{EntityStore, memory::MemoryStore};
/// use hamayesh_shared::models::task::TaskFilter;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let tasks = store.find_tasks(&TaskFilter::eligible_in(Uuid::new_v4())).await?;
/// assert!(tasks.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::{
    category::Category,
    conference::{Conference, ConferenceStatistics},
    person::Person,
    person_task::{PersonTask, TaskCompletionStats},
    task::{Task, TaskFilter},
};

/// Identifies one PersonTask row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonTaskKey {
    /// Person
    pub person_id: Uuid,

    /// Task
    pub task_id: Uuid,
}

impl PersonTaskKey {
    pub fn new(person_id: Uuid, task_id: Uuid) -> Self {
        Self { person_id, task_id }
    }
}

/// Replacement task set for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTaskSet {
    /// Category whose set is replaced
    pub category_id: Uuid,

    /// The complete new set
    pub task_ids: BTreeSet<Uuid>,
}

/// Mutations applied atomically by [`EntityStore::commit_assignments`]
///
/// Grants insert a pending PersonTask only when none exists; revocations
/// delete the row if present. Both are therefore safe to replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentBatch {
    /// Optional category task-set replacement
    pub category_tasks: Option<CategoryTaskSet>,

    /// Assignments to create
    pub grants: Vec<PersonTaskKey>,

    /// Assignments to delete
    pub revocations: Vec<PersonTaskKey>,
}

impl AssignmentBatch {
    /// Whether committing the batch would change nothing
    pub fn is_empty(&self) -> bool {
        self.category_tasks.is_none() && self.grants.is_empty() && self.revocations.is_empty()
    }
}

/// Rows actually touched by a committed batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// PersonTask rows inserted
    pub granted: u64,

    /// PersonTask rows deleted
    pub revoked: u64,
}

/// Operations the core consumes from persistent storage
///
/// All operations may fail with `StoreUnavailable`; lookups of a single
/// entity fail with `NotFound` when it does not exist.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Connectivity check
    async fn ping(&self) -> DomainResult<()>;

    /// One conference
    async fn find_conference(&self, id: Uuid) -> DomainResult<Conference>;

    /// Tasks matching the filter, ordered by creation time then ID
    async fn find_tasks(&self, filter: &TaskFilter) -> DomainResult<Vec<Task>>;

    /// One task
    async fn find_task(&self, id: Uuid) -> DomainResult<Task>;

    /// One category
    async fn find_category(&self, id: Uuid) -> DomainResult<Category>;

    /// The category's task set
    async fn category_task_ids(&self, id: Uuid) -> DomainResult<BTreeSet<Uuid>>;

    /// One person
    async fn find_person(&self, id: Uuid) -> DomainResult<Person>;

    /// The person whose badge carries this code digest
    async fn find_person_by_hashed_code(&self, hashed_code: &str) -> DomainResult<Person>;

    /// The persons among `ids` that exist, ordered by registration
    async fn find_persons(&self, ids: &[Uuid]) -> DomainResult<Vec<Person>>;

    /// Current members of a category, ordered by registration
    async fn find_persons_by_category(&self, category_id: Uuid) -> DomainResult<Vec<Person>>;

    /// Moves a person to another category, or out of any; assignments stay
    async fn set_person_category(&self, person_id: Uuid, category_id: Option<Uuid>) -> DomainResult<Person>;

    /// A person's assignments
    async fn find_person_tasks(&self, person_id: Uuid) -> DomainResult<Vec<PersonTask>>;

    /// Creates or updates one assignment
    async fn upsert_person_task(
        &self,
        person_id: Uuid,
        task_id: Uuid,
        completed: bool,
    ) -> DomainResult<PersonTask>;

    /// Deletes one assignment; `false` if there was none
    async fn delete_person_task(&self, person_id: Uuid, task_id: Uuid) -> DomainResult<bool>;

    /// Applies a batch in one transaction
    async fn commit_assignments(&self, batch: AssignmentBatch) -> DomainResult<BatchOutcome>;

    /// Deletes a task, revoking its assignments; returns the revoked count
    async fn delete_task(&self, id: Uuid) -> DomainResult<u64>;

    /// Deletes a category, detaching its persons; returns the detached count
    async fn delete_category(&self, id: Uuid) -> DomainResult<u64>;

    /// Counts for one conference
    async fn conference_statistics(&self, conference_id: Uuid) -> DomainResult<ConferenceStatistics>;

    /// Completion counts for one task
    async fn task_completion_stats(&self, task_id: Uuid) -> DomainResult<TaskCompletionStats>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch() {
        assert!(AssignmentBatch::default().is_empty());

        let batch = AssignmentBatch {
            grants: vec![PersonTaskKey::new(Uuid::new_v4(), Uuid::new_v4())],
            ..Default::default()
        };
        assert!(!batch.is_empty());
    }
}
