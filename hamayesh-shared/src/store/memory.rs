/// In-process entity store
///
/// Mirrors the PostgreSQL store's semantics closely enough for the core's
/// tests and for running the API without a database:
///
/// - ordering by insertion (stands in for `created_at, id`)
/// - task deletion revokes assignments and category links
/// - category deletion detaches persons and keeps their assignments
/// - batches are applied under a single write lock
///
/// [`MemoryStore::set_available`] makes every operation fail with
/// `StoreUnavailable`, which is how outage handling is exercised.
///
/// # Example
///
/// ```
/// use hamayesh_shared::store::memory::MemoryStore;
/// use hamayesh_shared::models::task::CreateTask;
///
/// # async fn example() {
/// let store = MemoryStore::new();
/// let conference = store.create_conference("DevConf").await;
/// let task = store.create_task(CreateTask::new(conference.id, "Check in")).await;
/// assert_eq!(task.conference_id, conference.id);
/// # }
/// ```

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AssignmentBatch, BatchOutcome, EntityStore};
use crate::error::{DomainError, DomainResult};
use crate::models::{
    category::{Category, CreateCategory},
    conference::{Conference, ConferenceStatistics},
    person::{hash_unique_code, CreatePerson, Person},
    person_task::{PersonTask, TaskCompletionStats},
    task::{CreateTask, Task, TaskFilter},
};

#[derive(Debug, Default)]
struct MemoryState {
    conferences: Vec<Conference>,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    /// (category_id, task_id)
    category_tasks: BTreeSet<(Uuid, Uuid)>,
    persons: Vec<Person>,
    person_tasks: Vec<PersonTask>,
}

impl MemoryState {
    fn category_task_ids(&self, category_id: Uuid) -> BTreeSet<Uuid> {
        self.category_tasks
            .iter()
            .filter(|(c, _)| *c == category_id)
            .map(|(_, t)| *t)
            .collect()
    }

    fn grant(&mut self, person_id: Uuid, task_id: Uuid) -> bool {
        if self
            .person_tasks
            .iter()
            .any(|pt| pt.person_id == person_id && pt.task_id == task_id)
        {
            return false;
        }
        let now = Utc::now();
        self.person_tasks.push(PersonTask {
            person_id,
            task_id,
            completed: false,
            completed_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        });
        true
    }

    fn revoke(&mut self, person_id: Uuid, task_id: Uuid) -> bool {
        let before = self.person_tasks.len();
        self.person_tasks
            .retain(|pt| !(pt.person_id == person_id && pt.task_id == task_id));
        self.person_tasks.len() != before
    }
}

/// Entity store kept in memory
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty, available store
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates the store going down (`false`) or coming back (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> DomainResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DomainError::StoreUnavailable(
                "memory store is offline".to_string(),
            ))
        }
    }

    /// Adds an active conference running for the next two days
    pub async fn create_conference(&self, name: &str) -> Conference {
        let now = Utc::now();
        let conference = Conference {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            starts_at: now,
            ends_at: now + Duration::days(2),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.conferences.push(conference.clone());
        conference
    }

    /// Adds a task
    pub async fn create_task(&self, data: CreateTask) -> Task {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            conference_id: data.conference_id,
            title: data.title,
            description: data.description,
            is_active: data.is_active,
            is_required: data.is_required,
            due_at: data.due_at,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.tasks.push(task.clone());
        task
    }

    /// Adds a category with the given initial task set
    pub async fn create_category(
        &self,
        data: CreateCategory,
        task_ids: impl IntoIterator<Item = Uuid>,
    ) -> Category {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            conference_id: data.conference_id,
            name: data.name,
            description: data.description,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.categories.push(category.clone());
        for task_id in task_ids {
            state.category_tasks.insert((category.id, task_id));
        }
        category
    }

    /// Registers a person
    pub async fn create_person(&self, data: CreatePerson) -> Person {
        let now = Utc::now();
        let person = Person {
            id: Uuid::new_v4(),
            conference_id: data.conference_id,
            category_id: data.category_id,
            hashed_unique_code: hash_unique_code(&data.unique_code),
            unique_code: data.unique_code,
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            telephone: data.telephone,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.persons.push(person.clone());
        person
    }

    /// Every assignment currently stored, sorted by (person, task)
    pub async fn all_person_tasks(&self) -> Vec<PersonTask> {
        let mut rows = self.state.read().await.person_tasks.clone();
        rows.sort_by_key(|pt| (pt.person_id, pt.task_id));
        rows
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn ping(&self) -> DomainResult<()> {
        self.check_available()
    }

    async fn find_conference(&self, id: Uuid) -> DomainResult<Conference> {
        self.check_available()?;
        let state = self.state.read().await;
        state
            .conferences
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("conference", id))
    }

    async fn find_tasks(&self, filter: &TaskFilter) -> DomainResult<Vec<Task>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .tasks
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect())
    }

    async fn find_task(&self, id: Uuid) -> DomainResult<Task> {
        self.check_available()?;
        let state = self.state.read().await;
        state
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("task", id))
    }

    async fn find_category(&self, id: Uuid) -> DomainResult<Category> {
        self.check_available()?;
        let state = self.state.read().await;
        state
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("category", id))
    }

    async fn category_task_ids(&self, id: Uuid) -> DomainResult<BTreeSet<Uuid>> {
        self.check_available()?;
        Ok(self.state.read().await.category_task_ids(id))
    }

    async fn find_person(&self, id: Uuid) -> DomainResult<Person> {
        self.check_available()?;
        let state = self.state.read().await;
        state
            .persons
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("person", id))
    }

    async fn find_person_by_hashed_code(&self, hashed_code: &str) -> DomainResult<Person> {
        self.check_available()?;
        let state = self.state.read().await;
        state
            .persons
            .iter()
            .find(|p| p.hashed_unique_code == hashed_code)
            .cloned()
            .ok_or_else(|| DomainError::PersonCodeNotFound(hashed_code.to_string()))
    }

    async fn find_persons(&self, ids: &[Uuid]) -> DomainResult<Vec<Person>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .persons
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn find_persons_by_category(&self, category_id: Uuid) -> DomainResult<Vec<Person>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .persons
            .iter()
            .filter(|p| p.category_id == Some(category_id))
            .cloned()
            .collect())
    }

    async fn set_person_category(&self, person_id: Uuid, category_id: Option<Uuid>) -> DomainResult<Person> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let person = state
            .persons
            .iter_mut()
            .find(|p| p.id == person_id)
            .ok_or_else(|| DomainError::not_found("person", person_id))?;
        person.category_id = category_id;
        person.updated_at = Utc::now();
        Ok(person.clone())
    }

    async fn find_person_tasks(&self, person_id: Uuid) -> DomainResult<Vec<PersonTask>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .person_tasks
            .iter()
            .filter(|pt| pt.person_id == person_id)
            .cloned()
            .collect())
    }

    async fn upsert_person_task(
        &self,
        person_id: Uuid,
        task_id: Uuid,
        completed: bool,
    ) -> DomainResult<PersonTask> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let now = Utc::now();

        if let Some(row) = state
            .person_tasks
            .iter_mut()
            .find(|pt| pt.person_id == person_id && pt.task_id == task_id)
        {
            row.completed_at = match (completed, row.completed) {
                (true, true) => row.completed_at,
                (true, false) => Some(now),
                (false, _) => None,
            };
            row.completed = completed;
            row.updated_at = now;
            return Ok(row.clone());
        }

        let row = PersonTask {
            person_id,
            task_id,
            completed,
            completed_at: completed.then_some(now),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        state.person_tasks.push(row.clone());
        Ok(row)
    }

    async fn delete_person_task(&self, person_id: Uuid, task_id: Uuid) -> DomainResult<bool> {
        self.check_available()?;
        Ok(self.state.write().await.revoke(person_id, task_id))
    }

    async fn commit_assignments(&self, batch: AssignmentBatch) -> DomainResult<BatchOutcome> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let mut outcome = BatchOutcome::default();

        if let Some(set) = batch.category_tasks {
            state.category_tasks.retain(|(c, _)| *c != set.category_id);
            for task_id in set.task_ids {
                state.category_tasks.insert((set.category_id, task_id));
            }
            if let Some(category) = state.categories.iter_mut().find(|c| c.id == set.category_id) {
                category.updated_at = Utc::now();
            }
        }

        for key in batch.grants {
            if state.grant(key.person_id, key.task_id) {
                outcome.granted += 1;
            }
        }
        for key in batch.revocations {
            if state.revoke(key.person_id, key.task_id) {
                outcome.revoked += 1;
            }
        }

        Ok(outcome)
    }

    async fn delete_task(&self, id: Uuid) -> DomainResult<u64> {
        self.check_available()?;
        let mut state = self.state.write().await;

        let Some(index) = state.tasks.iter().position(|t| t.id == id) else {
            return Err(DomainError::not_found("task", id));
        };
        state.tasks.remove(index);
        state.category_tasks.retain(|(_, t)| *t != id);

        let before = state.person_tasks.len();
        state.person_tasks.retain(|pt| pt.task_id != id);
        Ok((before - state.person_tasks.len()) as u64)
    }

    async fn delete_category(&self, id: Uuid) -> DomainResult<u64> {
        self.check_available()?;
        let mut state = self.state.write().await;

        let Some(index) = state.categories.iter().position(|c| c.id == id) else {
            return Err(DomainError::not_found("category", id));
        };
        state.categories.remove(index);
        state.category_tasks.retain(|(c, _)| *c != id);

        let mut detached = 0;
        for person in state.persons.iter_mut().filter(|p| p.category_id == Some(id)) {
            person.category_id = None;
            detached += 1;
        }
        Ok(detached)
    }

    async fn conference_statistics(&self, conference_id: Uuid) -> DomainResult<ConferenceStatistics> {
        self.check_available()?;
        let state = self.state.read().await;

        if !state.conferences.iter().any(|c| c.id == conference_id) {
            return Err(DomainError::not_found("conference", conference_id));
        }

        let task_ids: BTreeSet<Uuid> = state
            .tasks
            .iter()
            .filter(|t| t.conference_id == conference_id)
            .map(|t| t.id)
            .collect();
        let assignments: Vec<&PersonTask> = state
            .person_tasks
            .iter()
            .filter(|pt| task_ids.contains(&pt.task_id))
            .collect();

        Ok(ConferenceStatistics {
            total_attendees: state
                .persons
                .iter()
                .filter(|p| p.conference_id == conference_id)
                .count() as i64,
            total_tasks: task_ids.len() as i64,
            total_categories: state
                .categories
                .iter()
                .filter(|c| c.conference_id == conference_id)
                .count() as i64,
            total_assignments: assignments.len() as i64,
            completed_assignments: assignments.iter().filter(|pt| pt.completed).count() as i64,
        })
    }

    async fn task_completion_stats(&self, task_id: Uuid) -> DomainResult<TaskCompletionStats> {
        self.check_available()?;
        let state = self.state.read().await;

        if !state.tasks.iter().any(|t| t.id == task_id) {
            return Err(DomainError::not_found("task", task_id));
        }

        let (completed, pending) = state
            .person_tasks
            .iter()
            .filter(|pt| pt.task_id == task_id)
            .fold((0, 0), |(done, open), pt| {
                if pt.completed {
                    (done + 1, open)
                } else {
                    (done, open + 1)
                }
            });

        Ok(TaskCompletionStats {
            total_assignments: completed + pending,
            completed,
            pending,
        })
    }
}
