/// Assignment consistency rule
///
/// Category task-set edits are propagated to the individual assignments of
/// every person currently in the category: added tasks are granted (pending,
/// existing assignments untouched) and removed tasks are revoked.
///
/// Preconditions are checked before anything is written, and every mutation
/// of one edit is committed as a single [`AssignmentBatch`]. Applying the same
/// edit twice leaves the same state as applying it once.
///
/// Moving a person to another category does not grant or revoke anything.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
/// use hamayesh_shared::assignment::CategoryTaskChange;
/// use uuid::Uuid;
///
/// let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
/// let before: BTreeSet<Uuid> = [a, b].into();
/// let after: BTreeSet<Uuid> = [a, c].into();
///
/// let change = CategoryTaskChange::between(&before, &after);
/// assert_eq!(change.added(), &BTreeSet::from([c]));
/// assert_eq!(change.removed(), &BTreeSet::from([b]));
/// ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::{
    category::Category,
    person::Person,
    person_task::PersonTask,
    task::{Task, TaskFilter},
};
use crate::store::{AssignmentBatch, CategoryTaskSet, EntityStore, PersonTaskKey};

/// A disjoint pair of task sets: tasks added to and removed from a category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTaskChange {
    added: BTreeSet<Uuid>,
    removed: BTreeSet<Uuid>,
}

impl CategoryTaskChange {
    /// Builds a change from explicit sets
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if a task is both added and removed.
    pub fn new(added: BTreeSet<Uuid>, removed: BTreeSet<Uuid>) -> DomainResult<Self> {
        if let Some(task_id) = added.intersection(&removed).next() {
            return Err(DomainError::InvariantViolation(format!(
                "task {} is both added and removed",
                task_id
            )));
        }
        Ok(Self { added, removed })
    }

    /// The change turning `before` into `after`
    pub fn between(before: &BTreeSet<Uuid>, after: &BTreeSet<Uuid>) -> Self {
        Self {
            added: after.difference(before).copied().collect(),
            removed: before.difference(after).copied().collect(),
        }
    }

    pub fn added(&self) -> &BTreeSet<Uuid> {
        &self.added
    }

    pub fn removed(&self) -> &BTreeSet<Uuid> {
        &self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Result of a category task edit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Edited category
    pub category_id: Uuid,

    /// Persons the edit was propagated to
    pub members: usize,

    /// Assignments created
    pub granted: u64,

    /// Assignments deleted
    pub revoked: u64,

    /// Non-fatal problems, e.g. references that no longer exist
    pub warnings: Vec<String>,
}

impl ApplyReport {
    fn missing_category(category_id: Uuid) -> Self {
        warn!(category_id = %category_id, "Category not found, nothing applied");
        Self {
            category_id,
            warnings: vec![format!("category {} not found, nothing applied", category_id)],
            ..Default::default()
        }
    }
}

async fn lookup_category(store: &dyn EntityStore, category_id: Uuid) -> DomainResult<Option<Category>> {
    match store.find_category(category_id).await {
        Ok(category) => Ok(Some(category)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Keeps the task IDs that still exist, rejecting foreign tasks
async fn existing_tasks_of(
    store: &dyn EntityStore,
    category: &Category,
    task_ids: &BTreeSet<Uuid>,
    warnings: &mut Vec<String>,
) -> DomainResult<BTreeSet<Uuid>> {
    if task_ids.is_empty() {
        return Ok(BTreeSet::new());
    }

    let tasks = store
        .find_tasks(&TaskFilter::with_ids(task_ids.iter().copied()))
        .await?;

    if let Some(foreign) = tasks.iter().find(|t| t.conference_id != category.conference_id) {
        return Err(DomainError::InvariantViolation(format!(
            "task {} belongs to conference {}, category {} to conference {}",
            foreign.id, foreign.conference_id, category.id, category.conference_id
        )));
    }

    let found: BTreeSet<Uuid> = tasks.iter().map(|t| t.id).collect();
    for missing in task_ids.difference(&found) {
        warnings.push(format!("task {} not found, skipped", missing));
    }
    Ok(found)
}

/// Builds and commits the batch for one category edit
async fn propagate(
    store: &dyn EntityStore,
    category: &Category,
    change: &CategoryTaskChange,
    new_set: Option<BTreeSet<Uuid>>,
    warnings: Vec<String>,
) -> DomainResult<ApplyReport> {
    let members = store.find_persons_by_category(category.id).await?;

    if let Some(stranger) = members.iter().find(|p| p.conference_id != category.conference_id) {
        return Err(DomainError::InvariantViolation(format!(
            "person {} in category {} belongs to conference {}",
            stranger.id, category.id, stranger.conference_id
        )));
    }

    let mut batch = AssignmentBatch {
        category_tasks: new_set.map(|task_ids| CategoryTaskSet {
            category_id: category.id,
            task_ids,
        }),
        ..Default::default()
    };
    for person in &members {
        batch
            .grants
            .extend(change.added().iter().map(|t| PersonTaskKey::new(person.id, *t)));
        batch
            .revocations
            .extend(change.removed().iter().map(|t| PersonTaskKey::new(person.id, *t)));
    }

    let outcome = if batch.is_empty() {
        debug!(category_id = %category.id, "Category task change is empty");
        Default::default()
    } else {
        store.commit_assignments(batch).await?
    };

    info!(
        category_id = %category.id,
        members = members.len(),
        granted = outcome.granted,
        revoked = outcome.revoked,
        "Category task change applied"
    );

    Ok(ApplyReport {
        category_id: category.id,
        members: members.len(),
        granted: outcome.granted,
        revoked: outcome.revoked,
        warnings,
    })
}

/// Propagates an explicit add/remove edit to the category's members
///
/// The category's own task set is not modified; see
/// [`save_category_tasks`] for the full save path.
///
/// # Errors
///
/// - `InvariantViolation` if the sets overlap, an added task belongs to
///   another conference, or a member belongs to another conference. Nothing
///   is written.
/// - `StoreUnavailable` if the store fails. Nothing is written.
///
/// A category that no longer exists is reported as a warning.
pub async fn apply_category_task_change(
    store: &dyn EntityStore,
    category_id: Uuid,
    added: BTreeSet<Uuid>,
    removed: BTreeSet<Uuid>,
) -> DomainResult<ApplyReport> {
    let change = CategoryTaskChange::new(added, removed)?;

    let Some(category) = lookup_category(store, category_id).await? else {
        return Ok(ApplyReport::missing_category(category_id));
    };

    let mut warnings = Vec::new();
    let added = existing_tasks_of(store, &category, change.added(), &mut warnings).await?;
    let change = CategoryTaskChange {
        added,
        removed: change.removed,
    };

    propagate(store, &category, &change, None, warnings).await
}

/// Replaces a category's task set and propagates the difference
///
/// The new set and the member grants/revocations land in one batch.
/// Requested tasks that no longer exist are dropped with a warning.
pub async fn save_category_tasks(
    store: &dyn EntityStore,
    category_id: Uuid,
    task_ids: BTreeSet<Uuid>,
) -> DomainResult<ApplyReport> {
    let Some(category) = lookup_category(store, category_id).await? else {
        return Ok(ApplyReport::missing_category(category_id));
    };

    let mut warnings = Vec::new();
    let after = existing_tasks_of(store, &category, &task_ids, &mut warnings).await?;
    let before = store.category_task_ids(category.id).await?;
    let change = CategoryTaskChange::between(&before, &after);

    propagate(store, &category, &change, Some(after), warnings).await
}

/// Assigns a task to a person, or updates its completion flag
///
/// # Errors
///
/// - `NotFound` if the person or the task does not exist
/// - `InvariantViolation` if the task belongs to another conference
pub async fn assign_task(
    store: &dyn EntityStore,
    person_id: Uuid,
    task_id: Uuid,
    completed: bool,
) -> DomainResult<PersonTask> {
    let person = store.find_person(person_id).await?;
    let task = store.find_task(task_id).await?;

    if task.conference_id != person.conference_id {
        return Err(DomainError::InvariantViolation(format!(
            "task {} belongs to conference {}, person {} to conference {}",
            task.id, task.conference_id, person.id, person.conference_id
        )));
    }

    let row = store.upsert_person_task(person.id, task.id, completed).await?;
    debug!(person_id = %person.id, task_id = %task.id, completed, "Task assigned");
    Ok(row)
}

/// Removes one assignment; `false` if the person did not hold the task
pub async fn revoke_task(store: &dyn EntityStore, person_id: Uuid, task_id: Uuid) -> DomainResult<bool> {
    let person = store.find_person(person_id).await?;
    let removed = store.delete_person_task(person.id, task_id).await?;
    debug!(person_id = %person.id, task_id = %task_id, removed, "Task revoked");
    Ok(removed)
}

/// Moves a person into a category of their conference, or out of any
///
/// Assignments are not granted or revoked: the person keeps exactly the
/// tasks they held before the move.
///
/// # Errors
///
/// - `NotFound` if the person or the category does not exist
/// - `InvariantViolation` if the category belongs to another conference
pub async fn move_person(
    store: &dyn EntityStore,
    person_id: Uuid,
    category_id: Option<Uuid>,
) -> DomainResult<Person> {
    let person = store.find_person(person_id).await?;

    if let Some(category_id) = category_id {
        let category = store.find_category(category_id).await?;
        if category.conference_id != person.conference_id {
            return Err(DomainError::InvariantViolation(format!(
                "category {} belongs to conference {}, person {} to conference {}",
                category.id, category.conference_id, person.id, person.conference_id
            )));
        }
    }

    let moved = store.set_person_category(person.id, category_id).await?;
    info!(
        person_id = %moved.id,
        from = ?person.category_id,
        to = ?moved.category_id,
        "Person moved"
    );
    Ok(moved)
}

/// Result of assigning or unassigning one task for a set of persons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    /// Task the operation applied to
    pub task_id: Uuid,

    /// Persons found among the requested IDs
    pub persons: usize,

    /// Assignments created
    pub granted: u64,

    /// Assignments deleted
    pub revoked: u64,

    /// Requested persons that do not exist
    pub warnings: Vec<String>,
}

/// Loads the task and the requested persons, rejecting persons of another
/// conference before anything is written
async fn bulk_targets(
    store: &dyn EntityStore,
    task_id: Uuid,
    person_ids: &BTreeSet<Uuid>,
) -> DomainResult<(Task, Vec<Person>, Vec<String>)> {
    let task = store.find_task(task_id).await?;
    let ids: Vec<Uuid> = person_ids.iter().copied().collect();
    let persons = if ids.is_empty() {
        Vec::new()
    } else {
        store.find_persons(&ids).await?
    };

    if let Some(stranger) = persons.iter().find(|p| p.conference_id != task.conference_id) {
        return Err(DomainError::InvariantViolation(format!(
            "person {} belongs to conference {}, task {} to conference {}",
            stranger.id, stranger.conference_id, task.id, task.conference_id
        )));
    }

    let found: BTreeSet<Uuid> = persons.iter().map(|p| p.id).collect();
    let warnings = person_ids
        .difference(&found)
        .map(|missing| format!("person {} not found, skipped", missing))
        .collect();

    Ok((task, persons, warnings))
}

/// Assigns one task to every listed person in a single batch
///
/// Persons already holding the task keep their row. Unknown persons are
/// skipped with a warning.
///
/// # Errors
///
/// - `NotFound` if the task does not exist
/// - `InvariantViolation` if a listed person belongs to another conference.
///   Nothing is written.
pub async fn bulk_assign_task(
    store: &dyn EntityStore,
    task_id: Uuid,
    person_ids: BTreeSet<Uuid>,
) -> DomainResult<BulkReport> {
    let (task, persons, warnings) = bulk_targets(store, task_id, &person_ids).await?;

    let batch = AssignmentBatch {
        grants: persons.iter().map(|p| PersonTaskKey::new(p.id, task.id)).collect(),
        ..Default::default()
    };
    let outcome = if batch.is_empty() {
        Default::default()
    } else {
        store.commit_assignments(batch).await?
    };

    info!(task_id = %task.id, persons = persons.len(), granted = outcome.granted, "Task bulk-assigned");

    Ok(BulkReport {
        task_id: task.id,
        persons: persons.len(),
        granted: outcome.granted,
        revoked: 0,
        warnings,
    })
}

/// Removes one task from every listed person in a single batch
///
/// # Errors
///
/// Same as [`bulk_assign_task`].
pub async fn bulk_unassign_task(
    store: &dyn EntityStore,
    task_id: Uuid,
    person_ids: BTreeSet<Uuid>,
) -> DomainResult<BulkReport> {
    let (task, persons, warnings) = bulk_targets(store, task_id, &person_ids).await?;

    let batch = AssignmentBatch {
        revocations: persons.iter().map(|p| PersonTaskKey::new(p.id, task.id)).collect(),
        ..Default::default()
    };
    let outcome = if batch.is_empty() {
        Default::default()
    } else {
        store.commit_assignments(batch).await?
    };

    info!(task_id = %task.id, persons = persons.len(), revoked = outcome.revoked, "Task bulk-unassigned");

    Ok(BulkReport {
        task_id: task.id,
        persons: persons.len(),
        granted: 0,
        revoked: outcome.revoked,
        warnings,
    })
}

/// Deletes a task and every assignment referencing it
///
/// Returns the number of revoked assignments.
pub async fn delete_task(store: &dyn EntityStore, task_id: Uuid) -> DomainResult<u64> {
    let revoked = store.delete_task(task_id).await?;
    info!(task_id = %task_id, revoked, "Task deleted");
    Ok(revoked)
}

/// Deletes a category, detaching its persons
///
/// Assignments are kept. Returns the number of detached persons.
pub async fn delete_category(store: &dyn EntityStore, category_id: Uuid) -> DomainResult<u64> {
    let detached = store.delete_category(category_id).await?;
    info!(category_id = %category_id, detached, "Category deleted");
    Ok(detached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::CreateCategory;
    use crate::models::conference::Conference;
    use crate::models::person::CreatePerson;
    use crate::models::task::CreateTask;
    use crate::store::memory::MemoryStore;

    fn set(ids: &[Uuid]) -> BTreeSet<Uuid> {
        ids.iter().copied().collect()
    }

    async fn add_person(store: &MemoryStore, conference: &Conference, category: &Category, code: &str) -> Person {
        store
            .create_person(CreatePerson {
                conference_id: conference.id,
                category_id: Some(category.id),
                unique_code: code.to_string(),
                first_name: "Ali".to_string(),
                last_name: "Rezaei".to_string(),
                email: None,
                telephone: "+989121111111".to_string(),
            })
            .await
    }

    async fn task_ids_of(store: &MemoryStore, person: &Person) -> BTreeSet<Uuid> {
        store
            .find_person_tasks(person.id)
            .await
            .unwrap()
            .into_iter()
            .map(|pt| pt.task_id)
            .collect()
    }

    /// Conference with tasks A, B, C and category VIP = {A, B} holding three
    /// persons who each have A and B assigned.
    struct Vip {
        store: MemoryStore,
        conference: Conference,
        a: Task,
        b: Task,
        c: Task,
        category: Category,
        members: Vec<Person>,
    }

    async fn vip() -> Vip {
        let store = MemoryStore::new();
        let conference = store.create_conference("Summit").await;
        let a = store.create_task(CreateTask::new(conference.id, "A")).await;
        let b = store.create_task(CreateTask::new(conference.id, "B")).await;
        let c = store.create_task(CreateTask::new(conference.id, "C")).await;
        let category = store
            .create_category(
                CreateCategory {
                    conference_id: conference.id,
                    name: "VIP".to_string(),
                    description: None,
                },
                [a.id, b.id],
            )
            .await;

        let mut members = Vec::new();
        for code in ["VIP-1", "VIP-2", "VIP-3"] {
            let person = add_person(&store, &conference, &category, code).await;
            store.upsert_person_task(person.id, a.id, false).await.unwrap();
            store.upsert_person_task(person.id, b.id, false).await.unwrap();
            members.push(person);
        }
        // One member already finished A
        store.upsert_person_task(members[0].id, a.id, true).await.unwrap();

        Vip {
            store,
            conference,
            a,
            b,
            c,
            category,
            members,
        }
    }

    #[test]
    fn test_overlapping_change_is_rejected() {
        let t = Uuid::new_v4();
        let err = CategoryTaskChange::new(set(&[t]), set(&[t])).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn test_change_between_identical_sets_is_empty() {
        let ids = set(&[Uuid::new_v4(), Uuid::new_v4()]);
        assert!(CategoryTaskChange::between(&ids, &ids).is_empty());
    }

    #[tokio::test]
    async fn test_vip_edit_propagates_to_all_members() {
        let f = vip().await;
        let a_before = f.store.find_person_tasks(f.members[0].id).await.unwrap();

        let report = save_category_tasks(&f.store, f.category.id, set(&[f.a.id, f.c.id]))
            .await
            .unwrap();

        assert_eq!(report.members, 3);
        assert_eq!(report.granted, 3);
        assert_eq!(report.revoked, 3);
        assert!(report.warnings.is_empty());
        assert_eq!(
            f.store.category_task_ids(f.category.id).await.unwrap(),
            set(&[f.a.id, f.c.id])
        );

        for person in &f.members {
            assert_eq!(task_ids_of(&f.store, person).await, set(&[f.a.id, f.c.id]));
            let rows = f.store.find_person_tasks(person.id).await.unwrap();
            let c_row = rows.iter().find(|pt| pt.task_id == f.c.id).unwrap();
            assert!(!c_row.completed);
        }

        // A untouched, including its completion
        let a_after = f.store.find_person_tasks(f.members[0].id).await.unwrap();
        let before = a_before.iter().find(|pt| pt.task_id == f.a.id).unwrap();
        let after = a_after.iter().find(|pt| pt.task_id == f.a.id).unwrap();
        assert_eq!(before, after);
        assert!(after.completed);
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() {
        let f = vip().await;

        let first = apply_category_task_change(&f.store, f.category.id, set(&[f.c.id]), set(&[f.b.id]))
            .await
            .unwrap();
        let state_once = f.store.all_person_tasks().await;

        let second = apply_category_task_change(&f.store, f.category.id, set(&[f.c.id]), set(&[f.b.id]))
            .await
            .unwrap();
        let state_twice = f.store.all_person_tasks().await;

        assert_eq!((first.granted, first.revoked), (3, 3));
        assert_eq!((second.granted, second.revoked), (0, 0));
        assert_eq!(state_once, state_twice);
    }

    #[tokio::test]
    async fn test_overlap_mutates_nothing() {
        let f = vip().await;
        let before = f.store.all_person_tasks().await;

        let err = apply_category_task_change(&f.store, f.category.id, set(&[f.a.id]), set(&[f.a.id]))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(f.store.all_person_tasks().await, before);
    }

    #[tokio::test]
    async fn test_foreign_task_is_rejected_before_mutation() {
        let f = vip().await;
        let other = f.store.create_conference("Other").await;
        let foreign = f.store.create_task(CreateTask::new(other.id, "Foreign")).await;
        let before = f.store.all_person_tasks().await;

        let err = save_category_tasks(&f.store, f.category.id, set(&[f.a.id, foreign.id]))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(f.store.all_person_tasks().await, before);
        assert_eq!(
            f.store.category_task_ids(f.category.id).await.unwrap(),
            set(&[f.a.id, f.b.id])
        );
    }

    #[tokio::test]
    async fn test_missing_category_is_a_warning() {
        let f = vip().await;
        let before = f.store.all_person_tasks().await;

        let report = apply_category_task_change(&f.store, Uuid::new_v4(), set(&[f.c.id]), BTreeSet::new())
            .await
            .unwrap();

        assert_eq!(report.members, 0);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(f.store.all_person_tasks().await, before);
    }

    #[tokio::test]
    async fn test_missing_task_is_skipped_with_warning() {
        let f = vip().await;
        let gone = Uuid::new_v4();

        let report = apply_category_task_change(&f.store, f.category.id, set(&[f.c.id, gone]), BTreeSet::new())
            .await
            .unwrap();

        assert_eq!(report.granted, 3);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains(&gone.to_string()));
    }

    #[tokio::test]
    async fn test_store_outage_surfaces_and_writes_nothing() {
        let f = vip().await;
        let before = f.store.all_person_tasks().await;

        f.store.set_available(false);
        let err = save_category_tasks(&f.store, f.category.id, set(&[f.c.id]))
            .await
            .unwrap_err();
        f.store.set_available(true);

        assert!(err.is_transient());
        assert_eq!(f.store.all_person_tasks().await, before);
    }

    #[tokio::test]
    async fn test_deleting_task_revokes_every_assignment() {
        let store = MemoryStore::new();
        let conference = store.create_conference("Expo").await;
        let task = store.create_task(CreateTask::new(conference.id, "Lunch")).await;
        let keep = store.create_task(CreateTask::new(conference.id, "Dinner")).await;
        let category = store
            .create_category(
                CreateCategory {
                    conference_id: conference.id,
                    name: "Staff".to_string(),
                    description: None,
                },
                [task.id],
            )
            .await;

        let mut persons = Vec::new();
        for i in 0..5 {
            let person = add_person(&store, &conference, &category, &format!("S-{}", i)).await;
            assign_task(&store, person.id, task.id, false).await.unwrap();
            assign_task(&store, person.id, keep.id, false).await.unwrap();
            persons.push(person);
        }

        let revoked = delete_task(&store, task.id).await.unwrap();
        assert_eq!(revoked, 5);

        for person in &persons {
            assert_eq!(task_ids_of(&store, person).await, set(&[keep.id]));
        }
        assert!(store
            .all_person_tasks()
            .await
            .iter()
            .all(|pt| pt.task_id != task.id));
        assert!(store.category_task_ids(category.id).await.unwrap().is_empty());

        let again = delete_task(&store, task.id).await.unwrap_err();
        assert!(again.is_not_found());
    }

    #[tokio::test]
    async fn test_deleting_category_detaches_members_and_keeps_assignments() {
        let f = vip().await;
        let before = f.store.all_person_tasks().await;

        let detached = delete_category(&f.store, f.category.id).await.unwrap();
        assert_eq!(detached, 3);

        for person in &f.members {
            let person = f.store.find_person(person.id).await.unwrap();
            assert_eq!(person.category_id, None);
        }
        assert_eq!(f.store.all_person_tasks().await, before);
    }

    #[tokio::test]
    async fn test_moving_person_does_not_propagate_tasks() {
        let f = vip().await;
        let other = f
            .store
            .create_category(
                CreateCategory {
                    conference_id: f.conference.id,
                    name: "Press".to_string(),
                    description: None,
                },
                [f.c.id],
            )
            .await;

        let moved = move_person(&f.store, f.members[1].id, Some(other.id)).await.unwrap();
        assert_eq!(moved.category_id, Some(other.id));
        assert_eq!(
            task_ids_of(&f.store, &f.members[1]).await,
            set(&[f.a.id, f.b.id])
        );

        // Later edits of the old category no longer reach the moved person
        let report = apply_category_task_change(&f.store, f.category.id, BTreeSet::new(), set(&[f.b.id]))
            .await
            .unwrap();
        assert_eq!(report.members, 2);
        assert!(task_ids_of(&f.store, &f.members[1]).await.contains(&f.b.id));
    }

    #[tokio::test]
    async fn test_move_person_rejects_foreign_category() {
        let f = vip().await;
        let other = f.store.create_conference("Other").await;
        let foreign = f
            .store
            .create_category(
                CreateCategory {
                    conference_id: other.id,
                    name: "VIP".to_string(),
                    description: None,
                },
                Vec::new(),
            )
            .await;

        let err = move_person(&f.store, f.members[0].id, Some(foreign.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let person = f.store.find_person(f.members[0].id).await.unwrap();
        assert_eq!(person.category_id, Some(f.category.id));

        let detached = move_person(&f.store, f.members[0].id, None).await.unwrap();
        assert_eq!(detached.category_id, None);
    }

    #[tokio::test]
    async fn test_assign_task_rejects_foreign_conference() {
        let f = vip().await;
        let other = f.store.create_conference("Other").await;
        let foreign = f.store.create_task(CreateTask::new(other.id, "Foreign")).await;

        let err = assign_task(&f.store, f.members[0].id, foreign.id, false)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let missing = assign_task(&f.store, f.members[0].id, Uuid::new_v4(), false)
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_assign_then_revoke() {
        let f = vip().await;
        let person = &f.members[2];

        let row = assign_task(&f.store, person.id, f.c.id, true).await.unwrap();
        assert!(row.completed);
        assert!(row.completed_at.is_some());

        assert!(revoke_task(&f.store, person.id, f.c.id).await.unwrap());
        assert!(!revoke_task(&f.store, person.id, f.c.id).await.unwrap());
        assert!(revoke_task(&f.store, Uuid::new_v4(), f.c.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_bulk_assign_and_unassign() {
        let f = vip().await;
        let ids: BTreeSet<Uuid> = f.members.iter().map(|p| p.id).chain([Uuid::new_v4()]).collect();

        let report = bulk_assign_task(&f.store, f.c.id, ids.clone()).await.unwrap();
        assert_eq!(report.persons, 3);
        assert_eq!(report.granted, 3);
        assert_eq!(report.warnings.len(), 1);

        let again = bulk_assign_task(&f.store, f.c.id, ids).await.unwrap();
        assert_eq!(again.granted, 0);

        let stats = f.store.task_completion_stats(f.c.id).await.unwrap();
        assert_eq!(stats.total_assignments, 3);
        assert_eq!(stats.pending, 3);

        let two = set(&[f.members[0].id, f.members[1].id]);
        let report = bulk_unassign_task(&f.store, f.a.id, two).await.unwrap();
        assert_eq!(report.revoked, 2);
        assert!(report.warnings.is_empty());
        assert_eq!(task_ids_of(&f.store, &f.members[0]).await, set(&[f.b.id, f.c.id]));
        assert_eq!(task_ids_of(&f.store, &f.members[2]).await, set(&[f.a.id, f.b.id, f.c.id]));
    }

    #[tokio::test]
    async fn test_bulk_assign_rejects_foreign_person() {
        let f = vip().await;
        let other = f.store.create_conference("Other").await;
        let stranger = f
            .store
            .create_person(CreatePerson {
                conference_id: other.id,
                category_id: None,
                unique_code: "OTH-0001".to_string(),
                first_name: "Neda".to_string(),
                last_name: "Karimi".to_string(),
                email: None,
                telephone: "+989122222222".to_string(),
            })
            .await;
        let before = f.store.all_person_tasks().await;

        let err = bulk_assign_task(&f.store, f.c.id, set(&[f.members[0].id, stranger.id]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(f.store.all_person_tasks().await, before);

        let missing = bulk_unassign_task(&f.store, Uuid::new_v4(), set(&[f.members[0].id]))
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }
}
