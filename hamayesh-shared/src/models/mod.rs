/// Database models for Hamayesh
///
/// This module contains the entity rows and their sqlx operations.
///
/// # Models
///
/// - `conference`: Top-level event scope
/// - `task`: Units of work scoped to one conference
/// - `category`: Person groupings carrying a default task set
/// - `person`: Registered attendees
/// - `person_task`: Task assignments with completion status
///
/// # Example
///
/// ```no_run
/// use hamayesh_shared::models::person::Person;
/// use hamayesh_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let members = Person::list_by_category(&pool, Uuid::new_v4()).await?;
/// # Ok(())
/// # }
/// ```

pub mod category;
pub mod conference;
pub mod person;
pub mod person_task;
pub mod task;
