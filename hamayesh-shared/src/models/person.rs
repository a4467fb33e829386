/// Person (attendee) model and database operations
///
/// A person is registered within one conference and may belong to one of
/// its categories. The attendee code is globally unique; its SHA-256 digest
/// is stored alongside for badge/QR lookups so the raw code never has to be
/// printed.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE persons (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     conference_id UUID NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
///     category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
///     unique_code VARCHAR(255) NOT NULL UNIQUE,
///     hashed_unique_code TEXT NOT NULL,
///     first_name VARCHAR(64) NOT NULL,
///     last_name VARCHAR(64) NOT NULL,
///     email VARCHAR(255),
///     telephone VARCHAR(24) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

const PERSON_COLUMNS: &str = "id, conference_id, category_id, unique_code, hashed_unique_code, \
     first_name, last_name, email, telephone, is_active, created_at, updated_at";

/// Person model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Person {
    /// Unique person ID
    pub id: Uuid,

    /// Conference the person is registered in
    pub conference_id: Uuid,

    /// Optional category within the same conference
    pub category_id: Option<Uuid>,

    /// Attendee code (globally unique)
    pub unique_code: String,

    /// Hex SHA-256 of `unique_code`
    pub hashed_unique_code: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Optional email
    pub email: Option<String>,

    /// Telephone number
    pub telephone: String,

    /// Inactive persons are kept for history
    pub is_active: bool,

    /// When the person was registered
    pub created_at: DateTime<Utc>,

    /// When the person was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a person
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePerson {
    /// Conference
    pub conference_id: Uuid,

    /// Optional category (must belong to the same conference)
    pub category_id: Option<Uuid>,

    /// Attendee code
    pub unique_code: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Optional email
    pub email: Option<String>,

    /// Telephone number
    pub telephone: String,
}

/// Hashes an attendee code (hex-encoded SHA-256)
///
/// # Example
///
/// ```
/// use hamayesh_shared::models::person::hash_unique_code;
///
/// let hash = hash_unique_code("ATT-0001");
/// assert_eq!(hash.len(), 64);
/// ```
pub fn hash_unique_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

impl Person {
    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Registers a new person
    ///
    /// # Errors
    ///
    /// Returns an error if the code is already taken (`persons_unique_code_key`)
    /// or the database is unreachable
    pub async fn create(pool: &PgPool, data: CreatePerson) -> Result<Self, sqlx::Error> {
        let hashed = hash_unique_code(&data.unique_code);

        let person = sqlx::query_as::<_, Person>(&format!(
            r#"
            INSERT INTO persons (conference_id, category_id, unique_code, hashed_unique_code,
                                 first_name, last_name, email, telephone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PERSON_COLUMNS
        ))
        .bind(data.conference_id)
        .bind(data.category_id)
        .bind(data.unique_code)
        .bind(hashed)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.telephone)
        .fetch_one(pool)
        .await?;

        Ok(person)
    }

    /// Finds a person by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let person = sqlx::query_as::<_, Person>(&format!(
            "SELECT {} FROM persons WHERE id = $1",
            PERSON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(person)
    }

    /// Finds a person by the digest printed on their badge
    pub async fn find_by_hashed_code(pool: &PgPool, hashed_code: &str) -> Result<Option<Self>, sqlx::Error> {
        let person = sqlx::query_as::<_, Person>(&format!(
            "SELECT {} FROM persons WHERE hashed_unique_code = $1",
            PERSON_COLUMNS
        ))
        .bind(hashed_code)
        .fetch_optional(pool)
        .await?;

        Ok(person)
    }

    /// Loads the persons among `ids` that exist, oldest registration first
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        let persons = sqlx::query_as::<_, Person>(&format!(
            "SELECT {} FROM persons WHERE id = ANY($1) ORDER BY created_at ASC, id ASC",
            PERSON_COLUMNS
        ))
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(persons)
    }

    /// Lists the members of a category, oldest registration first
    pub async fn list_by_category(pool: &PgPool, category_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let persons = sqlx::query_as::<_, Person>(&format!(
            "SELECT {} FROM persons WHERE category_id = $1 ORDER BY created_at ASC, id ASC",
            PERSON_COLUMNS
        ))
        .bind(category_id)
        .fetch_all(pool)
        .await?;

        Ok(persons)
    }

    /// Moves a person to another category (or none)
    ///
    /// Task assignments are left as they are.
    pub async fn set_category(
        pool: &PgPool,
        id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let person = sqlx::query_as::<_, Person>(&format!(
            r#"
            UPDATE persons
            SET category_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PERSON_COLUMNS
        ))
        .bind(id)
        .bind(category_id)
        .fetch_optional(pool)
        .await?;

        Ok(person)
    }
}
