/// Domain error type shared by the store, the filter engine and the
/// assignment rule
///
/// # Error Kinds
///
/// - `StoreUnavailable`: transient, the caller retries on the next interaction
///   and must surface it to the administrator
/// - `NotFound`, `PersonCodeNotFound`: a referenced entity no longer exists
/// - `InvariantViolation`: the request would break a conference-scoping rule;
///   raised before any mutation reaches the store
///
/// # Example
///
/// ```
/// use hamayesh_shared::error::DomainError;
/// use uuid::Uuid;
///
/// let err = DomainError::not_found("category", Uuid::nil());
/// assert!(err.is_not_found());
/// ```

use uuid::Uuid;

/// Result alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Errors produced by the store and the core operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// The entity store could not be reached or failed mid-operation
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A referenced entity no longer exists
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. "task"
        entity: &'static str,

        /// Identifier that was looked up
        id: Uuid,
    },

    /// No person carries this badge code digest
    #[error("no person with code digest {0}")]
    PersonCodeNotFound(String),

    /// The requested change would break a consistency rule
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    /// Shorthand for a `NotFound` error
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        DomainError::NotFound { entity, id }
    }

    /// Whether this is a `NotFound` error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::NotFound { .. } | DomainError::PersonCodeNotFound(_)
        )
    }

    /// Whether the caller may retry the operation later
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::StoreUnavailable(_))
    }
}

/// Store-level failures are transient from the caller's point of view.
///
/// `RowNotFound` carries no entity information, so lookups that can miss use
/// `fetch_optional` and build `NotFound` themselves.
impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::StoreUnavailable(format!("Database error: {}", err))
    }
}
