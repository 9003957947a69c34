//! Repository error types
//!
//! A [`RepositoryError`] always means the store failed to run a query. An
//! entity that simply does not exist is reported as `Ok(None)` instead, so the
//! two outcomes stay distinguishable.
//!
//! # Example
//!
//! ```rust
//! use spec_repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
//!
//! let error = RepositoryError::connection_failed("connection refused")
//!     .with_operation(RepositoryOperation::List)
//!     .with_entity_type("Product");
//!
//! assert_eq!(error.kind, RepositoryErrorKind::ConnectionFailed);
//! assert!(error.is_retriable());
//! ```

use std::fmt;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Fetching a single entity by identity
    GetById,
    /// Listing every entity
    ListAll,
    /// Fetching the first entity matching a specification
    GetEntityWithSpec,
    /// Listing entities matching a specification
    List,
    /// Counting entities matching a specification
    Count,
    /// Eager-loading a relation onto fetched entities
    LoadRelation,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetById => write!(f, "get_by_id"),
            Self::ListAll => write!(f, "list_all"),
            Self::GetEntityWithSpec => write!(f, "get_entity_with_spec"),
            Self::List => write!(f, "list"),
            Self::Count => write!(f, "count"),
            Self::LoadRelation => write!(f, "load_relation"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Failed to reach the store
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// No connection available in the pool
    PoolExhausted,
    /// Criteria or ordering referenced something the store cannot evaluate
    MalformedCriteria,
    /// A requested relation could not be loaded
    RelationLoad,
    /// Underlying database error
    DatabaseError,
    /// Row could not be decoded into the entity
    SerializationError,
    /// Other unclassified error
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::PoolExhausted => write!(f, "pool_exhausted"),
            Self::MalformedCriteria => write!(f, "malformed_criteria"),
            Self::RelationLoad => write!(f, "relation_load"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured data-access failure with operation context
///
/// Stores build these without knowing which repository call they serve; the
/// repository fills in [`operation`](Self::operation) and
/// [`entity_type`](Self::entity_type) on the way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The type of entity involved (e.g., "Product")
    pub entity_type: Option<String>,
    /// The identity of the entity involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::List,
            RepositoryErrorKind::ConnectionFailed,
            message,
        )
    }

    /// Create a timeout error
    pub fn timeout(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Timeout, message)
    }

    /// Create a pool exhausted error
    pub fn pool_exhausted(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::List,
            RepositoryErrorKind::PoolExhausted,
            message,
        )
    }

    /// Create a malformed criteria error
    ///
    /// # Example
    ///
    /// ```rust
    /// use spec_repository::{RepositoryError, RepositoryErrorKind};
    ///
    /// let error = RepositoryError::malformed_criteria("unknown field 'colour'");
    /// assert_eq!(error.kind, RepositoryErrorKind::MalformedCriteria);
    /// assert!(!error.is_retriable());
    /// ```
    pub fn malformed_criteria(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::List,
            RepositoryErrorKind::MalformedCriteria,
            message,
        )
    }

    /// Create an error for a relation the store cannot load
    pub fn relation_load(entity_type: impl Into<String>, relation: &str) -> Self {
        Self {
            operation: RepositoryOperation::LoadRelation,
            kind: RepositoryErrorKind::RelationLoad,
            message: format!("Unknown relation '{}'", relation),
            entity_type: Some(entity_type.into()),
            entity_id: None,
        }
    }

    /// Create a database error
    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    /// Create a serialization error
    pub fn serialization_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::SerializationError, message)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the entity type, keeping any existing one
    #[must_use]
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        if self.entity_type.is_none() {
            self.entity_type = Some(entity_type.into());
        }
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is transient
    ///
    /// The repository never retries; this is a hint for callers with a retry
    /// policy of their own.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed
                | RepositoryErrorKind::Timeout
                | RepositoryErrorKind::PoolExhausted
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        match (&self.entity_type, &self.entity_id) {
            (Some(entity_type), Some(entity_id)) => write!(f, " [{}: {}]", entity_type, entity_id),
            (Some(entity_type), None) => write!(f, " [{}]", entity_type),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for RepositoryError {}

#[cfg(feature = "database")]
impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error as E;
        let op = RepositoryOperation::List;
        match err {
            // A fetch_one that found nothing is still a failed query here;
            // absence is modelled with fetch_optional and Ok(None).
            E::RowNotFound => Self::database_error(op, "Query returned no rows"),
            E::PoolTimedOut => Self::pool_exhausted("Connection pool timed out"),
            E::PoolClosed => Self::connection_failed("Connection pool is closed"),
            E::Io(e) => Self::connection_failed(e.to_string()),
            E::Tls(e) => Self::connection_failed(format!("TLS error: {}", e)),
            E::Protocol(msg) => Self::database_error(op, msg),
            E::Configuration(e) => Self::new(op, RepositoryErrorKind::Other, e.to_string()),
            E::ColumnNotFound(col) => {
                Self::malformed_criteria(format!("Column not found: {}", col))
            }
            E::ColumnIndexOutOfBounds { index, len } => Self::serialization_error(
                op,
                format!("Column index {} out of bounds (len: {})", index, len),
            ),
            E::ColumnDecode { index, source } => Self::serialization_error(
                op,
                format!("Failed to decode column {}: {}", index, source),
            ),
            E::TypeNotFound { type_name } => {
                Self::serialization_error(op, format!("Type not found: {}", type_name))
            }
            E::Decode(e) => Self::serialization_error(op, e.to_string()),
            E::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned());
                match code.as_deref() {
                    // undefined_column / undefined_table / syntax_error
                    Some("42703") | Some("42P01") | Some("42601") => {
                        Self::malformed_criteria(db_err.message().to_string())
                    }
                    // query_canceled (statement_timeout)
                    Some("57014") => Self::timeout(op, db_err.message().to_string()),
                    _ => Self::database_error(op, db_err.message().to_string()),
                }
            }
            other => Self::database_error(op, other.to_string()),
        }
    }
}
