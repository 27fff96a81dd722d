use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// An external identifier supplied by the caller does not resolve to a row
    #[error("{entity} with ID {id} does not exist")]
    UnresolvedReference { entity: &'static str, id: String },

    /// A partial update carried no effective fields
    #[error("No fields provided for update")]
    NoFieldsToUpdate,

    /// Could not obtain a connection or open a transaction
    #[error("Store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// An INSERT failed for a reason other than a constraint violation
    #[error("Failed to insert into {table}: {source}")]
    InsertFailed {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Deriving the stored secret failed before the credential row was written
    #[error("Credential preparation failed: {message}")]
    CredentialPreparation { message: String },

    /// COMMIT itself failed; the outcome of the transaction is indeterminate
    #[error("Transaction commit failed: {0}")]
    CommitFailed(#[source] sqlx::Error),

    /// The transaction did not finish before its deadline and was rolled back
    #[error("Transaction exceeded its deadline of {timeout:?}")]
    TimedOut { timeout: std::time::Duration },

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// The store rejected a value, e.g. one too long for its column (SQLSTATE class 22)
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    /// Categorise a failed INSERT: constraint violations keep their own variants so callers
    /// can report them as client faults, anything else is wrapped with the target table.
    pub fn insert_failed(table: &'static str, err: sqlx::Error) -> Self {
        match DbError::from(err) {
            DbError::Other(e) => match e.downcast::<sqlx::Error>() {
                Ok(source) => DbError::InsertFailed { table, source },
                Err(e) => DbError::Other(e),
            },
            categorised => categorised,
        }
    }

    /// Whether this error was produced by bad caller input rather than a store fault
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            DbError::UnresolvedReference { .. }
                | DbError::NoFieldsToUpdate
                | DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::CheckViolation { .. }
                | DbError::InvalidData { .. }
        )
    }
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => DbError::Unavailable(err),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.code().is_some_and(|code| code.starts_with("22")) {
                    DbError::InvalidData {
                        message: db_err.message().to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
