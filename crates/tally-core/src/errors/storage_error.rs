use thiserror::Error;

/// Errors originating in the persistence layer.
///
/// Carried as strings so this crate stays free of any database dependency;
/// tally-storage converts its driver errors into these variants.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {message}")]
    Sqlite { message: String },

    #[error("connection pool error: {message}")]
    Pool { message: String },

    #[error("migration failed: {message}")]
    Migration { message: String },
}

impl StorageError {
    pub fn sqlite(message: impl Into<String>) -> Self {
        Self::Sqlite {
            message: message.into(),
        }
    }

    pub fn pool(message: impl Into<String>) -> Self {
        Self::Pool {
            message: message.into(),
        }
    }
}
