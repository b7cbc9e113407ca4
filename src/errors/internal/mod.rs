use thiserror::Error;

pub mod database;
pub mod role;
pub mod user;

pub use database::DatabaseError;
pub use role::RoleError;
pub use user::UserError;

/// Internal error type for store and provider operations
///
/// Infrastructure errors (database, parse, crypto) are shared by all stores;
/// domain errors are grouped per store. Services convert these into
/// `AdminError` before anything reaches a caller.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Parse error: failed to parse {value_type}: {message}")]
    Parse {
        value_type: String,
        message: String,
    },

    #[error("Crypto error: {operation} failed: {message}")]
    Crypto {
        operation: String,
        message: String,
    },

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Role(#[from] RoleError),
}

impl InternalError {
    pub fn database(operation: &str, source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::Operation {
            operation: operation.to_string(),
            source,
        })
    }

    pub fn timeout(operation: &str, timeout_ms: u64) -> InternalError {
        InternalError::Database(DatabaseError::Timeout {
            operation: operation.to_string(),
            timeout_ms,
        })
    }

    pub fn parse(value_type: impl Into<String>, message: impl Into<String>) -> InternalError {
        InternalError::Parse {
            value_type: value_type.into(),
            message: message.into(),
        }
    }

    pub fn crypto(operation: impl Into<String>, message: impl Into<String>) -> InternalError {
        InternalError::Crypto {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
