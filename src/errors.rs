//! Typed error hierarchy for the Estate CRM.
//!
//! `CrmError` is what the storage layer returns; the HTTP layer maps each
//! variant onto a status code in `crm::api::ApiError`.

use estate_common::{InteractionStatus, ParseEnumError, TransitionError};
use thiserror::Error;

/// Errors from the CRM storage and domain layer.
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Cannot {action} an interaction that is {from}")]
    InvalidTransition {
        action: &'static str,
        from: InteractionStatus,
        to: InteractionStatus,
    },

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),
}

pub type CrmResult<T> = std::result::Result<T, CrmError>;

impl CrmError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<TransitionError> for CrmError {
    fn from(e: TransitionError) -> Self {
        Self::InvalidTransition {
            action: e.action,
            from: e.from,
            to: e.to,
        }
    }
}

impl From<ParseEnumError> for CrmError {
    fn from(e: ParseEnumError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<rusqlite::Error> for CrmError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref err, ref msg) = e {
            if err.code == rusqlite::ErrorCode::ConstraintViolation {
                let detail = msg.clone().unwrap_or_else(|| err.to_string());
                if detail.contains("UNIQUE") {
                    return Self::Conflict(unique_conflict_message(&detail));
                }
                if detail.contains("FOREIGN KEY") {
                    return Self::Conflict(
                        "Record is still referenced by other records".to_string(),
                    );
                }
            }
        }
        Self::Database(anyhow::Error::new(e))
    }
}

impl From<anyhow::Error> for CrmError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<rusqlite::Error>() {
            Ok(sql) => sql.into(),
            Err(other) => Self::Database(other),
        }
    }
}

/// Turn "UNIQUE constraint failed: customers.email" into a readable message.
fn unique_conflict_message(detail: &str) -> String {
    match detail.rsplit(": ").next().and_then(|col| col.split_once('.')) {
        Some((table, column)) => format!("A record in {} with this {} already exists", table, column),
        None => "Record already exists".to_string(),
    }
}
