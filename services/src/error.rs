use db::quiz::QuizError;
use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;
use validator::ValidationErrors;

use crate::grader::GradeError;
use crate::reorder::OrderSnapshot;

pub type EngineResult<T> = Result<T, EngineError>;

/// Every way an engine operation can fail.
///
/// The HTTP layer maps each variant to one status code; nothing in the engine
/// depends on HTTP.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before any write.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Not enrolled, lesson locked, or not allowed to manage the course.
    #[error("{0}")]
    Forbidden(String),

    /// A concurrent writer won, or the caller's view of a sibling set is stale.
    #[error("{message}")]
    Conflict {
        message: String,
        current: OrderSnapshot,
    },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Stored content could not be decoded: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A reorder write failed. The transaction was rolled back and `current`
    /// is the ordering that is actually stored.
    #[error("Reorder failed and was rolled back: {source}")]
    Reconciled {
        #[source]
        source: Box<EngineError>,
        current: OrderSnapshot,
    },
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        EngineError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        EngineError::Forbidden(message.into())
    }

    /// The authoritative ordering attached to a reorder failure, if any.
    pub fn current_order(&self) -> Option<&OrderSnapshot> {
        match self {
            EngineError::Conflict { current, .. } | EngineError::Reconciled { current, .. } => {
                Some(current)
            }
            _ => None,
        }
    }
}

/// SQLite primary result codes for a writer blocked by another connection.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// True when the database refused a statement because another connection
/// holds the write lock. For a reorder that means a concurrent writer won.
pub(crate) fn is_lock_contention(err: &DbErr) -> bool {
    let sqlx_err = match err {
        DbErr::Conn(RuntimeErr::SqlxError(e))
        | DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e)) => e,
        _ => return false,
    };
    let sea_orm::sqlx::Error::Database(db_err) = sqlx_err else {
        return false;
    };
    // Extended codes keep the primary code in the low byte.
    db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

/// Joins field messages into one line, in field-name order.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ValidationErrors> for EngineError {
    fn from(errors: ValidationErrors) -> Self {
        EngineError::Validation(format_validation_errors(&errors))
    }
}

impl From<QuizError> for EngineError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::Malformed(inner) => EngineError::Serialization(inner),
            other => EngineError::Validation(other.to_string()),
        }
    }
}

impl From<GradeError> for EngineError {
    fn from(err: GradeError) -> Self {
        EngineError::Validation(err.to_string())
    }
}
