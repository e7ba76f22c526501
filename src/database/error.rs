use std::fmt::{self, Display};

use serde::Serialize;
use thiserror::Error;

/// One violated rule of a write payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Client-correctable payload failure. Carries every violated field, not just
/// the first one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.errors.iter().map(|e| e.field).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

#[derive(Clone, Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(ValidationError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    SelfReference(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Invalid session; {0}")]
    InvalidSession(String),
    #[error("Storage failure; {0}")]
    Storage(String),
}

impl Error {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} does not exist"))
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::AlreadyExists(_) | Error::SelfReference(_) => 400,
            Error::Unauthorized(_) | Error::InvalidSession(_) => 401,
            Error::NotFound(_) => 404,
            Error::Storage(_) => 500,
        }
    }
}

// warp's blanket `impl<T: Reject> From<T> for Rejection` covers the
// Error -> Rejection conversion.
impl warp::reject::Reject for Error {}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        Error::Validation(value)
    }
}

pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(String::from("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::AnyDriverError(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(String::from("Unknown error")),
        }
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        log::warn!("storage error: {}", value.info);
        Error::Storage(value.info)
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl From<TypeError> for Error {
    fn from(value: TypeError) -> Self {
        Error::Validation(ValidationError::new(vec![FieldError::new(
            "payload",
            value.info,
        )]))
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        let validation = Error::Validation(ValidationError::new(vec![FieldError::new(
            "name",
            "Name must not be empty",
        )]));
        assert_eq!(validation.status_code(), 400);
        assert_eq!(Error::not_found("Recipe").status_code(), 404);
        assert_eq!(
            Error::AlreadyExists(String::from("duplicate")).status_code(),
            400
        );
        assert_eq!(
            Error::SelfReference(String::from("self")).status_code(),
            400
        );
        assert_eq!(
            Error::InvalidSession(String::from("expired")).status_code(),
            401
        );
        assert_eq!(Error::Storage(String::from("down")).status_code(), 500);
    }

    #[test]
    fn sqlx_failures_map_to_storage_errors() {
        // The action modules convert with Error::from(QueryError::from(e)).
        let error = Error::from(QueryError::from(sqlx::Error::PoolClosed));
        assert!(matches!(error, Error::Storage(_)));
        assert_eq!(error.status_code(), 500);
    }

    #[test]
    fn rejections_carry_the_domain_error() {
        let rejection = warp::reject::Rejection::from(Error::not_found("Recipe"));
        let found = rejection.find::<Error>().expect("rejection holds the error");
        assert_eq!(found.status_code(), 404);
    }

    #[test]
    fn validation_error_tracks_fields() {
        let error = ValidationError::new(vec![
            FieldError::new("tags", "Tags must not repeat"),
            FieldError::new("cooking_time", "Out of bounds"),
        ]);
        assert!(error.has_field("tags"));
        assert!(error.has_field("cooking_time"));
        assert!(!error.has_field("name"));
    }
}
