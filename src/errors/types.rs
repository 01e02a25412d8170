//! Error type definitions for the RTMP filter
//!
//! Stream URL problems never abort a page render: a rejected alternative is
//! logged and dropped. The remaining types cover storage, configuration and
//! the HTTP surface.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Markup rendering errors
    #[error("Render error: {0}")]
    Render(#[from] askama::Error),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database connection failures
    #[error("Database connection failed: {message}")]
    ConnectionFailed { message: String },

    /// SQL query execution failures
    #[error("Query failed: {query} - {message}")]
    QueryFailed { query: String, message: String },

    /// Record not found
    #[error("Record not found: {table} with {field} = {value}")]
    RecordNotFound {
        table: String,
        field: String,
        value: String,
    },

    /// Migration failures
    #[error("Migration failed: {version} - {message}")]
    MigrationFailed { version: String, message: String },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`crate::config::Config`]
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Defaults could not be serialized back to disk
    #[error("Could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A marker or asset pattern failed to compile
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Reasons a single stream alternative is rejected
///
/// These are reported through `tracing` and the offending alternative is
/// dropped; siblings in the same href are unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamUrlError {
    /// Alternative does not use the rtmp scheme
    #[error("not an rtmp URL: {url}")]
    UnsupportedScheme { url: String },

    /// Generic URL validation failed after the scheme substitution
    #[error("malformed URL {url}: {reason}")]
    Malformed { url: String, reason: String },

    /// Nothing is left to request once the connection segments are consumed
    #[error("no stream path in {url}")]
    MissingStreamPath { url: String },
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error for a specific resource
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl RepositoryError {
    /// Create a query failed error
    pub fn query_failed<Q: Into<String>, M: Into<String>>(query: Q, message: M) -> Self {
        Self::QueryFailed {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Create a record not found error
    pub fn record_not_found<T: Into<String>, F: Into<String>, V: Into<String>>(
        table: T,
        field: F,
        value: V,
    ) -> Self {
        Self::RecordNotFound {
            table: table.into(),
            field: field.into(),
            value: value.into(),
        }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::ConnectionFailed {
                    message: err.to_string(),
                }
            }
            other => Self::QueryFailed {
                query: "unknown".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_url_error_messages() {
        let err = StreamUrlError::MissingStreamPath {
            url: "rtmp://host/app".to_string(),
        };
        assert_eq!(err.to_string(), "no stream path in rtmp://host/app");

        let err = StreamUrlError::UnsupportedScheme {
            url: "http://host/a.mp4".to_string(),
        };
        assert!(err.to_string().contains("not an rtmp URL"));
    }

    #[test]
    fn test_repository_error_from_sqlx() {
        let err: RepositoryError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, RepositoryError::ConnectionFailed { .. }));

        let err: RepositoryError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, RepositoryError::QueryFailed { .. }));
    }

    #[test]
    fn test_app_error_helpers() {
        let err = AppError::not_found("playlist", "7:Lectures");
        assert_eq!(err.to_string(), "Not found: playlist with id 7:Lectures");

        let err = AppError::validation("empty href");
        assert_eq!(err.to_string(), "Validation error: empty href");
    }
}
