use thiserror::Error;
use serde::Serialize;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    /// Missing API key, endpoint or model. The batch never starts.
    #[error("Configuration Error: {0}")]
    Configuration(String),

    /// No eligible node selected
    #[error("Selection Error: {0}")]
    Selection(String),

    /// Non-2xx response or malformed response body from the translation API
    #[error("Translation API Error: {0}")]
    TranslationApi(String),

    /// Could not reach the translation API at all
    #[error("Network Error: {0}")]
    Network(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    /// Node lacks the clone/geometry capability an operation needs
    #[error("Unsupported Node: {0}")]
    UnsupportedNode(String),

    /// A node could not be rewritten while replaying a stored batch
    #[error("Node Update Error: {0}")]
    NodeUpdate(String),

    #[error("Storage Error: {0}")]
    Storage(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    /// Failure reported by the host scene graph
    #[error("Host Error: {0}")]
    Host(String),
}

impl AppError {
    /// Message without the category prefix, for notifications
    pub fn message(&self) -> &str {
        match self {
            AppError::Configuration(msg)
            | AppError::Selection(msg)
            | AppError::TranslationApi(msg)
            | AppError::Network(msg)
            | AppError::NotFound(msg)
            | AppError::UnsupportedNode(msg)
            | AppError::NodeUpdate(msg)
            | AppError::Storage(msg)
            | AppError::Validation(msg)
            | AppError::Host(msg) => msg,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            AppError::Network(err.to_string())
        } else {
            AppError::TranslationApi(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("Serialization error: {}", err))
    }
}

impl From<redb::Error> for AppError {
    fn from(err: redb::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

macro_rules! storage_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AppError {
                fn from(err: $ty) -> Self {
                    AppError::Storage(err.to_string())
                }
            }
        )*
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

pub type AppResult<T> = Result<T, AppError>;
