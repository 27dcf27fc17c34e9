use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(#[from] monitor_db::DbError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// JSON body returned for failed requests.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let (status, code) = match err {
            AppError::Validation(_) => (400, Some("validation_error".to_string())),
            AppError::Store(_) => (500, Some("store_error".to_string())),
            AppError::Io(_) | AppError::InvalidConfig(_) => (500, None),
        };
        Self {
            status,
            detail: err.to_string(),
            code,
        }
    }
}
