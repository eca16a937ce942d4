//! Error types for the conversation and suggestion endpoints.

use thiserror::Error;

/// Errors returned by the remote conversation API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network failure or unreadable body.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// HTTP 429 from the server.
    #[error("rate limited")]
    RateLimited,

    /// Any other non-2xx status.
    #[error("server responded with status {0}")]
    Status(u16),

    /// `error` field present in a 2xx body.
    #[error("server error: {0}")]
    Server(String),

    /// Body was not the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Back/restart answered with `success: false`.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Text shown to the user in a notice.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::RateLimited => "Слишком много запросов. Подождите немного.".to_string(),
            ApiError::Status(_) => "Ошибка сервера".to_string(),
            ApiError::Server(message) | ApiError::Rejected(message) => message.clone(),
            ApiError::Transport(_) | ApiError::Decode(_) => {
                "Ошибка соединения. Попробуйте ещё раз.".to_string()
            }
        }
    }
}
