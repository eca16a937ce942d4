use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::time::Duration;

use crate::api::routes::Endpoints;
use crate::api::types::{BackResponse, ChatRequest, ChatResponse, ResetResponse, StateResponse};
use crate::error::{ApiError, Result};

/// The remote conversation/session API.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// Full transcript of the current session.
    async fn state(&self) -> Result<StateResponse>;

    /// Submit one user answer and receive the next turn.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Step back one turn. `success: false` is reported as [`ApiError::Rejected`].
    async fn back(&self) -> Result<()>;

    /// Discard the session and start over.
    async fn reset(&self) -> Result<()>;
}

/// Build the shared HTTP client. The server keeps the dialog in a cookie
/// session, so the cookie store must be on.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .cookie_store(true)
        .build()
}

/// HTTP implementation of [`ConversationApi`].
#[derive(Clone)]
pub struct HttpConversationClient {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpConversationClient {
    pub fn new(client: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

#[async_trait]
impl ConversationApi for HttpConversationClient {
    async fn state(&self) -> Result<StateResponse> {
        let response = self.client.get(self.endpoints.state()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_state(status, &body)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(self.endpoints.chat())
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        decode_chat(status, &body)
    }

    async fn back(&self) -> Result<()> {
        let response = self.client.post(self.endpoints.back()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_back(status, &body)
    }

    async fn reset(&self) -> Result<()> {
        let response = self.client.post(self.endpoints.reset()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_reset(status, &body)
    }
}

pub(crate) fn decode_state(status: StatusCode, body: &str) -> Result<StateResponse> {
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }
    Ok(serde_json::from_str(body)?)
}

pub(crate) fn decode_chat(status: StatusCode, body: &str) -> Result<ChatResponse> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimited);
    }
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }

    let response: ChatResponse = serde_json::from_str(body)?;
    if let Some(error) = response.error.as_deref().filter(|e| !e.is_empty()) {
        return Err(ApiError::Server(error.to_string()));
    }
    Ok(response)
}

pub(crate) fn decode_back(status: StatusCode, body: &str) -> Result<()> {
    match serde_json::from_str::<BackResponse>(body) {
        Ok(response) if response.success => Ok(()),
        Ok(response) => Err(ApiError::Rejected(
            response
                .error
                .unwrap_or_else(|| "Невозможно вернуться назад".to_string()),
        )),
        Err(_) if !status.is_success() => Err(ApiError::Status(status.as_u16())),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn decode_reset(status: StatusCode, body: &str) -> Result<()> {
    match serde_json::from_str::<ResetResponse>(body) {
        Ok(response) if response.success => Ok(()),
        Ok(response) => Err(ApiError::Rejected(
            response
                .error
                .unwrap_or_else(|| "Не удалось начать заново".to_string()),
        )),
        Err(_) if !status.is_success() => Err(ApiError::Status(status.as_u16())),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::InputType;

    #[test]
    fn test_chat_rate_limit_is_distinguished() {
        let err = decode_chat(StatusCode::TOO_MANY_REQUESTS, r#"{"error":"limit"}"#).unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
    }

    #[test]
    fn test_chat_non_success_status() {
        let err = decode_chat(StatusCode::BAD_REQUEST, r#"{"error":"Пустое сообщение"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Status(400)));
    }

    #[test]
    fn test_chat_error_field_in_success_body() {
        let err = decode_chat(StatusCode::OK, r#"{"message":"","error":"Сессия не найдена"}"#)
            .unwrap_err();
        match err {
            ApiError::Server(message) => assert_eq!(message, "Сессия не найдена"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_chat_success() {
        let response = decode_chat(
            StatusCode::OK,
            r#"{"message":"Опишите проблему","input_type":"textarea","current_text":null}"#,
        )
        .unwrap();
        assert_eq!(response.message, "Опишите проблему");
        assert_eq!(response.input_type, Some(InputType::Textarea));
    }

    #[test]
    fn test_chat_garbage_body() {
        let err = decode_chat(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_back_rejection_keeps_server_message() {
        let err = decode_back(StatusCode::OK, r#"{"success":false,"error":"Невозможно вернуться назад"}"#)
            .unwrap_err();
        match err {
            ApiError::Rejected(message) => assert_eq!(message, "Невозможно вернуться назад"),
            other => panic!("unexpected error: {:?}", other),
        }

        let err = decode_back(StatusCode::BAD_REQUEST, r#"{"error":"Сессия не найдена"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Сессия не найдена"));

        assert!(decode_back(StatusCode::OK, r#"{"success":true,"history":[]}"#).is_ok());
    }

    #[test]
    fn test_reset_status_without_body() {
        let err = decode_reset(StatusCode::INTERNAL_SERVER_ERROR, "").unwrap_err();
        assert!(matches!(err, ApiError::Status(500)));
        assert!(decode_reset(StatusCode::OK, r#"{"success":true}"#).is_ok());
    }
}
