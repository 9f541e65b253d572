use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};

use crate::error::RequestError;
use crate::models::{ChatRequest, ChatResponse, SearchRequest, SearchResult, WelcomeResponse};

/// The remote question-answering service
#[async_trait]
pub trait PharmaBackend: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, RequestError>;

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, RequestError>;

    /// `GET /` greeting, used as a reachability probe
    async fn welcome(&self) -> Result<String, RequestError>;
}

#[derive(Clone)]
pub struct PharmaClient {
    client: Client,
    base_url: String,
}

impl PharmaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, RequestError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");

        let response = self.client.post(&url).json(body).send().await.map_err(|err| {
            tracing::warn!(%url, error = %err, "request failed before a response arrived");
            RequestError::from(err)
        })?;

        check_status(response).await
    }
}

#[async_trait]
impl PharmaBackend for PharmaClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, RequestError> {
        let response = self.post("/chat", request).await?;
        Ok(response.json().await?)
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, RequestError> {
        let response = self.post("/search", request).await?;
        Ok(response.json().await?)
    }

    async fn welcome(&self) -> Result<String, RequestError> {
        let response = self.client.get(self.url("/")).send().await?;
        let response = check_status(response).await?;
        let welcome: WelcomeResponse = response.json().await?;
        Ok(welcome.message)
    }
}

async fn check_status(response: Response) -> Result<Response, RequestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // An unreadable body is treated like an unparseable one.
    let body = response.bytes().await.unwrap_or_default();
    let message = error_message(status, &body);
    tracing::warn!(status = status.as_u16(), %message, "service returned an error");
    Err(RequestError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Banner text for a non-2xx response: the body's `detail`, or
/// `Server error <status>` when there is none.
pub fn error_message(status: StatusCode, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned());

    match detail {
        Some(serde_json::Value::String(text)) if !text.is_empty() => text,
        Some(value) if !is_falsy(&value) => value.to_string(),
        _ => format!("Server error {}", status.as_u16()),
    }
}

/// `null`, `false`, `0` and `""` carry no message
fn is_falsy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => false,
    }
}
