// Authorized JSON transport shared by the Sheets and Drive clients.
//
// Every request carries the bearer token from the `AuthContext`. Any non-2xx
// status becomes `SheetsError::Api` with Google's error message; a 401 also
// drops the cached token so the next call acquires a fresh one.

use crate::core::auth::AuthContext;
use crate::core::sheets::SheetsError;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub struct ApiTransport {
    client: Client,
    auth: AuthContext,
}

impl ApiTransport {
    /// `application_name` is sent as the User-Agent.
    pub fn new(auth: AuthContext, application_name: &str) -> Result<Self, SheetsError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(application_name)
                .map_err(|e| SheetsError::InvalidInput(format!("application name: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| SheetsError::Transport(e.to_string()))?;

        Ok(Self { client, auth })
    }

    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Sends the request and decodes the JSON body.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SheetsError> {
        let token = self.auth.access_token().await?;
        let response = send(request.bearer_auth(token)).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("Access token rejected, dropping cached token");
            self.auth.invalidate().await;
        }

        decode(response).await
    }
}

async fn send(request: RequestBuilder) -> Result<Response, SheetsError> {
    request
        .send()
        .await
        .map_err(|e| SheetsError::Transport(e.to_string()))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SheetsError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(SheetsError::Api {
            status: status.as_u16(),
            message: api_error_message(&text),
        });
    }

    response
        .json()
        .await
        .map_err(|e| SheetsError::Decode(e.to_string()))
}

/// Google's `{"error": {"message": ...}}` message, or the raw body.
pub fn api_error_message(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .pointer("/error/message")
            .or_else(|| value.get("error_description"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match message {
        Some(message) => message,
        None if body.trim().is_empty() => "empty response".to_string(),
        None => body.trim().to_string(),
    }
}

/// `base` followed by percent-encoded path segments.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, SheetsError> {
    let mut url = Url::parse(base).map_err(|e| SheetsError::InvalidInput(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| SheetsError::InvalidInput(format!("'{}' cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
