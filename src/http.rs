use crate::config::{ClientSettings, Credential};
use crate::errors::{AppError, AppResult};
use crate::redaction::Redactor;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

const MAX_ERROR_BODY_CHARS: usize = 300;

/// Thin wrapper over `reqwest::Client` bound to one API base URL. Every
/// request carries the bearer credential and a JSON content type.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    redactor: Redactor,
}

impl ApiClient {
    pub fn new(settings: &ClientSettings, credential: &Credential) -> AppResult<Self> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|error| AppError::Config(format!("invalid base URL '{}': {}", settings.base_url, error)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!("base URL '{}' cannot carry a path", settings.base_url)));
        }

        let mut authorization = HeaderValue::from_str(&credential.bearer())
            .map_err(|_| AppError::Config("bearer token contains invalid header characters".to_string()))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let timeout = settings.request_timeout();
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout);
        if is_loopback(&base_url) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|error| AppError::Config(format!("failed to build HTTP client: {}", error)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
            redactor: Redactor::new(Some(credential.expose())),
        })
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get<T, Q>(&self, segments: &[&str], query: &Q) -> AppResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        self.execute("GET", self.client.get(url).query(query)).await
    }

    pub async fn post<T, B>(&self, segments: &[&str], body: &B) -> AppResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        self.execute("POST", self.client.post(url).json(body)).await
    }

    pub async fn delete<T>(&self, segments: &[&str]) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        self.execute("DELETE", self.client.delete(url)).await
    }

    async fn execute<T>(&self, method: &'static str, request: RequestBuilder) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::debug!(%request_id, method, "sending api request");

        let response = request
            .header("x-request-id", request_id.to_string())
            .send()
            .await
            .map_err(|error| self.transport_error(error))?;

        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = classify_status(status, &self.redactor.scrub(&body));
            tracing::warn!(%request_id, method, status = status.as_u16(), elapsed_ms, error = %error, "api request failed");
            return Err(error);
        }

        tracing::debug!(%request_id, method, status = status.as_u16(), elapsed_ms, "api request succeeded");
        response
            .json::<T>()
            .await
            .map_err(|error| AppError::Internal(format!("malformed response body: {}", self.redactor.scrub(&error.to_string()))))
    }

    fn transport_error(&self, error: reqwest::Error) -> AppError {
        if error.is_timeout() {
            return AppError::NetworkFailure(format!("request timed out after {} ms", self.timeout.as_millis()));
        }
        AppError::NetworkFailure(self.redactor.scrub(&error.to_string()))
    }
}

fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<std::net::IpAddr>()
            .map(|address| address.is_loopback())
            .unwrap_or(false)
}

/// Maps a non-success HTTP status onto the client error taxonomy.
pub fn classify_status(status: StatusCode, body: &str) -> AppError {
    let detail = summarize_body(status, body);
    match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(detail),
        StatusCode::NOT_FOUND => AppError::NotFound(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(detail),
        _ => AppError::ServerError(detail),
    }
}

fn summarize_body(status: StatusCode, body: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("unexpected status");
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(|message| message.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        return format!("{} {}", status.as_u16(), reason);
    }
    let message: String = message.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{} {}: {}", status.as_u16(), reason, message)
}
