// API client module: the authenticated HTTP client every portal call goes
// through. It attaches the active vault's bearer token (refreshing it when it
// has expired), converts keys between the wire's snake_case and our
// camelCase, unwraps the server's response envelope and turns every failure
// into an `ApiError`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::auth::{AuthToken, TokenManager, TokenRefresher};
use crate::case::{to_camel_case, to_snake_case};
use crate::config::Config;
use crate::error::ApiError;
use crate::storage::Storage;

/// Called whenever the server answers 401.
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

/// Authenticated client for the developer portal API.
///
/// Clones share the token manager, so a refresh started through one clone is
/// awaited by all of them. Separately constructed clients are independent.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    storage: Arc<Storage>,
    tokens: Arc<TokenManager>,
    on_unauthorized: Option<UnauthorizedHandler>,
}

pub(crate) fn build_http(timeout: Duration) -> Result<Client, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {e}")))
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Server-supplied reason for a failed request, if any.
fn error_message(body: &Value) -> Option<String> {
    match body.get("error") {
        Some(Value::String(msg)) => return Some(msg.clone()),
        Some(Value::Object(obj)) => {
            if let Some(Value::String(msg)) = obj.get("message") {
                return Some(msg.clone());
            }
        }
        _ => {}
    }
    body.get("message").and_then(Value::as_str).map(str::to_string)
}

/// `{ data, status, timestamp }` -> `data`. Bodies without the envelope pass
/// through untouched, including paginated lists that carry their own `data`.
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut obj)
            if obj.contains_key("data")
                && (obj.contains_key("status") || obj.contains_key("timestamp")) =>
        {
            obj.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Read a response into its camelCase payload, or the matching error.
pub(crate) async fn read_response(resp: Response) -> Result<Value, ApiError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|body| error_message(&body));
        return Err(ApiError::server(status, message));
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    let body: Value = serde_json::from_slice(&bytes)?;
    Ok(to_camel_case(unwrap_envelope(body)))
}

/// Refreshes tokens with `POST /auth/refresh`, outside the authenticated
/// pipeline.
pub struct HttpRefresher {
    http: Client,
    base_url: String,
}

impl HttpRefresher {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        HttpRefresher {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<AuthToken, ApiError> {
        let url = join_url(&self.base_url, "/auth/refresh");
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let body = read_response(resp).await?;
        tracing::info!("access token refreshed");
        Ok(serde_json::from_value(body)?)
    }
}

impl ApiClient {
    /// Client for `base_url` that refreshes tokens over HTTP.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        storage: Arc<Storage>,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        let http = build_http(timeout)?;
        let refresher = HttpRefresher::new(http.clone(), base_url.clone());
        Ok(Self::with_refresher(http, base_url, storage, Arc::new(refresher)))
    }

    pub fn from_config(config: &Config, storage: Arc<Storage>) -> Result<Self, ApiError> {
        Self::new(config.api_url.clone(), config.timeout(), storage)
    }

    /// Client with a custom refresh implementation.
    pub fn with_refresher(
        http: Client,
        base_url: impl Into<String>,
        storage: Arc<Storage>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        ApiClient {
            http,
            base_url: base_url.into(),
            storage,
            tokens: Arc::new(TokenManager::new(refresher)),
            on_unauthorized: None,
        }
    }

    /// Register the callback run on every 401 response.
    pub fn on_unauthorized(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(handler));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Bearer token for the active vault, refreshed and persisted if needed.
    pub async fn bearer_token(&self) -> Option<String> {
        let vault_id = self.storage.active_vault_id()?;
        let stored = self.storage.token(&vault_id)?;
        let checked = self.tokens.check(&stored).await?;

        if checked != stored {
            if let Err(err) = self.storage.set_token(&vault_id, checked.clone()) {
                tracing::warn!("could not persist refreshed token: {err}");
            }
        }
        Some(checked.access_token)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = join_url(&self.base_url, path);
        let mut req = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        if let Some(token) = self.bearer_token().await {
            req = req.bearer_auth(token);
        }

        tracing::debug!(%method, %url, "api request");
        let result = match req.send().await {
            Ok(resp) => read_response(resp).await,
            Err(err) => Err(ApiError::from(err)),
        };

        if let Err(err) = &result {
            if err.is_unauthorized() {
                tracing::warn!(%url, "unauthorized response");
                if let Some(handler) = &self.on_unauthorized {
                    handler();
                }
            } else {
                tracing::debug!(%url, "api request failed: {err}");
            }
        }
        result
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let value = self.send(method, path, query, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    fn wire_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
        Ok(to_snake_case(serde_json::to_value(body)?))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, &[], None).await
    }

    /// GET with query parameters. Parameter names are sent as given.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = Self::wire_body(body)?;
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = Self::wire_body(body)?;
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    /// PUT a body that is already in wire shape; its keys are not converted.
    pub async fn put_verbatim<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, &[], None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_urls_without_double_slashes() {
        assert_eq!(join_url("http://a/", "/plugins"), "http://a/plugins");
        assert_eq!(join_url("http://a", "plugins/1"), "http://a/plugins/1");
    }

    #[test]
    fn unwraps_envelope_only() {
        let wrapped = json!({ "data": [1, 2], "status": "success", "timestamp": "now" });
        assert_eq!(unwrap_envelope(wrapped), json!([1, 2]));

        let page = json!({ "data": [1], "page": 1, "limit": 10, "total": 1, "total_pages": 1 });
        assert_eq!(unwrap_envelope(page.clone()), page);

        assert_eq!(unwrap_envelope(json!("plain")), json!("plain"));
    }

    #[test]
    fn extracts_error_messages() {
        assert_eq!(error_message(&json!({ "error": "plugin not found" })).as_deref(), Some("plugin not found"));
        assert_eq!(error_message(&json!({ "error": { "message": "nested" } })).as_deref(), Some("nested"));
        assert_eq!(error_message(&json!({ "message": "flat" })).as_deref(), Some("flat"));
        assert_eq!(error_message(&json!({ "status": "error" })), None);
    }
}
