//! HTTP client for the dashboard REST backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{ClientConfig, ClientError, ClientResult};
use shared::error::{AppError, AppResult};
use shared::models::{Catalog, DashboardConfig, DataSource, HttpMethod, Role, UserPermissionOverrides};
use shared::store::{ConfigStore, OverrideStore, WidgetBackend};

/// Longest body excerpt kept in error messages
const BODY_EXCERPT_LEN: usize = 200;

/// HTTP client for the dashboard backend
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute endpoints are used as-is, anything else is joined to the base URL
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Base URL plus `segments`, each percent-encoded as a single path segment
    fn segment_url(&self, segments: &[&str]) -> ClientResult<String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Make a GET request and return the JSON body
    pub async fn get_json(&self, path: &str) -> ClientResult<Value> {
        let request = self.authorize(self.client.get(self.url(path)));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// GET and decode the (envelope-stripped) body into `T`
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let body = self.get_json(path).await?;
        check_envelope(&body)?;
        Ok(serde_json::from_value(unwrap_envelope(body))?)
    }

    /// Make a PUT request with JSON body
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Value> {
        let request = self.authorize(self.client.put(self.url(path)).json(body));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Value> {
        let request = self.authorize(self.client.post(self.url(path)).json(body));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response(response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let text = excerpt(&text);
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(ClientError::Validation(text))
                }
                _ => Err(ClientError::Server {
                    status: status.as_u16(),
                    body: text,
                }),
            };
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            ClientError::InvalidResponse(format!("{} (body: {})", e, excerpt(&text)))
        })
    }

    // ========== Dashboard API ==========

    async fn fetch_widget(&self, source: &DataSource) -> ClientResult<Value> {
        let url = self.url(&source.endpoint);
        let request = match source.method {
            HttpMethod::Get => {
                let query = source.params.as_ref().map(query_pairs).unwrap_or_default();
                self.client.get(url).query(&query)
            }
            HttpMethod::Post => {
                let body = source
                    .params
                    .clone()
                    .map(Value::Object)
                    .unwrap_or_else(|| Value::Object(Map::new()));
                self.client.post(url).json(&body)
            }
        };
        let response = self.authorize(request).send().await?;
        Self::handle_response(response).await
    }
}

#[async_trait]
impl ConfigStore for HttpClient {
    async fn get_config(&self, role: &Role) -> AppResult<Option<Value>> {
        let url = self.segment_url(&["api", "dashboard", "configs", role.as_str()])?;
        match self.get_json(&url).await {
            Ok(body) => {
                check_envelope(&body)?;
                let data = unwrap_envelope(body);
                Ok((!data.is_null()).then_some(data))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_config(&self, config: &DashboardConfig) -> AppResult<()> {
        let result = async {
            let url = self.segment_url(&["api", "dashboard", "configs", config.role.as_str()])?;
            let body = self.put(&url, config).await?;
            check_envelope(&body)
        }
        .await;
        result.map_err(|e| {
            tracing::error!(role = %config.role, error = %e, "Failed to save dashboard configuration");
            AppError::config_save(e.to_string())
        })
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.get::<Vec<Role>>("api/dashboard/roles").await?)
    }

    async fn get_catalog(&self) -> AppResult<Catalog> {
        self.get::<Catalog>("api/dashboard/catalog")
            .await
            .map_err(|e| AppError::catalog_unavailable(e.to_string()))
    }
}

#[async_trait]
impl OverrideStore for HttpClient {
    async fn get_overrides(&self, user_id: &str) -> AppResult<Option<UserPermissionOverrides>> {
        let url = self.segment_url(&["api", "users", user_id, "permission-overrides"])?;
        match self.get::<Option<UserPermissionOverrides>>(&url).await {
            Ok(overrides) => Ok(overrides),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(AppError::overrides_unavailable(e.to_string())),
        }
    }
}

#[async_trait]
impl WidgetBackend for HttpClient {
    async fn fetch(&self, source: &DataSource) -> AppResult<Value> {
        self.fetch_widget(source)
            .await
            .map_err(|e| AppError::widget_fetch(e.to_string()).with_detail("endpoint", source.endpoint.clone()))
    }
}

/// Strip a `{success: true, data}` or `{code: 0, data}` envelope
///
/// Anything else is returned untouched.
pub fn unwrap_envelope(body: Value) -> Value {
    let is_envelope = match &body {
        Value::Object(map) => {
            map.contains_key("data")
                && (map.get("success") == Some(&Value::Bool(true))
                    || map.get("code").and_then(Value::as_u64) == Some(0))
        }
        _ => false,
    };
    if !is_envelope {
        return body;
    }
    match body {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

/// Reject an envelope that reports failure despite a 2xx status
fn check_envelope(body: &Value) -> ClientResult<()> {
    let Value::Object(map) = body else {
        return Ok(());
    };
    let failed = map.get("success") == Some(&Value::Bool(false))
        || map
            .get("code")
            .and_then(Value::as_u64)
            .is_some_and(|code| code != 0 && map.contains_key("message"));
    if !failed {
        return Ok(());
    }
    let message = map
        .get("message")
        .or_else(|| map.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("request failed")
        .to_string();
    Err(ClientError::Validation(message))
}

/// Flatten JSON params into query pairs; arrays repeat the key
fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::String(s) => pairs.push((key.clone(), s.clone())),
            Value::Array(values) => {
                for v in values {
                    match v {
                        Value::String(s) => pairs.push((key.clone(), s.clone())),
                        Value::Null => {}
                        other => pairs.push((key.clone(), other.to_string())),
                    }
                }
            }
            other => pairs.push((key.clone(), other.to_string())),
        }
    }
    pairs
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
