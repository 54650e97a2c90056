use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::navigator::Navigator;
use super::recovery::RecoveryGate;
use super::SessionExpiry;
use crate::config::ApiConfig;
use crate::errors::{ErrorPayload, TransportError};
use crate::store::TokenStore;
use crate::utils::log_throttle::LogThrottle;
use crate::utils::redirect::{login_redirect, path_of};

const NO_TOKEN_LOG_WINDOW: Duration = Duration::from_secs(30);
/// Query parameter added to GET requests so caches never serve stale data.
pub const CACHE_BUST_PARAM: &str = "_t";

/// Body of an outgoing request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A request relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Set on a request that is itself a retry; a 401 on it is terminal.
    pub retry: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            retry: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, TransportError> {
        let value =
            serde_json::to_value(body).map_err(|e| TransportError::Request(e.to_string()))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn as_retry(mut self) -> Self {
        self.retry = true;
        self
    }
}

/// A successful response, body already read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_str(&self.body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// HTTP client that carries the stored bearer token on every request and
/// turns 401 responses into a forced return to the login page.
///
/// No timeout is applied unless `api.timeout_ms` is configured; requests may
/// otherwise run indefinitely and callers wrap them if they need a bound.
pub struct AuthenticatedTransport {
    client: Client,
    base_url: String,
    login_endpoints: Vec<String>,
    login_path: String,
    tokens: Arc<TokenStore>,
    navigator: Arc<dyn Navigator>,
    gate: RecoveryGate,
    throttle: LogThrottle,
    expiry: OnceLock<Weak<dyn SessionExpiry>>,
}

impl AuthenticatedTransport {
    pub fn new(
        api: &ApiConfig,
        login_path: &str,
        tokens: Arc<TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = api.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            login_endpoints: api
                .login_endpoints
                .iter()
                .map(|e| normalize(e).to_string())
                .collect(),
            login_path: login_path.to_string(),
            tokens,
            navigator,
            gate: RecoveryGate::new(),
            throttle: LogThrottle::new(NO_TOKEN_LOG_WINDOW),
            expiry: OnceLock::new(),
        })
    }

    /// Register who gets told when a 401 wipes the stored token. Only the
    /// first registration sticks.
    pub fn set_expiry_handler(&self, handler: Weak<dyn SessionExpiry>) {
        if self.expiry.set(handler).is_err() {
            warn!("session expiry handler already registered, ignoring");
        }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Whether `path` is a token-issuance endpoint.
    pub fn is_login_endpoint(&self, path: &str) -> bool {
        let path = normalize(path_of(path));
        self.login_endpoints.iter().any(|e| e == path)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        self.send(ApiRequest::post(path).json(body)?).await?.json()
    }

    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<T, TransportError> {
        self.send(ApiRequest::post(path).form(fields)).await?.json()
    }

    /// Dispatch a request and inspect the response.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let token = self.tokens.read();
        if token.is_some() {
            self.tokens.reconcile();
        } else if let Some(suppressed_count) = self.throttle.should_emit("transport.no_token") {
            warn!(
                event_name = "transport.request.no_token",
                event_domain = "transport",
                url_path = request.path.as_str(),
                suppressed_count,
                "no auth token found, request may be rejected"
            );
        }

        let url = self.url(&request.path);
        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if request.method == Method::GET {
            builder = builder.query(&[(CACHE_BUST_PARAM, Utc::now().timestamp_millis())]);
        }
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        debug!(
            http_method = %request.method,
            url_path = request.path.as_str(),
            "sending request"
        );
        let response = builder.send().await.map_err(|e| {
            error!(
                http_method = %request.method,
                url_path = request.path.as_str(),
                error = %e,
                "request failed without a response"
            );
            TransportError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            debug!(
                http_status = status.as_u16(),
                url_path = request.path.as_str(),
                "received response"
            );
            return Ok(ApiResponse { status, body });
        }

        warn!(
            http_status = status.as_u16(),
            url_path = request.path.as_str(),
            "request returned an error status"
        );
        let payload = ErrorPayload::new(body);
        if status == StatusCode::UNAUTHORIZED {
            return Err(self
                .handle_unauthorized(&request, token.as_deref(), payload)
                .await);
        }
        Err(TransportError::Status {
            status: status.as_u16(),
            payload,
        })
    }

    async fn handle_unauthorized(
        &self,
        request: &ApiRequest,
        sent_token: Option<&str>,
        payload: ErrorPayload,
    ) -> TransportError {
        // The login request itself: a bad password, not an expired session.
        if self.is_login_endpoint(&request.path) || request.retry {
            warn!(
                event_name = "transport.login.rejected",
                event_domain = "transport",
                url_path = request.path.as_str(),
                "credentials rejected"
            );
            self.tokens.clear();
            self.notify_expired();
            self.redirect_to_login();
            return TransportError::Unauthorized(payload);
        }

        match self.gate.try_begin() {
            // Only the token this request carried may be wiped; if the store
            // moved on (already cleared, or a new login) the 401 is stale.
            Some(permit)
                if sent_token.is_some() && self.tokens.read().as_deref() == sent_token =>
            {
                warn!(
                    event_name = "transport.session.expired",
                    event_domain = "transport",
                    url_path = request.path.as_str(),
                    "session rejected by server, returning to login"
                );
                self.tokens.clear();
                self.notify_expired();
                self.redirect_to_login();
                drop(permit);
            }
            Some(_stale) => {
                debug!(
                    url_path = request.path.as_str(),
                    "401 without a matching stored token, ignoring"
                );
            }
            None => {
                debug!(
                    url_path = request.path.as_str(),
                    "session recovery in flight, rejecting after it settles"
                );
                self.gate.wait_settled().await;
            }
        }
        TransportError::Unauthorized(payload)
    }

    fn notify_expired(&self) {
        if let Some(handler) = self.expiry.get().and_then(Weak::upgrade) {
            handler.session_expired();
        }
    }

    fn redirect_to_login(&self) {
        let current = self.navigator.current();
        let current_path = path_of(&current);
        if current_path == self.login_path {
            return;
        }
        self.navigator
            .redirect(&login_redirect(&self.login_path, current_path));
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
