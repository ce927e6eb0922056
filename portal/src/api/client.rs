use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::PortalConfig;
use crate::error::{PortalError, Result};
use crate::models::ApiResponse;
use crate::navigation::{Navigator, Route};
use crate::session::SessionStore;

/// Thin HTTP client for the patient backend.
///
/// Every request carries the stored bearer token (if any) and an `x-request-id`.
/// A 401 from any endpoint purges the session and sends the user to the login page.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: PortalConfig,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        config: PortalConfig,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            session,
            navigator,
        })
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Absolute URL of an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base(), path.trim_start_matches('/'))
    }

    /// Start a request with auth and correlation headers attached
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, %method, %url, "api request");

        let mut builder = self
            .http
            .request(method, url)
            .header("x-request-id", request_id.to_string());

        if let Some(token) = self.session.token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    /// POST that only needs the backend to acknowledge success
    pub async fn post_ack<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.execute(self.request(Method::POST, path).json(body))
            .await
            .map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(self.request(Method::DELETE, path))
            .await
            .map(|_| ())
    }

    /// Send and unwrap the `data` field of a successful envelope
    pub(crate) async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let (status, body) = self.dispatch(builder).await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
        if !envelope.success {
            return Err(PortalError::backend(Some(status), envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| PortalError::backend(Some(status), Some("empty response".to_string())))
    }

    /// Send and check the envelope, keeping whatever data came back
    pub(crate) async fn execute(&self, builder: RequestBuilder) -> Result<ApiResponse<Value>> {
        let (status, body) = self.dispatch(builder).await?;
        let envelope: ApiResponse<Value> = if body.trim().is_empty() {
            ApiResponse::ok(Value::Null)
        } else {
            serde_json::from_str(&body)?
        };
        if !envelope.success {
            return Err(PortalError::backend(Some(status), envelope.message));
        }
        Ok(envelope)
    }

    /// Send and decode a body that is not wrapped in the envelope
    pub(crate) async fn send_raw<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let (_, body) = self.dispatch(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Perform the request and classify the response status.
    /// Returns the body of any 2xx response.
    async fn dispatch(&self, builder: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!("request failed: {}", e);
            PortalError::from(e)
        })?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(PortalError::Unauthorized);
        }

        if !status.is_success() {
            let message = serde_json::from_str::<ApiResponse<Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.message);
            tracing::warn!(%status, "backend rejected request: {:?}", message);
            return Err(PortalError::backend(Some(status), message));
        }

        Ok((status, body))
    }

    /// Global 401 handling: forget the session and go back to login
    fn handle_unauthorized(&self) {
        tracing::warn!("received 401, clearing session");
        if let Err(e) = self.session.clear() {
            tracing::error!("failed to clear session after 401: {}", e);
        }
        self.navigator.navigate(Route::Login);
    }
}
