//! HTTP transport seam.
//!
//! Services talk to the storefront through [`Transport`] so the cache and
//! session logic can be exercised against an in-memory fake.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::cache::QueryKey;
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Sends one JSON request to the storefront API.
///
/// `path` is absolute from the API origin (`/api/cart`) and may carry a query
/// string. An empty success body is returned as [`Value::Null`].
pub trait Transport: Send + Sync + 'static {
    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> impl Future<Output = Result<Value, ClientError>> + Send;
}

/// [`Transport`] over reqwest, keeping the session cookie between calls.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport for the configured API origin.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] if the TLS backend fails to initialize.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(concat!("loomline-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }
}

impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::Network(format!("invalid request path {path}: {e}")))?;

        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!(%method, path, status = status.as_u16(), "Request failed");
            return Err(ClientError::from_response(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// A `GET` for `key`, detached from the caller's borrows so the cache can
/// share it between readers.
pub(crate) fn fetch_get<T: Transport>(
    transport: &Arc<T>,
    key: &QueryKey,
) -> BoxFuture<'static, Result<Value, ClientError>> {
    let transport = Arc::clone(transport);
    let endpoint = key.endpoint();
    async move { transport.request(Method::GET, &endpoint, None).await }.boxed()
}

/// Decode a JSON value into a response type.
pub(crate) fn decode<R: DeserializeOwned>(value: &Value) -> Result<R, ClientError> {
    R::deserialize(value).map_err(ClientError::from)
}
