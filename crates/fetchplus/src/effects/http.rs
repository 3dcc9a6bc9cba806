use std::future::Future;

use crate::data::{Request, Response};

/// Asynchronous HTTP transport abstraction.
///
/// One call performs exactly one exchange. Implementations must not retry
/// internally; retry policy belongs to [`Client`](crate::Client).
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send `request` and return the response with its body fully read.
    ///
    /// Non-2xx statuses are responses, not errors. Return `Err` only when no
    /// response was obtained (DNS failure, connection reset, timeout, ...).
    fn send(
        &self,
        request: &Request,
    ) -> impl Future<Output = std::result::Result<Response, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use crate::data::{Headers, canonical_reason};

    #[derive(Debug, thiserror::Error)]
    pub enum ReqwestError {
        #[error("invalid HTTP method: {0}")]
        InvalidMethod(String),

        #[error(transparent)]
        Request(#[from] reqwest::Error),
    }

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Self {
            Self::default()
        }

        /// Use a preconfigured reqwest client (timeouts, proxies, TLS).
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = ReqwestError;

        async fn send(&self, request: &Request) -> std::result::Result<Response, Self::Error> {
            let method = reqwest::Method::from_bytes(request.method.as_bytes())
                .map_err(|_| ReqwestError::InvalidMethod(request.method.clone()))?;

            let mut builder = self.client.request(method, &request.url);
            for (name, value) in request.headers.iter() {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let response = builder.send().await?;

            let status = response.status();
            let url = response.url().to_string();
            let headers: Headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.as_str(), v.to_owned()))
                })
                .collect();
            let body = response.bytes().await?;

            Ok(Response {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or_else(|| canonical_reason(status.as_u16()))
                    .to_string(),
                headers,
                body,
                url,
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ReqwestClient, ReqwestError};
