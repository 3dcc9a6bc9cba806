use bytes::Bytes;
use url::Url;

use super::headers::Headers;
use crate::error::{Error, Result};

/// A single logical HTTP request.
///
/// The request is never mutated once the first attempt starts; every retry
/// sends the same method, URL, headers and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: impl AsRef<str>, url: impl Into<String>) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Apply per-call overrides on top of this request.
    #[must_use]
    pub fn with_init(mut self, init: RequestInit) -> Self {
        if let Some(method) = init.method {
            self.method = method.to_ascii_uppercase();
        }
        self.headers.extend_replace(&init.headers);
        if init.body.is_some() {
            self.body = init.body;
        }
        self
    }

    /// Parse and re-serialize the URL so transport and cache see one spelling.
    pub(crate) fn normalized(mut self) -> Result<Self> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.url)))?;
        self.url = parsed.into();
        Ok(self)
    }
}

impl From<&str> for Request {
    fn from(url: &str) -> Self {
        Self::get(url)
    }
}

impl From<String> for Request {
    fn from(url: String) -> Self {
        Self::get(url)
    }
}

impl From<&String> for Request {
    fn from(url: &String) -> Self {
        Self::get(url.clone())
    }
}

impl From<Url> for Request {
    fn from(url: Url) -> Self {
        Self::get(String::from(url))
    }
}

/// Optional per-call overrides, applied over a [`Request`] or bare URL.
///
/// # Examples
///
/// ```
/// use fetchplus::RequestInit;
///
/// let init = RequestInit::default()
///     .method("post")
///     .header("Content-Type", "application/json")
///     .body("{}");
/// assert_eq!(init.method.as_deref(), Some("post"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Option<String>,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl RequestInit {
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_is_upper_cased() {
        assert_eq!(Request::new("get", "http://test.com").method, "GET");
        assert_eq!(Request::from("http://test.com").method, "GET");
    }

    #[test]
    fn init_overrides_method_headers_and_body() {
        let request = Request::get("http://test.com/path")
            .header("Test-Header", "original")
            .header("Accept", "text/plain")
            .with_init(
                RequestInit::default()
                    .method("put")
                    .header("test-header", "test-value")
                    .body("payload"),
            );

        assert_eq!(request.method, "PUT");
        assert_eq!(request.headers.get_all("test-header"), ["test-value"]);
        assert_eq!(request.headers.get("accept"), Some("text/plain"));
        assert_eq!(request.body, Some(Bytes::from_static(b"payload")));
    }

    #[test]
    fn normalization_lowercases_host_only() {
        let request = Request::get("HTTP://Test.COM/Path?Q=1").normalized().unwrap();
        assert_eq!(request.url, "http://test.com/Path?Q=1");
    }

    #[test]
    fn normalization_rejects_relative_urls() {
        let err = Request::get("/relative").normalized().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
