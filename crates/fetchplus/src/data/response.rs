use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::headers::Headers;
use crate::error::Result;

/// A fully materialized HTTP response.
///
/// Produced by an [`HttpClient`](crate::HttpClient) or rebuilt from a cache
/// entry. The body is held as [`Bytes`], so cloning a response for the cache
/// does not copy it.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
    pub url: String,
}

impl Response {
    pub fn new(status: u16, url: impl Into<String>) -> Self {
        Self {
            status,
            status_text: canonical_reason(status).to_string(),
            headers: Headers::new(),
            body: Bytes::new(),
            url: url.into(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// `true` for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Reason phrase for the statuses a cache or retry policy cares about.
pub fn canonical_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        206 => "Partial Content",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        410 => "Gone",
        414 => "URI Too Long",
        418 => "I'm a teapot",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_covers_2xx_only() {
        assert!(Response::new(200, "http://a.com/").ok());
        assert!(Response::new(204, "http://a.com/").ok());
        assert!(!Response::new(304, "http://a.com/").ok());
        assert!(!Response::new(500, "http://a.com/").ok());
    }

    #[test]
    fn json_body() {
        #[derive(serde::Deserialize)]
        struct Deal {
            id: u32,
        }

        let response = Response::new(200, "http://a.com/").body(r#"{"id":7}"#);
        let deal: Deal = response.json().unwrap();
        assert_eq!(deal.id, 7);
        assert!(Response::new(200, "http://a.com/").body("nope").json::<Deal>().is_err());
    }

    #[test]
    fn status_text_defaults_to_reason() {
        assert_eq!(Response::new(503, "http://a.com/").status_text, "Service Unavailable");
        assert_eq!(Response::new(299, "http://a.com/").status_text, "");
    }
}
