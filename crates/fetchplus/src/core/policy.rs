//! Private-cache freshness rules for one request/response pair.
//!
//! [`CachePolicy`] answers three questions without doing any I/O:
//!
//! - may this response be stored at all ([`CachePolicy::storable`])?
//! - for how long is it worth keeping ([`CachePolicy::time_to_live`])?
//! - can a later request be served from it as-is
//!   ([`CachePolicy::satisfies_without_revalidation`])?
//!
//! The cache is always treated as private: `private` responses are
//! storable and `s-maxage` is ignored. A policy must not be shared between
//! clients with different credentials.
//!
//! Every time-dependent method has an `*_at` variant taking the current
//! time explicitly.

use std::time::{Duration, SystemTime};

use super::cache_control::{CacheControl, MaxStale};
use super::date::{fmt_http_date, from_millis, parse_http_date, seconds_between, to_millis};
use crate::data::{CachePolicySnapshot, Headers, Request, Response, SNAPSHOT_VERSION};
use crate::error::{Error, Result};

/// Statuses whose semantics a cache understands.
const UNDERSTOOD_STATUSES: [u16; 15] = [
    200, 203, 204, 206, 300, 301, 302, 303, 307, 308, 404, 405, 410, 414, 501,
];

/// Statuses storable without explicit freshness information.
const CACHEABLE_BY_DEFAULT: [u16; 10] = [200, 203, 204, 300, 301, 404, 405, 410, 414, 501];

const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Fraction of `Date - Last-Modified` used as heuristic freshness.
const LAST_MODIFIED_HEURISTIC: f64 = 0.1;

const ONE_DAY_SECS: f64 = 24.0 * 3600.0;

/// Freshness floor for `immutable` responses without explicit `max-age`.
const IMMUTABLE_MIN_TTL_SECS: f64 = ONE_DAY_SECS;

#[derive(Debug, Clone)]
pub struct CachePolicy {
    response_time: SystemTime,
    status: u16,
    method: String,
    url: String,
    host: Option<String>,
    request_cache_control: Option<String>,
    request_cc: CacheControl,
    vary_request_headers: Headers,
    response_headers: Headers,
    response_cc: CacheControl,
}

impl CachePolicy {
    pub fn new(request: &Request, response: &Response) -> Self {
        Self::new_at(request, response, SystemTime::now())
    }

    /// Build a policy for a response received at `response_time`.
    pub fn new_at(request: &Request, response: &Response, response_time: SystemTime) -> Self {
        let response_headers = response.headers.clone();

        let mut vary_request_headers = Headers::new();
        for name in vary_names(&response_headers) {
            for value in request.headers.get_all(&name) {
                vary_request_headers.append(&name, value.clone());
            }
        }

        let request_cache_control = request.headers.get_joined("cache-control");

        Self {
            response_time,
            status: response.status,
            method: request.method.clone(),
            url: request.url.clone(),
            host: request.headers.get("host").map(str::to_owned),
            request_cc: CacheControl::from_header(request_cache_control.as_deref()),
            request_cache_control,
            vary_request_headers,
            response_cc: response_cache_control(&response_headers),
            response_headers,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the response may be written to a private cache.
    pub fn storable(&self) -> bool {
        !self.request_cc.no_store
            && self.method == "GET"
            && UNDERSTOOD_STATUSES.contains(&self.status)
            && !self.response_cc.no_store
            && (self.response_headers.contains("expires")
                || self.response_cc.max_age.is_some()
                || self.response_cc.public
                || CACHEABLE_BY_DEFAULT.contains(&self.status))
    }

    /// Freshness lifetime in seconds, measured from the response's `Date`.
    pub fn max_age(&self) -> f64 {
        if !self.storable() || self.response_cc.no_cache || self.varies_on_everything() {
            return 0.0;
        }

        if let Some(max_age) = self.response_cc.max_age {
            return max_age as f64;
        }

        let min_ttl = if self.response_cc.immutable {
            IMMUTABLE_MIN_TTL_SECS
        } else {
            0.0
        };
        let server_date = self.server_date();

        if let Some(expires) = self.response_headers.get("expires") {
            return match parse_http_date(expires) {
                Some(expires) if expires >= server_date => {
                    seconds_between(server_date, expires).max(min_ttl)
                }
                _ => 0.0,
            };
        }

        if let Some(last_modified) = self
            .response_headers
            .get("last-modified")
            .and_then(parse_http_date)
            && server_date > last_modified
        {
            let heuristic = seconds_between(last_modified, server_date) * LAST_MODIFIED_HEURISTIC;
            return heuristic.max(min_ttl);
        }

        min_ttl
    }

    pub fn age(&self) -> f64 {
        self.age_at(SystemTime::now())
    }

    /// `Age` header plus the time spent in this cache, in seconds.
    pub fn age_at(&self, now: SystemTime) -> f64 {
        let age_header = self
            .response_headers
            .get("age")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0) as f64;
        let resident = seconds_between(self.response_time, now).max(0.0);
        age_header + resident
    }

    pub fn time_to_live(&self) -> Duration {
        self.time_to_live_at(SystemTime::now())
    }

    /// Remaining freshness. Zero means the entry is not worth storing.
    pub fn time_to_live_at(&self, now: SystemTime) -> Duration {
        let remaining = self.max_age() - self.age_at(now);
        if remaining > 0.0 {
            Duration::from_millis((remaining * 1000.0).round() as u64)
        } else {
            Duration::ZERO
        }
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(SystemTime::now())
    }

    pub fn is_stale_at(&self, now: SystemTime) -> bool {
        self.max_age() <= self.age_at(now)
    }

    pub fn satisfies_without_revalidation(&self, request: &Request) -> bool {
        self.satisfies_without_revalidation_at(request, SystemTime::now())
    }

    /// Whether `request` can be answered with the stored response unchanged.
    pub fn satisfies_without_revalidation_at(&self, request: &Request, now: SystemTime) -> bool {
        let request_cc =
            CacheControl::from_header(request.headers.get_joined("cache-control").as_deref());
        if request_cc.no_cache || pragma_no_cache(&request.headers) {
            return false;
        }

        let age = self.age_at(now);
        let max_age = self.max_age();

        if let Some(limit) = request_cc.max_age
            && age > limit as f64
        {
            return false;
        }

        if let Some(min_fresh) = request_cc.min_fresh
            && max_age - age < min_fresh as f64
        {
            return false;
        }

        if max_age <= age {
            let allows_stale = !self.response_cc.must_revalidate
                && match request_cc.max_stale {
                    Some(MaxStale::Any) => true,
                    Some(MaxStale::Seconds(limit)) => limit as f64 > age - max_age,
                    None => false,
                };
            if !allows_stale {
                return false;
            }
        }

        self.request_matches(request)
    }

    pub fn response_headers(&self) -> Headers {
        self.response_headers_at(SystemTime::now())
    }

    /// Headers to present when serving from cache: hop-by-hop headers
    /// removed, `age` and `date` refreshed.
    pub fn response_headers_at(&self, now: SystemTime) -> Headers {
        let mut headers = self.response_headers.clone();

        let connection_tokens: Vec<String> = self
            .response_headers
            .get_all("connection")
            .iter()
            .flat_map(|v| v.split(','))
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        for name in connection_tokens.iter().map(String::as_str).chain(HOP_BY_HOP_HEADERS) {
            headers.remove(name);
        }

        let age = self.age_at(now);
        if age > ONE_DAY_SECS && !self.has_explicit_expiration() && self.max_age() > ONE_DAY_SECS {
            headers.append("warning", "113 - \"rfc7234 5.5.4\"");
        }
        headers.insert("age", (age.round() as u64).to_string());
        headers.insert("date", fmt_http_date(now));
        headers
    }

    pub fn to_snapshot(&self) -> CachePolicySnapshot {
        CachePolicySnapshot {
            version: SNAPSHOT_VERSION,
            response_time_ms: to_millis(self.response_time),
            status: self.status,
            method: self.method.clone(),
            url: self.url.clone(),
            host: self.host.clone(),
            request_cache_control: self.request_cache_control.clone(),
            vary_request_headers: self.vary_request_headers.clone(),
            response_headers: self.response_headers.clone(),
        }
    }

    pub fn from_snapshot(snapshot: CachePolicySnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }

        Ok(Self {
            response_time: from_millis(snapshot.response_time_ms),
            status: snapshot.status,
            method: snapshot.method,
            url: snapshot.url,
            host: snapshot.host,
            request_cc: CacheControl::from_header(snapshot.request_cache_control.as_deref()),
            request_cache_control: snapshot.request_cache_control,
            vary_request_headers: snapshot.vary_request_headers,
            response_cc: response_cache_control(&snapshot.response_headers),
            response_headers: snapshot.response_headers,
        })
    }

    fn server_date(&self) -> SystemTime {
        self.response_headers
            .get("date")
            .and_then(parse_http_date)
            .unwrap_or(self.response_time)
    }

    fn has_explicit_expiration(&self) -> bool {
        self.response_cc.max_age.is_some() || self.response_headers.contains("expires")
    }

    fn varies_on_everything(&self) -> bool {
        vary_names(&self.response_headers).any(|name| name == "*")
    }

    fn request_matches(&self, request: &Request) -> bool {
        self.url.eq_ignore_ascii_case(&request.url)
            && self.host.as_deref() == request.headers.get("host")
            && self.method == request.method
            && self.vary_matches(request)
    }

    fn vary_matches(&self, request: &Request) -> bool {
        vary_names(&self.response_headers).all(|name| {
            name != "*"
                && self.vary_request_headers.get_joined(&name) == request.headers.get_joined(&name)
        })
    }
}

fn vary_names(headers: &Headers) -> impl Iterator<Item = String> + '_ {
    headers
        .get_all("vary")
        .iter()
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
}

/// `Pragma: no-cache` counts only when there is no `Cache-Control`.
fn response_cache_control(headers: &Headers) -> CacheControl {
    match headers.get_joined("cache-control") {
        Some(value) => CacheControl::parse(&value),
        None => CacheControl {
            no_cache: pragma_no_cache(headers),
            ..CacheControl::default()
        },
    }
}

fn pragma_no_cache(headers: &Headers) -> bool {
    headers
        .get_all("pragma")
        .iter()
        .any(|v| v.to_ascii_lowercase().contains("no-cache"))
}
