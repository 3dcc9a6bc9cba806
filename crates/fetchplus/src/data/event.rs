use std::fmt;
use std::time::{Duration, Instant};

/// Per-attempt bookkeeping, created fresh for every attempt.
#[derive(Debug, Clone, Copy)]
pub struct AttemptContext {
    /// 1-based attempt number.
    pub attempt: u32,
    pub max_attempts: u32,
    pub started: Instant,
}

impl AttemptContext {
    pub fn new(attempt: u32, max_attempts: u32) -> Self {
        Self {
            attempt,
            max_attempts,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_last(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// Fields shared by every lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEvent {
    pub attempt: u32,
    pub max_attempts: u32,
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEvent {
    pub attempt: u32,
    pub max_attempts: u32,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub response_time: Duration,
    /// The response was served by the cache without a transport call.
    pub from_cache: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub attempt: u32,
    pub max_attempts: u32,
    pub method: String,
    pub url: String,
    pub message: String,
    pub response_time: Duration,
}

impl ResponseEvent {
    pub fn response_time_ms(&self) -> f64 {
        self.response_time.as_secs_f64() * 1000.0
    }
}

impl ErrorEvent {
    pub fn response_time_ms(&self) -> f64 {
        self.response_time.as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Request,
    Response,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Request => write!(f, "request"),
            EventKind::Response => write!(f, "response"),
            EventKind::Error => write!(f, "error"),
        }
    }
}

/// A lifecycle notification for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Request(RequestEvent),
    Response(ResponseEvent),
    Error(ErrorEvent),
}

impl FetchEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            FetchEvent::Request(_) => EventKind::Request,
            FetchEvent::Response(_) => EventKind::Response,
            FetchEvent::Error(_) => EventKind::Error,
        }
    }

    pub fn attempt(&self) -> u32 {
        match self {
            FetchEvent::Request(e) => e.attempt,
            FetchEvent::Response(e) => e.attempt,
            FetchEvent::Error(e) => e.attempt,
        }
    }
}
