use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::cache::CacheManager;
use super::events::EventBus;
use super::http::HttpClient;
use super::store::CacheStore;
use crate::core::{Failure, Outcome, RetryScheduler};
use crate::data::{
    AttemptContext, ClientConfig, ErrorEvent, FetchEvent, Request, RequestEvent, RequestInit,
    Response, ResponseEvent, RetryConfig,
};
use crate::error::{Error, Result};

/// HTTP client with response caching, retries and lifecycle events.
///
/// `Client` is `Send + Sync`; share one behind an `Arc` to run fetches
/// concurrently. Concurrent fetches are independent and are not deduplicated.
pub struct Client<C: HttpClient> {
    http: C,
    cache: Option<CacheManager>,
    scheduler: RetryScheduler,
    events: EventBus,
}

/// Builder for [`Client`]. Retries are off unless configured.
#[must_use]
pub struct ClientBuilder<C: HttpClient> {
    http: C,
    retry: RetryConfig,
    cache: Option<Arc<dyn CacheStore>>,
    events: Option<EventBus>,
}

impl<C: HttpClient> Client<C> {
    pub fn builder(http: C) -> ClientBuilder<C> {
        ClientBuilder {
            http,
            retry: RetryConfig::disabled(),
            cache: None,
            events: None,
        }
    }

    /// Client without retries or cache.
    pub fn new(http: C) -> Self {
        Self {
            http,
            cache: None,
            scheduler: RetryScheduler::new(RetryConfig::disabled()),
            events: EventBus::new(),
        }
    }

    /// Event bus on which every attempt is reported.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn retry_config(&self) -> &RetryConfig {
        self.scheduler.config()
    }

    pub fn cache(&self) -> Option<&CacheManager> {
        self.cache.as_ref()
    }

    /// Fetch `request`, retrying and consulting the cache as configured.
    ///
    /// Resolves with the last response even when its status is one that
    /// would have been retried. Fails with [`Error::RetryExhausted`] when
    /// the final attempt ended in a transport or cache store failure.
    ///
    /// A URL that does not parse fails with [`Error::InvalidUrl`] before the
    /// first attempt: no event is published, nothing is retried and the
    /// transport is never called.
    pub async fn fetch(&self, request: impl Into<Request>) -> Result<Response> {
        self.execute(request.into()).await
    }

    /// Like [`fetch`](Self::fetch), with per-call method, header and body overrides.
    pub async fn fetch_with(
        &self,
        request: impl Into<Request>,
        init: RequestInit,
    ) -> Result<Response> {
        self.execute(request.into().with_init(init)).await
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let request = request.normalized()?;
        let max_attempts = self.scheduler.max_attempts();

        let mut attempt = 1;
        loop {
            let ctx = AttemptContext::new(attempt, max_attempts);
            self.events.emit(&FetchEvent::Request(RequestEvent {
                attempt: ctx.attempt,
                max_attempts: ctx.max_attempts,
                method: request.method.clone(),
                url: request.url.clone(),
            }));

            let result = match self.attempt(&request).await {
                Ok((response, from_cache)) => {
                    self.events.emit(&FetchEvent::Response(ResponseEvent {
                        attempt: ctx.attempt,
                        max_attempts: ctx.max_attempts,
                        method: request.method.clone(),
                        url: request.url.clone(),
                        status_code: response.status,
                        response_time: ctx.elapsed(),
                        from_cache,
                    }));
                    Ok(response)
                }
                Err(err) => {
                    warn!(
                        url = %request.url,
                        attempt = ctx.attempt,
                        max_attempts = ctx.max_attempts,
                        last = ctx.is_last(),
                        error = %err,
                        "Fetch attempt failed"
                    );
                    self.events.emit(&FetchEvent::Error(ErrorEvent {
                        attempt: ctx.attempt,
                        max_attempts: ctx.max_attempts,
                        method: request.method.clone(),
                        url: request.url.clone(),
                        message: err.to_string(),
                        response_time: ctx.elapsed(),
                    }));
                    Err(err)
                }
            };

            match self.scheduler.classify(attempt, result) {
                Outcome::Success(response) => return Ok(response),
                Outcome::RetryableFailure(failure) => {
                    let delay = self.scheduler.backoff_delay(attempt);
                    match &failure {
                        Failure::Status(response) => debug!(
                            url = %request.url,
                            attempt,
                            status = response.status,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying on status"
                        ),
                        Failure::Error(_) => debug!(
                            url = %request.url,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying after failure"
                        ),
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Outcome::FatalFailure(err) => {
                    return Err(Error::RetryExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
            }
        }
    }

    /// One attempt: cache lookup, then transport and cache write on a miss.
    async fn attempt(&self, request: &Request) -> Result<(Response, bool)> {
        if let Some(cache) = &self.cache {
            if let Some(response) = cache.get(request).await? {
                return Ok((response, true));
            }
        }

        let response = self.http.send(request).await.map_err(Error::transport)?;

        if let Some(cache) = &self.cache {
            cache.set(request, &response).await?;
        }
        Ok((response, false))
    }
}

impl<C: HttpClient> fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("cache", &self.cache)
            .field("retry", self.scheduler.config())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl<C: HttpClient> ClientBuilder<C> {
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn no_retry(mut self) -> Self {
        self.retry = RetryConfig::disabled();
        self
    }

    /// Apply a loaded [`ClientConfig`]. A missing or `false` retry setting
    /// disables retries.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.retry = config.retry_config();
        self
    }

    pub fn cache(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(store);
        self
    }

    /// Report attempts on an existing bus instead of a fresh one.
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<Client<C>> {
        self.retry.validate()?;
        Ok(Client {
            http: self.http,
            cache: self.cache.map(CacheManager::new),
            scheduler: RetryScheduler::new(self.retry),
            events: self.events.unwrap_or_default(),
        })
    }
}
