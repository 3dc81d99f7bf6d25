//! HTTP client with rate limiting for the provider API.
//!
//! Wraps `reqwest::Client` and adds:
//! * Request rate limiting to stay inside the provider's quota
//! * Consistent timeouts and the configured `User-Agent`
//!
//! There are no retries. A failed request fails the one submission that
//! issued it.
//!
//! # Example
//!
//! ```rust
//! use djqueue::http::Client;
//!
//! let client = Client::new(&config)?;
//! let request = client.get(url);
//! let response = client.execute(request).await?;
//! ```

use std::{future::Future, num::NonZeroU32, time::Duration};

use futures_util::{FutureExt, TryFutureExt};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Method, Url};

use crate::{config::Config, error::Result};

/// HTTP client with built-in rate limiting.
pub struct Client {
    /// Unlimited request client for special cases.
    pub unlimited: reqwest::Client,

    /// Rate limiter for API quota compliance.
    rate_limiter: DefaultDirectRateLimiter,
}

impl Client {
    /// Rolling window over which calls are counted.
    const RATE_LIMIT_INTERVAL: Duration = Duration::from_secs(1);

    /// Maximum allowed API calls per interval.
    ///
    /// A playlist submission costs three calls, so this leaves room for a
    /// burst of submissions without hammering the quota.
    const RATE_LIMIT_CALLS_PER_INTERVAL: u8 = 10;

    /// Duration to keep idle connections alive.
    const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Duration to wait for individual network reads.
    const READ_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built, for example when
    /// the TLS backend fails to initialize.
    ///
    /// # Panics
    ///
    /// Panics if rate limit parameters are zero.
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .tcp_keepalive(Self::KEEPALIVE_TIMEOUT)
            .read_timeout(Self::READ_TIMEOUT)
            .user_agent(&config.user_agent);

        let replenish_interval =
            Self::RATE_LIMIT_INTERVAL / u32::from(Self::RATE_LIMIT_CALLS_PER_INTERVAL);
        let quota = Quota::with_period(replenish_interval)
            .expect("quota time interval is zero")
            .allow_burst(
                NonZeroU32::new(Self::RATE_LIMIT_CALLS_PER_INTERVAL.into())
                    .expect("calls per interval is zero"),
            );

        Ok(Self {
            unlimited: http_client.build()?,
            rate_limiter: governor::RateLimiter::direct(quota),
        })
    }

    /// Builds a GET request for `url`.
    pub fn get<U>(&self, url: U) -> reqwest::Request
    where
        U: Into<Url>,
    {
        reqwest::Request::new(Method::GET, url.into())
    }

    /// Executes a request once the rate limiter allows it.
    ///
    /// # Errors
    ///
    /// Returns error if the request could not be sent or no response was
    /// received. Non-success statuses are *not* errors here.
    pub fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response>> + '_ {
        let throttle = self.rate_limiter.until_ready();
        throttle.then(|()| self.unlimited.execute(request).map_err(Into::into))
    }
}
