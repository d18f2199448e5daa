use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::errors::{Error, Result};

/// Upper bound on a single backoff sleep, whatever the configured multiplier.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// HTTP client with built-in timeout and retry-with-backoff support.
///
/// One instance wraps one `reqwest` connection pool; dropping the last clone
/// tears the pool down. Failures are classified through [`Error::is_transient`]:
/// timeouts, connection errors, 5xx responses and rate-limit signals are
/// retried with exponential backoff, everything else is surfaced immediately.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
    max_retries: usize,
    backoff_base: Duration,
    backoff_multiplier: f64,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request with retry semantics and return the successful
    /// response.
    ///
    /// Non-2xx statuses are mapped to the error taxonomy before the retry
    /// decision, so exhaustion re-surfaces the last classified failure.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let attempts = self.max_retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            let cloned = builder.try_clone().ok_or_else(|| {
                Error::Network("request body cannot be cloned; retries require a buffered body".into())
            })?;
            let request = cloned.build().map_err(|err| Error::Network(err.to_string()))?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");

            let error = match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, %url, %status, "received HTTP response");

                    if status.is_success() {
                        return Ok(response);
                    }
                    classify_status(status, url.as_str(), response).await
                }
                Err(err) => self.classify_transport_error(&err, url.as_str()),
            };

            if error.is_transient() && attempt + 1 < attempts {
                warn!(attempt = attempt + 1, %method, %url, error = %error, "transient failure, retrying");
                self.sleep_with_backoff(attempt).await;
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error
            .unwrap_or_else(|| Error::Network("retries exhausted without a response".into())))
    }

    fn classify_transport_error(&self, err: &reqwest::Error, url: &str) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.timeout)
        } else if err.is_connect() {
            Error::Network(format!("failed to connect to {url}: {err}"))
        } else {
            Error::Network(err.to_string())
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        // attempt is 0-based: first retry waits exactly the base delay.
        let factor = self.backoff_multiplier.powi(attempt.min(16) as i32);
        let secs = self.backoff_base.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= MAX_BACKOFF.as_secs_f64() {
            return MAX_BACKOFF;
        }
        Duration::from_secs_f64(secs)
    }

    async fn sleep_with_backoff(&self, attempt: usize) {
        let delay = self.backoff_delay(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Map a non-success status to the error taxonomy, extracting the upstream
/// error message from the body when one is present.
async fn classify_status(status: StatusCode, url: &str, response: Response) -> Error {
    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .unwrap_or_else(|| format!("{url} returned status {status}"));

    match status {
        StatusCode::UNAUTHORIZED => Error::Authentication(message),
        StatusCode::FORBIDDEN => Error::Authentication(format!("access forbidden: {message}")),
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => match retry_after {
            Some(seconds) => Error::RateLimit(format!("retry after {seconds} seconds")),
            None => Error::RateLimit(message),
        },
        _ => Error::Api { status: status.as_u16(), message },
    }
}

/// The graph API wraps failures as `{"error": {"message": ...}}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(|message| message.as_str())
        .map(str::to_string)
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_retries: usize,
    backoff_base: Duration,
    backoff_multiplier: f64,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of retries after the initial attempt.
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn backoff_base(mut self, backoff: Duration) -> Self {
        self.backoff_base = backoff;
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder
            .build()
            .map_err(|err| Error::Network(format!("failed to build HTTP client: {err}")))?;

        Ok(HttpClient {
            client,
            timeout: self.timeout,
            max_retries: self.max_retries,
            backoff_base: self.backoff_base,
            backoff_multiplier: self.backoff_multiplier,
        })
    }
}
