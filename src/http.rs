/// HTTP fetch client with bounded retry and linear backoff
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::CrawlerConfig;
use crate::{PipelineError, Result};

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A single GET attempt. Connection-level failures are reported as
/// `PipelineError::TransientNetwork` with no status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse>;
}

/// Production transport backed by reqwest
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        // reqwest errors carry the full url, query credentials included
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                return Err(PipelineError::TransientNetwork {
                    url: endpoint_of(url),
                    status: None,
                    message: e.without_url().to_string(),
                });
            }
            Err(e) => return Err(e.without_url().into()),
        };

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::from(e.without_url()))?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Retry eligibility of a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    Retryable,
    Fatal,
}

/// Map an HTTP status to retry eligibility: 2xx succeeds, 5xx is retried,
/// everything else (4xx in practice) is fatal.
pub fn classify(status: u16) -> RequestOutcome {
    match status {
        200..=299 => RequestOutcome::Success,
        500..=599 => RequestOutcome::Retryable,
        _ => RequestOutcome::Fatal,
    }
}

/// Delay before the attempt following failed attempt `attempt_index`
pub fn backoff_delay(unit: Duration, attempt_index: u32) -> Duration {
    unit * attempt_index
}

enum AttemptState {
    Attempting(u32),
    Backoff(u32),
    Failed(PipelineError),
    Succeeded(Vec<u8>),
}

/// GET client shared by the crawler and the word parser
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn Transport>,
    backoff_unit: Duration,
    max_retries: u32,
}

impl FetchClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            backoff_unit: Duration::from_secs(2),
            max_retries: 5,
        }
    }

    /// Build a reqwest-backed client from crawler settings
    pub fn from_config(config: &CrawlerConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout_seconds)?;
        Ok(Self::new(Arc::new(transport))
            .with_backoff_unit(Duration::from_secs(config.backoff_unit_secs))
            .with_max_retries(config.max_retries))
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// GET with the client's default retry budget
    pub async fn fetch(&self, url: &str, params: &[(&str, String)]) -> Result<Vec<u8>> {
        self.get(url, params, self.max_retries).await
    }

    /// GET `url` with `params`, retrying transient failures up to
    /// `max_retries` attempts in total.
    pub async fn get(&self, url: &str, params: &[(&str, String)], max_retries: u32) -> Result<Vec<u8>> {
        let request_url = Url::parse_with_params(url, params.iter().map(|(k, v)| (*k, v.as_str())))
            .map_err(|e| PipelineError::Config(format!("invalid url {}: {}", url, e)))?;
        let attempts = max_retries.max(1);

        let mut state = AttemptState::Attempting(0);
        loop {
            state = match state {
                AttemptState::Attempting(attempt) => {
                    debug!("GET {} (attempt {}/{})", url, attempt + 1, attempts);
                    let result = self.transport.get(&request_url).await.and_then(|response| {
                        match classify(response.status) {
                            RequestOutcome::Success => Ok(response.body),
                            RequestOutcome::Retryable => Err(PipelineError::TransientNetwork {
                                url: url.to_string(),
                                status: Some(response.status),
                                message: body_excerpt(&response.body),
                            }),
                            RequestOutcome::Fatal => Err(PipelineError::FatalRequest {
                                url: url.to_string(),
                                status: response.status,
                                body: body_excerpt(&response.body),
                            }),
                        }
                    });

                    match result {
                        Ok(body) => AttemptState::Succeeded(body),
                        Err(e) if e.is_transient() && attempt + 1 < attempts => {
                            warn!("⚠️ GET {} failed on attempt {}: {}", url, attempt + 1, e);
                            AttemptState::Backoff(attempt)
                        }
                        Err(e) => AttemptState::Failed(e),
                    }
                }
                AttemptState::Backoff(attempt) => {
                    let delay = backoff_delay(self.backoff_unit, attempt);
                    if !delay.is_zero() {
                        debug!("Retrying {} in {:?}", url, delay);
                        tokio::time::sleep(delay).await;
                    }
                    AttemptState::Attempting(attempt + 1)
                }
                AttemptState::Failed(e) => return Err(e),
                AttemptState::Succeeded(body) => return Ok(body),
            };
        }
    }
}

/// Scheme, host and path of a request url; the query carries credentials
fn endpoint_of(url: &Url) -> String {
    let mut endpoint = url.clone();
    endpoint.set_query(None);
    endpoint.to_string()
}

fn body_excerpt(body: &[u8]) -> String {
    String::from_utf8_lossy(body).chars().take(200).collect()
}
