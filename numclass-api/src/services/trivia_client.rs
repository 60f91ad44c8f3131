//! Trivia (fun fact) source
//!
//! The upstream service is untrusted for latency and availability. This
//! module only performs the fetch and reports what happened; bounding the
//! wait and choosing fallback text belongs to the enrichment coordinator.
//!
//! **Upstream contract:** `GET {base_url}/{number}[/{category}]`, success is
//! any 2xx status. The body is either plain text or a JSON object with a
//! `text` field, depending on the configured [`ResponseFormat`].

use async_trait::async_trait;
use numclass_common::{ResponseFormat, TriviaConfig};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("numclass/", env!("CARGO_PKG_VERSION"));

/// Hard ceiling on any single request, independent of the caller's budget
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Trivia fetch errors
#[derive(Debug, Error)]
pub enum TriviaError {
    /// Request exceeded the client-level timeout
    #[error("Request timed out")]
    Timeout,

    /// Connection refused, DNS failure, reset, etc.
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-2xx status
    #[error("Upstream returned status {0}")]
    Status(u16),

    /// Upstream reported that it has no fact for this number
    #[error("No fact available for {0}")]
    NotFound(i64),

    /// Body could not be read or decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl TriviaError {
    /// Whether a second attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, TriviaError::Network(_) | TriviaError::Status(_))
    }
}

impl From<reqwest::Error> for TriviaError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TriviaError::Timeout
        } else if e.is_decode() || e.is_body() {
            TriviaError::Parse(e.to_string())
        } else {
            TriviaError::Network(e.to_string())
        }
    }
}

/// A source of short natural-language facts about integers
#[async_trait]
pub trait TriviaSource: Send + Sync {
    /// Source identifier used in logs
    fn source_id(&self) -> &'static str;

    /// Fetch a fact about `number`
    ///
    /// Implementations must not retry and must not apply their own fallback.
    async fn fetch(&self, number: i64) -> Result<String, TriviaError>;
}

/// JSON body variant
#[derive(Debug, Deserialize)]
struct FactBody {
    text: String,
    #[serde(default)]
    found: Option<bool>,
}

/// HTTP client for a numbersapi-style trivia service
pub struct NumbersApiClient {
    http_client: reqwest::Client,
    base_url: String,
    category: Option<String>,
    format: ResponseFormat,
}

impl NumbersApiClient {
    /// Create a client from trivia configuration
    pub fn new(config: &TriviaConfig) -> Result<Self, TriviaError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TriviaError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            category: config
                .category
                .as_ref()
                .map(|c| c.trim().trim_matches('/').to_string())
                .filter(|c| !c.is_empty()),
            format: config.format,
        })
    }

    /// Request URL for `number`
    pub fn url_for(&self, number: i64) -> String {
        let mut url = format!("{}/{}", self.base_url, number);
        if let Some(category) = &self.category {
            url.push('/');
            url.push_str(category);
        }
        if self.format == ResponseFormat::Json {
            url.push_str("?json");
        }
        url
    }

    fn decode_body(&self, number: i64, body: &str) -> Result<String, TriviaError> {
        let text = match self.format {
            ResponseFormat::Text => body.trim().to_string(),
            ResponseFormat::Json => {
                let parsed: FactBody = serde_json::from_str(body)
                    .map_err(|e| TriviaError::Parse(e.to_string()))?;
                if parsed.found == Some(false) {
                    return Err(TriviaError::NotFound(number));
                }
                parsed.text.trim().to_string()
            }
        };

        if text.is_empty() {
            return Err(TriviaError::Parse("empty fact".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl TriviaSource for NumbersApiClient {
    fn source_id(&self) -> &'static str {
        "numbersapi"
    }

    async fn fetch(&self, number: i64) -> Result<String, TriviaError> {
        let url = self.url_for(number);
        tracing::debug!(number, url = %url, "Querying trivia service");

        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriviaError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        self.decode_body(number, &body)
    }
}
