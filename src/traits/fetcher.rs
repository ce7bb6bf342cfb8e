//! URL fetcher trait and the reqwest implementation.

use async_trait::async_trait;

use crate::error::FetchError;

/// A raw HTTP response body, truncated at the caller's byte cap.
#[derive(Debug, Clone)]
pub struct RawBody {
    /// Response bytes, at most `max_bytes` long.
    pub bytes: Vec<u8>,

    /// HTTP status code.
    pub status: u16,
}

/// URL fetcher trait.
///
/// Implementations perform one bounded GET; caching, circuit breaking,
/// and HTML extraction live in the pipeline, and the User-Agent comes
/// from the fetch configuration.
#[async_trait]
pub trait UrlFetcher: Send + Sync {
    /// Fetch a URL with a User-Agent, a timeout, and a body size cap.
    async fn fetch_url(
        &self,
        url: &str,
        user_agent: &str,
        timeout_ms: u64,
        max_bytes: usize,
    ) -> Result<RawBody, FetchError>;
}

/// Plain HTTP fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlFetcher for HttpFetcher {
    async fn fetch_url(
        &self,
        url: &str,
        user_agent: &str,
        timeout_ms: u64,
        max_bytes: usize,
    ) -> Result<RawBody, FetchError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", user_agent)
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Http(Box::new(e))
                }
            })?;

        let status = response.status().as_u16();

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let mut bytes = body.to_vec();
        bytes.truncate(max_bytes);

        Ok(RawBody { bytes, status })
    }
}
