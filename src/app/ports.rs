use crate::error::Result;
use async_trait::async_trait;

/// A single GET request. Header names are sent as given.
#[derive(Clone, Debug, Default)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub body: String,
    /// Raw `Retry-After` header value, if any
    pub retry_after: Option<String>,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Transport seam under the retry client. Implementations return every
/// response, successful or not; only transport failures are errors.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> Result<HttpGetResult>;
}
