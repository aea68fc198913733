use crate::config::Config;
use crate::core::error::FetchError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single outbound request issued by an API-shaped extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Value,
}

/// Network collaborator used by extractors that need a follow-up request.
///
/// Implementations own connection lifecycle; the dispatcher only awaits the
/// returned future and never retries.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn request(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// `reqwest`-backed network collaborator.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Downloads a page as text. Used by the CLI to acquire embed page content.
    pub async fn page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn request(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(referrer) = &request.referrer {
            builder = builder.header("Referer", referrer.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        tracing::debug!("{:?} {}", request.method, request.url);
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        tracing::debug!("Response status: {}, {} bytes", status, text.len());

        let body = parse_body(&request.url, status, &text)?;
        Ok(FetchResponse { status, body })
    }
}

/// Parses a response body as JSON. Error pages often are not JSON, so a
/// non-2xx body that fails to parse becomes `Value::Null` and the caller still
/// sees the status.
fn parse_body(url: &str, status: u16, text: &str) -> Result<Value, FetchError> {
    match serde_json::from_str(text) {
        Ok(body) => Ok(body),
        Err(_) if !(200..300).contains(&status) => Ok(Value::Null),
        Err(source) => Err(FetchError::InvalidJson {
            url: url.to_string(),
            source,
        }),
    }
}
