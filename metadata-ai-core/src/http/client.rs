//! HTTP client implementation using reqwest

use crate::config::{ClientConfig, SecretString};
use crate::error::{AiSdkError, AiSdkResult};
use crate::http::error::map_http_error;
use crate::http::{ByteStream, HttpExecutor, RequestOptions, RetryExecutor, RetryPolicy};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

/// Maximum unary response size
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

const JSON_CONTENT_TYPE: &str = "application/json";
const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Shared HTTP client with connection pooling
///
/// Nothing in here is mutated after construction, so one instance can serve
/// any number of concurrent callers.
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    base_url: Url,
    token: SecretString,

    /// Default per-attempt timeout
    timeout: Duration,

    retry: RetryExecutor,

    /// Maximum response size to prevent OOM
    max_response_size: usize,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token)
            .field("timeout", &self.timeout)
            .field("retry", self.retry.policy())
            .finish()
    }
}

impl HttpClient {
    /// Create a new HTTP client from a validated configuration
    pub fn new(config: &ClientConfig) -> AiSdkResult<Self> {
        config.validate().map_err(crate::config::ConfigError::from)?;

        let base_url = Url::parse(config.base_host()).map_err(|e| {
            crate::config::ConfigError::Invalid {
                message: format!("invalid host '{}': {}", config.host, e),
            }
        })?;

        let client = ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .gzip(true)
            .build()
            .map_err(|e| AiSdkError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            base_url,
            token: config.token.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            retry: RetryExecutor::new(config.retry.clone()),
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.retry.policy()
    }

    /// Build the full URL, percent-encoding each path segment
    fn build_url(&self, options: &RequestOptions) -> AiSdkResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AiSdkError::Config(crate::config::ConfigError::Invalid {
                    message: format!("host '{}' cannot be used as a base URL", self.base_url),
                })
            })?;
            segments.pop_if_empty();
            segments.extend(options.path.iter());
        }

        if !options.query.is_empty() {
            url.query_pairs_mut().extend_pairs(options.query.iter());
        }

        Ok(url)
    }

    fn request_builder(
        &self,
        options: &RequestOptions,
        url: Url,
        accept: &'static str,
        request_id: Uuid,
    ) -> RequestBuilder {
        let mut builder = self
            .client
            .request(options.method.clone(), url)
            .bearer_auth(self.token.expose_secret())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, accept)
            .header("X-Request-ID", request_id.to_string());

        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        builder
    }

    /// Check response size to prevent OOM
    fn check_content_length(&self, response: &Response) -> AiSdkResult<()> {
        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_size {
                return Err(AiSdkError::Parse(format!(
                    "Response size {} exceeds maximum {}",
                    content_length, self.max_response_size
                )));
            }
        }

        Ok(())
    }

    async fn error_from_response(
        &self,
        response: Response,
        options: &RequestOptions,
        request_id: Uuid,
    ) -> AiSdkError {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.ok();

        warn!(
            "Request to {} failed with status {} [request_id: {}]",
            options.display_path(),
            status,
            request_id
        );

        map_http_error(
            status,
            Some(&headers),
            body,
            &options.context,
            &options.display_path(),
            request_id,
        )
    }

    /// One attempt of a unary call
    async fn attempt_json(&self, options: &RequestOptions, attempt: u32) -> AiSdkResult<Value> {
        // Fresh correlation id per attempt
        let request_id = Uuid::new_v4();
        let url = self.build_url(options)?;

        info!(
            "Executing HTTP request {} {} (attempt {}) [request_id: {}]",
            options.method,
            options.display_path(),
            attempt + 1,
            request_id
        );
        debug!("Request URL: {}", url);

        let response = self
            .request_builder(options, url, JSON_CONTENT_TYPE, request_id)
            .timeout(options.timeout.unwrap_or(self.timeout))
            .send()
            .await
            .map_err(|e| {
                let err = AiSdkError::from_reqwest(e);
                warn!("Request error: {} [request_id: {}]", err, request_id);
                err
            })?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            return Err(self.error_from_response(response, options, request_id).await);
        }

        self.check_content_length(&response)?;

        let body = response.bytes().await.map_err(AiSdkError::from_reqwest)?;

        // Check response size after reading
        if body.len() > self.max_response_size {
            return Err(AiSdkError::Parse(format!(
                "Response size {} exceeds maximum {} [request_id: {}]",
                body.len(),
                self.max_response_size,
                request_id
            )));
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        let value = serde_json::from_slice(&body).map_err(|e| {
            error!(
                "Failed to parse response from {} [request_id: {}]: {}",
                options.display_path(),
                request_id,
                e
            );
            AiSdkError::Parse(format!("Invalid response format: {} [request_id: {}]", e, request_id))
        })?;

        info!("Request completed successfully [request_id: {}]", request_id);
        Ok(value)
    }
}

#[async_trait]
impl HttpExecutor for HttpClient {
    async fn execute_json(&self, options: RequestOptions) -> AiSdkResult<Value> {
        let options = &options;
        self.retry
            .execute(move |attempt| self.attempt_json(options, attempt))
            .await
    }

    async fn execute_stream(&self, options: RequestOptions) -> AiSdkResult<ByteStream> {
        let request_id = Uuid::new_v4();
        let url = self.build_url(&options)?;

        info!(
            "Opening event stream {} {} [request_id: {}]",
            options.method,
            options.display_path(),
            request_id
        );

        // Bounds the header phase and then each body read, not the whole run
        let timeout = options.timeout.unwrap_or(self.timeout);
        let send = self
            .request_builder(&options, url, EVENT_STREAM_CONTENT_TYPE, request_id)
            .send();

        let response = match tokio::time::timeout(timeout, send).await {
            Ok(result) => result.map_err(AiSdkError::from_reqwest)?,
            Err(_) => {
                warn!("Stream request timed out [request_id: {}]", request_id);
                return Err(AiSdkError::Timeout);
            }
        };

        let status = response.status();
        debug!("Stream response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            return Err(self.error_from_response(response, &options, request_id).await);
        }

        let mut body = Box::pin(response.bytes_stream());
        let stream = async_stream::stream! {
            loop {
                match tokio::time::timeout(timeout, body.next()).await {
                    Ok(Some(chunk)) => {
                        yield chunk.map_err(AiSdkError::from_reqwest);
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(
                            "Event stream idle for {:?}, giving up [request_id: {}]",
                            timeout, request_id
                        );
                        yield Err(AiSdkError::Timeout);
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(host: &str) -> HttpClient {
        HttpClient::new(&ClientConfig::new(host, "tok")).unwrap()
    }

    #[test]
    fn test_build_url_encodes_segments() {
        let client = client("https://metadata.example.com/");
        let options = RequestOptions::post(["api", "v1", "agents", "dynamic", "name", "Sales Bot/v2", "invoke"]);
        let url = client.build_url(&options).unwrap();
        assert_eq!(
            url.as_str(),
            "https://metadata.example.com/api/v1/agents/dynamic/name/Sales%20Bot%2Fv2/invoke"
        );
    }

    #[test]
    fn test_build_url_keeps_host_prefix_and_query() {
        let client = client("https://example.com/proxy");
        let options = RequestOptions::get(["api", "v1", "agents"])
            .with_query("apiEnabled", true)
            .with_query("limit", 5);
        let url = client.build_url(&options).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/proxy/api/v1/agents?apiEnabled=true&limit=5"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = client("https://metadata.example.com");
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("tok\""));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = HttpClient::new(&ClientConfig::new("not a url", "tok"));
        assert!(matches!(result, Err(AiSdkError::Config(_))));
    }
}
