use crate::config::FeedConfig;
use futures::stream::StreamExt;
use reqwest::redirect::Policy;
use thiserror::Error;

/// Errors that can occur while downloading the feed.
///
/// None of these are retried: a failed fetch fails the refresh that
/// triggered it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
    /// Response body exceeded the configured size limit
    #[error("Response too large (limit {0} bytes)")]
    ResponseTooLarge(usize),
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Maximum redirect hops followed for a feed request. Podcast hosts commonly
/// bounce through one or two CDN redirects.
const MAX_REDIRECTS: usize = 5;

/// Builds the HTTP client shared by every feed request.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .redirect(redirect_policy())
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .tcp_keepalive(std::time::Duration::from_secs(60))
        .build()
}

fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error(format!("Too many redirects (max {})", MAX_REDIRECTS));
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Downloads the raw feed document.
///
/// Issues a single GET to `feed.url`. The timeout covers the whole exchange,
/// from connecting to reading the last body byte.
///
/// # Errors
///
/// - [`FetchError::Timeout`] - the exchange took longer than `feed.timeout_secs`
/// - [`FetchError::Network`] - connection, TLS or body stream errors
/// - [`FetchError::HttpStatus`] - any non-2xx status
/// - [`FetchError::ResponseTooLarge`] - body larger than `feed.max_bytes`
/// - [`FetchError::IncompleteResponse`] - body shorter than `Content-Length`
pub async fn fetch_feed(client: &reqwest::Client, feed: &FeedConfig) -> Result<Vec<u8>, FetchError> {
    let request = async {
        let response = client.get(&feed.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, feed.max_bytes).await
    };

    let bytes = tokio::time::timeout(feed.timeout(), request)
        .await
        .map_err(|_| FetchError::Timeout(feed.timeout_secs))??;

    tracing::debug!(url = %feed.url, bytes = bytes.len(), "Fetched feed");
    Ok(bytes)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    // Network interruptions mid-body leave us short of Content-Length
    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
