//! Fetch transport implementations
//!
//! The pipeline retrieves resources through the [`Transport`] trait and
//! must not care whether bytes came from a plain HTTP request or a scripted
//! full-page render. Both implementations enforce the configured response
//! size ceiling: an advertised content length at or above the ceiling is
//! rejected before any body is read, and the HTTP implementation also caps
//! the bytes it will actually accumulate while streaming.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

/// A fetched resource
#[derive(Debug)]
pub struct Fetched {
    /// HTTP status code (a rendered page reports the navigation status)
    pub status: u16,
    /// Content length advertised by the server, when present
    pub advertised_len: Option<u64>,
    /// The body bytes actually received
    pub body: Vec<u8>,
    /// Whether the body read ended early relative to the advertised length
    pub truncated: bool,
}

/// Errors from the fetch transport
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Response advertises {advertised} bytes, ceiling is {limit}")]
    TooLarge { advertised: u64, limit: u64 },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Browser failure: {0}")]
    Browser(String),

    #[error("Request timed out")]
    Timeout,
}

/// Transport contract consumed by the fetch stage
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError>;
}

/// Plain HTTP transport backed by reqwest
pub struct HttpTransport {
    client: Client,
    max_response_size: u64,
}

impl HttpTransport {
    /// Builds the transport with a configured per-request timeout and
    /// response size ceiling
    pub fn new(timeout: Duration, max_response_size: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("trawler/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            max_response_size,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Request(e)
            }
        })?;

        // The status is recorded on the content row rather than acted on;
        // an error page still carries fingerprintable bytes and links.
        let status = response.status();

        // Reject oversized responses before downloading anything.
        let advertised_len = response.content_length();
        if let Some(len) = advertised_len {
            if len >= self.max_response_size {
                return Err(FetchError::TooLarge {
                    advertised: len,
                    limit: self.max_response_size,
                });
            }
        }

        let mut body: Vec<u8> = Vec::new();
        let mut truncated = false;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    if body.len() as u64 + bytes.len() as u64 >= self.max_response_size {
                        return Err(FetchError::TooLarge {
                            advertised: body.len() as u64 + bytes.len() as u64,
                            limit: self.max_response_size,
                        });
                    }
                    body.extend_from_slice(&bytes);
                }
                // Keep whatever arrived; the caller records the short read.
                Err(_) => {
                    truncated = true;
                    break;
                }
            }
        }

        Ok(Fetched {
            status: status.as_u16(),
            advertised_len,
            body,
            truncated,
        })
    }
}

/// Scripted-browser transport backed by a headless Chromium instance
///
/// Used when plain HTTP fetching is not enough (script-rendered pages).
/// The serialized DOM after navigation is returned as the body; the
/// renderer does not expose an advertised length.
pub struct BrowserTransport {
    browser: Browser,
    _handler: JoinHandle<()>,
    timeout: Duration,
    max_response_size: u64,
}

impl BrowserTransport {
    /// Launches a headless browser and its CDP event handler task
    pub async fn launch(
        timeout: Duration,
        max_response_size: u64,
    ) -> Result<Self, FetchError> {
        let config = BrowserConfig::builder()
            .request_timeout(timeout)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio")
            .build()
            .map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                }
            }
        });

        Ok(Self {
            browser,
            _handler: handler_task,
            timeout,
            max_response_size,
        })
    }
}

#[async_trait]
impl Transport for BrowserTransport {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        let render = async {
            let page = self
                .browser
                .new_page(url.as_str())
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;
            let html = page
                .content()
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;
            let _ = page.close().await;
            Ok::<String, FetchError>(html)
        };

        let html = tokio::time::timeout(self.timeout, render)
            .await
            .map_err(|_| FetchError::Timeout)??;

        let body = html.into_bytes();
        if body.len() as u64 >= self.max_response_size {
            return Err(FetchError::TooLarge {
                advertised: body.len() as u64,
                limit: self.max_response_size,
            });
        }

        Ok(Fetched {
            status: 200,
            advertised_len: None,
            body,
            truncated: false,
        })
    }
}
