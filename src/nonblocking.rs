//! Async variant of [`crate::TwitchApi`], available with the `async` feature.
//!
//! Request assembly is shared with the blocking client; only the transport
//! and the completion delivery differ.

use crate::client::{create_async_client, Config, Options};
use crate::error::{ApiError, Result};
use crate::response::ApiResponse;
use crate::rest::{complete, prepare, transport_failure};
use reqwest::Client;
use std::thread;
use std::time::Instant;
use tokio::runtime::Handle;

async fn dispatch(client: &Client, config: &Config, path: &str) -> Result<ApiResponse> {
    let (url, headers) = prepare(config, path)?;

    let start = Instant::now();
    let http_response = client
        .get(url.clone())
        .headers(headers)
        .send()
        .await
        .map_err(|e| transport_failure(&url, e))?;

    let status = http_response.status().as_u16();
    let payload = http_response.text().await?;

    complete(&url, start, status, payload, config.json)
}

/// Async client for the Kraken REST API
#[derive(Debug, Clone)]
pub struct AsyncTwitchApi {
    /// HTTP client
    pub client: Client,
    /// Default configuration
    pub config: Config,
}

impl AsyncTwitchApi {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a new client with custom default configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(AsyncTwitchApi {
            client: create_async_client()?,
            config,
        })
    }

    /// Set the client ID sent with every request
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = client_id.into();
        self
    }

    /// Default configuration used by every call
    pub fn defaults(&self) -> &Config {
        &self.config
    }

    /// Mutable access to the defaults, affecting subsequent calls only
    pub fn defaults_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Make a GET request to `path`
    pub async fn request(&self, path: &str, options: &Options) -> Result<ApiResponse> {
        let config = self.config.overlay(options);
        dispatch(&self.client, &config, path).await
    }

    /// Spawn the request on the current tokio runtime and hand the outcome
    /// to `callback` exactly once.
    ///
    /// Outside of a runtime the callback receives [`ApiError::Runtime`] on a
    /// worker thread instead.
    pub fn api<F>(&self, path: &str, options: Options, callback: F) -> &Self
    where
        F: FnOnce(Result<ApiResponse>) + Send + 'static,
    {
        let client = self.client.clone();
        let config = self.config.overlay(&options);
        let path = path.to_string();

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let result = dispatch(&client, &config, &path).await;
                    callback(result);
                });
            }
            Err(e) => {
                let error = ApiError::Runtime(e.to_string());
                thread::spawn(move || callback(Err(error)));
            }
        }

        self
    }
}
