use crate::error::{ApiError, Result};
use indexmap::IndexMap;
use reqwest::blocking::{Client, ClientBuilder};
use serde_json::Value;
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "https://api.twitch.tv/kraken";

/// Default API version sent in the Accept header
pub const DEFAULT_API_VERSION: &str = "2";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Query parameters, serialized in insertion order.
/// Values are expected to be JSON primitives (or arrays of them).
pub type Params = IndexMap<String, Value>;

/// Path token replacements, applied in insertion order.
pub type Replacements = IndexMap<String, String>;

/// Create the blocking HTTP client used for API requests
pub fn create_rest_client() -> Result<Client> {
    ClientBuilder::new()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(ApiError::ClientBuild)
}

/// Create the async HTTP client used by [`crate::nonblocking::AsyncTwitchApi`]
#[cfg(feature = "async")]
pub fn create_async_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(ApiError::ClientBuild)
}

/// Request configuration.
///
/// A client holds one `Config` as its defaults; each call overlays its
/// [`Options`] on a copy of it, so the defaults are never touched by a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// OAuth access key, sent as `Authorization: OAuth <key>` when set
    pub access_key: Option<String>,
    /// Base URL every path is appended to
    pub api_base: String,
    /// API version, encoded into the Accept header
    pub api_version: String,
    /// Whether the response body is decoded as JSON
    pub json: bool,
    /// Query parameters
    pub params: Params,
    /// `:token` replacements for the path
    pub replacements: Replacements,
    /// Application client ID, always sent (possibly empty)
    pub client_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            access_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            json: true,
            params: Params::new(),
            replacements: Replacements::new(),
            client_id: String::new(),
        }
    }
}

impl Config {
    /// Set the access key
    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the API version
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Set JSON decoding of response bodies
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Set default query parameters
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Set default path replacements
    pub fn with_replacements(mut self, replacements: Replacements) -> Self {
        self.replacements = replacements;
        self
    }

    /// Set the client ID
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Produce the configuration for a single request.
    ///
    /// Every field present in `options` replaces the default wholesale;
    /// maps are not merged key by key.
    pub fn overlay(&self, options: &Options) -> Config {
        Config {
            access_key: options
                .access_key
                .clone()
                .or_else(|| self.access_key.clone()),
            api_base: options
                .api_base
                .clone()
                .unwrap_or_else(|| self.api_base.clone()),
            api_version: options
                .api_version
                .clone()
                .unwrap_or_else(|| self.api_version.clone()),
            json: options.json.unwrap_or(self.json),
            params: options
                .params
                .clone()
                .unwrap_or_else(|| self.params.clone()),
            replacements: options
                .replacements
                .clone()
                .unwrap_or_else(|| self.replacements.clone()),
            client_id: options
                .client_id
                .clone()
                .unwrap_or_else(|| self.client_id.clone()),
        }
    }

    /// Value of the Accept header for the configured API version
    pub fn accept_header(&self) -> String {
        format!("application/vnd.twitchtv.v{}+json", self.api_version)
    }

    /// Value of the Authorization header, if an access key is configured
    pub fn authorization_header(&self) -> Option<String> {
        self.access_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(|key| format!("OAuth {}", key))
    }
}

/// Per-call overlay on top of a client's [`Config`]. Unset fields inherit the default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    /// Access key override
    pub access_key: Option<String>,
    /// API base URL override
    pub api_base: Option<String>,
    /// API version override
    pub api_version: Option<String>,
    /// JSON decoding override
    pub json: Option<bool>,
    /// Query parameters, replacing the default map
    pub params: Option<Params>,
    /// Path replacements, replacing the default map
    pub replacements: Option<Replacements>,
    /// Client ID override
    pub client_id: Option<String>,
}

impl Options {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this access key for the call.
    ///
    /// An empty key sends no `Authorization` header, which is how a call
    /// drops a key configured in the defaults.
    pub fn access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    /// Send the call to another API base URL
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Request another API version
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Decode the body as JSON or return it raw
    pub fn json(mut self, json: bool) -> Self {
        self.json = Some(json);
        self
    }

    /// Replace the whole parameter map
    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Add a single query parameter to this overlay's parameter map
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the whole replacement map
    pub fn replacements(mut self, replacements: Replacements) -> Self {
        self.replacements = Some(replacements);
        self
    }

    /// Add a single `:token` replacement to this overlay
    pub fn replace(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.replacements
            .get_or_insert_with(Replacements::new)
            .insert(token.into(), value.into());
        self
    }

    /// Send another client ID
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}
