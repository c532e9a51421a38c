use crate::client::{create_rest_client, Config, Options, Params, Replacements};
use crate::error::{ApiError, Result};
use crate::response::ApiResponse;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use std::thread;
use std::time::Instant;
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

/// Header carrying the application client ID
pub const CLIENT_ID_HEADER: &str = "client-id";

/// Replace every `:<key>` in `path` with its mapped value.
///
/// Keys are applied in insertion order, so a value that itself looks like
/// `:token` is only substituted again by a later key. Values are inserted
/// verbatim; [`build_url`] refuses values that would form a `.` or `..`
/// path segment.
pub fn substitute_tokens(path: &str, replacements: &Replacements) -> String {
    let mut path = path.to_string();
    for (key, value) in replacements {
        path = path.replace(&format!(":{}", key), value);
    }
    path
}

/// URL parsing collapses these, percent-encoded or not
fn is_dot_segment(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | ".%2e" | "%2e." | "%2e%2e"
    )
}

fn check_replacements(path: &str, replacements: &Replacements) -> Result<()> {
    for (key, value) in replacements {
        if is_dot_segment(value) && path.contains(&format!(":{}", key)) {
            return Err(ApiError::RequestBuild(format!(
                "replacement for :{} would change the resource path: {:?}",
                key, value
            )));
        }
    }
    Ok(())
}

/// Serialize query parameters as `application/x-www-form-urlencoded`.
///
/// Arrays repeat the key once per element; `null` and objects encode as an
/// empty value. Spaces become `+` and every byte outside `*-._` and
/// alphanumerics is percent-encoded.
pub fn encode_query(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                for item in items {
                    serializer.append_pair(key, &param_text(item));
                }
            }
            other => {
                serializer.append_pair(key, &param_text(other));
            }
        }
    }
    serializer.finish()
}

fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Assemble `api_base + substituted path + optional "?query"`
pub fn build_url(config: &Config, path: &str) -> Result<Url> {
    check_replacements(path, &config.replacements)?;

    let mut url = format!(
        "{}{}",
        config.api_base,
        substitute_tokens(path, &config.replacements)
    );

    let query = encode_query(&config.params);
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    Ok(Url::parse(&url)?)
}

/// Build the Accept, Client-ID and (optional) Authorization headers
pub fn build_headers(config: &Config) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, header_value("Accept", &config.accept_header())?);
    headers.insert(
        HeaderName::from_static(CLIENT_ID_HEADER),
        header_value("Client-ID", &config.client_id)?,
    );

    if let Some(authorization) = config.authorization_header() {
        let mut value = header_value("Authorization", &authorization)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ApiError::RequestBuild(format!("invalid {} header: {}", name, e)))
}

/// Build URL and headers for one request and log its dispatch
pub(crate) fn prepare(config: &Config, path: &str) -> Result<(Url, HeaderMap)> {
    let url = build_url(config, path)?;
    let headers = build_headers(config)?;

    debug!(
        url = %url,
        authorized = headers.contains_key(AUTHORIZATION),
        "dispatching request"
    );

    Ok((url, headers))
}

pub(crate) fn transport_failure(url: &Url, error: reqwest::Error) -> ApiError {
    warn!(url = %url, error = %error, "transport failure");
    ApiError::Transport(error)
}

/// Turn a received payload into the delivered response
pub(crate) fn complete(
    url: &Url,
    start: Instant,
    status: u16,
    payload: String,
    json: bool,
) -> Result<ApiResponse> {
    debug!(
        url = %url,
        status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    ApiResponse::from_payload(status, payload, json).map_err(|e| {
        warn!(url = %url, status, error = %e, "response body is not valid JSON");
        e
    })
}

/// Perform one GET for an already merged configuration
fn dispatch(client: &Client, config: &Config, path: &str) -> Result<ApiResponse> {
    let (url, headers) = prepare(config, path)?;

    let start = Instant::now();
    let http_response = client
        .get(url.clone())
        .headers(headers)
        .send()
        .map_err(|e| transport_failure(&url, e))?;

    let status = http_response.status().as_u16();
    let payload = http_response.text()?;

    complete(&url, start, status, payload, config.json)
}

/// Client for the Kraken REST API.
///
/// Holds its own default [`Config`]; every call overlays [`Options`] on a copy
/// of it, so concurrent calls share no mutable state.
#[derive(Debug, Clone)]
pub struct TwitchApi {
    /// HTTP client
    pub client: Client,
    /// Default configuration
    pub config: Config,
}

impl TwitchApi {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a new client with custom default configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(TwitchApi {
            client: create_rest_client()?,
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

    /// Make a blocking GET request to `path`
    ///
    /// # Arguments
    /// * `path` - API resource, e.g. `/streams/:channel`
    /// * `options` - Overlay on top of the client defaults
    ///
    /// # Returns
    /// The status code and body for any answered request, including non-2xx ones
    pub fn request(&self, path: &str, options: &Options) -> Result<ApiResponse> {
        let config = self.config.overlay(options);
        dispatch(&self.client, &config, path)
    }

    /// Issue a request in the background and hand the outcome to `callback`.
    ///
    /// The callback runs exactly once, on a worker thread, after the transport
    /// resolves. Returns `self` so calls can be chained.
    pub fn api<F>(&self, path: &str, options: Options, callback: F) -> &Self
    where
        F: FnOnce(Result<ApiResponse>) + Send + 'static,
    {
        let client = self.client.clone();
        let config = self.config.overlay(&options);
        let path = path.to_string();

        thread::spawn(move || {
            let result = dispatch(&client, &config, &path);
            callback(result);
        });

        self
    }

    /// Same as [`TwitchApi::api`] with no options
    pub fn get<F>(&self, path: &str, callback: F) -> &Self
    where
        F: FnOnce(Result<ApiResponse>) + Send + 'static,
    {
        self.api(path, Options::new(), callback)
    }
}

/// Convenience function to create a default client and make a request
pub fn request(path: &str, options: &Options) -> Result<ApiResponse> {
    TwitchApi::new()?.request(path, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn replacements(pairs: &[(&str, &str)]) -> Replacements {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitute_without_placeholders_is_noop() {
        let map = replacements(&[("channel", "test_user")]);
        assert_eq!(substitute_tokens("/streams/featured", &map), "/streams/featured");
        assert_eq!(
            substitute_tokens("/streams/featured", &Replacements::new()),
            "/streams/featured"
        );
    }

    #[test]
    fn test_substitute_replaces_every_occurrence() {
        let map = replacements(&[("user", "alice"), ("target", "bob")]);
        assert_eq!(
            substitute_tokens("/users/:user/follows/channels/:target/:user", &map),
            "/users/alice/follows/channels/bob/alice"
        );
    }

    #[test]
    fn test_substitute_leaves_unknown_tokens() {
        let map = replacements(&[("channel", "test_user")]);
        assert_eq!(
            substitute_tokens("/channels/:channel/videos/:id", &map),
            "/channels/test_user/videos/:id"
        );
    }

    #[test]
    fn test_encode_query() {
        let mut params = Params::new();
        params.insert("limit".to_string(), json!(5));
        params.insert("offset".to_string(), json!(10));
        params.insert("hls".to_string(), json!(true));
        params.insert("game".to_string(), json!("Star Craft & more"));
        assert_eq!(
            encode_query(&params),
            "limit=5&offset=10&hls=true&game=Star+Craft+%26+more"
        );
    }

    #[test]
    fn test_encode_query_arrays_and_null() {
        let mut params = Params::new();
        params.insert("channel".to_string(), json!(["a", "b"]));
        params.insert("cursor".to_string(), json!(null));
        assert_eq!(encode_query(&params), "channel=a&channel=b&cursor=");
    }

    #[test]
    fn test_encode_query_escapes_reserved_characters() {
        let mut params = Params::new();
        params.insert("q".to_string(), json!("a b!(c)~*'"));
        assert_eq!(encode_query(&params), "q=a+b%21%28c%29%7E*%27");
    }

    #[test]
    fn test_encode_query_empty() {
        assert_eq!(encode_query(&Params::new()), "");
    }

    #[test]
    fn test_build_url_with_params() {
        let config = Config::default().overlay(
            &Options::new()
                .replace("channel", "test_user")
                .param("limit", 5),
        );
        let url = build_url(&config, "/streams/:channel").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.twitch.tv/kraken/streams/test_user?limit=5"
        );
    }

    #[test]
    fn test_build_url_without_params_has_no_question_mark() {
        let url = build_url(&Config::default(), "/streams/featured").unwrap();
        assert_eq!(url.as_str(), "https://api.twitch.tv/kraken/streams/featured");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_build_url_rejects_dot_segment_replacements() {
        for value in ["..", ".", "%2E%2e", ".%2e"] {
            let config =
                Config::default().overlay(&Options::new().replace("channel", value));
            let err = build_url(&config, "/streams/:channel").unwrap_err();
            assert!(
                matches!(err, ApiError::RequestBuild(_)),
                "{:?} should be refused, got {:?}",
                value,
                err
            );
        }
    }

    #[test]
    fn test_build_url_ignores_unused_dot_replacement() {
        let config = Config::default().overlay(&Options::new().replace("channel", ".."));
        let url = build_url(&config, "/streams/featured").unwrap();
        assert_eq!(url.as_str(), "https://api.twitch.tv/kraken/streams/featured");
    }

    #[test]
    fn test_build_url_keeps_dotted_names() {
        let config = Config::default().overlay(&Options::new().replace("channel", "a..b"));
        let url = build_url(&config, "/streams/:channel").unwrap();
        assert_eq!(url.as_str(), "https://api.twitch.tv/kraken/streams/a..b");
    }

    #[test]
    fn test_build_url_invalid_base() {
        let config = Config::default().with_api_base("not a url");
        let err = build_url(&config, "/streams").unwrap_err();
        assert!(matches!(err, ApiError::UrlParse(_)));
    }

    #[test]
    fn test_build_headers_without_access_key() {
        let headers = build_headers(&Config::default()).unwrap();
        assert_eq!(
            headers.get(ACCEPT).unwrap(),
            "application/vnd.twitchtv.v2+json"
        );
        assert_eq!(headers.get(CLIENT_ID_HEADER).unwrap(), "");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_build_headers_with_access_key() {
        let config = Config::default()
            .with_access_key("abc123")
            .with_client_id("my-app");
        let headers = build_headers(&config).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "OAuth abc123");
        assert_eq!(headers.get(CLIENT_ID_HEADER).unwrap(), "my-app");
    }

    #[test]
    fn test_build_headers_rejects_invalid_value() {
        let config = Config::default().with_client_id("bad\nid");
        let err = build_headers(&config).unwrap_err();
        assert!(matches!(err, ApiError::RequestBuild(_)));
    }

    #[test]
    fn test_twitch_api_creation() {
        let api = TwitchApi::new().unwrap().with_client_id("my-app");
        assert_eq!(api.defaults().api_base, "https://api.twitch.tv/kraken");
        assert_eq!(api.defaults().client_id, "my-app");
    }

    #[test]
    fn test_defaults_mut() {
        let mut api = TwitchApi::new().unwrap();
        api.defaults_mut().api_version = "5".to_string();
        assert_eq!(api.defaults().accept_header(), "application/vnd.twitchtv.v5+json");
    }
}
