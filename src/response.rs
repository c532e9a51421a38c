use serde_json::Value;
use std::borrow::Cow;

/// Response body, decoded or passed through depending on the `json` setting
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Body decoded as JSON
    Json(Value),
    /// Body exactly as received
    Raw(String),
}

/// ApiResponse is the `(status code, body)` pair delivered for every request
/// the server answered, whatever its status.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response payload
    pub body: Body,
}

impl ApiResponse {
    /// Build a response from the received payload, decoding it when `json` is set
    pub fn from_payload(status: u16, payload: String, json: bool) -> crate::error::Result<Self> {
        let body = if json {
            match serde_json::from_str(&payload) {
                Ok(value) => Body::Json(value),
                Err(e) => return Err(crate::error::ApiError::parse(status, payload, e)),
            }
        } else {
            Body::Raw(payload)
        };

        Ok(ApiResponse { status, body })
    }

    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The decoded JSON body, if decoding was requested
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            Body::Raw(_) => None,
        }
    }

    /// The body as text: the payload as received, or the serialized JSON
    /// for a decoded body
    pub fn raw(&self) -> Cow<'_, str> {
        match &self.body {
            Body::Raw(text) => Cow::Borrowed(text.as_str()),
            Body::Json(value) => Cow::Owned(value.to_string()),
        }
    }

    /// Consume the response and return its body
    pub fn into_body(self) -> Body {
        self.body
    }

    /// Apply unmarshals the JSON body into the provided type.
    /// A raw body is treated as a JSON string value.
    pub fn apply<T>(&self) -> Result<T, crate::error::ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        match &self.body {
            Body::Json(value) => serde_json::from_value(value.clone()).map_err(|e| e.into()),
            Body::Raw(text) => {
                serde_json::from_value(Value::String(text.clone())).map_err(|e| e.into())
            }
        }
    }

    /// Get a value from the JSON body by a slash-separated path.
    /// For example, "stream/channel/name" walks nested objects and
    /// "streams/0" indexes into arrays.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut current = self.json()?;

        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(arr) => {
                    let index: usize = part.parse().ok()?;
                    arr.get(index)?
                }
                _ => return None,
            };
        }

        Some(current)
    }

    /// Get a string value from the JSON body by a slash-separated path
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get(path).and_then(|v| v.as_str().map(|s| s.to_string()))
    }
}
