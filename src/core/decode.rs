use crate::error::{Error, Result};
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;

/// Anti-XSSI prefix Gerrit puts in front of every JSON response body.
pub const GERRIT_MAGIC_JSON_PREFIX: &str = ")]}'\n";

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    /// Trimmed body of a response that was not declared as `application/json`.
    Text(String),
}

impl Body {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            Body::Json(_) => None,
        }
    }

    pub fn into_json(self) -> Result<Value> {
        match self {
            Body::Json(value) => Ok(value),
            Body::Text(text) => Err(Error::UnexpectedBody(text)),
        }
    }

    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.into_json()?).map_err(Error::from)
    }
}

pub fn decode_response(response: reqwest::blocking::Response) -> Result<Body> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);

    // `text()` honours the charset declared in the content type.
    let text = response.text()?;

    decode(status, content_type.as_deref(), &text)
}

/// Status is checked before the content type, so an error response is reported
/// as such even when it carries a valid JSON body.
pub fn decode(status: StatusCode, content_type: Option<&str>, text: &str) -> Result<Body> {
    let content = text.trim();

    if status.is_client_error() || status.is_server_error() {
        return Err(Error::Status {
            status,
            body: content.to_owned(),
        });
    }

    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if !mime.eq_ignore_ascii_case("application/json") {
        return Ok(Body::Text(content.to_owned()));
    }

    let content = content
        .strip_prefix(GERRIT_MAGIC_JSON_PREFIX)
        .unwrap_or(content);

    serde_json::from_str(content).map(Body::Json).map_err(|e| {
        error!("Invalid json content: {content}");
        Error::Json(e)
    })
}
