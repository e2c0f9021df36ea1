use crate::error::{Error, Result};
use reqwest::blocking::RequestBuilder;
use serde::Deserialize;

/// Credential scheme attached to every request of an authenticated client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum Auth {
    /// HTTP basic auth with the Gerrit HTTP password.
    Basic {
        username: String,
        password: Option<String>,
    },
    /// OAuth / access token.
    Bearer { token: String },
}

impl Auth {
    pub fn basic(username: impl Into<String>, password: Option<impl Into<String>>) -> Self {
        Auth::Basic {
            username: username.into(),
            password: password.map(Into::into),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Auth::Bearer {
            token: token.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Auth::Basic { username, .. } if username.trim().is_empty() => Err(Error::Config(
                "basic auth requires a non-empty username".to_owned(),
            )),
            Auth::Bearer { token } if token.trim().is_empty() => Err(Error::Config(
                "bearer auth requires a non-empty token".to_owned(),
            )),
            _ => Ok(()),
        }
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::Basic { username, password } => request.basic_auth(username, password.as_ref()),
            Auth::Bearer { token } => request.bearer_auth(token),
        }
    }
}
