use crate::core::auth::Auth;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;

/// Connection settings for a Gerrit server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub url: Url,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Set to `false` to skip TLS certificate verification.
    #[serde(default = "default_verify")]
    pub verify: bool,
    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_verify() -> bool {
    true
}

impl Config {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            username: None,
            password: None,
            token: None,
            verify: true,
            headers: BTreeMap::new(),
        }
    }

    pub fn auth(&self) -> Result<Option<Auth>> {
        match (&self.username, &self.password, &self.token) {
            (None, None, None) => Ok(None),
            (Some(username), password, None) => Ok(Some(Auth::basic(username, password.clone()))),
            (None, None, Some(token)) => Ok(Some(Auth::bearer(token))),
            (None, Some(_), _) => Err(Error::Config("password given without username".to_owned())),
            (Some(_), _, Some(_)) => Err(Error::Config(
                "username and token are mutually exclusive".to_owned(),
            )),
        }
    }
}
