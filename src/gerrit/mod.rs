pub mod change;
pub mod project;
pub mod query;
pub mod review;

use crate::core::auth::Auth;
use crate::core::client::RestClient;
use crate::core::config::Config;
use crate::error::Result;

/// Gerrit client authenticating with an HTTP username/password pair.
///
/// Domain calls live next to the resources they return: projects in
/// [`project`], changes in [`change`].
#[derive(Debug, Clone)]
pub struct GerritClient {
    pub http_client: RestClient,
}

impl GerritClient {
    pub fn new(url: &str, username: &str, password: &str) -> Result<Self> {
        Self::with_auth(url, Auth::basic(username, Some(password)))
    }

    pub fn with_auth(url: &str, auth: Auth) -> Result<Self> {
        Ok(Self {
            http_client: RestClient::new(url, Some(auth), true)?,
        })
    }

    /// Anonymous access is allowed when the config carries no credentials.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            http_client: RestClient::from_config(config)?,
        })
    }
}
