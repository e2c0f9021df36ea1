use crate::core::auth::Auth;
use crate::core::config::Config;
use crate::core::decode::{decode_response, Body};
use crate::core::options::{Options, JSON_CONTENT_TYPE};
use crate::error::{Error, Result};
use crate::gerrit::review::Review;
use colored_json::to_colored_json_auto;
use reqwest::header::{self, HeaderMap};
use reqwest::{Method, StatusCode};
use tracing::{debug, info, Level};
use url::Url;

/// Path segment Gerrit serves authenticated endpoints under.
pub const GERRIT_AUTH_SUFFIX: &str = "/a";

/// Status, headers and final URL of a response whose body was already decoded.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: Url,
}

/// Blocking client for the Gerrit REST API.
///
/// Holds one `reqwest` session so connections are reused between calls. Not
/// meant to be shared between threads; give each thread its own client.
#[derive(Debug, Clone)]
pub struct RestClient {
    session: reqwest::blocking::Client,
    url: String,
    auth: Option<Auth>,
    defaults: Options,
}

impl RestClient {
    pub fn new(url: &str, auth: Option<Auth>, verify: bool) -> Result<Self> {
        if let Some(auth) = &auth {
            auth.validate()?;
        }

        let url = normalize_url(url, auth.is_some());
        Url::parse(&url).map_err(|e| Error::Config(format!("invalid url {url}: {e}")))?;

        let session = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(!verify)
            .build()?;

        Ok(Self {
            session,
            url,
            auth,
            defaults: Self::default_options(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut client = Self::new(config.url.as_str(), config.auth()?, config.verify)?;

        for (name, value) in &config.headers {
            client.defaults = client.defaults.header(name, value);
        }

        Ok(client)
    }

    fn default_options() -> Options {
        Options::new()
            .header(header::ACCEPT.as_str(), "application/json")
            .header(header::ACCEPT_ENCODING.as_str(), "gzip")
    }

    /// Normalized base URL, always ending with `/`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    pub fn make_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.url, endpoint.trim_start_matches('/'))
    }

    pub fn get(&self, endpoint: &str, options: Options) -> Result<Body> {
        self.send(Method::GET, endpoint, options).map(|(body, _)| body)
    }

    pub fn put(&self, endpoint: &str, options: Options) -> Result<Body> {
        self.send(Method::PUT, endpoint, options).map(|(body, _)| body)
    }

    pub fn post(&self, endpoint: &str, options: Options) -> Result<Body> {
        self.send(Method::POST, endpoint, options).map(|(body, _)| body)
    }

    pub fn delete(&self, endpoint: &str, options: Options) -> Result<Body> {
        self.send(Method::DELETE, endpoint, options).map(|(body, _)| body)
    }

    /// Sends a request and returns the decoded body along with the raw response.
    ///
    /// Call options are layered over the client defaults. Transport errors are
    /// returned as is; nothing is retried.
    pub fn send(&self, method: Method, endpoint: &str, options: Options) -> Result<(Body, RawResponse)> {
        let structured = if method == Method::GET {
            false
        } else {
            options.has_json_body(method == Method::DELETE)
        };

        let mut args = Options::new();
        if structured {
            args = args.header(header::CONTENT_TYPE.as_str(), JSON_CONTENT_TYPE);
        }
        args.merge(self.defaults.clone());
        args.merge(options);

        let url = self.make_url(endpoint);
        info!("{method} {url}");

        if let Some(body) = args.body().filter(|_| tracing::enabled!(Level::DEBUG)) {
            #[cfg(windows)]
            let _enabled = colored_json::enable_ansi_support();

            match to_colored_json_auto(body) {
                Ok(body) => debug!("{body}"),
                Err(e) => debug!("unprintable request body: {e}"),
            }
        }

        let mut request = self.session.request(method, url);
        if let Some(auth) = &self.auth {
            request = auth.apply(request);
        }

        let response = args.apply(request)?.send()?;

        let raw = RawResponse {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
        };

        Ok((decode_response(response)?, raw))
    }

    /// Posts `review` to the given revision of a change. The response is dropped.
    pub fn review(&self, change_id: &str, revision: &str, review: &Review) -> Result<()> {
        let endpoint = format!("changes/{change_id}/revisions/{revision}/review");

        self.post(
            &endpoint,
            Options::new()
                .header(header::CONTENT_TYPE.as_str(), JSON_CONTENT_TYPE)
                .data(review.to_string()),
        )?;

        Ok(())
    }
}

fn normalize_url(url: &str, authenticated: bool) -> String {
    let mut url = url.trim_end_matches('/').to_owned();

    if authenticated {
        if !url.ends_with(GERRIT_AUTH_SUFFIX) {
            url.push_str(GERRIT_AUTH_SUFFIX);
        }
    } else if let Some(stripped) = url.strip_suffix(GERRIT_AUTH_SUFFIX) {
        url = stripped.to_owned();
    }

    if !url.ends_with('/') {
        url.push('/');
    }

    url
}
