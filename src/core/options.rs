use crate::core::merge::merge_dict;
use crate::error::Result;
use reqwest::blocking::RequestBuilder;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::warn;

pub const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Per-request options, kept as a JSON mapping so client defaults and call
/// options can be layered with [`merge_dict`].
///
/// Recognized keys: `headers`, `params`, `json`, `data` and `timeout`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options(Map<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header names are lowercased so overrides match regardless of case.
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into().to_ascii_lowercase();
        self.nested("headers", name, Value::String(value.into()))
    }

    pub fn param(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.nested("params", name.into(), Value::String(value.into()))
    }

    /// Repeated query parameter, e.g. `o=LABELS&o=MESSAGES`.
    pub fn params<I, S>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(|v| Value::String(v.into())).collect();
        self.nested("params", name.into(), Value::Array(values))
    }

    pub fn json(self, body: Value) -> Self {
        self.with("json", body)
    }

    /// Raw request body. A string is sent verbatim, an object is sent JSON encoded.
    pub fn data(self, body: impl Into<Value>) -> Self {
        self.with("data", body.into())
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        self.with("timeout", Value::from(timeout.as_secs_f64()))
    }

    pub fn merge(&mut self, overrides: Options) {
        merge_dict(&mut self.0, overrides.0);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Whether the options carry a body that should be sent as JSON.
    ///
    /// `any_data` also counts a plain string `data` body, which is how deletes
    /// are treated.
    pub(crate) fn has_json_body(&self, any_data: bool) -> bool {
        if self.0.contains_key("json") {
            return true;
        }

        match self.0.get("data") {
            Some(Value::Object(_)) => true,
            Some(_) => any_data,
            None => false,
        }
    }

    pub(crate) fn body(&self) -> Option<&Value> {
        self.0.get("json").or_else(|| self.0.get("data"))
    }

    pub(crate) fn apply(self, mut request: RequestBuilder) -> Result<RequestBuilder> {
        // Keys are sorted, so headers are set before a `json` body and its
        // default content type.
        for (key, value) in self.0 {
            request = match (key.as_str(), value) {
                ("headers", Value::Object(headers)) => headers
                    .into_iter()
                    .fold(request, |r, (name, value)| r.header(name, value_to_string(value))),
                ("params", Value::Object(params)) => request.query(&query_pairs(params)),
                ("json", body) => request.json(&body),
                ("data", Value::String(body)) => request.body(body),
                ("data", body) => request.body(serde_json::to_string(&body)?),
                ("timeout", Value::Number(secs)) => match secs.as_f64() {
                    Some(secs) if secs.is_finite() && secs >= 0.0 => {
                        request.timeout(Duration::from_secs_f64(secs))
                    }
                    _ => {
                        warn!("Ignoring invalid timeout {secs}");
                        request
                    }
                },
                (other, _) => {
                    warn!("Ignoring unsupported request option `{other}`");
                    request
                }
            };
        }

        Ok(request)
    }

    fn with(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.to_owned(), value);
        self
    }

    fn nested(mut self, key: &str, name: String, value: Value) -> Self {
        let mut inner = Map::new();
        inner.insert(name, value);

        let mut overlay = Map::new();
        overlay.insert(key.to_owned(), Value::Object(inner));

        merge_dict(&mut self.0, overlay);
        self
    }
}

impl From<Map<String, Value>> for Options {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn query_pairs(params: Map<String, Value>) -> Vec<(String, String)> {
    params
        .into_iter()
        .flat_map(|(name, value)| match value {
            Value::Array(values) => values
                .into_iter()
                .map(|v| (name.clone(), value_to_string(v)))
                .collect::<Vec<_>>(),
            Value::Null => Vec::new(),
            value => vec![(name, value_to_string(value))],
        })
        .collect()
}
