use crate::normalize::normalize_query_value;
use derive_builder::Builder;
use derive_more::Display;
use std::fmt;
use url::form_urlencoded;

/// Extra detail requested from `GET /changes/` (the `o` parameter).
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum QueryOption {
    #[display(fmt = "LABELS")]
    Labels,
    #[display(fmt = "DETAILED_LABELS")]
    DetailedLabels,
    #[display(fmt = "CURRENT_REVISION")]
    CurrentRevision,
    #[display(fmt = "ALL_REVISIONS")]
    AllRevisions,
    #[display(fmt = "CURRENT_COMMIT")]
    CurrentCommit,
    #[display(fmt = "ALL_COMMITS")]
    AllCommits,
    #[display(fmt = "CURRENT_FILES")]
    CurrentFiles,
    #[display(fmt = "ALL_FILES")]
    AllFiles,
    #[display(fmt = "DETAILED_ACCOUNTS")]
    DetailedAccounts,
    #[display(fmt = "MESSAGES")]
    Messages,
    #[display(fmt = "CURRENT_ACTIONS")]
    CurrentActions,
    #[display(fmt = "SUBMITTABLE")]
    Submittable,
    #[display(fmt = "{}", _0)]
    Custom(String),
}

pub const DEFAULT_QUERY_OPTIONS: [QueryOption; 3] = [
    QueryOption::CurrentRevision,
    QueryOption::CurrentCommit,
    QueryOption::CurrentFiles,
];

/// Search for changes. Unset or empty filters are left out of the query.
///
/// ```
/// use gerrit_rest::ChangeQuery;
///
/// let query = ChangeQuery::builder()
///     .project("demo")
///     .status("open")
///     .term("label", "Code-Review=2")
///     .build()
///     .unwrap();
///
/// assert_eq!(query.to_string(), "project:demo status:open label:Code-Review=2");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Builder)]
#[builder(default, setter(into, strip_option))]
pub struct ChangeQuery {
    change: Option<String>,
    project: Option<String>,
    branch: Option<String>,
    message: Option<String>,
    status: Option<String>,
    topic: Option<String>,
    owner: Option<String>,
    #[builder(setter(custom))]
    terms: Vec<(String, String)>,
    /// `None` requests [`DEFAULT_QUERY_OPTIONS`].
    options: Option<Vec<QueryOption>>,
}

impl ChangeQueryBuilder {
    /// Any other search operator, e.g. `term("reviewer", "self")`.
    pub fn term(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.terms
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }
}

impl ChangeQuery {
    pub fn builder() -> ChangeQueryBuilder {
        ChangeQueryBuilder::default()
    }

    /// Query matching a single change by number or Change-Id.
    pub fn change(id: impl Into<String>) -> Self {
        Self {
            change: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn options(&self) -> Vec<QueryOption> {
        self.options
            .clone()
            .unwrap_or_else(|| DEFAULT_QUERY_OPTIONS.to_vec())
    }

    pub fn endpoint(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());

        for option in self.options() {
            query.append_pair("o", &option.to_string());
        }
        query.append_pair("q", &self.to_string());

        format!("changes/?{}", query.finish())
    }
}

impl fmt::Display for ChangeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let named = [
            ("change", &self.change),
            ("project", &self.project),
            ("branch", &self.branch),
            ("message", &self.message),
            ("status", &self.status),
            ("topic", &self.topic),
            ("owner", &self.owner),
        ];

        let terms: Vec<String> = named
            .into_iter()
            .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
            .chain(self.terms.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{key}:{}", normalize_query_value(value)))
            .collect();

        write!(f, "{}", terms.join(" "))
    }
}
