use super::query::ChangeQuery;
use super::review::Review;
use super::GerritClient;
use crate::core::decode::Body;
use crate::core::options::Options;
use crate::error::{Error, Result};
use crate::normalize::quote_plus;
use chrono::NaiveDateTime;
use globset::Glob;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Gerrit timestamps are UTC, `2013-02-01 09:59:32.126000000`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    /// A(dded), D(eleted), R(enamed), C(opied), W(rewritten); absent when modified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_inserted: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_deleted: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_delta: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionInfo {
    #[serde(rename = "_number", default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<BTreeMap<String, FileInfo>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Change attributes as returned by the server. Fields not modelled here are
/// kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeInfo {
    #[serde(rename = "_number")]
    pub number: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub change_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subject: String,
    /// NEW, MERGED or ABANDONED.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revisions: Option<BTreeMap<String, RevisionInfo>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChangeInfo {
    pub fn updated_at(&self) -> Option<NaiveDateTime> {
        self.updated
            .as_deref()
            .and_then(|ts| NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok())
    }

    /// Shallow overlay: every top-level key present in `fresh` replaces ours.
    fn overlay(&mut self, fresh: ChangeInfo) -> Result<()> {
        let mut current: Map<String, Value> = serde_json::from_value(serde_json::to_value(&*self)?)?;
        let fresh: Map<String, Value> = serde_json::from_value(serde_json::to_value(fresh)?)?;

        current.extend(fresh);
        *self = serde_json::from_value(Value::Object(current))?;

        Ok(())
    }
}

/// A change on the server, bound to the client that fetched it.
pub struct Change<'a> {
    gerrit: &'a GerritClient,
    info: ChangeInfo,
}

impl<'a> Change<'a> {
    pub(crate) fn new(gerrit: &'a GerritClient, info: ChangeInfo) -> Self {
        Self { gerrit, info }
    }

    pub fn info(&self) -> &ChangeInfo {
        &self.info
    }

    pub fn into_info(self) -> ChangeInfo {
        self.info
    }

    /// Legacy numeric id, used in every change endpoint.
    pub fn id(&self) -> String {
        self.info.number.to_string()
    }

    pub fn change_id(&self) -> &str {
        &self.info.change_id
    }

    pub fn status(&self) -> &str {
        &self.info.status
    }

    /// Current patch set sha. Needs `CURRENT_REVISION` or `ALL_REVISIONS`.
    pub fn revision(&self) -> Result<&str> {
        self.info
            .current_revision
            .as_deref()
            .ok_or(Error::MissingField("current_revision"))
    }

    /// Files touched by the current patch set. Needs `CURRENT_FILES` as well.
    pub fn files(&self) -> Result<&BTreeMap<String, FileInfo>> {
        let revision = self.revision()?;

        self.info
            .revisions
            .as_ref()
            .and_then(|revisions| revisions.get(revision))
            .and_then(|r| r.files.as_ref())
            .ok_or(Error::MissingField("files"))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("changes/{}/{path}", self.id())
    }

    pub fn rebase(&self) -> Result<Body> {
        self.gerrit.http_client.post(&self.endpoint("rebase"), Options::new())
    }

    pub fn abandon(&self) -> Result<Body> {
        self.gerrit.http_client.post(&self.endpoint("abandon"), Options::new())
    }

    pub fn submit(&self) -> Result<Body> {
        self.gerrit.http_client.post(&self.endpoint("submit"), Options::new())
    }

    pub fn publish(&self) -> Result<Body> {
        self.gerrit.http_client.post(&self.endpoint("publish"), Options::new())
    }

    pub fn get_topic(&self) -> Result<Body> {
        self.gerrit.http_client.get(&self.endpoint("topic"), Options::new())
    }

    pub fn set_topic(&self, topic: &str) -> Result<Body> {
        self.gerrit
            .http_client
            .put(&self.endpoint("topic"), Options::new().json(json!({ "topic": topic })))
    }

    pub fn delete_topic(&self) -> Result<Body> {
        self.gerrit.http_client.delete(&self.endpoint("topic"), Options::new())
    }

    /// Content of `filename` in the current patch set, base64 encoded.
    pub fn get_file_content(&self, filename: &str) -> Result<Body> {
        let path = format!(
            "revisions/{}/files/{}/content",
            self.revision()?,
            quote_plus(filename)
        );

        self.gerrit.http_client.get(&self.endpoint(&path), Options::new())
    }

    /// Content of every file in the current patch set matching `glob`.
    pub fn get_files_changed(&self, glob: &str) -> Result<BTreeMap<String, Body>> {
        let matcher = Glob::new(glob)?.compile_matcher();

        self.files()?
            .keys()
            .filter(|name| matcher.is_match(name.as_str()))
            .map(|name| self.get_file_content(name).map(|body| (name.clone(), body)))
            .collect()
    }

    pub fn change_file_content_in_edit(&self, filename: &str, content: impl Into<String>) -> Result<Body> {
        let path = format!("edit/{}", quote_plus(filename));

        self.gerrit
            .http_client
            .put(&self.endpoint(&path), Options::new().data(content.into()))
    }

    pub fn delete_file_in_edit(&self, filename: &str) -> Result<Body> {
        let path = format!("edit/{}", quote_plus(filename));

        self.gerrit.http_client.delete(&self.endpoint(&path), Options::new())
    }

    pub fn publish_edit(&self) -> Result<Body> {
        self.gerrit.http_client.post(&self.endpoint("edit:publish"), Options::new())
    }

    pub fn delete_edit(&self) -> Result<Body> {
        self.gerrit.http_client.delete(&self.endpoint("edit"), Options::new())
    }

    /// `reviewer` is an account id, email, username or group name.
    pub fn add_reviewer(&self, reviewer: &str) -> Result<Body> {
        self.gerrit
            .http_client
            .post(&self.endpoint("reviewers"), Options::new().json(json!({ "reviewer": reviewer })))
    }

    /// Reviews the current patch set, reloading first in case a new one was
    /// uploaded since this change was fetched.
    pub fn add_review(&mut self, review: &Review) -> Result<Body> {
        self.reload()?;

        let path = format!("revisions/{}/review", self.revision()?);

        self.gerrit
            .http_client
            .post(&self.endpoint(&path), Options::new().json(review.to_json()?))
    }

    /// Re-fetches the change and overlays the server state onto this one.
    pub fn reload(&mut self) -> Result<()> {
        let id = self.id();
        let fresh = self
            .gerrit
            .get_change(&ChangeQuery::change(id.as_str()))?
            .ok_or(Error::ChangeNotFound(id))?;

        debug!("reloaded change {} at {:?}", fresh.id(), fresh.info.current_revision);

        self.info.overlay(fresh.into_info())
    }
}

impl fmt::Display for Change<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Change-Id {}", self.change_id())
    }
}

impl fmt::Debug for Change<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Change").field("info", &self.info).finish()
    }
}

impl GerritClient {
    /// Changes matching `query`, in the order the server returns them
    /// (most recently updated first by default).
    pub fn query_changes(&self, query: &ChangeQuery) -> Result<Vec<Change<'_>>> {
        let changes: Vec<ChangeInfo> = self
            .http_client
            .get(&query.endpoint(), Options::new())?
            .deserialize()?;

        Ok(changes
            .into_iter()
            .map(|info| Change::new(self, info))
            .collect())
    }

    pub fn get_change(&self, query: &ChangeQuery) -> Result<Option<Change<'_>>> {
        Ok(self.query_changes(query)?.into_iter().next())
    }

    /// Creates a change. `optional` fields (`topic`, `status`, `base_change`,
    /// ...) are added to the request and win over the required ones.
    pub fn create_change(
        &self,
        project: &str,
        branch: &str,
        subject: &str,
        optional: Map<String, Value>,
    ) -> Result<Change<'_>> {
        let mut args = Map::new();
        args.insert("project".to_owned(), Value::from(project));
        args.insert("branch".to_owned(), Value::from(branch));
        args.insert("subject".to_owned(), Value::from(subject));
        args.extend(optional);

        let info: ChangeInfo = self
            .http_client
            .post("changes/", Options::new().json(Value::Object(args)))?
            .deserialize()?;

        Ok(Change::new(self, info))
    }
}
