use super::GerritClient;
use crate::core::decode::Body;
use crate::core::options::Options;
use crate::error::Result;
use crate::normalize::quote_plus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ACTIVE, READ_ONLY or HIDDEN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug)]
pub struct Project<'a> {
    gerrit: &'a GerritClient,
    info: ProjectInfo,
}

impl<'a> Project<'a> {
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &ProjectInfo {
        &self.info
    }

    /// Content of `filepath` at the tip of `branch`, base64 encoded by the server.
    pub fn get_content(&self, branch: &str, filepath: &str) -> Result<Body> {
        let url = format!(
            "projects/{}/branches/{}/files/{}/content",
            quote_plus(self.name()),
            quote_plus(branch),
            quote_plus(filepath),
        );

        self.gerrit.http_client.get(&url, Options::new())
    }
}

impl GerritClient {
    pub fn get_project(&self, name: &str) -> Result<Project<'_>> {
        let info: ProjectInfo = self
            .http_client
            .get(&format!("projects/{}", quote_plus(name)), Options::new())?
            .deserialize()?;

        Ok(Project { gerrit: self, info })
    }
}
