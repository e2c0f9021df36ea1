use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// Field order below is alphabetical so the JSON has sorted keys.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRange {
    pub end_character: u32,
    pub end_line: u32,
    pub start_character: u32,
    pub start_line: u32,
}

/// An inline comment as sent for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Comment {
    Range { message: String, range: CommentRange },
    Line { line: u32, message: String },
}

/// An inline comment as supplied by the caller. Entries without a `line` or
/// `range` are ignored; `range` wins when both are set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileComment {
    pub filename: String,
    pub message: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub range: Option<CommentRange>,
}

impl FileComment {
    pub fn line(filename: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            message: message.into(),
            line: Some(line),
            range: None,
        }
    }

    pub fn range(filename: impl Into<String>, range: CommentRange, message: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            message: message.into(),
            line: None,
            range: Some(range),
        }
    }

    fn into_comment(self) -> Option<(String, Comment)> {
        let comment = match (self.range, self.line) {
            (Some(range), _) => Comment::Range {
                message: self.message,
                range,
            },
            (None, Some(line)) => Comment::Line {
                line,
                message: self.message,
            },
            (None, None) => return None,
        };

        Some((self.filename, comment))
    }
}

/// Review of a revision: cover message, label votes and inline comments.
///
/// Only built locally and serialized when posted; empty parts are left out
/// of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Review {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    comments: BTreeMap<String, Vec<Comment>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<String, i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
}

impl Review {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.message = message.into();
        self
    }

    /// Tags the review, e.g. `autogenerated:ci`.
    pub fn set_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn add_labels<I, K>(&mut self, labels: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, i32)>,
        K: Into<String>,
    {
        self.labels
            .extend(labels.into_iter().map(|(name, vote)| (name.into(), vote)));
        self
    }

    /// Comments on a file already present are appended, never replaced.
    pub fn add_comments<I>(&mut self, comments: I) -> &mut Self
    where
        I: IntoIterator<Item = FileComment>,
    {
        for (filename, comment) in comments.into_iter().filter_map(FileComment::into_comment) {
            self.comments.entry(filename).or_default().push(comment);
        }
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn labels(&self) -> &BTreeMap<String, i32> {
        &self.labels
    }

    pub fn comments(&self) -> &BTreeMap<String, Vec<Comment>> {
        &self.comments
    }

    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Error::from)
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Builds a review from loosely typed input such as
/// `{"message": "...", "labels": {"Verified": 1}, "comments": [{"filename": ..}]}`.
///
/// Comment entries without a `message` are skipped.
impl TryFrom<Value> for Review {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        let Value::Object(mut input) = value else {
            return Err(Error::Config("review must be a mapping".to_owned()));
        };

        let mut review = Review::new();

        match input.remove("message") {
            Some(Value::String(message)) => {
                review.set_message(message);
            }
            None | Some(Value::Null) => {}
            Some(_) => return Err(Error::Config("message must be a string".to_owned())),
        }

        match input.remove("tag") {
            Some(Value::String(tag)) => {
                review.set_tag(tag);
            }
            None | Some(Value::Null) => {}
            Some(_) => return Err(Error::Config("tag must be a string".to_owned())),
        }

        match input.remove("labels") {
            Some(Value::Object(labels)) => {
                let labels = labels
                    .into_iter()
                    .map(|(name, vote)| match vote.as_i64().and_then(|v| i32::try_from(v).ok()) {
                        Some(vote) => Ok((name, vote)),
                        None => Err(Error::Config(format!("vote for label {name} must be an integer"))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                review.add_labels(labels);
            }
            None | Some(Value::Null) => {}
            Some(_) => return Err(Error::Config("labels must be a mapping".to_owned())),
        }

        match input.remove("comments") {
            Some(Value::Array(comments)) => {
                let comments = comments
                    .into_iter()
                    .filter(|c| !matches!(c, Value::Object(entry) if !entry.contains_key("message")))
                    .map(|c| {
                        serde_json::from_value::<FileComment>(c)
                            .map_err(|e| Error::Config(format!("invalid comment: {e}")))
                    })
                    .collect::<Result<Vec<_>>>()?;
                review.add_comments(comments);
            }
            None | Some(Value::Null) => {}
            Some(_) => return Err(Error::Config("comments must be a list".to_owned())),
        }

        Ok(review)
    }
}
