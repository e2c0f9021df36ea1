//! Blocking client for the Gerrit code review REST API.
//!
//! [`RestClient`] sends requests and decodes Gerrit's `)]}'`-prefixed JSON.
//! [`GerritClient`] adds typed helpers returning [`Project`] and [`Change`]
//! wrappers, and [`Review`] builds review input.
//!
//! ```no_run
//! use gerrit_rest::{ChangeQuery, GerritClient, Review};
//!
//! # fn main() -> gerrit_rest::Result<()> {
//! let gerrit = GerritClient::new("https://review.example.com", "jdoe", "http-password")?;
//!
//! let query = ChangeQuery::builder().project("demo").status("open").build().unwrap();
//! for mut change in gerrit.query_changes(&query)? {
//!     let mut review = Review::with_message("Build passed");
//!     review.add_labels([("Verified", 1)]);
//!     change.add_review(&review)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod gerrit;
pub mod normalize;

pub use crate::core::auth::Auth;
pub use crate::core::client::{RawResponse, RestClient, GERRIT_AUTH_SUFFIX};
pub use crate::core::config::Config;
pub use crate::core::decode::{Body, GERRIT_MAGIC_JSON_PREFIX};
pub use crate::core::options::Options;
pub use crate::error::{Error, Result};
pub use crate::gerrit::change::{Change, ChangeInfo, FileInfo, RevisionInfo};
pub use crate::gerrit::project::{Project, ProjectInfo};
pub use crate::gerrit::query::{ChangeQuery, QueryOption, DEFAULT_QUERY_OPTIONS};
pub use crate::gerrit::review::{Comment, CommentRange, FileComment, Review};
pub use crate::gerrit::GerritClient;
