use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Repo {
    repo: git2::Repository,
}

fn normalize_path(path: Option<&Path>) -> std::io::Result<PathBuf> {
    match path {
        Some(p) => p.canonicalize(),
        None => std::env::current_dir(),
    }
}

/// Gerrit project name from a remote url, e.g. `platform/build` for
/// `https://review.example.com/a/platform/build.git`.
fn project_name(remote_url: &str) -> Option<String> {
    let path = match url::Url::parse(remote_url) {
        Ok(url) => url.path().to_owned(),
        // scp-like syntax: `user@host:platform/build.git`
        Err(_) => remote_url.split_once(':').map(|(_, path)| path)?.to_owned(),
    };

    let path = path.trim_matches('/');
    let path = path.strip_prefix("a/").unwrap_or(path);
    let path = path.strip_suffix(".git").unwrap_or(path);

    (!path.is_empty()).then(|| path.to_owned())
}

/// Value of the last `Change-Id:` footer of a commit message.
pub fn change_id_from_message(message: &str) -> Option<&str> {
    message
        .lines()
        .rev()
        .filter_map(|line| line.trim().strip_prefix("Change-Id:"))
        .map(str::trim)
        .find(|id| id.starts_with('I') && id.len() > 1)
}

impl Repo {
    pub fn new(path: Option<&Path>) -> Result<Self> {
        let path = normalize_path(path)?;
        let repo = git2::Repository::discover(&path)
            .with_context(|| format!("No git repository at {}", path.display()))?;

        Ok(Self { repo })
    }

    pub fn get_name(&self, remote_name: Option<&str>) -> Result<String> {
        let remote = self.repo.find_remote(remote_name.unwrap_or("origin"))?;
        let url = remote.url().context("Remote url contains non-utf8 symbols")?;

        debug!("remote url {url}");

        project_name(url).context("Cannot get project name from remote url")
    }

    pub fn head_change_id(&self) -> Result<String> {
        let commit = self.repo.head()?.peel_to_commit()?;
        let message = commit.message().context("Commit message contains non-utf8 symbols")?;

        change_id_from_message(message)
            .map(ToOwned::to_owned)
            .context("HEAD commit has no Change-Id footer")
    }
}
