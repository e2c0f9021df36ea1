use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use gerrit_rest::Config as GerritConfig;
use std::path::{Path, PathBuf};

/// `$XDG_CONFIG_HOME/gerrit/config.yaml` on Linux.
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gerrit").map(|dirs| dirs.config_dir().join("config.yaml"))
}

/// Loads the connection settings from the config file, then `GERRIT_*`
/// environment variables (e.g. `GERRIT_URL`, `GERRIT_USERNAME`).
pub fn load(path: Option<&Path>) -> Result<GerritConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(false));
    }

    builder
        .add_source(Environment::with_prefix("GERRIT"))
        .build()?
        .try_deserialize()
}
