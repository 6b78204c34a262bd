use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::SplitError;

pub const DEFAULT_SUFFIX: &str = "Configuration";
const METADATA_BUILDERS_USING: &str = "using Microsoft.EntityFrameworkCore.Metadata.Builders;";

/// What replaces a removed block in the `DbContext`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMode {
    /// `modelBuilder.ApplyConfiguration(new XConfiguration());` where the block was.
    #[default]
    Inline,
    /// All blocks removed, one group of `ApplyConfiguration` calls where the first one was.
    Aggregate,
    /// Blocks removed, nothing inserted.
    None,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub suffix: String,
    pub indent_unit: String,
    pub receiver: String,
    pub extension: String,
    /// Added to every generated unit, besides the copied `using`s and the context namespace.
    pub extra_usings: Vec<String>,
    pub reference_mode: ReferenceMode,
    pub backup: bool,
    pub embed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            indent_unit: "    ".to_string(),
            receiver: "modelBuilder".to_string(),
            extension: "cs".to_string(),
            extra_usings: vec![METADATA_BUILDERS_USING.to_string()],
            reference_mode: ReferenceMode::Inline,
            backup: true,
            embed: false,
        }
    }
}

/// Per-run settings: the resolved `Config` plus the paths and overrides of one invocation.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub config: Config,
    /// Where generated units go. `None` means next to the `DbContext` file.
    pub output_dir: Option<PathBuf>,
    /// Namespace of standalone units. `None` means the `DbContext`'s namespace.
    pub namespace: Option<String>,
    pub dry_run: bool,
}

impl SplitOptions {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            output_dir: None,
            namespace: None,
            dry_run: false,
        }
    }
}

/// Loads the configuration from `explicit_path`, or from the XDG config file if one exists.
/// Missing fields, and a missing XDG file, fall back to defaults.
pub fn load(explicit_path: Option<&Path>) -> Result<Config, SplitError> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.is_file() => path,
            _ => {
                debug!("no config file, using defaults");
                return Ok(Config::default());
            }
        },
    };

    let config_string = fs::read_to_string(&path).map_err(|source| SplitError::Read {
        path: path.clone(),
        source,
    })?;
    let mut config: Config = toml::from_str(&config_string).map_err(|e| SplitError::Config {
        path: path.clone(),
        message: e.to_string(),
    })?;

    // An empty value in the file means "use the default", not "use nothing".
    let default_config = Config::default();
    if config.suffix.is_empty() {
        config.suffix = default_config.suffix;
    }
    if config.indent_unit.is_empty() {
        config.indent_unit = default_config.indent_unit;
    }
    if config.receiver.is_empty() {
        config.receiver = default_config.receiver;
    }
    if config.extension.is_empty() {
        config.extension = default_config.extension;
    }

    debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    xdg::BaseDirectories::with_prefix("dbcontext-splitter").find_config_file("config.toml")
}
