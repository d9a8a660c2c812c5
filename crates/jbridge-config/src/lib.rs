//! Project manifest parsing (jbridge.toml)
//!
//! The manifest carries a single `[jvm]` table:
//!
//! ```toml
//! [jvm]
//! java-version = "17"
//! classpath = ["lib/app.jar", "build/classes"]
//!
//! [jvm.deps]
//! maven = ["org.slf4j:slf4j-api:2.0.9"]
//! ```
//!
//! Every key is optional. [`Config::discover`] never fails: a missing or
//! broken manifest yields the defaults.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Manifest file name searched for by [`Config::discover`]
pub const MANIFEST_NAME: &str = "jbridge.toml";

/// Java version used when the manifest does not name one
pub const DEFAULT_JAVA_VERSION: &str = "17";

/// Errors that can occur while reading a manifest
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read manifest file
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid manifest: {0}")]
    ValidationError(String),
}

/// Whole manifest file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
struct Manifest {
    #[serde(default)]
    jvm: Config,
}

/// JVM settings for a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Java major version used to locate `libjvm` (default: "17")
    #[serde(default = "default_java_version")]
    pub java_version: String,

    /// Classpath entries, in order (jars, directories, or `dir/*`)
    #[serde(default)]
    pub classpath: Vec<String>,

    /// Dependency declarations, grouped by source. Kept verbatim; jbridge
    /// itself does not resolve them.
    #[serde(default)]
    pub deps: BTreeMap<String, Vec<String>>,
}

fn default_java_version() -> String {
    DEFAULT_JAVA_VERSION.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            java_version: default_java_version(),
            classpath: Vec::new(),
            deps: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load and validate the `[jvm]` table of a manifest file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse and validate manifest text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.jvm.validate()?;
        Ok(manifest.jvm)
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.java_version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "java-version cannot be empty".to_string(),
            ));
        }
        if self.java_version.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
            return Err(ConfigError::ValidationError(format!(
                "invalid java-version: {:?}",
                self.java_version
            )));
        }
        if let Some(entry) = self.classpath.iter().find(|e| e.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "empty classpath entry: {:?}",
                entry
            )));
        }
        Ok(())
    }

    /// Nearest manifest at or above `start`, if any.
    pub fn find_manifest(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(MANIFEST_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Settings for the project containing `start`.
    ///
    /// Searches `start` and its ancestors for [`MANIFEST_NAME`]. Falls back
    /// to [`Config::default`] when none exists or it cannot be read.
    pub fn discover(start: &Path) -> Self {
        let Some(path) = Self::find_manifest(start) else {
            debug!("No {} found above {}, using defaults", MANIFEST_NAME, start.display());
            return Self::default();
        };

        match Self::from_file(&path) {
            Ok(config) => {
                debug!("Loaded JVM settings from {}", path.display());
                config.resolve_relative_to(path.parent().unwrap_or(start))
            }
            Err(e) => {
                warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Anchor relative classpath entries at `base`.
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        for entry in &mut self.classpath {
            let path = Path::new(entry.as_str());
            if path.is_relative() {
                *entry = base.join(path).to_string_lossy().into_owned();
            }
        }
        self
    }

    /// Classpath entries as paths
    pub fn classpath_entries(&self) -> Vec<PathBuf> {
        self.classpath.iter().map(PathBuf::from).collect()
    }

    /// Classpath joined with the platform separator (`;` on Windows, `:`
    /// elsewhere), as `-Djava.class.path` expects.
    pub fn classpath_string(&self) -> String {
        self.classpath.join(classpath_separator())
    }
}

/// Separator between classpath entries on this platform
pub fn classpath_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}
