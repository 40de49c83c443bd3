//! # Configuration Management Module
//!
//! Holds the immutable `BuildConfig` resolved once at startup and shared by
//! reference with every worker.
//!
//! ## Parameters:
//! - `source_root`: project root containing `Assets/` and `PostBuildCopy*/`
//! - `configuration`: Debug or Release, selects `bin/<configuration>/`
//! - `target`: platform the textures are compressed for (default: desktop)
//! - `quality`: encoder quality, 0 = fastest, 1 = slowest (default: 0)
//! - `deflate_level`: zstd supercompression level 1-22 (default: 10)
//! - `generate_mips` / `transcode` / `supercompress`: pipeline stages
//! - `force_rebuild`: ignore timestamps and rebuild every texture
//! - `normal_identifiers`: file-name substrings marking normal maps
//! - `jobs`: number of parallel workers (default: 8)
//! - `ci`: non-interactive mode (no live display, ASCII glyphs)
//!
//! ## Validation:
//! - quality must be within 0-1
//! - deflate_level must be within 1-22
//! - jobs must be > 0
//! - the source root must be an existing directory
//!
//! All of these are checked before discovery starts; a running build never
//! sees an invalid configuration.
//!
//! ## Example:
//! ```rust
//! use asset_baker::config::{BuildConfig, Target};
//!
//! let mut config = BuildConfig::for_project("MyGame");
//! config.target = Target::Web;
//! config.jobs = 4;
//! assert!(config.destination_root().ends_with("bin/Debug/MyGame"));
//! ```

use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the directory (under the source root) receiving error logs
pub const LOG_DIR_NAME: &str = "Logs";

/// Default normal-map identifier
pub const DEFAULT_NORMAL_IDENTIFIER: &str = "normal";

/// Target platform for texture compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    Desktop,
    LegacyDesktop,
    Web,
    Ios,
    Android,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Target::Desktop => "desktop",
            Target::LegacyDesktop => "legacy-desktop",
            Target::Web => "web",
            Target::Ios => "ios",
            Target::Android => "android",
        };
        f.write_str(name)
    }
}

/// Build configuration the baked assets are placed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Configuration {
    #[value(name = "Debug")]
    Debug,
    #[value(name = "Release")]
    Release,
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Configuration::Debug => f.write_str("Debug"),
            Configuration::Release => f.write_str("Release"),
        }
    }
}

/// Configuration for one asset build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Project root being built
    pub source_root: PathBuf,
    /// Debug or Release
    pub configuration: Configuration,
    /// Name used for the output folder instead of the project directory name
    pub override_name: Option<String>,
    /// Target platform for texture compression
    pub target: Target,
    /// Encoder quality (0.0-1.0)
    pub quality: f32,
    /// Zstandard supercompression level (1-22)
    pub deflate_level: u8,
    /// Generate the full mip chain
    pub generate_mips: bool,
    /// Transcode into a GPU-specific block format
    pub transcode: bool,
    /// Apply Zstandard supercompression to produced containers
    pub supercompress: bool,
    /// Rebuild textures even when they are up to date
    pub force_rebuild: bool,
    /// Substrings identifying normal maps (case-insensitive)
    pub normal_identifiers: Vec<String>,
    /// Number of parallel jobs
    pub jobs: usize,
    /// Non-interactive mode
    pub ci: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            configuration: Configuration::Debug,
            override_name: None,
            target: Target::Desktop,
            quality: 0.0,
            deflate_level: 10,
            generate_mips: true,
            transcode: true,
            supercompress: true,
            force_rebuild: false,
            normal_identifiers: vec![DEFAULT_NORMAL_IDENTIFIER.to_string()],
            jobs: 8,
            ci: false,
        }
    }
}

impl BuildConfig {
    /// Default configuration for the project rooted at `source_root`
    pub fn for_project(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            ..Default::default()
        }
    }

    /// Name of the baked output folder
    pub fn project_name(&self) -> String {
        if let Some(name) = self.override_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        self.source_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    }

    /// `<source>/bin/<configuration>/<project>`
    pub fn destination_root(&self) -> PathBuf {
        self.source_root
            .join("bin")
            .join(self.configuration.to_string())
            .join(self.project_name())
    }

    /// Directory receiving the per-run error logs
    pub fn log_dir(&self) -> PathBuf {
        self.source_root.join(LOG_DIR_NAME)
    }

    /// Normal-map identifiers, falling back to the default when none are configured
    pub fn effective_normal_identifiers(&self) -> Vec<String> {
        if self.normal_identifiers.is_empty() {
            vec![DEFAULT_NORMAL_IDENTIFIER.to_string()]
        } else {
            self.normal_identifiers.clone()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), BuildError> {
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(BuildError::InvalidConfig(
                "Quality level must be between 0 and 1".to_string(),
            ));
        }

        if !(1..=22).contains(&self.deflate_level) {
            return Err(BuildError::InvalidConfig(
                "Deflate level must be between 1 and 22".to_string(),
            ));
        }

        if self.jobs == 0 {
            return Err(BuildError::InvalidConfig(
                "Number of jobs must be greater than 0".to_string(),
            ));
        }

        if !self.source_root.is_dir() {
            return Err(BuildError::MissingInput(self.source_root.clone()));
        }

        Ok(())
    }

    /// Load configuration from a JSON file, falling back to defaults when it does not exist
    pub async fn from_file(path: &Path) -> Result<Self, BuildError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: BuildConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub async fn save_to_file(&self, path: &Path) -> Result<(), BuildError> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
