//! Configuration loading and data folder resolution
//!
//! Resolution follows the same priority order for both the config file and
//! the data folder:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file (data folder only) / per-user config directory
//! 4. Compiled default (fallback)
//!
//! A missing config file is never fatal: a warning is logged and compiled
//! defaults are used. A config file that exists but does not parse is an
//! error, since silently ignoring it would hide a typo.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "REVIEW_ENRICH_CONFIG";

/// Environment variable naming the data folder
pub const DATA_DIR_ENV_VAR: &str = "REVIEW_ENRICH_DATA_DIR";

/// Data folder used when nothing else is configured
pub const DEFAULT_DATA_DIR: &str = "data";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the JSONL inputs and outputs
    pub data_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
    pub musicbrainz: MusicBrainzConfig,
    pub review_source: ReviewSourceConfig,
    pub genres: GenrePolicy,
    /// Ordered tag rules replacing the built-in table when present
    pub genre_rules: Option<Vec<GenreRuleConfig>>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// File names of pipeline inputs and outputs
///
/// Relative names are resolved against the data folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub reviews: PathBuf,
    pub metadata: PathBuf,
    pub profiles: PathBuf,
    pub imputed: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            reviews: PathBuf::from("reviews.jsonl"),
            metadata: PathBuf::from("metadata.jsonl"),
            profiles: PathBuf::from("artist_profiles.json"),
            imputed: PathBuf::from("metadata_imputed.jsonl"),
        }
    }
}

/// MusicBrainz client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicBrainzConfig {
    pub base_url: String,
    /// User-Agent header (required by MusicBrainz)
    pub user_agent: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Number of candidates requested per search
    pub search_limit: u32,
    /// Minimum spacing between requests (MusicBrainz allows ~1 req/s)
    pub min_interval_ms: u64,
    /// Look up the credited artist after a release-group match
    pub artist_info: bool,
    pub retry: RetryConfig,
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            base_url: "https://musicbrainz.org/ws/2".to_string(),
            user_agent: get_user_agent(),
            timeout_secs: 10,
            search_limit: 5,
            min_interval_ms: 1000,
            artist_info: true,
            retry: RetryConfig::default(),
        }
    }
}

impl MusicBrainzConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Bounded exponential backoff for transient provider failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 8000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (0-based)
    ///
    /// `initial * multiplier^retry`, capped at `max_backoff_ms`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let millis = self.initial_backoff_ms as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff_ms as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Review-site request pacing, consumed by the scraping stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSourceConfig {
    /// ~2.5 requests/second
    pub min_interval_ms: u64,
}

impl Default for ReviewSourceConfig {
    fn default() -> Self {
        Self { min_interval_ms: 400 }
    }
}

/// Main-genre selection policy for artist profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenrePolicy {
    /// Minimum share of an artist's albums a genre must appear on
    pub min_genre_share: f64,
    /// Minimum albums with genres before an artist gets a profile
    pub min_artist_albums: usize,
}

impl Default for GenrePolicy {
    fn default() -> Self {
        Self {
            min_genre_share: 0.6,
            min_artist_albums: 1,
        }
    }
}

impl GenrePolicy {
    /// Album count a genre needs to be "main" for an artist with
    /// `total_albums` albums carrying genres (never below 1)
    pub fn threshold(&self, total_albums: usize) -> usize {
        let raw = (self.min_genre_share * total_albums as f64).ceil() as usize;
        raw.max(1)
    }
}

/// One `[[genre_rules]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreRuleConfig {
    /// Regular expression matched against a normalized tag
    pub pattern: String,
    /// Controlled-vocabulary genre assigned on match
    pub genre: String,
}

impl TomlConfig {
    /// Parse TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let share = self.genres.min_genre_share;
        if !(share > 0.0 && share <= 1.0) {
            return Err(Error::Config(format!(
                "genres.min_genre_share must be in (0, 1], got {}",
                share
            )));
        }
        if self.musicbrainz.retry.max_attempts == 0 {
            return Err(Error::Config(
                "musicbrainz.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.musicbrainz.retry.multiplier < 1.0 {
            return Err(Error::Config(format!(
                "musicbrainz.retry.multiplier must be >= 1.0, got {}",
                self.musicbrainz.retry.multiplier
            )));
        }
        if self.musicbrainz.search_limit == 0 {
            return Err(Error::Config(
                "musicbrainz.search_limit must be at least 1".to_string(),
            ));
        }
        if self.musicbrainz.user_agent.trim().is_empty() {
            return Err(Error::Config(
                "musicbrainz.user_agent must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolves the config file and data folder from CLI, ENV and defaults
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_config: Option<PathBuf>,
    cli_data_dir: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_config: Option<PathBuf>, cli_data_dir: Option<PathBuf>) -> Self {
        Self {
            cli_config,
            cli_data_dir,
        }
    }

    /// Locate the config file, if any
    pub fn config_path(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_config {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Per-user config directory
        dirs::config_dir()
            .map(|d| d.join("review-enrich").join("config.toml"))
            .filter(|p| p.exists())
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load(&self) -> Result<TomlConfig> {
        let Some(path) = self.config_path() else {
            info!("No config file found, using compiled defaults");
            return Ok(TomlConfig::default());
        };

        load_config_file(&path)
    }

    /// Resolve the data folder for this run
    pub fn data_dir(&self, config: &TomlConfig) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(dir) = &self.cli_data_dir {
            return dir.clone();
        }

        // Priority 2: Environment variable
        if let Ok(dir) = std::env::var(DATA_DIR_ENV_VAR) {
            if !dir.trim().is_empty() {
                return PathBuf::from(dir);
            }
        }

        // Priority 3: TOML config file
        if let Some(dir) = &config.data_dir {
            return dir.clone();
        }

        // Priority 4: Compiled default
        PathBuf::from(DEFAULT_DATA_DIR)
    }
}

/// Load a specific config file
///
/// Missing or unreadable → warning + defaults. Present but malformed → error.
pub fn load_config_file(path: &Path) -> Result<TomlConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Config file not readable, using compiled defaults"
            );
            return Ok(TomlConfig::default());
        }
    };

    let config = TomlConfig::from_toml_str(&content)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Resolved input/output file locations for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub reviews: PathBuf,
    pub metadata: PathBuf,
    pub profiles: PathBuf,
    pub imputed: PathBuf,
}

impl DataPaths {
    /// Join the configured file names onto `data_dir`
    ///
    /// Absolute file names are kept as-is.
    pub fn resolve(data_dir: &Path, paths: &PathsConfig) -> Self {
        Self {
            reviews: data_dir.join(&paths.reviews),
            metadata: data_dir.join(&paths.metadata),
            profiles: data_dir.join(&paths.profiles),
            imputed: data_dir.join(&paths.imputed),
        }
    }
}

/// Standard User-Agent for outgoing HTTP requests
pub fn get_user_agent() -> String {
    format!(
        "review-enrich/{} ( https://github.com/music-review/review-enrich )",
        env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 350,
            multiplier: 2.0,
        };
        assert_eq!(retry.backoff(0), Duration::from_millis(100));
        assert_eq!(retry.backoff(1), Duration::from_millis(200));
        assert_eq!(retry.backoff(2), Duration::from_millis(350));
        assert_eq!(retry.backoff(10), Duration::from_millis(350));
    }

    #[test]
    fn test_threshold_has_floor_of_one() {
        let policy = GenrePolicy {
            min_genre_share: 0.1,
            min_artist_albums: 1,
        };
        assert_eq!(policy.threshold(0), 1);
        assert_eq!(policy.threshold(3), 1);
        assert_eq!(policy.threshold(20), 2);
    }

    #[test]
    fn test_default_threshold() {
        let policy = GenrePolicy::default();
        assert_eq!(policy.threshold(2), 2);
        assert_eq!(policy.threshold(5), 3);
    }

    #[test]
    fn test_user_agent_format() {
        let ua = get_user_agent();
        assert!(ua.starts_with("review-enrich/"));
        assert!(ua.contains("github.com"));
    }
}
