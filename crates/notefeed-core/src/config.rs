//! Engine configuration
//!
//! Loaded from TOML; every field has a default so a partial file (or none)
//! is valid.
//!
//! ```toml
//! max_depth = 2
//! lookup_timeout_ms = 3000
//! engagement_staleness_ms = 30000
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Resolution, engagement and cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Depth at which reference nodes stop fetching
    pub max_depth: usize,
    /// Per-call timeout for reference lookups
    pub lookup_timeout_ms: u64,
    /// Staleness window for looked-up items
    pub lookup_staleness_ms: u64,
    /// Extra attempts after a failed lookup
    pub lookup_retries: u32,
    /// Per-sub-query timeout for engagement counts
    pub engagement_timeout_ms: u64,
    /// Staleness window for engagement snapshots
    pub engagement_staleness_ms: u64,
    /// Per-category result cap
    pub engagement_limit: usize,
    /// Timeout for author feed queries
    pub author_feed_timeout_ms: u64,
    /// Staleness window for author feeds
    pub author_feed_staleness_ms: u64,
    /// Default number of notes in an author feed
    pub author_feed_limit: usize,
    /// Maximum entries per cache instance
    pub cache_capacity: u64,
}

impl FeedConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text and validate
    ///
    /// # Errors
    /// - `ConfigError::Parse` on syntax or type errors
    /// - `ConfigError::Invalid` if a value is out of range
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - otherwise as [`FeedConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded feed config");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("lookup_timeout_ms", self.lookup_timeout_ms),
            ("lookup_staleness_ms", self.lookup_staleness_ms),
            ("engagement_timeout_ms", self.engagement_timeout_ms),
            ("engagement_staleness_ms", self.engagement_staleness_ms),
            ("author_feed_timeout_ms", self.author_feed_timeout_ms),
            ("author_feed_staleness_ms", self.author_feed_staleness_ms),
            ("cache_capacity", self.cache_capacity),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{field} must be greater than zero")));
        }
        if self.engagement_limit == 0 {
            return Err(ConfigError::Invalid(
                "engagement_limit must be greater than zero".to_string(),
            ));
        }
        if self.author_feed_limit == 0 {
            return Err(ConfigError::Invalid(
                "author_feed_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// With depth bound
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// With lookup timeout
    #[inline]
    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout_ms = duration_ms(timeout);
        self
    }

    /// With lookup retries
    #[inline]
    #[must_use]
    pub fn with_lookup_retries(mut self, retries: u32) -> Self {
        self.lookup_retries = retries;
        self
    }

    /// With lookup staleness window
    #[inline]
    #[must_use]
    pub fn with_lookup_staleness(mut self, window: Duration) -> Self {
        self.lookup_staleness_ms = duration_ms(window);
        self
    }

    /// With engagement sub-query timeout
    #[inline]
    #[must_use]
    pub fn with_engagement_timeout(mut self, timeout: Duration) -> Self {
        self.engagement_timeout_ms = duration_ms(timeout);
        self
    }

    /// With engagement staleness window
    #[inline]
    #[must_use]
    pub fn with_engagement_staleness(mut self, window: Duration) -> Self {
        self.engagement_staleness_ms = duration_ms(window);
        self
    }

    /// With author feed staleness window
    #[inline]
    #[must_use]
    pub fn with_author_feed_staleness(mut self, window: Duration) -> Self {
        self.author_feed_staleness_ms = duration_ms(window);
        self
    }

    #[inline]
    #[must_use]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    #[inline]
    #[must_use]
    pub fn lookup_staleness(&self) -> Duration {
        Duration::from_millis(self.lookup_staleness_ms)
    }

    #[inline]
    #[must_use]
    pub fn engagement_timeout(&self) -> Duration {
        Duration::from_millis(self.engagement_timeout_ms)
    }

    #[inline]
    #[must_use]
    pub fn engagement_staleness(&self) -> Duration {
        Duration::from_millis(self.engagement_staleness_ms)
    }

    #[inline]
    #[must_use]
    pub fn author_feed_timeout(&self) -> Duration {
        Duration::from_millis(self.author_feed_timeout_ms)
    }

    #[inline]
    #[must_use]
    pub fn author_feed_staleness(&self) -> Duration {
        Duration::from_millis(self.author_feed_staleness_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            lookup_timeout_ms: 3_000,
            lookup_staleness_ms: 5 * 60 * 1_000,
            lookup_retries: 1,
            engagement_timeout_ms: 5_000,
            engagement_staleness_ms: 30 * 1_000,
            engagement_limit: 1_000,
            author_feed_timeout_ms: 5_000,
            author_feed_staleness_ms: 2 * 60 * 1_000,
            author_feed_limit: 5,
            cache_capacity: 10_000,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = FeedConfig::new();
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.lookup_timeout(), Duration::from_secs(3));
        assert_eq!(config.engagement_staleness(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = FeedConfig::from_toml_str("max_depth = 3\nlookup_retries = 0\n").unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.lookup_retries, 0);
        assert_eq!(config.engagement_limit, 1_000);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = FeedConfig::from_toml_str("lookup_timeout_ms = 0").unwrap_err();
        assert!(err.to_string().contains("lookup_timeout_ms"));
    }

    #[test]
    fn bad_type_is_parse_error() {
        let err = FeedConfig::from_toml_str("max_depth = \"two\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "engagement_staleness_ms = 1000").unwrap();

        let config = FeedConfig::load(file.path()).unwrap();
        assert_eq!(config.engagement_staleness(), Duration::from_secs(1));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = FeedConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn builder_methods() {
        let config = FeedConfig::new()
            .with_max_depth(4)
            .with_lookup_timeout(Duration::from_millis(250))
            .with_engagement_timeout(Duration::from_millis(100));
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.lookup_timeout_ms, 250);
        assert_eq!(config.engagement_timeout_ms, 100);
    }
}
