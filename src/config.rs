//! Configuration for the syndication engine.
//!
//! Configuration is passed to
//! [`SyndicationEngine::new()`](crate::SyndicationEngine::new) and can be
//! constructed programmatically or deserialized from YAML/JSON.
//!
//! # Quick Start
//!
//! ```rust
//! use syndication_engine::config::SyndicationConfig;
//!
//! let config = SyndicationConfig {
//!     content_types: vec!["post".into(), "page".into()],
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Configuration Structure
//!
//! ```text
//! SyndicationConfig
//! ├── content_types: Vec<String>   # Item types eligible for syndication
//! ├── settings: SyncSettings
//! │   ├── copy_custom_fields: bool # Mirror the arbitrary custom-field map
//! │   ├── sideload_images: bool    # Mirror the featured image by URL fetch
//! │   └── mirror_comments: bool    # Redirect destination comments to origin
//! └── tokens: TokenConfig          # Single-use request token TTL
//! ```
//!
//! # YAML Example
//!
//! ```yaml
//! content_types:
//!   - post
//!   - page
//!
//! settings:
//!   copy_custom_fields: true
//!   sideload_images: true
//!   mirror_comments: true
//!
//! tokens:
//!   ttl_secs: 900
//! ```

use crate::error::{Result, SyndicationError};
use serde::{Deserialize, Serialize};

/// The top-level config object passed to `SyndicationEngine::new()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyndicationConfig {
    /// Item content types eligible for syndication.
    ///
    /// Items of any other type pass through the save entry point
    /// untouched. An empty list is a configuration error, surfaced by
    /// [`validate()`](Self::validate) as a blocking notice.
    #[serde(default = "default_content_types")]
    pub content_types: Vec<String>,

    /// Tunable sync behavior.
    #[serde(default)]
    pub settings: SyncSettings,

    /// Single-use request token settings for the author-refresh endpoint.
    #[serde(default)]
    pub tokens: TokenConfig,
}

impl Default for SyndicationConfig {
    fn default() -> Self {
        Self {
            content_types: default_content_types(),
            settings: SyncSettings::default(),
            tokens: TokenConfig::default(),
        }
    }
}

impl SyndicationConfig {
    /// Create a minimal config for testing.
    pub fn for_testing() -> Self {
        Self::default()
    }

    /// Check the config is usable.
    ///
    /// Returns [`SyndicationError::Config`] when no content types are
    /// enabled; callers surface this as a blocking admin notice before
    /// any sync is attempted.
    pub fn validate(&self) -> Result<()> {
        if self.content_types.is_empty() {
            return Err(SyndicationError::Config(
                "no eligible content types configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether items of this type are eligible for syndication.
    pub fn is_eligible(&self, content_type: &str) -> bool {
        self.content_types.iter().any(|t| t == content_type)
    }
}

fn default_content_types() -> Vec<String> {
    vec!["post".to_string()]
}

/// Tunable parameters for the reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Copy the origin item's arbitrary custom-field map to each
    /// destination copy.
    #[serde(default = "default_true")]
    pub copy_custom_fields: bool,

    /// Fetch the origin's featured image by URL and attach it to each
    /// destination copy. A fetch failure aborts only that site's
    /// remaining sub-steps.
    #[serde(default = "default_true")]
    pub sideload_images: bool,

    /// Redirect comments posted on destination copies to the origin item
    /// and answer local count reads with the origin's count.
    #[serde(default = "default_true")]
    pub mirror_comments: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            copy_custom_fields: true,
            sideload_images: true,
            mirror_comments: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Single-use request token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// How long an issued token stays valid, in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_token_ttl_secs(),
        }
    }
}

fn default_token_ttl_secs() -> u64 {
    900 // 15 minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SyndicationConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_eligible("post"));
        assert!(!config.is_eligible("page"));
    }

    #[test]
    fn empty_content_types_is_a_config_error() {
        let config = SyndicationConfig {
            content_types: Vec::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SyndicationError::Config(_)));
        assert!(err.to_string().contains("content types"));
    }

    #[test]
    fn settings_default_everything_on() {
        let settings = SyncSettings::default();
        assert!(settings.copy_custom_fields);
        assert!(settings.sideload_images);
        assert!(settings.mirror_comments);
    }

    #[test]
    fn deserializes_with_defaults_filled_in() {
        let config: SyndicationConfig =
            serde_json::from_str(r#"{"content_types": ["post", "recipe"]}"#).unwrap();
        assert!(config.is_eligible("recipe"));
        assert!(config.settings.sideload_images);
        assert_eq!(config.tokens.ttl_secs, 900);
    }

    #[test]
    fn partial_settings_keep_remaining_defaults() {
        let config: SyndicationConfig = serde_json::from_str(
            r#"{"content_types": ["post"], "settings": {"sideload_images": false}}"#,
        )
        .unwrap();
        assert!(!config.settings.sideload_images);
        assert!(config.settings.copy_custom_fields);
    }
}
