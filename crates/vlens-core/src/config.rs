//! Slicing configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Knobs for slicing and rewriting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceConfig {
    /// Maximum number of nested lens compositions for one access
    pub max_lens_hops: usize,
    /// Prefix of emitted lens method names
    pub lens_prefix: String,
    /// Prefix of temporaries introduced by rewriting
    pub temp_prefix: String,
    /// Access a field directly when no lens serves it but the target has
    /// a field of the same name
    pub implicit_identity_lenses: bool,
    /// Copy untagged class statements into every slice
    pub keep_shared_members: bool,
}

impl SliceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Returns [`ConfigError`] for malformed TOML or out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_lens_hops == 0 {
            return Err(ConfigError::Invalid {
                key: "max_lens_hops",
                reason: "must be at least 1".into(),
            });
        }
        for (key, value) in [("lens_prefix", &self.lens_prefix), ("temp_prefix", &self.temp_prefix)] {
            if !is_identifier(value) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("`{value}` is not an identifier"),
                });
            }
        }
        Ok(())
    }

    /// With lens hop ceiling
    #[inline]
    #[must_use]
    pub fn with_max_lens_hops(mut self, hops: usize) -> Self {
        self.max_lens_hops = hops;
        self
    }

    /// With lens name prefix
    #[inline]
    #[must_use]
    pub fn with_lens_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.lens_prefix = prefix.into();
        self
    }

    /// With temporary name prefix
    #[inline]
    #[must_use]
    pub fn with_temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }

    /// With implicit identity lenses
    #[inline]
    #[must_use]
    pub fn with_implicit_identity_lenses(mut self, enabled: bool) -> Self {
        self.implicit_identity_lenses = enabled;
        self
    }

    /// With shared members kept or dropped
    #[inline]
    #[must_use]
    pub fn with_keep_shared_members(mut self, keep: bool) -> Self {
        self.keep_shared_members = keep;
        self
    }
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            max_lens_hops: 8,
            lens_prefix: "_lens".into(),
            temp_prefix: "_vl_tmp".into(),
            implicit_identity_lenses: false,
            keep_shared_members: true,
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
