//! Pager configuration
//!
//! Defaults that apply to every request handled by a [`crate::Pager`].

use crate::types::LimitValue;
use serde::{Deserialize, Serialize};

/// Page size used when a request does not carry a usable limit
pub const DEFAULT_LIMIT: u32 = 10;

/// Environment variable overriding the default page size
pub const DEFAULT_LIMIT_ENV: &str = "AGGPAGE_DEFAULT_LIMIT";

/// Environment variable capping the page size
pub const MAX_LIMIT_ENV: &str = "AGGPAGE_MAX_LIMIT";

/// Configuration for page planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerConfig {
    /// Page size for requests without a positive limit
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Upper bound on any requested page size
    #[serde(default)]
    pub max_limit: Option<u32>,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
        }
    }
}

impl PagerConfig {
    /// Create a new pager config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default page size (zero keeps the built-in default)
    #[must_use]
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
        self
    }

    /// Cap the page size
    #[must_use]
    pub fn with_max_limit(mut self, max: Option<u32>) -> Self {
        self.max_limit = max.filter(|m| *m > 0);
        self
    }

    /// Read overrides from `AGGPAGE_DEFAULT_LIMIT` and `AGGPAGE_MAX_LIMIT`
    ///
    /// Values that are not positive integers are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(limit) = lookup(DEFAULT_LIMIT_ENV).and_then(|v| parse_env_limit(DEFAULT_LIMIT_ENV, &v)) {
            config.default_limit = limit;
        }
        if let Some(max) = lookup(MAX_LIMIT_ENV).and_then(|v| parse_env_limit(MAX_LIMIT_ENV, &v)) {
            config.max_limit = Some(max);
        }

        config
    }

    /// Resolve the limit for a request
    ///
    /// Missing, zero, negative or non-numeric limits fall back to the default.
    /// The result is clamped to `max_limit` when one is set.
    pub fn effective_limit(&self, requested: Option<&LimitValue>) -> u32 {
        let limit = requested
            .and_then(LimitValue::positive)
            .unwrap_or(self.default_limit);
        match self.max_limit {
            Some(max) => limit.min(max),
            None => limit,
        }
    }
}

fn parse_env_limit(key: &str, value: &str) -> Option<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!("Ignoring {key}={value}: expected a positive integer");
            None
        }
    }
}
