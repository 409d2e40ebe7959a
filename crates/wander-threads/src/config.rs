use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, ThreadError};
use crate::expansion::{
    DEFAULT_PAGE_SIZE, ExpansionPolicy, INITIAL_PAGE_SIZE, checked_count,
};
use crate::flatten::MAX_VISUAL_LEVEL;
use crate::walk::DEFAULT_MAX_DEPTH;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Replies visible the first time a thread is expanded.
    pub initial_page_size: usize,
    /// Replies revealed per "load more" when the caller does not say.
    pub page_size: usize,
    pub max_visual_level: usize,
    pub expansion_policy: ExpansionPolicy,
    /// Nesting beyond this is treated as a malformed tree.
    pub max_depth: usize,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            initial_page_size: INITIAL_PAGE_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            max_visual_level: MAX_VISUAL_LEVEL,
            expansion_policy: ExpansionPolicy::PreserveProgress,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ProjectorConfig {
    /// Read `WANDER_*` overrides from the environment, loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults for absent keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        let int = |key: &'static str| -> Result<Option<i64>> {
            lookup(key).map(|raw| parse_int(key, &raw)).transpose()
        };

        if let Some(value) = int("WANDER_INITIAL_PAGE_SIZE")? {
            config.initial_page_size = checked_count("WANDER_INITIAL_PAGE_SIZE", value)?;
        }
        if let Some(value) = int("WANDER_PAGE_SIZE")? {
            config.page_size = checked_count("WANDER_PAGE_SIZE", value)?;
        }
        if let Some(value) = int("WANDER_MAX_VISUAL_LEVEL")? {
            config.max_visual_level = checked_count("WANDER_MAX_VISUAL_LEVEL", value)?;
        }
        if let Some(value) = int("WANDER_MAX_DEPTH")? {
            config.max_depth = checked_count("WANDER_MAX_DEPTH", value)?;
        }
        if let Some(raw) = lookup("WANDER_RESET_ON_EXPAND") {
            config.expansion_policy = if parse_flag("WANDER_RESET_ON_EXPAND", &raw)? {
                ExpansionPolicy::ResetOnExpand
            } else {
                ExpansionPolicy::PreserveProgress
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ThreadError::InvalidArgument {
                name: "page_size",
                value: "0".into(),
            });
        }
        if self.max_depth == 0 {
            return Err(ThreadError::InvalidArgument {
                name: "max_depth",
                value: "0".into(),
            });
        }
        Ok(())
    }
}

fn parse_int(name: &'static str, raw: &str) -> Result<i64> {
    raw.trim().parse().map_err(|_| {
        warn!(key = name, value = raw, "rejecting unparseable config value");
        ThreadError::InvalidArgument {
            name,
            value: raw.to_string(),
        }
    })
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ThreadError::InvalidArgument {
            name,
            value: raw.to_string(),
        }),
    }
}
