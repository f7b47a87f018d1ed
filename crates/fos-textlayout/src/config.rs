//! Text Layout Configuration

use crate::{LayoutError, Result};

/// Default cache budget: half a megabyte
pub const DEFAULT_CACHE_BUDGET_BYTES: usize = 512 * 1024;

/// Environment variable that turns the shaping cache on or off
pub const ENV_CACHE_ENABLED: &str = "FOS_TEXT_LAYOUT_CACHE";
/// Environment variable holding the cache budget in bytes
pub const ENV_CACHE_BYTES: &str = "FOS_TEXT_LAYOUT_CACHE_BYTES";
/// Environment variable selecting the shaping backend
pub const ENV_BACKEND: &str = "FOS_TEXT_LAYOUT_BACKEND";

/// Which shaping variant the engine is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Complex-script backend first, fallback shaping when it is unavailable
    #[default]
    Complex,
    /// Per-character width lookup with Arabic contextual forms only
    Fallback,
}

impl std::str::FromStr for BackendKind {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "complex" | "rustybuzz" => Ok(BackendKind::Complex),
            "fallback" | "simple" => Ok(BackendKind::Fallback),
            other => Err(LayoutError::InvalidConfig(format!("unknown backend '{other}'"))),
        }
    }
}

/// Text layout engine configuration
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Memoize shaping results
    pub cache_enabled: bool,

    /// Maximum bytes held by cached keys and results
    pub cache_budget_bytes: usize,

    /// Shaping variant selected at construction time
    pub backend: BackendKind,

    /// Log cache statistics every N lookups
    pub log_stats_every: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_budget_bytes: DEFAULT_CACHE_BUDGET_BYTES,
            backend: BackendKind::Complex,
            log_stats_every: None,
        }
    }
}

impl LayoutConfig {
    /// Defaults overridden by `FOS_TEXT_LAYOUT_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_CACHE_ENABLED) {
            config.cache_enabled = match value.trim() {
                "1" | "true" | "on" => true,
                "0" | "false" | "off" => false,
                other => {
                    return Err(LayoutError::InvalidConfig(format!(
                        "{ENV_CACHE_ENABLED}: expected a boolean, got '{other}'"
                    )));
                }
            };
        }

        if let Some(value) = lookup(ENV_CACHE_BYTES) {
            config.cache_budget_bytes = value.trim().parse().map_err(|_| {
                LayoutError::InvalidConfig(format!("{ENV_CACHE_BYTES}: '{value}' is not a byte count"))
            })?;
        }

        if let Some(value) = lookup(ENV_BACKEND) {
            config.backend = value.parse()?;
        }

        Ok(config)
    }

    pub fn cache_budget(mut self, bytes: usize) -> Self {
        self.cache_budget_bytes = bytes;
        self
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }
}
