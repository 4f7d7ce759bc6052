//! Configuration types for context creation.

use serde::{Deserialize, Serialize};
use std::os::raw::c_int;
use tracing::warn;

use never_jscore_sys::SEED_DEFAULT;

pub const ENV_EXTENSIONS: &str = "NEVER_JSCORE_EXTENSIONS";
pub const ENV_LOGGING: &str = "NEVER_JSCORE_LOGGING";
pub const ENV_SEED: &str = "NEVER_JSCORE_SEED";

/// Options passed to the engine when a context is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    /// Install the engine's extension globals.
    /// Default: true
    pub extensions: bool,

    /// Route script console output to the host's log.
    /// Default: false
    pub logging: bool,

    /// Seed for deterministic `Math.random`, handed to the engine unchanged.
    /// Default: None (engine seeding)
    pub random_seed: Option<i64>,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            extensions: true,
            logging: false,
            random_seed: None,
        }
    }
}

impl ContextOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from the raw creation arguments.
    ///
    /// Any negative seed means "engine seeding".
    pub fn from_raw(extensions: bool, logging: bool, random_seed: i64) -> Self {
        Self {
            extensions,
            logging,
            random_seed: non_negative(random_seed),
        }
    }

    /// Defaults overlaid with `NEVER_JSCORE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values found through `lookup`.
    ///
    /// Values that do not parse are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(value) = lookup(ENV_EXTENSIONS) {
            match parse_flag(&value) {
                Some(flag) => options.extensions = flag,
                None => warn!(key = ENV_EXTENSIONS, value = %value, "ignoring unparseable flag"),
            }
        }
        if let Some(value) = lookup(ENV_LOGGING) {
            match parse_flag(&value) {
                Some(flag) => options.logging = flag,
                None => warn!(key = ENV_LOGGING, value = %value, "ignoring unparseable flag"),
            }
        }
        if let Some(value) = lookup(ENV_SEED) {
            match value.trim().parse::<i64>() {
                Ok(seed) => options.random_seed = non_negative(seed),
                Err(_) => warn!(key = ENV_SEED, value = %value, "ignoring unparseable seed"),
            }
        }

        options
    }

    /// Enable or disable extension globals.
    pub fn extensions(mut self, enabled: bool) -> Self {
        self.extensions = enabled;
        self
    }

    /// Enable or disable console logging.
    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Request deterministic `Math.random` with this seed.
    ///
    /// A negative seed goes back to engine seeding.
    pub fn random_seed(mut self, seed: i64) -> Self {
        self.random_seed = non_negative(seed);
        self
    }

    /// Go back to engine seeding.
    pub fn default_seed(mut self) -> Self {
        self.random_seed = None;
        self
    }

    pub(crate) fn extensions_arg(&self) -> c_int {
        c_int::from(self.extensions)
    }

    pub(crate) fn logging_arg(&self) -> c_int {
        c_int::from(self.logging)
    }

    pub(crate) fn seed_arg(&self) -> i64 {
        self.random_seed.and_then(non_negative).unwrap_or(SEED_DEFAULT)
    }
}

/// Negative seeds all mean "engine seeding"
fn non_negative(seed: i64) -> Option<i64> {
    (seed >= 0).then_some(seed)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
