use serde::{Deserialize, Serialize};

/// Pause lengths (ms) and the polling ceiling used by every filler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    #[serde(default = "default_short")]
    pub short_ms: u64,
    #[serde(default = "default_medium")]
    pub medium_ms: u64,
    #[serde(default = "default_long")]
    pub long_ms: u64,
    /// Settle time after opening a dropdown.
    #[serde(default = "default_expansion")]
    pub expansion_ms: u64,
    /// Settle time before reading back a written value.
    #[serde(default = "default_validation")]
    pub validation_ms: u64,
    /// Upper bound for every polling loop.
    #[serde(default = "default_max_wait_attempts")]
    pub max_wait_attempts: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            short_ms: default_short(),
            medium_ms: default_medium(),
            long_ms: default_long(),
            expansion_ms: default_expansion(),
            validation_ms: default_validation(),
            max_wait_attempts: default_max_wait_attempts(),
        }
    }
}

// Serde default helpers
fn default_short() -> u64 { 50 }
fn default_medium() -> u64 { 100 }
fn default_long() -> u64 { 300 }
fn default_expansion() -> u64 { 500 }
fn default_validation() -> u64 { 200 }
fn default_max_wait_attempts() -> u32 { 15 }
