use serde::{Deserialize, Serialize};

/// Capacity reserved up front for listener storage, the active set, the dispatch scratch
/// buffer and the id map.
pub const DEFAULT_RESERVE: usize = 5120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub reserve: usize,
}

impl Default for SignalConfig {
    fn default() -> Self { Self { reserve: DEFAULT_RESERVE } }
}
