//! Session context configuration.

use serde::{Deserialize, Serialize};

/// Title given to sessions created on first use.
pub const DEFAULT_SESSION_TITLE: &str = "New Session";

/// Settings for the session context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Title used when a session is created lazily.
    pub default_session_title: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_session_title: DEFAULT_SESSION_TITLE.to_string(),
        }
    }
}

impl ContextConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults.
    ///
    /// # Errors
    /// Returns error if the input is not valid JSON for this type.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}
