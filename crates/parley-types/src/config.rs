//! Global configuration schema.
//!
//! Deserialized from `config.toml` in the data directory by
//! `parley-infra::config`. Every field has a default so a missing or partial
//! file still yields a usable configuration.

use serde::{Deserialize, Serialize};

/// Application-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Maximum messages an anonymous token may send.
    #[serde(default = "default_message_limit")]
    pub message_limit: u32,

    /// Title given to sessions created without one.
    #[serde(default = "default_session_title")]
    pub default_session_title: String,
}

fn default_message_limit() -> u32 {
    10
}

fn default_session_title() -> String {
    "New Chat".to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            message_limit: default_message_limit(),
            default_session_title: default_session_title(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GlobalConfig::default();
        assert_eq!(config.message_limit, 10);
        assert_eq!(config.default_session_title, "New Chat");
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: GlobalConfig = serde_json::from_str(r#"{"message_limit": 25}"#).unwrap();
        assert_eq!(config.message_limit, 25);
        assert_eq!(config.default_session_title, "New Chat");
    }
}
