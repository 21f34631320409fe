//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Default scheduling window for sessions materialized from requests
    #[serde(default)]
    pub session_defaults: RawSessionDefaults,

    /// Who may view and claim pending requests: "any-tutor" or "admin-only"
    pub claim_policy: Option<String>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path
    pub socket_path: Option<PathBuf>,

    /// Data directory for the store
    pub data_dir: Option<PathBuf>,
}

/// Default session window
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSessionDefaults {
    /// Start time (HH:MM format)
    pub start_time: Option<String>,

    /// End time (HH:MM format)
    pub end_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_session_defaults() {
        let toml_str = r#"
            config_version = 1

            [session_defaults]
            start_time = "14:00"
            end_time = "15:00"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.session_defaults.start_time.as_deref(), Some("14:00"));
        assert_eq!(config.session_defaults.end_time.as_deref(), Some("15:00"));
    }

    #[test]
    fn absent_sections_default() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.service.socket_path.is_none());
        assert!(config.claim_policy.is_none());
    }
}
