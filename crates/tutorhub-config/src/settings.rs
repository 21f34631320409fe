//! Validated settings structures

use crate::schema::RawConfig;
use crate::validation::{parse_claim_policy, parse_time};
use chrono::NaiveTime;
use std::path::PathBuf;
use tutorhub_api::Role;

/// Validated settings ready for use by the lifecycle engine
#[derive(Debug, Clone)]
pub struct Settings {
    /// Service configuration
    pub service: ServiceConfig,

    /// Default scheduling window for sessions materialized from requests
    pub session_defaults: SessionWindow,

    /// Who may view and claim pending requests
    pub claim_policy: ClaimPolicy,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let session_defaults = SessionWindow {
            start: raw
                .session_defaults
                .start_time
                .as_deref()
                .and_then(|s| parse_time(s).ok())
                .unwrap_or_else(default_window_start),
            end: raw
                .session_defaults
                .end_time
                .as_deref()
                .and_then(|s| parse_time(s).ok())
                .unwrap_or_else(default_window_end),
        };

        let claim_policy = raw
            .claim_policy
            .as_deref()
            .and_then(parse_claim_policy)
            .unwrap_or_default();

        Self {
            service: ServiceConfig::from_raw(raw.service),
            session_defaults,
            claim_policy,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            session_defaults: SessionWindow::default(),
            claim_policy: ClaimPolicy::default(),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
}

impl ServiceConfig {
    fn from_raw(raw: crate::schema::RawServiceConfig) -> Self {
        Self {
            socket_path: raw
                .socket_path
                .unwrap_or_else(tutorhub_util::socket_path_without_env),
            data_dir: raw.data_dir.unwrap_or_else(tutorhub_util::data_dir_without_env),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            socket_path: tutorhub_util::socket_path_without_env(),
            data_dir: tutorhub_util::data_dir_without_env(),
        }
    }
}

/// Default session window (start and end time of day)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self {
            start: default_window_start(),
            end: default_window_end(),
        }
    }
}

fn default_window_start() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 0, 0).unwrap()
}

fn default_window_end() -> NaiveTime {
    NaiveTime::from_hms_opt(16, 0, 0).unwrap()
}

/// Who may view and claim pending requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClaimPolicy {
    /// Every pending request is visible to and acceptable by any tutor
    #[default]
    AnyTutor,

    /// Only admins see the pending pool and accept/decline (dispatcher model)
    AdminOnly,
}

impl ClaimPolicy {
    /// Whether the role may view the pending pool and accept/decline requests
    pub fn allows(&self, role: Role) -> bool {
        match self {
            ClaimPolicy::AnyTutor => role.can_claim_requests(),
            ClaimPolicy::AdminOnly => matches!(role, Role::Admin),
        }
    }
}
