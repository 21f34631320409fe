//! Audit event types

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tutorhub_api::SessionStatus;
use tutorhub_util::{RequestId, SessionId, UserId};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    /// A student filed a mentorship request
    RequestCreated {
        request_id: RequestId,
        student_id: UserId,
        subject: String,
    },

    /// A tutor accepted a request and a session was materialized
    RequestAccepted {
        request_id: RequestId,
        session_id: SessionId,
        tutor_id: UserId,
    },

    /// A request was declined
    RequestDeclined { request_id: RequestId },

    /// A session was scheduled directly
    SessionScheduled {
        session_id: SessionId,
        student_id: UserId,
        tutor_id: UserId,
    },

    /// A session moved to a new status
    SessionStatusChanged {
        session_id: SessionId,
        from: SessionStatus,
        to: SessionStatus,
    },

    /// Client connected
    ClientConnected { client_id: String },

    /// Client disconnected
    ClientDisconnected { client_id: String },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: tutorhub_util::now(),
            event,
        }
    }
}
