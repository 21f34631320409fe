//! Event types for tutorhubd -> client streaming

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tutorhub_util::{RequestId, SessionId};

use crate::{MentorshipRequest, Session, SessionStatus, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: tutorhub_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A student filed a new mentorship request
    RequestCreated { request: MentorshipRequest },

    /// A request was accepted and a session materialized from it
    RequestAccepted {
        request_id: RequestId,
        session: Session,
    },

    /// A request was declined
    RequestDeclined { request_id: RequestId },

    /// A session was scheduled directly (no preceding request)
    SessionScheduled { session: Session },

    /// A session moved to a new status
    SessionStatusChanged {
        session_id: SessionId,
        from: SessionStatus,
        to: SessionStatus,
    },

    /// Service is shutting down
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization() {
        let event = Event::new(EventPayload::RequestDeclined {
            request_id: RequestId::new(),
        });

        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.api_version, API_VERSION);
        assert!(matches!(parsed.payload, EventPayload::RequestDeclined { .. }));
    }

    #[test]
    fn status_change_event_round_trips() {
        let event = Event::new(EventPayload::SessionStatusChanged {
            session_id: SessionId::new(),
            from: SessionStatus::Accepted,
            to: SessionStatus::Completed,
        });

        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();

        if let EventPayload::SessionStatusChanged { from, to, .. } = parsed.payload {
            assert_eq!(from, SessionStatus::Accepted);
            assert_eq!(to, SessionStatus::Completed);
        } else {
            panic!("expected SessionStatusChanged");
        }
    }
}
