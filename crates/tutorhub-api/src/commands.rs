//! Command types for the tutorhubd protocol

use serde::{Deserialize, Serialize};
use tutorhub_util::{ClientId, RequestId, SessionId, UserId};

use crate::{
    Actor, EngineSummary, HealthStatus, MentorshipRequest, NewSession, RequestStatus, Session,
    SessionOverrides, SessionStatus, API_VERSION,
};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    NotFound,
    InvalidTransition,
    ValidationFailed,
    PermissionDenied,
    RateLimited,
    InternalError,
}

/// All possible commands from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// File a mentorship request on behalf of a student
    CreateRequest {
        actor: Actor,
        subject: String,
        message: String,
    },

    /// Accept a pending request, materializing a session
    AcceptRequest {
        actor: Actor,
        request_id: RequestId,
        #[serde(default)]
        overrides: SessionOverrides,
    },

    /// Decline a pending request
    DeclineRequest { actor: Actor, request_id: RequestId },

    /// List requests visible to the actor, optionally filtered by status
    ListRequests {
        actor: Actor,
        status: Option<RequestStatus>,
    },

    /// List every session the user participates in (as student or tutor)
    ListSessions { user_id: UserId },

    /// Schedule a session directly, without a preceding request
    ScheduleSession { actor: Actor, session: NewSession },

    /// Move a session to a new status
    UpdateSessionStatus {
        actor: Actor,
        session_id: SessionId,
        status: SessionStatus,
    },

    /// Dashboard counts for the actor
    GetSummary { actor: Actor },

    /// Get health status
    GetHealth,

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    /// Unsubscribe from events
    UnsubscribeEvents,

    /// Ping for keepalive
    Ping,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    Request(MentorshipRequest),
    Requests(Vec<MentorshipRequest>),
    Session(Session),
    Sessions(Vec<Session>),
    Summary(EngineSummary),
    Health(HealthStatus),
    Subscribed { client_id: ClientId },
    Unsubscribed,
    Pong,
}
