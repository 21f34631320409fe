//! Shared domain types for the tutorhub API

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tutorhub_util::{RequestId, SessionId, UserId};

/// Role of the acting user, as reported by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Tutor,
    Admin,
}

impl Role {
    pub fn can_create_request(&self) -> bool {
        matches!(self, Role::Student | Role::Admin)
    }

    pub fn can_claim_requests(&self) -> bool {
        matches!(self, Role::Tutor | Role::Admin)
    }

    pub fn can_schedule_sessions(&self) -> bool {
        matches!(self, Role::Tutor | Role::Admin)
    }
}

/// The acting user for a command.
///
/// Supplied by the external identity provider; the engine trusts these
/// fields and snapshots `id`/`name` into the records it creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}

/// Status of a mentorship request.
///
/// One-way progression: a request is created Pending and transitions
/// exactly once, to Accepted or Declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Accepted | RequestStatus::Declined)
    }

    /// Whether a request in this status may move to `next`
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Accepted)
                | (RequestStatus::Pending, RequestStatus::Declined)
        )
    }
}

/// Status of a tutoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    /// Whether a session in this status may move to `next`.
    ///
    /// Legal moves: Pending -> Accepted, Pending -> Cancelled,
    /// Accepted -> Completed, Accepted -> Cancelled.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Pending, SessionStatus::Accepted)
                | (SessionStatus::Pending, SessionStatus::Cancelled)
                | (SessionStatus::Accepted, SessionStatus::Completed)
                | (SessionStatus::Accepted, SessionStatus::Cancelled)
        )
    }
}

/// A student's solicitation for tutoring help in a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentorshipRequest {
    pub id: RequestId,
    /// Snapshot of the requesting student at creation time
    pub student_id: UserId,
    pub student_name: String,
    pub subject: String,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Local>,
}

/// A scheduled tutoring engagement between one student and one tutor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Snapshots of both parties at creation time
    pub student_id: UserId,
    pub student_name: String,
    pub tutor_id: UserId,
    pub tutor_name: String,
    pub status: SessionStatus,
    /// The accepted request this session was materialized from.
    /// None for directly scheduled sessions.
    pub origin_request_id: Option<RequestId>,
}

impl Session {
    /// Whether the given user is a participant (student or tutor)
    pub fn involves(&self, user_id: &UserId) -> bool {
        &self.student_id == user_id || &self.tutor_id == user_id
    }
}

/// Caller-supplied scheduling details for accepting a request.
///
/// Absent fields fall back to the engine's defaulting rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOverrides {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
}

/// Fields for scheduling a session directly, without a preceding request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub student_id: UserId,
    pub student_name: String,
}

/// Per-user dashboard counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSummary {
    pub sessions_total: usize,
    pub sessions_pending: usize,
    pub sessions_accepted: usize,
    pub sessions_completed: usize,
    pub sessions_cancelled: usize,
    /// Pending requests visible to this user
    pub open_requests: usize,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub ready: bool,
    pub store_ok: bool,
}
