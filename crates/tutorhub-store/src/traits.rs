//! Store trait definitions

use tutorhub_api::{MentorshipRequest, RequestStatus, Session, SessionStatus};
use tutorhub_util::{RequestId, SessionId, UserId};

use crate::{AuditEvent, StoreResult};

/// Main store trait.
///
/// Status transitions are atomic: implementations must check the stored
/// status and apply the update inside a single serialization boundary, so
/// two racing callers resolve to exactly one winner. The loser receives
/// [`StoreError::Conflict`](crate::StoreError::Conflict).
pub trait Store: Send + Sync {
    // Mentorship requests

    /// Append a new request record
    fn insert_request(&self, request: &MentorshipRequest) -> StoreResult<()>;

    /// Look up a request by id
    fn get_request(&self, id: &RequestId) -> StoreResult<Option<MentorshipRequest>>;

    /// List requests in insertion order, optionally filtered by status
    fn list_requests(&self, status: Option<RequestStatus>) -> StoreResult<Vec<MentorshipRequest>>;

    /// Atomically move a pending request to a terminal status.
    ///
    /// Fails with `NotFound` for unknown ids and `Conflict` when the stored
    /// status does not admit the transition. Returns the updated record.
    fn transition_request(&self, id: &RequestId, to: RequestStatus)
        -> StoreResult<MentorshipRequest>;

    /// Atomically accept a request and insert the session materialized
    /// from it. All-or-nothing: if the request is no longer pending, the
    /// session is not inserted.
    fn accept_request(&self, id: &RequestId, session: &Session) -> StoreResult<MentorshipRequest>;

    // Sessions

    /// Append a new session record
    fn insert_session(&self, session: &Session) -> StoreResult<()>;

    /// Look up a session by id
    fn get_session(&self, id: &SessionId) -> StoreResult<Option<Session>>;

    /// Every session where the user is the student or the tutor,
    /// insertion order
    fn list_sessions_for_user(&self, user_id: &UserId) -> StoreResult<Vec<Session>>;

    /// Atomically move a session to a new status, checking legality
    /// against the stored status. Returns the updated record.
    fn transition_session(&self, id: &SessionId, to: SessionStatus) -> StoreResult<Session>;

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
