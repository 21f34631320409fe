//! The lifecycle engine

use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, info};
use tutorhub_api::{
    Actor, EngineSummary, HealthStatus, MentorshipRequest, NewSession, RequestStatus, Role,
    Session, SessionOverrides, SessionStatus,
};
use tutorhub_config::Settings;
use tutorhub_store::{AuditEvent, AuditEventType, Store, StoreError};
use tutorhub_util::{RequestId, Result, SessionId, TutorHubError, UserId};

use crate::SessionBlueprint;

/// Result of a session status update
#[derive(Debug, Clone)]
pub struct StatusChange {
    /// The updated session
    pub session: Session,
    /// The status it moved away from
    pub from: SessionStatus,
}

/// The lifecycle engine.
///
/// Owns no state of its own; every record lives in the injected store, and
/// the store's transaction boundary is what serializes racing transitions.
pub struct LifecycleEngine {
    settings: Settings,
    store: Arc<dyn Store>,
}

impl LifecycleEngine {
    /// Create a new engine
    pub fn new(settings: Settings, store: Arc<dyn Store>) -> Self {
        info!(
            claim_policy = ?settings.claim_policy,
            "Lifecycle engine initialized"
        );

        Self { settings, store }
    }

    /// Get current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// File a mentorship request on behalf of a student.
    ///
    /// The student snapshot (`id`, `name`) is taken from the actor; the
    /// request starts Pending. A student may file any number of requests.
    pub fn create_request(
        &self,
        student: &Actor,
        subject: &str,
        message: &str,
        now: DateTime<Local>,
    ) -> Result<MentorshipRequest> {
        if !student.role.can_create_request() {
            return Err(TutorHubError::permission(format!(
                "role {:?} cannot file requests",
                student.role
            )));
        }

        let subject = subject.trim();
        let message = message.trim();

        if student.id.is_empty() || student.name.trim().is_empty() {
            return Err(TutorHubError::validation("student id and name are required"));
        }
        if subject.is_empty() {
            return Err(TutorHubError::validation("subject must not be empty"));
        }
        if message.is_empty() {
            return Err(TutorHubError::validation("message must not be empty"));
        }

        let request = MentorshipRequest {
            id: RequestId::new(),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            subject: subject.to_string(),
            message: message.to_string(),
            status: RequestStatus::Pending,
            created_at: now,
        };

        self.store
            .insert_request(&request)
            .map_err(|e| TutorHubError::store(e.to_string()))?;

        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::RequestCreated {
                request_id: request.id.clone(),
                student_id: request.student_id.clone(),
                subject: request.subject.clone(),
            }));

        info!(
            request_id = %request.id,
            student_id = %request.student_id,
            subject = %request.subject,
            "Request created"
        );

        Ok(request)
    }

    /// Accept a pending request, materializing a session.
    ///
    /// The request flip and the session insert commit together; a racing
    /// accept or decline loses the compare-and-set and observes
    /// `InvalidTransition`.
    pub fn accept_request(
        &self,
        request_id: &RequestId,
        tutor: &Actor,
        overrides: &SessionOverrides,
        now: DateTime<Local>,
    ) -> Result<Session> {
        self.authorize_claim(tutor)?;

        let request = self
            .store
            .get_request(request_id)
            .map_err(|e| TutorHubError::store(e.to_string()))?
            .ok_or_else(|| TutorHubError::RequestNotFound(request_id.clone()))?;

        // Fast-fail before building the session; the store re-checks
        // under its transaction.
        if request.status != RequestStatus::Pending {
            return Err(request_transition_refused(request_id, request.status));
        }

        let session = SessionBlueprint::resolve(
            &request,
            overrides,
            self.settings.session_defaults,
            now.date_naive(),
        )
        .into_session(&request, tutor);

        self.store
            .accept_request(request_id, &session)
            .map_err(|e| map_request_store_err(request_id, e))?;

        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::RequestAccepted {
                request_id: request_id.clone(),
                session_id: session.id.clone(),
                tutor_id: tutor.id.clone(),
            }));

        info!(
            request_id = %request_id,
            session_id = %session.id,
            tutor_id = %tutor.id,
            subject = %session.subject,
            "Request accepted, session scheduled"
        );

        Ok(session)
    }

    /// Decline a pending request
    pub fn decline_request(
        &self,
        request_id: &RequestId,
        actor: &Actor,
    ) -> Result<MentorshipRequest> {
        self.authorize_claim(actor)?;

        let request = self
            .store
            .transition_request(request_id, RequestStatus::Declined)
            .map_err(|e| map_request_store_err(request_id, e))?;

        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::RequestDeclined {
                request_id: request_id.clone(),
            }));

        info!(request_id = %request_id, "Request declined");

        Ok(request)
    }

    /// Schedule a session directly, without a preceding request
    pub fn schedule_session(&self, tutor: &Actor, new: &NewSession) -> Result<Session> {
        if !tutor.role.can_schedule_sessions() {
            return Err(TutorHubError::permission(format!(
                "role {:?} cannot schedule sessions",
                tutor.role
            )));
        }

        if new.title.trim().is_empty()
            || new.description.trim().is_empty()
            || new.subject.trim().is_empty()
        {
            return Err(TutorHubError::validation(
                "title, description and subject are required",
            ));
        }
        if new.student_id.is_empty() || new.student_name.trim().is_empty() {
            return Err(TutorHubError::validation("student id and name are required"));
        }
        if new.end_time <= new.start_time {
            return Err(TutorHubError::validation(
                "end time must be after start time",
            ));
        }

        let session = Session {
            id: SessionId::new(),
            title: new.title.trim().to_string(),
            description: new.description.trim().to_string(),
            subject: new.subject.trim().to_string(),
            date: new.date,
            start_time: new.start_time,
            end_time: new.end_time,
            student_id: new.student_id.clone(),
            student_name: new.student_name.clone(),
            tutor_id: tutor.id.clone(),
            tutor_name: tutor.name.clone(),
            status: SessionStatus::Pending,
            origin_request_id: None,
        };

        self.store
            .insert_session(&session)
            .map_err(|e| TutorHubError::store(e.to_string()))?;

        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::SessionScheduled {
                session_id: session.id.clone(),
                student_id: session.student_id.clone(),
                tutor_id: session.tutor_id.clone(),
            }));

        info!(
            session_id = %session.id,
            student_id = %session.student_id,
            tutor_id = %session.tutor_id,
            "Session scheduled directly"
        );

        Ok(session)
    }

    /// Move a session to a new status.
    ///
    /// Either participant (or an admin) may transition; legality is checked
    /// against the stored status under the store's transaction.
    pub fn update_session_status(
        &self,
        session_id: &SessionId,
        to: SessionStatus,
        actor: &Actor,
    ) -> Result<StatusChange> {
        let session = self
            .store
            .get_session(session_id)
            .map_err(|e| TutorHubError::store(e.to_string()))?
            .ok_or_else(|| TutorHubError::SessionNotFound(session_id.clone()))?;

        if !session.involves(&actor.id) && actor.role != Role::Admin {
            return Err(TutorHubError::permission(format!(
                "user {} is not a participant of session {}",
                actor.id, session_id
            )));
        }

        let from = session.status;
        let updated = self
            .store
            .transition_session(session_id, to)
            .map_err(|e| map_session_store_err(session_id, e))?;

        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::SessionStatusChanged {
                session_id: session_id.clone(),
                from,
                to,
            }));

        info!(
            session_id = %session_id,
            from = ?from,
            to = ?to,
            "Session status changed"
        );

        Ok(StatusChange {
            session: updated,
            from,
        })
    }

    /// List requests visible to the actor, optionally filtered by status.
    ///
    /// Students see their own requests. Tutors see the system-wide pool
    /// when the claim policy admits them; admins always do. Insertion
    /// order (oldest first).
    pub fn list_requests(
        &self,
        viewer: &Actor,
        status: Option<RequestStatus>,
    ) -> Result<Vec<MentorshipRequest>> {
        let requests = self
            .store
            .list_requests(status)
            .map_err(|e| TutorHubError::store(e.to_string()))?;

        match viewer.role {
            Role::Student => Ok(requests
                .into_iter()
                .filter(|r| r.student_id == viewer.id)
                .collect()),
            Role::Tutor | Role::Admin => {
                self.authorize_claim(viewer)?;
                Ok(requests)
            }
        }
    }

    /// Every session where the user is the student or the tutor
    pub fn sessions_for_user(&self, user_id: &UserId) -> Result<Vec<Session>> {
        self.store
            .list_sessions_for_user(user_id)
            .map_err(|e| TutorHubError::store(e.to_string()))
    }

    /// Dashboard counts for the actor
    pub fn summary_for(&self, actor: &Actor) -> Result<EngineSummary> {
        let sessions = self.sessions_for_user(&actor.id)?;

        let mut summary = EngineSummary {
            sessions_total: sessions.len(),
            ..Default::default()
        };
        for session in &sessions {
            match session.status {
                SessionStatus::Pending => summary.sessions_pending += 1,
                SessionStatus::Accepted => summary.sessions_accepted += 1,
                SessionStatus::Completed => summary.sessions_completed += 1,
                SessionStatus::Cancelled => summary.sessions_cancelled += 1,
            }
        }

        summary.open_requests = match self.list_requests(actor, Some(RequestStatus::Pending)) {
            Ok(requests) => requests.len(),
            // Roles outside the claim policy simply have no pool to see
            Err(TutorHubError::PermissionDenied(_)) => 0,
            Err(e) => return Err(e),
        };

        debug!(user_id = %actor.id, total = summary.sessions_total, "Summary computed");

        Ok(summary)
    }

    /// Current health status
    pub fn health(&self) -> HealthStatus {
        let store_ok = self.store.is_healthy();
        HealthStatus {
            live: true,
            ready: store_ok,
            store_ok,
        }
    }

    fn authorize_claim(&self, actor: &Actor) -> Result<()> {
        if self.settings.claim_policy.allows(actor.role) {
            Ok(())
        } else {
            Err(TutorHubError::permission(format!(
                "role {:?} may not claim requests under {:?}",
                actor.role, self.settings.claim_policy
            )))
        }
    }
}

fn request_transition_refused(id: &RequestId, current: RequestStatus) -> TutorHubError {
    TutorHubError::transition(format!("request {} is already {:?}", id, current))
}

fn map_request_store_err(id: &RequestId, e: StoreError) -> TutorHubError {
    match e {
        StoreError::NotFound(_) => TutorHubError::RequestNotFound(id.clone()),
        StoreError::Conflict { current, requested } => TutorHubError::transition(format!(
            "request {} is {}, cannot become {}",
            id, current, requested
        )),
        other => TutorHubError::store(other.to_string()),
    }
}

fn map_session_store_err(id: &SessionId, e: StoreError) -> TutorHubError {
    match e {
        StoreError::NotFound(_) => TutorHubError::SessionNotFound(id.clone()),
        StoreError::Conflict { current, requested } => TutorHubError::transition(format!(
            "session {} is {}, cannot become {}",
            id, current, requested
        )),
        other => TutorHubError::store(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use tutorhub_config::ClaimPolicy;
    use tutorhub_store::SqliteStore;

    fn make_engine() -> LifecycleEngine {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        LifecycleEngine::new(Settings::default(), store)
    }

    fn make_engine_with_policy(claim_policy: ClaimPolicy) -> LifecycleEngine {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let settings = Settings {
            claim_policy,
            ..Default::default()
        };
        LifecycleEngine::new(settings, store)
    }

    fn ann() -> Actor {
        Actor::new("S1", "Ann", Role::Student)
    }

    fn ben() -> Actor {
        Actor::new("T1", "Ben", Role::Tutor)
    }

    #[test]
    fn test_create_request_starts_pending() {
        let engine = make_engine();

        let first = engine
            .create_request(&ann(), "Math", "help with integrals", tutorhub_util::now())
            .unwrap();
        let second = engine
            .create_request(&ann(), "Math", "more help please", tutorhub_util::now())
            .unwrap();

        assert_eq!(first.status, RequestStatus::Pending);
        // Duplicate filing is allowed; ids stay unique
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_create_request_validation() {
        let engine = make_engine();
        let now = tutorhub_util::now();

        let result = engine.create_request(&ann(), "  ", "help", now);
        assert!(matches!(result, Err(TutorHubError::ValidationError(_))));

        let result = engine.create_request(&ann(), "Math", "", now);
        assert!(matches!(result, Err(TutorHubError::ValidationError(_))));

        let blank = Actor::new("S2", "   ", Role::Student);
        let result = engine.create_request(&blank, "Math", "help", now);
        assert!(matches!(result, Err(TutorHubError::ValidationError(_))));
    }

    #[test]
    fn test_tutors_cannot_file_requests() {
        let engine = make_engine();

        let result = engine.create_request(&ben(), "Math", "help", tutorhub_util::now());
        assert!(matches!(result, Err(TutorHubError::PermissionDenied(_))));
    }

    #[test]
    fn test_accept_copies_request_snapshot() {
        let engine = make_engine();
        let now = tutorhub_util::now();

        let request = engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();
        let session = engine
            .accept_request(&request.id, &ben(), &SessionOverrides::default(), now)
            .unwrap();

        assert_eq!(session.subject, "Math");
        assert_eq!(session.student_id, UserId::new("S1"));
        assert_eq!(session.student_name, "Ann");
        assert_eq!(session.tutor_id, UserId::new("T1"));
        assert_eq!(session.tutor_name, "Ben");
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.title, "Math Tutoring Session");
        assert_eq!(session.description, "help with integrals");
        assert_eq!(session.date, now.date_naive());
        assert_eq!(session.origin_request_id, Some(request.id));
    }

    #[test]
    fn test_accept_is_exactly_once() {
        let engine = make_engine();
        let now = tutorhub_util::now();

        let request = engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();
        engine
            .accept_request(&request.id, &ben(), &SessionOverrides::default(), now)
            .unwrap();

        let again = engine.accept_request(&request.id, &ben(), &SessionOverrides::default(), now);
        assert!(matches!(again, Err(TutorHubError::InvalidTransition(_))));

        let decline = engine.decline_request(&request.id, &ben());
        assert!(matches!(decline, Err(TutorHubError::InvalidTransition(_))));

        // Only one session materialized
        assert_eq!(engine.sessions_for_user(&UserId::new("S1")).unwrap().len(), 1);
    }

    #[test]
    fn test_decline_on_accepted_leaves_status() {
        let engine = make_engine();
        let now = tutorhub_util::now();

        let request = engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();
        engine
            .accept_request(&request.id, &ben(), &SessionOverrides::default(), now)
            .unwrap();

        let result = engine.decline_request(&request.id, &ben());
        assert!(matches!(result, Err(TutorHubError::InvalidTransition(_))));

        let stored = engine.list_requests(&ben(), None).unwrap();
        assert_eq!(stored[0].status, RequestStatus::Accepted);
    }

    #[test]
    fn test_accept_unknown_request() {
        let engine = make_engine();

        let result = engine.accept_request(
            &RequestId::new(),
            &ben(),
            &SessionOverrides::default(),
            tutorhub_util::now(),
        );
        assert!(matches!(result, Err(TutorHubError::RequestNotFound(_))));
    }

    #[test]
    fn test_accept_applies_overrides() {
        let engine = make_engine();
        let now = tutorhub_util::now();

        let request = engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();

        let overrides = SessionOverrides {
            title: Some("Integration crash course".into()),
            date: Some(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()),
            end_time: Some(NaiveTime::from_hms_opt(17, 30, 0).unwrap()),
            ..Default::default()
        };
        let session = engine
            .accept_request(&request.id, &ben(), &overrides, now)
            .unwrap();

        assert_eq!(session.title, "Integration crash course");
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        assert_eq!(session.end_time, NaiveTime::from_hms_opt(17, 30, 0).unwrap());
        // Unset overrides still default
        assert_eq!(session.description, "help with integrals");
        assert_eq!(
            session.start_time,
            engine.settings().session_defaults.start
        );
    }

    #[test]
    fn test_scenario_request_to_session() {
        // Full walkthrough: file, list pending, accept, observe both stores
        let engine = make_engine();
        let now = tutorhub_util::now();

        let request = engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();

        let pending = engine
            .list_requests(&ben(), Some(RequestStatus::Pending))
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].subject, "Math");
        assert_eq!(pending[0].message, "help with integrals");

        engine
            .accept_request(&request.id, &ben(), &SessionOverrides::default(), now)
            .unwrap();

        let pending = engine
            .list_requests(&ben(), Some(RequestStatus::Pending))
            .unwrap();
        assert!(pending.is_empty());

        let sessions = engine.sessions_for_user(&UserId::new("S1")).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].tutor_id, UserId::new("T1"));
        assert_eq!(sessions[0].subject, "Math");
        assert_eq!(sessions[0].status, SessionStatus::Pending);
    }

    #[test]
    fn test_racing_accepts_have_one_winner() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let engine = Arc::new(LifecycleEngine::new(Settings::default(), store));
        let now = tutorhub_util::now();

        let request = engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..2 {
            let engine = engine.clone();
            let request_id = request.id.clone();
            handles.push(std::thread::spawn(move || {
                let tutor = Actor::new(format!("T{}", i), format!("Tutor {}", i), Role::Tutor);
                engine.accept_request(&request_id, &tutor, &SessionOverrides::default(), now)
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(TutorHubError::InvalidTransition(_)))));

        // Exactly one session exists for the student
        assert_eq!(engine.sessions_for_user(&UserId::new("S1")).unwrap().len(), 1);
    }

    #[test]
    fn test_sessions_visible_only_to_participants() {
        let engine = make_engine();
        let now = tutorhub_util::now();

        let request = engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();
        engine
            .accept_request(&request.id, &ben(), &SessionOverrides::default(), now)
            .unwrap();

        assert_eq!(engine.sessions_for_user(&UserId::new("S1")).unwrap().len(), 1);
        assert_eq!(engine.sessions_for_user(&UserId::new("T1")).unwrap().len(), 1);
        assert!(engine.sessions_for_user(&UserId::new("S2")).unwrap().is_empty());
    }

    #[test]
    fn test_session_status_lifecycle() {
        let engine = make_engine();
        let now = tutorhub_util::now();

        let request = engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();
        let session = engine
            .accept_request(&request.id, &ben(), &SessionOverrides::default(), now)
            .unwrap();

        // Student confirms, tutor completes
        let change = engine
            .update_session_status(&session.id, SessionStatus::Accepted, &ann())
            .unwrap();
        assert_eq!(change.session.status, SessionStatus::Accepted);
        assert_eq!(change.from, SessionStatus::Pending);

        let change = engine
            .update_session_status(&session.id, SessionStatus::Completed, &ben())
            .unwrap();
        assert_eq!(change.session.status, SessionStatus::Completed);
        assert_eq!(change.from, SessionStatus::Accepted);

        // Terminal: nothing moves a completed session
        for next in [
            SessionStatus::Pending,
            SessionStatus::Accepted,
            SessionStatus::Cancelled,
        ] {
            let result = engine.update_session_status(&session.id, next, &ben());
            assert!(matches!(result, Err(TutorHubError::InvalidTransition(_))));
        }
    }

    #[test]
    fn test_session_status_requires_participant() {
        let engine = make_engine();
        let now = tutorhub_util::now();

        let request = engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();
        let session = engine
            .accept_request(&request.id, &ben(), &SessionOverrides::default(), now)
            .unwrap();

        let stranger = Actor::new("T2", "Eve", Role::Tutor);
        let result = engine.update_session_status(&session.id, SessionStatus::Cancelled, &stranger);
        assert!(matches!(result, Err(TutorHubError::PermissionDenied(_))));

        // Admins may act on any session
        let admin = Actor::new("A1", "Root", Role::Admin);
        engine
            .update_session_status(&session.id, SessionStatus::Cancelled, &admin)
            .unwrap();
    }

    #[test]
    fn test_students_see_only_their_requests() {
        let engine = make_engine();
        let now = tutorhub_util::now();

        engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();
        let other = Actor::new("S2", "Sarah", Role::Student);
        engine
            .create_request(&other, "Science", "cell structures", now)
            .unwrap();

        let own = engine.list_requests(&ann(), None).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].subject, "Math");

        // Tutors see the whole pool under the default policy
        let pool = engine.list_requests(&ben(), None).unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_admin_only_policy_locks_out_tutors() {
        let engine = make_engine_with_policy(ClaimPolicy::AdminOnly);
        let now = tutorhub_util::now();

        let request = engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();

        let result =
            engine.accept_request(&request.id, &ben(), &SessionOverrides::default(), now);
        assert!(matches!(result, Err(TutorHubError::PermissionDenied(_))));

        let result = engine.list_requests(&ben(), Some(RequestStatus::Pending));
        assert!(matches!(result, Err(TutorHubError::PermissionDenied(_))));

        // Admins still can
        let admin = Actor::new("A1", "Root", Role::Admin);
        let session = engine
            .accept_request(&request.id, &admin, &SessionOverrides::default(), now)
            .unwrap();
        assert_eq!(session.tutor_id, UserId::new("A1"));
    }

    #[test]
    fn test_schedule_session_directly() {
        let engine = make_engine();

        let new = NewSession {
            title: "Physics Concepts Review".into(),
            description: "Review of basic physics concepts.".into(),
            subject: "Physics".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            student_id: UserId::new("S1"),
            student_name: "Ann".into(),
        };
        let session = engine.schedule_session(&ben(), &new).unwrap();

        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.origin_request_id, None);
        assert_eq!(session.tutor_name, "Ben");
        assert!(engine
            .sessions_for_user(&UserId::new("S1"))
            .unwrap()
            .iter()
            .any(|s| s.id == session.id));
    }

    #[test]
    fn test_schedule_session_rejects_inverted_window() {
        let engine = make_engine();

        let new = NewSession {
            title: "Physics Review".into(),
            description: "Review.".into(),
            subject: "Physics".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            start_time: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            student_id: UserId::new("S1"),
            student_name: "Ann".into(),
        };

        let result = engine.schedule_session(&ben(), &new);
        assert!(matches!(result, Err(TutorHubError::ValidationError(_))));
    }

    #[test]
    fn test_summary_counts() {
        let engine = make_engine();
        let now = tutorhub_util::now();

        let request = engine
            .create_request(&ann(), "Math", "help with integrals", now)
            .unwrap();
        let session = engine
            .accept_request(&request.id, &ben(), &SessionOverrides::default(), now)
            .unwrap();
        engine
            .update_session_status(&session.id, SessionStatus::Accepted, &ann())
            .unwrap();
        engine
            .create_request(&ann(), "Physics", "projectile motion", now)
            .unwrap();

        let summary = engine.summary_for(&ann()).unwrap();
        assert_eq!(summary.sessions_total, 1);
        assert_eq!(summary.sessions_accepted, 1);
        assert_eq!(summary.open_requests, 1);

        // The tutor's pool still holds the remaining pending request
        let summary = engine.summary_for(&ben()).unwrap();
        assert_eq!(summary.sessions_total, 1);
        assert_eq!(summary.open_requests, 1);
    }

    #[test]
    fn test_health_reflects_store() {
        let engine = make_engine();
        let health = engine.health();
        assert!(health.live);
        assert!(health.ready);
        assert!(health.store_ok);
    }
}
