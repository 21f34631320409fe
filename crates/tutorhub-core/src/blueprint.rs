//! Session materialization from an accepted request

use chrono::{NaiveDate, NaiveTime};
use tutorhub_api::{Actor, MentorshipRequest, Session, SessionOverrides, SessionStatus};
use tutorhub_config::SessionWindow;
use tutorhub_util::SessionId;

/// Scheduling details resolved at accept time.
///
/// Caller-supplied overrides win field by field; everything else falls back
/// to the defaulting rules: title is derived from the request subject,
/// description from the request message, the date is today, and the window
/// comes from configuration.
#[derive(Debug, Clone)]
pub struct SessionBlueprint {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl SessionBlueprint {
    /// Resolve overrides against the defaults for this request
    pub fn resolve(
        request: &MentorshipRequest,
        overrides: &SessionOverrides,
        defaults: SessionWindow,
        today: NaiveDate,
    ) -> Self {
        Self {
            title: overrides
                .title
                .clone()
                .unwrap_or_else(|| format!("{} Tutoring Session", request.subject)),
            description: overrides
                .description
                .clone()
                .unwrap_or_else(|| request.message.clone()),
            date: overrides.date.unwrap_or(today),
            start_time: overrides.start_time.unwrap_or(defaults.start),
            end_time: overrides.end_time.unwrap_or(defaults.end),
        }
    }

    /// Build the session record.
    ///
    /// Subject and the student snapshot are copied verbatim from the
    /// request; the tutor snapshot comes from the accepting actor. The
    /// session starts Pending and records its origin request.
    pub fn into_session(self, request: &MentorshipRequest, tutor: &Actor) -> Session {
        Session {
            id: SessionId::new(),
            title: self.title,
            description: self.description,
            subject: request.subject.clone(),
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            student_id: request.student_id.clone(),
            student_name: request.student_name.clone(),
            tutor_id: tutor.id.clone(),
            tutor_name: tutor.name.clone(),
            status: SessionStatus::Pending,
            origin_request_id: Some(request.id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorhub_api::{RequestStatus, Role};
    use tutorhub_util::{RequestId, UserId};

    fn make_request() -> MentorshipRequest {
        MentorshipRequest {
            id: RequestId::new(),
            student_id: UserId::new("s1"),
            student_name: "Ann".into(),
            subject: "Math".into(),
            message: "help with integrals".into(),
            status: RequestStatus::Pending,
            created_at: tutorhub_util::now(),
        }
    }

    fn defaults() -> SessionWindow {
        SessionWindow {
            start: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_overrides_take_all_defaults() {
        let request = make_request();
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        let blueprint = SessionBlueprint::resolve(
            &request,
            &SessionOverrides::default(),
            defaults(),
            today,
        );

        assert_eq!(blueprint.title, "Math Tutoring Session");
        assert_eq!(blueprint.description, "help with integrals");
        assert_eq!(blueprint.date, today);
        assert_eq!(blueprint.start_time, NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(blueprint.end_time, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    }

    #[test]
    fn overrides_win_field_by_field() {
        let request = make_request();
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        let overrides = SessionOverrides {
            title: Some("Integration crash course".into()),
            date: Some(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()),
            start_time: Some(NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
            ..Default::default()
        };

        let blueprint = SessionBlueprint::resolve(&request, &overrides, defaults(), today);

        assert_eq!(blueprint.title, "Integration crash course");
        // Untouched fields still default
        assert_eq!(blueprint.description, "help with integrals");
        assert_eq!(blueprint.date, NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        assert_eq!(blueprint.start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(blueprint.end_time, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    }

    #[test]
    fn session_snapshots_both_parties() {
        let request = make_request();
        let tutor = Actor::new("t1", "Ben", Role::Tutor);
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        let session = SessionBlueprint::resolve(
            &request,
            &SessionOverrides::default(),
            defaults(),
            today,
        )
        .into_session(&request, &tutor);

        assert_eq!(session.subject, request.subject);
        assert_eq!(session.student_id, request.student_id);
        assert_eq!(session.student_name, request.student_name);
        assert_eq!(session.tutor_id, UserId::new("t1"));
        assert_eq!(session.tutor_name, "Ben");
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.origin_request_id, Some(request.id.clone()));
    }
}
