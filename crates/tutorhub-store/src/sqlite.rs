//! SQLite-based store implementation
//!
//! Every status transition runs inside a transaction guarded by the
//! connection mutex; this is the per-record serialization boundary the
//! engine relies on. Two callers racing to flip the same request resolve
//! to exactly one winner.

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;
use tutorhub_api::{MentorshipRequest, RequestStatus, Session, SessionStatus};
use tutorhub_util::{RequestId, SessionId, UserId};
use uuid::Uuid;

use crate::{AuditEvent, Store, StoreError, StoreResult};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            -- Mentorship requests (never deleted)
            CREATE TABLE IF NOT EXISTS requests (
                id TEXT PRIMARY KEY,
                student_id TEXT NOT NULL,
                student_name TEXT NOT NULL,
                subject TEXT NOT NULL,
                message TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- Tutoring sessions (never deleted)
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                subject TEXT NOT NULL,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                student_id TEXT NOT NULL,
                student_name TEXT NOT NULL,
                tutor_id TEXT NOT NULL,
                tutor_name TEXT NOT NULL,
                status TEXT NOT NULL,
                origin_request_id TEXT
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_requests_status ON requests(status);
            CREATE INDEX IF NOT EXISTS idx_sessions_student ON sessions(student_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_tutor ON sessions(tutor_id);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

const REQUEST_COLS: &str = "id, student_id, student_name, subject, message, status, created_at";
const SESSION_COLS: &str = "id, title, description, subject, date, start_time, end_time, \
                            student_id, student_name, tutor_id, tutor_name, status, \
                            origin_request_id";

struct RequestRow {
    id: String,
    student_id: String,
    student_name: String,
    subject: String,
    message: String,
    status: String,
    created_at: String,
}

fn map_request(row: &Row) -> rusqlite::Result<RequestRow> {
    Ok(RequestRow {
        id: row.get(0)?,
        student_id: row.get(1)?,
        student_name: row.get(2)?,
        subject: row.get(3)?,
        message: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn request_from_row(row: RequestRow) -> StoreResult<MentorshipRequest> {
    Ok(MentorshipRequest {
        id: RequestId::from_uuid(parse_uuid(&row.id)?),
        student_id: UserId::new(row.student_id),
        student_name: row.student_name,
        subject: row.subject,
        message: row.message,
        status: request_status_from_str(&row.status)?,
        created_at: parse_timestamp(&row.created_at),
    })
}

struct SessionRow {
    id: String,
    title: String,
    description: String,
    subject: String,
    date: String,
    start_time: String,
    end_time: String,
    student_id: String,
    student_name: String,
    tutor_id: String,
    tutor_name: String,
    status: String,
    origin_request_id: Option<String>,
}

fn map_session(row: &Row) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        subject: row.get(3)?,
        date: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        student_id: row.get(7)?,
        student_name: row.get(8)?,
        tutor_id: row.get(9)?,
        tutor_name: row.get(10)?,
        status: row.get(11)?,
        origin_request_id: row.get(12)?,
    })
}

fn session_from_row(row: SessionRow) -> StoreResult<Session> {
    let origin_request_id = match row.origin_request_id {
        Some(s) => Some(RequestId::from_uuid(parse_uuid(&s)?)),
        None => None,
    };

    Ok(Session {
        id: SessionId::from_uuid(parse_uuid(&row.id)?),
        title: row.title,
        description: row.description,
        subject: row.subject,
        date: parse_date(&row.date)?,
        start_time: parse_time(&row.start_time)?,
        end_time: parse_time(&row.end_time)?,
        student_id: UserId::new(row.student_id),
        student_name: row.student_name,
        tutor_id: UserId::new(row.tutor_id),
        tutor_name: row.tutor_name,
        status: session_status_from_str(&row.status)?,
        origin_request_id,
    })
}

fn parse_uuid(s: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::Database(format!("malformed id '{}': {}", s, e)))
}

fn parse_timestamp(s: &str) -> DateTime<Local> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Local))
        .unwrap_or_else(|_| tutorhub_util::now())
}

fn parse_date(s: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| StoreError::Database(format!("malformed date '{}': {}", s, e)))
}

fn parse_time(s: &str) -> StoreResult<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|e| StoreError::Database(format!("malformed time '{}': {}", s, e)))
}

fn request_status_str(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Pending => "pending",
        RequestStatus::Accepted => "accepted",
        RequestStatus::Declined => "declined",
    }
}

fn request_status_from_str(s: &str) -> StoreResult<RequestStatus> {
    match s {
        "pending" => Ok(RequestStatus::Pending),
        "accepted" => Ok(RequestStatus::Accepted),
        "declined" => Ok(RequestStatus::Declined),
        other => Err(StoreError::Database(format!(
            "unknown request status '{}'",
            other
        ))),
    }
}

fn session_status_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Pending => "pending",
        SessionStatus::Accepted => "accepted",
        SessionStatus::Completed => "completed",
        SessionStatus::Cancelled => "cancelled",
    }
}

fn session_status_from_str(s: &str) -> StoreResult<SessionStatus> {
    match s {
        "pending" => Ok(SessionStatus::Pending),
        "accepted" => Ok(SessionStatus::Accepted),
        "completed" => Ok(SessionStatus::Completed),
        "cancelled" => Ok(SessionStatus::Cancelled),
        other => Err(StoreError::Database(format!(
            "unknown session status '{}'",
            other
        ))),
    }
}

/// Load a request inside a transaction, for a status check
fn load_request_tx(tx: &Transaction, id: &RequestId) -> StoreResult<MentorshipRequest> {
    let row = tx
        .query_row(
            &format!("SELECT {} FROM requests WHERE id = ?", REQUEST_COLS),
            [id.as_uuid().to_string()],
            map_request,
        )
        .optional()?;

    match row {
        Some(row) => request_from_row(row),
        None => Err(StoreError::NotFound(format!("request {}", id))),
    }
}

fn insert_session_tx(tx: &Transaction, session: &Session) -> StoreResult<()> {
    tx.execute(
        &format!(
            "INSERT INTO sessions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            SESSION_COLS
        ),
        params![
            session.id.as_uuid().to_string(),
            session.title,
            session.description,
            session.subject,
            session.date.format(DATE_FORMAT).to_string(),
            session.start_time.format(TIME_FORMAT).to_string(),
            session.end_time.format(TIME_FORMAT).to_string(),
            session.student_id.as_str(),
            session.student_name,
            session.tutor_id.as_str(),
            session.tutor_name,
            session_status_str(session.status),
            session
                .origin_request_id
                .as_ref()
                .map(|id| id.as_uuid().to_string()),
        ],
    )?;
    Ok(())
}

impl Store for SqliteStore {
    fn insert_request(&self, request: &MentorshipRequest) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            &format!(
                "INSERT INTO requests ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                REQUEST_COLS
            ),
            params![
                request.id.as_uuid().to_string(),
                request.student_id.as_str(),
                request.student_name,
                request.subject,
                request.message,
                request_status_str(request.status),
                request.created_at.to_rfc3339(),
            ],
        )?;

        debug!(request_id = %request.id, "Request inserted");
        Ok(())
    }

    fn get_request(&self, id: &RequestId) -> StoreResult<Option<MentorshipRequest>> {
        let conn = self.conn.lock().unwrap();

        let row = conn
            .query_row(
                &format!("SELECT {} FROM requests WHERE id = ?", REQUEST_COLS),
                [id.as_uuid().to_string()],
                map_request,
            )
            .optional()?;

        row.map(request_from_row).transpose()
    }

    fn list_requests(&self, status: Option<RequestStatus>) -> StoreResult<Vec<MentorshipRequest>> {
        let conn = self.conn.lock().unwrap();

        let mut requests = Vec::new();
        match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM requests WHERE status = ? ORDER BY rowid",
                    REQUEST_COLS
                ))?;
                let rows = stmt.query_map([request_status_str(status)], map_request)?;
                for row in rows {
                    requests.push(request_from_row(row?)?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM requests ORDER BY rowid",
                    REQUEST_COLS
                ))?;
                let rows = stmt.query_map([], map_request)?;
                for row in rows {
                    requests.push(request_from_row(row?)?);
                }
            }
        }

        Ok(requests)
    }

    fn transition_request(
        &self,
        id: &RequestId,
        to: RequestStatus,
    ) -> StoreResult<MentorshipRequest> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let mut request = load_request_tx(&tx, id)?;
        if !request.status.can_transition_to(to) {
            return Err(StoreError::Conflict {
                current: request_status_str(request.status).into(),
                requested: request_status_str(to).into(),
            });
        }

        tx.execute(
            "UPDATE requests SET status = ? WHERE id = ?",
            params![request_status_str(to), id.as_uuid().to_string()],
        )?;
        tx.commit()?;

        request.status = to;
        debug!(request_id = %id, status = request_status_str(to), "Request transitioned");
        Ok(request)
    }

    fn accept_request(&self, id: &RequestId, session: &Session) -> StoreResult<MentorshipRequest> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let mut request = load_request_tx(&tx, id)?;
        if !request.status.can_transition_to(RequestStatus::Accepted) {
            // Dropping the transaction rolls everything back
            return Err(StoreError::Conflict {
                current: request_status_str(request.status).into(),
                requested: request_status_str(RequestStatus::Accepted).into(),
            });
        }

        tx.execute(
            "UPDATE requests SET status = ? WHERE id = ?",
            params![
                request_status_str(RequestStatus::Accepted),
                id.as_uuid().to_string()
            ],
        )?;
        insert_session_tx(&tx, session)?;
        tx.commit()?;

        request.status = RequestStatus::Accepted;
        debug!(
            request_id = %id,
            session_id = %session.id,
            "Request accepted, session inserted"
        );
        Ok(request)
    }

    fn insert_session(&self, session: &Session) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        insert_session_tx(&tx, session)?;
        tx.commit()?;

        debug!(session_id = %session.id, "Session inserted");
        Ok(())
    }

    fn get_session(&self, id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();

        let row = conn
            .query_row(
                &format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLS),
                [id.as_uuid().to_string()],
                map_session,
            )
            .optional()?;

        row.map(session_from_row).transpose()
    }

    fn list_sessions_for_user(&self, user_id: &UserId) -> StoreResult<Vec<Session>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sessions WHERE student_id = ?1 OR tutor_id = ?1 ORDER BY rowid",
            SESSION_COLS
        ))?;
        let rows = stmt.query_map([user_id.as_str()], map_session)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(session_from_row(row?)?);
        }

        Ok(sessions)
    }

    fn transition_session(&self, id: &SessionId, to: SessionStatus) -> StoreResult<Session> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let row = tx
            .query_row(
                &format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLS),
                [id.as_uuid().to_string()],
                map_session,
            )
            .optional()?;

        let mut session = match row {
            Some(row) => session_from_row(row)?,
            None => return Err(StoreError::NotFound(format!("session {}", id))),
        };

        if !session.status.can_transition_to(to) {
            return Err(StoreError::Conflict {
                current: session_status_str(session.status).into(),
                requested: session_status_str(to).into(),
            });
        }

        tx.execute(
            "UPDATE sessions SET status = ? WHERE id = ?",
            params![session_status_str(to), id.as_uuid().to_string()],
        )?;
        tx.commit()?;

        session.status = to;
        debug!(session_id = %id, status = session_status_str(to), "Session transitioned");
        Ok(session)
    }

    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit], |row| {
            let id: i64 = row.get(0)?;
            let timestamp: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp, event_json) = row?;
            let event: crate::AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp: parse_timestamp(&timestamp),
                event,
            });
        }

        Ok(events)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                tracing::warn!("Store lock poisoned");
                false
            }
        }
    }
}
