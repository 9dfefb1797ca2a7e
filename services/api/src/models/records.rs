//! Stored record kinds and the key scheme of the attendance table
//!
//! All records live in one table under a composite key:
//!
//! ```text
//! SESSION#{sessionId}  METADATA         -> session
//! SESSION#{sessionId}  STUDENT#{email}  -> attendance
//! COURSE#{className}   METADATA         -> course
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Partition key prefix for sessions and their attendance
pub const SESSION_PREFIX: &str = "SESSION#";

/// Sort key prefix for attendance records
pub const STUDENT_PREFIX: &str = "STUDENT#";

/// Partition key prefix for course records
pub const COURSE_PREFIX: &str = "COURSE#";

/// Sort key of session and course metadata records
pub const METADATA_SK: &str = "METADATA";

/// Class name written when a check-in references a session that cannot be found
pub const UNKNOWN_CLASS: &str = "Unknown Class";

/// Length of generated session identifiers
pub const SESSION_ID_LEN: usize = 8;

/// A class session, the thing a QR code points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub class_name: String,
    pub created_at: String,
}

impl SessionRecord {
    /// A new session for `class_name` with a fresh identifier
    pub fn new(class_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: new_session_id(),
            class_name: class_name.into(),
            created_at: iso_timestamp(now),
        }
    }

    pub fn partition_key(&self) -> String {
        session_pk(&self.session_id)
    }

    /// Calendar date the session was created on
    pub fn date(&self) -> &str {
        date_part(&self.created_at)
    }
}

/// One student's check-in to one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub session_id: String,
    pub email: String,
    pub timestamp: String,
    /// Copied from the session at check-in time; older records may lack it
    pub class_name: Option<String>,
}

impl AttendanceRecord {
    pub fn partition_key(&self) -> String {
        session_pk(&self.session_id)
    }

    pub fn sort_key(&self) -> String {
        student_sk(&self.email)
    }
}

/// An entry in the roster of known class names
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseRecord {
    pub class_name: String,
}

impl CourseRecord {
    pub fn partition_key(&self) -> String {
        course_pk(&self.class_name)
    }
}

pub fn session_pk(session_id: &str) -> String {
    format!("{SESSION_PREFIX}{session_id}")
}

pub fn student_sk(email: &str) -> String {
    format!("{STUDENT_PREFIX}{email}")
}

pub fn course_pk(class_name: &str) -> String {
    format!("{COURSE_PREFIX}{class_name}")
}

/// Session identifier from a `SESSION#` partition key; keys without the
/// prefix are returned unchanged
pub fn session_id_from_pk(pk: &str) -> &str {
    pk.strip_prefix(SESSION_PREFIX).unwrap_or(pk)
}

/// Lowercase and trim an email so it can be used as a key component
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Short random identifier; uniqueness is not checked
pub fn new_session_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(SESSION_ID_LEN);
    id
}

/// ISO-8601 UTC timestamp with microseconds and no zone suffix
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Date portion of a timestamp: everything before the first `T`, or the
/// whole string when there is no separator
pub fn date_part(timestamp: &str) -> &str {
    match timestamp.split_once('T') {
        Some((date, _)) => date,
        None => timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Foo@Bar.com "), "foo@bar.com");
        assert_eq!(normalize_email("foo@bar.com"), "foo@bar.com");
        assert_eq!(normalize_email("   "), "");
    }

    #[test]
    fn test_session_id_shape() {
        let id = new_session_id();
        assert_eq!(id.len(), SESSION_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_session_id());
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(session_pk("ab12cd34"), "SESSION#ab12cd34");
        assert_eq!(student_sk("a@b.edu"), "STUDENT#a@b.edu");
        assert_eq!(course_pk("CS1660"), "COURSE#CS1660");
        assert_eq!(session_id_from_pk("SESSION#ab12cd34"), "ab12cd34");
        assert_eq!(session_id_from_pk("ab12cd34"), "ab12cd34");
    }

    #[test]
    fn test_date_part() {
        assert_eq!(date_part("2025-02-03T10:15:00.000123"), "2025-02-03");
        assert_eq!(date_part("2025-02-03"), "2025-02-03");
        assert_eq!(date_part(""), "");
    }

    #[test]
    fn test_iso_timestamp() {
        let now = Utc.with_ymd_and_hms(2025, 2, 3, 9, 5, 7).unwrap();
        assert_eq!(iso_timestamp(now), "2025-02-03T09:05:07.000000");
    }

    #[test]
    fn test_new_session_record() {
        let now = Utc.with_ymd_and_hms(2025, 2, 3, 9, 5, 7).unwrap();
        let session = SessionRecord::new("CS1660", now);
        assert_eq!(session.class_name, "CS1660");
        assert_eq!(session.date(), "2025-02-03");
        assert_eq!(session.partition_key(), format!("SESSION#{}", session.session_id));
    }
}
