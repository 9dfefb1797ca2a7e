//! Repositories for attendance table operations
//!
//! Handlers only see [`AttendanceRepository`]; how a listing is answered
//! (full scan, index query, in-memory filter) is the implementation's business.

use std::collections::HashSet;

use async_trait::async_trait;
use common::error::DatabaseResult;

use crate::models::records::{AttendanceRecord, CourseRecord, SessionRecord};

pub mod dynamo;
pub mod memory;

pub use dynamo::DynamoRepository;
pub use memory::MemoryRepository;

/// Storage operations the attendance API needs
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Write a session's metadata record
    async fn put_session(&self, session: &SessionRecord) -> DatabaseResult<()>;

    /// Look up a session by identifier
    async fn find_session(&self, session_id: &str) -> DatabaseResult<Option<SessionRecord>>;

    /// Write a check-in, replacing any earlier one by the same student for
    /// the same session. Returns `true` when no record existed before.
    async fn put_attendance(&self, record: &AttendanceRecord) -> DatabaseResult<bool>;

    /// Every attendance record in the table
    async fn list_attendance(&self) -> DatabaseResult<Vec<AttendanceRecord>>;

    /// Attendance records of one (normalized) student email
    async fn list_attendance_by_student(&self, email: &str)
    -> DatabaseResult<Vec<AttendanceRecord>>;

    /// Sessions whose class name is exactly `class_name`
    async fn list_sessions_by_class(&self, class_name: &str) -> DatabaseResult<Vec<SessionRecord>>;

    /// Attendance records belonging to any of `session_ids`
    async fn list_attendance_by_sessions(
        &self,
        session_ids: &HashSet<String>,
    ) -> DatabaseResult<Vec<AttendanceRecord>>;

    /// Sessions of `class_name` together with their attendance records.
    ///
    /// The default answers with two listings, which may observe the table at
    /// different moments; implementations that can read both kinds in one
    /// pass override it.
    async fn load_course_records(
        &self,
        class_name: &str,
    ) -> DatabaseResult<(Vec<SessionRecord>, Vec<AttendanceRecord>)> {
        let sessions = self.list_sessions_by_class(class_name).await?;
        let session_ids: HashSet<String> = sessions
            .iter()
            .map(|session| session.session_id.clone())
            .collect();
        let attendance = self.list_attendance_by_sessions(&session_ids).await?;
        Ok((sessions, attendance))
    }

    /// Every course record
    async fn list_courses(&self) -> DatabaseResult<Vec<CourseRecord>>;

    /// Write a course record; re-adding an existing course overwrites it
    async fn put_course(&self, course: &CourseRecord) -> DatabaseResult<()>;

    /// Remove a course record; removing a missing course is not an error
    async fn delete_course(&self, class_name: &str) -> DatabaseResult<()>;

    /// Check that the backing store is reachable
    async fn health_check(&self) -> DatabaseResult<bool>;
}
