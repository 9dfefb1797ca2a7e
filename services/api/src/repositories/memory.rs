//! In-process attendance repository
//!
//! Same key scheme and semantics as the DynamoDB repository, held in an
//! ordered map. Used by the tests and for running the API without AWS.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use common::error::DatabaseResult;
use tokio::sync::RwLock;

use super::AttendanceRepository;
use crate::models::records::{
    AttendanceRecord, CourseRecord, METADATA_SK, SessionRecord, course_pk, session_pk, student_sk,
};

#[derive(Debug, Clone)]
enum StoredRecord {
    Session(SessionRecord),
    Attendance(AttendanceRecord),
    Course(CourseRecord),
}

type Key = (String, String);

/// Attendance repository kept in memory
#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: RwLock<BTreeMap<Key, StoredRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of every kind
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn attendance_where<F>(&self, keep: F) -> Vec<AttendanceRecord>
    where
        F: Fn(&AttendanceRecord) -> bool,
    {
        self.records
            .read()
            .await
            .values()
            .filter_map(|record| match record {
                StoredRecord::Attendance(attendance) if keep(attendance) => {
                    Some(attendance.clone())
                }
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl AttendanceRepository for MemoryRepository {
    async fn put_session(&self, session: &SessionRecord) -> DatabaseResult<()> {
        self.records.write().await.insert(
            (session.partition_key(), METADATA_SK.to_string()),
            StoredRecord::Session(session.clone()),
        );
        Ok(())
    }

    async fn find_session(&self, session_id: &str) -> DatabaseResult<Option<SessionRecord>> {
        let key = (session_pk(session_id), METADATA_SK.to_string());
        Ok(match self.records.read().await.get(&key) {
            Some(StoredRecord::Session(session)) => Some(session.clone()),
            _ => None,
        })
    }

    async fn put_attendance(&self, record: &AttendanceRecord) -> DatabaseResult<bool> {
        let previous = self.records.write().await.insert(
            (record.partition_key(), record.sort_key()),
            StoredRecord::Attendance(record.clone()),
        );
        Ok(previous.is_none())
    }

    async fn list_attendance(&self) -> DatabaseResult<Vec<AttendanceRecord>> {
        Ok(self.attendance_where(|_| true).await)
    }

    async fn list_attendance_by_student(
        &self,
        email: &str,
    ) -> DatabaseResult<Vec<AttendanceRecord>> {
        let sort_key = student_sk(email);
        Ok(self
            .attendance_where(|record| record.sort_key() == sort_key)
            .await)
    }

    async fn list_sessions_by_class(&self, class_name: &str) -> DatabaseResult<Vec<SessionRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter_map(|record| match record {
                StoredRecord::Session(session) if session.class_name == class_name => {
                    Some(session.clone())
                }
                _ => None,
            })
            .collect())
    }

    async fn list_attendance_by_sessions(
        &self,
        session_ids: &HashSet<String>,
    ) -> DatabaseResult<Vec<AttendanceRecord>> {
        Ok(self
            .attendance_where(|record| session_ids.contains(&record.session_id))
            .await)
    }

    async fn list_courses(&self) -> DatabaseResult<Vec<CourseRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter_map(|record| match record {
                StoredRecord::Course(course) => Some(course.clone()),
                _ => None,
            })
            .collect())
    }

    async fn put_course(&self, course: &CourseRecord) -> DatabaseResult<()> {
        self.records.write().await.insert(
            (course.partition_key(), METADATA_SK.to_string()),
            StoredRecord::Course(course.clone()),
        );
        Ok(())
    }

    async fn delete_course(&self, class_name: &str) -> DatabaseResult<()> {
        self.records
            .write()
            .await
            .remove(&(course_pk(class_name), METADATA_SK.to_string()));
        Ok(())
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_in(session_id: &str, email: &str, timestamp: &str) -> AttendanceRecord {
        AttendanceRecord {
            session_id: session_id.to_string(),
            email: email.to_string(),
            timestamp: timestamp.to_string(),
            class_name: Some("CS1660".to_string()),
        }
    }

    #[tokio::test]
    async fn test_put_attendance_reports_first_write() {
        let repo = MemoryRepository::new();

        assert!(repo.put_attendance(&check_in("s1", "a@x.edu", "t1")).await.unwrap());
        assert!(!repo.put_attendance(&check_in("s1", "a@x.edu", "t2")).await.unwrap());
        assert!(repo.put_attendance(&check_in("s2", "a@x.edu", "t3")).await.unwrap());

        let history = repo.list_attendance_by_student("a@x.edu").await.unwrap();
        assert_eq!(history.len(), 2);
        let overwritten = history.iter().find(|r| r.session_id == "s1").unwrap();
        assert_eq!(overwritten.timestamp, "t2");
    }

    #[tokio::test]
    async fn test_sessions_by_class_ignores_courses() {
        let repo = MemoryRepository::new();
        let session = SessionRecord {
            session_id: "s1".to_string(),
            class_name: "CS1660".to_string(),
            created_at: "2025-01-06T09:00:00".to_string(),
        };
        repo.put_session(&session).await.unwrap();
        repo.put_course(&CourseRecord {
            class_name: "CS1660".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(repo.list_sessions_by_class("CS1660").await.unwrap(), vec![session]);
        assert!(repo.list_sessions_by_class("CS2060").await.unwrap().is_empty());
        assert_eq!(repo.find_session("s1").await.unwrap().unwrap().class_name, "CS1660");
        assert_eq!(repo.find_session("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_course_upsert_and_delete() {
        let repo = MemoryRepository::new();
        let course = CourseRecord {
            class_name: "CS1660".to_string(),
        };

        repo.put_course(&course).await.unwrap();
        repo.put_course(&course).await.unwrap();
        assert_eq!(repo.list_courses().await.unwrap(), vec![course.clone()]);

        repo.delete_course("CS1660").await.unwrap();
        repo.delete_course("CS1660").await.unwrap();
        assert!(repo.list_courses().await.unwrap().is_empty());
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_attendance_by_sessions() {
        let repo = MemoryRepository::new();
        repo.put_attendance(&check_in("s1", "a@x.edu", "t")).await.unwrap();
        repo.put_attendance(&check_in("s2", "b@x.edu", "t")).await.unwrap();
        repo.put_attendance(&check_in("s3", "c@x.edu", "t")).await.unwrap();

        let wanted: HashSet<String> = ["s1", "s3"].iter().map(|s| s.to_string()).collect();
        let mut emails: Vec<String> = repo
            .list_attendance_by_sessions(&wanted)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.email)
            .collect();
        emails.sort();
        assert_eq!(emails, vec!["a@x.edu", "c@x.edu"]);
        assert_eq!(repo.list_attendance().await.unwrap().len(), 3);
        assert_eq!(repo.len().await, 3);
    }

    #[tokio::test]
    async fn test_course_records_pair_sessions_with_attendance() {
        let repo = MemoryRepository::new();
        for (id, class) in [("s1", "CS1660"), ("s2", "CS0441")] {
            repo.put_session(&SessionRecord {
                session_id: id.to_string(),
                class_name: class.to_string(),
                created_at: "2025-01-06T09:00:00".to_string(),
            })
            .await
            .unwrap();
        }
        repo.put_attendance(&check_in("s1", "a@x.edu", "t")).await.unwrap();
        repo.put_attendance(&check_in("s2", "b@x.edu", "t")).await.unwrap();

        let (sessions, attendance) = repo.load_course_records("CS1660").await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, "s1");
        assert_eq!(attendance.len(), 1);
        assert_eq!(attendance[0].email, "a@x.edu");
    }
}
