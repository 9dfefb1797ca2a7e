//! API models for request and response payloads

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod records;

/// Request to open a new class session
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub class_name: Option<String>,
}

/// Response for session creation
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub message: String,
    /// URL the QR code should encode, when a check-in page is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_url: Option<String>,
}

/// Student check-in request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    pub session_id: Option<String>,
    pub email: Option<String>,
}

/// Body for course add / delete
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub class_name: Option<String>,
}

/// Generic acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Query for `/student-history`
#[derive(Debug, Deserialize)]
pub struct StudentHistoryQuery {
    pub email: Option<String>,
}

/// Query for `/course-details`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailsQuery {
    pub class_name: Option<String>,
}

/// Attendance count per session, as parallel arrays for charting
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCounts {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

/// One attended class in a student's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub class: String,
    pub date: String,
}

/// Attendance summary for one student within a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub email: String,
    pub attended: u64,
    pub total: u64,
    pub ratio: f64,
}

/// Who attended one session of a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session_id: String,
    pub date: String,
    pub attendees: Vec<String>,
}

/// Everything the course dashboard shows
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseReport {
    /// Session dates, oldest first
    pub graph_labels: Vec<String>,
    /// Attendance count per entry of `graph_labels`
    pub graph_data: Vec<u64>,
    pub roster: Vec<RosterEntry>,
    /// Date -> attendee emails. Sessions sharing a date collapse into the
    /// later one; `session_details` keeps them apart.
    pub daily_details: BTreeMap<String, Vec<String>>,
    pub session_details: Vec<SessionDetail>,
}
