//! Aggregation of attendance records into dashboard views
//!
//! Everything here is pure: the repositories fetch records, these functions
//! shape them. None of them touch the store.

use std::collections::{BTreeMap, HashMap};

use crate::models::{
    CourseReport, HistoryEntry, RosterEntry, SessionCounts, SessionDetail,
    records::{AttendanceRecord, SessionRecord, date_part, normalize_email},
};

/// Class shown in a student's history when the record carries none
pub const UNKNOWN_HISTORY_CLASS: &str = "Unknown";

/// Count check-ins per session, in the order sessions are first seen
pub fn session_counts(records: &[AttendanceRecord]) -> SessionCounts {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts = SessionCounts::default();

    for record in records {
        match positions.get(record.session_id.as_str()) {
            Some(&index) => counts.data[index] += 1,
            None => {
                positions.insert(&record.session_id, counts.labels.len());
                counts.labels.push(record.session_id.clone());
                counts.data.push(1);
            }
        }
    }

    counts
}

/// Classes a student attended, with the date of each check-in
pub fn student_history(records: &[AttendanceRecord]) -> Vec<HistoryEntry> {
    records
        .iter()
        .map(|record| HistoryEntry {
            class: record
                .class_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_HISTORY_CLASS.to_string()),
            date: date_part(&record.timestamp).to_string(),
        })
        .collect()
}

/// Percentage of sessions attended, rounded to one decimal place with ties
/// going to the even digit. Zero when the course has no sessions.
pub fn attendance_ratio(attended: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percent = attended as f64 / total as f64 * 100.0;
    (percent * 10.0).round_ties_even() / 10.0
}

/// Build the course dashboard from the course's sessions and the attendance
/// records fetched for them.
///
/// Attendance is linked to sessions by session identifier, never by the
/// class name copied onto the record, so records with a stale or missing
/// class still count. Records for sessions outside `sessions` are ignored.
pub fn course_report(sessions: &[SessionRecord], attendance: &[AttendanceRecord]) -> CourseReport {
    let mut rosters: HashMap<&str, Vec<String>> = sessions
        .iter()
        .map(|session| (session.session_id.as_str(), Vec::new()))
        .collect();

    let mut tallies: HashMap<String, u64> = HashMap::new();

    for record in attendance {
        let Some(roster) = rosters.get_mut(record.session_id.as_str()) else {
            continue;
        };
        roster.push(record.email.clone());
        *tallies.entry(normalize_email(&record.email)).or_insert(0) += 1;
    }

    let total = rosters.len() as u64;

    let mut roster: Vec<RosterEntry> = tallies
        .into_iter()
        .map(|(email, attended)| RosterEntry {
            email,
            attended,
            total,
            ratio: attendance_ratio(attended, total),
        })
        .collect();
    roster.sort_by(|a, b| a.email.cmp(&b.email));

    // Stable sort keeps discovery order among sessions sharing a date.
    let mut ordered: Vec<&SessionRecord> = sessions.iter().collect();
    ordered.sort_by(|a, b| a.date().cmp(b.date()));
    ordered.dedup_by(|a, b| a.session_id == b.session_id);

    let mut report = CourseReport {
        roster,
        ..CourseReport::default()
    };
    let mut daily_details = BTreeMap::new();

    for session in ordered {
        let attendees = rosters
            .get(session.session_id.as_str())
            .cloned()
            .unwrap_or_default();
        let date = session.date().to_string();

        report.graph_labels.push(date.clone());
        report.graph_data.push(attendees.len() as u64);
        daily_details.insert(date.clone(), attendees.clone());
        report.session_details.push(SessionDetail {
            session_id: session.session_id.clone(),
            date,
            attendees,
        });
    }

    report.daily_details = daily_details;
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, class: &str, created_at: &str) -> SessionRecord {
        SessionRecord {
            session_id: id.to_string(),
            class_name: class.to_string(),
            created_at: created_at.to_string(),
        }
    }

    fn attendance(session_id: &str, email: &str, class: Option<&str>) -> AttendanceRecord {
        AttendanceRecord {
            session_id: session_id.to_string(),
            email: email.to_string(),
            timestamp: "2025-01-10T10:00:00.000000".to_string(),
            class_name: class.map(str::to_string),
        }
    }

    #[test]
    fn test_session_counts_keep_first_seen_order() {
        let records = vec![
            attendance("s2", "a@x.edu", None),
            attendance("s1", "a@x.edu", None),
            attendance("s2", "b@x.edu", None),
            attendance("s2", "c@x.edu", None),
        ];

        let counts = session_counts(&records);
        assert_eq!(counts.labels, vec!["s2", "s1"]);
        assert_eq!(counts.data, vec![3, 1]);
    }

    #[test]
    fn test_session_counts_empty() {
        assert_eq!(session_counts(&[]), SessionCounts::default());
    }

    #[test]
    fn test_student_history_truncates_dates() {
        let mut untimed = attendance("s2", "a@x.edu", None);
        untimed.timestamp = "2025-01-11".to_string();

        let history = student_history(&[attendance("s1", "a@x.edu", Some("CS1660")), untimed]);
        assert_eq!(
            history,
            vec![
                HistoryEntry {
                    class: "CS1660".to_string(),
                    date: "2025-01-10".to_string(),
                },
                HistoryEntry {
                    class: "Unknown".to_string(),
                    date: "2025-01-11".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_attendance_ratio() {
        assert_eq!(attendance_ratio(3, 4), 75.0);
        assert_eq!(attendance_ratio(1, 3), 33.3);
        assert_eq!(attendance_ratio(2, 3), 66.7);
        assert_eq!(attendance_ratio(4, 4), 100.0);
        assert_eq!(attendance_ratio(0, 0), 0.0);
        assert_eq!(attendance_ratio(5, 0), 0.0);
    }

    #[test]
    fn test_attendance_ratio_ties_round_to_even() {
        assert_eq!(attendance_ratio(1, 16), 6.2);
        assert_eq!(attendance_ratio(3, 16), 18.8);
        assert_eq!(attendance_ratio(5, 16), 31.2);
        assert_eq!(attendance_ratio(9, 16), 56.2);
        assert_eq!(attendance_ratio(13, 16), 81.2);
        assert_eq!(attendance_ratio(2, 32), 6.2);
    }

    #[test]
    fn test_course_report_three_of_four() {
        let sessions = vec![
            session("s1", "CS1660", "2025-01-06T09:00:00"),
            session("s2", "CS1660", "2025-01-08T09:00:00"),
            session("s3", "CS1660", "2025-01-13T09:00:00"),
            session("s4", "CS1660", "2025-01-15T09:00:00"),
        ];
        let records = vec![
            attendance("s1", "ada@pitt.edu", Some("CS1660")),
            attendance("s2", "ada@pitt.edu", Some("CS1660")),
            attendance("s4", "ada@pitt.edu", Some("CS1660")),
            attendance("s4", "bob@pitt.edu", Some("CS1660")),
        ];

        let report = course_report(&sessions, &records);

        assert_eq!(
            report.graph_labels,
            vec!["2025-01-06", "2025-01-08", "2025-01-13", "2025-01-15"]
        );
        assert_eq!(report.graph_data, vec![1, 1, 0, 2]);
        assert_eq!(
            report.roster,
            vec![
                RosterEntry {
                    email: "ada@pitt.edu".to_string(),
                    attended: 3,
                    total: 4,
                    ratio: 75.0,
                },
                RosterEntry {
                    email: "bob@pitt.edu".to_string(),
                    attended: 1,
                    total: 4,
                    ratio: 25.0,
                },
            ]
        );
        assert_eq!(report.daily_details["2025-01-13"], Vec::<String>::new());
        assert_eq!(
            report.daily_details["2025-01-15"],
            vec!["ada@pitt.edu", "bob@pitt.edu"]
        );
    }

    #[test]
    fn test_course_report_sorts_sessions_by_date() {
        let sessions = vec![
            session("late", "CS1660", "2025-03-01T09:00:00"),
            session("early", "CS1660", "2025-01-01T09:00:00"),
            session("mid", "CS1660", "2025-02-01"),
        ];
        let records = vec![attendance("late", "a@x.edu", None)];

        let report = course_report(&sessions, &records);
        assert_eq!(
            report.graph_labels,
            vec!["2025-01-01", "2025-02-01", "2025-03-01"]
        );
        assert_eq!(report.graph_data, vec![0, 0, 1]);
        let ids: Vec<&str> = report
            .session_details
            .iter()
            .map(|d| d.session_id.as_str())
            .collect();
        assert_eq!(ids, vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_course_report_without_sessions() {
        let records = vec![attendance("elsewhere", "a@x.edu", Some("CS1660"))];
        let report = course_report(&[], &records);

        assert!(report.graph_labels.is_empty());
        assert!(report.graph_data.is_empty());
        assert!(report.roster.is_empty());
        assert!(report.daily_details.is_empty());
        assert!(report.session_details.is_empty());
    }

    #[test]
    fn test_course_report_links_by_session_not_class_name() {
        let sessions = vec![session("s1", "CS1660", "2025-01-06T09:00:00")];
        let records = vec![
            attendance("s1", "stale@x.edu", Some("Unknown Class")),
            attendance("s1", "legacy@x.edu", None),
            attendance("other", "intruder@x.edu", Some("CS1660")),
        ];

        let report = course_report(&sessions, &records);
        assert_eq!(report.graph_data, vec![2]);
        let emails: Vec<&str> = report.roster.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(emails, vec!["legacy@x.edu", "stale@x.edu"]);
    }

    #[test]
    fn test_roster_tallies_normalized_emails() {
        let sessions = vec![
            session("s1", "CS1660", "2025-01-06T09:00:00"),
            session("s2", "CS1660", "2025-01-08T09:00:00"),
        ];
        let records = vec![
            attendance("s1", "Ada@Pitt.edu ", None),
            attendance("s2", "ada@pitt.edu", None),
        ];

        let report = course_report(&sessions, &records);
        assert_eq!(report.roster.len(), 1);
        assert_eq!(report.roster[0].email, "ada@pitt.edu");
        assert_eq!(report.roster[0].attended, 2);
        assert_eq!(report.roster[0].ratio, 100.0);
    }

    // Two sessions on one date share a single `daily_details` entry; the
    // later session in sorted order replaces the earlier one's roster.
    #[test]
    fn test_same_date_sessions_collide_in_daily_details() {
        let sessions = vec![
            session("morning", "CS1660", "2025-01-06T09:00:00"),
            session("evening", "CS1660", "2025-01-06T18:00:00"),
        ];
        let records = vec![
            attendance("morning", "early@x.edu", None),
            attendance("evening", "late@x.edu", None),
        ];

        let report = course_report(&sessions, &records);

        assert_eq!(report.graph_labels, vec!["2025-01-06", "2025-01-06"]);
        assert_eq!(report.graph_data, vec![1, 1]);
        assert_eq!(report.daily_details.len(), 1);
        assert_eq!(report.daily_details["2025-01-06"], vec!["late@x.edu"]);

        assert_eq!(report.session_details.len(), 2);
        assert_eq!(report.session_details[0].session_id, "morning");
        assert_eq!(report.session_details[0].attendees, vec!["early@x.edu"]);
        assert_eq!(report.session_details[1].session_id, "evening");
        assert_eq!(report.session_details[1].attendees, vec!["late@x.edu"]);
    }
}
