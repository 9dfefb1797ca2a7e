//! Attendance API routes

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    AppState, analytics,
    error::{ApiError, ApiResult},
    extract::JsonBody,
    models::{
        CourseDetailsQuery, CourseReport, CourseRequest, CreateSessionRequest,
        CreateSessionResponse, HistoryEntry, MarkAttendanceRequest, MessageResponse,
        SessionCounts, StudentHistoryQuery,
        records::{
            AttendanceRecord, CourseRecord, SessionRecord, UNKNOWN_CLASS, iso_timestamp,
            normalize_email,
        },
    },
};

/// Subject of the check-in notification
pub const NOTIFICATION_SUBJECT: &str = "New Attendance Record";

/// Create the router for the attendance API
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/create-session", post(create_session))
        .route("/mark-attendance", post(mark_attendance))
        .route("/analytics", get(get_analytics))
        .route("/student-history", get(get_student_history))
        .route("/course-details", get(get_course_details))
        .route(
            "/courses",
            get(list_courses).post(add_course).delete(delete_course),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A present, non-blank field value with surrounding whitespace removed
fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing(field))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "attendance-api"
    }))
}

/// Open a new session for a class; the returned id is what the QR code carries
pub async fn create_session(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateSessionRequest>,
) -> ApiResult<Json<CreateSessionResponse>> {
    let class_name = required(payload.class_name, "className")?;

    let session = SessionRecord::new(class_name, Utc::now());
    state.repository.put_session(&session).await?;

    info!(
        "Created session {} for class {}",
        session.session_id, session.class_name
    );

    Ok(Json(CreateSessionResponse {
        check_in_url: state.config.check_in_url(&session.session_id),
        session_id: session.session_id,
        message: "Session Created".to_string(),
    }))
}

/// Record a student's check-in to a session
pub async fn mark_attendance(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<MarkAttendanceRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let session_id = required(payload.session_id, "sessionId")?;
    let email = normalize_email(&required(payload.email, "email")?);

    // A check-in to an unknown session is still recorded.
    let class_name = state
        .repository
        .find_session(&session_id)
        .await?
        .map(|session| session.class_name)
        .unwrap_or_else(|| UNKNOWN_CLASS.to_string());

    let record = AttendanceRecord {
        session_id,
        email,
        timestamp: iso_timestamp(Utc::now()),
        class_name: Some(class_name),
    };

    let first_check_in = state.repository.put_attendance(&record).await?;
    info!(
        "Student {} checked into session {} (first: {})",
        record.email, record.session_id, first_check_in
    );

    if state.config.notify_policy.should_notify(first_check_in) {
        let message = format!(
            "Student {} checked into session {}",
            record.email, record.session_id
        );
        state
            .notifier
            .publish(NOTIFICATION_SUBJECT, &message)
            .await
            .inspect_err(|e| {
                error!(
                    "Attendance of {} in session {} was stored but the notification failed: {}",
                    record.email, record.session_id, e
                );
            })?;
    }

    Ok(Json(MessageResponse::new("Attendance Marked!")))
}

/// Check-in counts per session across all classes
pub async fn get_analytics(State(state): State<AppState>) -> ApiResult<Json<SessionCounts>> {
    let records = state.repository.list_attendance().await?;
    Ok(Json(analytics::session_counts(&records)))
}

/// Every class a student has checked into
pub async fn get_student_history(
    State(state): State<AppState>,
    Query(query): Query<StudentHistoryQuery>,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    let email = normalize_email(&query.email.unwrap_or_default());
    if email.is_empty() {
        return Err(ApiError::missing("email"));
    }

    let records = state.repository.list_attendance_by_student(&email).await?;
    Ok(Json(analytics::student_history(&records)))
}

/// Trend, roster and per-session detail for one class
pub async fn get_course_details(
    State(state): State<AppState>,
    Query(query): Query<CourseDetailsQuery>,
) -> ApiResult<Json<CourseReport>> {
    let class_name = query.class_name.unwrap_or_default();
    let (sessions, attendance) = state
        .repository
        .load_course_records(&class_name)
        .await?;

    Ok(Json(analytics::course_report(&sessions, &attendance)))
}

/// Known class names, alphabetically
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let mut names: Vec<String> = state
        .repository
        .list_courses()
        .await?
        .into_iter()
        .map(|course| course.class_name)
        .collect();
    names.sort();
    names.dedup();

    Ok(Json(names))
}

/// Add a class name to the roster; adding it again is harmless
pub async fn add_course(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CourseRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let class_name = required(payload.class_name, "className")?;
    state
        .repository
        .put_course(&CourseRecord {
            class_name: class_name.clone(),
        })
        .await?;

    info!("Course added: {}", class_name);
    Ok(Json(MessageResponse::new("Course added")))
}

/// Remove a class name from the roster; unknown names are ignored
pub async fn delete_course(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CourseRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let class_name = required(payload.class_name, "className")?;
    state.repository.delete_course(&class_name).await?;

    info!("Course deleted: {}", class_name);
    Ok(Json(MessageResponse::new("Course deleted")))
}
