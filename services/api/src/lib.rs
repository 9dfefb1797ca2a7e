//! Attendance tracking API
//!
//! Sessions, check-ins and course names live in a single key-value table;
//! check-ins are announced on a notification topic.

pub mod analytics;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;

pub use state::AppState;
