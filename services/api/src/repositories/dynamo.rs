//! DynamoDB attendance repository
//!
//! ## Table Schema
//!
//! ```text
//! Primary Key:
//!   - PK (String, Partition Key): "SESSION#{id}" or "COURSE#{className}"
//!   - SK (String, Sort Key):      "METADATA" or "STUDENT#{email}"
//!
//! Attributes:
//!   - Type: "Session" | "Attendance" | "CourseMeta"
//!   - ClassName: String
//!   - CreatedAt: String (sessions, ISO-8601)
//!   - Email: String (attendance, normalized)
//!   - Timestamp: String (attendance, ISO-8601)
//! ```
//!
//! Every listing is a paginated `Scan` with a filter expression. That is
//! fine at classroom scale; a secondary index would replace it behind the
//! same trait.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use common::error::{DatabaseError, DatabaseResult};
use tracing::{debug, warn};

use super::AttendanceRepository;
use crate::models::records::{
    AttendanceRecord, COURSE_PREFIX, CourseRecord, METADATA_SK, SESSION_PREFIX, STUDENT_PREFIX,
    SessionRecord, course_pk, session_id_from_pk, session_pk,
};

pub const ATTR_PK: &str = "PK";
pub const ATTR_SK: &str = "SK";
/// Note: "Type" is a DynamoDB reserved word, use ExpressionAttributeNames
pub const ATTR_TYPE: &str = "Type";
pub const ATTR_CLASS_NAME: &str = "ClassName";
pub const ATTR_CREATED_AT: &str = "CreatedAt";
pub const ATTR_EMAIL: &str = "Email";
pub const ATTR_TIMESTAMP: &str = "Timestamp";

pub const TYPE_SESSION: &str = "Session";
pub const TYPE_ATTENDANCE: &str = "Attendance";
pub const TYPE_COURSE: &str = "CourseMeta";

type Item = HashMap<String, AttributeValue>;

/// Filter expression plus its placeholders, reused for every scan page
#[derive(Debug, Clone)]
struct ScanFilter {
    expression: &'static str,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl ScanFilter {
    fn new(expression: &'static str) -> Self {
        Self {
            expression,
            names: HashMap::new(),
            values: HashMap::new(),
        }
    }

    fn name(mut self, placeholder: &str, attribute: &str) -> Self {
        self.names
            .insert(placeholder.to_string(), attribute.to_string());
        self
    }

    fn value(mut self, placeholder: &str, value: &str) -> Self {
        self.values
            .insert(placeholder.to_string(), AttributeValue::S(value.to_string()));
        self
    }

    fn attendance() -> Self {
        Self::new("#type = :attendance")
            .name("#type", ATTR_TYPE)
            .value(":attendance", TYPE_ATTENDANCE)
    }
}

/// Attendance repository over a single DynamoDB table
#[derive(Clone)]
pub struct DynamoRepository {
    client: Client,
    table_name: String,
}

impl std::fmt::Debug for DynamoRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoRepository")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl DynamoRepository {
    /// Create a new repository over `table_name`
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Scan the whole table, following `LastEvaluatedKey` until exhausted
    async fn scan(&self, filter: &ScanFilter) -> DatabaseResult<Vec<Item>> {
        let mut items = Vec::new();
        let mut last_evaluated_key = None;
        let mut pages = 0usize;

        loop {
            let mut request = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression(filter.expression)
                .set_expression_attribute_names(Some(filter.names.clone()))
                .set_expression_attribute_values(Some(filter.values.clone()));

            if let Some(key) = last_evaluated_key.take() {
                request = request.set_exclusive_start_key(Some(key));
            }

            let response = request
                .send()
                .await
                .map_err(|e| request_error("Scan", e))?;
            pages += 1;

            items.extend(response.items().iter().cloned());

            match response.last_evaluated_key() {
                Some(key) if !key.is_empty() => {
                    last_evaluated_key = Some(key.clone());
                }
                _ => break,
            }
        }

        debug!(
            "Scanned {} ({}): {} items in {} pages",
            self.table_name,
            filter.expression,
            items.len(),
            pages
        );
        Ok(items)
    }

    async fn put_item(&self, item: Item) -> DatabaseResult<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| request_error("PutItem", e))?;
        Ok(())
    }
}

fn request_error<E: std::error::Error>(operation: &str, err: E) -> DatabaseError {
    DatabaseError::Request(format!(
        "DynamoDB {} failed: {}",
        operation,
        DisplayErrorContext(&err)
    ))
}

fn string_attr<'a>(item: &'a Item, name: &str) -> Option<&'a String> {
    item.get(name).and_then(|v| v.as_s().ok())
}

fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

pub fn session_to_item(session: &SessionRecord) -> Item {
    HashMap::from([
        (ATTR_PK.to_string(), s(session.partition_key())),
        (ATTR_SK.to_string(), s(METADATA_SK)),
        (ATTR_CLASS_NAME.to_string(), s(&session.class_name)),
        (ATTR_CREATED_AT.to_string(), s(&session.created_at)),
        (ATTR_TYPE.to_string(), s(TYPE_SESSION)),
    ])
}

pub fn attendance_to_item(record: &AttendanceRecord) -> Item {
    let mut item = HashMap::from([
        (ATTR_PK.to_string(), s(record.partition_key())),
        (ATTR_SK.to_string(), s(record.sort_key())),
        (ATTR_EMAIL.to_string(), s(&record.email)),
        (ATTR_TIMESTAMP.to_string(), s(&record.timestamp)),
        (ATTR_TYPE.to_string(), s(TYPE_ATTENDANCE)),
    ]);
    if let Some(class_name) = &record.class_name {
        item.insert(ATTR_CLASS_NAME.to_string(), s(class_name));
    }
    item
}

pub fn course_to_item(course: &CourseRecord) -> Item {
    HashMap::from([
        (ATTR_PK.to_string(), s(course.partition_key())),
        (ATTR_SK.to_string(), s(METADATA_SK)),
        (ATTR_CLASS_NAME.to_string(), s(&course.class_name)),
        (ATTR_TYPE.to_string(), s(TYPE_COURSE)),
    ])
}

/// Decode a session metadata item. Sessions without a class name cannot be
/// attributed to any course and are treated as absent.
pub fn item_to_session(item: &Item) -> Option<SessionRecord> {
    let pk = string_attr(item, ATTR_PK)?;
    if !pk.starts_with(SESSION_PREFIX) || string_attr(item, ATTR_SK)? != METADATA_SK {
        return None;
    }

    Some(SessionRecord {
        session_id: session_id_from_pk(pk).to_string(),
        class_name: string_attr(item, ATTR_CLASS_NAME)?.clone(),
        created_at: string_attr(item, ATTR_CREATED_AT)
            .cloned()
            .unwrap_or_default(),
    })
}

/// Decode an attendance item. Older items may lack `Email` or `ClassName`;
/// the email is then taken from the sort key.
pub fn item_to_attendance(item: &Item) -> Option<AttendanceRecord> {
    let pk = string_attr(item, ATTR_PK)?;
    if !pk.starts_with(SESSION_PREFIX) {
        return None;
    }
    let sk_email = string_attr(item, ATTR_SK)?.strip_prefix(STUDENT_PREFIX)?;

    Some(AttendanceRecord {
        session_id: session_id_from_pk(pk).to_string(),
        email: string_attr(item, ATTR_EMAIL)
            .cloned()
            .unwrap_or_else(|| sk_email.to_string()),
        timestamp: string_attr(item, ATTR_TIMESTAMP)
            .cloned()
            .unwrap_or_default(),
        class_name: string_attr(item, ATTR_CLASS_NAME).cloned(),
    })
}

pub fn item_to_course(item: &Item) -> Option<CourseRecord> {
    let name_from_pk = string_attr(item, ATTR_PK)?.strip_prefix(COURSE_PREFIX)?;
    if string_attr(item, ATTR_SK)? != METADATA_SK {
        return None;
    }

    Some(CourseRecord {
        class_name: string_attr(item, ATTR_CLASS_NAME)
            .cloned()
            .unwrap_or_else(|| name_from_pk.to_string()),
    })
}

fn decode_all<T>(items: &[Item], kind: &str, decode: fn(&Item) -> Option<T>) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| {
            let decoded = decode(item);
            if decoded.is_none() {
                warn!(
                    "Skipping item that is not a valid {} record: {:?}",
                    kind,
                    string_attr(item, ATTR_PK)
                );
            }
            decoded
        })
        .collect()
}

#[async_trait]
impl AttendanceRepository for DynamoRepository {
    async fn put_session(&self, session: &SessionRecord) -> DatabaseResult<()> {
        self.put_item(session_to_item(session)).await
    }

    async fn find_session(&self, session_id: &str) -> DatabaseResult<Option<SessionRecord>> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(ATTR_PK, s(session_pk(session_id)))
            .key(ATTR_SK, s(METADATA_SK))
            .send()
            .await
            .map_err(|e| request_error("GetItem", e))?;

        Ok(response.item().and_then(item_to_session))
    }

    async fn put_attendance(&self, record: &AttendanceRecord) -> DatabaseResult<bool> {
        // ALL_OLD hands back the overwritten item, so first-ness is decided
        // by the same write that stores the record.
        let response = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(attendance_to_item(record)))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| request_error("PutItem", e))?;

        Ok(response.attributes().is_none_or(|old| old.is_empty()))
    }

    async fn list_attendance(&self) -> DatabaseResult<Vec<AttendanceRecord>> {
        let items = self.scan(&ScanFilter::attendance()).await?;
        Ok(decode_all(&items, TYPE_ATTENDANCE, item_to_attendance))
    }

    async fn list_attendance_by_student(
        &self,
        email: &str,
    ) -> DatabaseResult<Vec<AttendanceRecord>> {
        let filter = ScanFilter::new("#sk = :sk")
            .name("#sk", ATTR_SK)
            .value(":sk", &format!("{STUDENT_PREFIX}{email}"));
        let items = self.scan(&filter).await?;
        Ok(decode_all(&items, TYPE_ATTENDANCE, item_to_attendance))
    }

    async fn list_sessions_by_class(&self, class_name: &str) -> DatabaseResult<Vec<SessionRecord>> {
        let filter =
            ScanFilter::new("begins_with(#pk, :session) AND #sk = :metadata AND #class = :class")
                .name("#pk", ATTR_PK)
                .name("#sk", ATTR_SK)
                .name("#class", ATTR_CLASS_NAME)
                .value(":session", SESSION_PREFIX)
                .value(":metadata", METADATA_SK)
                .value(":class", class_name);
        let items = self.scan(&filter).await?;
        Ok(decode_all(&items, TYPE_SESSION, item_to_session))
    }

    async fn list_attendance_by_sessions(
        &self,
        session_ids: &HashSet<String>,
    ) -> DatabaseResult<Vec<AttendanceRecord>> {
        if session_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Membership is checked here rather than in the filter expression,
        // which caps the number of placeholder values.
        let items = self.scan(&ScanFilter::attendance()).await?;
        Ok(decode_all(&items, TYPE_ATTENDANCE, item_to_attendance)
            .into_iter()
            .filter(|record| session_ids.contains(&record.session_id))
            .collect())
    }

    async fn load_course_records(
        &self,
        class_name: &str,
    ) -> DatabaseResult<(Vec<SessionRecord>, Vec<AttendanceRecord>)> {
        // One scan over every SESSION# item, so the sessions and their
        // attendance come from the same read.
        let filter = ScanFilter::new("begins_with(#pk, :session)")
            .name("#pk", ATTR_PK)
            .value(":session", SESSION_PREFIX);
        let items = self.scan(&filter).await?;

        let sessions: Vec<SessionRecord> = items
            .iter()
            .filter_map(item_to_session)
            .filter(|session| session.class_name == class_name)
            .collect();
        let session_ids: HashSet<&str> = sessions
            .iter()
            .map(|session| session.session_id.as_str())
            .collect();
        let attendance = items
            .iter()
            .filter_map(item_to_attendance)
            .filter(|record| session_ids.contains(record.session_id.as_str()))
            .collect();

        Ok((sessions, attendance))
    }

    async fn list_courses(&self) -> DatabaseResult<Vec<CourseRecord>> {
        let filter = ScanFilter::new("begins_with(#pk, :course) AND #sk = :metadata")
            .name("#pk", ATTR_PK)
            .name("#sk", ATTR_SK)
            .value(":course", COURSE_PREFIX)
            .value(":metadata", METADATA_SK);
        let items = self.scan(&filter).await?;
        Ok(decode_all(&items, TYPE_COURSE, item_to_course))
    }

    async fn put_course(&self, course: &CourseRecord) -> DatabaseResult<()> {
        self.put_item(course_to_item(course)).await
    }

    async fn delete_course(&self, class_name: &str) -> DatabaseResult<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(ATTR_PK, s(course_pk(class_name)))
            .key(ATTR_SK, s(METADATA_SK))
            .send()
            .await
            .map_err(|e| request_error("DeleteItem", e))?;
        Ok(())
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        common::database::health_check(&self.client, &self.table_name).await
    }
}
