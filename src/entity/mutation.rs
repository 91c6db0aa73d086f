//! Sync mutation requests

use super::EntityKind;
use crate::api::{ApiRequest, ApiService};
use crate::error::{Error, Result};
use crate::frame::Row;
use crate::types::Method;
use serde_json::{json, Value};

/// Request creating the entity described by a to-create row
pub fn create_request(kind: EntityKind, row: Row<'_>) -> Result<ApiRequest> {
    match kind {
        EntityKind::Courses => Ok(ApiRequest::new(ApiService::Classroom, Method::POST, "courses")
            .json(json!({
                "id": required(kind, row, "alias")?,
                "name": optional(row, "name"),
                "section": optional(row, "section"),
                "ownerId": optional(row, "teacher_email"),
                "courseState": "ACTIVE",
            }))),
        EntityKind::Students | EntityKind::Teachers => {
            let collection = roster_collection(kind);
            let alias = required(kind, row, "alias")?;
            Ok(ApiRequest::new(
                ApiService::Classroom,
                Method::POST,
                format!("courses/{alias}/{collection}"),
            )
            .json(json!({ "userId": required(kind, row, "emailAddress")? })))
        }
        _ => Err(not_syncable(kind)),
    }
}

/// Request removing the entity described by a to-delete row.
///
/// Courses are archived rather than deleted.
pub fn delete_request(kind: EntityKind, row: Row<'_>) -> Result<ApiRequest> {
    match kind {
        EntityKind::Courses => {
            let course_id = required(kind, row, "courseId")?;
            Ok(
                ApiRequest::new(ApiService::Classroom, Method::PATCH, format!("courses/{course_id}"))
                    .query("updateMask", "courseState")
                    .json(json!({ "courseState": "ARCHIVED" })),
            )
        }
        EntityKind::Students | EntityKind::Teachers => {
            let collection = roster_collection(kind);
            let course_id = required(kind, row, "courseId")?;
            let user_id = required(kind, row, "userId")?;
            Ok(ApiRequest::new(
                ApiService::Classroom,
                Method::DELETE,
                format!("courses/{course_id}/{collection}/{user_id}"),
            ))
        }
        _ => Err(not_syncable(kind)),
    }
}

fn roster_collection(kind: EntityKind) -> &'static str {
    if kind == EntityKind::Teachers {
        "teachers"
    } else {
        "students"
    }
}

fn required(kind: EntityKind, row: Row<'_>, column: &str) -> Result<String> {
    row.get(column)
        .and_then(crate::frame::Cell::to_text)
        .ok_or_else(|| Error::sync(kind.name(), format!("row has no value for '{column}'")))
}

fn optional(row: Row<'_>, column: &str) -> Value {
    row.get(column)
        .and_then(crate::frame::Cell::to_text)
        .map_or(Value::Null, Value::String)
}

fn not_syncable(kind: EntityKind) -> Error {
    Error::sync(kind.name(), "entity does not support sync")
}
