//! Per-entity record reshaping and row filters

use super::{EntityContext, EntityKind};
use crate::frame::{Cell, Frame};
use crate::normalize::parse_timestamp;
use serde_json::{Map, Value};

/// Fallback when a usage report carries no interaction time
const NEVER_USED: &str = "1970-01-01T00:00:00.00Z";

/// Reshape raw records before flattening. May emit more or fewer records
/// than it receives.
pub fn preprocess(kind: EntityKind, records: Vec<Value>, ctx: &EntityContext) -> Vec<Value> {
    match kind {
        EntityKind::Students | EntityKind::Teachers => {
            records.into_iter().map(lift_profile).collect()
        }
        EntityKind::CourseWork => records.into_iter().map(collapse_due_date).collect(),
        EntityKind::StudentSubmissions => records.iter().map(flatten_submission).collect(),
        EntityKind::StudentUsage => records
            .iter()
            .map(|record| usage_row(record, ctx))
            .collect(),
        EntityKind::Meet => records.iter().flat_map(explode_meet_events).collect(),
        EntityKind::Announcements => records.into_iter().map(strip_nul_text).collect(),
        _ => records,
    }
}

/// Drop rows the entity does not keep. Runs on the reindexed frame.
pub fn filter(kind: EntityKind, frame: Frame, ctx: &EntityContext) -> Frame {
    match kind {
        EntityKind::Courses => {
            let start = ctx.school_year_start;
            frame.filter(|row| {
                row.get("updateTime")
                    .and_then(cell_timestamp)
                    .is_some_and(|ts| ts >= start)
            })
        }
        EntityKind::OrgUnits => match ctx.student_org_unit.as_deref() {
            Some(unit) => frame.filter(|row| row.get_str("name") == Some(unit)),
            None => frame,
        },
        _ => frame,
    }
}

fn cell_timestamp(cell: &Cell) -> Option<chrono::NaiveDateTime> {
    match cell {
        Cell::Timestamp(ts) => Some(*ts),
        Cell::Text(s) => parse_timestamp(s),
        _ => None,
    }
}

fn lift_profile(mut record: Value) -> Value {
    let full_name = record.pointer("/profile/name/fullName").cloned();
    let email = record.pointer("/profile/emailAddress").cloned();
    if let Some(obj) = record.as_object_mut() {
        obj.insert("fullName".into(), full_name.unwrap_or(Value::Null));
        obj.insert("emailAddress".into(), email.unwrap_or(Value::Null));
    }
    record
}

fn collapse_due_date(mut record: Value) -> Value {
    let Some(due) = record.get("dueDate") else {
        return record;
    };
    let part = |v: &Value, key: &str| v.get(key).and_then(Value::as_i64).unwrap_or(0);
    let (year, month, day) = (part(due, "year"), part(due, "month"), part(due, "day"));
    let (hours, minutes) = record
        .get("dueTime")
        .map_or((0, 0), |t| (part(t, "hours"), part(t, "minutes")));

    let stamp = format!("{year:04}-{month:02}-{day:02} {hours:02}:{minutes:02}:00");
    if let Some(obj) = record.as_object_mut() {
        obj.insert("dueDate".into(), Value::String(stamp));
        obj.remove("dueTime");
    }
    record
}

fn flatten_submission(record: &Value) -> Value {
    let mut parsed = Map::new();
    for key in [
        "courseId",
        "courseWorkId",
        "id",
        "userId",
        "creationTime",
        "updateTime",
        "state",
        "draftGrade",
        "assignedGrade",
        "courseWorkType",
    ] {
        parsed.insert(key.into(), record.get(key).cloned().unwrap_or(Value::Null));
    }
    parsed.insert(
        "late".into(),
        record.get("late").cloned().unwrap_or(Value::Bool(false)),
    );

    let history = record
        .get("submissionHistory")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for entry in history {
        if let Some(state) = entry.get("stateHistory") {
            let target = match state.get("state").and_then(Value::as_str) {
                Some("CREATED") => Some("createdTime"),
                Some("TURNED_IN") => Some("turnedInTimestamp"),
                Some("RETURNED") => Some("returnedTimestamp"),
                _ => None,
            };
            if let Some(column) = target {
                let stamp = state.get("stateTimestamp").cloned().unwrap_or(Value::Null);
                parsed.insert(column.into(), stamp);
            }
        }

        if let Some(grade) = entry.get("gradeHistory") {
            let prefix = match grade.get("gradeChangeType").and_then(Value::as_str) {
                Some("DRAFT_GRADE_POINTS_EARNED_CHANGE") => Some("draft"),
                Some("ASSIGNED_GRADE_POINTS_EARNED_CHANGE") => Some("assigned"),
                _ => None,
            };
            if let Some(prefix) = prefix {
                let field = |key: &str| grade.get(key).cloned().unwrap_or(Value::Null);
                parsed.insert(format!("{prefix}MaxPoints"), field("maxPoints"));
                parsed.insert(format!("{prefix}GradeTimestamp"), field("gradeTimestamp"));
                parsed.insert(format!("{prefix}GraderId"), field("actorUserId"));
            }
        }
    }

    Value::Object(parsed)
}

fn usage_row(record: &Value, ctx: &EntityContext) -> Value {
    let last_used = match record.get("parameters").and_then(Value::as_array) {
        Some(parameters) if !parameters.is_empty() => parameters[0]
            .get("datetimeValue")
            .cloned()
            .unwrap_or(Value::Null),
        _ => Value::String(NEVER_USED.to_string()),
    };

    serde_json::json!({
        "Email": record.pointer("/entity/userEmail").cloned().unwrap_or(Value::Null),
        "AsOfDate": record.get("date").cloned().unwrap_or(Value::Null),
        "LastUsedTime": last_used,
        "ImportDate": ctx.today.format("%Y-%m-%d").to_string(),
    })
}

fn explode_meet_events(record: &Value) -> Vec<Value> {
    let item_time = record.pointer("/id/time").cloned().unwrap_or(Value::Null);
    let Some(events) = record.get("events").and_then(Value::as_array) else {
        return Vec::new();
    };

    events
        .iter()
        .filter(|event| event.get("name").and_then(Value::as_str) == Some("call_ended"))
        .map(|event| {
            let mut row = Map::new();
            row.insert("item_time".into(), item_time.clone());
            row.insert("event_name".into(), Value::String("call_ended".into()));

            let parameters = event
                .get("parameters")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for parameter in parameters {
                if let Some(name) = parameter.get("name").and_then(Value::as_str) {
                    row.insert(name.to_string(), parameter_value(parameter));
                }
            }
            Value::Object(row)
        })
        .collect()
}

/// First truthy of `value`, `intValue`, then whatever `boolValue` holds
fn parameter_value(parameter: &Value) -> Value {
    ["value", "intValue"]
        .iter()
        .filter_map(|key| parameter.get(*key))
        .find(|v| is_truthy(v))
        .cloned()
        .unwrap_or_else(|| parameter.get("boolValue").cloned().unwrap_or(Value::Null))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn strip_nul_text(mut record: Value) -> Value {
    if let Some(text) = record.get("text").and_then(Value::as_str) {
        let cleaned = text.replace('\0', "");
        record["text"] = Value::String(cleaned);
    }
    record
}
