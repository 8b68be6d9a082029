//! Wire record shapes and store-boundary normalization.
//!
//! Raw records arrive as JSON with string date fields. Normalization parses
//! dates fail-closed (see [`crate::parse`]), maps unknown categories to
//! reminder, and validates `recurrence_days` against the closed weekday set.

use {
    chrono::{DateTime, Utc, Weekday},
    serde::{Deserialize, Serialize},
    serde_json::{Value, json},
    tracing::warn,
};

use crate::{
    parse::{format_instant, parse_instant},
    types::{Event, EventCategory, RecurrenceKind, Task, Visibility},
};

/// Raw event row as the store returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Raw task row as the store returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub recurrence_type: Option<String>,
    #[serde(default)]
    pub recurrence_days: Option<Vec<String>>,
}

/// Normalize a raw event record. Returns `None` (with a warning) when the
/// record does not deserialize or has no usable start date; a calendar entry
/// with no start cannot be placed on the grid.
#[must_use]
pub fn normalize_event(value: &Value) -> Option<Event> {
    let record: EventRecord = match serde_json::from_value(value.clone()) {
        Ok(r) => r,
        Err(error) => {
            warn!(%error, "skipping malformed event record");
            return None;
        },
    };

    let start = match record.start_date.as_deref().and_then(parse_instant) {
        Some(start) => start,
        None => {
            warn!(id = %record.id, "skipping event with unparseable start date");
            return None;
        },
    };
    let end = record
        .end_date
        .as_deref()
        .and_then(parse_instant)
        .unwrap_or(start);

    Some(Event {
        id: record.id,
        title: record.title,
        description: record.description,
        category: EventCategory::from_wire(record.event_type.as_deref().unwrap_or("")),
        start,
        end,
        all_day: record.all_day,
        visibility: Visibility::from_wire(record.visibility.as_deref().unwrap_or("")),
        course_id: record.course_id,
        created_by: record.created_by.unwrap_or_default(),
        created_at: record.created_at.as_deref().and_then(parse_instant),
        updated_at: record.updated_at.as_deref().and_then(parse_instant),
    })
}

/// Normalize a raw task record. Unparseable dates collapse to absent fields;
/// unknown recurrence kinds fail closed to no recurrence; invalid weekday
/// names are dropped.
#[must_use]
pub fn normalize_task(value: &Value) -> Option<Task> {
    let record: TaskRecord = match serde_json::from_value(value.clone()) {
        Ok(r) => r,
        Err(error) => {
            warn!(%error, "skipping malformed task record");
            return None;
        },
    };

    let recurrence = RecurrenceKind::from_wire(record.recurrence_type.as_deref().unwrap_or(""));
    let recurrence_days = record.recurrence_days.map(|names| {
        let mut days: Vec<Weekday> = Vec::with_capacity(names.len());
        for name in &names {
            match name.parse::<Weekday>() {
                Ok(day) if !days.contains(&day) => days.push(day),
                Ok(_) => {},
                Err(_) => warn!(id = %record.id, day = %name, "dropping invalid weekday name"),
            }
        }
        days
    });
    let recurrence_days = recurrence_days.filter(|days| !days.is_empty());

    Some(Task {
        id: record.id,
        title: record.title,
        description: record.description,
        start_date: record.start_date.as_deref().and_then(parse_instant),
        due_date: record.due_date.as_deref().and_then(parse_instant),
        status: record.status,
        recurrence,
        recurrence_days,
    })
}

/// Parameters for creating a new event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCreate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: EventCategory,
    pub start: DateTime<Utc>,
    /// Defaults to `start` when absent.
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub course_id: Option<String>,
    pub created_by: String,
}

/// Fields that can be changed on an existing event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<EventCategory>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub visibility: Option<Visibility>,
    pub course_id: Option<String>,
}

/// Build the wire record for an insert.
#[must_use]
pub fn event_create_record(id: &str, create: &EventCreate, now: DateTime<Utc>) -> Value {
    json!({
        "id": id,
        "title": create.title,
        "description": create.description,
        "event_type": create.category.as_wire(),
        "start_date": format_instant(create.start),
        "end_date": format_instant(create.end.unwrap_or(create.start)),
        "all_day": create.all_day,
        "visibility": create.visibility.as_wire(),
        "course_id": create.course_id,
        "created_by": create.created_by,
        "created_at": format_instant(now),
    })
}

/// Build the partial wire record for an update. Only set fields appear.
#[must_use]
pub fn event_patch_record(patch: &EventPatch, now: DateTime<Utc>) -> Value {
    let mut record = serde_json::Map::new();
    if let Some(title) = &patch.title {
        record.insert("title".into(), json!(title));
    }
    if let Some(description) = &patch.description {
        record.insert("description".into(), json!(description));
    }
    if let Some(category) = patch.category {
        record.insert("event_type".into(), json!(category.as_wire()));
    }
    if let Some(start) = patch.start {
        record.insert("start_date".into(), json!(format_instant(start)));
    }
    if let Some(end) = patch.end {
        record.insert("end_date".into(), json!(format_instant(end)));
    }
    if let Some(all_day) = patch.all_day {
        record.insert("all_day".into(), json!(all_day));
    }
    if let Some(visibility) = patch.visibility {
        record.insert("visibility".into(), json!(visibility.as_wire()));
    }
    if let Some(course_id) = &patch.course_id {
        record.insert("course_id".into(), json!(course_id));
    }
    record.insert("updated_at".into(), json!(format_instant(now)));
    Value::Object(record)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone};

    #[test]
    fn normalize_event_full_record() {
        let value = json!({
            "id": "e1",
            "title": "Midterm",
            "event_type": "exam",
            "start_date": "2025-09-10T09:00:00Z",
            "end_date": "2025-09-10T10:00:00Z",
            "all_day": false,
            "visibility": "course",
            "course_id": "c1",
            "created_by": "u1",
            "created_at": "2025-08-01T12:00:00Z"
        });
        let event = normalize_event(&value).unwrap();
        assert_eq!(event.category, EventCategory::Exam);
        assert_eq!(event.visibility, Visibility::Course);
        assert_eq!(event.end - event.start, chrono::Duration::hours(1));
    }

    #[test]
    fn normalize_event_end_defaults_to_start() {
        let value = json!({
            "id": "e1",
            "title": "Standup",
            "start_date": "2025-09-10T09:00:00Z"
        });
        let event = normalize_event(&value).unwrap();
        assert_eq!(event.end, event.start);
        assert_eq!(event.category, EventCategory::Reminder);
    }

    #[test]
    fn normalize_event_unparseable_start_is_skipped() {
        let value = json!({"id": "e1", "title": "Bad", "start_date": "soon"});
        assert!(normalize_event(&value).is_none());
    }

    #[test]
    fn normalize_event_unknown_category_is_reminder() {
        let value = json!({
            "id": "e1",
            "title": "X",
            "event_type": "festival",
            "start_date": "2025-09-10"
        });
        assert_eq!(
            normalize_event(&value).unwrap().category,
            EventCategory::Reminder
        );
    }

    #[test]
    fn normalize_task_malformed_due_date_collapses_to_none() {
        let value = json!({
            "id": "t1",
            "title": "Essay",
            "due_date": "not-a-date",
            "recurrence_type": "daily"
        });
        let task = normalize_task(&value).unwrap();
        assert!(task.due_date.is_none());
        assert_eq!(task.recurrence, RecurrenceKind::Daily);
    }

    #[test]
    fn normalize_task_weekday_names() {
        let value = json!({
            "id": "t1",
            "title": "Gym",
            "recurrence_type": "weekly",
            "recurrence_days": ["Monday", "wed", "funday", "monday"]
        });
        let task = normalize_task(&value).unwrap();
        let days = task.recurrence_days.unwrap();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Wed]);
    }

    #[test]
    fn normalize_task_all_invalid_weekdays_is_none() {
        let value = json!({
            "id": "t1",
            "title": "Gym",
            "recurrence_type": "weekly",
            "recurrence_days": ["funday"]
        });
        assert!(normalize_task(&value).unwrap().recurrence_days.is_none());
    }

    #[test]
    fn normalize_task_unknown_recurrence_is_none() {
        let value = json!({"id": "t1", "title": "X", "recurrence_type": "hourly"});
        assert_eq!(
            normalize_task(&value).unwrap().recurrence,
            RecurrenceKind::None
        );
    }

    #[test]
    fn create_record_roundtrips_through_normalize() {
        let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
        let create = EventCreate {
            title: "Office hours".into(),
            description: Some("Room 12".into()),
            category: EventCategory::Meeting,
            start: Utc.with_ymd_and_hms(2025, 9, 10, 9, 0, 0).unwrap(),
            end: None,
            all_day: false,
            visibility: Visibility::Private,
            course_id: None,
            created_by: "u1".into(),
        };
        let record = event_create_record("e9", &create, now);
        let event = normalize_event(&record).unwrap();
        assert_eq!(event.id, "e9");
        assert_eq!(event.end, event.start);
        assert_eq!(event.created_at, Some(now));
    }

    #[test]
    fn patch_record_only_includes_set_fields() {
        let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
        let patch = EventPatch {
            title: Some("Moved".into()),
            ..Default::default()
        };
        let record = event_patch_record(&patch, now);
        assert_eq!(record["title"], "Moved");
        assert!(record.get("start_date").is_none());
        assert_eq!(record["updated_at"], "2025-08-01T12:00:00Z");
    }
}
