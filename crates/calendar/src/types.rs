//! Core data types for the calendar engine.

use {
    chrono::{DateTime, NaiveDate, Utc, Weekday},
    serde::{Deserialize, Serialize},
};

/// Category of a calendar event. Unrecognized wire values map to
/// [`EventCategory::Reminder`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Assignment,
    Task,
    Exam,
    Meeting,
    #[default]
    Reminder,
}

impl EventCategory {
    /// Map a wire string to a category, defaulting to reminder.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "assignment" => Self::Assignment,
            "task" => Self::Task,
            "exam" => Self::Exam,
            "meeting" => Self::Meeting,
            _ => Self::Reminder,
        }
    }

    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Task => "task",
            Self::Exam => "exam",
            Self::Meeting => "meeting",
            Self::Reminder => "reminder",
        }
    }
}

/// Who can see an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to the creator only.
    #[default]
    Private,
    /// Tied to an owning course.
    Course,
}

impl Visibility {
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "course" => Self::Course,
            _ => Self::Private,
        }
    }

    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Course => "course",
        }
    }
}

/// Repeat pattern of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Weekdays,
    Weekends,
}

impl RecurrenceKind {
    /// Map a wire string to a recurrence kind. Unknown values fail closed to
    /// [`RecurrenceKind::None`].
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            "weekdays" => Self::Weekdays,
            "weekends" => Self::Weekends,
            _ => Self::None,
        }
    }
}

/// A single, non-recurring calendar entry, normalized from the store.
///
/// `end` defaults to `start` when absent. No `start <= end` ordering is
/// enforced; an event is bucketed on the day of its start and the day of its
/// end, not the span between them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: EventCategory,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub visibility: Visibility,
    pub course_id: Option<String>,
    pub created_by: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A schedulable item that may recur, normalized from the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    /// Free-form status; "completed" suppresses overdue marking.
    pub status: Option<String>,
    pub recurrence: RecurrenceKind,
    /// Explicit weekday restriction, honored for weekly recurrence only.
    pub recurrence_days: Option<Vec<Weekday>>,
}

impl Task {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed")
    }
}

/// One concrete calendar-day instance of a task. Derived at query time,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Occurrence {
    pub task: Task,
    /// The concrete day, in the viewer timezone.
    pub date: NaiveDate,
    /// Constant per task, not per occurrence day (see `expand`).
    pub overdue: bool,
}

/// Calendar grid layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Month,
    Week,
}

/// Everything landing on one grid day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBucket {
    pub events: Vec<Event>,
    pub occurrences: Vec<Occurrence>,
}

impl DayBucket {
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len() + self.occurrences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.occurrences.is_empty()
    }
}

/// One line of the selected-day agenda.
#[derive(Debug, Clone, PartialEq)]
pub enum AgendaItem {
    Event(Event),
    Occurrence(Occurrence),
}

impl AgendaItem {
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Event(e) => &e.title,
            Self::Occurrence(o) => &o.task.title,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_from_wire_known() {
        assert_eq!(EventCategory::from_wire("exam"), EventCategory::Exam);
        assert_eq!(EventCategory::from_wire("MEETING"), EventCategory::Meeting);
    }

    #[test]
    fn category_from_wire_unknown_defaults_to_reminder() {
        assert_eq!(EventCategory::from_wire("party"), EventCategory::Reminder);
        assert_eq!(EventCategory::from_wire(""), EventCategory::Reminder);
    }

    #[test]
    fn visibility_from_wire() {
        assert_eq!(Visibility::from_wire("course"), Visibility::Course);
        assert_eq!(Visibility::from_wire("anything"), Visibility::Private);
    }

    #[test]
    fn recurrence_from_wire_unknown_is_none() {
        assert_eq!(RecurrenceKind::from_wire("fortnightly"), RecurrenceKind::None);
        assert_eq!(RecurrenceKind::from_wire("weekends"), RecurrenceKind::Weekends);
    }

    #[test]
    fn recurrence_serde_roundtrip() {
        let json = serde_json::to_string(&RecurrenceKind::Weekdays).unwrap();
        assert_eq!(json, "\"weekdays\"");
        let back: RecurrenceKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RecurrenceKind::Weekdays);
    }

    #[test]
    fn task_completed_status() {
        let task = Task {
            id: "t1".into(),
            title: "Read ch. 4".into(),
            description: None,
            start_date: None,
            due_date: None,
            status: Some("completed".into()),
            recurrence: RecurrenceKind::None,
            recurrence_days: None,
        };
        assert!(task.is_completed());
        let pending = Task {
            status: Some("pending".into()),
            ..task
        };
        assert!(!pending.is_completed());
    }

    #[test]
    fn day_bucket_len() {
        let bucket = DayBucket::default();
        assert!(bucket.is_empty());
        assert_eq!(bucket.len(), 0);
    }
}
