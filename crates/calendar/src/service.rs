//! Calendar window controller: view state, navigation, window fetches, and
//! event mutations.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use {
    chrono::{DateTime, Duration, Months, NaiveDate, Utc},
    chrono_tz::Tz,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tokio::sync::RwLock,
    tracing::{debug, info, warn},
};

use studyhall_store::{Filter, Query, RecordStore};

use crate::{
    Error, Result,
    expand::{DEFAULT_MAX_SCAN_DAYS, expand},
    parse::format_instant,
    record::{
        EventCreate, EventPatch, event_create_record, event_patch_record, normalize_event,
        normalize_task,
    },
    types::{AgendaItem, DayBucket, Event, Occurrence, Task, ViewMode},
    window::{DayWindow, compute_window, local_day, window_bounds_utc},
};

pub const EVENTS_COLLECTION: &str = "events";
pub const TASKS_COLLECTION: &str = "tasks";

/// Injected clock, so overdue computation is deterministic under test.
pub type NowFn = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Tuning knobs for window fetching and expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarConfig {
    /// Scan cap for recurring tasks, in days past the scan start.
    pub max_scan_days: i64,
    /// How far the task fetch reaches past the visible window on each side.
    pub widen_days: i64,
    /// Viewer timezone; all day-bucketing happens here.
    pub timezone: Tz,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            max_scan_days: DEFAULT_MAX_SCAN_DAYS,
            widen_days: 7,
            timezone: chrono_tz::UTC,
        }
    }
}

/// Lifecycle of the current window's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Loading,
    Ready,
    Error(String),
}

struct ViewState {
    reference: NaiveDate,
    mode: ViewMode,
    selected: NaiveDate,
    window: DayWindow,
    phase: FetchPhase,
    events: Vec<Event>,
    tasks: Vec<Task>,
    occurrences: Vec<Occurrence>,
    buckets: BTreeMap<NaiveDate, DayBucket>,
}

/// The calendar window controller.
///
/// Owns all view state; data flows reference day + mode → window → store
/// query → normalization → expansion → per-day buckets. A fetch is tagged
/// with the window it was issued for and its result is discarded if the
/// window has moved on by the time it resolves (last write wins).
pub struct CalendarService {
    store: Arc<dyn RecordStore>,
    config: CalendarConfig,
    now_fn: NowFn,
    state: RwLock<ViewState>,
}

impl CalendarService {
    pub fn new(store: Arc<dyn RecordStore>, config: CalendarConfig) -> Arc<Self> {
        Self::with_clock(store, config, Arc::new(Utc::now))
    }

    /// Create a service with an explicit clock.
    pub fn with_clock(store: Arc<dyn RecordStore>, config: CalendarConfig, now_fn: NowFn) -> Arc<Self> {
        let today = local_day((now_fn)(), config.timezone);
        let mode = ViewMode::default();
        Arc::new(Self {
            store,
            state: RwLock::new(ViewState {
                reference: today,
                mode,
                selected: today,
                window: compute_window(today, mode),
                phase: FetchPhase::Idle,
                events: Vec::new(),
                tasks: Vec::new(),
                occurrences: Vec::new(),
                buckets: BTreeMap::new(),
            }),
            config,
            now_fn,
        })
    }

    // ── View state accessors ────────────────────────────────────────────

    pub async fn window(&self) -> DayWindow {
        self.state.read().await.window
    }

    pub async fn mode(&self) -> ViewMode {
        self.state.read().await.mode
    }

    pub async fn selected_day(&self) -> NaiveDate {
        self.state.read().await.selected
    }

    pub async fn phase(&self) -> FetchPhase {
        self.state.read().await.phase.clone()
    }

    /// Snapshot of the per-day bucket index for the current window.
    pub async fn day_buckets(&self) -> BTreeMap<NaiveDate, DayBucket> {
        self.state.read().await.buckets.clone()
    }

    /// Agenda for the selected day: events sorted by start time ascending,
    /// occurrences appended after.
    pub async fn agenda(&self) -> Vec<AgendaItem> {
        let st = self.state.read().await;
        let Some(bucket) = st.buckets.get(&st.selected) else {
            return Vec::new();
        };
        bucket
            .events
            .iter()
            .cloned()
            .map(AgendaItem::Event)
            .chain(bucket.occurrences.iter().cloned().map(AgendaItem::Occurrence))
            .collect()
    }

    // ── Navigation ──────────────────────────────────────────────────────

    /// Switch month/week layout and re-fetch.
    pub async fn set_view_mode(&self, mode: ViewMode) -> Result<()> {
        {
            let mut st = self.state.write().await;
            st.mode = mode;
            st.window = compute_window(st.reference, mode);
            debug!(?mode, "view mode changed");
        }
        self.fetch_window().await
    }

    /// Move by whole months (month view) or weeks (week view). Does not
    /// change the selected day.
    pub async fn navigate(&self, delta: i32) -> Result<()> {
        {
            let mut st = self.state.write().await;
            st.reference = shift_reference(st.reference, st.mode, delta);
            st.window = compute_window(st.reference, st.mode);
            debug!(reference = %st.reference, "navigated");
        }
        self.fetch_window().await
    }

    /// Reset reference and selected day to today and re-fetch.
    pub async fn go_today(&self) -> Result<()> {
        let today = local_day((self.now_fn)(), self.config.timezone);
        {
            let mut st = self.state.write().await;
            st.reference = today;
            st.selected = today;
            st.window = compute_window(today, st.mode);
        }
        self.fetch_window().await
    }

    /// Change the agenda day. No re-fetch: the agenda is derived from
    /// already-fetched data.
    pub async fn select_day(&self, day: NaiveDate) {
        self.state.write().await.selected = day;
    }

    /// Re-fetch the current window.
    pub async fn refresh(&self) -> Result<()> {
        self.fetch_window().await
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Create an event and splice it into local state.
    pub async fn create_event(&self, create: EventCreate) -> Result<Event> {
        if create.title.trim().is_empty() {
            return Err(Error::validation("event title must not be empty"));
        }
        let now = (self.now_fn)();
        let id = uuid::Uuid::new_v4().to_string();
        let record = event_create_record(&id, &create, now);
        let stored = self.store.insert(EVENTS_COLLECTION, record).await?;
        let event = normalize_event(&stored)
            .ok_or_else(|| Error::message("store returned an unreadable event record"))?;
        self.splice_event(event.clone()).await;
        info!(id = %event.id, title = %event.title, "event created");
        Ok(event)
    }

    /// Apply a partial update and splice the result into local state.
    pub async fn update_event(&self, id: &str, patch: EventPatch) -> Result<Event> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(Error::validation("event title must not be empty"));
        }
        let now = (self.now_fn)();
        let record = event_patch_record(&patch, now);
        let stored = self.store.update(EVENTS_COLLECTION, id, record).await?;
        let event = normalize_event(&stored)
            .ok_or_else(|| Error::message("store returned an unreadable event record"))?;
        self.splice_event(event.clone()).await;
        info!(id, "event updated");
        Ok(event)
    }

    /// Delete an event and drop it from local state.
    pub async fn delete_event(&self, id: &str) -> Result<()> {
        self.store.delete(EVENTS_COLLECTION, id).await?;
        let mut st = self.state.write().await;
        st.events.retain(|e| e.id != id);
        st.buckets = build_buckets(&st.events, &st.occurrences, st.window, self.config.timezone);
        info!(id, "event deleted");
        Ok(())
    }

    // ── Internal ────────────────────────────────────────────────────────

    async fn splice_event(&self, event: Event) {
        let mut st = self.state.write().await;
        st.events.retain(|e| e.id != event.id);
        st.events.push(event);
        st.events.sort_by_key(|e| e.start);
        st.buckets = build_buckets(&st.events, &st.occurrences, st.window, self.config.timezone);
    }

    async fn fetch_window(&self) -> Result<()> {
        let window = {
            let mut st = self.state.write().await;
            st.phase = FetchPhase::Loading;
            st.window
        };
        let tz = self.config.timezone;

        let (events_from, events_to) = window_bounds_utc(&window, tz);
        let widened = window.widen(self.config.widen_days);
        let (tasks_from, tasks_to) = window_bounds_utc(&widened, tz);

        // The store's filters are conjunctive, so each fetch is the union of
        // two range queries merged by id: an event starting before the window
        // can still occupy an in-window end day, and a task is reachable
        // through either of its dates.
        let events_by_start = Query::new()
            .filter(Filter::gte("start_date", format_instant(events_from)))
            .filter(Filter::lte("start_date", format_instant(events_to)))
            .order_by("start_date", true);
        let events_by_end = Query::new()
            .filter(Filter::gte("end_date", format_instant(events_from)))
            .filter(Filter::lte("end_date", format_instant(events_to)));
        let tasks_by_start = Query::new()
            .filter(Filter::gte("start_date", format_instant(tasks_from)))
            .filter(Filter::lte("start_date", format_instant(tasks_to)));
        let tasks_by_due = Query::new()
            .filter(Filter::gte("due_date", format_instant(tasks_from)))
            .filter(Filter::lte("due_date", format_instant(tasks_to)));

        let (events_by_start, events_by_end, tasks_by_start, tasks_by_due) = tokio::join!(
            self.store.query(EVENTS_COLLECTION, &events_by_start),
            self.store.query(EVENTS_COLLECTION, &events_by_end),
            self.store.query(TASKS_COLLECTION, &tasks_by_start),
            self.store.query(TASKS_COLLECTION, &tasks_by_due),
        );

        let fetched = merge_fetched(events_by_start, events_by_end, tasks_by_start, tasks_by_due);
        let (events_raw, tasks_raw) = match fetched {
            Ok(fetched) => fetched,
            Err(error) => {
                let mut st = self.state.write().await;
                if st.window == window {
                    st.phase = FetchPhase::Error(error.to_string());
                } else {
                    warn!(%error, "window fetch failed after navigation; ignoring");
                }
                return Err(error.into());
            },
        };

        let now = (self.now_fn)();
        let mut events: Vec<Event> = events_raw.iter().filter_map(normalize_event).collect();
        events.sort_by_key(|e| e.start);
        let tasks: Vec<Task> = tasks_raw.iter().filter_map(normalize_task).collect();
        let occurrences: Vec<Occurrence> = tasks
            .iter()
            .flat_map(|t| expand(t, window, now, tz, self.config.max_scan_days))
            .collect();
        let buckets = build_buckets(&events, &occurrences, window, tz);

        let mut st = self.state.write().await;
        if st.window != window {
            warn!("discarding stale window fetch");
            return Ok(());
        }
        info!(
            events = events.len(),
            tasks = tasks.len(),
            occurrences = occurrences.len(),
            "window fetched"
        );
        st.events = events;
        st.tasks = tasks;
        st.occurrences = occurrences;
        st.buckets = buckets;
        st.phase = FetchPhase::Ready;
        Ok(())
    }
}

fn merge_fetched(
    events_by_start: studyhall_store::Result<Vec<Value>>,
    events_by_end: studyhall_store::Result<Vec<Value>>,
    tasks_by_start: studyhall_store::Result<Vec<Value>>,
    tasks_by_due: studyhall_store::Result<Vec<Value>>,
) -> studyhall_store::Result<(Vec<Value>, Vec<Value>)> {
    let events = merge_by_id(events_by_start?, events_by_end?);
    let tasks = merge_by_id(tasks_by_start?, tasks_by_due?);
    Ok((events, tasks))
}

fn merge_by_id(mut records: Vec<Value>, more: Vec<Value>) -> Vec<Value> {
    let seen: HashSet<String> = records
        .iter()
        .filter_map(|v| v.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    for record in more {
        let duplicate = record
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| seen.contains(id));
        if !duplicate {
            records.push(record);
        }
    }
    records
}

fn shift_reference(reference: NaiveDate, mode: ViewMode, delta: i32) -> NaiveDate {
    match mode {
        ViewMode::Month => {
            let months = Months::new(delta.unsigned_abs());
            let shifted = if delta >= 0 {
                reference.checked_add_months(months)
            } else {
                reference.checked_sub_months(months)
            };
            shifted.unwrap_or(reference)
        },
        ViewMode::Week => reference + Duration::days(7 * i64::from(delta)),
    }
}

/// Index events and occurrences by the grid days they land on. An event
/// marks its start day and its end day, not the span between them.
fn build_buckets(
    events: &[Event],
    occurrences: &[Occurrence],
    window: DayWindow,
    tz: Tz,
) -> BTreeMap<NaiveDate, DayBucket> {
    let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    for event in events {
        let start_day = local_day(event.start, tz);
        let end_day = local_day(event.end, tz);
        let mut days = vec![start_day];
        if end_day != start_day {
            days.push(end_day);
        }
        for day in days {
            if window.contains(day) {
                buckets.entry(day).or_default().events.push(event.clone());
            }
        }
    }
    for occurrence in occurrences {
        if window.contains(occurrence.date) {
            buckets
                .entry(occurrence.date)
                .or_default()
                .occurrences
                .push(occurrence.clone());
        }
    }
    buckets
}
