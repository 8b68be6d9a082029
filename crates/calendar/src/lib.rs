//! Calendar core: occurrence expansion for recurring tasks and the
//! month/week window controller that merges tasks and events into a per-day
//! index for the grid and agenda.
//!
//! Persistence lives behind [`studyhall_store::RecordStore`]; this crate only
//! normalizes records, expands occurrences, and maintains view state.

pub mod error;
pub mod expand;
pub mod parse;
pub mod record;
pub mod service;
pub mod types;
pub mod window;

pub use {
    error::{Error, Result},
    expand::expand,
    record::{EventCreate, EventPatch},
    service::{CalendarConfig, CalendarService, FetchPhase, NowFn},
    types::{
        AgendaItem, DayBucket, Event, EventCategory, Occurrence, RecurrenceKind, Task, ViewMode,
        Visibility,
    },
    window::{DayWindow, compute_window, local_day},
};
