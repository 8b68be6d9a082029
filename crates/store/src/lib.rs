//! Generic record-store collaborator for the calendar core.
//! Records are JSON objects in named collections; queries support equality
//! and range filters on named fields, ordering, and offset/limit pagination.

pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use {
    error::{Error, Result},
    memory::MemoryStore,
    store::RecordStore,
    types::{Filter, FilterOp, OrderBy, Page, Query},
};
