//! In-memory store for tests and local use.

use std::{cmp::Ordering, collections::HashMap, sync::Mutex};

use {async_trait::async_trait, serde_json::Value};

use crate::{
    Error, Result,
    store::RecordStore,
    types::{FilterOp, Query},
};

/// In-memory store backed by `HashMap`. No persistence.
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
        }
    }

    /// Seed a collection with records, replacing any existing contents.
    pub fn seed(&self, collection: &str, records: Vec<Value>) {
        let mut cols = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        cols.insert(collection.to_string(), records);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare two JSON values for range filters. ISO-8601 date strings order
/// correctly under plain string comparison.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        _ => None,
    }
}

fn matches(record: &Value, query: &Query) -> bool {
    query.filters.iter().all(|f| {
        let Some(field) = record.get(&f.field) else {
            return false;
        };
        if field.is_null() {
            return false;
        }
        match f.op {
            FilterOp::Eq => field == &f.value,
            FilterOp::Gte => {
                compare(field, &f.value).is_some_and(|o| o != Ordering::Less)
            },
            FilterOp::Lte => {
                compare(field, &f.value).is_some_and(|o| o != Ordering::Greater)
            },
        }
    })
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Value>> {
        let cols = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<Value> = cols
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| matches(r, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            out.sort_by(|a, b| {
                let cmp = match (a.get(&order.field), b.get(&order.field)) {
                    (Some(a), Some(b)) => compare(a, b).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if order.ascending { cmp } else { cmp.reverse() }
            });
        }

        if let Some(page) = query.page {
            let start = page.offset.min(out.len());
            let end = start.saturating_add(page.limit).min(out.len());
            out = out[start..end].to_vec();
        }

        Ok(out)
    }

    async fn insert(&self, collection: &str, record: Value) -> Result<Value> {
        if !record.is_object() {
            return Err(Error::message("record must be a JSON object"));
        }
        let mut cols = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        cols.entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value> {
        let mut cols = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let records = cols
            .get_mut(collection)
            .ok_or_else(|| Error::not_found(collection, id))?;
        let record = records
            .iter_mut()
            .find(|r| record_id(r) == Some(id))
            .ok_or_else(|| Error::not_found(collection, id))?;

        if let (Value::Object(target), Value::Object(changes)) = (&mut *record, patch) {
            for (key, value) in changes {
                target.insert(key, value);
            }
        } else {
            return Err(Error::message("patch must be a JSON object"));
        }
        Ok(record.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut cols = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let records = cols
            .get_mut(collection)
            .ok_or_else(|| Error::not_found(collection, id))?;
        let before = records.len();
        records.retain(|r| record_id(r) != Some(id));
        if records.len() == before {
            return Err(Error::not_found(collection, id));
        }
        Ok(())
    }
}
