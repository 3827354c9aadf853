//! InMemoryTransport - shared in-process backend for tests and demos.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::Transport;
use crate::error::TransportError;
use crate::query::PageQuery;
use crate::resource::Resource;
use crate::resources::{Account, Landmark, Trip};

/// A call received by [`InMemoryTransport`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { path: String, query: PageQuery },
    Get { path: String, id: String },
    Create { path: String, body: Value },
    Update { path: String, id: String, body: Value },
    PartialUpdate { path: String, id: String, body: Value },
    Remove { path: String, id: String },
    Follow(String),
    Unfollow(String),
    Like(String),
    Unlike(String),
    ListNested(String),
    RemoveNested(String),
}

type CallPredicate = Box<dyn Fn(&Call) -> bool + Send + Sync>;

struct Failure {
    matches: CallPredicate,
    error: TransportError,
}

#[derive(Default)]
struct Backend {
    collections: HashMap<String, Vec<Map<String, Value>>>,
    next_id: u64,
    calls: Vec<Call>,
    failures: Vec<Failure>,
}

/// In-memory implementation of the console API.
///
/// Records are kept per collection path in insertion order. Search is a
/// case-insensitive substring match over string fields, filters compare a
/// field's textual value exactly. Clone-friendly via `Arc`: clones share
/// the same backend.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    backend: Arc<Mutex<Backend>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert records into a collection. Objects without an `id` get one.
    pub fn seed(&self, path: &str, records: impl IntoIterator<Item = Value>) {
        let mut backend = self.backend();
        for record in records {
            if let Value::Object(map) = record {
                let map = backend.with_id(map);
                backend.collection(path).push(map);
            }
        }
    }

    /// Current contents of a collection.
    pub fn records(&self, path: &str) -> Vec<Value> {
        self.backend()
            .collections
            .get(path)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    pub fn record(&self, path: &str, id: &str) -> Option<Value> {
        let backend = self.backend();
        backend
            .collections
            .get(path)?
            .iter()
            .find(|row| id_of(row).as_deref() == Some(id))
            .cloned()
            .map(Value::Object)
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.backend().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.backend().calls.clear();
    }

    /// Fail the next call matching `predicate` with `error`. One-shot.
    pub fn fail_when<F>(&self, predicate: F, error: TransportError)
    where
        F: Fn(&Call) -> bool + Send + Sync + 'static,
    {
        self.backend().failures.push(Failure {
            matches: Box::new(predicate),
            error,
        });
    }

    fn backend(&self) -> std::sync::MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch<T>(
        &self,
        call: Call,
        run: impl FnOnce(&mut Backend) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        let mut backend = self.backend();
        backend.calls.push(call.clone());
        if let Some(pos) = backend.failures.iter().position(|f| (f.matches)(&call)) {
            let failure = backend.failures.remove(pos);
            return Err(failure.error);
        }
        run(&mut *backend)
    }
}

impl Backend {
    fn collection(&mut self, path: &str) -> &mut Vec<Map<String, Value>> {
        self.collections.entry(path.to_string()).or_default()
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("mem-{}", self.next_id)
    }

    fn with_id(&mut self, mut map: Map<String, Value>) -> Map<String, Value> {
        if id_of(&map).is_none() {
            let id = self.allocate_id();
            map.insert("id".to_string(), Value::String(id));
        }
        map
    }

    fn find_mut(&mut self, path: &str, id: &str) -> Result<&mut Map<String, Value>, TransportError> {
        self.collections
            .get_mut(path)
            .and_then(|rows| rows.iter_mut().find(|row| id_of(row).as_deref() == Some(id)))
            .ok_or_else(|| TransportError::not_found(format!("{}{}/", path, id)))
    }

    fn list(&self, path: &str, query: &PageQuery) -> Result<Value, TransportError> {
        let needle = query.search_term.to_lowercase();
        let rows: &[Map<String, Value>] = self.collections.get(path).map(Vec::as_slice).unwrap_or_default();
        let matching: Vec<&Map<String, Value>> = rows
            .iter()
            .filter(|row| needle.is_empty() || matches_search(row, &needle))
            .filter(|row| {
                query.filters.iter().all(|(key, value)| {
                    row.get(key).and_then(text_of).as_deref() == Some(value.as_str())
                })
            })
            .collect();

        let count = matching.len();
        let size = query.page_size.max(1) as usize;
        let offset = (query.page_number.max(1) as usize - 1) * size;
        if offset > 0 && offset >= count {
            return Err(TransportError::not_found("Invalid page."));
        }

        let results: Vec<Value> = matching
            .into_iter()
            .skip(offset)
            .take(size)
            .cloned()
            .map(Value::Object)
            .collect();

        Ok(json!({ "results": results, "count": count }))
    }

    fn set_edge(
        &mut self,
        path: &str,
        id: &str,
        flag: &str,
        counter: &str,
        active: bool,
    ) -> Result<(), TransportError> {
        let record = self.find_mut(path, id)?;
        if record.get(flag).and_then(Value::as_bool).unwrap_or(false) == active {
            return Ok(());
        }
        let current = record.get(counter).and_then(Value::as_u64).unwrap_or(0);
        let next = if active {
            current + 1
        } else {
            current.saturating_sub(1)
        };
        record.insert(flag.to_string(), Value::Bool(active));
        record.insert(counter.to_string(), json!(next));
        Ok(())
    }

    /// Give ids to nested stops that arrive without one.
    fn assign_nested_ids(&mut self, path: &str, body: &mut Map<String, Value>) {
        let Some(field) = Trip::NESTED_FIELD else {
            return;
        };
        if path != Trip::PATH {
            return;
        }
        if let Some(Value::Array(items)) = body.get_mut(field) {
            for item in items.iter_mut() {
                if let Value::Object(stop) = item {
                    if id_of(stop).is_none() {
                        self.next_id += 1;
                        stop.insert("id".to_string(), json!(format!("mem-{}", self.next_id)));
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn list(&self, path: &str, query: &PageQuery) -> Result<Value, TransportError> {
        let call = Call::List {
            path: path.to_string(),
            query: query.clone(),
        };
        self.dispatch(call, |b| b.list(path, query))
    }

    async fn get_by_id(&self, path: &str, id: &str) -> Result<Value, TransportError> {
        let call = Call::Get {
            path: path.to_string(),
            id: id.to_string(),
        };
        self.dispatch(call, |b| b.find_mut(path, id).map(|row| Value::Object(row.clone())))
    }

    async fn create(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        let call = Call::Create {
            path: path.to_string(),
            body: body.clone(),
        };
        self.dispatch(call, |b| {
            let mut map = into_object(body)?;
            map.retain(|key, value| key != "id" || !value.is_null());
            b.assign_nested_ids(path, &mut map);
            let map = b.with_id(map);
            b.collection(path).push(map.clone());
            Ok(Value::Object(map))
        })
    }

    async fn update(&self, path: &str, id: &str, body: Value) -> Result<Value, TransportError> {
        let call = Call::Update {
            path: path.to_string(),
            id: id.to_string(),
            body: body.clone(),
        };
        self.dispatch(call, |b| {
            let mut map = into_object(body)?;
            b.assign_nested_ids(path, &mut map);
            let record = b.find_mut(path, id)?;
            let id_value = record.get("id").cloned().unwrap_or(Value::Null);
            *record = map;
            record.insert("id".to_string(), id_value);
            Ok(Value::Object(record.clone()))
        })
    }

    async fn partial_update(
        &self,
        path: &str,
        id: &str,
        body: Value,
    ) -> Result<Value, TransportError> {
        let call = Call::PartialUpdate {
            path: path.to_string(),
            id: id.to_string(),
            body: body.clone(),
        };
        self.dispatch(call, |b| {
            let mut map = into_object(body)?;
            map.remove("id");
            b.assign_nested_ids(path, &mut map);
            let record = b.find_mut(path, id)?;
            record.extend(map);
            Ok(Value::Object(record.clone()))
        })
    }

    async fn remove(&self, path: &str, id: &str) -> Result<(), TransportError> {
        let call = Call::Remove {
            path: path.to_string(),
            id: id.to_string(),
        };
        self.dispatch(call, |b| {
            let rows = b.collection(path);
            let before = rows.len();
            rows.retain(|row| id_of(row).as_deref() != Some(id));
            if rows.len() == before {
                return Err(TransportError::not_found(format!("{}{}/", path, id)));
            }
            Ok(())
        })
    }

    async fn follow(&self, user_id: &str) -> Result<(), TransportError> {
        self.dispatch(Call::Follow(user_id.to_string()), |b| {
            b.set_edge(Account::PATH, user_id, "is_following", "followers", true)
        })
    }

    async fn unfollow(&self, user_id: &str) -> Result<(), TransportError> {
        self.dispatch(Call::Unfollow(user_id.to_string()), |b| {
            b.set_edge(Account::PATH, user_id, "is_following", "followers", false)
        })
    }

    async fn like(&self, record_id: &str) -> Result<(), TransportError> {
        self.dispatch(Call::Like(record_id.to_string()), |b| {
            b.set_edge(Landmark::PATH, record_id, "is_liked", "likes", true)
        })
    }

    async fn unlike(&self, record_id: &str) -> Result<(), TransportError> {
        self.dispatch(Call::Unlike(record_id.to_string()), |b| {
            b.set_edge(Landmark::PATH, record_id, "is_liked", "likes", false)
        })
    }

    async fn list_nested(&self, parent_id: &str) -> Result<Value, TransportError> {
        self.dispatch(Call::ListNested(parent_id.to_string()), |b| {
            let field = Trip::NESTED_FIELD.unwrap_or("landmarks");
            let trip = b.find_mut(Trip::PATH, parent_id)?;
            Ok(trip.get(field).cloned().unwrap_or_else(|| json!([])))
        })
    }

    async fn remove_nested(&self, item_id: &str) -> Result<(), TransportError> {
        self.dispatch(Call::RemoveNested(item_id.to_string()), |b| {
            let field = Trip::NESTED_FIELD.unwrap_or("landmarks");
            let trips = b.collection(Trip::PATH);
            for trip in trips.iter_mut() {
                if let Some(Value::Array(stops)) = trip.get_mut(field) {
                    let before = stops.len();
                    stops.retain(|stop| {
                        stop.as_object().and_then(id_of).as_deref() != Some(item_id)
                    });
                    if stops.len() != before {
                        return Ok(());
                    }
                }
            }
            Err(TransportError::not_found(format!("stop {}", item_id)))
        })
    }
}

fn into_object(body: Value) -> Result<Map<String, Value>, TransportError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(TransportError::Rejected {
            status: 400,
            detail: format!("expected a JSON object, got {}", other),
            fields: Default::default(),
        }),
    }
}

fn id_of(record: &Map<String, Value>) -> Option<String> {
    record.get("id").and_then(text_of)
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Object(map) => map.get("id").and_then(text_of),
        _ => None,
    }
}

fn matches_search(record: &Map<String, Value>, needle: &str) -> bool {
    record
        .values()
        .filter_map(Value::as_str)
        .any(|text| text.to_lowercase().contains(needle))
}
