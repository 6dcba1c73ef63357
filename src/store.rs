//! Generic in-memory record store
//!
//! One `Store` per collection. The collection is a single `Arc<Vec<Record>>`
//! behind an `RwLock`:
//!
//! - readers clone the `Arc` under a short read lock and copy out of that
//!   snapshot, so they never see a sequence mid-mutation
//! - writers hold the write lock for the whole read-modify-install cycle,
//!   building a new sequence and swapping it in
//!
//! Nothing returned from a store aliases its internal state. Instances share
//! nothing, so work on one collection never blocks another.

use crate::error::{Error, Result};
use crate::metadata::{enrich_with_metadata, not_before, refresh_timestamp};
use crate::predicate::from_constraints;
use crate::record::{to_fields, Fields, Record, RecordId, Stored};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Shared handle to one collection, created once at startup.
pub type StoreHandle<T> = Arc<Store<T>>;

pub fn new_store<T>(collection: impl Into<String>) -> StoreHandle<T> {
    Arc::new(Store::new(collection))
}

/// A single storage request, for dispatch through [`Store::execute`] or
/// [`Store::apply_batch`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOperation {
    ReadAll,
    Add(Fields),
    Get(RecordId),
    Update { id: RecordId, updates: Fields },
    Delete(RecordId),
    Find(Fields),
}

impl StoreOperation {
    fn name(&self) -> &'static str {
        match self {
            StoreOperation::ReadAll => "read_all",
            StoreOperation::Add(_) => "add_item",
            StoreOperation::Get(_) => "get_item",
            StoreOperation::Update { .. } => "update_item",
            StoreOperation::Delete(_) => "delete_item",
            StoreOperation::Find(_) => "find_items",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    Records(Vec<Record>),
    Added(RecordId),
    Item(Option<Record>),
    Changed(bool),
}

pub struct Store<T = Record> {
    name: String,
    state: RwLock<Arc<Vec<Record>>>,
    _shape: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<T> Store<T> {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            name: collection.into(),
            state: RwLock::new(Arc::new(Vec::new())),
            _shape: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // A writer that panicked never installed its copy, so the state behind a
    // poisoned lock is the last committed one and stays usable.
    fn snapshot(&self) -> Result<Arc<Vec<Record>>> {
        let guard = self.state.read().unwrap_or_else(|poisoned| {
            warn!(collection = %self.name, "recovering from poisoned lock");
            poisoned.into_inner()
        });
        Ok(Arc::clone(&*guard))
    }

    /// Run `change` against a private copy and install the copy only if
    /// `change` succeeds.
    fn commit<R>(&self, change: impl FnOnce(&mut Vec<Record>) -> Result<R>) -> Result<R> {
        let mut guard = self.state.write().unwrap_or_else(|poisoned| {
            warn!(collection = %self.name, "recovering from poisoned lock");
            self.state.clear_poison();
            poisoned.into_inner()
        });
        let mut working: Vec<Record> = (**guard).clone();
        let out = change(&mut working)?;
        *guard = Arc::new(working);
        Ok(out)
    }

    pub fn read_all(&self) -> Result<Vec<Record>> {
        Ok((*self.snapshot()?).clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.snapshot()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Add an untyped payload.
    pub fn add_fields(&self, payload: &Fields) -> Result<RecordId> {
        let id = self.commit(|records| Ok(insert(records, payload)))?;
        debug!(collection = %self.name, %id, "record added");
        Ok(id)
    }

    pub fn get_item(&self, id: &str) -> Result<Option<Record>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.iter().find(|r| r.id() == Some(id)).cloned())
    }

    /// Merge `updates` into the record with `id`. `Ok(false)` when no
    /// record matched.
    pub fn update_item(&self, id: &str, updates: &Fields) -> Result<bool> {
        let refreshed = refresh_timestamp(updates);
        let changed = self.commit(|records| Ok(update(records, id, &refreshed)))?;
        debug!(collection = %self.name, %id, changed, "update");
        Ok(changed)
    }

    pub fn delete_item(&self, id: &str) -> Result<bool> {
        let removed = self.commit(|records| Ok(remove(records, id)))?;
        debug!(collection = %self.name, %id, removed, "delete");
        Ok(removed)
    }

    /// Every record matching all `constraints`, in insertion order.
    pub fn find_items(&self, constraints: Fields) -> Result<Vec<Record>> {
        let snapshot = self.snapshot()?;
        Ok(find(&snapshot, constraints))
    }

    pub fn find_first(&self, predicate: impl Fn(&Record) -> bool) -> Result<Option<Record>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.iter().find(|r| predicate(r)).cloned())
    }

    /// Apply `change` to every matching record's fields. Returns the number
    /// of records rewritten. Reserved fields in the output of `change` are
    /// ignored, as for `update_item`.
    pub fn update_where(
        &self,
        predicate: impl Fn(&Record) -> bool,
        change: impl Fn(Fields) -> Fields,
    ) -> Result<usize> {
        let count = self.commit(|records| {
            let mut count = 0;
            for slot in records.iter_mut() {
                if predicate(slot) {
                    let updates = refresh_timestamp(&change(slot.fields().clone()));
                    *slot = not_before(slot, slot.merged(&updates));
                    count += 1;
                }
            }
            Ok(count)
        })?;
        debug!(collection = %self.name, count, "update_where");
        Ok(count)
    }

    /// Replace the whole collection. Records are installed as given, without
    /// enrichment; each must carry a unique string `id` and RFC3339
    /// `created_at`/`updated_at` stamps.
    pub fn write_all(&self, records: Vec<Record>) -> Result<()> {
        check_records(&records)?;
        let count = records.len();
        self.commit(move |current| {
            *current = records;
            Ok(())
        })?;
        debug!(collection = %self.name, count, "collection replaced");
        Ok(())
    }

    /// The collection keyed by id. A stored record without an id is a
    /// storage fault.
    pub fn load_as_map(&self) -> Result<HashMap<RecordId, Record>> {
        let snapshot = self.snapshot()?;
        snapshot
            .iter()
            .map(|r| match r.id() {
                Some(id) => Ok((id.to_string(), r.clone())),
                None => Err(Error::fault(&self.name, "stored record has no id")),
            })
            .collect()
    }

    pub fn execute(&self, operation: StoreOperation) -> Result<OperationOutcome> {
        match operation {
            StoreOperation::ReadAll => self.read_all().map(OperationOutcome::Records),
            StoreOperation::Add(payload) => self.add_fields(&payload).map(OperationOutcome::Added),
            StoreOperation::Get(id) => self.get_item(&id).map(OperationOutcome::Item),
            StoreOperation::Update { id, updates } => {
                self.update_item(&id, &updates).map(OperationOutcome::Changed)
            }
            StoreOperation::Delete(id) => self.delete_item(&id).map(OperationOutcome::Changed),
            StoreOperation::Find(constraints) => {
                self.find_items(constraints).map(OperationOutcome::Records)
            }
        }
    }

    /// Apply `operations` in order as one unit. An update or delete that
    /// matches nothing aborts the batch and leaves the collection as it was.
    /// Reads inside the batch see the batch's own earlier writes.
    pub fn apply_batch(&self, operations: Vec<StoreOperation>) -> Result<Vec<OperationOutcome>> {
        let steps = operations.len();
        let outcomes = self.commit(|records| {
            let mut outcomes = Vec::with_capacity(operations.len());
            for (step, operation) in operations.into_iter().enumerate() {
                let name = operation.name();
                let outcome = apply(records, operation);
                if outcome == OperationOutcome::Changed(false) {
                    return Err(Error::BatchAborted {
                        step,
                        reason: format!("{name} matched no record"),
                    });
                }
                outcomes.push(outcome);
            }
            Ok(outcomes)
        })?;
        debug!(collection = %self.name, steps, "batch applied");
        Ok(outcomes)
    }
}

impl<T: Serialize> Store<T> {
    /// Enrich `payload` with id and timestamps and append it.
    pub fn add_item(&self, payload: &T) -> Result<RecordId> {
        self.add_fields(&to_fields(payload)?)
    }

    /// Add `payload` unless a record already matches `key`. The check and
    /// the insert happen under one write lock.
    pub fn add_if_absent(&self, payload: &T, key: Fields) -> Result<Option<RecordId>> {
        let fields = to_fields(payload)?;
        let matches = from_constraints(key);
        let added = self.commit(|records| {
            if records.iter().any(|r| matches(r)) {
                return Ok(None);
            }
            Ok(Some(insert(records, &fields)))
        })?;
        debug!(collection = %self.name, added = added.is_some(), "conditional add");
        Ok(added)
    }
}

impl<T: DeserializeOwned> Store<T> {
    pub fn get_typed(&self, id: &str) -> Result<Option<Stored<T>>> {
        self.get_item(id)?.map(|r| r.decode()).transpose()
    }

    pub fn read_typed(&self) -> Result<Vec<Stored<T>>> {
        self.snapshot()?.iter().map(Record::decode).collect()
    }
}

/// Every record needs a unique `id` and parseable `created_at` and
/// `updated_at`, as `enrich_with_metadata` would have produced.
fn check_records(records: &[Record]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let id = record
            .id()
            .ok_or_else(|| Error::InvalidPayload(format!("record {index} has no id")))?;
        if !seen.insert(id) {
            return Err(Error::InvalidPayload(format!("duplicate id '{id}'")));
        }
        if record.created_at().is_none() || record.updated_at().is_none() {
            return Err(Error::InvalidPayload(format!(
                "record '{id}' lacks a valid created_at/updated_at"
            )));
        }
    }
    Ok(())
}

fn insert(records: &mut Vec<Record>, payload: &Fields) -> RecordId {
    let record = enrich_with_metadata(payload);
    let id = record.id().unwrap_or_default().to_string();
    records.push(record);
    id
}

fn update(records: &mut [Record], id: &str, refreshed: &Fields) -> bool {
    match records.iter_mut().find(|r| r.id() == Some(id)) {
        Some(slot) => {
            *slot = not_before(slot, slot.merged(refreshed));
            true
        }
        None => false,
    }
}

fn remove(records: &mut Vec<Record>, id: &str) -> bool {
    let before = records.len();
    records.retain(|r| r.id() != Some(id));
    records.len() != before
}

fn find(records: &[Record], constraints: Fields) -> Vec<Record> {
    let matches = from_constraints(constraints);
    records.iter().filter(|r| matches(r)).cloned().collect()
}

fn apply(records: &mut Vec<Record>, operation: StoreOperation) -> OperationOutcome {
    match operation {
        StoreOperation::ReadAll => OperationOutcome::Records(records.clone()),
        StoreOperation::Add(payload) => OperationOutcome::Added(insert(records, &payload)),
        StoreOperation::Get(id) => {
            OperationOutcome::Item(records.iter().find(|r| r.id() == Some(id.as_str())).cloned())
        }
        StoreOperation::Update { id, updates } => {
            OperationOutcome::Changed(update(records, &id, &refresh_timestamp(&updates)))
        }
        StoreOperation::Delete(id) => OperationOutcome::Changed(remove(records, &id)),
        StoreOperation::Find(constraints) => OperationOutcome::Records(find(records, constraints)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{constraints, has_key_value};
    use crate::record::{CREATED_AT, ID, UPDATED_AT};
    use serde::Deserialize;
    use serde_json::{json, Value};
    use tokio_test::{assert_err, assert_ok};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Job {
        title: String,
        level: u32,
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn seeded() -> (Store<Record>, Vec<RecordId>) {
        let store = Store::new("people");
        let ids = vec![
            store.add_fields(&fields(json!({"name": "Ann", "role": "admin"}))).unwrap(),
            store.add_fields(&fields(json!({"name": "Bob", "role": "user"}))).unwrap(),
            store.add_fields(&fields(json!({"name": "Cid", "role": "user"}))).unwrap(),
        ];
        (store, ids)
    }

    #[test]
    fn test_ids_are_unique() {
        let store: Store<Record> = Store::new("ids");
        let ids: HashSet<_> = (0..200)
            .map(|_| store.add_fields(&Fields::new()).unwrap())
            .collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_add_then_get_round_trips_payload() {
        let store: Store<Job> = Store::new("jobs");
        let job = Job { title: "Backend".into(), level: 3 };
        let id = store.add_item(&job).unwrap();

        let record = store.get_item(&id).unwrap().expect("present");
        assert_eq!(record.get("title"), Some(&json!("Backend")));
        assert_eq!(record.get("level"), Some(&json!(3)));
        assert_eq!(record.id(), Some(id.as_str()));
        assert!(record.get(CREATED_AT).is_some());
        assert!(record.get(UPDATED_AT).is_some());

        let typed = store.get_typed(&id).unwrap().expect("present");
        assert_eq!(typed.data, job);
        assert_eq!(typed.id, id);
    }

    #[test]
    fn test_get_missing_is_absent_not_error() {
        let (store, _) = seeded();
        let found = assert_ok!(store.get_item("nope"));
        assert!(found.is_none());
    }

    #[test]
    fn test_read_all_returns_independent_copy() {
        let (store, _) = seeded();
        let mut copy = store.read_all().unwrap();
        copy.clear();
        copy.push(Record::default());

        let again = store.read_all().unwrap();
        assert_eq!(again.len(), 3);
        assert_eq!(again[0].get("name"), Some(&json!("Ann")));
    }

    #[test]
    fn test_get_returns_copy_not_alias() {
        let (store, ids) = seeded();
        let record = store.get_item(&ids[0]).unwrap().unwrap();
        let mut raw = record.into_fields();
        raw.insert("name".into(), json!("Mallory"));

        let again = store.get_item(&ids[0]).unwrap().unwrap();
        assert_eq!(again.get("name"), Some(&json!("Ann")));
    }

    #[test]
    fn test_update_miss_leaves_collection_unchanged() {
        let (store, _) = seeded();
        let before = store.read_all().unwrap();

        let changed = store
            .update_item("missing", &fields(json!({"name": "Zed", "role": "admin"})))
            .unwrap();

        assert!(!changed);
        assert_eq!(store.read_all().unwrap(), before);
    }

    #[test]
    fn test_update_merges_and_protects_identity() {
        let (store, ids) = seeded();
        let before = store.get_item(&ids[1]).unwrap().unwrap();

        let changed = store
            .update_item(
                &ids[1],
                &fields(json!({"role": "admin", "id": "hijack", "created_at": "1999-01-01T00:00:00Z"})),
            )
            .unwrap();
        assert!(changed);

        let after = store.get_item(&ids[1]).unwrap().unwrap();
        assert_eq!(after.get("role"), Some(&json!("admin")));
        assert_eq!(after.get("name"), Some(&json!("Bob")));
        assert_eq!(after.id(), before.id());
        assert_eq!(after.get(CREATED_AT), before.get(CREATED_AT));
        assert!(after.updated_at() >= before.updated_at());
        assert!(store.get_item("hijack").unwrap().is_none());
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let (store, ids) = seeded();
        assert!(store.delete_item(&ids[1]).unwrap());

        assert!(store.get_item(&ids[1]).unwrap().is_none());
        assert_eq!(store.len().unwrap(), 2);
        assert!(!store.delete_item(&ids[1]).unwrap());
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_find_empty_constraints_returns_all_in_order() {
        let (store, _) = seeded();
        let all = store.find_items(Fields::new()).unwrap();
        assert_eq!(all, store.read_all().unwrap());
        let names: Vec<_> = all.iter().map(|r| r.get("name").cloned()).collect();
        assert_eq!(names, vec![Some(json!("Ann")), Some(json!("Bob")), Some(json!("Cid"))]);
    }

    #[test]
    fn test_find_returns_exact_subset() {
        let (store, ids) = seeded();
        let users = store.find_items(constraints([("role", "user")])).unwrap();
        let found: Vec<_> = users.iter().filter_map(|r| r.id()).collect();
        assert_eq!(found, vec![ids[1].as_str(), ids[2].as_str()]);

        assert!(store.find_items(constraints([("role", "guest")])).unwrap().is_empty());
        assert!(store.find_items(constraints([("missing", Value::Null)])).unwrap().is_empty());
    }

    #[test]
    fn test_find_first_and_update_where() {
        let (store, _) = seeded();
        let first = store.find_first(has_key_value("role", "user")).unwrap().unwrap();
        assert_eq!(first.get("name"), Some(&json!("Bob")));

        let count = store
            .update_where(has_key_value("role", "user"), |mut f| {
                f.insert("active".into(), json!(false));
                f
            })
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.find_items(constraints([("active", false)])).unwrap().len(), 2);
    }

    #[test]
    fn test_write_all_replaces_and_validates() {
        let (store, _) = seeded();
        let stamped = |id: &str, name: &str| {
            Record::new(fields(json!({
                "id": id,
                "name": name,
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:00:00Z"
            })))
        };
        let replacement = vec![stamped("u1", "Dee"), stamped("u2", "Eve")];
        store.write_all(replacement.clone()).unwrap();
        assert_eq!(store.read_all().unwrap(), replacement);

        let map = store.load_as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["u2"].get("name"), Some(&json!("Eve")));

        assert_err!(store.write_all(vec![stamped("x", "a"), stamped("x", "b")]));
        assert_err!(store.write_all(vec![Record::new(fields(json!({"name": "no id"})))]));

        let unstamped = Record::new(fields(json!({"id": "x", "name": "B", "position": "Q"})));
        match store.write_all(vec![stamped("y", "ok"), unstamped]) {
            Err(Error::InvalidPayload(reason)) => assert!(reason.contains("'x'")),
            other => panic!("unexpected {:?}", other),
        }
        let bad_stamp = Record::new(fields(json!({
            "id": "z",
            "created_at": "yesterday",
            "updated_at": "2024-05-01T10:00:00Z"
        })));
        assert_err!(store.write_all(vec![bad_stamp]));
        assert_eq!(store.read_all().unwrap(), replacement);
    }

    #[test]
    fn test_execute_dispatches() {
        let store: Store<Record> = Store::new("ops");
        let added = store.execute(StoreOperation::Add(fields(json!({"k": 1})))).unwrap();
        let OperationOutcome::Added(id) = added else {
            panic!("expected Added");
        };
        assert_eq!(
            store.execute(StoreOperation::Delete(id.clone())).unwrap(),
            OperationOutcome::Changed(true)
        );
        assert_eq!(
            store.execute(StoreOperation::Get(id)).unwrap(),
            OperationOutcome::Item(None)
        );
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let (store, ids) = seeded();
        let before = store.read_all().unwrap();

        let err = store
            .apply_batch(vec![
                StoreOperation::Add(fields(json!({"name": "Dan"}))),
                StoreOperation::Delete(ids[0].clone()),
                StoreOperation::Update { id: "ghost".into(), updates: Fields::new() },
            ])
            .unwrap_err();
        assert!(matches!(err, Error::BatchAborted { step: 2, .. }));
        assert_eq!(store.read_all().unwrap(), before);

        let outcomes = store
            .apply_batch(vec![
                StoreOperation::Add(fields(json!({"name": "Dan", "role": "user"}))),
                StoreOperation::Delete(ids[0].clone()),
                StoreOperation::Find(constraints([("role", "user")])),
            ])
            .unwrap();
        assert_eq!(outcomes.len(), 3);
        match &outcomes[2] {
            OperationOutcome::Records(found) => assert_eq!(found.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn test_add_if_absent_guards_the_key() {
        let store: StoreHandle<Job> = new_store("jobs");
        let job = Job { title: "dev".into(), level: 1 };

        let first = assert_ok!(store.add_if_absent(&job, constraints([("title", "dev")])));
        assert!(first.is_some());
        let second = assert_ok!(store.add_if_absent(&job, constraints([("title", "dev")])));
        assert!(second.is_none());
        assert_eq!(store.len().unwrap(), 1);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let job = Job { title: "race".into(), level: 2 };
                    store.add_if_absent(&job, constraints([("title", "race")])).unwrap()
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_concurrent_adds_serialize() {
        let store: StoreHandle<Record> = new_store("concurrent");
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|i| store.add_fields(&fields(json!({"t": t, "i": i}))).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: HashSet<RecordId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 400);
        assert_eq!(store.len().unwrap(), 400);

        let stored: HashSet<RecordId> = store
            .read_all()
            .unwrap()
            .iter()
            .map(|r| r.get(ID).and_then(Value::as_str).unwrap().to_string())
            .collect();
        assert_eq!(stored, ids);
    }

    #[test]
    fn test_panicking_writer_leaves_collection_usable() {
        let store: StoreHandle<Record> = new_store("fragile");
        let id = store.add_fields(&fields(json!({"name": "Ann"}))).unwrap();

        let clone = Arc::clone(&store);
        let joined = std::thread::spawn(move || {
            let _ = clone.update_where(|_| true, |_| panic!("boom"));
        })
        .join();
        assert!(joined.is_err());

        let records = assert_ok!(store.read_all());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some(&json!("Ann")));

        assert!(assert_ok!(store.update_item(&id, &fields(json!({"name": "Bea"})))));
        assert_ok!(store.add_fields(&Fields::new()));
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_record_without_id_is_a_storage_fault() {
        let store: Store<Record> = Store::new("broken");
        store
            .commit(|records| {
                records.push(Record::new(fields(json!({"name": "ghost"}))));
                Ok(())
            })
            .unwrap();

        match store.load_as_map() {
            Err(Error::StorageFault { collection, .. }) => assert_eq!(collection, "broken"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_stores_are_independent() {
        let a: Store<Record> = Store::new("a");
        let b: Store<Record> = Store::new("b");
        a.add_fields(&Fields::new()).unwrap();
        assert_eq!(a.len().unwrap(), 1);
        assert!(b.is_empty().unwrap());
    }
}
