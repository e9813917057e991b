//! In-process backend
//!
//! Implements every gateway capability over plain JSON rows held in memory.
//! Stored procedures are registered as closures operating on [`Tables`].
//! Used by the test suites and for running the sync layer without a
//! hosted backend.
//!
//! Two knobs make failure paths reproducible:
//! - [`MemoryGateway::fail_next`] rejects the next call of one operation
//! - [`MemoryGateway::hold_next_query`] parks the next query until released,
//!   so completion order of concurrent loads can be forced

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::{AuthProvider, AuthUser, Collection, Filter, ObjectStorage, Order, RemoteGateway};
use crate::{ClientError, ClientResult};

/// Gateway operations, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Query,
    Insert,
    Update,
    Delete,
    Invoke,
    PutObject,
    RemoveObject,
    CurrentUser,
}

/// Stored procedure body
pub type Procedure = Box<dyn Fn(&mut Tables, Value) -> ClientResult<Value> + Send + Sync>;

// ============================================================================
// Tables
// ============================================================================

/// Rows of every collection
#[derive(Debug, Default)]
pub struct Tables {
    rows: HashMap<Collection, Vec<Value>>,
}

impl Tables {
    pub fn rows(&self, collection: Collection) -> &[Value] {
        self.rows.get(&collection).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows_mut(&mut self, collection: Collection) -> &mut Vec<Value> {
        self.rows.entry(collection).or_default()
    }

    /// Insert a row the way the database would: assign `id` and
    /// `created_at` when the record does not carry them.
    pub fn insert(&mut self, collection: Collection, record: Value) -> ClientResult<Value> {
        let Value::Object(mut row) = record else {
            return Err(ClientError::remote(format!(
                "{collection}: record must be a JSON object"
            )));
        };
        if !row.get("id").is_some_and(|id| !id.is_null()) {
            row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        if !row.contains_key("created_at") {
            row.insert(
                "created_at".into(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        let row = Value::Object(row);
        self.rows_mut(collection).push(row.clone());
        Ok(row)
    }

    /// First row matching the filter, mutably
    pub fn find_mut(&mut self, collection: Collection, filter: &Filter) -> Option<&mut Value> {
        self.rows_mut(collection)
            .iter_mut()
            .find(|row| filter.matches(row))
    }
}

// ============================================================================
// Gate
// ============================================================================

/// Handle on a parked query; dropping it without releasing keeps the
/// query parked.
#[derive(Debug, Clone)]
pub struct QueryGate {
    semaphore: Arc<Semaphore>,
}

impl QueryGate {
    /// Let the parked query complete
    pub fn release(&self) {
        self.semaphore.add_permits(1);
    }
}

// ============================================================================
// Gateway
// ============================================================================

#[derive(Default)]
struct MemoryState {
    tables: Tables,
    objects: HashMap<(String, String), Vec<u8>>,
    failures: HashMap<Operation, String>,
    calls: HashMap<Operation, usize>,
    current_user: Option<AuthUser>,
}

/// In-memory implementation of [`RemoteGateway`], [`ObjectStorage`] and
/// [`AuthProvider`]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
    procedures: RwLock<HashMap<String, Procedure>>,
    query_gate: Mutex<Option<QueryGate>>,
    public_base: String,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            procedures: RwLock::new(HashMap::new()),
            query_gate: Mutex::new(None),
            public_base: "memory://storage/v1/object/public".to_string(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a stored procedure
    pub fn register_procedure<F>(&self, name: impl Into<String>, procedure: F)
    where
        F: Fn(&mut Tables, Value) -> ClientResult<Value> + Send + Sync + 'static,
    {
        self.procedures
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), Box::new(procedure));
    }

    /// Insert rows directly, bypassing failure injection and call counting
    pub fn seed(&self, collection: Collection, rows: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut state = self.lock();
        rows.into_iter()
            .filter_map(|row| state.tables.insert(collection, row).ok())
            .collect()
    }

    /// Snapshot of a collection's rows
    pub fn rows(&self, collection: Collection) -> Vec<Value> {
        self.lock().tables.rows(collection).to_vec()
    }

    /// Store an object directly
    pub fn seed_object(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> String {
        self.lock()
            .objects
            .insert((bucket.to_string(), key.to_string()), bytes);
        self.public_url(bucket, key)
    }

    pub fn object_exists(&self, bucket: &str, key: &str) -> bool {
        self.lock()
            .objects
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    pub fn set_current_user(&self, user: Option<AuthUser>) {
        self.lock().current_user = user;
    }

    /// Reject the next call of `operation` with `message`
    pub fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        self.lock().failures.insert(operation, message.into());
    }

    /// Number of calls made for `operation` (injected failures included)
    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Park the next query until the returned gate is released
    pub fn hold_next_query(&self) -> QueryGate {
        let gate = QueryGate {
            semaphore: Arc::new(Semaphore::new(0)),
        };
        *self.query_gate.lock().unwrap_or_else(|e| e.into_inner()) = Some(gate.clone());
        gate
    }

    /// Count the call and consume an injected failure, if any
    fn enter(state: &mut MemoryState, operation: Operation) -> ClientResult<()> {
        *state.calls.entry(operation).or_default() += 1;
        match state.failures.remove(&operation) {
            Some(message) => Err(ClientError::Remote { message }),
            None => Ok(()),
        }
    }

    fn merge(row: &mut Value, patch: Value) -> ClientResult<()> {
        let (Value::Object(target), Value::Object(patch)) = (row, patch) else {
            return Err(ClientError::remote("patch must be a JSON object"));
        };
        for (key, value) in patch {
            target.insert(key, value);
        }
        Ok(())
    }

    fn id_filter(id: Uuid, filter: &Filter) -> Filter {
        filter.clone().eq("id", id)
    }
}

/// Total order over JSON scalars; nulls sort last
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<Order>,
    ) -> ClientResult<Vec<Value>> {
        let gate = self
            .query_gate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(gate) = gate {
            tracing::debug!(%collection, "Query parked");
            if let Ok(permit) = gate.semaphore.acquire().await {
                permit.forget();
            }
        }

        let mut state = self.lock();
        Self::enter(&mut state, Operation::Query)?;
        let mut rows: Vec<Value> = state
            .tables
            .rows(collection)
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(order.column), b.get(order.column));
                if order.ascending { ord } else { ord.reverse() }
            });
        }
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, record: Value) -> ClientResult<Value> {
        let mut state = self.lock();
        Self::enter(&mut state, Operation::Insert)?;
        state.tables.insert(collection, record)
    }

    async fn insert_many(
        &self,
        collection: Collection,
        records: Vec<Value>,
    ) -> ClientResult<Vec<Value>> {
        let mut state = self.lock();
        Self::enter(&mut state, Operation::Insert)?;
        if records.iter().any(|r| !r.is_object()) {
            return Err(ClientError::remote(format!(
                "{collection}: records must be JSON objects"
            )));
        }
        records
            .into_iter()
            .map(|record| state.tables.insert(collection, record))
            .collect()
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        filter: &Filter,
        patch: Value,
    ) -> ClientResult<Value> {
        let mut state = self.lock();
        Self::enter(&mut state, Operation::Update)?;
        let row = state
            .tables
            .find_mut(collection, &Self::id_filter(id, filter))
            .ok_or_else(|| ClientError::NotFound(format!("{collection} {id}")))?;
        Self::merge(row, patch)?;
        Ok(row.clone())
    }

    async fn update_where(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Value,
    ) -> ClientResult<Vec<Value>> {
        let mut state = self.lock();
        Self::enter(&mut state, Operation::Update)?;
        let mut patched = Vec::new();
        for row in state
            .tables
            .rows_mut(collection)
            .iter_mut()
            .filter(|row| filter.matches(row))
        {
            Self::merge(row, patch.clone())?;
            patched.push(row.clone());
        }
        Ok(patched)
    }

    async fn delete(&self, collection: Collection, id: Uuid, filter: &Filter) -> ClientResult<()> {
        let mut state = self.lock();
        Self::enter(&mut state, Operation::Delete)?;
        let filter = Self::id_filter(id, filter);
        let rows = state.tables.rows_mut(collection);
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        if rows.len() == before {
            return Err(ClientError::NotFound(format!("{collection} {id}")));
        }
        Ok(())
    }

    async fn invoke(&self, procedure: &str, args: Value) -> ClientResult<Value> {
        let procedures = self.procedures.read().unwrap_or_else(|e| e.into_inner());
        let mut state = self.lock();
        Self::enter(&mut state, Operation::Invoke)?;
        let body = procedures.get(procedure).ok_or_else(|| {
            ClientError::remote(format!("Could not find the function {procedure}"))
        })?;
        body(&mut state.tables, args)
    }
}

#[async_trait]
impl ObjectStorage for MemoryGateway {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> ClientResult<String> {
        let mut state = self.lock();
        Self::enter(&mut state, Operation::PutObject)?;
        let entry = (bucket.to_string(), key.to_string());
        if state.objects.contains_key(&entry) {
            return Err(ClientError::remote("The resource already exists"));
        }
        state.objects.insert(entry, bytes);
        drop(state);
        Ok(self.public_url(bucket, key))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.public_base, bucket, key)
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> ClientResult<()> {
        let mut state = self.lock();
        Self::enter(&mut state, Operation::RemoveObject)?;
        state.objects.remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for MemoryGateway {
    async fn current_user(&self) -> ClientResult<Option<AuthUser>> {
        let mut state = self.lock();
        Self::enter(&mut state, Operation::CurrentUser)?;
        Ok(state.current_user.clone())
    }
}
