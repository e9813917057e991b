//! Entity Store
//!
//! In-memory id -> entity map of one collection, scoped to one tenant.
//!
//! Every `load` takes a sequence number under the write lock; when its query
//! completes the rows are applied only if no later `load` has started in
//! the meantime. Out-of-order completions therefore never overwrite newer
//! state, and `load(None)` always wins over an earlier in-flight load.
//!
//! Entries always belong to the current scope: rows of any other tenant are
//! dropped as soon as a load for a new tenant starts, so a failed load after
//! a tenant switch leaves the store empty rather than holding foreign rows.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::TenantId;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entity::Entity;
use crate::gateway::{Collection, Filter, RemoteGateway};
use crate::{ClientError, ClientResult};

/// What a `load` call ended up doing
#[derive(Debug)]
pub enum LoadOutcome {
    /// Rows replaced the mapping
    Loaded { count: usize },
    /// No tenant: mapping emptied
    Cleared,
    /// A later load started before this one completed; result discarded
    Superseded,
    /// Query failed; last-known entries of the same tenant kept
    Failed(ClientError),
}

struct StoreState<E> {
    entries: IndexMap<Uuid, E>,
    loading: bool,
    tenant: Option<TenantId>,
    load_seq: u64,
}

pub struct EntityStore<E: Entity> {
    gateway: Arc<dyn RemoteGateway>,
    state: RwLock<StoreState<E>>,
}

impl<E: Entity> EntityStore<E> {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            state: RwLock::new(StoreState {
                entries: IndexMap::new(),
                loading: true,
                tenant: None,
                load_seq: 0,
            }),
        }
    }

    /// Replace the mapping with the tenant's rows (or empty it)
    pub async fn load(&self, tenant: Option<TenantId>) -> LoadOutcome {
        let Some(tenant) = tenant else {
            let mut state = self.state.write().await;
            state.load_seq += 1;
            state.tenant = None;
            state.entries.clear();
            state.loading = false;
            return LoadOutcome::Cleared;
        };

        let seq = {
            let mut state = self.state.write().await;
            state.load_seq += 1;
            state.tenant = Some(tenant);
            state.entries.retain(|_, e| e.tenant() == tenant);
            state.loading = true;
            state.load_seq
        };

        let result = self.fetch(tenant).await;

        let mut state = self.state.write().await;
        if state.load_seq != seq {
            tracing::debug!(
                collection = %E::COLLECTION,
                %tenant,
                "Discarding superseded load"
            );
            return LoadOutcome::Superseded;
        }
        state.loading = false;
        match result {
            Ok(entities) => {
                let count = entities.len();
                state.entries = entities.into_iter().map(|e| (e.id(), e)).collect();
                tracing::debug!(collection = %E::COLLECTION, %tenant, count, "Store loaded");
                LoadOutcome::Loaded { count }
            }
            Err(e) => {
                tracing::warn!(
                    collection = %E::COLLECTION,
                    %tenant,
                    error = %e,
                    "Load failed, keeping last-known entries"
                );
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Reload with the current scope
    pub async fn refresh(&self) -> LoadOutcome {
        let tenant = self.tenant().await;
        self.load(tenant).await
    }

    async fn fetch(&self, tenant: TenantId) -> ClientResult<Vec<E>> {
        let rows = self
            .gateway
            .query(E::COLLECTION, &Filter::tenant(tenant), Some(E::ORDER))
            .await?;
        rows.into_iter().map(decode::<E>).collect()
    }

    // ========== Reads ==========

    pub async fn get(&self, id: Uuid) -> Option<E> {
        self.state.read().await.entries.get(&id).cloned()
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.state.read().await.entries.contains_key(&id)
    }

    /// Entries in load order, confirmed creations appended
    pub async fn list(&self) -> Vec<E> {
        self.state.read().await.entries.values().cloned().collect()
    }

    pub async fn filter(&self, predicate: impl Fn(&E) -> bool) -> Vec<E> {
        self.state
            .read()
            .await
            .entries
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    pub async fn ids(&self) -> Vec<Uuid> {
        self.state.read().await.entries.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Tenant of the most recent `load` call
    pub async fn tenant(&self) -> Option<TenantId> {
        self.state.read().await.tenant
    }

    // ========== Confirmed patches ==========
    //
    // Applied only while the store is still scoped to the tenant the
    // mutation ran under; a tenant switch in between drops the patch.

    pub(crate) async fn insert_confirmed(&self, tenant: TenantId, entity: E) -> bool {
        let mut state = self.state.write().await;
        if state.tenant != Some(tenant) || entity.tenant() != tenant {
            return false;
        }
        state.entries.insert(entity.id(), entity);
        true
    }

    pub(crate) async fn replace_confirmed(&self, tenant: TenantId, entity: E) -> bool {
        let mut state = self.state.write().await;
        if state.tenant != Some(tenant) {
            return false;
        }
        match state.entries.get_mut(&entity.id()) {
            Some(slot) => {
                *slot = entity;
                true
            }
            None => false,
        }
    }

    pub(crate) async fn remove_confirmed(&self, tenant: TenantId, id: Uuid) -> bool {
        let mut state = self.state.write().await;
        if state.tenant != Some(tenant) {
            return false;
        }
        state.entries.shift_remove(&id).is_some()
    }
}

pub(crate) fn decode<E: Entity>(row: Value) -> ClientResult<E> {
    decode_row(E::COLLECTION, row)
}

pub(crate) fn decode_row<T: DeserializeOwned>(collection: Collection, row: Value) -> ClientResult<T> {
    serde_json::from_value(row)
        .map_err(|e| ClientError::InvalidResponse(format!("{collection}: {e}")))
}
