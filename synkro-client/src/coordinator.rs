//! Mutation Coordinator
//!
//! Runs create/update/delete against the gateway and reflects confirmed
//! results in the [`EntityStore`]. Errors stop here: they are turned into
//! an error [`Notice`] and handed back as [`MutationOutcome::Failed`],
//! never propagated further.
//!
//! Per mutation: `Idle -> Pending -> {Committed, Failed}`. The store is only
//! touched on `Committed`.

use serde::Serialize;
use serde_json::Value;
use shared::TenantId;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::entity::{Entity, capitalized};
use crate::gateway::{Filter, RemoteGateway, TENANT_COLUMN};
use crate::notify::{Notice, NotificationSink};
use crate::store::{EntityStore, decode};
use crate::{ClientError, ClientResult, SyncContext};

/// Result of one mutation
#[derive(Debug)]
pub enum MutationOutcome<T> {
    Committed(T),
    Failed(ClientError),
}

impl<T> MutationOutcome<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    pub fn committed(self) -> Option<T> {
        match self {
            Self::Committed(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Self::Committed(_) => None,
            Self::Failed(e) => Some(e),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MutationOutcome<U> {
        match self {
            Self::Committed(value) => MutationOutcome::Committed(f(value)),
            Self::Failed(e) => MutationOutcome::Failed(e),
        }
    }
}

impl<T> From<ClientResult<T>> for MutationOutcome<T> {
    fn from(result: ClientResult<T>) -> Self {
        match result {
            Ok(value) => Self::Committed(value),
            Err(e) => Self::Failed(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    fn past(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }
}

/// Decrements the pending counter when the mutation settles
struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MutationCoordinator<E: Entity> {
    store: Arc<EntityStore<E>>,
    gateway: Arc<dyn RemoteGateway>,
    sink: Arc<dyn NotificationSink>,
    pending: AtomicUsize,
}

impl<E: Entity> MutationCoordinator<E> {
    pub fn new(
        store: Arc<EntityStore<E>>,
        gateway: Arc<dyn RemoteGateway>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            gateway,
            sink,
            pending: AtomicUsize::new(0),
        }
    }

    /// Coordinator with a fresh store, wired from the context
    pub fn from_context(ctx: &SyncContext) -> Self {
        let store = Arc::new(EntityStore::new(ctx.gateway.clone()));
        Self::new(store, ctx.gateway.clone(), ctx.sink.clone())
    }

    pub fn store(&self) -> &Arc<EntityStore<E>> {
        &self.store
    }

    pub(crate) fn gateway(&self) -> &Arc<dyn RemoteGateway> {
        &self.gateway
    }

    pub(crate) fn sink(&self) -> &Arc<dyn NotificationSink> {
        &self.sink
    }

    /// Number of mutations currently in the `Pending` state
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_pending(&self) -> bool {
        self.pending() > 0
    }

    // ========== Tracked mutations ==========

    pub async fn create(&self, draft: &E::Create) -> MutationOutcome<E> {
        self.track(MutationKind::Create, self.create_inner(draft))
            .await
    }

    pub async fn update(&self, id: Uuid, patch: &E::Update) -> MutationOutcome<E> {
        self.track(MutationKind::Update, self.update_inner(id, patch))
            .await
    }

    pub async fn delete(&self, id: Uuid) -> MutationOutcome<()> {
        self.track(MutationKind::Delete, self.delete_inner(id))
            .await
    }

    /// Run a standard mutation, reporting with the entity's label
    pub(crate) async fn track<T>(
        &self,
        kind: MutationKind,
        op: impl Future<Output = ClientResult<T>>,
    ) -> MutationOutcome<T> {
        self.run(
            op,
            |_| Notice::success(format!("{} {}", capitalized(E::LABEL), kind.past())),
            format!("Failed to {} {}", kind.verb(), E::LABEL),
        )
        .await
    }

    /// Run any mutation with custom notice texts
    pub(crate) async fn run<T>(
        &self,
        op: impl Future<Output = ClientResult<T>>,
        on_success: impl FnOnce(&T) -> Notice,
        failure_title: String,
    ) -> MutationOutcome<T> {
        let result = {
            let _pending = PendingGuard::enter(&self.pending);
            op.await
        };
        match result {
            Ok(value) => {
                self.sink.notify(on_success(&value));
                MutationOutcome::Committed(value)
            }
            Err(e) => {
                tracing::warn!(collection = %E::COLLECTION, error = %e, "{failure_title}");
                self.sink.notify(Notice::error(failure_title, e.to_string()));
                MutationOutcome::Failed(e)
            }
        }
    }

    // ========== Untracked building blocks ==========

    pub(crate) async fn scope(&self) -> ClientResult<TenantId> {
        self.store.tenant().await.ok_or(ClientError::NoTenant)
    }

    pub(crate) async fn create_inner(&self, draft: &E::Create) -> ClientResult<E> {
        let tenant = self.scope().await?;
        let record = scoped_record(tenant, draft)?;
        let row = self.gateway.insert(E::COLLECTION, record).await?;
        let entity: E = decode(row)?;
        self.store.insert_confirmed(tenant, entity.clone()).await;
        Ok(entity)
    }

    pub(crate) async fn update_inner(&self, id: Uuid, patch: &impl Serialize) -> ClientResult<E> {
        let tenant = self.scope().await?;
        let patch = serde_json::to_value(patch)?;
        let row = self
            .gateway
            .update(E::COLLECTION, id, &Filter::tenant(tenant), patch)
            .await?;
        let entity: E = decode(row)?;
        self.store.replace_confirmed(tenant, entity.clone()).await;
        Ok(entity)
    }

    /// Patch every row of the tenant that `conditions` selects, in one call
    pub(crate) async fn update_matching(
        &self,
        conditions: impl FnOnce(Filter) -> Filter,
        patch: &impl Serialize,
    ) -> ClientResult<Vec<E>> {
        let tenant = self.scope().await?;
        let patch = serde_json::to_value(patch)?;
        let rows = self
            .gateway
            .update_where(E::COLLECTION, &conditions(Filter::tenant(tenant)), patch)
            .await?;
        let entities = rows
            .into_iter()
            .map(decode::<E>)
            .collect::<ClientResult<Vec<E>>>()?;
        for entity in &entities {
            self.store.replace_confirmed(tenant, entity.clone()).await;
        }
        Ok(entities)
    }

    pub(crate) async fn delete_inner(&self, id: Uuid) -> ClientResult<()> {
        let tenant = self.scope().await?;
        self.gateway
            .delete(E::COLLECTION, id, &Filter::tenant(tenant))
            .await?;
        self.store.remove_confirmed(tenant, id).await;
        Ok(())
    }
}

/// Serialize a payload and stamp it with the tenant
pub(crate) fn scoped_record(tenant: TenantId, payload: &impl Serialize) -> ClientResult<Value> {
    let mut record = serde_json::to_value(payload)?;
    let Some(fields) = record.as_object_mut() else {
        return Err(ClientError::InvalidResponse(
            "record payload must serialize to an object".into(),
        ));
    };
    fields.insert(TENANT_COLUMN.into(), serde_json::to_value(tenant)?);
    Ok(record)
}
