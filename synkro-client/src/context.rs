//! Explicit dependencies of the sync layer
//!
//! Everything a store or coordinator needs is passed in through a
//! [`SyncContext`]; there is no process-wide client.

use shared::TenantId;
use std::sync::Arc;

use crate::gateway::{AuthProvider, MemoryGateway, ObjectStorage, RemoteGateway, RestGateway};
use crate::notify::NotificationSink;
use crate::tenant::TenantResolver;

#[derive(Clone)]
pub struct SyncContext {
    /// Resolved barbershop, if any
    pub tenant: Option<TenantId>,
    pub gateway: Arc<dyn RemoteGateway>,
    pub storage: Arc<dyn ObjectStorage>,
    pub sink: Arc<dyn NotificationSink>,
}

impl SyncContext {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        storage: Arc<dyn ObjectStorage>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            tenant: None,
            gateway,
            storage,
            sink,
        }
    }

    /// Context over the hosted backend
    pub fn rest(gateway: RestGateway, sink: Arc<dyn NotificationSink>) -> Self {
        let gateway = Arc::new(gateway);
        Self::new(gateway.clone(), gateway, sink)
    }

    /// Context over an in-process backend
    pub fn memory(gateway: Arc<MemoryGateway>, sink: Arc<dyn NotificationSink>) -> Self {
        Self::new(gateway.clone(), gateway, sink)
    }

    pub fn with_tenant(mut self, tenant: Option<TenantId>) -> Self {
        self.tenant = tenant;
        self
    }

    /// Resolve the tenant of the signed-in user and keep it
    pub async fn resolve(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.tenant = TenantResolver::new(auth, self.gateway.clone())
            .resolve()
            .await;
        self
    }
}
