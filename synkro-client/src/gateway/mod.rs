//! Remote Data Gateway
//!
//! Boundary to the hosted backend. Three capabilities, each a trait so the
//! sync layer can run against the real backend ([`RestGateway`]) or an
//! in-process one ([`MemoryGateway`]):
//!
//! - [`RemoteGateway`]: tenant-scoped tables and stored procedures
//! - [`ObjectStorage`]: buckets holding binary objects
//! - [`AuthProvider`]: the signed-in user
//!
//! Every failure surfaces immediately as [`ClientError::Remote`]; nothing is
//! retried.
//!
//! [`ClientError::Remote`]: crate::ClientError::Remote

pub mod memory;
pub mod rest;

pub use memory::{MemoryGateway, Operation, QueryGate, Tables};
pub use rest::RestGateway;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use shared::TenantId;
use std::fmt;
use uuid::Uuid;

use crate::ClientResult;

/// Column every tenant-scoped table carries
pub const TENANT_COLUMN: &str = "barbershop_id";

// ============================================================================
// Collections
// ============================================================================

/// Remote tables known to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clients,
    Services,
    TeamMembers,
    WorkingHours,
    GalleryImages,
    LoyaltyCards,
    LoyaltyCoupons,
    Notifications,
    ClientNotificationHistory,
    Profiles,
    Barbershops,
}

impl Collection {
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Services => "services",
            Self::TeamMembers => "team_members",
            Self::WorkingHours => "working_hours",
            Self::GalleryImages => "gallery_images",
            Self::LoyaltyCards => "loyalty_cards",
            Self::LoyaltyCoupons => "loyalty_coupons",
            Self::Notifications => "notifications",
            Self::ClientNotificationHistory => "client_notification_history",
            Self::Profiles => "profiles",
            Self::Barbershops => "barbershops",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

// ============================================================================
// Filter / Order
// ============================================================================

/// Conjunction of column equality conditions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(String, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `barbershop_id = tenant`
    pub fn tenant(tenant: TenantId) -> Self {
        Self::new().eq(TENANT_COLUMN, tenant)
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.conditions.push((column.into(), value.to_string()));
        self
    }

    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }

    /// Whether a JSON row satisfies every condition.
    ///
    /// Values are compared in their text form, the way the REST API
    /// receives them in `column=eq.value`.
    pub fn matches(&self, row: &Value) -> bool {
        self.conditions.iter().all(|(column, expected)| {
            match row.get(column) {
                Some(Value::String(s)) => s == expected,
                Some(Value::Null) | None => expected == "null",
                Some(other) => other.to_string() == *expected,
            }
        })
    }
}

/// Sort order for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }

    /// REST form: `name.asc`
    pub fn to_param(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Authenticated identity as reported by the backend's auth service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

// ============================================================================
// Traits
// ============================================================================

/// Tables and stored procedures
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Rows matching `filter`, sorted by `order` when given
    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<Order>,
    ) -> ClientResult<Vec<Value>>;

    /// Insert one row, returning it as stored (server-assigned id included)
    async fn insert(&self, collection: Collection, record: Value) -> ClientResult<Value>;

    /// Insert many rows in a single round trip
    async fn insert_many(
        &self,
        collection: Collection,
        records: Vec<Value>,
    ) -> ClientResult<Vec<Value>>;

    /// Patch the row with `id` that also matches `filter`.
    /// Fails with `NotFound` when no row matched.
    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        filter: &Filter,
        patch: Value,
    ) -> ClientResult<Value>;

    /// Patch every row matching `filter` in one round trip, returning the
    /// patched rows (possibly none).
    async fn update_where(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Value,
    ) -> ClientResult<Vec<Value>>;

    /// Delete the row with `id` that also matches `filter`.
    /// Fails with `NotFound` when no row matched.
    async fn delete(&self, collection: Collection, id: Uuid, filter: &Filter) -> ClientResult<()>;

    /// Call a stored procedure with named arguments
    async fn invoke(&self, procedure: &str, args: Value) -> ClientResult<Value>;
}

/// Binary object storage
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store an object, returning its public URL
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ClientResult<String>;

    /// Public URL of an object
    fn public_url(&self, bucket: &str, key: &str) -> String;

    async fn remove_object(&self, bucket: &str, key: &str) -> ClientResult<()>;
}

/// Signed-in user lookup
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// `None` when nobody is signed in
    async fn current_user(&self) -> ClientResult<Option<AuthUser>>;
}
