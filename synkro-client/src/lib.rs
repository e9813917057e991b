//! Synkro Client - tenant-scoped data sync for the barbershop dashboard
//!
//! Caches the hosted backend's tables per barbershop and routes every
//! mutation through a coordinator that patches the cache only after the
//! backend confirmed it.

pub mod config;
pub mod context;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod gallery;
pub mod gateway;
pub mod loyalty;
pub mod notifications;
pub mod notify;
pub mod session;
pub mod store;
pub mod tenant;
pub mod working_hours;

pub use config::ClientConfig;
pub use context::SyncContext;
pub use coordinator::{MutationCoordinator, MutationOutcome};
pub use entity::{Entity, ReadOnly};
pub use error::{ClientError, ClientResult};
pub use gallery::{GALLERY_BUCKET, Gallery, storage_key_from_url};
pub use gateway::{
    AuthProvider, AuthUser, Collection, Filter, MemoryGateway, ObjectStorage, Order,
    RemoteGateway, RestGateway,
};
pub use loyalty::{ADD_POINT_PROCEDURE, Loyalty};
pub use notifications::{Inbox, MessageHistory};
pub use notify::{ChannelSink, Notice, NoticeLevel, NotificationSink, TracingSink};
pub use session::{Clients, Services, ShopSession, Team};
pub use store::{EntityStore, LoadOutcome};
pub use tenant::TenantResolver;
pub use working_hours::{DEFAULT_TEMPLATE, WorkingHours};

// Re-export shared types for convenience
pub use shared::TenantId;
