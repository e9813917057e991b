//! Per-entity configuration
//!
//! One [`Entity`] impl per synced table: where it lives, how it is
//! ordered, and which payloads create/patch it. The generic store and
//! coordinator are driven entirely by these impls.

use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::TenantId;
use shared::models::{
    Client, ClientCreate, ClientUpdate, ClientNotification, ClientNotificationCreate, ClientNotificationUpdate,
    GalleryImage, GalleryImageCreate, GalleryImageUpdate, LoyaltyCard, LoyaltyCoupon,
    LoyaltyCouponRedeem, Notification, NotificationCreate, NotificationUpdate, Service,
    ServiceCreate, ServiceUpdate, TeamMember, TeamMemberCreate, TeamMemberUpdate, WorkingHour,
    WorkingHourCreate, WorkingHourUpdate,
};
use uuid::Uuid;

use crate::gateway::{Collection, Order};

/// Payload type for operations the client never performs.
///
/// Uninhabited, so e.g. `create` on loyalty cards cannot be called.
#[derive(Debug, Clone, Serialize)]
pub enum ReadOnly {}

/// A tenant-scoped remote row kept in an [`EntityStore`](crate::EntityStore)
pub trait Entity: Clone + Send + Sync + DeserializeOwned + 'static {
    /// Insert payload (without id and tenant)
    type Create: Serialize + Send + Sync;
    /// Partial update payload
    type Update: Serialize + Send + Sync;

    const COLLECTION: Collection;
    /// Deterministic order of a full load
    const ORDER: Order;
    /// Lowercase human name used in notices ("client", "service", ...)
    const LABEL: &'static str;

    fn id(&self) -> Uuid;
    fn tenant(&self) -> TenantId;
}

macro_rules! impl_entity {
    ($ty:ty, $create:ty, $update:ty, $collection:expr, $order:expr, $label:literal) => {
        impl Entity for $ty {
            type Create = $create;
            type Update = $update;

            const COLLECTION: Collection = $collection;
            const ORDER: Order = $order;
            const LABEL: &'static str = $label;

            fn id(&self) -> Uuid {
                self.id
            }

            fn tenant(&self) -> TenantId {
                self.barbershop_id
            }
        }
    };
}

impl_entity!(Client, ClientCreate, ClientUpdate, Collection::Clients, Order::asc("name"), "client");
impl_entity!(Service, ServiceCreate, ServiceUpdate, Collection::Services, Order::asc("name"), "service");
impl_entity!(
    TeamMember,
    TeamMemberCreate,
    TeamMemberUpdate,
    Collection::TeamMembers,
    Order::asc("name"),
    "team member"
);
impl_entity!(
    WorkingHour,
    WorkingHourCreate,
    WorkingHourUpdate,
    Collection::WorkingHours,
    Order::asc("day_of_week"),
    "working hour"
);
impl_entity!(
    GalleryImage,
    GalleryImageCreate,
    GalleryImageUpdate,
    Collection::GalleryImages,
    Order::desc("created_at"),
    "image"
);
impl_entity!(
    LoyaltyCard,
    ReadOnly,
    ReadOnly,
    Collection::LoyaltyCards,
    Order::desc("updated_at"),
    "loyalty card"
);
impl_entity!(
    LoyaltyCoupon,
    ReadOnly,
    LoyaltyCouponRedeem,
    Collection::LoyaltyCoupons,
    Order::desc("created_at"),
    "coupon"
);
impl_entity!(
    ClientNotification,
    ClientNotificationCreate,
    ClientNotificationUpdate,
    Collection::ClientNotificationHistory,
    Order::desc("created_at"),
    "message"
);
impl_entity!(
    Notification,
    NotificationCreate,
    NotificationUpdate,
    Collection::Notifications,
    Order::desc("created_at"),
    "notification"
);

/// "client" -> "Client"
pub(crate) fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalized() {
        assert_eq!(capitalized("team member"), "Team member");
        assert_eq!(capitalized(""), "");
    }

    #[test]
    fn test_collections() {
        assert_eq!(<Client as Entity>::COLLECTION.table_name(), "clients");
        assert_eq!(
            <ClientNotification as Entity>::COLLECTION.table_name(),
            "client_notification_history"
        );
        assert!(!<GalleryImage as Entity>::ORDER.ascending);
    }
}
