//! Client message history and in-app notifications

use shared::models::{
    ClientNotification, ClientNotificationCreate, Notification, NotificationChannel,
    NotificationUpdate,
};
use std::ops::Deref;
use uuid::Uuid;

use crate::ClientResult;
use crate::context::SyncContext;
use crate::coordinator::{MutationCoordinator, MutationOutcome};
use crate::notify::Notice;

// ============================================================================
// Message history
// ============================================================================

/// Log of messages sent to clients
pub struct MessageHistory {
    history: MutationCoordinator<ClientNotification>,
}

impl Deref for MessageHistory {
    type Target = MutationCoordinator<ClientNotification>;

    fn deref(&self) -> &Self::Target {
        &self.history
    }
}

impl MessageHistory {
    pub fn new(history: MutationCoordinator<ClientNotification>) -> Self {
        Self { history }
    }

    pub fn from_context(ctx: &SyncContext) -> Self {
        Self::new(MutationCoordinator::from_context(ctx))
    }

    pub async fn record(
        &self,
        client_id: Option<Uuid>,
        channel: NotificationChannel,
        message: impl Into<String>,
    ) -> MutationOutcome<ClientNotification> {
        let draft = ClientNotificationCreate {
            client_id,
            channel,
            message: message.into(),
        };
        self.history
            .run(
                self.history.create_inner(&draft),
                |_| Notice::success("Message recorded"),
                "Failed to record message".to_string(),
            )
            .await
    }

    pub async fn for_client(&self, client_id: Uuid) -> Vec<ClientNotification> {
        self.store()
            .filter(|entry| entry.client_id == Some(client_id))
            .await
    }
}

// ============================================================================
// In-app notifications
// ============================================================================

/// In-app notifications of the tenant.
///
/// The store holds every row the backend returns for the tenant. Each
/// recipient has its own copy of a notification, so `unread` and
/// `unread_count` are per-user only because the backend's row-level
/// security limits reads to rows whose `user_id` is the signed-in user.
pub struct Inbox {
    notifications: MutationCoordinator<Notification>,
}

impl Deref for Inbox {
    type Target = MutationCoordinator<Notification>;

    fn deref(&self) -> &Self::Target {
        &self.notifications
    }
}

impl Inbox {
    pub fn new(notifications: MutationCoordinator<Notification>) -> Self {
        Self { notifications }
    }

    pub fn from_context(ctx: &SyncContext) -> Self {
        Self::new(MutationCoordinator::from_context(ctx))
    }

    pub async fn unread(&self) -> Vec<Notification> {
        self.store().filter(|n| !n.read).await
    }

    pub async fn unread_count(&self) -> usize {
        self.unread().await.len()
    }

    pub async fn mark_read(&self, id: Uuid) -> MutationOutcome<Notification> {
        self.notifications
            .run(
                self.notifications.update_inner(id, &read_patch()),
                |_| Notice::success("Notification marked as read"),
                "Failed to update notification".to_string(),
            )
            .await
    }

    /// Mark every unread notification of the tenant as read with a single
    /// filtered update. Returns the number of rows the backend patched.
    pub async fn mark_all_read(&self) -> MutationOutcome<usize> {
        self.notifications
            .run(
                self.mark_all_read_inner(),
                |count| Notice::success(format!("{count} notifications marked as read")),
                "Failed to update notifications".to_string(),
            )
            .await
    }

    async fn mark_all_read_inner(&self) -> ClientResult<usize> {
        let marked = self
            .notifications
            .update_matching(|filter| filter.eq("read", false), &read_patch())
            .await?;
        Ok(marked.len())
    }
}

fn read_patch() -> NotificationUpdate {
    NotificationUpdate { read: Some(true) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Collection, MemoryGateway, Operation};
    use crate::notify::TracingSink;
    use serde_json::json;
    use shared::TenantId;
    use std::sync::Arc;

    fn context(gateway: &Arc<MemoryGateway>) -> SyncContext {
        SyncContext::memory(gateway.clone(), Arc::new(TracingSink))
    }

    #[tokio::test]
    async fn test_record_appends_history() {
        let gateway = Arc::new(MemoryGateway::new());
        let history = MessageHistory::from_context(&context(&gateway));
        let tenant = TenantId(Uuid::new_v4());
        history.store().load(Some(tenant)).await;
        let client_id = Uuid::new_v4();

        let entry = history
            .record(Some(client_id), NotificationChannel::Whatsapp, "Olá!")
            .await
            .committed()
            .unwrap();
        assert_eq!(entry.barbershop_id, tenant);
        assert_eq!(history.for_client(client_id).await, vec![entry]);
        assert_eq!(
            gateway.rows(Collection::ClientNotificationHistory)[0]["channel"],
            "whatsapp"
        );
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let gateway = Arc::new(MemoryGateway::new());
        let inbox = Inbox::from_context(&context(&gateway));
        let tenant = TenantId(Uuid::new_v4());
        let row = |title: &str, read: bool| {
            json!({
                "barbershop_id": tenant,
                "title": title,
                "message": "João - Corte",
                "type": "new_appointment",
                "read": read,
            })
        };
        gateway.seed(
            Collection::Notifications,
            [row("a", false), row("b", true), row("c", false)],
        );
        inbox.store().load(Some(tenant)).await;
        assert_eq!(inbox.unread_count().await, 2);

        assert_eq!(inbox.mark_all_read().await.committed(), Some(2));
        assert_eq!(inbox.unread_count().await, 0);
        assert_eq!(gateway.call_count(Operation::Update), 1);
        assert!(
            gateway
                .rows(Collection::Notifications)
                .iter()
                .all(|row| row["read"] == true)
        );
    }

    #[tokio::test]
    async fn test_mark_all_read_failure_changes_nothing() {
        let gateway = Arc::new(MemoryGateway::new());
        let inbox = Inbox::from_context(&context(&gateway));
        let tenant = TenantId(Uuid::new_v4());
        let other = TenantId(Uuid::new_v4());
        let row = |shop: TenantId| {
            json!({
                "barbershop_id": shop,
                "title": "Novo agendamento",
                "message": "João - Corte",
                "type": "new_appointment",
                "read": false,
            })
        };
        gateway.seed(Collection::Notifications, [row(tenant), row(tenant), row(other)]);
        inbox.store().load(Some(tenant)).await;

        gateway.fail_next(Operation::Update, "network error");
        assert!(!inbox.mark_all_read().await.is_committed());
        assert_eq!(inbox.unread_count().await, 2);

        assert_eq!(inbox.mark_all_read().await.committed(), Some(2));
        let rows = gateway.rows(Collection::Notifications);
        let foreign = rows.iter().find(|r| r["barbershop_id"] == json!(other)).unwrap();
        assert_eq!(foreign["read"], false);
    }

    #[tokio::test]
    async fn test_mark_read_failure_keeps_unread() {
        let gateway = Arc::new(MemoryGateway::new());
        let inbox = Inbox::from_context(&context(&gateway));
        let tenant = TenantId(Uuid::new_v4());
        let row = gateway
            .seed(
                Collection::Notifications,
                [json!({
                    "barbershop_id": tenant,
                    "title": "Novo agendamento",
                    "message": "João - Corte",
                    "type": "new_appointment",
                })],
            )
            .remove(0);
        inbox.store().load(Some(tenant)).await;
        let id: Uuid = row["id"].as_str().unwrap().parse().unwrap();

        gateway.fail_next(Operation::Update, "network error");
        assert!(!inbox.mark_read(id).await.is_committed());
        assert_eq!(inbox.unread_count().await, 1);

        assert!(inbox.mark_read(id).await.committed().unwrap().read);
    }
}
