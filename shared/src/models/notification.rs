//! Notification Models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TenantId;

/// In-app notification for a barbershop user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub barbershop_id: TenantId,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Create notification payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationCreate {
    pub barbershop_id: TenantId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

/// Update notification payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewAppointment,
    AppointmentCancelled,
    AppointmentUpdated,
    #[serde(other)]
    General,
}

/// Outbound message sent to a client (history log)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientNotification {
    pub id: Uuid,
    pub barbershop_id: TenantId,
    pub client_id: Option<Uuid>,
    pub channel: NotificationChannel,
    pub message: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Create client notification history payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientNotificationCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
    pub channel: NotificationChannel,
    pub message: String,
}

/// History entries are append-only; the patch type carries nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientNotificationUpdate {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Whatsapp,
    Email,
    Sms,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_maps_to_general() {
        let kind: NotificationKind = serde_json::from_str("\"promo\"").unwrap();
        assert_eq!(kind, NotificationKind::General);
        let kind: NotificationKind = serde_json::from_str("\"new_appointment\"").unwrap();
        assert_eq!(kind, NotificationKind::NewAppointment);
    }
}
