//! notify-new-appointment: WhatsApp links for the shop and the client
//!
//! Delivery is left to whoever opens the links; the function only composes
//! them and logs the client's message to the notification history.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use reqwest::Url;
use serde::Serialize;
use serde_json::{Value, json};
use shared::appointment::{AppointmentEvent, AppointmentEventKind};
use shared::models::NotificationChannel;
use shared::util::whatsapp_number;
use synkro_client::Collection;
use validator::Validate;

use crate::error::FunctionError;
use crate::state::AppState;

use super::{ApiResult, fetch_barbershop};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatsAppLinks {
    pub barbershop: Option<String>,
    pub client: Option<String>,
}

/// `https://wa.me/<number>?text=<message>`, `None` for unusable numbers
pub fn whatsapp_link(phone: &str, text: &str) -> Option<String> {
    let number = whatsapp_number(phone)?;
    Url::parse_with_params(&format!("https://wa.me/{number}"), &[("text", text)])
        .ok()
        .map(|url| url.to_string())
}

/// Message the shop sends to the client
pub fn client_message(event: &AppointmentEvent, shop_name: &str) -> String {
    let barber = event
        .barber_name
        .as_deref()
        .map(|name| format!(" com {name}"))
        .unwrap_or_default();
    let when = format!("{} às {}", event.display_date(), event.display_time());
    match event.event {
        AppointmentEventKind::Created => format!(
            "Olá {}! Seu agendamento na {shop_name} está confirmado: {}{barber} em {when}.",
            event.client_name, event.service_name
        ),
        AppointmentEventKind::Updated => format!(
            "Olá {}! Seu agendamento na {shop_name} foi alterado: {}{barber} em {when}.",
            event.client_name, event.service_name
        ),
        AppointmentEventKind::Cancelled => format!(
            "Olá {}! Seu agendamento de {} na {shop_name} em {when} foi cancelado.",
            event.client_name, event.service_name
        ),
    }
}

/// Message announcing the appointment to the shop
pub fn shop_message(event: &AppointmentEvent) -> String {
    format!("{}: {}", event.notification_title(), event.notification_message())
}

/// POST /notify-new-appointment
pub async fn notify_new_appointment(
    State(state): State<AppState>,
    payload: Result<Json<AppointmentEvent>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(event) = payload.map_err(|e| FunctionError::Validation(e.body_text()))?;
    event.validate()?;

    let tenant = event.barbershop_id;
    let shop = fetch_barbershop(state.backend.as_ref(), tenant).await?;
    let to_client = client_message(&event, &shop.name);

    let links = WhatsAppLinks {
        barbershop: shop
            .phone
            .as_deref()
            .and_then(|phone| whatsapp_link(phone, &shop_message(&event))),
        client: event
            .client_phone
            .as_deref()
            .and_then(|phone| whatsapp_link(phone, &to_client)),
    };

    if let Some(client_id) = event.client_id {
        let record = json!({
            "barbershop_id": tenant,
            "client_id": client_id,
            "channel": NotificationChannel::Whatsapp,
            "message": to_client,
        });
        state
            .backend
            .insert(Collection::ClientNotificationHistory, record)
            .await?;
        tracing::debug!(%tenant, %client_id, "Client message logged");
    }

    tracing::info!(
        %tenant,
        shop_link = links.barbershop.is_some(),
        client_link = links.client.is_some(),
        "Appointment links composed"
    );
    Ok(Json(json!({ "success": true, "links": links })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::TenantId;
    use uuid::Uuid;

    fn event(kind: AppointmentEventKind) -> AppointmentEvent {
        AppointmentEvent {
            barbershop_id: TenantId(Uuid::new_v4()),
            appointment_id: None,
            client_id: None,
            client_name: "João".to_string(),
            client_phone: Some("(11) 98765-4321".to_string()),
            barber_id: None,
            barber_name: Some("Carlos".to_string()),
            service_name: "Corte".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2026, 3, 7).unwrap(),
            appointment_time: "14:30".to_string(),
            event: kind,
        }
    }

    #[test]
    fn test_client_message() {
        assert_eq!(
            client_message(&event(AppointmentEventKind::Created), "Barbearia do Zé"),
            "Olá João! Seu agendamento na Barbearia do Zé está confirmado: Corte com Carlos em 07/03/2026 às 14:30."
        );
        assert!(
            client_message(&event(AppointmentEventKind::Cancelled), "Barbearia do Zé")
                .ends_with("foi cancelado.")
        );
    }

    #[test]
    fn test_whatsapp_link_encodes_text() {
        let link = whatsapp_link("(11) 98765-4321", "Olá João").unwrap();
        assert!(link.starts_with("https://wa.me/5511987654321?text="));
        assert!(!link.contains(' '));
        assert_eq!(whatsapp_link("123", "oi"), None);
    }
}
