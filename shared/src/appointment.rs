//! Appointment event payload
//!
//! Sent by the booking flow to the `create-notification` and
//! `notify-new-appointment` functions whenever an appointment changes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::TenantId;
use crate::models::NotificationKind;

/// What happened to the appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentEventKind {
    #[default]
    Created,
    Updated,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppointmentEvent {
    pub barbershop_id: TenantId,
    #[serde(default)]
    pub appointment_id: Option<Uuid>,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub client_name: String,
    #[serde(default)]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub barber_id: Option<Uuid>,
    #[serde(default)]
    pub barber_name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub service_name: String,
    pub appointment_date: NaiveDate,
    /// "HH:MM"
    #[validate(length(min = 4, max = 8))]
    pub appointment_time: String,
    #[serde(default)]
    pub event: AppointmentEventKind,
}

impl AppointmentEvent {
    /// Date as shown to Brazilian users (dd/mm/yyyy)
    pub fn display_date(&self) -> String {
        self.appointment_date.format("%d/%m/%Y").to_string()
    }

    /// Time trimmed to HH:MM ("09:30:00" -> "09:30")
    pub fn display_time(&self) -> &str {
        self.appointment_time
            .get(..5)
            .unwrap_or(&self.appointment_time)
    }

    pub fn notification_kind(&self) -> NotificationKind {
        match self.event {
            AppointmentEventKind::Created => NotificationKind::NewAppointment,
            AppointmentEventKind::Updated => NotificationKind::AppointmentUpdated,
            AppointmentEventKind::Cancelled => NotificationKind::AppointmentCancelled,
        }
    }

    pub fn notification_title(&self) -> &'static str {
        match self.event {
            AppointmentEventKind::Created => "Novo agendamento",
            AppointmentEventKind::Updated => "Agendamento alterado",
            AppointmentEventKind::Cancelled => "Agendamento cancelado",
        }
    }

    /// In-app notification body
    pub fn notification_message(&self) -> String {
        let barber = self
            .barber_name
            .as_deref()
            .map(|name| format!(" com {name}"))
            .unwrap_or_default();
        format!(
            "{} - {}{} em {} às {}",
            self.client_name,
            self.service_name,
            barber,
            self.display_date(),
            self.display_time()
        )
    }
}
