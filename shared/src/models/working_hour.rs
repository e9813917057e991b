//! Working Hour Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TenantId;

/// Day of week as stored by the backend: 0 = Sunday ... 6 = Saturday
pub type DayOfWeek = i16;

/// Opening interval for one day of the week
///
/// `barber_id = None` means the interval applies to the whole shop.
/// Times are "HH:MM" strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHour {
    pub id: Uuid,
    pub barbershop_id: TenantId,
    pub barber_id: Option<Uuid>,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub active: bool,
}

/// Create working hour payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHourCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barber_id: Option<Uuid>,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub active: bool,
}

/// Update working hour payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingHourUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}
