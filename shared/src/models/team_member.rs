//! Team Member Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TenantId;

/// Barber working at a barbershop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub barbershop_id: TenantId,
    /// Linked auth user, if the barber has an account
    pub user_id: Option<Uuid>,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Share of service revenue paid to the barber (0-100)
    pub commission_percentage: Decimal,
    /// Monthly revenue goal
    pub revenue_goal: Option<Decimal>,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Create team member payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub commission_percentage: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_goal: Option<Decimal>,
    pub active: bool,
}

/// Update team member payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamMemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_percentage: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_goal: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}
