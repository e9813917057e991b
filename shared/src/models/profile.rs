//! Profile / Barbershop Models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TenantId;

/// User profile linking an auth user to the barbershop they manage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub barbershop_id: Option<TenantId>,
    pub full_name: Option<String>,
}

/// Barbershop (tenant) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barbershop {
    pub id: TenantId,
    pub name: String,
    pub phone: Option<String>,
    /// Auth user that owns the barbershop
    pub owner_id: Option<Uuid>,
}
