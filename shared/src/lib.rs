//! Shared types for Synkro
//!
//! Entity records exchanged with the hosted backend, the appointment event
//! payload consumed by the serverless functions, and billing DTOs.

pub mod appointment;
pub mod billing;
pub mod models;
pub mod types;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
pub use types::{InvalidTenantId, TenantId};
