//! Data models
//!
//! Rows of the hosted backend's tenant-scoped tables. Every record carries
//! the owning `barbershop_id`; ids are server-assigned UUIDs.
//! `*Create` payloads omit both, the client layer injects the tenant.

pub mod client;
pub mod gallery_image;
pub mod loyalty;
pub mod notification;
pub mod profile;
pub mod service;
pub mod team_member;
pub mod working_hour;

// Re-exports
pub use client::*;
pub use gallery_image::*;
pub use loyalty::*;
pub use notification::*;
pub use profile::*;
pub use service::*;
pub use team_member::*;
pub use working_hour::*;
