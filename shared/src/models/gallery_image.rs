//! Gallery Image Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TenantId;

/// Portfolio image; `image_url` points at the public URL of an object
/// in the `gallery` storage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: Uuid,
    pub barbershop_id: TenantId,
    pub barber_id: Option<Uuid>,
    pub image_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Create gallery image payload (the URL is filled in after upload)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalleryImageCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barber_id: Option<Uuid>,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub featured: bool,
}

/// Update gallery image payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalleryImageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}
