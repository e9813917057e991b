//! Gallery images
//!
//! An image is an object in the `gallery` bucket plus a row pointing at its
//! public URL. Deletion is two-phase: the object goes first, and the row is
//! only deleted once storage confirmed. A storage failure therefore leaves
//! both in place; an orphaned object is preferred over a row without one.

use shared::models::{GalleryImage, GalleryImageCreate, GalleryImageUpdate};
use std::ops::Deref;
use std::sync::Arc;
use uuid::Uuid;

use crate::context::SyncContext;
use crate::coordinator::{MutationCoordinator, MutationOutcome};
use crate::gateway::ObjectStorage;
use crate::notify::Notice;
use crate::{ClientError, ClientResult};

pub const GALLERY_BUCKET: &str = "gallery";

/// Storage key of a gallery URL: the path after the bucket's public prefix.
///
/// `https://x.supabase.co/storage/v1/object/public/gallery/t/a.jpg` -> `t/a.jpg`.
/// `None` when the URL does not point into the bucket.
pub fn storage_key_from_url(url: &str) -> Option<&str> {
    let public_prefix = format!("/object/public/{GALLERY_BUCKET}/");
    let bucket_prefix = format!("/{GALLERY_BUCKET}/");
    let key = match url.find(&public_prefix) {
        Some(pos) => &url[pos + public_prefix.len()..],
        None => {
            let pos = url.find(&bucket_prefix)?;
            &url[pos + bucket_prefix.len()..]
        }
    };
    let key = key.split(['?', '#']).next().unwrap_or_default();
    (!key.is_empty()).then_some(key)
}

fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "jpg".to_string())
}

pub struct Gallery {
    images: MutationCoordinator<GalleryImage>,
    storage: Arc<dyn ObjectStorage>,
}

impl Deref for Gallery {
    type Target = MutationCoordinator<GalleryImage>;

    fn deref(&self) -> &Self::Target {
        &self.images
    }
}

impl Gallery {
    pub fn new(images: MutationCoordinator<GalleryImage>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { images, storage }
    }

    pub fn from_context(ctx: &SyncContext) -> Self {
        Self::new(MutationCoordinator::from_context(ctx), ctx.storage.clone())
    }

    /// Upload the file under `{tenant}/{uuid}.{ext}` and create its row.
    ///
    /// The object is not removed again if the row insert fails.
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        draft: GalleryImageCreate,
    ) -> MutationOutcome<GalleryImage> {
        self.images
            .run(
                self.upload_inner(file_name, bytes, content_type, draft),
                |_| Notice::success("Image uploaded"),
                "Failed to upload image".to_string(),
            )
            .await
    }

    async fn upload_inner(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        mut draft: GalleryImageCreate,
    ) -> ClientResult<GalleryImage> {
        let tenant = self.images.scope().await?;
        let key = format!("{tenant}/{}.{}", Uuid::new_v4(), extension(file_name));
        draft.image_url = self
            .storage
            .put_object(GALLERY_BUCKET, &key, bytes, content_type)
            .await?;
        tracing::debug!(%tenant, %key, "Gallery object stored");
        self.images.create_inner(&draft).await
    }

    /// Two-phase delete: storage object, then row
    pub async fn delete(&self, id: Uuid) -> MutationOutcome<()> {
        self.images
            .run(
                self.delete_inner(id),
                |_| Notice::success("Image deleted"),
                "Failed to delete image".to_string(),
            )
            .await
    }

    async fn delete_inner(&self, id: Uuid) -> ClientResult<()> {
        let image = self
            .store()
            .get(id)
            .await
            .ok_or_else(|| ClientError::NotFound(format!("image {id}")))?;

        match storage_key_from_url(&image.image_url) {
            Some(key) => self.storage.remove_object(GALLERY_BUCKET, key).await?,
            None => tracing::debug!(%id, url = %image.image_url, "Image is not stored in the gallery bucket"),
        }

        self.images.delete_inner(id).await
    }

    pub async fn set_featured(&self, id: Uuid, featured: bool) -> MutationOutcome<GalleryImage> {
        let patch = GalleryImageUpdate {
            featured: Some(featured),
            ..Default::default()
        };
        self.images.update(id, &patch).await
    }

    pub async fn featured(&self) -> Vec<GalleryImage> {
        self.store().filter(|image| image.featured).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_from_public_url() {
        assert_eq!(
            storage_key_from_url(
                "https://abc.supabase.co/storage/v1/object/public/gallery/t1/a.jpg"
            ),
            Some("t1/a.jpg")
        );
        assert_eq!(
            storage_key_from_url("https://cdn.example.com/gallery/t1/b.png?width=300"),
            Some("t1/b.png")
        );
        assert_eq!(storage_key_from_url("https://images.example.com/c.jpg"), None);
        assert_eq!(storage_key_from_url("https://x/object/public/gallery/"), None);
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("Corte.JPG"), "jpg");
        assert_eq!(extension("foto.final.webp"), "webp");
        assert_eq!(extension("sem-extensao"), "jpg");
    }
}
