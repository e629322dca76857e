//! Object storage for uploaded images (pet avatars, product photos, banners).
//!
//! Objects are addressed by `{bucket}/{...}/{file}` paths. The local
//! implementation writes below `STORAGE_PATH`, which the router serves under
//! `/uploads`, so the public URL of an object is
//! `{PUBLIC_BASE_URL}/uploads/{path}`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::i18n;

pub const BUCKET_PET_AVATARS: &str = "pet-avatars";
pub const BUCKET_MEAL_IMAGES: &str = "meal-images";
pub const BUCKET_AD_BANNERS: &str = "ad-banners";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

#[async_trait]
pub trait StorageProvider: Send + Sync {
    async fn put(&self, path: &str, data: Bytes) -> AppResult<()>;

    async fn delete(&self, path: &str) -> AppResult<()>;

    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// URL under which clients can fetch the object.
    fn public_url(&self, path: &str) -> String;

    /// Inverse of [`StorageProvider::public_url`]; `None` for foreign URLs.
    fn path_from_public_url(&self, url: &str) -> Option<String>;

    fn storage_type(&self) -> &'static str;
}

/// Local file system storage
pub struct LocalStorage {
    base_path: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            base_path: base_path.into(),
            public_prefix: format!("{}/uploads/", public_base_url.trim_end_matches('/')),
        }
    }

    fn full_path(&self, path: &str) -> AppResult<PathBuf> {
        // Only plain relative segments; no `..`, roots or prefixes.
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::Storage(format!("invalid object path: {}", path)));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    async fn put(&self, path: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.full_path(path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("create {}: {}", parent.display(), e)))?;
        }

        let mut file = fs::File::create(&full_path)
            .await
            .map_err(|e| AppError::Storage(format!("create {}: {}", full_path.display(), e)))?;
        file.write_all(&data)
            .await
            .map_err(|e| AppError::Storage(format!("write {}: {}", full_path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| AppError::Storage(format!("flush {}: {}", full_path.display(), e)))?;

        tracing::debug!("Saved upload to {:?}", full_path);
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.full_path(path)?;

        match fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!("Deleted upload {:?}", full_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "delete {}: {}",
                full_path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let full_path = self.full_path(path)?;
        fs::try_exists(&full_path)
            .await
            .map_err(|e| AppError::Storage(format!("stat {}: {}", full_path.display(), e)))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}{}", self.public_prefix, path)
    }

    fn path_from_public_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_prefix).map(str::to_string)
    }

    fn storage_type(&self) -> &'static str {
        "local"
    }
}

/// Lower-cased extension of an uploaded image, or a validation error.
pub fn image_extension(filename: &str) -> AppResult<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(AppError::Validation(i18n::t_with(
            "validation.unsupported_file_type",
            &[("ext", if ext.is_empty() { "(none)" } else { ext.as_str() })],
        )))
    }
}

/// Validate and store an image under `{bucket}/{prefix}/{uuid}.{ext}`, returning its public URL.
pub async fn store_image(
    storage: &dyn StorageProvider,
    bucket: &str,
    prefix: Option<&str>,
    filename: &str,
    data: Bytes,
    max_bytes: usize,
) -> AppResult<String> {
    if data.is_empty() {
        return Err(AppError::Validation(i18n::t("validation.missing_file")));
    }
    if data.len() > max_bytes {
        return Err(AppError::Validation(i18n::t_with(
            "validation.file_too_large",
            &[("max", &max_bytes.to_string())],
        )));
    }

    let ext = image_extension(filename)?;
    let object = format!("{}.{}", Uuid::new_v4(), ext);
    let path = match prefix {
        Some(prefix) => format!("{}/{}/{}", bucket, prefix, object),
        None => format!("{}/{}", bucket, object),
    };

    storage.put(&path, data).await?;
    tracing::info!("Stored {} ({} storage)", path, storage.storage_type());

    Ok(storage.public_url(&path))
}

/// Best-effort removal of a previously stored object that is being replaced.
pub async fn remove_replaced(storage: &dyn StorageProvider, old_url: Option<&str>) {
    let Some(path) = old_url.and_then(|url| storage.path_from_public_url(url)) else {
        return;
    };
    if let Err(e) = storage.delete(&path).await {
        tracing::warn!("Failed to remove replaced upload {}: {:?}", path, e);
    }
}
