//! Image file storage.
//!
//! Every catalog image lives in one private directory. Files enter it by
//! moving a picked file in or by writing uploaded bytes, and leave it through
//! an idempotent delete.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::errors::AppError;

/// URI scheme the mobile client prefixes to local paths.
const FILE_SCHEME: &str = "file://";

/// Extension used when the client does not say what it uploaded.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Owner of the image directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    protected: Vec<PathBuf>,
}

impl ImageStore {
    /// Create the image directory if needed and open it.
    pub async fn open(root: &Path) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(root).await?;
        let root = tokio::fs::canonicalize(root).await?;
        tracing::debug!("Image directory: {:?}", root);
        Ok(Self {
            root,
            protected: Vec::new(),
        })
    }

    /// Never import `path`, nor any sibling whose name extends it (`-wal`, `-shm`).
    pub async fn protect(mut self, path: &Path) -> Self {
        let path = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());
        self.protected.push(path);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Move a picked file into permanent storage and return its new path.
    ///
    /// Files already in the image directory and protected files are refused.
    /// Falls back to copy-and-remove when a rename is not possible, e.g.
    /// across file systems.
    pub async fn import(&self, source: &str) -> Result<String, AppError> {
        let source = strip_scheme(source);
        let source_path = match tokio::fs::canonicalize(source).await {
            Ok(path) => path,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("Picked image {} does not exist", source)));
            }
            Err(e) => return Err(e.into()),
        };

        if source_path.starts_with(&self.root) {
            return Err(AppError::Validation(format!("Image {} is already stored", source)));
        }
        if self.is_protected(&source_path) {
            tracing::warn!("Refusing to import protected file {:?}", source_path);
            return Err(AppError::Validation(format!("{} cannot be used as an image", source)));
        }
        if !tokio::fs::metadata(&source_path).await?.is_file() {
            return Err(AppError::Validation(format!("{} is not a file", source)));
        }

        let extension = source_path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(sanitize_extension)
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        let target = self.fresh_path(&extension);

        if let Err(e) = tokio::fs::rename(&source_path, &target).await {
            tracing::debug!("Rename of {:?} failed ({}), copying instead", source_path, e);
            self.copy_atomically(&source_path, &target).await?;
            if let Err(e) = tokio::fs::remove_file(&source_path).await {
                tracing::warn!("Copied {:?} but could not remove the source: {}", source_path, e);
            }
        }

        tracing::info!("Imported image {:?} -> {:?}", source_path, target);
        Ok(target.to_string_lossy().into_owned())
    }

    /// Write uploaded image bytes and return the new path.
    pub async fn store_bytes(&self, bytes: &[u8], extension: &str) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Image upload is empty".to_string()));
        }

        let extension = sanitize_extension(extension).ok_or_else(|| {
            AppError::Validation(format!("Unsupported image extension {:?}", extension))
        })?;
        let target = self.fresh_path(&extension);

        self.write_atomically(&target, bytes).await?;

        tracing::info!("Stored {} byte image at {:?}", bytes.len(), target);
        Ok(target.to_string_lossy().into_owned())
    }

    /// Delete an image; a missing file counts as deleted.
    ///
    /// Returns whether a file was actually removed. Paths outside the image
    /// directory are never touched.
    pub async fn delete(&self, path: &str) -> Result<bool, AppError> {
        let Some(path) = self.owned_path(path) else {
            tracing::warn!("Refusing to delete {:?}: outside the image directory", path);
            return Ok(false);
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("Deleted image {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every path, logging failures instead of returning them.
    pub async fn delete_all_quietly(&self, paths: &[&str]) {
        for path in paths {
            if let Err(e) = self.delete(path).await {
                tracing::warn!("Failed to delete image {:?}: {}", path, e);
            }
        }
    }

    fn owned_path(&self, path: &str) -> Option<PathBuf> {
        let path = Path::new(strip_scheme(path));
        let escapes = path.components().any(|c| matches!(c, Component::ParentDir));
        let owned = path.is_absolute() && !escapes && path.starts_with(&self.root);
        owned.then(|| path.to_path_buf())
    }

    fn is_protected(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.protected
            .iter()
            .any(|guarded| path.starts_with(guarded.to_string_lossy().as_ref()))
    }

    fn fresh_path(&self, extension: &str) -> PathBuf {
        self.root.join(format!("{}.{}", uuid::Uuid::new_v4(), extension))
    }

    /// Final files only ever appear complete: content goes to a hidden
    /// staging file first and is renamed into place.
    async fn write_atomically(&self, target: &Path, bytes: &[u8]) -> Result<(), AppError> {
        let staging = staging_path(target);
        let written = async {
            let mut file = tokio::fs::File::create(&staging).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            tokio::fs::rename(&staging, target).await
        }
        .await;
        discard_staging(&staging, written).await
    }

    async fn copy_atomically(&self, source: &Path, target: &Path) -> Result<(), AppError> {
        let staging = staging_path(target);
        let copied = async {
            tokio::fs::copy(source, &staging).await?;
            tokio::fs::rename(&staging, target).await
        }
        .await;
        discard_staging(&staging, copied).await
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    target.with_file_name(format!(".{}.tmp", name))
}

async fn discard_staging(staging: &Path, result: std::io::Result<()>) -> Result<(), AppError> {
    if result.is_err() {
        let _ = tokio::fs::remove_file(staging).await;
    }
    result.map_err(AppError::from)
}

fn strip_scheme(path: &str) -> &str {
    path.strip_prefix(FILE_SCHEME).unwrap_or(path)
}

fn sanitize_extension(extension: &str) -> Option<String> {
    let extension = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    let valid = !extension.is_empty()
        && extension.len() <= 5
        && extension.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(extension)
}
