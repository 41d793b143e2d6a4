//! Filesystem artifact storage.

use crate::{ArtifactKind, ArtifactMetadata, ArtifactReference, ArtifactStore};
use caldecott_error::{CaldecottResult, StorageError, StorageErrorKind};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Content-addressable filesystem backend.
///
/// Artifacts land at `{base}/{kind}/{hash[0:2]}/{hash[2:4]}/{hash}`:
///
/// ```text
/// books/luma/artifacts/
/// ├── illustrations/
/// │   └── ab/
/// │       └── cd/
/// │           └── abcdef123456...
/// ├── composites/
/// └── covers/
/// ```
///
/// Two-level fan-out keeps directories small over long books and repeated
/// regeneration. Writes go to a temp file and rename into place, so a
/// reference either resolves to complete content or nothing.
pub struct FileSystemArtifacts {
    base_path: PathBuf,
}

impl FileSystemArtifacts {
    /// Open a storage root, creating it if absent.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> CaldecottResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Opened artifact storage");
        Ok(Self { base_path })
    }

    fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    fn path_for(&self, hash: &str, kind: ArtifactKind) -> PathBuf {
        self.base_path
            .join(kind.dir())
            .join(&hash[0..2])
            .join(&hash[2..4])
            .join(hash)
    }

    fn reference_for(
        &self,
        hash: String,
        path: &Path,
        data_len: usize,
        metadata: &ArtifactMetadata,
    ) -> ArtifactReference {
        ArtifactReference {
            id: Uuid::new_v4(),
            content_hash: hash,
            storage_backend: "filesystem".to_string(),
            storage_path: path.to_string_lossy().to_string(),
            size_bytes: data_len as i64,
            kind: metadata.kind,
            mime_type: metadata.mime_type.clone(),
        }
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FileSystemArtifacts {
    #[tracing::instrument(
        skip(self, data, metadata),
        fields(size = data.len(), kind = %metadata.kind, page = metadata.page)
    )]
    async fn store(
        &self,
        data: &[u8],
        metadata: &ArtifactMetadata,
    ) -> CaldecottResult<ArtifactReference> {
        let hash = Self::compute_hash(data);
        let path = self.path_for(&hash, metadata.kind);

        // Same bytes, same hash, same file: nothing to write.
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(hash = %hash, "Artifact already stored, deduplicating");
            return Ok(self.reference_for(hash, &path, data.len(), metadata));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::info!(
            hash = %hash,
            path = %path.display(),
            size = data.len(),
            "Stored artifact"
        );
        Ok(self.reference_for(hash, &path, data.len(), metadata))
    }

    #[tracing::instrument(skip(self, reference), fields(hash = %reference.content_hash))]
    async fn retrieve(&self, reference: &ArtifactReference) -> CaldecottResult<Vec<u8>> {
        let path = Path::new(&reference.storage_path);

        let data = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(reference.storage_path.clone()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        // Verify content hash
        let actual = Self::compute_hash(&data);
        if actual != reference.content_hash {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(format!(
                "Hash mismatch: expected {}, got {}",
                reference.content_hash, actual
            )))
            .into());
        }

        tracing::debug!(size = data.len(), "Retrieved artifact");
        Ok(data)
    }

    #[tracing::instrument(skip(self, reference), fields(hash = %reference.content_hash))]
    async fn delete(&self, reference: &ArtifactReference) -> CaldecottResult<()> {
        let path = Path::new(&reference.storage_path);

        tokio::fs::remove_file(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(reference.storage_path.clone()))
            } else {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "delete {}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::info!(path = %path.display(), "Deleted artifact");
        Ok(())
    }

    async fn exists(&self, reference: &ArtifactReference) -> CaldecottResult<bool> {
        let path = Path::new(&reference.storage_path);
        Ok(tokio::fs::try_exists(path).await.unwrap_or(false))
    }
}
