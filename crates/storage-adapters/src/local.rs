//! # Local filesystem attachment stores
//!
//! Blobs are stored under a sharded path derived from the SHA-256 of the
//! attachment id: `<root>/ab/cd/<hash>`, thumbnail beside it as
//! `thumb_<hash>`. Permanent entries also get a `<hash>.json` metadata
//! sidecar, written last: an entry without its sidecar does not exist.

use async_trait::async_trait;
use bytes::Bytes;
use domains::{
    AttachmentEntity, AttachmentId, AttachmentReference, FeedMessageId, PermanentAttachmentStore,
    Result, TemporaryAttachment, TemporaryAttachmentStore,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Maps attachment ids onto sharded file locations below a root directory.
#[derive(Debug, Clone)]
struct ShardedLayout {
    root: PathBuf,
}

struct BlobPaths {
    dir: PathBuf,
    content: PathBuf,
    thumbnail: PathBuf,
    metadata: PathBuf,
}

impl ShardedLayout {
    fn paths(&self, id: &AttachmentId) -> BlobPaths {
        let hash = hex::encode(Sha256::digest(id.as_str().as_bytes()));
        let mut dir = self.root.clone();
        dir.push(&hash[0..2]);
        dir.push(&hash[2..4]);
        BlobPaths {
            content: dir.join(&hash),
            thumbnail: dir.join(format!("thumb_{hash}")),
            metadata: dir.join(format!("{hash}.json")),
            dir,
        }
    }
}

/// Reads a file, treating "not found" as absence.
async fn read_optional(path: &Path) -> Result<Option<Bytes>> {
    match fs::read(path).await {
        Ok(data) => Ok(Some(Bytes::from(data))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_optional(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Writes to a sibling `.partial` file and renames it into place, so readers
/// never observe a half-written blob.
async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);
    fs::write(&partial, data).await?;
    fs::rename(&partial, path).await?;
    Ok(())
}

pub struct LocalTemporaryAttachmentStore {
    layout: ShardedLayout,
}

impl LocalTemporaryAttachmentStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            layout: ShardedLayout { root },
        }
    }

    /// Stages a blob on disk, as the upload endpoint does before the
    /// owning transaction is submitted.
    pub async fn stage(&self, id: &AttachmentId, blob: &TemporaryAttachment) -> Result<()> {
        let paths = self.layout.paths(id);
        fs::create_dir_all(&paths.dir).await?;
        if let Some(thumbnail) = &blob.thumbnail {
            write_atomic(&paths.thumbnail, thumbnail).await?;
        }
        write_atomic(&paths.content, &blob.content).await
    }
}

#[async_trait]
impl TemporaryAttachmentStore for LocalTemporaryAttachmentStore {
    async fn retrieve(&self, id: &AttachmentId) -> Result<Option<TemporaryAttachment>> {
        let paths = self.layout.paths(id);
        let Some(content) = read_optional(&paths.content).await? else {
            return Ok(None);
        };
        let thumbnail = read_optional(&paths.thumbnail).await?;
        Ok(Some(TemporaryAttachment { content, thumbnail }))
    }

    async fn delete(&self, id: &AttachmentId) -> Result<()> {
        let paths = self.layout.paths(id);
        remove_optional(&paths.content).await?;
        remove_optional(&paths.thumbnail).await?;
        debug!(attachment_id = %id, "Temporary attachment removed");
        Ok(())
    }
}

/// On-disk metadata of a permanent attachment.
#[derive(Debug, Serialize, Deserialize)]
struct AttachmentSidecar {
    id: AttachmentId,
    feed_message_id: FeedMessageId,
    hash: String,
    mime_type: String,
    size: u64,
    file_name: String,
    has_thumbnail: bool,
}

pub struct LocalPermanentAttachmentStore {
    layout: ShardedLayout,
}

impl LocalPermanentAttachmentStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            layout: ShardedLayout { root },
        }
    }
}

#[async_trait]
impl PermanentAttachmentStore for LocalPermanentAttachmentStore {
    async fn create(&self, attachment: AttachmentEntity) -> Result<()> {
        let paths = self.layout.paths(attachment.id());
        fs::create_dir_all(&paths.dir).await?;

        write_atomic(&paths.content, attachment.content()).await?;
        if let Some(thumbnail) = attachment.thumbnail() {
            write_atomic(&paths.thumbnail, thumbnail).await?;
        }

        let sidecar = AttachmentSidecar {
            id: attachment.id().clone(),
            feed_message_id: attachment.feed_message_id(),
            hash: attachment.hash().to_string(),
            mime_type: attachment.mime_type().to_string(),
            size: attachment.size(),
            file_name: attachment.file_name().to_string(),
            has_thumbnail: attachment.thumbnail().is_some(),
        };
        write_atomic(&paths.metadata, &serde_json::to_vec(&sidecar)?).await
    }

    async fn find_by_id(&self, id: &AttachmentId) -> Result<Option<AttachmentEntity>> {
        let paths = self.layout.paths(id);
        let Some(raw) = read_optional(&paths.metadata).await? else {
            return Ok(None);
        };
        let sidecar: AttachmentSidecar = serde_json::from_slice(&raw)?;

        let Some(content) = read_optional(&paths.content).await? else {
            return Ok(None);
        };
        let thumbnail = if sidecar.has_thumbnail {
            read_optional(&paths.thumbnail).await?
        } else {
            None
        };

        let reference = AttachmentReference {
            id: sidecar.id,
            hash: sidecar.hash,
            mime_type: sidecar.mime_type,
            size: sidecar.size,
            file_name: sidecar.file_name,
        };
        Ok(Some(AttachmentEntity::from_reference(
            &reference,
            sidecar.feed_message_id,
            TemporaryAttachment { content, thumbnail },
        )))
    }
}
