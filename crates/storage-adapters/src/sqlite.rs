//! # SQLite feed message store
//!
//! Maps between the relational model and [`FeedMessage`]. UUIDs are stored
//! as 16-byte BLOBs, attachment id lists as JSON text.

use async_trait::async_trait;
use domains::{
    AttachmentId, BlockIndex, DomainError, FeedId, FeedMessage, FeedMessageId, FeedMessageStore,
    PublicAddress, Result,
};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS feed_messages (
    id             BLOB PRIMARY KEY,
    feed_id        BLOB NOT NULL,
    content        TEXT NOT NULL,
    issuer         TEXT NOT NULL,
    block_index    INTEGER NOT NULL,
    timestamp      TEXT NOT NULL,
    reply_to       BLOB,
    attachment_ids TEXT
)";

const INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_feed_messages_feed ON feed_messages (feed_id, block_index)";

pub struct SqliteFeedMessageStore {
    pool: SqlitePool,
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Result<Uuid> {
    Uuid::from_slice(blob).map_err(|e| DomainError::Storage(format!("corrupt uuid column: {e}")))
}

fn storage_error(e: sqlx::Error) -> DomainError {
    DomainError::Storage(e.to_string())
}

impl SqliteFeedMessageStore {
    /// Connects and creates the schema if needed. Use `max_connections = 1`
    /// with `sqlite::memory:`, since every connection gets its own database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await
            .map_err(storage_error)?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(storage_error)?;
        sqlx::query(INDEX)
            .execute(&pool)
            .await
            .map_err(storage_error)?;

        Ok(Self { pool })
    }

    /// Messages of a feed in block order.
    pub async fn list_by_feed(&self, feed_id: FeedId) -> Result<Vec<FeedMessage>> {
        sqlx::query("SELECT * FROM feed_messages WHERE feed_id = ? ORDER BY block_index ASC")
            .bind(uuid_to_blob(feed_id.as_uuid()))
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?
            .iter()
            .map(row_to_message)
            .collect()
    }
}

fn row_to_message(row: &SqliteRow) -> Result<FeedMessage> {
    let reply_to = row
        .try_get::<Option<Vec<u8>>, _>("reply_to")
        .map_err(storage_error)?
        .map(|blob| blob_to_uuid(&blob).map(FeedMessageId::new))
        .transpose()?;
    let attachment_ids = row
        .try_get::<Option<String>, _>("attachment_ids")
        .map_err(storage_error)?
        .map(|raw| serde_json::from_str::<Vec<AttachmentId>>(&raw))
        .transpose()?;
    let block_index: i64 = row.try_get("block_index").map_err(storage_error)?;

    Ok(FeedMessage::new(
        FeedMessageId::new(blob_to_uuid(
            &row.try_get::<Vec<u8>, _>("id").map_err(storage_error)?,
        )?),
        FeedId::new(blob_to_uuid(
            &row.try_get::<Vec<u8>, _>("feed_id").map_err(storage_error)?,
        )?),
        row.try_get("content").map_err(storage_error)?,
        PublicAddress::new(row.try_get::<String, _>("issuer").map_err(storage_error)?),
        BlockIndex::new(block_index as u64),
        row.try_get("timestamp").map_err(storage_error)?,
        reply_to,
        attachment_ids,
    ))
}

#[async_trait]
impl FeedMessageStore for SqliteFeedMessageStore {
    async fn create(&self, message: &FeedMessage) -> Result<()> {
        let attachment_ids = message
            .attachment_ids()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            "INSERT INTO feed_messages (id, feed_id, content, issuer, block_index, timestamp, reply_to, attachment_ids) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(message.id().as_uuid()))
        .bind(uuid_to_blob(message.feed_id().as_uuid()))
        .bind(message.content())
        .bind(message.issuer().as_str())
        .bind(message.block_index().value() as i64)
        .bind(message.timestamp())
        .bind(message.reply_to().map(|id| uuid_to_blob(id.as_uuid())))
        .bind(attachment_ids)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                DomainError::Conflict(format!("feed message {} already exists", message.id())),
            ),
            Err(e) => Err(storage_error(e)),
        }
    }

    async fn find_by_id(&self, id: FeedMessageId) -> Result<Option<FeedMessage>> {
        let row = sqlx::query("SELECT * FROM feed_messages WHERE id = ?")
            .bind(uuid_to_blob(id.as_uuid()))
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref().map(row_to_message).transpose()
    }
}
