use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::error;
use uuid::Uuid;

use super::MessageStore;
use crate::dispatch::RecordHandler;
use crate::message::{HandleStatus, Message, ProcessOutcome};

/// A row in `user_info`. Email and password hash exist for an account
/// surface that is out of scope here; the pipeline only correlates on
/// `line_user_id`.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: String,
    pub line_user_id: String,
}

impl MessageStore {
    /// Look up a user by their LINE user ID.
    pub async fn find_user(&self, line_user_id: &str) -> Result<Option<UserInfo>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT id, line_user_id FROM user_info WHERE line_user_id = ?1")
            .context("Failed to prepare user lookup")?;
        let mut rows = stmt
            .query_map(rusqlite::params![line_user_id], |row| {
                Ok(UserInfo {
                    id: row.get(0)?,
                    line_user_id: row.get(1)?,
                })
            })
            .context("Failed to query user")?;
        match rows.next() {
            Some(Ok(user)) => Ok(Some(user)),
            Some(Err(e)) => Err(e).context("Failed to read user row"),
            None => Ok(None),
        }
    }

    /// Create a user record for a LINE user ID. The unique constraint on
    /// `line_user_id` makes concurrent creation safe; losers surface an
    /// error the handler maps to an outcome.
    pub async fn create_user(&self, line_user_id: &str) -> Result<UserInfo> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO user_info (id, line_user_id) VALUES (?1, ?2)",
            rusqlite::params![&id, line_user_id],
        )
        .context("Failed to create user")?;
        Ok(UserInfo {
            id,
            line_user_id: line_user_id.to_string(),
        })
    }

    /// Insert an archived message record. Text body and file name land in
    /// nullable columns; NULL means "not applicable for this message kind".
    pub async fn insert_record(
        &self,
        user: &UserInfo,
        message: &Message,
        filepath: Option<&Path>,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO message_records
             (id, user_info_id, line_user_id, line_message_id, message, filename, filepath, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                &id,
                &user.id,
                &user.line_user_id,
                &message.id,
                message.text(),
                message.filename(),
                filepath.map(|p| p.to_string_lossy().to_string()),
                message.timestamp.to_rfc3339(),
            ],
        )
        .context("Failed to insert message record")?;
        Ok(id)
    }

    /// Find-or-create the owning user, then write the record. This is the
    /// shared persistence path for both the record handler and the content
    /// fetcher; every failure maps to a named outcome.
    pub async fn archive(&self, message: &Message, filepath: Option<&Path>) -> HandleStatus {
        let user = match self.find_user(&message.owner_id).await {
            Ok(Some(user)) => user,
            Ok(None) => match self.create_user(&message.owner_id).await {
                Ok(user) => user,
                Err(e) => {
                    error!("database create user error: {:#}", e);
                    return HandleStatus::failed(ProcessOutcome::UserCreateError);
                }
            },
            Err(e) => {
                error!("database user lookup error: {:#}", e);
                return HandleStatus::failed(ProcessOutcome::DatabaseReadError);
            }
        };

        match self.insert_record(&user, message, filepath).await {
            Ok(_) => HandleStatus::ok(),
            Err(e) => {
                error!("database error: {:#}", e);
                HandleStatus::failed(ProcessOutcome::DatabaseWriteError)
            }
        }
    }

    /// Number of archived records for a LINE user.
    #[allow(dead_code)]
    pub async fn record_count(&self, line_user_id: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        let count = conn
            .query_row(
                "SELECT count(*) FROM message_records WHERE line_user_id = ?1",
                rusqlite::params![line_user_id],
                |row| row.get(0),
            )
            .context("Failed to count records")?;
        Ok(count)
    }
}

#[async_trait]
impl RecordHandler for MessageStore {
    async fn handle_record(&self, message: &Message) -> HandleStatus {
        self.archive(message, None).await
    }
}
