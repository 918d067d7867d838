//! Notification store access — reads and the two read-acknowledgment
//! mutations. Records are append-only apart from the `read` flag, which
//! only ever moves false → true.

use sqlx::PgPool;
use uuid::Uuid;

use mindmend_common::error::AppError;
use mindmend_common::types::Notification;

use crate::dispatcher::NewNotification;

/// Hard cap on a notification listing page; also the default page size.
pub const MAX_PAGE_LIMIT: i64 = 50;

pub struct NotificationStore;

impl NotificationStore {
    /// Insert a new unread notification for a recipient.
    pub async fn insert(pool: &PgPool, params: &NewNotification) -> Result<Notification, AppError> {
        let id = Uuid::new_v4();
        let data = params.data.clone().unwrap_or(serde_json::json!({}));

        let notification: Notification = sqlx::query_as(
            r#"
            INSERT INTO notifications (id, recipient_id, title, message, kind, read, link, data)
            VALUES ($1, $2, $3, $4, $5, false, $6, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(params.recipient)
        .bind(&params.title)
        .bind(&params.message)
        .bind(params.kind)
        .bind(&params.link)
        .bind(&data)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// List a recipient's notifications, newest first.
    ///
    /// `limit` defaults to 50 and is clamped to at most 50.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>, AppError> {
        let limit = limit.unwrap_or(MAX_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);

        let notifications: Vec<Notification> = sqlx::query_as(
            r#"
            SELECT * FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(recipient_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    /// Mark one of a recipient's notifications read.
    ///
    /// Idempotent: re-marking an already-read row is a no-op success. An id
    /// that does not exist for this recipient is `NotFound`.
    pub async fn mark_read(pool: &PgPool, id: Uuid, recipient_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = true WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(recipient_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Notification {} not found", id)));
        }

        Ok(())
    }

    /// Mark all of a recipient's unread notifications read in one bulk
    /// update. Other recipients' rows are untouched. Returns the number of
    /// rows updated.
    pub async fn mark_all_read(pool: &PgPool, recipient_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = true WHERE recipient_id = $1 AND read = false",
        )
        .bind(recipient_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
