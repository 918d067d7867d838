//! Notification dispatcher — the single entry point every domain action
//! uses to inform a user.
//!
//! Persist first, then push. The push is best-effort: reaching zero live
//! connections is a normal outcome, not an error. Persistence failures
//! surface in the returned `Result`; callers on the domain path log them
//! and move on so a notification failure never blocks the action that
//! triggered it.

use sqlx::PgPool;
use uuid::Uuid;

use mindmend_common::error::AppError;
use mindmend_common::types::{Notification, NotificationKind, ServerEvent};

use crate::registry::ConnectionRegistry;
use crate::store::NotificationStore;

/// Parameters for dispatching a new notification.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewNotification {
    pub recipient: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// Result of the real-time push step of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The event was handed to this many live connections.
    Delivered { connections: usize },
    /// Nobody was joined to the recipient's channel; the event was dropped.
    NoActiveConnections,
}

/// Outcome of a successful dispatch: the persisted record plus the push
/// result, kept separate so callers can observe each step.
#[derive(Debug, Clone)]
pub struct DispatchReceipt {
    pub notification: Notification,
    pub push: PushOutcome,
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: ConnectionRegistry,
}

impl Dispatcher {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Persist a notification, then push it to the recipient's live
    /// connections.
    ///
    /// The recipient must resolve to an existing user. Persistence always
    /// happens first and unconditionally; the push result never affects the
    /// persisted record.
    pub async fn dispatch(
        &self,
        pool: &PgPool,
        params: NewNotification,
    ) -> Result<DispatchReceipt, AppError> {
        let recipient: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(params.recipient)
            .fetch_optional(pool)
            .await?;

        if recipient.is_none() {
            return Err(AppError::Validation(format!(
                "Recipient {} does not exist",
                params.recipient
            )));
        }

        let notification = NotificationStore::insert(pool, &params).await?;

        let delivered = self.registry.publish(
            notification.recipient_id,
            &ServerEvent::NotificationReceived(notification.clone()),
        );
        let push = if delivered == 0 {
            PushOutcome::NoActiveConnections
        } else {
            PushOutcome::Delivered {
                connections: delivered,
            }
        };

        tracing::info!(
            notification_id = %notification.id,
            recipient = %notification.recipient_id,
            kind = %notification.kind,
            connections = delivered,
            "Notification dispatched"
        );

        Ok(DispatchReceipt { notification, push })
    }
}
