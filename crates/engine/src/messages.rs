//! Direct messages between patients and therapists, and the `new_message`
//! notifications they produce.

use sqlx::PgPool;
use uuid::Uuid;

use mindmend_common::error::AppError;
use mindmend_common::types::{Message, NotificationKind, Role, User};

use crate::dispatcher::{Dispatcher, NewNotification};

/// Maximum number of body characters shown in a notification preview.
const PREVIEW_LENGTH: usize = 50;

pub struct MessageService;

/// Parameters for sending a direct message.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SendMessageParams {
    pub recipient_id: Uuid,
    pub body: String,
}

impl MessageService {
    /// Persist a message and notify the recipient with a body preview.
    pub async fn send(
        pool: &PgPool,
        dispatcher: &Dispatcher,
        sender_id: Uuid,
        params: &SendMessageParams,
    ) -> Result<Message, AppError> {
        if params.body.trim().is_empty() {
            return Err(AppError::Validation("Message body must not be empty".to_string()));
        }
        if params.recipient_id == sender_id {
            return Err(AppError::Validation("Cannot message yourself".to_string()));
        }

        let sender: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(sender_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", sender_id)))?;

        let recipient: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(params.recipient_id)
            .fetch_optional(pool)
            .await?;
        if recipient.is_none() {
            return Err(AppError::Validation(format!(
                "Recipient {} does not exist",
                params.recipient_id
            )));
        }

        let id = Uuid::new_v4();
        let message: Message = sqlx::query_as(
            r#"
            INSERT INTO messages (id, sender_id, recipient_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(sender_id)
        .bind(params.recipient_id)
        .bind(&params.body)
        .fetch_one(pool)
        .await?;

        // The recipient lands on their side of the conversation.
        let link = match sender.role {
            Role::Therapist => "/patient/chat",
            Role::Patient => "/therapist/chat",
        };

        let notice = NewNotification {
            recipient: params.recipient_id,
            title: format!("New Message from {}", sender.name),
            message: Self::preview(&params.body),
            kind: NotificationKind::NewMessage,
            link: Some(link.to_string()),
            data: Some(serde_json::json!({ "message_id": message.id })),
        };
        if let Err(e) = dispatcher.dispatch(pool, notice).await {
            tracing::warn!(message_id = %message.id, error = %e, "Message notification failed");
        }

        Ok(message)
    }

    /// The two-way conversation between a user and a peer, oldest first.
    pub async fn conversation(
        pool: &PgPool,
        user_id: Uuid,
        peer_id: Uuid,
    ) -> Result<Vec<Message>, AppError> {
        let messages: Vec<Message> = sqlx::query_as(
            r#"
            SELECT * FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(peer_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    /// Body preview for notifications, truncated with a trailing ellipsis.
    fn preview(body: &str) -> String {
        if body.chars().count() <= PREVIEW_LENGTH {
            body.to_string()
        } else {
            let truncated: String = body.chars().take(PREVIEW_LENGTH).collect();
            format!("{}...", truncated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_body_untouched() {
        assert_eq!(MessageService::preview("hello"), "hello");
    }

    #[test]
    fn test_body_at_limit_untouched() {
        let body = "x".repeat(50);
        assert_eq!(MessageService::preview(&body), body);
    }

    #[test]
    fn test_long_body_truncated_with_ellipsis() {
        let body = "x".repeat(60);
        let preview = MessageService::preview(&body);
        assert_eq!(preview.len(), 53);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let body = "ä".repeat(60);
        let preview = MessageService::preview(&body);
        assert_eq!(preview.chars().count(), 53);
    }
}
