//! Point awards. Earning points produces a `system` notification.

use sqlx::PgPool;
use uuid::Uuid;

use mindmend_common::error::AppError;
use mindmend_common::types::NotificationKind;

use crate::dispatcher::{Dispatcher, NewNotification};

/// Add points to a user's total and notify them.
///
/// The point update is the primary action; a failed notification is logged
/// and swallowed.
pub async fn award_points(
    pool: &PgPool,
    dispatcher: &Dispatcher,
    user_id: Uuid,
    points: i32,
    reason: &str,
) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET points = points + $1, updated_at = now() WHERE id = $2")
        .bind(points)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    tracing::info!(user = %user_id, points, reason, "Points awarded");

    let notice = NewNotification {
        recipient: user_id,
        title: "Points Earned!".to_string(),
        message: format!("You earned {} points for {}!", points, reason),
        kind: NotificationKind::System,
        link: Some("/patient/rewards".to_string()),
        data: Some(serde_json::json!({ "points": points })),
    };
    if let Err(e) = dispatcher.dispatch(pool, notice).await {
        tracing::warn!(user = %user_id, error = %e, "Points notification failed");
    }

    Ok(())
}
