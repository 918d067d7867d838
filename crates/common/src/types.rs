use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account roles on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Role {
    Patient,
    Therapist,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Therapist => write!(f, "therapist"),
        }
    }
}

/// Kinds of notifications a user can receive.
///
/// The set is closed: an unrecognized kind is a deserialization error,
/// never a new case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum NotificationKind {
    BookingRequest,
    BookingConfirmed,
    SessionReminder,
    NewMessage,
    System,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::BookingRequest => write!(f, "booking_request"),
            NotificationKind::BookingConfirmed => write!(f, "booking_confirmed"),
            NotificationKind::SessionReminder => write!(f, "session_reminder"),
            NotificationKind::NewMessage => write!(f, "new_message"),
            NotificationKind::System => write!(f, "system"),
        }
    }
}

/// Lifecycle states of a therapy session booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
    Completed,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Rejected => write!(f, "rejected"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
            BookingStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A user in the system.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A therapy session booking between a patient and a therapist.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub therapist_id: Uuid,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
    pub status: BookingStatus,
    pub notes: String,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
}

/// A persisted notification addressed to exactly one recipient.
///
/// `read` transitions false → true only; `created_at` is immutable.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub link: Option<String>,
    /// Opaque payload for client interpretation (e.g., a related booking id).
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A direct message between two users.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Frames the server pushes to a client over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    NotificationReceived(Notification),
}

/// Frames a client sends to the server over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinUser { user_id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_kind_wire_names() {
        let json = serde_json::to_string(&NotificationKind::BookingConfirmed).unwrap();
        assert_eq!(json, "\"booking_confirmed\"");
        let kind: NotificationKind = serde_json::from_str("\"session_reminder\"").unwrap();
        assert_eq!(kind, NotificationKind::SessionReminder);
    }

    #[test]
    fn test_unknown_notification_kind_rejected() {
        let result = serde_json::from_str::<NotificationKind>("\"marketing_blast\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_server_event_frame_shape() {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            title: "Booking Confirmed!".to_string(),
            message: "See you soon".to_string(),
            kind: NotificationKind::BookingConfirmed,
            read: false,
            link: Some("/patient/book".to_string()),
            data: serde_json::json!({}),
            created_at: Utc::now(),
        };
        let frame = serde_json::to_value(ServerEvent::NotificationReceived(notification)).unwrap();
        assert_eq!(frame["event"], "notification_received");
        assert_eq!(frame["payload"]["read"], false);
    }

    #[test]
    fn test_client_event_join_frame() {
        let user_id = Uuid::new_v4();
        let raw = format!(
            "{{\"event\":\"join_user\",\"payload\":{{\"user_id\":\"{}\"}}}}",
            user_id
        );
        let event: ClientEvent = serde_json::from_str(&raw).unwrap();
        let ClientEvent::JoinUser { user_id: parsed } = event;
        assert_eq!(parsed, user_id);
    }
}
