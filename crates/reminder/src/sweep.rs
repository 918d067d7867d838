//! Session reminder sweep.
//!
//! Periodically scans today's confirmed bookings and, for each one starting
//! within the lead window, notifies the patient and the therapist, then
//! records the send in the booking row. The sweep runs inside the API
//! process so its pushes share the live connection registry.

use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use redis::aio::ConnectionManager;
use sqlx::PgPool;

use mindmend_common::types::{Booking, NotificationKind};
use mindmend_engine::dispatcher::{Dispatcher, NewNotification};

use crate::guard::ReminderGuard;

pub struct ReminderSweep {
    pool: PgPool,
    redis: ConnectionManager,
    dispatcher: Dispatcher,
    interval: Duration,
    lead_minutes: i64,
    guard: ReminderGuard,
}

impl ReminderSweep {
    pub fn new(
        pool: PgPool,
        redis: ConnectionManager,
        dispatcher: Dispatcher,
        poll_interval_secs: u64,
        lead_minutes: i64,
    ) -> Self {
        Self {
            pool,
            redis,
            dispatcher,
            interval: Duration::from_secs(poll_interval_secs),
            lead_minutes,
            guard: ReminderGuard::new(),
        }
    }

    /// Run the sweep loop indefinitely. A failing pass is logged and the
    /// loop continues; it never tears down the server.
    pub async fn run(&mut self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            lead_minutes = self.lead_minutes,
            "Reminder sweep started"
        );

        loop {
            match self.sweep_once().await {
                Ok(sent) if sent > 0 => {
                    tracing::info!(bookings = sent, "Reminders sent");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Reminder sweep pass failed");
                }
            }

            tokio::time::sleep(self.interval).await;
        }
    }

    /// One pass over today's confirmed, un-reminded bookings. Returns the
    /// number of bookings reminded.
    pub async fn sweep_once(&mut self) -> anyhow::Result<u32> {
        let now = Utc::now().naive_utc();

        let due: Vec<Booking> = sqlx::query_as(
            r#"
            SELECT * FROM bookings
            WHERE status = 'confirmed'
              AND session_date = $1
              AND reminder_sent = false
            "#,
        )
        .bind(now.date())
        .fetch_all(&self.pool)
        .await?;

        let mut sent = 0u32;
        for booking in &due {
            let Some(minutes) = minutes_until(booking, now, self.lead_minutes) else {
                continue;
            };

            // Atomic claim so a concurrent pass cannot double-send before
            // the flag below lands.
            if !self.guard.check_and_set(&mut self.redis, booking.id).await? {
                continue;
            }

            self.notify_participants(booking, minutes).await;

            sqlx::query("UPDATE bookings SET reminder_sent = true WHERE id = $1")
                .bind(booking.id)
                .execute(&self.pool)
                .await?;

            sent += 1;
        }

        Ok(sent)
    }

    async fn notify_participants(&self, booking: &Booking, minutes: i64) {
        let patient_notice = NewNotification {
            recipient: booking.patient_id,
            title: "Session Reminder".to_string(),
            message: format!("Your therapy session starts in {} minutes!", minutes),
            kind: NotificationKind::SessionReminder,
            link: Some("/patient".to_string()),
            data: Some(serde_json::json!({ "booking_id": booking.id })),
        };
        if let Err(e) = self.dispatcher.dispatch(&self.pool, patient_notice).await {
            tracing::warn!(booking_id = %booking.id, error = %e, "Patient reminder failed");
        }

        let therapist_notice = NewNotification {
            recipient: booking.therapist_id,
            title: "Upcoming Session".to_string(),
            message: format!("You have a session starting in {} minutes.", minutes),
            kind: NotificationKind::SessionReminder,
            link: Some("/therapist/appointments".to_string()),
            data: Some(serde_json::json!({ "booking_id": booking.id })),
        };
        if let Err(e) = self.dispatcher.dispatch(&self.pool, therapist_notice).await {
            tracing::warn!(booking_id = %booking.id, error = %e, "Therapist reminder failed");
        }
    }
}

/// Minutes (rounded to nearest) until a booking's start, when the start
/// lies inside the `(0, lead_minutes]` window; `None` otherwise.
fn minutes_until(booking: &Booking, now: NaiveDateTime, lead_minutes: i64) -> Option<i64> {
    let starts_at = booking.session_date.and_time(booking.session_time);
    let seconds = (starts_at - now).num_seconds();

    if seconds <= 0 || seconds > lead_minutes * 60 {
        return None;
    }

    Some((seconds + 30) / 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use mindmend_common::types::BookingStatus;
    use uuid::Uuid;

    const LEAD: i64 = 30;

    fn make_booking(date: NaiveDate, time: NaiveTime) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            therapist_id: Uuid::new_v4(),
            session_date: date,
            session_time: time,
            status: BookingStatus::Confirmed,
            notes: String::new(),
            reminder_sent: false,
            created_at: Utc::now(),
        }
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 7)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, m, s).unwrap())
    }

    #[test]
    fn test_session_inside_window_is_due() {
        let booking = make_booking(at(14, 30, 0).date(), at(14, 30, 0).time());
        assert_eq!(minutes_until(&booking, at(14, 20, 0), LEAD), Some(10));
    }

    #[test]
    fn test_session_at_window_edge_is_due() {
        let booking = make_booking(at(15, 0, 0).date(), at(15, 0, 0).time());
        assert_eq!(minutes_until(&booking, at(14, 30, 0), LEAD), Some(30));
    }

    #[test]
    fn test_session_beyond_window_not_due() {
        let booking = make_booking(at(16, 0, 0).date(), at(16, 0, 0).time());
        assert_eq!(minutes_until(&booking, at(15, 0, 0), LEAD), None);
    }

    #[test]
    fn test_session_in_the_past_not_due() {
        let booking = make_booking(at(14, 0, 0).date(), at(14, 0, 0).time());
        assert_eq!(minutes_until(&booking, at(14, 0, 1), LEAD), None);
    }

    #[test]
    fn test_minutes_round_to_nearest() {
        let booking = make_booking(at(15, 0, 0).date(), at(15, 0, 0).time());
        // 29m59s out rounds to 30, not 29.
        assert_eq!(minutes_until(&booking, at(14, 30, 1), LEAD), Some(30));
    }
}
