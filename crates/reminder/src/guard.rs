//! Reminder send guard — Redis-backed dedup for the reminder sweep.
//!
//! Two sweep passes can observe the same booking before either has set its
//! `reminder_sent` flag. The guard takes an atomic Redis claim per booking
//! before dispatching, so only one pass sends.
//!
//! Uses Redis `SET NX EX` for atomic check-and-set with automatic TTL expiry.

use redis::aio::ConnectionManager;
use uuid::Uuid;

/// TTL on a claim, in seconds. Long enough to outlive any realistic sweep
/// overlap, short enough that keys do not accumulate.
const CLAIM_TTL_SECONDS: u64 = 7200;

pub struct ReminderGuard;

impl ReminderGuard {
    pub fn new() -> Self {
        Self
    }

    /// Claim the right to send reminders for a booking.
    ///
    /// Returns `true` when this caller holds the claim and should send.
    /// Returns `false` when another pass already claimed the booking.
    ///
    /// Uses Redis `SET key value NX EX ttl` for atomic check-and-set:
    /// - NX = only set if key doesn't exist
    /// - EX = set TTL in seconds
    pub async fn check_and_set(
        &self,
        redis: &mut ConnectionManager,
        booking_id: Uuid,
    ) -> anyhow::Result<bool> {
        let key = format!("booking:reminder:{}", booking_id);

        // SET key "1" NX EX ttl
        // Returns Some("OK") if key was set (claim acquired)
        // Returns None if key already exists (claimed elsewhere)
        let result: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(CLAIM_TTL_SECONDS)
            .query_async(redis)
            .await?;

        let claimed = result.is_some();

        if !claimed {
            tracing::debug!(
                booking_id = %booking_id,
                "Reminder already claimed by a concurrent pass"
            );
        }

        Ok(claimed)
    }
}

impl Default for ReminderGuard {
    fn default() -> Self {
        Self::new()
    }
}
