//! Background session-reminder sweep: turns upcoming confirmed bookings
//! into `session_reminder` notifications for both participants.

pub mod guard;
pub mod sweep;
