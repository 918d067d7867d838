//! Core domain services for the MindMend backend: the connection registry,
//! the notification dispatcher and store, and the booking / message / points
//! services that produce notifications.

pub mod bookings;
pub mod dispatcher;
pub mod gamification;
pub mod messages;
pub mod registry;
pub mod store;
