//! Booking service — session bookings between patients and therapists,
//! and the notifications each transition produces.
//!
//! A new booking notifies the therapist (`booking_request`); a status
//! update notifies the patient (`booking_confirmed` on confirmation,
//! `system` otherwise). Notification failures are logged and never block
//! the booking operation itself.

use sqlx::PgPool;
use uuid::Uuid;

use chrono::{NaiveDate, NaiveTime};

use mindmend_common::error::AppError;
use mindmend_common::types::{Booking, BookingStatus, NotificationKind, Role, User};

use crate::dispatcher::{Dispatcher, NewNotification};
use crate::gamification;

/// Points awarded to a patient for a completed session.
const SESSION_COMPLETION_POINTS: i32 = 50;

pub struct BookingService;

/// Parameters for creating a new booking.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateBookingParams {
    pub therapist_id: Uuid,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
}

/// Parameters for updating a booking's status.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct UpdateBookingStatusParams {
    pub status: BookingStatus,
    pub notes: Option<String>,
}

impl BookingService {
    /// Create a pending booking and notify the therapist.
    pub async fn create(
        pool: &PgPool,
        dispatcher: &Dispatcher,
        patient_id: Uuid,
        params: &CreateBookingParams,
    ) -> Result<Booking, AppError> {
        let patient = Self::fetch_user(pool, patient_id).await?;
        let therapist = Self::fetch_user(pool, params.therapist_id).await?;
        if therapist.role != Role::Therapist {
            return Err(AppError::Validation(format!(
                "User {} is not a therapist",
                params.therapist_id
            )));
        }

        let id = Uuid::new_v4();
        let booking: Booking = sqlx::query_as(
            r#"
            INSERT INTO bookings (id, patient_id, therapist_id, session_date, session_time, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patient_id)
        .bind(params.therapist_id)
        .bind(params.session_date)
        .bind(params.session_time)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            booking_id = %booking.id,
            patient = %patient_id,
            therapist = %params.therapist_id,
            "Booking created"
        );

        let request = NewNotification {
            recipient: params.therapist_id,
            title: "New Booking Request".to_string(),
            message: format!(
                "{} has requested a session on {} at {}",
                patient.name,
                booking.session_date,
                booking.session_time.format("%H:%M")
            ),
            kind: NotificationKind::BookingRequest,
            link: Some("/therapist/appointments".to_string()),
            data: Some(serde_json::json!({ "booking_id": booking.id })),
        };
        if let Err(e) = dispatcher.dispatch(pool, request).await {
            tracing::warn!(booking_id = %booking.id, error = %e, "Booking request notification failed");
        }

        Ok(booking)
    }

    /// All bookings made by a patient, newest session first.
    pub async fn list_for_patient(pool: &PgPool, patient_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let bookings: Vec<Booking> = sqlx::query_as(
            "SELECT * FROM bookings WHERE patient_id = $1 ORDER BY session_date DESC, session_time DESC",
        )
        .bind(patient_id)
        .fetch_all(pool)
        .await?;

        Ok(bookings)
    }

    /// All bookings addressed to a therapist, newest session first.
    pub async fn list_for_therapist(
        pool: &PgPool,
        therapist_id: Uuid,
    ) -> Result<Vec<Booking>, AppError> {
        let bookings: Vec<Booking> = sqlx::query_as(
            "SELECT * FROM bookings WHERE therapist_id = $1 ORDER BY session_date DESC, session_time DESC",
        )
        .bind(therapist_id)
        .fetch_all(pool)
        .await?;

        Ok(bookings)
    }

    /// Get a single booking by ID.
    pub async fn get(pool: &PgPool, booking_id: Uuid) -> Result<Booking, AppError> {
        let booking: Booking = sqlx::query_as("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?;

        Ok(booking)
    }

    /// Update a booking's status (owning therapist only) and notify the
    /// patient. A completed session also awards points.
    pub async fn update_status(
        pool: &PgPool,
        dispatcher: &Dispatcher,
        booking_id: Uuid,
        therapist_id: Uuid,
        params: &UpdateBookingStatusParams,
    ) -> Result<Booking, AppError> {
        let existing = Self::get(pool, booking_id).await?;
        if existing.therapist_id != therapist_id {
            return Err(AppError::Auth(
                "Not authorized to update this booking".to_string(),
            ));
        }

        let notes = params.notes.clone().unwrap_or(existing.notes);

        let booking: Booking = sqlx::query_as(
            r#"
            UPDATE bookings
            SET status = $1, notes = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(params.status)
        .bind(&notes)
        .bind(booking_id)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            booking_id = %booking_id,
            status = %booking.status,
            "Booking status updated"
        );

        if booking.status == BookingStatus::Completed {
            if let Err(e) = gamification::award_points(
                pool,
                dispatcher,
                booking.patient_id,
                SESSION_COMPLETION_POINTS,
                "completing a session",
            )
            .await
            {
                tracing::warn!(booking_id = %booking.id, error = %e, "Point award failed");
            }
        }

        let therapist = Self::fetch_user(pool, therapist_id).await?;
        let (title, message, kind) = match booking.status {
            BookingStatus::Confirmed => (
                "Booking Confirmed!".to_string(),
                format!(
                    "Dr. {} has confirmed your session for {} at {}",
                    therapist.name,
                    booking.session_date,
                    booking.session_time.format("%H:%M")
                ),
                NotificationKind::BookingConfirmed,
            ),
            BookingStatus::Rejected => (
                "Booking Declined".to_string(),
                format!("Dr. {} is unavailable for the requested slot.", therapist.name),
                NotificationKind::System,
            ),
            _ => (
                "Booking Update".to_string(),
                format!("Your session status has been updated to {}", booking.status),
                NotificationKind::System,
            ),
        };

        let notice = NewNotification {
            recipient: booking.patient_id,
            title,
            message,
            kind,
            link: Some("/patient/book".to_string()),
            data: Some(serde_json::json!({ "booking_id": booking.id })),
        };
        if let Err(e) = dispatcher.dispatch(pool, notice).await {
            tracing::warn!(booking_id = %booking.id, error = %e, "Status notification failed");
        }

        Ok(booking)
    }

    async fn fetch_user(pool: &PgPool, id: Uuid) -> Result<User, AppError> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        Ok(user)
    }
}
