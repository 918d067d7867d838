//! Booking routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use uuid::Uuid;

use mindmend_common::error::AppError;
use mindmend_common::types::Booking;
use mindmend_engine::bookings::{BookingService, CreateBookingParams, UpdateBookingStatusParams};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking))
        .route("/api/bookings", get(list_patient_bookings))
        .route("/api/bookings/therapist", get(list_therapist_bookings))
        .route("/api/bookings/{id}/status", put(update_booking_status))
}

/// POST /api/bookings — request a session with a therapist.
async fn create_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(params): Json<CreateBookingParams>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking =
        BookingService::create(&state.pool, &state.dispatcher, auth.user_id, &params).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/bookings — the caller's bookings as a patient.
async fn list_patient_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = BookingService::list_for_patient(&state.pool, auth.user_id).await?;
    Ok(Json(bookings))
}

/// GET /api/bookings/therapist — the caller's bookings as a therapist.
async fn list_therapist_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = BookingService::list_for_therapist(&state.pool, auth.user_id).await?;
    Ok(Json(bookings))
}

/// PUT /api/bookings/:id/status — accept / reject / complete a booking.
async fn update_booking_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(params): Json<UpdateBookingStatusParams>,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingService::update_status(
        &state.pool,
        &state.dispatcher,
        id,
        auth.user_id,
        &params,
    )
    .await?;
    Ok(Json(booking))
}
