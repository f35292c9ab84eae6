pub mod auth;
pub mod bookings;
pub mod calendar;
pub mod clients;
pub mod dashboard;
pub mod health;
pub mod packages;
pub mod payments;
pub mod venues;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use chrono::NaiveDateTime;

use crate::state::AppState;

/// Observation time for derived statuses: the server's local wall clock.
pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/api/bookings/check-conflicts",
            post(bookings::check_conflicts),
        )
        .route(
            "/api/bookings/:id",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/bookings/:id/summary", get(bookings::booking_summary))
        .route(
            "/api/bookings/:id/calendar.ics",
            get(calendar::download_ics),
        )
        .route("/api/calendar/feed.ics", get(calendar::calendar_feed))
        .route(
            "/api/payments",
            get(payments::list_payments).post(payments::record_payment),
        )
        .route("/api/payments/:id", axum::routing::delete(payments::delete_payment))
        .route("/api/payments/:id/refund", post(payments::refund_payment))
        .route(
            "/api/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route(
            "/api/clients/:id",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route(
            "/api/packages",
            get(packages::list_packages).post(packages::create_package),
        )
        .route(
            "/api/packages/:id",
            get(packages::get_package)
                .put(packages::update_package)
                .delete(packages::delete_package),
        )
        .route(
            "/api/venues",
            get(venues::list_venues).post(venues::create_venue),
        )
        .route(
            "/api/venues/:id",
            get(venues::get_venue)
                .put(venues::update_venue)
                .delete(venues::delete_venue),
        )
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .with_state(state)
}
