//! HTTP routes for the rental service

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;

use crate::middleware::auth_middleware;
use crate::state::AppState;

mod admin;
mod auth;
mod catalog;
mod notices;
mod notifications;
mod payment_methods;
mod payments;
mod reservations;
mod users;
mod ws;

/// Create the router for the rental service
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/users/profile",
            get(users::profile).put(users::update_profile),
        )
        .route("/users/admin/all", get(users::list_users))
        .route(
            "/users/admin/:id",
            get(users::get_user).delete(users::delete_user),
        )
        .route("/users/admin/:id/role", put(users::update_role))
        .route(
            "/reservations",
            post(reservations::create).get(reservations::list_mine),
        )
        .route("/reservations/:id", get(reservations::get_one))
        .route("/reservations/:id/cancel", post(reservations::cancel))
        .route("/reservations/:id/complete", post(reservations::complete))
        .route("/notifications", get(notifications::list))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/notifications/:id/read", put(notifications::mark_read))
        .route("/notifications/all", delete(notifications::delete_all))
        .route("/notifications/read", delete(notifications::delete_read))
        .route("/notifications/:id", delete(notifications::delete_one))
        .route(
            "/licenses",
            get(catalog::my_licenses).post(catalog::submit_license),
        )
        .route(
            "/payment-methods",
            get(payment_methods::list).post(payment_methods::add),
        )
        .route("/payment-methods/:id", delete(payment_methods::remove))
        .route("/kakaopay/ready", post(payments::ready))
        .route(
            "/rental/admin/reservations",
            get(admin::list_reservations),
        )
        .route(
            "/rental/admin/reservations/:id",
            get(admin::get_reservation).delete(admin::delete_reservation),
        )
        .route(
            "/rental/admin/reservations/:id/status",
            put(admin::update_reservation_status),
        )
        .route(
            "/rental/admin/licenses/:id/approve",
            put(admin::approve_license),
        )
        .route(
            "/rental/admin/licenses/:id/reject",
            put(admin::reject_license),
        )
        .route("/rental/admin/stats/dashboard", get(admin::stats_dashboard))
        .route("/rental/admin/stats/monthly", get(admin::stats_monthly))
        .route("/rental/admin/stats/daily", get(admin::stats_daily))
        .route(
            "/rental/admin/stats/vehicle-types",
            get(admin::stats_vehicle_types),
        )
        .route("/rental/admin/stats/regions", get(admin::stats_regions))
        .route("/rental/admin/stats/revenue", get(admin::stats_revenue))
        .route("/rental/admin/notices", post(notices::create))
        .route(
            "/rental/admin/notices/:id",
            put(notices::update).delete(notices::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/kakao/login", post(auth::kakao_login))
        .route("/auth/validate", post(auth::validate))
        .route("/cars", get(catalog::list_cars))
        .route("/locations", get(catalog::list_locations))
        .route("/hotels", get(catalog::list_hotels))
        .route("/notices", get(notices::list))
        .route("/ws/notifications/:user_id", get(ws::notifications_ws))
        .route("/kakaopay/success/:order_id", get(payments::success))
        .route("/kakaopay/cancel/:order_id", get(payments::cancel))
        .route("/kakaopay/fail/:order_id", get(payments::fail))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "rental",
    }))
}
