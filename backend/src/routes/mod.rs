//! Route definitions for the roast companion API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Roaster hardware bridge
        .nest("/realtime", realtime_routes())
        .nest("/roast/auto", auto_roast_routes())
        .nest("/roast/manual", manual_roast_routes())
        .nest("/profiles", profile_routes())
        .route("/dashboard/metrics", get(handlers::get_metrics))
        .route("/notifications", get(handlers::list_notifications))
}

fn realtime_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_fields))
        .route("/:field", get(handlers::get_field).put(handlers::put_field))
}

/// Automatic roast session routes
fn auto_roast_routes() -> Router<AppState> {
    use handlers::auto_roast::*;

    Router::new()
        .route("/", get(get_session))
        .route("/start", post(start))
        .route("/preheat", post(confirm_pre_heat))
        .route("/beans-inserted", post(beans_inserted))
        .route("/turning-point/ack", post(acknowledge_turning_point))
        .route("/plan", post(submit_plan))
        .route("/finish", post(request_finish))
        .route("/finish/confirm", post(confirm_finish))
        .route("/modal/cancel", post(cancel_modal))
        .route("/stop", post(stop))
        .route("/heater", post(set_heater))
        .route("/motor", post(set_motor))
        .route("/pid", post(set_pid_control))
}

/// Manual roast session routes
fn manual_roast_routes() -> Router<AppState> {
    use handlers::manual_roast::*;

    Router::new()
        .route("/", get(get_session))
        .route("/start", post(start))
        .route("/heater", post(set_heater))
        .route("/motor", post(set_motor))
        .route("/log", post(update_log))
        .route("/stop", post(request_stop))
        .route("/stop/confirm", post(confirm_stop))
        .route("/stop/cancel", post(cancel_stop))
        .route("/save", post(save))
        .route("/discard", post(discard))
}

/// Roast profile routes
fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_profiles).post(handlers::create_profile),
        )
        .route("/recent", get(handlers::recent_profiles))
        .route(
            "/:id",
            get(handlers::get_profile)
                .put(handlers::update_profile)
                .delete(handlers::delete_profile),
        )
}
