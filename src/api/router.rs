//! Portal API router.
//!
//! Returns a composable `Router` with every procedure under `/api/` plus the
//! public calendar feed under `/calendar/feed/`.
//!
//! Three route groups share one middleware shape:
//! - public: session resolver → audit
//! - protected: `require_auth` → audit
//! - admin: `require_admin` → audit

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the portal router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn portal_api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Build router from a pre-constructed `ApiContext`, so tests can open
/// sessions directly.
#[cfg(test)]
pub(crate) fn portal_api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/me", get(endpoints::auth::me))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/knowledge/articles", get(endpoints::knowledge::articles))
        .route("/knowledge/articles/:id", get(endpoints::knowledge::article))
        .route(
            "/knowledge/articles/:id/views",
            post(endpoints::knowledge::increment_views),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::identify))
        .layer(axum::Extension(ctx.clone()));

    let protected = Router::new()
        .route(
            "/patient/profile",
            get(endpoints::patient::get_profile).post(endpoints::patient::update_profile),
        )
        .route("/prosthesis", get(endpoints::prosthesis::get))
        .route("/prosthesis/documents", get(endpoints::prosthesis::documents))
        .route("/rehabilitation/plan", get(endpoints::rehabilitation::plan))
        .route(
            "/rehabilitation/plans/:plan_id/phases",
            get(endpoints::rehabilitation::phases),
        )
        .route(
            "/rehabilitation/tasks/today",
            get(endpoints::rehabilitation::todays_tasks),
        )
        .route(
            "/rehabilitation/tasks/:task_id/complete",
            post(endpoints::rehabilitation::complete_task),
        )
        .route(
            "/service/requests",
            get(endpoints::service::requests).post(endpoints::service::create_request),
        )
        .route("/appointments", get(endpoints::appointments::all))
        .route("/appointments/upcoming", get(endpoints::appointments::upcoming))
        .route("/notifications", get(endpoints::notifications::all))
        .route(
            "/notifications/:id/read",
            post(endpoints::notifications::mark_as_read),
        )
        .route(
            "/notifications/read-all",
            post(endpoints::notifications::mark_all_as_read),
        )
        .route(
            "/notifications/preferences",
            get(endpoints::notifications::preferences)
                .post(endpoints::notifications::update_preferences),
        )
        .route("/achievements", get(endpoints::achievements::all))
        .route("/dashboard/summary", get(endpoints::dashboard::summary))
        .route(
            "/calendar/subscription",
            get(endpoints::calendar::get_subscription),
        )
        .route("/calendar/status", get(endpoints::calendar::sync_status))
        .route(
            "/calendar/appointments/:id/ics",
            get(endpoints::calendar::export_appointment),
        )
        .route(
            "/calendar/appointments/:id/google",
            get(endpoints::calendar::google_link),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let admin = Router::new()
        .route("/admin/stats", get(endpoints::admin::stats))
        .route(
            "/admin/patients",
            get(endpoints::admin::patients).post(endpoints::admin::create_patient),
        )
        .route("/admin/patients/:id", get(endpoints::admin::patient))
        .route(
            "/admin/patients/:id/service-requests",
            get(endpoints::admin::patient_orders),
        )
        .route(
            "/admin/patients/:id/rehab-plans",
            get(endpoints::admin::patient_rehab_plans),
        )
        .route(
            "/admin/appointments",
            post(endpoints::admin::create_appointment),
        )
        .route(
            "/admin/appointments/:id",
            post(endpoints::admin::update_appointment),
        )
        .route("/admin/tasks", post(endpoints::admin::create_task))
        .route(
            "/admin/service-requests/:id/status",
            post(endpoints::admin::update_service_request_status),
        )
        .route(
            "/admin/notifications",
            post(endpoints::admin::send_notification),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::Extension(ctx.clone()));

    // Calendar apps fetch the feed without credentials; the token is the key.
    let feed = Router::new()
        .route("/calendar/feed/:token", get(endpoints::calendar::feed))
        .with_state(ctx);

    Router::new()
        .nest("/api", public)
        .nest("/api", protected)
        .nest("/api", admin)
        .merge(feed)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(CorsLayer::permissive())
}
