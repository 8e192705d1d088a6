/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware.
use crate::config::Config;
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use pivotcrm_engine::EventDispatcher;
use pivotcrm_shared::auth::middleware::create_jwt_middleware;
use pivotcrm_shared::perm::PermissionChecker;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into each request handler via Axum's `State` extractor; everything
/// inside is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Permission checker with its resolution cache
    pub permissions: PermissionChecker,

    /// Emit handle for the automation dispatcher
    pub dispatcher: EventDispatcher,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, dispatcher: EventDispatcher) -> Self {
        let permissions = PermissionChecker::new(db.clone());
        Self {
            db,
            config: Arc::new(config),
            permissions,
            dispatcher,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                 # Health check (public)
/// └── /v1/orgs                                # All tenant-scoped (JWT)
///     ├── POST   /                            # Create organization
///     ├── GET    /:org_id                     # Read organization
///     ├── PATCH  /:org_id                     # Rename
///     ├── POST   /:org_id/archive             # Archive (idempotent)
///     ├── GET    /:org_id/permissions         # Caller's capability set
///     ├── GET|PUT /:org_id/subscription       # Plan management
///     ├── .../members                         # Membership management
///     ├── .../rules                           # Automation rules
///     ├── .../executions                      # Automation audit log
///     └── .../records                         # Domain records
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let org_routes = Router::new()
        .route("/", post(routes::orgs::create_org))
        .route(
            "/:org_id",
            get(routes::orgs::get_org).patch(routes::orgs::rename_org),
        )
        .route("/:org_id/archive", post(routes::orgs::archive_org))
        .route("/:org_id/permissions", get(routes::orgs::my_permissions))
        .route(
            "/:org_id/subscription",
            get(routes::orgs::get_subscription).put(routes::orgs::put_subscription),
        )
        .route(
            "/:org_id/members",
            get(routes::members::list_members).post(routes::members::invite_member),
        )
        .route("/:org_id/members/accept", post(routes::members::accept_invite))
        .route(
            "/:org_id/members/:user_id",
            patch(routes::members::update_role).delete(routes::members::remove_member),
        )
        .route(
            "/:org_id/rules",
            get(routes::rules::list_rules).post(routes::rules::create_rule),
        )
        .route(
            "/:org_id/rules/:rule_id",
            get(routes::rules::get_rule)
                .patch(routes::rules::update_rule)
                .delete(routes::rules::delete_rule),
        )
        .route(
            "/:org_id/rules/:rule_id/status",
            put(routes::rules::set_rule_status),
        )
        .route(
            "/:org_id/rules/:rule_id/executions",
            get(routes::executions::list_rule_executions),
        )
        .route(
            "/:org_id/executions",
            get(routes::executions::list_executions),
        )
        .route(
            "/:org_id/records",
            get(routes::records::list_records).post(routes::records::create_record),
        )
        .route(
            "/:org_id/records/:record_id",
            get(routes::records::get_record)
                .patch(routes::records::update_record)
                .delete(routes::records::delete_record),
        )
        .route(
            "/:org_id/records/:record_id/status",
            put(routes::records::set_record_status),
        )
        .layer(axum::middleware::from_fn(create_jwt_middleware(
            state.jwt_secret().to_string(),
        )));

    let v1_routes = Router::new().nest("/orgs", org_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
