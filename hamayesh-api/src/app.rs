/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use hamayesh_api::{app::AppState, config::Config};
/// use hamayesh_shared::db::pool::create_pool;
/// use hamayesh_shared::store::postgres::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = hamayesh_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use hamayesh_shared::{auth::middleware::authenticate_bearer, store::EntityStore};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Entity store (PostgreSQL in production, in-memory in tests)
    pub store: Arc<dyn EntityStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn EntityStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token validation
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
/// ├── GET /health                                 # Health check (public)
/// └── /v1/                                        # Bearer token required
///     ├── GET    /task-options                    # Conference selection change
///     ├── GET    /conferences/:id/statistics
///     ├── GET    /categories/:id/tasks
///     ├── PUT    /categories/:id/tasks            # Category save
///     ├── POST   /categories/:id/task-changes     # Explicit add/remove
///     ├── DELETE /categories/:id
///     ├── GET    /tasks/:id/statistics
///     ├── POST   /tasks/:id/bulk-assign
///     ├── POST   /tasks/:id/bulk-unassign
///     ├── DELETE /tasks/:id
///     ├── GET    /persons/by-code/:hash           # Badge check-in
///     ├── PUT    /persons/:id/category
///     ├── GET    /persons/:id/tasks
///     ├── PUT    /persons/:id/tasks/:task_id
///     └── DELETE /persons/:id/tasks/:task_id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (`/v1` only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let v1_routes = Router::new()
        .route("/task-options", get(routes::task_options::task_options))
        .route(
            "/conferences/:id/statistics",
            get(routes::conferences::conference_statistics),
        )
        .route(
            "/categories/:id/tasks",
            get(routes::categories::get_category_tasks).put(routes::categories::save_category_tasks),
        )
        .route(
            "/categories/:id/task-changes",
            post(routes::categories::apply_task_changes),
        )
        .route("/categories/:id", delete(routes::categories::delete_category))
        .route("/tasks/:id", delete(routes::tasks::delete_task))
        .route("/tasks/:id/statistics", get(routes::tasks::task_statistics))
        .route("/tasks/:id/bulk-assign", post(routes::tasks::bulk_assign))
        .route("/tasks/:id/bulk-unassign", post(routes::tasks::bulk_unassign))
        .route("/persons/by-code/:hash", get(routes::persons::find_by_code))
        .route("/persons/:id/category", put(routes::persons::move_person))
        .route("/persons/:id/tasks", get(routes::persons::list_person_tasks))
        .route(
            "/persons/:id/tasks/:task_id",
            put(routes::persons::assign_task).delete(routes::persons::revoke_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.cors_permissive() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects `AuthContext` into request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth_context = authenticate_bearer(header, state.jwt_secret())?;
    tracing::debug!(user_id = %auth_context.user_id, "Request authenticated");

    req.extensions_mut().insert(auth_context);
    Ok(next.run(req).await)
}
