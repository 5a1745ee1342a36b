/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tackboard_api::{app::AppState, config::Config};
/// use tackboard_shared::store::MemoryStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = tackboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tackboard_shared::auth::middleware::create_jwt_middleware;
use tackboard_shared::services::{BoardService, TaskService};
use tackboard_shared::store::DataStore;
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
    /// Storage backend
    pub store: Arc<dyn DataStore>,

    /// Board and membership operations
    pub boards: BoardService,

    /// Task operations
    pub tasks: TaskService,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn DataStore>, config: Config) -> Self {
        Self {
            boards: BoardService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            store,
            config: Arc::new(config),
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
/// The router is organized as follows:
/// ```text
/// /
/// ├── /health                           # Health check (public)
/// ├── /v1/                              # API v1 (versioned)
/// │   ├── /auth/
/// │   │   ├── POST /register            # Public
/// │   │   ├── POST /login               # Public
/// │   │   ├── POST /refresh             # Public
/// │   │   └── GET  /me                  # Authenticated
/// │   ├── /boards/                      # Authenticated
/// │   │   ├── POST   /
/// │   │   ├── GET    /
/// │   │   ├── GET    /:board_id
/// │   │   ├── PATCH  /:board_id
/// │   │   ├── DELETE /:board_id
/// │   │   ├── GET    /:board_id/members
/// │   │   ├── POST   /:board_id/members
/// │   │   ├── PATCH  /:board_id/members/:member_id
/// │   │   ├── DELETE /:board_id/members/:member_id
/// │   │   ├── GET    /:board_id/activity
/// │   │   ├── GET    /:board_id/tasks
/// │   │   ├── POST   /:board_id/tasks
/// │   │   └── PATCH  /:board_id/tasks/reorder
/// │   └── /tasks/                       # Authenticated
/// │       ├── PATCH  /:task_id
/// │       └── DELETE /:task_id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-route basis)
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tackboard_api::app::{build_router, AppState};
/// use tackboard_api::config::Config;
/// use tackboard_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
///
/// let app = build_router(state);
///
/// // Start server
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:4000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn build_router(state: AppState) -> Router {
    // Import route handlers
    use crate::routes;

    let require_auth = axum::middleware::from_fn(create_jwt_middleware(state.jwt_secret().to_string()));

    // Health check (public, no auth)
    let health_routes = Router::new()
        .route("/health", get(routes::health::health_check));

    // Auth routes (register/login/refresh public, /me authenticated)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .merge(
            Router::new()
                .route("/me", get(routes::auth::me))
                .layer(require_auth.clone()),
        );

    // Board routes (require JWT authentication)
    let board_routes = Router::new()
        .route("/", post(routes::boards::create_board))
        .route("/", get(routes::boards::list_boards))
        .route("/:board_id", get(routes::boards::get_board))
        .route("/:board_id", patch(routes::boards::rename_board))
        .route("/:board_id", delete(routes::boards::delete_board))
        .route("/:board_id/members", get(routes::members::list_members))
        .route("/:board_id/members", post(routes::members::add_member))
        .route("/:board_id/members/:member_id", patch(routes::members::update_member_role))
        .route("/:board_id/members/:member_id", delete(routes::members::remove_member))
        .route("/:board_id/activity", get(routes::activity::list_activity))
        .route("/:board_id/tasks", get(routes::tasks::list_tasks))
        .route("/:board_id/tasks", post(routes::tasks::create_task))
        .route("/:board_id/tasks/reorder", patch(routes::tasks::reorder_tasks))
        .layer(require_auth.clone());

    // Task routes addressed by task id alone (require JWT authentication)
    let task_routes = Router::new()
        .route("/:task_id", patch(routes::tasks::update_task))
        .route("/:task_id", delete(routes::tasks::delete_task))
        .layer(require_auth);

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/boards", board_routes)
        .nest("/tasks", task_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
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
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
