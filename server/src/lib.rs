//! Todo list REST service.
//!
//! # Overview
//! Clients create, list, reorder, complete, edit and delete todos. The API is
//! mounted under a configurable base path (default `/api`); everything else
//! falls through to a static file directory.
//!
//! # Design
//! - `AppState` is built once at startup and cloned into every handler; it
//!   holds the only shared mutable state, the `TodoStore`.
//! - Multi-step mutations (create at end, order swap) run inside the store
//!   under one exclusive lock.
//! - Handlers return `Result<_, ApiError>`; `ApiError` is the single place
//!   errors become HTTP responses.

pub mod config;
pub mod error;
pub mod handlers;
pub mod store;
pub mod todo;
pub mod validation;

use std::{future::Future, sync::Arc};

use axum::{
    routing::{get, patch},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub use config::{Config, ConfigError, StoreUrl};
pub use error::ApiError;
pub use store::{StoreError, TodoStore};
pub use todo::Todo;

#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Arc<TodoStore>,
}

impl AppState {
    pub fn new(store: TodoStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// The API routes, relative to the base path.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::hello))
        .route("/todos", get(handlers::list_todos).post(handlers::create_todo))
        .route(
            "/todos/{todo_id}",
            patch(handlers::update_todo).delete(handlers::delete_todo),
        )
}

/// The full application: API under `config.base_path`, static files
/// elsewhere, request logging and panic recovery around both.
pub fn app(state: AppState, config: &Config) -> Router {
    let api = api_router();
    let router = if config.base_path == "/" {
        Router::new().merge(api)
    } else {
        Router::new().nest(&config.base_path, api)
    };

    router
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn run<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}
