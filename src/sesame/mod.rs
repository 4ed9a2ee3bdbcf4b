use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Extension, Router,
};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{debug_span, error, info, Span};
use ulid::Ulid;

pub mod config;
pub mod handlers;
pub mod password;
pub mod schema;
pub mod session;
pub mod state;
pub mod users;
pub mod views;

pub use self::config::{Config, SessionBackend};

use self::{
    handlers::{guards, pages},
    session::{MemorySessionStore, PgSessionStore, SessionManager, SessionStore},
    state::AppState,
    users::PgUserStore,
    views::Views,
};

/// Build the application router.
///
/// Guards are route layers so they run after the session middleware has put
/// the [`session::Session`] into the request extensions. `/health` is added
/// after the session layer and never creates a session.
pub fn router(state: Arc<AppState>, sessions: SessionManager) -> Router {
    Router::new()
        .route(
            handlers::HOME_PATH,
            get(pages::index).route_layer(from_fn(guards::is_logged_out)),
        )
        .route(
            handlers::LOGIN_PATH,
            get(pages::login).route_layer(from_fn(guards::is_logged_out)),
        )
        .route(
            handlers::PROTECTED_PATH,
            get(pages::protected).route_layer(from_fn(guards::is_logged_in)),
        )
        .route("/signup", post(handlers::signup))
        .route("/signin", post(handlers::signin))
        .route("/signout", get(handlers::signout))
        .layer(from_fn_with_state(sessions, session::middleware))
        .layer(Extension(state))
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span)),
        )
}

/// Start the server
/// # Errors
/// Returns an error if the database is unreachable, the schema or templates
/// cannot be loaded, or the listener cannot bind.
pub async fn new(config: Config) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(config.dsn().expose_secret())
        .await
        .context("Failed to connect to database")?;

    schema::apply(&pool).await?;

    let views = match config.views_dir() {
        Some(dir) => Views::load(dir)?,
        None => Views::embedded()?,
    };

    let session_store: Arc<dyn SessionStore> = match config.session_backend() {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionBackend::Postgres => Arc::new(PgSessionStore::new(pool.clone())),
    };
    session::spawn_cleanup_worker(session_store.clone(), session::CLEANUP_INTERVAL);
    let sessions = SessionManager::new(session_store, config.session().clone());
    info!(
        "Session store: {}, ttl: {}s",
        config.session_backend(),
        sessions.config().ttl_seconds()
    );

    let state = Arc::new(AppState::new(Arc::new(PgUserStore::new(pool)), views));

    let app = router(state, sessions);

    let port = config.port();
    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Span for a single database statement.
pub(crate) fn db_span(operation: &'static str, statement: &'static str) -> Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

// span, headers are left out since they carry the session cookie
fn make_span(request: &Request<Body>) -> Span {
    let method = request.method().as_str();
    let path = request.uri().path();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", method, path, request_id)
}
