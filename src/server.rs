use std::future::Future;
use std::net::SocketAddr;

use axum::{
    middleware::from_fn_with_state,
    routing::{any, get, post, put},
    Router,
};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, session_auth_middleware};
use crate::state::AppState;

/// The whole application: HTML pages, the JSON API under `/api` and `/health`.
pub fn app(state: AppState, enable_cors: bool) -> Router {
    Router::new()
        .route("/health", get(public::health::health))
        .merge(page_routes(&state))
        .merge(api_routes(&state, enable_cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn page_routes(state: &AppState) -> Router<AppState> {
    use protected::pages as protected_pages;
    use public::pages;

    let guarded = Router::new()
        .route(
            "/new",
            get(protected_pages::new_post_form).post(protected_pages::create_post),
        )
        .route("/logout", any(protected_pages::logout))
        .route_layer(from_fn_with_state(state.clone(), session_auth_middleware));

    Router::new()
        .route("/", get(pages::index))
        .route("/register", get(pages::register_form).post(pages::register))
        .route("/login", get(pages::login_form).post(pages::login))
        .route("/:slug", get(pages::show_post))
        .merge(guarded)
}

fn api_routes(state: &AppState, enable_cors: bool) -> Router<AppState> {
    let guarded = Router::new()
        .route("/api/post", post(protected::posts::create_post))
        .route("/api/post/:slug", put(protected::posts::update_post))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let router = Router::new()
        .route("/api/auth", post(public::auth::login))
        .route("/api/post", get(public::posts::list_posts))
        .route("/api/post/:slug", get(public::posts::get_post))
        .merge(guarded);

    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// A bound listener plus the router it will serve.
pub struct Server {
    listener: TcpListener,
    router: Router,
    pool: SqlitePool,
}

impl Server {
    pub async fn bind(addr: &str, state: AppState, enable_cors: bool) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let pool = state.pool.clone();

        Ok(Self {
            listener,
            router: app(state, enable_cors),
            pool,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run(self) -> std::io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serves until `signal` resolves, lets in-flight requests finish, then closes the pool.
    pub async fn run_until<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Server listening on {}", self.listener.local_addr()?);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await?;

        DatabaseManager::close(&self.pool).await;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        _ = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Starting graceful shutdown...");
}
