//! HTTP API for the kiosk frontend.
//!
//! Every route lives under `/api` and speaks camelCase JSON. When
//! `server.static_dir` is set, anything else falls through to the built
//! frontend on disk.

mod error;
mod routes;
mod state;

use std::time::Duration;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{error, info, Instrument};

use crate::error::Result;

pub use error::ApiError;
pub use state::AppState;

use routes::{
    analytics_handler, analytics_refresh_handler, cameras_handler, create_memo_handler,
    driver_handler, driver_memos_handler, drivers_basic_handler, locations_handler,
    login_handler, match_handler, violations_handler,
};

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route("/login", post(login_handler))
        .route("/violations", get(violations_handler))
        .route("/drivers/{id}", get(driver_handler))
        .route("/drivers-basic", get(drivers_basic_handler))
        .route("/match", post(match_handler))
        .route("/memos", post(create_memo_handler))
        .route("/memos/driver/{driver_id}", get(driver_memos_handler))
        .route("/locations", get(locations_handler))
        .route("/cameras", get(cameras_handler))
        .route("/analytics", get(analytics_handler))
        .route("/analytics/refresh", get(analytics_refresh_handler));

    let mut app = Router::new().nest("/api", api);

    if let Some(dir) = &state.config.server.static_dir {
        info!("Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(middleware::from_fn(request_tracing))
        .layer(cors)
        .with_state(state)
}

async fn request_tracing(request: Request<Body>, next: Next) -> Response {
    let span = tracing::info_span!(
        "http.request",
        method = %request.method(),
        route = %request.uri().path(),
    );

    async move {
        let response = next.run(request).await;
        info!(status = response.status().as_u16(), "Handled request");
        response
    }
    .instrument(span)
    .await
}

/// Bind the configured address and serve until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address is invalid or cannot be bound.
pub async fn serve(state: AppState) -> Result<()> {
    let address = state.config.bind_addr()?;
    let app = build_router(state);

    let listener = TcpListener::bind(address).await?;
    info!("Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
