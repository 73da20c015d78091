//! Inbound HTTP endpoint.
//!
//! The endpoint always answers 200 with a well-formed advisory body; upstream
//! trouble only shows up in the content.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::{
        HeaderName, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::get,
};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::{WeatherAdvisory, resolver::AdvisoryResolver};

pub const ADVISORY_PATH: &str = "/weather-advisory";

pub fn router(resolver: Arc<AdvisoryResolver>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ]);

    let endpoint = get(advisory_handler).post(advisory_handler).options(preflight_handler);

    Router::new()
        .route("/", endpoint.clone())
        .route(ADVISORY_PATH, endpoint)
        .layer(cors)
        .with_state(resolver)
}

/// Resolve one advisory. Any request body is ignored.
pub async fn advisory_handler(
    State(resolver): State<Arc<AdvisoryResolver>>,
) -> (StatusCode, Json<WeatherAdvisory>) {
    (StatusCode::OK, Json(resolver.resolve().await))
}

pub async fn preflight_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(resolver: AdvisoryResolver, bind: &str) -> Result<()> {
    let app = router(Arc::new(resolver));

    info!("Binding to {bind}");
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind advisory endpoint to {bind}"))?;

    info!("Advisory endpoint running on {bind}{ADVISORY_PATH}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Advisory endpoint terminated with an error")?;

    info!("Advisory endpoint shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        } else {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
