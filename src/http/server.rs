//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with read and write endpoints
//! - Guard write endpoints with the optional control token
//! - Serve the dashboard's static files as the fallback
//! - Wire up middleware (request ID, tracing, timeout)
//! - Stop accepting on shutdown

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ControlConfig, ListenerConfig};
use crate::http::auth::control_auth_middleware;
use crate::http::handlers::*;
use crate::lifecycle::ShutdownSignal;
use crate::relay::RelayController;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<RelayController>,
    pub control_token: Option<Arc<str>>,
}

/// HTTP front end over a [`RelayController`].
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(
        controller: Arc<RelayController>,
        listener: &ListenerConfig,
        control: &ControlConfig,
    ) -> Self {
        let state = AppState {
            controller,
            control_token: control.api_token.as_deref().map(Arc::from),
        };
        Self {
            router: Self::build_router(listener, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ListenerConfig, state: AppState) -> Router {
        let control = Router::new()
            .route("/api/relay/toggle", post(post_toggle))
            .route("/api/relay/on", post(post_on))
            .route("/api/relay/off", post(post_off))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                control_auth_middleware,
            ));

        Router::new()
            .route("/api/status", get(get_status))
            .route("/api/history", get(get_history))
            .route("/health", get(get_health))
            .merge(control)
            .fallback_service(ServeDir::new(&config.static_dir))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.request_timeout_secs,
                    ))),
            )
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Control surface listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        tracing::info!("Control surface stopped");
        Ok(())
    }
}
