#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod assess;
mod cors;
mod error;
mod health;
mod params;

use std::net::SocketAddr;
use std::sync::Arc;

use assessor_config::Config;
use assessor_llm::{AnthropicAssessor, Assessor};
use assessor_telemetry::AssessmentMetrics;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AssessError;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream client or CORS headers cannot be
    /// built from the configuration
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let assessor = AnthropicAssessor::new(&config.upstream)
            .map_err(|e| anyhow::anyhow!("failed to initialize upstream client: {e}"))?;

        Self::with_assessor(config, Arc::new(assessor))
    }

    /// Build the server around an existing assessor backend
    ///
    /// # Errors
    ///
    /// Returns an error if the CORS headers cannot be built
    pub fn with_assessor(config: &Config, assessor: Arc<dyn Assessor>) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

        tracing::debug!(
            backend = assessor.name(),
            path = %config.server.endpoint_path,
            "mounting assessment endpoint"
        );

        let state = assess::AssessState {
            assessor,
            metrics: AssessmentMetrics::new(),
        };

        let mut app = Router::new()
            .route(&config.server.endpoint_path, axum::routing::any(assess::assess))
            .with_state(state);

        // Health check
        if config.server.health.enabled {
            app = app.route(
                &config.server.health.path,
                axum::routing::get(health::health_handler),
            );
        }

        // Explicit fallback so the layers below also wrap unrouted paths
        app = app.fallback(health::not_found);

        // Apply middleware layers (innermost first)

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // CORS
        let cors_headers = Arc::new(cors::CorsHeaders::from_config(&config.server.cors)?);
        app = app.layer(axum::middleware::from_fn(
            move |req: axum::extract::Request, next: axum::middleware::Next| {
                let cors_headers = Arc::clone(&cors_headers);
                async move { cors::cors_middleware(cors_headers, req, next).await }
            },
        ));

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
