//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Construct the shared service state (store, stats, tracker, coordinator)
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, work tracking)
//! - Serve until the shutdown coordinator stops the listener

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{HashingConfig, ServiceConfig};
use crate::hashing::{HashService, JobStore};
use crate::http::handlers::{
    get_stats, hash_method_not_supported, retrieve_hash, stats_method_not_supported,
    submit_hash, track_in_flight, trigger_shutdown,
};
use crate::http::request::{request_span, UuidRequestId};
use crate::lifecycle::shutdown::{Disable, ShutdownComplete, ShutdownCoordinator};
use crate::lifecycle::tracker::WorkTracker;
use crate::observability::stats::{RequestStats, StatsReporter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub hashing: Arc<HashService>,
    pub stats: Arc<StatsReporter>,
    pub coordinator: Arc<ShutdownCoordinator>,
}

/// HTTP server for the hashing service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    hashing: Arc<HashService>,
    coordinator: Arc<ShutdownCoordinator>,
    stop_rx: broadcast::Receiver<()>,
    complete: Option<ShutdownComplete>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Self {
        let tracker = WorkTracker::new();
        let stats = Arc::new(RequestStats::new());
        let hashing = Arc::new(HashService::new(
            &config.hashing,
            JobStore::new(),
            tracker.clone(),
            Arc::clone(&stats),
        ));
        let reporter = Arc::new(StatsReporter::new(stats));

        // Subscribed up front so a stop sent before `run` is not missed.
        let (stop_tx, stop_rx) = broadcast::channel(1);
        let components: Vec<Arc<dyn Disable>> = vec![hashing.clone(), reporter.clone()];
        let (coordinator, complete) =
            ShutdownCoordinator::new(components, tracker.clone(), move || {
                tracing::info!("Stopping listener");
                let _ = stop_tx.send(());
            });
        let coordinator = Arc::new(coordinator);

        let state = AppState {
            hashing: hashing.clone(),
            stats: reporter,
            coordinator: coordinator.clone(),
        };

        let router = Self::build_router(&config, state, tracker);
        Self {
            router,
            config,
            hashing,
            coordinator,
            stop_rx,
            complete: Some(complete),
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `/shutdown` is not counted as outstanding work, otherwise it would
    /// wait on itself.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState, tracker: WorkTracker) -> Router {
        let tracked = Router::new()
            .route("/hash", post(submit_hash).fallback(hash_method_not_supported))
            .route("/hash/", get(retrieve_hash).fallback(hash_method_not_supported))
            .route(
                "/hash/{*id}",
                get(retrieve_hash).fallback(hash_method_not_supported),
            )
            .route("/stats", get(get_stats).fallback(stats_method_not_supported))
            .route_layer(middleware::from_fn_with_state(tracker, track_in_flight));

        Router::new()
            .merge(tracked)
            .route("/shutdown", any(trigger_shutdown))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|request: &Request<Body>| request_span(request)),
            )
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Returns once the listener has been stopped by the shutdown sequence
    /// and open connections have closed.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            delay = ?self.hashing.delay(),
            "HTTP server starting"
        );

        let mut stop_rx = self.stop_rx;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Change the hashing delay. The default delay is 5s.
    pub fn set_delay(&self, delay: Duration) {
        self.hashing.set_delay(delay);
    }

    /// Apply hashing settings from reloaded configurations as they arrive.
    pub fn watch_config_updates(
        &self,
        mut updates: mpsc::UnboundedReceiver<HashingConfig>,
    ) -> JoinHandle<()> {
        let hashing = self.hashing.clone();
        tokio::spawn(async move {
            while let Some(config) = updates.recv().await {
                hashing.apply_config(&config);
            }
        })
    }

    /// The one-shot shutdown completion signal.
    ///
    /// Handed out once; later calls return `None`.
    pub fn shutdown_complete(&mut self) -> Option<ShutdownComplete> {
        self.complete.take()
    }

    /// Handle for triggering shutdown from outside the HTTP surface.
    pub fn shutdown_handle(&self) -> Arc<ShutdownCoordinator> {
        self.coordinator.clone()
    }

    pub fn hashing(&self) -> Arc<HashService> {
        self.hashing.clone()
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
