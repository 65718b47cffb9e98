//! HTTP surface for the hearthq broker.
//!
//! The router exposes the topic lifecycle and the produce/consume
//! paths over a small REST surface:
//!
//! | Method & path | Semantics |
//! |---|---|
//! | `GET /topics` | list topics (`prefix`/`suffix`/`regex` filters) |
//! | `PUT /topics/{topic}` | create |
//! | `DELETE /topics/{topic}` | delete |
//! | `PATCH /topics/{topic}` | truncate by ID and/or time |
//! | `POST /topics/{topic}` | produce (`X-Sizes` header + raw body) |
//! | `GET /topics/{topic}?id=&limit=` | consume |
//! | `OPTIONS /topics/...` | CORS preflight |
//! | `GET /raw/...` | static view of the primary data root |
//!
//! Handlers talk to the broker through the [`queue::Queue`] trait so
//! tests can substitute an in-memory queue for the file-backed one.
//! [`ServerBuilder`] assembles the server: each `with_*` option
//! overrides one default, and `build` constructs the file-backed
//! queue when none was injected.

use axum::routing::get;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;

use hearthq_storage::{FileQueue, QueueConfig};

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod queue;

pub use error::ApiError;
pub use metrics::{Metrics, NoOpMetrics, PrometheusMetrics};
pub use queue::{ConsumedBatch, Queue};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn Queue>,
    pub metrics: Arc<dyn Metrics>,
    /// Batch limit applied when a consume request leaves `limit`
    /// unset; non-positive means unlimited.
    pub default_limit: i64,
}

/// Builds a [`Server`] from defaults plus overrides.
///
/// ```ignore
/// let server = ServerBuilder::new()
///     .with_dirs(vec!["/mnt/a/q".into(), "/mnt/b/q".into()])
///     .with_file_entries(1000)
///     .with_default_consume_limit(500)
///     .build()
///     .await?;
/// serve(server.router.clone(), 4353).await?;
/// server.close().await;
/// ```
pub struct ServerBuilder {
    dirs: Vec<PathBuf>,
    file_caching: bool,
    fd_cache_size: usize,
    file_entries: u64,
    default_limit: i64,
    metrics: Arc<dyn Metrics>,
    queue: Option<Arc<dyn Queue>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            dirs: vec![PathBuf::from(".hearthq")],
            file_caching: true,
            fd_cache_size: 128,
            file_entries: 5000,
            default_limit: -1,
            metrics: Arc::new(NoOpMetrics),
            queue: None,
        }
    }

    /// Root directories; every topic is mirrored across all of them.
    pub fn with_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.dirs = dirs;
        self
    }

    /// Enable or disable caching of segment file descriptors.
    pub fn with_file_caching(mut self, enabled: bool) -> Self {
        self.file_caching = enabled;
        self
    }

    /// Maximum number of cached descriptors.
    pub fn with_fd_cache_size(mut self, size: usize) -> Self {
        self.fd_cache_size = size;
        self
    }

    /// Number of message entries per segment file.
    pub fn with_file_entries(mut self, entries: u64) -> Self {
        self.file_entries = entries;
        self
    }

    /// Default batch limit for consumers; non-positive means
    /// unlimited.
    pub fn with_default_consume_limit(mut self, limit: i64) -> Self {
        self.default_limit = if limit > 0 { limit } else { -1 };
        self
    }

    /// Batch-size metrics sink; defaults to the no-op sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Inject a queue instead of constructing the file-backed one.
    pub fn with_queue(mut self, queue: Arc<dyn Queue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Open the queue (unless one was injected) and assemble the
    /// router.
    pub async fn build(self) -> hearthq_core::Result<Server> {
        let queue: Arc<dyn Queue> = match self.queue {
            Some(queue) => queue,
            None => Arc::new(
                FileQueue::open(QueueConfig {
                    roots: self.dirs,
                    entries_per_file: self.file_entries,
                    fd_cache: self.file_caching,
                    fd_cache_size: self.fd_cache_size,
                })
                .await?,
            ),
        };
        let router = create_router(AppState {
            queue: queue.clone(),
            metrics: self.metrics,
            default_limit: self.default_limit,
        });
        Ok(Server { router, queue })
    }
}

/// An assembled server: the router to serve and the queue to close on
/// shutdown.
pub struct Server {
    pub router: Router,
    queue: Arc<dyn Queue>,
}

impl Server {
    /// Flush and release the underlying queue.
    pub async fn close(&self) {
        self.queue.close().await;
    }
}

/// Assemble the router over the given state.
pub fn create_router(state: AppState) -> Router {
    let raw_root = state.queue.root_dir().to_path_buf();
    Router::new()
        .route("/topics", get(handlers::topics::list_topics))
        .route(
            "/topics/*topic",
            axum::routing::put(handlers::topics::create_topic)
                .patch(handlers::topics::modify_topic)
                .delete(handlers::topics::delete_topic)
                .post(handlers::produce::produce)
                .get(handlers::consume::consume)
                .options(handlers::options::preflight),
        )
        .nest_service("/raw", ServeDir::new(raw_root))
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn serve(router: Router, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "hearthq listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutting down");
}
