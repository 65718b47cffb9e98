//! hearthq server binary.
//!
//! ```bash
//! # defaults: port 4353, root .hearthq, 5000 entries per segment
//! hearthq
//!
//! # mirror across two disks, smaller segments, metrics off
//! hearthq --dir /mnt/a/q --dir /mnt/b/q --entries 1000 --prometheus false
//! ```
//!
//! Logging is controlled via `RUST_LOG` (default `info`).

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use hearthq_server::{metrics, serve, Metrics, NoOpMetrics, PrometheusMetrics, ServerBuilder};

/// File-backed message broker over HTTP.
#[derive(Parser, Debug)]
#[command(name = "hearthq", version, about)]
struct Args {
    /// Port to listen on
    #[arg(long = "http", default_value_t = 4353)]
    http: u16,

    /// Enable caching of segment file descriptors
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    cache: bool,

    /// Maximum number of cached descriptors
    #[arg(long, default_value_t = 128)]
    fd_cache_size: usize,

    /// Number of message entries per segment file
    #[arg(long, default_value_t = 5000)]
    entries: u64,

    /// Default batch limit for consumers; non-positive means unlimited
    #[arg(long, default_value_t = -1)]
    limit: i64,

    /// Enable Prometheus metrics
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    prometheus: bool,

    /// Root directory; repeat to mirror topics across several
    #[arg(long = "dir", default_value = ".hearthq")]
    dirs: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let sink: Arc<dyn Metrics> = if args.prometheus {
        metrics::init();
        Arc::new(PrometheusMetrics)
    } else {
        Arc::new(NoOpMetrics)
    };

    let server = ServerBuilder::new()
        .with_dirs(args.dirs)
        .with_file_caching(args.cache)
        .with_fd_cache_size(args.fd_cache_size)
        .with_file_entries(args.entries)
        .with_default_consume_limit(args.limit)
        .with_metrics(sink)
        .build()
        .await?;

    let mut router = server.router.clone();
    if args.prometheus {
        router = router
            .route("/metrics", axum::routing::get(metrics::export))
            .layer(axum::middleware::from_fn(metrics::track_requests));
    }

    serve(router, args.http).await?;

    server.close().await;
    Ok(())
}
