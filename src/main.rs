//! Envoy ext_proc inspector (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────────┐
//!                         │                  EXT_PROC INSPECTOR                  │
//!                         │                                                      │
//!   Envoy ext_proc filter │  ┌─────────┐   ┌──────────┐   ┌───────────────────┐  │
//!   ── Process stream ────┼─▶│   net   │──▶│   grpc   │──▶│ processor/session │  │
//!                         │  │listener │   │  server  │   │  (one per stream) │  │
//!                         │  └─────────┘   └──────────┘   └─────────┬─────────┘  │
//!                         │                                         ▼            │
//!                         │                               ┌───────────────────┐  │
//!                         │                               │ dispatch by phase │  │
//!                         │                               └──┬─────────────┬──┘  │
//!                         │                                  ▼             ▼     │
//!                         │                           ┌──────────┐  ┌──────────┐ │
//!   ◀── one reply/event ──┼───────────────────────────│ headers  │  │   body   │ │
//!                         │                           └──────────┘  └──────────┘ │
//!                         │                                                      │
//!                         │  config · lifecycle · observability · health         │
//!                         └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use ext_proc_inspector::config::Cli;
use ext_proc_inspector::grpc::GrpcServer;
use ext_proc_inspector::lifecycle::{self, Shutdown};
use ext_proc_inspector::net;
use ext_proc_inspector::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init(&config.observability)?;

    tracing::info!("ext-proc-inspector v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        port = %config.listener.port,
        max_concurrent_streams = config.listener.max_concurrent_streams,
        grace_period_ms = config.shutdown.grace_period_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = net::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let grace = config.shutdown.grace_period();
    let server = GrpcServer::new(config);
    let tracker = server.tracker();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            result??;
            return Ok(());
        }
        signal = lifecycle::wait_for_shutdown_signal() => {
            let signal = signal?;
            tracing::info!(
                signal = %signal,
                grace_ms = lifecycle::grace_millis(grace),
                "Caught signal, waiting for in-flight streams"
            );
            shutdown.trigger();
        }
    }

    lifecycle::drain(server_task, &tracker, grace).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
