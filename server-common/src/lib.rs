//! Shared bootstrap for the servers in this workspace.
//!
//! Covers the pieces every binary needs before it can serve a request:
//! listener arguments, logging, port selection and termination signals.

use anyhow::Context;
use pmcp::server::streamable_http_server::{StreamableHttpServer, StreamableHttpServerConfig};
use pmcp::Server;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// First port probed when no port is configured.
pub const DEFAULT_START_PORT: u16 = 3000;

/// Listener arguments shared across all servers.
#[derive(Debug, Clone, clap::Args)]
pub struct CliArgs {
    /// Host to bind to
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind to (auto-selected from 3000 upward when unset)
    #[clap(long, env = "PORT")]
    pub port: Option<u16>,

    /// How many times to restart port selection when the port is taken
    #[clap(long, default_value = "10")]
    pub max_bind_attempts: u32,
}

/// Bind the listening socket.
///
/// An explicit port is tried first. When it is already in use the port is
/// cleared and selection starts over with auto-probing, at most
/// `max_bind_attempts` times in total.
pub async fn bind_listener(args: &CliArgs) -> anyhow::Result<TcpListener> {
    let attempts = args.max_bind_attempts.max(1);
    let mut requested = args.port;

    for attempt in 1..=attempts {
        let Some(port) = requested else {
            return bind_first_available(&args.host, DEFAULT_START_PORT).await;
        };

        match TcpListener::bind((args.host.as_str(), port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                tracing::warn!(port, attempt, "Port in use, trying another port");
                requested = None;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to bind {}:{}", args.host, port))
            }
        }
    }

    anyhow::bail!("Could not bind a listening port after {} attempts", attempts)
}

/// Probe ports sequentially from `start` and keep the first listener that binds.
///
/// Only "address in use" moves on to the next port; any other error is final.
pub async fn bind_first_available(host: &str, start: u16) -> anyhow::Result<TcpListener> {
    for port in start..=u16::MAX {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                tracing::trace!(port, "Port in use")
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to bind {}:{}", host, port)),
        }
    }

    anyhow::bail!("No available ports found")
}

/// Resolves once the process receives SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT. Shutting down gracefully..."),
        _ = terminate => tracing::info!("Received SIGTERM. Shutting down gracefully..."),
    }
}

/// Run an MCP server over Streamable HTTP transport.
///
/// Port selection follows [`bind_listener`]; the chosen address is handed to
/// the transport, which binds it itself.
pub async fn run_http(server: Server, args: &CliArgs) -> anyhow::Result<()> {
    let addr: SocketAddr = {
        let probe = bind_listener(args).await?;
        probe.local_addr()?
    };

    tracing::info!(host = %args.host, port = addr.port(), "Starting MCP HTTP server");

    let server = Arc::new(Mutex::new(server));

    let config = StreamableHttpServerConfig {
        session_id_generator: None,
        enable_json_response: true,
        event_store: None,
        on_session_initialized: None,
        on_session_closed: None,
        http_middleware: None,
    };

    let http_server = StreamableHttpServer::with_config(addr, server, config);
    let (bound_addr, server_handle) = http_server.start().await?;

    tracing::info!("MCP server listening on http://{}/mcp", bound_addr);

    server_handle.await?;

    Ok(())
}

/// Install the global `tracing` subscriber (`RUST_LOG`, default `info`).
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
