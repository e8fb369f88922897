//! Swagger Explorer server binary.
//!
//! Provides two subcommands:
//! - `serve` (default): HTTP API with `/health`, `{base}/api/explore` and
//!   `{base}/api/response-schemas`
//! - `mcp`: the same operations as MCP tools over Streamable HTTP

use anyhow::Context;
use clap::{Parser, Subcommand};
use mcp_swagger_core::api::{self, ApiConfig};
use mcp_swagger_core::browser::{BrowserManager, BrowserManagerConfig};
use mcp_swagger_core::discovery::DiscoveryConfig;
use mcp_swagger_core::Explorer;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "swagger-server", about = "Swagger/OpenAPI Explorer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API (default when no subcommand given)
    Serve(ServeArgs),

    /// Expose the explorer as MCP tools over Streamable HTTP
    Mcp(McpArgs),
}

#[derive(Parser)]
struct ServeArgs {
    #[clap(flatten)]
    server: server_common::CliArgs,

    #[clap(flatten)]
    browser: BrowserArgs,

    /// Prefix inserted before the /api routes
    #[clap(long, env = "BASE_URL", default_value = "")]
    base_url: String,

    /// Require `Authorization: Bearer <token>` on every route except /health
    #[clap(long, env = "AUTH_TOKEN")]
    auth_token: Option<String>,
}

#[derive(Parser)]
struct McpArgs {
    #[clap(flatten)]
    server: server_common::CliArgs,

    #[clap(flatten)]
    browser: BrowserArgs,
}

#[derive(Debug, Clone, clap::Args)]
struct BrowserArgs {
    /// Custom Chrome/Chromium binary path
    #[clap(long, env = "CHROME_PATH")]
    browser_path: Option<String>,

    /// Connect to already-running browser via CDP URL
    #[clap(long, env = "CDP_URL")]
    cdp_url: Option<String>,

    /// Run browser in headless mode
    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    headless: bool,

    /// How long to wait for a spec response after the page settles
    #[clap(long, env = "SPEC_NETWORK_TIMEOUT_MS", default_value = "5000")]
    network_timeout_ms: u64,

    /// Upper bound for loading the documentation page
    #[clap(long, env = "NAVIGATION_TIMEOUT_MS", default_value = "30000")]
    navigation_timeout_ms: u64,
}

impl BrowserArgs {
    fn manager_config(&self) -> BrowserManagerConfig {
        BrowserManagerConfig {
            browser_path: self.browser_path.clone(),
            cdp_url: self.cdp_url.clone(),
            headless: self.headless,
            window_size: (1280, 720),
        }
    }

    fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            network_timeout: Duration::from_millis(self.network_timeout_ms),
            navigation_timeout: Duration::from_millis(self.navigation_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    server_common::init_logging();

    match cli.command {
        None => run_serve(ServeArgs::parse_from(["swagger-server"])).await,
        Some(Command::Serve(args)) => run_serve(args).await,
        Some(Command::Mcp(args)) => run_mcp(args).await,
    }
}

async fn launch_browser(
    args: &BrowserArgs,
) -> anyhow::Result<(Arc<BrowserManager>, Arc<Explorer>)> {
    let manager = Arc::new(
        BrowserManager::launch(args.manager_config())
            .await
            .context("Failed to start browser")?,
    );
    let explorer = Arc::new(Explorer::new(manager.clone(), args.discovery_config()));
    Ok((manager, explorer))
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let (manager, explorer) = launch_browser(&args.browser).await?;

    let listener = match server_common::bind_listener(&args.server).await {
        Ok(listener) => listener,
        Err(e) => {
            manager.shutdown().await;
            return Err(e);
        }
    };
    let port = listener.local_addr()?.port();

    let base_path = api::normalize_base_path(&args.base_url);
    let auth_enabled = args.auth_token.as_deref().is_some_and(|t| !t.is_empty());

    let app = api::create_router(
        explorer,
        ApiConfig {
            base_path: base_path.clone(),
            auth_token: args.auth_token,
        },
    );

    tracing::info!(host = %args.server.host, port, "Swagger Explorer running on port {}", port);
    if !base_path.is_empty() {
        tracing::info!(base_url = %base_path, "Base URL: {}", base_path);
    }
    if auth_enabled {
        tracing::info!("Authentication enabled");
    }

    // Browser first, then the listening socket.
    let on_signal = {
        let manager = manager.clone();
        async move {
            server_common::shutdown_signal().await;
            manager.shutdown().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(on_signal)
        .await
        .context("HTTP server failed")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn run_mcp(args: McpArgs) -> anyhow::Result<()> {
    let (manager, explorer) = launch_browser(&args.browser).await?;
    let server = mcp_swagger_core::build_server(explorer)?;

    let result = tokio::select! {
        result = server_common::run_http(server, &args.server) => result,
        _ = server_common::shutdown_signal() => Ok(()),
    };

    manager.shutdown().await;
    result
}
