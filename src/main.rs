mod routers;
mod ws;

use std::{net::SocketAddr, sync::Arc};

use axum::{Router, routing::get};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use yur_place::{
  config::Config,
  consts::{
    DEFAULT_BIND, DEFAULT_HEIGHT, DEFAULT_MAX_PAYLOAD_BYTES,
    DEFAULT_OUTBOUND_QUEUE, DEFAULT_PALETTE_LIMIT, DEFAULT_WIDTH,
  },
  dispatch::Dispatcher,
};

#[derive(Parser)]
#[command(name = "yur-place")]
#[command(author = "yurzhang")]
#[command(about = "A shared pixel canvas over websockets.")]
#[command(version, long_about = None)]
struct Args {
  #[arg(long, env = "CANVAS_WIDTH", default_value_t = DEFAULT_WIDTH)]
  width: u16,
  #[arg(long, env = "CANVAS_HEIGHT", default_value_t = DEFAULT_HEIGHT)]
  height: u16,
  /// Highest accepted palette index, at most 15
  #[arg(long, env = "CANVAS_PALETTE_LIMIT", default_value_t = DEFAULT_PALETTE_LIMIT)]
  palette_limit: u8,
  #[arg(long, env = "CANVAS_MAX_PAYLOAD_BYTES", default_value_t = DEFAULT_MAX_PAYLOAD_BYTES)]
  max_payload_bytes: usize,
  /// Messages a client may fall behind before it is dropped
  #[arg(long, env = "CANVAS_OUTBOUND_QUEUE", default_value_t = DEFAULT_OUTBOUND_QUEUE)]
  outbound_queue: usize,
  #[arg(long, env = "CANVAS_BIND", default_value = DEFAULT_BIND)]
  bind: SocketAddr,
}

pub struct AppState {
  dispatcher: Dispatcher,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
    )
    .init();

  let args = Args::parse();

  let dispatcher = Dispatcher::new(Config {
    width: args.width,
    height: args.height,
    palette_limit: args.palette_limit,
    max_payload_bytes: args.max_payload_bytes,
    outbound_queue: args.outbound_queue,
  })?;

  let config = dispatcher.config();

  tracing::info!(
    width = config.width,
    height = config.height,
    palette_limit = config.palette_limit,
    "Canvas ready.",
  );

  let shared_state = Arc::new(AppState { dispatcher });

  let app = Router::new()
    .route("/", get(|| async { "Just paint freely!" }))
    .route("/info", get(routers::info))
    .route("/ws", get(ws::ws))
    .with_state(shared_state);

  tracing::info!("Listening on {}...", args.bind);

  axum::Server::try_bind(&args.bind)?
    .serve(app.into_make_service())
    .with_graceful_shutdown(shutdown())
    .await?;

  Ok(())
}

async fn shutdown() {
  if let Err(err) = tokio::signal::ctrl_c().await {
    tracing::error!("Error waiting for Ctrl-C: {err}");
    std::future::pending::<()>().await;
  }

  tracing::info!("Shutting down...");
}
