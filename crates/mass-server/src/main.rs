//! MASS vessel server - simulates a remotely-supervised autonomous vessel
//! and arbitrates ROC command authority over REST + WebSocket.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::routing::get;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mass_core::VesselSim;
use mass_server::config::Config;
use mass_server::state::{AppState, FRAME_CHANNEL_CAPACITY, INBOUND_QUEUE_CAPACITY};
use mass_server::{api, loops};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mass_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting MASS vessel server...");

    let config = Config::from_env();
    let scenario = config.load_scenario()?;
    // Configuration errors are fatal: the simulation must not start.
    let sim = VesselSim::new(scenario)?;

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
    let (frames_tx, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
    let (report_tx, report_rx) = watch::channel(Arc::new(sim.initial_report(Utc::now())));
    let (track_tx, track_rx) = watch::channel(Arc::new(sim.track_snapshot()));
    let (shutdown_tx, _) = broadcast::channel(1);

    tokio::spawn(loops::sim_loop::run_sim_loop(
        sim,
        inbound_rx,
        frames_tx.clone(),
        report_tx,
        track_tx,
        config.tick_hz,
        shutdown_tx.subscribe(),
    ));

    let state = Arc::new(AppState::new(inbound_tx, frames_tx, report_rx, track_rx));

    // Build the app
    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/stream", get(api::ws::ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(());
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
