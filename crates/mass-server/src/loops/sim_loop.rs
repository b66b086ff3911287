//! The periodic simulation tick loop.
//!
//! Owns the [`VesselSim`] aggregate outright. Inbound messages are drained
//! from the queue only at tick boundaries, never mid-integration, so the
//! kinematics step always sees a fully-applied vessel/authority state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mass_core::{InboundMessage, StreamFrame, TickReport, TrackSnapshot, VesselSim};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::interval;

/// The plot snapshot is refreshed on every Nth tick; plotting consumers
/// poll at a much lower rate than the tick frequency.
const TRACK_REFRESH_TICKS: u64 = 25;

#[allow(clippy::too_many_arguments)]
pub async fn run_sim_loop(
    mut sim: VesselSim,
    mut inbound: mpsc::Receiver<InboundMessage>,
    frames: broadcast::Sender<StreamFrame>,
    report_tx: watch::Sender<Arc<TickReport>>,
    track_tx: watch::Sender<Arc<TrackSnapshot>>,
    tick_hz: f64,
    mut shutdown: broadcast::Receiver<()>,
) {
    // Fixed integration step: wall-clock jitter does not leak into the
    // dynamics.
    let dt_secs = 1.0 / tick_hz;
    let mut ticker = interval(Duration::from_secs_f64(dt_secs));
    let mut tick_count: u64 = 0;

    tracing::info!(tick_hz, "simulation loop started");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("simulation loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let now = Utc::now();

                // Drain the queue at the tick boundary only.
                while let Ok(message) = inbound.try_recv() {
                    for event in sim.apply_message(message, now) {
                        let _ = frames.send(StreamFrame::Broadcast(event));
                    }
                }

                let report = sim.tick(dt_secs, now);

                for event in &report.events {
                    let _ = frames.send(StreamFrame::Broadcast(event.clone()));
                }
                let _ = frames.send(StreamFrame::NavStatus(report.nav.clone()));
                let _ = frames.send(StreamFrame::RemoteStatus {
                    text: report.status_text.clone(),
                    timestamp: now,
                });
                report_tx.send_replace(Arc::new(report));

                tick_count += 1;
                if tick_count % TRACK_REFRESH_TICKS == 0 {
                    track_tx.send_replace(Arc::new(sim.track_snapshot()));
                }
            }
        }
    }
}
