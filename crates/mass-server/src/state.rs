//! Shared handles between the HTTP layer and the simulation loop.
//!
//! The simulation state itself is owned exclusively by the tick loop; the
//! API only holds the inbound queue sender and read-side channels.

use std::sync::Arc;

use mass_core::{InboundMessage, StreamFrame, TickReport, TrackSnapshot};
use tokio::sync::{broadcast, mpsc, watch};

/// Capacity of the inbound message queue (the sole cross-thread boundary
/// into the tick loop).
pub const INBOUND_QUEUE_CAPACITY: usize = 256;

/// Capacity of the outbound frame fan-out; lagging subscribers drop frames.
pub const FRAME_CHANNEL_CAPACITY: usize = 1024;

pub struct AppState {
    inbound: mpsc::Sender<InboundMessage>,
    frames: broadcast::Sender<StreamFrame>,
    report: watch::Receiver<Arc<TickReport>>,
    track: watch::Receiver<Arc<TrackSnapshot>>,
}

impl AppState {
    pub fn new(
        inbound: mpsc::Sender<InboundMessage>,
        frames: broadcast::Sender<StreamFrame>,
        report: watch::Receiver<Arc<TickReport>>,
        track: watch::Receiver<Arc<TrackSnapshot>>,
    ) -> Self {
        Self {
            inbound,
            frames,
            report,
            track,
        }
    }

    /// Queue a message for the next tick boundary. `false` when the queue
    /// is full (the caller reports backpressure, the core never blocks).
    pub fn enqueue(&self, message: InboundMessage) -> bool {
        match self.inbound.try_send(message) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "inbound queue full, dropping message");
                false
            }
        }
    }

    pub fn subscribe_frames(&self) -> broadcast::Receiver<StreamFrame> {
        self.frames.subscribe()
    }

    /// Latest tick report.
    pub fn report(&self) -> Arc<TickReport> {
        self.report.borrow().clone()
    }

    /// Latest plotting snapshot.
    pub fn track(&self) -> Arc<TrackSnapshot> {
        self.track.borrow().clone()
    }
}
