//! Live telemetry monitor.
//!
//! Subscribes to the vessel frame stream and prints navigation state,
//! remote status lines and handover broadcasts as they arrive.

use clap::Parser;
use mass_core::{StreamFrame, VesselEvent};
use mass_sdk::RocClient;

/// Watch the vessel frame stream
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Vessel server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Only print status lines and broadcasts, not per-tick nav frames
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Connecting to vessel server at {}...", args.url);
    let client = RocClient::legacy(&args.url);
    let mut stream = client.connect_stream().await?;
    println!("Connected. Watching frames.\n");

    while let Some(frame) = stream.next_frame().await? {
        match frame {
            StreamFrame::NavStatus(nav) => {
                if args.quiet {
                    continue;
                }
                println!(
                    "[NAV] {} ({:.6}, {:.6}) COG={:.1} SOG={:.2} state={} priority={}",
                    nav.name,
                    nav.lat,
                    nav.lon,
                    nav.cog_deg,
                    nav.sog_knots,
                    nav.state,
                    nav.priority_roc,
                );
            }
            StreamFrame::RemoteStatus { text, .. } => {
                println!("[STATUS] {text}");
            }
            StreamFrame::Broadcast(event) => match event {
                VesselEvent::ReadyForHandover {
                    gate_id,
                    time_to_gate_secs,
                    current_roc,
                    ..
                } => println!(
                    "[HANDOVER] READY_FOR_HANDOVER gate={gate_id} time_to_gate={time_to_gate_secs:.1}s current_roc={current_roc}"
                ),
                VesselEvent::HandoverCompleted {
                    gate_id,
                    new_priority,
                    ..
                } => println!(
                    "[HANDOVER] HANDOVER_COMPLETED gate={gate_id} new_priority={new_priority}"
                ),
                VesselEvent::HandoverAborted { gate_id, reason, .. } => {
                    println!("[HANDOVER] aborted gate={gate_id} reason={reason}")
                }
                VesselEvent::CommandRejected { roc_id, field, reason, .. } => {
                    println!("[REJECTED] {field} from {roc_id}: {reason}")
                }
            },
        }
    }

    println!("Stream closed.");
    Ok(())
}
