//! Per-ROC CLI controller for the vessel server.
//!
//! Sends ROC-qualified control commands and the relinquish/takeover
//! messages used during a gate handover.

use clap::{Parser, Subcommand};
use mass_core::OperationalState;
use mass_sdk::RocClient;

/// Remote Operating Center controller
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Vessel server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// ROC identity to send as
    #[arg(long, default_value = "ROC_1")]
    roc_id: String,

    #[command(subcommand)]
    command: RocCommand,
}

#[derive(Subcommand, Debug)]
enum RocCommand {
    /// Command a course over ground in degrees
    Cog { value: f64 },
    /// Command a speed over ground in knots
    Sog { value: f64 },
    /// Set the operational state (go / no-go)
    State { value: String },
    /// Announce readiness to relinquish command authority
    Relinquish {
        /// Gate the handover belongs to
        #[arg(long)]
        gate: Option<u32>,
    },
    /// Ask to assume command authority
    Takeover {
        /// Gate the handover belongs to
        #[arg(long)]
        gate: Option<u32>,
    },
    /// Print the current vessel snapshot
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = RocClient::new(&args.url, &args.roc_id);

    match args.command {
        RocCommand::Cog { value } => {
            client.send_cog(value).await?;
            println!("[{}] Sent COG={}", args.roc_id, value);
        }
        RocCommand::Sog { value } => {
            client.send_sog(value).await?;
            println!("[{}] Sent SOG={}", args.roc_id, value);
        }
        RocCommand::State { value } => {
            let state = match value.as_str() {
                "go" => OperationalState::Go,
                "no-go" => OperationalState::NoGo,
                other => anyhow::bail!("State must be 'go' or 'no-go', got '{other}'"),
            };
            client.send_state(state).await?;
            println!("[{}] Sent state={}", args.roc_id, state);
        }
        RocCommand::Relinquish { gate } => {
            client.relinquish(gate).await?;
            println!("[{}] Sent relinquish", args.roc_id);
        }
        RocCommand::Takeover { gate } => {
            client.takeover(gate).await?;
            println!("[{}] Sent takeover", args.roc_id);
        }
        RocCommand::Status => {
            let report = client.vessel().await?;
            println!(
                "{}: ({:.6}, {:.6}) COG={:.2} SOG={:.2} state={} priority={}",
                report.nav.name,
                report.nav.lat,
                report.nav.lon,
                report.nav.cog_deg,
                report.nav.sog_knots,
                report.nav.state,
                report.nav.priority_roc,
            );
            println!("{}", report.status_text);
            for gate in report.gates {
                println!(
                    "  Gate {}: active={} inside={} time_to_gate={}",
                    gate.gate_id,
                    gate.active,
                    gate.inside,
                    gate.time_to_gate_secs
                        .map(|t| format!("{t:.1}s"))
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }
    }

    Ok(())
}
