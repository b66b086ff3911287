//! Legacy ship controller CLI.
//!
//! Sends non-ROC-qualified commands; the server tags them with the
//! current priority ROC.

use clap::{Parser, Subcommand};
use mass_core::OperationalState;
use mass_sdk::RocClient;

/// Ship controller using legacy command topics
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Vessel server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: ShipCommand,
}

#[derive(Subcommand, Debug)]
enum ShipCommand {
    /// Resume making way
    Go,
    /// Order the vessel to stop
    NoGo,
    /// Command speed over ground in knots
    Sog { value: f64 },
    /// Command course over ground in degrees
    Cog { value: f64 },
    /// Toggle a safety gate: `shipctl gate 1 0` deactivates gate 1
    Gate { id: u32, state: u8 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = RocClient::legacy(&args.url);

    match args.command {
        ShipCommand::Go => {
            client.send_state(OperationalState::Go).await?;
            println!("Sent state: go");
        }
        ShipCommand::NoGo => {
            client.send_state(OperationalState::NoGo).await?;
            println!("Sent state: no-go");
        }
        ShipCommand::Sog { value } => {
            client.send_sog(value).await?;
            println!("Sent SOG: {value} knots");
        }
        ShipCommand::Cog { value } => {
            client.send_cog(value).await?;
            println!("Sent COG: {value} degrees");
        }
        ShipCommand::Gate { id, state } => {
            let active = match state {
                0 => false,
                1 => true,
                other => anyhow::bail!("Gate state must be 0 or 1, got {other}"),
            };
            client.send_gate_status(id, active).await?;
            println!("Sent gate {id} {}", if active { "activate" } else { "deactivate" });
        }
    }

    Ok(())
}
