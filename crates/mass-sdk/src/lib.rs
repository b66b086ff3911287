//! SDK for ROC-side controllers: send control commands and handover
//! messages to the vessel server and consume its frame stream.

mod client;
mod stream;

pub use client::RocClient;
pub use stream::EventStream;
