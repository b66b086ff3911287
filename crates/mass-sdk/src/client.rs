//! HTTP client for the vessel server.

use anyhow::Result;
use reqwest::Url;
use serde_json::json;

use mass_core::{GateSnapshot, OperationalState, TickReport, TrackSnapshot};

use crate::stream::EventStream;

/// Client for one ROC (or the legacy ship controller) talking to the
/// vessel server.
pub struct RocClient {
    base_url: String,
    /// `None` sends legacy commands, which act as the current priority ROC
    roc_id: Option<String>,
    client: reqwest::Client,
}

impl RocClient {
    /// Create a client for a specific ROC.
    pub fn new(base_url: impl Into<String>, roc_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            roc_id: Some(roc_id.into()),
            client: reqwest::Client::new(),
        }
    }

    /// Create a legacy (non-ROC-qualified) controller client.
    pub fn legacy(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            roc_id: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn roc_id(&self) -> Option<&str> {
        self.roc_id.as_deref()
    }

    /// Command a new course over ground, degrees.
    pub async fn send_cog(&self, value: f64) -> Result<()> {
        self.send_control("cog", json!({ "value": value })).await
    }

    /// Command a new speed over ground, knots.
    pub async fn send_sog(&self, value: f64) -> Result<()> {
        self.send_control("sog", json!({ "value": value })).await
    }

    /// Command the operational state (`go` / `no-go`).
    pub async fn send_state(&self, state: OperationalState) -> Result<()> {
        self.send_control("state", json!({ "value": state })).await
    }

    /// Toggle a safety gate using the legacy `"<gate_id> <0|1>"` payload.
    pub async fn send_gate_status(&self, gate_id: u32, active: bool) -> Result<()> {
        let payload = format!("{} {}", gate_id, if active { 1 } else { 0 });
        self.send_control("gate-status", json!({ "value": payload }))
            .await
    }

    /// Announce readiness to relinquish command authority.
    pub async fn relinquish(&self, gate_id: Option<u32>) -> Result<()> {
        self.send_handover("relinquish", gate_id).await
    }

    /// Ask to assume command authority.
    pub async fn takeover(&self, gate_id: Option<u32>) -> Result<()> {
        self.send_handover("takeover", gate_id).await
    }

    /// Latest tick report from the server.
    pub async fn vessel(&self) -> Result<TickReport> {
        let url = format!("{}/v1/vessel", self.base_url);
        let report = self.client.get(&url).send().await?.json().await?;
        Ok(report)
    }

    /// Gate list with the timing computed on the latest tick.
    pub async fn gates(&self) -> Result<Vec<GateSnapshot>> {
        let url = format!("{}/v1/gates", self.base_url);
        let gates = self.client.get(&url).send().await?.json().await?;
        Ok(gates)
    }

    /// Read-only plotting snapshot.
    pub async fn track(&self) -> Result<TrackSnapshot> {
        let url = format!("{}/v1/track", self.base_url);
        let track = self.client.get(&url).send().await?.json().await?;
        Ok(track)
    }

    /// Connect to the frame stream WebSocket.
    pub async fn connect_stream(&self) -> Result<EventStream> {
        let url = build_ws_url(&self.base_url, "/v1/stream")?;
        EventStream::connect(url.as_str()).await
    }

    async fn send_control(&self, field: &str, body: serde_json::Value) -> Result<()> {
        let url = match &self.roc_id {
            Some(roc_id) => format!("{}/v1/control/roc/{}/{}", self.base_url, roc_id, field),
            None => format!("{}/v1/control/{}", self.base_url, field),
        };

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Failed to send {} command: {}", field, response.status());
        }
        tracing::debug!(field, roc = ?self.roc_id, "command sent");
        Ok(())
    }

    async fn send_handover(&self, step: &str, gate_id: Option<u32>) -> Result<()> {
        let roc_id = self
            .roc_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Handover requires a ROC identity"))?;

        let url = format!("{}/v1/handover/{}", self.base_url, step);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "roc_id": roc_id, "gate_id": gate_id }))
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("Failed to send {}: {}", step, response.status());
        }
        Ok(())
    }
}

fn build_ws_url(base: &str, path: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => other,
    }
    .to_string();

    url.set_scheme(&scheme)
        .map_err(|_| anyhow::anyhow!("Invalid base URL scheme"))?;
    url.set_path(path);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_swaps_scheme() {
        let url = build_ws_url("http://localhost:3000", "/v1/stream").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:3000/v1/stream");

        let url = build_ws_url("https://vessel.example", "/v1/stream").unwrap();
        assert_eq!(url.as_str(), "wss://vessel.example/v1/stream");
    }
}
