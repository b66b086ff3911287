//! WebSocket frame stream from the vessel server.

use anyhow::Result;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use mass_core::StreamFrame;

/// Live stream of per-tick frames and handover broadcasts.
pub struct EventStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl EventStream {
    pub(crate) async fn connect(url: &str) -> Result<Self> {
        let (socket, _) = connect_async(url).await?;
        Ok(Self { socket })
    }

    /// Read the next frame from the stream (returns None on close).
    pub async fn next_frame(&mut self) -> Result<Option<StreamFrame>> {
        while let Some(msg) = self.socket.next().await {
            let msg = msg?;
            match msg {
                Message::Text(text) => {
                    let frame = serde_json::from_str(&text)?;
                    return Ok(Some(frame));
                }
                Message::Binary(data) => {
                    if let Ok(text) = String::from_utf8(data) {
                        if let Ok(frame) = serde_json::from_str(&text) {
                            return Ok(Some(frame));
                        }
                    }
                }
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }
}
