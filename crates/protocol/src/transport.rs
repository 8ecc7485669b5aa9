//! Packet transports the client can run over.

use devfront_core::{Error, Result};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Two packet queues: what the client sends, what the peer sends back.
///
/// Closing `incoming` (all senders dropped) means the connection is gone.
pub struct PacketTransport {
    pub outgoing: mpsc::Sender<Value>,
    pub incoming: mpsc::Receiver<Value>,
    /// Pump tasks owned by this transport, aborted with the client.
    pub(crate) tasks: Vec<JoinHandle<()>>,
}

impl PacketTransport {
    pub fn new(outgoing: mpsc::Sender<Value>, incoming: mpsc::Receiver<Value>) -> Self {
        Self {
            outgoing,
            incoming,
            tasks: Vec::new(),
        }
    }

    /// Two connected in-memory ends.
    pub fn pair(buffer: usize) -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::channel(buffer);
        let (b_tx, b_rx) = mpsc::channel(buffer);
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }

    /// Connect to a debugger server's WebSocket endpoint. Every text frame
    /// carries one JSON packet.
    pub async fn connect_websocket(ws_url: &str, buffer: usize) -> Result<Self> {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::connect_async;
        use tokio_tungstenite::tungstenite::Message;

        let parsed = url::Url::parse(ws_url)
            .map_err(|e| Error::Config(format!("invalid endpoint {}: {}", ws_url, e)))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(Error::Config(format!(
                "endpoint {} must use ws:// or wss://",
                ws_url
            )));
        }

        let (ws_stream, _) = connect_async(parsed.as_str())
            .await
            .map_err(|e| Error::Transport(format!("failed to connect to {}: {}", ws_url, e)))?;
        debug!(endpoint = %ws_url, "websocket connected");

        let (mut ws_sink, mut ws_read) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<Value>(buffer);
        let (in_tx, in_rx) = mpsc::channel::<Value>(buffer);

        let writer = tokio::spawn(async move {
            while let Some(packet) = out_rx.recv().await {
                if let Err(e) = ws_sink.send(Message::Text(packet.to_string())).await {
                    error!("websocket write error: {}", e);
                    break;
                }
            }
            let _ = ws_sink.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(msg) = ws_read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<Value>(&text) {
                        Ok(packet) => {
                            if in_tx.send(packet).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("dropping malformed packet: {}", e),
                    },
                    Ok(Message::Close(_)) => {
                        debug!("websocket closed by server");
                        break;
                    }
                    Err(e) => {
                        warn!("websocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(Self {
            outgoing: out_tx,
            incoming: in_rx,
            tasks: vec![writer, reader],
        })
    }
}
