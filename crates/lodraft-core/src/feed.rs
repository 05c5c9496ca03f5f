// WebSocket feed for the game-client bridge: table changes, clock and roster
// frames come in, outbound requests go back out on the same connection.

use futures_util::stream::Stream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::protocol::{FeedFrame, OutboundRequest};

/// Events emitted by the feed server to the application layer.
#[derive(Debug, PartialEq)]
pub enum FeedEvent {
    /// A bridge has connected.
    Connected { addr: String },
    /// The current bridge has disconnected.
    Disconnected,
    /// A decoded frame from the bridge.
    Frame(FeedFrame),
}

/// Run the feed server on `127.0.0.1:{port}`, forwarding decoded frames
/// through `tx` and writing every request received on `out_rx` to the
/// connected bridge.
///
/// Accepts one connection at a time and runs until the task is cancelled or
/// the event receiver is dropped. Requests produced while no bridge is
/// connected are dropped with a warning.
pub async fn run(
    port: u16,
    tx: mpsc::Sender<FeedEvent>,
    mut out_rx: mpsc::Receiver<OutboundRequest>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let local_addr = listener.local_addr()?;
    info!("Feed server listening on {local_addr}");

    loop {
        let (stream, addr) = tokio::select! {
            accepted = listener.accept() => accepted?,
            request = out_rx.recv() => {
                match request {
                    Some(request) => {
                        warn!("No bridge connected, dropping request {request:?}");
                        continue;
                    }
                    None => break,
                }
            }
        };
        let addr_str = addr.to_string();
        info!("Accepted TCP connection from {addr_str}");

        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!("WebSocket handshake failed for {addr_str}: {e}");
                continue;
            }
        };

        if tx
            .send(FeedEvent::Connected {
                addr: addr_str.clone(),
            })
            .await
            .is_err()
        {
            break;
        }

        let (mut write, mut read) = ws_stream.split();
        let mut channel_closed = false;
        loop {
            tokio::select! {
                msg = read.next() => {
                    let Some(msg) = msg else { break };
                    match forward_message(msg, &tx, &addr_str).await {
                        Flow::Continue => {}
                        Flow::Stop => break,
                        Flow::ChannelClosed => {
                            channel_closed = true;
                            break;
                        }
                    }
                }
                request = out_rx.recv() => {
                    let Some(request) = request else {
                        channel_closed = true;
                        break;
                    };
                    match serde_json::to_string(&request) {
                        Ok(json) => {
                            if let Err(e) = write.send(Message::Text(json.into())).await {
                                warn!("Failed to send request to {addr_str}: {e}");
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to encode request {request:?}: {e}"),
                    }
                }
            }
        }

        if channel_closed || tx.send(FeedEvent::Disconnected).await.is_err() {
            break;
        }
    }

    Ok(())
}

enum Flow {
    Continue,
    Stop,
    ChannelClosed,
}

async fn forward_message(
    msg: Result<Message, tokio_tungstenite::tungstenite::Error>,
    tx: &mpsc::Sender<FeedEvent>,
    addr: &str,
) -> Flow {
    match msg {
        Ok(Message::Text(text)) => match parse_frame(&text) {
            Some(frame) => {
                if tx.send(FeedEvent::Frame(frame)).await.is_err() {
                    Flow::ChannelClosed
                } else {
                    Flow::Continue
                }
            }
            None => Flow::Continue,
        },
        Ok(Message::Close(_)) => {
            info!("Bridge {addr} sent close frame");
            Flow::Stop
        }
        Err(e) => {
            warn!("WebSocket error from {addr}: {e}");
            Flow::Stop
        }
        // Binary, Ping, Pong and raw frames carry nothing for us.
        Ok(_) => Flow::Continue,
    }
}

/// Decode one text frame, logging and discarding anything malformed.
pub fn parse_frame(text: &str) -> Option<FeedFrame> {
    match serde_json::from_str::<FeedFrame>(text) {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!("Discarding malformed feed frame: {e}");
            debug!("Malformed frame body: {text}");
            None
        }
    }
}

/// Process raw WebSocket [`Message`] items from any [`Stream`], forwarding
/// decoded frames through `tx`. Pure logic with no I/O; the primary
/// unit-test target. Returns `Err(())` if the receiver was dropped.
pub async fn process_message_stream<St>(
    mut stream: St,
    tx: &mpsc::Sender<FeedEvent>,
    addr: &str,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg) = stream.next().await {
        match forward_message(msg, tx, addr).await {
            Flow::Continue => {}
            Flow::Stop => break,
            Flow::ChannelClosed => return Err(()),
        }
    }
    Ok(())
}
