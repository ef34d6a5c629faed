//! Per-connection handler: assign an id, then turn frames into events.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use roulette_common::UserId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::commands::InboundEvent;
use crate::dispatch::Dispatcher;
use crate::protocol::{ClientFrame, ServerFrame};
use crate::registry::ConnectionRegistry;

/// Handle a single WebSocket connection.
pub async fn handle_connection(
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    addr: SocketAddr,
    dispatcher: Dispatcher<ConnectionRegistry>,
    registry: ConnectionRegistry,
    outbound_buffer: usize,
) {
    let (mut sink, mut stream) = ws.split();
    let user = UserId::generate();

    // 1. Register our outbound channel so notices can reach us.
    let (tx, mut rx) = mpsc::channel::<String>(outbound_buffer);
    registry.register(user.clone(), tx).await;

    tracing::info!(peer = %addr, user_id = %user, "Client connected");

    // 2. Tell the client who it is.
    let welcome = ServerFrame::Welcome {
        user_id: user.to_string(),
    }
    .to_json();
    if sink.send(Message::Text(welcome.into())).await.is_err() {
        registry.unregister(&user).await;
        return;
    }

    // 3. Event loop. Outbound frames come from the registry channel,
    //    inbound frames are dispatched as independent events.
    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                if sink.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }

            frame = stream.next() => {
                let event = match frame {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientFrame>(&text) {
                        Ok(frame) => InboundEvent::from(frame),
                        Err(e) => {
                            tracing::debug!(peer = %addr, error = %e, "Invalid client frame");
                            InboundEvent::Malformed
                        }
                    },
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!(peer = %addr, "Unexpected binary frame");
                        InboundEvent::Malformed
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                        continue;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => continue,
                };

                in_flight.retain(|handle| !handle.is_finished());
                in_flight.push(dispatcher.dispatch(user.clone(), event));
            }
        }
    }

    // 4. Cleanup. Stop accepting outbound frames, let pending events
    //    finish, then leave the pool or chat so nothing that ran late can
    //    strand us there.
    tracing::info!(peer = %addr, user_id = %user, "Client disconnected");

    registry.unregister(&user).await;
    drop(rx);
    for handle in in_flight {
        let _ = handle.await;
    }
    dispatcher.orchestrator().disconnect(&user).await;
}
