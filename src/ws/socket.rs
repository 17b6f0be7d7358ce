use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::registry::ConnectionId;

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Receive the next message from the client (None if connection closed)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Handler for incoming WebSocket frames
#[async_trait]
pub trait FrameHandler: Send + Sync {
    /// Handle one inbound frame from the client
    async fn handle_frame(&self, connection_id: ConnectionId, frame: String);
}

#[derive(Debug)]
pub enum SocketError {
    SendFailed(String),
    ReceiveFailed(String),
}

#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    /// Yields the next text frame. Binary and ping/pong frames carry no
    /// envelopes and are skipped rather than ending the session.
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        while let Some(frame) = self.next().await {
            match frame {
                Ok(Message::Text(text)) => return Ok(Some(text)),
                Ok(Message::Close(_)) => return Ok(None),
                Ok(_) => continue,
                Err(e) => return Err(SocketError::ReceiveFailed(e.to_string())),
            }
        }
        // Stream exhausted: the peer went away without a close frame.
        Ok(None)
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// One managed client session: pumps outbound frames from the relay to the
/// socket and inbound frames from the socket into the frame handler.
///
/// Inbound frames are handled to completion before the next read, so each
/// connection's events reach the core strictly in order.
pub struct Connection {
    pub connection_id: ConnectionId,
    socket: Box<dyn SocketWrapper>,
    outbound_receiver: mpsc::UnboundedReceiver<String>,
    frame_handler: Arc<dyn FrameHandler>,
}

impl Connection {
    pub fn new(
        connection_id: ConnectionId,
        socket: Box<dyn SocketWrapper>,
        outbound_receiver: mpsc::UnboundedReceiver<String>,
        frame_handler: Arc<dyn FrameHandler>,
    ) -> Self {
        Self {
            connection_id,
            socket,
            outbound_receiver,
            frame_handler,
        }
    }

    /// Run the connection - handles both sending and receiving until disconnect
    pub async fn run(mut self) -> Result<(), SocketError> {
        loop {
            tokio::select! {
                // Outbound frames (relay -> client)
                msg = self.outbound_receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.socket.send_message(message).await?
                        }
                        None => break, // Channel closed, disconnect
                    }
                }

                // Inbound frames (client -> relay)
                msg = self.socket.receive_message() => {
                    match msg {
                        Ok(Some(frame)) => {
                            self.frame_handler
                                .handle_frame(self.connection_id, frame)
                                .await;
                        }
                        Ok(None) => break, // Client disconnected
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        // Clean disconnect
        let _ = self.socket.close().await;
        Ok(())
    }
}
