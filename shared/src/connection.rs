//! One live socket and its read/write loops.
//!
//! A connection runs two tasks on the tokio executor: a reader that repeats
//! the header-body cycle and pushes every completed message onto the shared
//! incoming queue, and a writer that drains the per-connection outbound
//! channel. The single writer task guarantees at-most-one in-flight write
//! and preserves per-connection send order; same-connection operations never
//! overlap because each loop is one task.

use crate::protocol::{Message, OwnedMessage};
use crate::queue::MessageQueue;
use crate::wire::{read_message, write_message};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};

/// Owner id used on the client side, which only ever receives from one peer.
/// Server-assigned connection ids start at 1.
pub const NO_OWNER: u32 = 0;

/// Which end of the session this connection belongs to. The role decides how
/// inbound messages are attributed on the incoming queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    Client,
    Server,
}

/// Handle to a live connection. Dropping the handle tears down both I/O
/// tasks, so a connection removed from its registry cannot linger and fail
/// repeatedly.
pub struct Connection {
    id: u32,
    role: ConnectionRole,
    outbound: mpsc::UnboundedSender<Message>,
    shutdown: watch::Sender<bool>,
    connected: Arc<AtomicBool>,
}

impl Connection {
    /// Wraps an established socket and starts the read and write loops.
    /// Server connections carry their registry-assigned id; clients pass
    /// [`NO_OWNER`].
    pub fn spawn(
        stream: TcpStream,
        id: u32,
        role: ConnectionRole,
        incoming: Arc<MessageQueue<OwnedMessage>>,
    ) -> Self {
        let (read_half, write_half) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let connected = Arc::new(AtomicBool::new(true));

        let owner_id = match role {
            ConnectionRole::Server => id,
            ConnectionRole::Client => NO_OWNER,
        };

        tokio::spawn(read_loop(
            read_half,
            owner_id,
            incoming,
            shutdown_rx.clone(),
            Arc::clone(&connected),
        ));
        tokio::spawn(write_loop(
            write_half,
            id,
            outbound_rx,
            shutdown_rx,
            Arc::clone(&connected),
        ));

        Connection {
            id,
            role,
            outbound: outbound_tx,
            shutdown: shutdown_tx,
            connected,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn role(&self) -> ConnectionRole {
        self.role
    }

    /// Queues a message for sending. Returns false if the connection has
    /// already closed; messages still queued when it does close are dropped.
    pub fn write(&self, msg: Message) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.outbound.send(msg).is_ok()
    }

    /// Schedules closure on the connection's own tasks instead of closing
    /// the socket out from under an in-flight read or write.
    pub fn disconnect(&self) {
        info!("Disconnecting connection {}", self.id);
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.shutdown.send(true);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

async fn read_loop(
    mut reader: tokio::net::tcp::OwnedReadHalf,
    owner_id: u32,
    incoming: Arc<MessageQueue<OwnedMessage>>,
    mut shutdown: watch::Receiver<bool>,
    connected: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            result = read_message(&mut reader) => match result {
                Ok(message) => {
                    incoming.push(OwnedMessage { owner_id, message });
                }
                Err(e) => {
                    debug!("Read failed on connection {}: {}", owner_id, e);
                    break;
                }
            },
            _ = shutdown.changed() => break,
        }
    }
    connected.store(false, Ordering::SeqCst);
}

async fn write_loop(
    mut writer: tokio::net::tcp::OwnedWriteHalf,
    id: u32,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    mut shutdown: watch::Receiver<bool>,
    connected: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            maybe_msg = outbound.recv() => match maybe_msg {
                Some(msg) => {
                    if let Err(e) = write_message(&mut writer, &msg).await {
                        warn!("Write failed on connection {}: {}", id, e);
                        break;
                    }
                }
                None => break,
            },
            _ = shutdown.changed() => {
                let _ = writer.shutdown().await;
                break;
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
}
