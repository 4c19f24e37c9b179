//! Session registry: the set of live connections, keyed by stable id.
//!
//! The registry owns every server-side [`Connection`], assigns sequential
//! ids and feeds all of them into one shared incoming queue. It knows
//! nothing about game semantics; only socket liveness and identity. Its id
//! set is the source of truth the simulation roster converges toward.

use log::{info, warn};
use shared::{Connection, ConnectionRole, Message, MessageQueue, OwnedMessage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

struct RegistryInner {
    connections: HashMap<u32, Connection>,
    next_id: u32,
}

pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
    incoming: Arc<MessageQueue<OwnedMessage>>,
}

impl SessionRegistry {
    pub fn new(incoming: Arc<MessageQueue<OwnedMessage>>) -> Self {
        SessionRegistry {
            inner: Mutex::new(RegistryInner {
                connections: HashMap::new(),
                // Id 0 is the client-side "no owner" sentinel.
                next_id: 1,
            }),
            incoming,
        }
    }

    /// Perpetually accepts sockets and admits them. Accepting is never
    /// blocked by per-connection work; the connection's own tasks take over
    /// as soon as it is registered.
    pub async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let id = self.register(stream);
                    info!("Client connected from {} with id {}", peer, id);
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    /// Wraps an accepted socket into a connection and assigns the next
    /// sequential id. Must run inside the tokio runtime.
    pub fn register(&self, stream: TcpStream) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;

        let connection = Connection::spawn(
            stream,
            id,
            ConnectionRole::Server,
            Arc::clone(&self.incoming),
        );
        inner.connections.insert(id, connection);
        id
    }

    /// Reaps connections already observed dead, then returns the live id
    /// set, sorted.
    pub fn connection_ids(&self) -> Vec<u32> {
        let mut inner = self.inner.lock().unwrap();
        inner.connections.retain(|id, conn| {
            if conn.is_connected() {
                true
            } else {
                info!("Reaping dead connection {}", id);
                false
            }
        });
        let mut ids: Vec<u32> = inner.connections.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Writes `msg` to every live connection. Connections found closed
    /// during the sweep are collected and removed after it.
    pub fn broadcast(&self, msg: &Message) {
        let mut inner = self.inner.lock().unwrap();

        let mut dead = Vec::new();
        for (id, connection) in inner.connections.iter() {
            if !connection.write(msg.clone()) {
                dead.push(*id);
            }
        }

        for id in dead {
            info!("Connection {} closed, removing from registry", id);
            if let Some(connection) = inner.connections.remove(&id) {
                connection.disconnect();
            }
        }
    }

    /// Administrative removal; idempotent. Used when the simulation judges a
    /// player eliminated or an action references an unknown id.
    pub fn disconnect(&self, id: u32) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(connection) = inner.connections.remove(&id) {
            connection.disconnect();
        }
    }

    pub fn disconnect_many(&self, ids: &[u32]) {
        for &id in ids {
            self.disconnect(id);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
