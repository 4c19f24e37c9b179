//! The player-side session facade: one connection to the server, used to
//! send actions and receive authoritative state snapshots.

use log::{info, warn};
use shared::{
    Connection, ConnectionRole, GameSnapshot, Message, MessageKind, MessageQueue, OwnedMessage,
    PlayerAction, NO_OWNER,
};
use std::io;
use std::sync::Arc;
use tokio::net::TcpStream;

pub struct GameClient {
    connection: Connection,
    incoming: Arc<MessageQueue<OwnedMessage>>,
}

impl GameClient {
    /// Connects to the server and starts the connection's read/write loops.
    pub async fn connect(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        info!("Connected to server at {}", addr);

        let incoming = Arc::new(MessageQueue::new());
        let connection = Connection::spawn(
            stream,
            NO_OWNER,
            ConnectionRole::Client,
            Arc::clone(&incoming),
        );

        Ok(GameClient {
            connection,
            incoming,
        })
    }

    /// Sends one action to the server. Returns false once the connection
    /// has closed.
    pub fn send_action(&self, action: PlayerAction) -> bool {
        match Message::from_payload(MessageKind::PlayerAction, &action) {
            Ok(msg) => self.connection.write(msg),
            Err(e) => {
                warn!("Failed to serialize action: {}", e);
                false
            }
        }
    }

    /// Drains everything received so far and returns the newest decodable
    /// snapshot, if any. Stale snapshots are discarded; the renderer only
    /// ever wants the latest authoritative state.
    pub fn latest_snapshot(&self) -> Option<GameSnapshot> {
        let mut latest = None;
        while let Some(owned) = self.incoming.try_pop() {
            match owned.message.kind() {
                MessageKind::GameState => match owned.message.payload::<GameSnapshot>() {
                    Ok(snapshot) => latest = Some(snapshot),
                    Err(e) => warn!("Undecodable game state from server: {}", e),
                },
                other => warn!("Unexpected {:?} message from server", other),
            }
        }
        latest
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn disconnect(&self) {
        info!("Disconnecting from server");
        self.connection.disconnect();
    }
}
