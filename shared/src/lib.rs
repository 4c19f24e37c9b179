//! Types shared between the arena server and its clients: the framed wire
//! protocol, the thread-safe message queue, the connection read/write loops
//! and the game-domain types carried inside message bodies.

pub mod connection;
pub mod game;
pub mod protocol;
pub mod queue;
pub mod wire;

pub use connection::{Connection, ConnectionRole, NO_OWNER};
pub use game::{Bullet, GameSnapshot, Player, PlayerAction};
pub use protocol::{Header, Message, MessageKind, OwnedMessage};
pub use queue::MessageQueue;

pub const ARENA_WIDTH: f32 = 1000.0;
pub const ARENA_HEIGHT: f32 = 1000.0;
pub const PLAYER_SIDE: f32 = 15.0;
pub const BULLET_SIDE: f32 = 5.0;
pub const PLAYER_STEP: f32 = 5.0;
pub const BULLET_SPEED: f32 = 4.0;
pub const ROTATE_STEP_DEG: f32 = 2.0;
pub const TICK_RATE: u32 = 60;
pub const FIRE_COOLDOWN_MS: u64 = 250;
