//! Authoritative server for the arena shooter.
//!
//! The server splits into three parts:
//!
//! - [`registry`]: accepts TCP connections, assigns stable ids and tracks
//!   socket liveness. It never inspects game semantics.
//! - [`world`]: the authoritative roster of players and bullets and the
//!   rules that advance it each tick.
//! - [`bridge`]: the fixed-tick loop on a dedicated thread that drains the
//!   incoming message queue, applies validated actions, advances the world
//!   and broadcasts the resulting snapshot to every live connection.
//!
//! All connection I/O runs on the tokio executor; the simulation thread
//! and the I/O tasks only share the mutex-guarded incoming queue and the
//! registry's connection set, so the simulation never blocks on a socket.

pub mod bridge;
pub mod registry;
pub mod world;
