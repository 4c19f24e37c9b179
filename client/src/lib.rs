//! Client-side session layer for the arena shooter.
//!
//! The [`network::GameClient`] facade owns the single connection to the
//! server: it sends [`shared::PlayerAction`] values and surfaces the latest
//! [`shared::GameSnapshot`] the server has broadcast. Rendering and input
//! capture are external collaborators that plug in around the facade: a
//! renderer consumes the decoded snapshots and an input layer produces the
//! actions.

pub mod network;
