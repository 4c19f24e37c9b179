//! The fixed-tick loop bridging network I/O and the authoritative world.
//!
//! Connections live on the tokio executor; the bridge runs on its own
//! thread and only ever touches them through the session registry and the
//! shared incoming queue, so a tick never blocks on socket I/O.

use crate::registry::SessionRegistry;
use crate::world::World;
use log::{debug, error, warn};
use shared::{Message, MessageKind, MessageQueue, OwnedMessage, PlayerAction};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct SimulationBridge {
    registry: Arc<SessionRegistry>,
    incoming: Arc<MessageQueue<OwnedMessage>>,
    world: World,
    tick_duration: Duration,
    /// Messages popped while waiting out a tick budget; processed first on
    /// the next tick so arrival order is kept.
    carried: Vec<OwnedMessage>,
    tick: u64,
}

impl SimulationBridge {
    pub fn new(
        registry: Arc<SessionRegistry>,
        incoming: Arc<MessageQueue<OwnedMessage>>,
        tick_rate: u32,
    ) -> Self {
        SimulationBridge {
            registry,
            incoming,
            world: World::new(),
            tick_duration: Duration::from_secs_f64(1.0 / tick_rate as f64),
            carried: Vec::new(),
            tick: 0,
        }
    }

    /// Runs the loop until the process exits. Each iteration performs one
    /// tick and then waits out the remainder of the tick budget on the
    /// incoming queue instead of spinning.
    pub fn run(mut self) {
        loop {
            let started = Instant::now();
            self.tick(started);
            self.wait_until(started + self.tick_duration);
        }
    }

    /// One simulation tick: reconcile the roster, drain and apply queued
    /// actions, advance the world, broadcast the new state.
    pub fn tick(&mut self, now: Instant) {
        let connection_ids = self.registry.connection_ids();
        let (added, removed) = self.world.reconcile(&connection_ids);
        if !added.is_empty() || !removed.is_empty() {
            debug!(
                "Roster reconciled: {} added, {} removed, {} live",
                added.len(),
                removed.len(),
                connection_ids.len()
            );
        }

        for owned in std::mem::take(&mut self.carried) {
            self.handle_message(owned, now);
        }
        while let Some(owned) = self.incoming.try_pop() {
            self.handle_message(owned, now);
        }

        let eliminated = self.world.advance();
        if !eliminated.is_empty() {
            self.registry.disconnect_many(&eliminated);
        }

        match Message::from_payload(MessageKind::GameState, &self.world.snapshot()) {
            Ok(msg) => self.registry.broadcast(&msg),
            Err(e) => error!("Failed to serialize game state: {}", e),
        }

        self.tick += 1;
        if self.tick % 300 == 0 {
            debug!(
                "Tick {}: {} players, {} connections",
                self.tick,
                self.world.player_count(),
                self.registry.len()
            );
        }
    }

    /// Applies one inbound message. Any protocol violation is fatal to the
    /// offending connection only.
    fn handle_message(&mut self, owned: OwnedMessage, now: Instant) {
        match owned.message.kind() {
            MessageKind::PlayerAction => match owned.message.payload::<PlayerAction>() {
                Ok(action) => {
                    if !self.world.apply_action(owned.owner_id, action, now) {
                        warn!(
                            "Action for unknown player {}, disconnecting",
                            owned.owner_id
                        );
                        self.registry.disconnect(owned.owner_id);
                    }
                }
                Err(e) => {
                    warn!(
                        "Undecodable action from connection {}: {}, disconnecting",
                        owned.owner_id, e
                    );
                    self.registry.disconnect(owned.owner_id);
                }
            },
            other => {
                warn!(
                    "Unexpected {:?} message from connection {}, disconnecting",
                    other, owned.owner_id
                );
                self.registry.disconnect(owned.owner_id);
            }
        }
    }

    /// Sleeps out the rest of the tick budget by blocking on the incoming
    /// queue; anything arriving early is carried into the next tick.
    fn wait_until(&mut self, deadline: Instant) {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            if let Some(owned) = self.incoming.pop_timeout(remaining) {
                self.carried.push(owned);
            }
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }
}
