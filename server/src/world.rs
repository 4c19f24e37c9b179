//! Authoritative game state: the player roster and the rules advancing it.

use log::{debug, info};
use rand::Rng;
use shared::game::bullet_hits_player;
use shared::{GameSnapshot, Player, PlayerAction, ARENA_HEIGHT, ARENA_WIDTH, FIRE_COOLDOWN_MS, PLAYER_SIDE};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// The server-side simulation state. Owned exclusively by the simulation
/// loop; connections only ever carry serialized copies of it.
pub struct World {
    players: BTreeMap<u32, Player>,
    /// Last accepted fire time per player; fires arriving inside the
    /// cooldown window are silently absorbed.
    last_fired: HashMap<u32, Instant>,
    fire_cooldown: Duration,
}

impl World {
    pub fn new() -> Self {
        World {
            players: BTreeMap::new(),
            last_fired: HashMap::new(),
            fire_cooldown: Duration::from_millis(FIRE_COOLDOWN_MS),
        }
    }

    pub fn add_player(&mut self, id: u32) {
        let mut rng = rand::thread_rng();
        let x = rng.gen_range(0.0..=(ARENA_WIDTH - PLAYER_SIDE));
        let y = rng.gen_range(0.0..=(ARENA_HEIGHT - PLAYER_SIDE));
        info!("Spawning player {} at ({:.0}, {:.0})", id, x, y);
        self.players.insert(id, Player::new(id, x, y));
    }

    pub fn remove_player(&mut self, id: u32) {
        if self.players.remove(&id).is_some() {
            info!("Removed player {}", id);
        }
        self.last_fired.remove(&id);
    }

    /// Converges the roster to the registry's live connection ids: players
    /// are added for unknown ids and removed for vanished ones. Returns the
    /// ids that were added and removed.
    pub fn reconcile(&mut self, connection_ids: &[u32]) -> (Vec<u32>, Vec<u32>) {
        let added: Vec<u32> = connection_ids
            .iter()
            .copied()
            .filter(|id| !self.players.contains_key(id))
            .collect();
        let removed: Vec<u32> = self
            .players
            .keys()
            .copied()
            .filter(|id| !connection_ids.contains(id))
            .collect();

        for &id in &added {
            self.add_player(id);
        }
        for &id in &removed {
            self.remove_player(id);
        }

        (added, removed)
    }

    /// Applies one validated action. Returns false if no player matches the
    /// id, which callers treat as a protocol violation.
    pub fn apply_action(&mut self, id: u32, action: PlayerAction, now: Instant) -> bool {
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };

        if action == PlayerAction::FireBullet {
            if let Some(&last) = self.last_fired.get(&id) {
                if now.duration_since(last) < self.fire_cooldown {
                    debug!("Absorbing too-fast fire from player {}", id);
                    return true;
                }
            }
            self.last_fired.insert(id, now);
        }

        player.apply_action(action);
        true
    }

    /// Advances the state one tick: moves every bullet, resolves collisions
    /// and arena exits, and removes eliminated players. Returns the ids of
    /// eliminated players so their connections can be dropped.
    ///
    /// Per bullet, the collision test runs before the boundary test, and the
    /// first matching player wins; one bullet eliminates at most one player.
    /// Removals are collected during the scan and applied afterwards.
    pub fn advance(&mut self) -> Vec<u32> {
        // Player positions are fixed during the bullet pass; actions were
        // already applied this tick.
        let targets: Vec<(u32, f32, f32)> =
            self.players.values().map(|p| (p.id, p.x, p.y)).collect();

        let mut eliminated: Vec<u32> = Vec::new();

        for (&owner_id, player) in self.players.iter_mut() {
            let mut spent = Vec::new();

            for (index, bullet) in player.bullets.iter_mut().enumerate() {
                bullet.advance();

                let hit = targets
                    .iter()
                    .find(|&&(target_id, tx, ty)| {
                        target_id != owner_id && bullet_hits_player(bullet, tx, ty)
                    })
                    .map(|&(target_id, _, _)| target_id);

                if let Some(target_id) = hit {
                    if !eliminated.contains(&target_id) {
                        eliminated.push(target_id);
                    }
                    spent.push(index);
                } else if bullet.is_outside_arena() {
                    spent.push(index);
                }
            }

            for index in spent.into_iter().rev() {
                player.bullets.remove(index);
            }
        }

        // Eliminated players vanish with all their bullets, including any
        // fired this same tick.
        for &id in &eliminated {
            info!("Player {} was hit and eliminated", id);
            self.remove_player(id);
        }

        eliminated
    }

    /// Serializable copy of the roster for the per-tick broadcast.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            players: self.players.clone(),
        }
    }

    pub fn player_ids(&self) -> Vec<u32> {
        self.players.keys().copied().collect()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[cfg(test)]
    pub fn player_mut(&mut self, id: u32) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    #[cfg(test)]
    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Bullet;

    fn world_with_players(ids: &[u32]) -> World {
        let mut world = World::new();
        for &id in ids {
            world.add_player(id);
        }
        world
    }

    /// Pins a player to a known position so collision scenarios are exact.
    fn place(world: &mut World, id: u32, x: f32, y: f32) {
        let player = world.player_mut(id).unwrap();
        player.x = x;
        player.y = y;
    }

    #[test]
    fn test_roster_convergence() {
        let mut world = world_with_players(&[1, 2, 3]);

        let (added, removed) = world.reconcile(&[1, 3, 5]);

        assert_eq!(added, vec![5]);
        assert_eq!(removed, vec![2]);
        assert_eq!(world.player_ids(), vec![1, 3, 5]);
    }

    #[test]
    fn test_reconcile_converged_roster_is_noop() {
        let mut world = world_with_players(&[1, 2]);
        let (added, removed) = world.reconcile(&[1, 2]);
        assert!(added.is_empty());
        assert!(removed.is_empty());
    }

    #[test]
    fn test_action_on_unknown_player_rejected() {
        let mut world = world_with_players(&[1]);
        assert!(world.apply_action(1, PlayerAction::Up, Instant::now()));
        assert!(!world.apply_action(99, PlayerAction::Up, Instant::now()));
    }

    #[test]
    fn test_fire_rate_limit() {
        let mut world = world_with_players(&[1]);
        let start = Instant::now();

        // Two fires 50ms apart: only the first spawns a bullet.
        assert!(world.apply_action(1, PlayerAction::FireBullet, start));
        assert!(world.apply_action(
            1,
            PlayerAction::FireBullet,
            start + Duration::from_millis(50)
        ));
        assert_eq!(world.player(1).unwrap().bullets.len(), 1);

        // 300ms after the first accepted fire the cooldown has elapsed.
        assert!(world.apply_action(
            1,
            PlayerAction::FireBullet,
            start + Duration::from_millis(300)
        ));
        assert_eq!(world.player(1).unwrap().bullets.len(), 2);
    }

    #[test]
    fn test_fire_rate_limit_is_per_player() {
        let mut world = world_with_players(&[1, 2]);
        let now = Instant::now();

        world.apply_action(1, PlayerAction::FireBullet, now);
        world.apply_action(2, PlayerAction::FireBullet, now);

        assert_eq!(world.player(1).unwrap().bullets.len(), 1);
        assert_eq!(world.player(2).unwrap().bullets.len(), 1);
    }

    #[test]
    fn test_bullet_eliminates_player() {
        let mut world = world_with_players(&[1, 2]);
        place(&mut world, 1, 100.0, 100.0);
        place(&mut world, 2, 110.0, 100.0);

        // A stationary-velocity bullet already overlapping player 2.
        world
            .player_mut(1)
            .unwrap()
            .bullets
            .push(Bullet::new(110.0, 100.0, 0.0, 0.0));

        let eliminated = world.advance();

        assert_eq!(eliminated, vec![2]);
        assert_eq!(world.player_ids(), vec![1]);
        assert!(world.player(1).unwrap().bullets.is_empty());
    }

    #[test]
    fn test_bullet_never_hits_its_owner() {
        let mut world = world_with_players(&[1]);
        place(&mut world, 1, 100.0, 100.0);
        world
            .player_mut(1)
            .unwrap()
            .bullets
            .push(Bullet::new(100.0, 100.0, 0.0, 0.0));

        let eliminated = world.advance();
        assert!(eliminated.is_empty());
        assert_eq!(world.player(1).unwrap().bullets.len(), 1);
    }

    #[test]
    fn test_bullet_leaving_arena_is_removed() {
        let mut world = world_with_players(&[1]);
        world
            .player_mut(1)
            .unwrap()
            .bullets
            .push(Bullet::new(9999.0, 9999.0, 1.0, 0.0));

        let eliminated = world.advance();
        assert!(eliminated.is_empty());
        assert!(world.player(1).unwrap().bullets.is_empty());
    }

    #[test]
    fn test_collision_takes_precedence_over_boundary() {
        let mut world = world_with_players(&[1, 2]);
        // Player 2 sits at the top edge; after moving, the bullet both
        // overlaps player 2 and is outside the arena. Collision wins.
        place(&mut world, 1, 500.0, 500.0);
        place(&mut world, 2, 100.0, 0.0);
        world
            .player_mut(1)
            .unwrap()
            .bullets
            .push(Bullet::new(102.0, 4.0, 0.0, -6.0));

        let eliminated = world.advance();
        assert_eq!(eliminated, vec![2]);
        assert!(world.player(1).unwrap().bullets.is_empty());
    }

    #[test]
    fn test_one_bullet_eliminates_at_most_one_player() {
        let mut world = world_with_players(&[1, 2, 3]);
        // Players 2 and 3 overlap; the first in id order wins.
        place(&mut world, 1, 500.0, 500.0);
        place(&mut world, 2, 100.0, 100.0);
        place(&mut world, 3, 105.0, 100.0);
        world
            .player_mut(1)
            .unwrap()
            .bullets
            .push(Bullet::new(104.0, 104.0, 0.0, 0.0));

        let eliminated = world.advance();
        assert_eq!(eliminated, vec![2]);
        assert_eq!(world.player_ids(), vec![1, 3]);
    }

    #[test]
    fn test_eliminated_players_same_tick_bullet_is_discarded() {
        let mut world = world_with_players(&[1, 2]);
        place(&mut world, 1, 100.0, 100.0);
        place(&mut world, 2, 300.0, 300.0);

        // Player 2 fires this tick, then is eliminated by player 1's
        // bullet in the same advance. The fresh bullet goes with them.
        world.apply_action(2, PlayerAction::FireBullet, Instant::now());
        world
            .player_mut(1)
            .unwrap()
            .bullets
            .push(Bullet::new(300.0, 300.0, 0.0, 0.0));

        let eliminated = world.advance();
        assert_eq!(eliminated, vec![2]);
        assert_eq!(world.player_ids(), vec![1]);
        let snapshot = world.snapshot();
        assert!(!snapshot.players.contains_key(&2));
    }

    #[test]
    fn test_snapshot_reflects_roster() {
        let mut world = world_with_players(&[2, 7]);
        place(&mut world, 7, 42.0, 43.0);

        let snapshot = world.snapshot();
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[&7].x, 42.0);
        assert_eq!(snapshot.players[&7].y, 43.0);
    }

    #[test]
    fn test_spawn_position_is_inside_arena() {
        let mut world = World::new();
        for id in 0..50 {
            world.add_player(id);
            let player = world.player(id).unwrap();
            assert!(player.x >= 0.0 && player.x + PLAYER_SIDE <= ARENA_WIDTH);
            assert!(player.y >= 0.0 && player.y + PLAYER_SIDE <= ARENA_HEIGHT);
        }
    }
}
