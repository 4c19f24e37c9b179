//! Game-domain types carried inside message bodies: players, bullets and the
//! arena geometry both peers agree on.

use crate::{
    ARENA_HEIGHT, ARENA_WIDTH, BULLET_SIDE, BULLET_SPEED, PLAYER_SIDE, PLAYER_STEP, ROTATE_STEP_DEG,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One action a player can request per message. Movement and rotation apply
/// a fixed step; `FireBullet` is rate-limited by the server.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Up,
    Down,
    Left,
    Right,
    RotateLeft,
    RotateRight,
    FireBullet,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Bullet {
    pub fn new(x: f32, y: f32, dx: f32, dy: f32) -> Self {
        Bullet { x, y, dx, dy }
    }

    /// Advances the bullet by its velocity for one tick. Bullets are not
    /// clamped; leaving the arena is how they die.
    pub fn advance(&mut self) {
        self.x += self.dx;
        self.y += self.dy;
    }

    pub fn is_outside_arena(&self) -> bool {
        self.x < 0.0 || self.x > ARENA_WIDTH || self.y < 0.0 || self.y > ARENA_HEIGHT
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    /// Facing angle in degrees; bullets fly along it.
    pub angle: f32,
    pub bullets: Vec<Bullet>,
}

impl Player {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Player {
            id,
            x,
            y,
            angle: 0.0,
            bullets: Vec::new(),
        }
    }

    /// Applies one movement/rotation action. Firing is handled by the
    /// server's world, which owns the per-player cooldown.
    pub fn apply_action(&mut self, action: PlayerAction) {
        match action {
            PlayerAction::Up => self.move_up(),
            PlayerAction::Down => self.move_down(),
            PlayerAction::Left => self.move_left(),
            PlayerAction::Right => self.move_right(),
            PlayerAction::RotateLeft => self.angle -= ROTATE_STEP_DEG,
            PlayerAction::RotateRight => self.angle += ROTATE_STEP_DEG,
            PlayerAction::FireBullet => self.fire(),
        }
    }

    fn move_up(&mut self) {
        let new_y = self.y - PLAYER_STEP;
        if new_y >= 0.0 {
            self.y = new_y;
        }
    }

    fn move_down(&mut self) {
        let new_y = self.y + PLAYER_STEP;
        if new_y + PLAYER_SIDE < ARENA_HEIGHT {
            self.y = new_y;
        }
    }

    fn move_left(&mut self) {
        let new_x = self.x - PLAYER_STEP;
        if new_x >= 0.0 {
            self.x = new_x;
        }
    }

    fn move_right(&mut self) {
        let new_x = self.x + PLAYER_STEP;
        if new_x + PLAYER_SIDE < ARENA_WIDTH {
            self.x = new_x;
        }
    }

    /// Spawns a bullet at the player's position travelling along the facing
    /// angle.
    pub fn fire(&mut self) {
        let radians = self.angle.to_radians();
        let dx = BULLET_SPEED * radians.cos();
        let dy = BULLET_SPEED * radians.sin();
        self.bullets.push(Bullet::new(self.x, self.y, dx, dy));
    }
}

/// Axis-aligned overlap test; touching edges do not count as overlap.
pub fn rects_overlap(
    (x1, y1, w1, h1): (f32, f32, f32, f32),
    (x2, y2, w2, h2): (f32, f32, f32, f32),
) -> bool {
    !(x1 + w1 <= x2 || x2 + w2 <= x1 || y1 + h1 <= y2 || y2 + h2 <= y1)
}

/// Whether a bullet overlaps the bounding box of a player standing at
/// `(px, py)`.
pub fn bullet_hits_player(bullet: &Bullet, px: f32, py: f32) -> bool {
    rects_overlap(
        (bullet.x, bullet.y, BULLET_SIDE, BULLET_SIDE),
        (px, py, PLAYER_SIDE, PLAYER_SIDE),
    )
}

/// The authoritative roster broadcast to every client each tick. An ordered
/// map so snapshots serialize deterministically.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct GameSnapshot {
    pub players: BTreeMap<u32, Player>,
}
