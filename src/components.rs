use bevy::prelude::*;

use crate::timer::Countdown;

/// Marks the player entity
#[derive(Component)]
pub struct Player;

/// Marks an enemy entity
#[derive(Component)]
pub struct Enemy;

/// Faction tag used to exclude same-faction actors from hit queries.
#[derive(Component, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Faction {
    Player,
    Enemy,
}

impl Faction {
    pub fn as_str(self) -> &'static str {
        match self {
            Faction::Player => "player",
            Faction::Enemy => "enemy",
        }
    }
}

/// Sub-tile precision position (world units)
#[derive(Component, Clone, Copy, Default, Debug)]
pub struct GamePosition {
    pub x: f32,
    pub y: f32,
}

impl GamePosition {
    pub fn distance_to(&self, other: &GamePosition) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Velocity in world units per second
#[derive(Component, Clone, Copy, Default, Debug)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

/// Facing sign: +1.0 faces right, -1.0 faces left. Horizontal hitbox offsets
/// are multiplied by this so attacks always project forward.
#[derive(Component, Clone, Copy, Debug)]
pub struct Facing(pub f32);

impl Default for Facing {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Axis-aligned collision box centered on the entity's position. Removing it
/// drops the entity from the spatial index and all overlap queries.
#[derive(Component, Clone, Copy, Debug)]
pub struct Collider {
    pub width: f32,
    pub height: f32,
}

/// Whether the entity is on the ground
#[derive(Component, Clone, Copy, Default)]
pub struct Grounded(pub bool);

/// Entities with this marker are pulled down by gravity.
#[derive(Component)]
pub struct GravityBody;

/// Stable identifier carried in event payloads. `Entity` ids are not stable
/// across runs; external consumers key on this instead.
#[derive(Component, Clone, Copy, PartialEq, Eq, Debug)]
pub struct ActorId(pub u64);

#[derive(Resource, Default)]
pub struct NextActorId(pub u64);

impl NextActorId {
    pub fn allocate(&mut self) -> ActorId {
        let id = ActorId(self.0);
        self.0 = self.0.saturating_add(1);
        id
    }
}

/// Jump bookkeeping for the movement controller (player only).
///
/// Invariant: `jumps_remaining` is reset to the configured maximum exactly on
/// the tick `Grounded` flips false→true, and only ever decreases while
/// airborne.
#[derive(Component, Clone, Debug)]
pub struct MoveState {
    pub jumps_remaining: u32,
    pub coyote: Countdown,
    pub jump_buffer: Countdown,
    pub jump_held: bool,
}

impl MoveState {
    pub fn new(max_jumps: u32) -> Self {
        Self {
            jumps_remaining: max_jumps.max(1),
            coyote: Countdown::expired(),
            jump_buffer: Countdown::expired(),
            jump_held: false,
        }
    }
}
