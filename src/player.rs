use bevy::prelude::*;

use crate::combat::AttackCooldowns;
use crate::components::{
    Collider, Faction, Facing, GamePosition, GravityBody, Grounded, MoveState, NextActorId, Player,
    Velocity,
};
use crate::config::GameConfig;
use crate::health::Health;
use crate::tilemap::Tilemap;

const PLAYER_WIDTH: f32 = 12.0;
const PLAYER_HEIGHT: f32 = 14.0;

/// Spawn the player at the level's spawn point with the full component set
/// the simulation expects.
pub fn spawn_player(world: &mut World) -> Entity {
    let (spawn_x, spawn_y) = world
        .get_resource::<Tilemap>()
        .map(|tilemap| tilemap.player_spawn)
        .unwrap_or((0.0, 0.0));
    let config = world.resource::<GameConfig>();
    let max_health = config.player_max_health;
    let max_jumps = config.movement.max_jumps;
    let actor_id = world.resource_mut::<NextActorId>().allocate();

    world
        .spawn((
            actor_id,
            Player,
            Faction::Player,
            GamePosition {
                x: spawn_x,
                y: spawn_y,
            },
            Velocity::default(),
            Facing::default(),
            Collider {
                width: PLAYER_WIDTH,
                height: PLAYER_HEIGHT,
            },
            Grounded(false),
            GravityBody,
            MoveState::new(max_jumps),
            Health::new(max_health),
            AttackCooldowns::default(),
        ))
        .id()
}
