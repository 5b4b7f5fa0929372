use bevy::prelude::*;

use crate::components::{
    ActorId, Collider, Facing, GamePosition, GravityBody, Grounded, MoveState, Player, Velocity,
};
use crate::config::GameConfig;
use crate::events::{GameEventBus, EVENT_LANDED};
use crate::input::PlayerInput;
use crate::physics_core::{self, MotionParams};
use crate::tilemap::Tilemap;
use crate::SimSet;

/// Fixed-tick movement pipeline: gravity, player control, integration against
/// the level, then grounded bookkeeping. AI decisions ran before this in
/// `FixedPreUpdate`, so enemies' velocities are already set for the tick.
pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                apply_gravity,
                player_control,
                integrate_motion,
                update_ground_state,
            )
                .chain()
                .in_set(SimSet::Movement)
                .run_if(crate::game_runtime::gameplay_systems_enabled),
        );
    }
}

fn apply_gravity(
    config: Res<GameConfig>,
    time: Res<Time<Fixed>>,
    mut query: Query<(&mut Velocity, &Grounded, Option<&MoveState>), With<GravityBody>>,
) {
    let dt = time.delta_secs();
    let tuning = &config.movement;
    for (mut vel, grounded, move_state) in query.iter_mut() {
        let jump_held = move_state.is_some_and(|m| m.jump_held);
        let scale = physics_core::gravity_scale(vel.y, jump_held, tuning);
        physics_core::apply_gravity(&mut vel.y, grounded.0, scale, tuning.gravity, dt);
    }
}

fn player_control(
    config: Res<GameConfig>,
    time: Res<Time<Fixed>>,
    input: Res<PlayerInput>,
    mut query: Query<(&mut Velocity, &Grounded, &mut MoveState, &mut Facing), With<Player>>,
) {
    let dt = time.delta_secs();
    let tuning = &config.movement;
    for (mut vel, grounded, mut state, mut facing) in query.iter_mut() {
        state.coyote.tick(dt);
        state.jump_buffer.tick(dt);

        vel.x = physics_core::horizontal_step(vel.x, input.axis, grounded.0, tuning, dt);
        if vel.x.abs() > 1.0 {
            facing.0 = vel.x.signum();
        }

        if input.jump_pressed {
            state.jump_buffer.start(tuning.jump_buffer_time);
        }
        physics_core::try_consume_jump(&mut state, grounded.0, &mut vel.y, tuning);
        physics_core::apply_jump_cut(
            &mut state,
            input.jump_held,
            &mut vel.y,
            tuning.jump_cut_multiplier,
        );
    }
}

fn integrate_motion(
    config: Res<GameConfig>,
    time: Res<Time<Fixed>>,
    tilemap: Option<Res<Tilemap>>,
    mut query: Query<(&mut GamePosition, &mut Velocity, &Collider)>,
) {
    let dt = time.delta_secs();
    for (mut pos, mut vel, collider) in query.iter_mut() {
        match tilemap.as_deref() {
            Some(tilemap) => {
                let out = physics_core::resolve_motion(
                    tilemap,
                    MotionParams {
                        tile_size: config.tile_size,
                        dt,
                        x: pos.x,
                        y: pos.y,
                        vx: vel.x,
                        vy: vel.y,
                        width: collider.width,
                        height: collider.height,
                    },
                );
                pos.x = out.x;
                pos.y = out.y;
                vel.x = out.vx;
                vel.y = out.vy;
            }
            // No level geometry: free integration, never a crash.
            None => {
                pos.x += vel.x * dt;
                pos.y += vel.y * dt;
            }
        }
    }
}

fn update_ground_state(
    config: Res<GameConfig>,
    tilemap: Option<Res<Tilemap>>,
    mut bus: ResMut<GameEventBus>,
    mut query: Query<(
        &GamePosition,
        &Collider,
        &mut Grounded,
        Option<&mut MoveState>,
        Option<&ActorId>,
    )>,
) {
    for (pos, collider, mut grounded, move_state, actor) in query.iter_mut() {
        // A missing ground probe fails safe: permanently airborne.
        let on_ground = tilemap.as_deref().is_some_and(|tilemap| {
            physics_core::compute_grounded(
                tilemap,
                config.tile_size,
                pos.x,
                pos.y,
                collider.width,
                collider.height,
            )
        });

        if let Some(mut state) = move_state {
            if on_ground && !grounded.0 {
                state.jumps_remaining = config.movement.max_jumps.max(1);
                bus.emit(
                    EVENT_LANDED,
                    serde_json::json!({ "actor": actor.map(|a| a.0) }),
                    actor.map(|a| a.0),
                );
            }
            if !on_ground && grounded.0 {
                state.coyote.start(config.movement.coyote_time);
            }
        }
        grounded.0 = on_ground;
    }
}
