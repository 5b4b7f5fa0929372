use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{Enemy, GamePosition, Grounded, Player, Velocity};
use crate::config::GameConfig;
use crate::enemy;
use crate::events::{GameEvent, GameEventBus};
use crate::game_runtime::{FlowState, RuntimeState};
use crate::input::PlayerInput;
use crate::player;
use crate::telemetry::GameplayTelemetry;
use crate::tilemap::Tilemap;
use crate::SimulationPlugin;

pub const SIM_TICK_HZ: f64 = 60.0;

/// A scripted headless run: per-frame inputs against a level, with a frame
/// budget and trace sampling interval.
#[derive(Deserialize, Clone)]
pub struct SimulationRequest {
    #[serde(default)]
    pub inputs: Vec<SimInput>,
    pub max_frames: u32,
    #[serde(default = "default_record_interval")]
    pub record_interval: u32,
}

fn default_record_interval() -> u32 {
    1
}

/// One held action: `action` is active for `duration` frames starting at
/// `frame` (0 means a single frame).
#[derive(Deserialize, Clone)]
pub struct SimInput {
    pub frame: u32,
    pub action: String,
    #[serde(default)]
    pub duration: u32,
}

#[derive(Serialize, Clone)]
pub struct TraceFrame {
    pub frame: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub grounded: bool,
}

#[derive(Serialize)]
pub struct SimulationResult {
    pub outcome: String,
    pub frames_elapsed: u32,
    pub trace: Vec<TraceFrame>,
    pub events: Vec<GameEvent>,
    pub telemetry: GameplayTelemetry,
}

/// Build the simulation app with no window, no renderer, no device input:
/// just the ECS core on a 60 Hz fixed tick.
pub fn build_headless_app(config: GameConfig, tilemap: Tilemap) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(Time::<Fixed>::from_hz(SIM_TICK_HZ))
        .insert_resource(tilemap)
        .add_plugins(SimulationPlugin { config });
    app.finish();
    app.cleanup();
    app
}

/// Advance exactly one simulation tick. Stepping the fixed schedules directly
/// keeps runs bit-identical regardless of wall-clock time; the fixed clock is
/// advanced by its own timestep so `delta_secs` reads the constant Δt.
pub fn step(app: &mut App) {
    let world = app.world_mut();
    let timestep = world.resource::<Time<Fixed>>().timestep();
    world.resource_mut::<Time<Fixed>>().advance_by(timestep);
    world.run_schedule(FixedPreUpdate);
    world.run_schedule(FixedUpdate);
    world.run_schedule(FixedPostUpdate);
}

/// Run a scripted simulation to completion and collect the trace, the full
/// notification log and the telemetry snapshot.
pub fn run_simulation(
    config: GameConfig,
    tilemap: Tilemap,
    request: &SimulationRequest,
) -> SimulationResult {
    let had_enemies = !tilemap.enemy_spawns.is_empty();
    let mut app = build_headless_app(config, tilemap);
    player::spawn_player(app.world_mut());
    enemy::spawn_enemies(app.world_mut());

    // Expand the input list into per-frame active actions.
    let mut active_inputs: Vec<Vec<String>> = vec![Vec::new(); request.max_frames as usize + 1];
    for input in &request.inputs {
        let duration = input.duration.max(1);
        for f in input.frame..(input.frame + duration).min(request.max_frames) {
            active_inputs[f as usize].push(input.action.clone());
        }
    }

    let mut prev_jump = false;
    let mut prev_punch = false;
    let mut prev_kick = false;
    let mut trace = Vec::new();
    let mut outcome = "timeout".to_string();
    let mut frames_elapsed = 0;

    for frame in 0..request.max_frames {
        let actions = &active_inputs[frame as usize];
        let has = |name: &str| actions.iter().any(|a| a == name);
        let jump_now = has("jump");
        let punch_now = has("punch");
        let kick_now = has("kick");

        {
            let mut input = app.world_mut().resource_mut::<PlayerInput>();
            let mut axis = 0.0;
            if has("left") {
                axis -= 1.0;
            }
            if has("right") {
                axis += 1.0;
            }
            input.set_axis(axis);
            input.jump_held = jump_now;
            input.jump_pressed = jump_now && !prev_jump;
            input.punch = punch_now && !prev_punch;
            input.kick = kick_now && !prev_kick;
        }
        prev_jump = jump_now;
        prev_punch = punch_now;
        prev_kick = kick_now;

        step(&mut app);
        frames_elapsed = frame + 1;

        if request.record_interval > 0 && frame % request.record_interval == 0 {
            if let Some(sample) = sample_player(&mut app, frame) {
                trace.push(sample);
            }
        }

        match app.world().resource::<RuntimeState>().state {
            FlowState::GameOver => {
                outcome = "player_defeated".to_string();
                break;
            }
            FlowState::LevelComplete => {
                outcome = "level_complete".to_string();
                break;
            }
            _ => {}
        }

        if had_enemies {
            let world = app.world_mut();
            let mut enemies = world.query_filtered::<Entity, With<Enemy>>();
            if enemies.iter(world).next().is_none() {
                outcome = "enemies_cleared".to_string();
                break;
            }
        }
    }

    let events: Vec<GameEvent> = app
        .world()
        .resource::<GameEventBus>()
        .recent
        .iter()
        .cloned()
        .collect();
    let telemetry = app.world().resource::<GameplayTelemetry>().clone();

    SimulationResult {
        outcome,
        frames_elapsed,
        trace,
        events,
        telemetry,
    }
}

fn sample_player(app: &mut App, frame: u32) -> Option<TraceFrame> {
    let world = app.world_mut();
    let mut query = world.query_filtered::<(&GamePosition, &Velocity, &Grounded), With<Player>>();
    query
        .iter(world)
        .next()
        .map(|(pos, vel, grounded)| TraceFrame {
            frame,
            x: pos.x,
            y: pos.y,
            vx: vel.x,
            vy: vel.y,
            grounded: grounded.0,
        })
}
