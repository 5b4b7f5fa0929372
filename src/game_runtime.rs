use bevy::prelude::*;
use serde::Serialize;

use crate::components::Faction;
use crate::events::{GameEventBus, EVENT_DEFEATED, EVENT_GOAL_REACHED};

/// Coarse flow state for the whole simulation. Gameplay systems only run
/// while Playing; GameOver and LevelComplete are reached through bus events
/// and are idempotent (re-applying the same transition is a no-op).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum FlowState {
    Playing,
    Paused,
    GameOver,
    LevelComplete,
}

#[derive(Resource, Clone, Serialize)]
pub struct RuntimeState {
    pub state: FlowState,
    pub frame_entered: u64,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            state: FlowState::Playing,
            frame_entered: 0,
        }
    }
}

impl RuntimeState {
    pub fn set_state(&mut self, state: FlowState, frame: u64) {
        if self.state == state {
            return;
        }
        self.state = state;
        self.frame_entered = frame;
    }

    pub fn is_gameplay_active(&self) -> bool {
        self.state == FlowState::Playing
    }
}

/// Run condition gating every simulation system. Absent resource reads as
/// not-running rather than panicking.
pub fn gameplay_systems_enabled(runtime: Option<Res<RuntimeState>>) -> bool {
    runtime.map(|r| r.is_gameplay_active()).unwrap_or(false)
}

#[derive(Resource, Default)]
struct RuntimeEventCursor {
    last_frame: u64,
    processed_in_frame: usize,
}

pub struct RuntimeStatePlugin;

impl Plugin for RuntimeStatePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(RuntimeState::default())
            .insert_resource(RuntimeEventCursor::default())
            .add_systems(FixedPostUpdate, apply_runtime_events);
    }
}

/// Scan newly-emitted bus events and apply flow transitions: the player's
/// defeat ends the run, reaching the goal completes it, and external
/// collaborators may pause/resume. Runs ungated so a paused game can resume.
fn apply_runtime_events(
    bus: Res<GameEventBus>,
    mut runtime: ResMut<RuntimeState>,
    mut cursor: ResMut<RuntimeEventCursor>,
) {
    let mut count_in_frame = 0usize;
    for ev in bus.recent.iter() {
        if ev.frame < cursor.last_frame {
            continue;
        }
        if ev.frame == cursor.last_frame {
            count_in_frame = count_in_frame.saturating_add(1);
            if count_in_frame <= cursor.processed_in_frame {
                continue;
            }
        } else {
            count_in_frame = 1;
        }

        match ev.name.as_str() {
            EVENT_DEFEATED => {
                let is_player = ev
                    .data
                    .get("faction")
                    .and_then(|v| v.as_str())
                    .is_some_and(|f| f == Faction::Player.as_str());
                if is_player {
                    runtime.set_state(FlowState::GameOver, ev.frame);
                }
            }
            EVENT_GOAL_REACHED => {
                runtime.set_state(FlowState::LevelComplete, ev.frame);
            }
            "game_pause" => {
                runtime.set_state(FlowState::Paused, ev.frame);
            }
            "game_resume" => {
                runtime.set_state(FlowState::Playing, ev.frame);
            }
            _ => {}
        }

        cursor.last_frame = ev.frame;
        cursor.processed_in_frame = count_in_frame;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_transitions_are_no_ops() {
        let mut runtime = RuntimeState::default();
        runtime.set_state(FlowState::GameOver, 10);
        assert_eq!(runtime.frame_entered, 10);
        runtime.set_state(FlowState::GameOver, 99);
        // Unchanged: the transition already happened
        assert_eq!(runtime.frame_entered, 10);
    }

    #[test]
    fn player_defeat_ends_the_run() {
        let mut app = App::new();
        app.insert_resource(GameEventBus::default())
            .add_plugins(RuntimeStatePlugin);

        {
            let mut bus = app.world_mut().resource_mut::<GameEventBus>();
            bus.frame = 1;
            bus.emit(
                EVENT_DEFEATED,
                serde_json::json!({ "actor": 0, "faction": "player" }),
                Some(0),
            );
        }
        app.world_mut().run_schedule(FixedPostUpdate);
        let runtime = app.world().resource::<RuntimeState>();
        assert_eq!(runtime.state, FlowState::GameOver);
        assert!(!runtime.is_gameplay_active());
    }

    #[test]
    fn enemy_defeat_does_not_end_the_run() {
        let mut app = App::new();
        app.insert_resource(GameEventBus::default())
            .add_plugins(RuntimeStatePlugin);

        {
            let mut bus = app.world_mut().resource_mut::<GameEventBus>();
            bus.frame = 1;
            bus.emit(
                EVENT_DEFEATED,
                serde_json::json!({ "actor": 3, "faction": "enemy" }),
                Some(3),
            );
        }
        app.world_mut().run_schedule(FixedPostUpdate);
        let runtime = app.world().resource::<RuntimeState>();
        assert_eq!(runtime.state, FlowState::Playing);
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let mut app = App::new();
        app.insert_resource(GameEventBus::default())
            .add_plugins(RuntimeStatePlugin);

        {
            let mut bus = app.world_mut().resource_mut::<GameEventBus>();
            bus.frame = 1;
            bus.emit("game_pause", serde_json::json!({}), None);
        }
        app.world_mut().run_schedule(FixedPostUpdate);
        assert_eq!(
            app.world().resource::<RuntimeState>().state,
            FlowState::Paused
        );

        {
            let mut bus = app.world_mut().resource_mut::<GameEventBus>();
            bus.frame = 2;
            bus.emit("game_resume", serde_json::json!({}), None);
        }
        app.world_mut().run_schedule(FixedPostUpdate);
        assert_eq!(
            app.world().resource::<RuntimeState>().state,
            FlowState::Playing
        );
    }
}
