use std::collections::VecDeque;

use bevy::prelude::*;
use serde::Serialize;

use crate::SimSet;

const MAX_EVENTS: usize = 500;

/// Core notification names. Everything the simulation tells the outside world
/// (animation, audio, HUD, persistence) goes through these; the core never
/// reads them back.
pub const EVENT_DAMAGED: &str = "damaged";
pub const EVENT_DEFEATED: &str = "defeated";
pub const EVENT_LANDED: &str = "landed";
pub const EVENT_ATTACK_PERFORMED: &str = "attack_performed";
pub const EVENT_GOAL_REACHED: &str = "goal_reached";

#[derive(Serialize, Clone, Debug)]
pub struct GameEvent {
    pub name: String,
    pub data: serde_json::Value,
    pub frame: u64,
    pub source: Option<u64>,
}

/// One-way, fire-and-forget notification bus. Bounded: under sustained
/// overflow the oldest events are dropped and counted.
#[derive(Resource, Default)]
pub struct GameEventBus {
    pub recent: VecDeque<GameEvent>,
    pub frame: u64,
    pub dropped_events: u64,
    last_overflow_log_frame: u64,
}

impl GameEventBus {
    pub fn emit(&mut self, name: impl Into<String>, data: serde_json::Value, source: Option<u64>) {
        self.recent.push_back(GameEvent {
            name: name.into(),
            data,
            frame: self.frame,
            source,
        });
        if self.recent.len() > MAX_EVENTS {
            let excess = self.recent.len() - MAX_EVENTS;
            for _ in 0..excess {
                self.recent.pop_front();
            }
            self.dropped_events = self.dropped_events.saturating_add(excess as u64);
            if self.frame.saturating_sub(self.last_overflow_log_frame) >= 60 {
                self.last_overflow_log_frame = self.frame;
                warn!(
                    "[kwondo events] Dropped {} buffered events (total dropped: {})",
                    excess, self.dropped_events
                );
            }
        }
    }

    /// Events emitted during the current tick.
    pub fn current_frame_events(&self) -> impl Iterator<Item = &GameEvent> {
        let frame = self.frame;
        self.recent
            .iter()
            .rev()
            .take_while(move |e| e.frame == frame)
    }
}

pub struct GameEventsPlugin;

impl Plugin for GameEventsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GameEventBus::default()).add_systems(
            FixedPreUpdate,
            tick_event_frame
                .in_set(SimSet::Index)
                .run_if(crate::game_runtime::gameplay_systems_enabled),
        );
    }
}

fn tick_event_frame(mut bus: ResMut<GameEventBus>) {
    bus.frame = bus.frame.saturating_add(1);
}
