use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::Serialize;

use crate::components::Faction;
use crate::events::{
    GameEventBus, EVENT_ATTACK_PERFORMED, EVENT_DAMAGED, EVENT_DEFEATED, EVENT_LANDED,
};
use crate::SimSet;

/// Aggregate run statistics scraped from the notification bus, reported at
/// the end of a headless run.
#[derive(Resource, Default, Clone, Serialize)]
pub struct GameplayTelemetry {
    pub total_frames: u64,
    pub damage_dealt: i64,
    pub damage_taken: i64,
    pub enemies_defeated: u64,
    pub landings: u64,
    pub attack_counts: BTreeMap<String, u64>,
}

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GameplayTelemetry::default()).add_systems(
            FixedUpdate,
            update_telemetry
                .in_set(SimSet::Cleanup)
                .run_if(crate::game_runtime::gameplay_systems_enabled),
        );
    }
}

fn update_telemetry(mut telemetry: ResMut<GameplayTelemetry>, bus: Res<GameEventBus>) {
    telemetry.total_frames += 1;
    absorb_frame_events(&mut telemetry, &bus);
}

fn absorb_frame_events(telemetry: &mut GameplayTelemetry, bus: &GameEventBus) {
    for event in bus.current_frame_events() {
        match event.name.as_str() {
            EVENT_DAMAGED => {
                let amount = event.data.get("amount").and_then(|v| v.as_i64()).unwrap_or(0);
                let faction = event.data.get("faction").and_then(|v| v.as_str());
                if faction == Some(Faction::Player.as_str()) {
                    telemetry.damage_taken += amount;
                } else {
                    telemetry.damage_dealt += amount;
                }
            }
            EVENT_DEFEATED => {
                let faction = event.data.get("faction").and_then(|v| v.as_str());
                if faction == Some(Faction::Enemy.as_str()) {
                    telemetry.enemies_defeated += 1;
                }
            }
            EVENT_LANDED => {
                telemetry.landings += 1;
            }
            EVENT_ATTACK_PERFORMED => {
                if let Some(attack) = event.data.get("attack").and_then(|v| v.as_str()) {
                    *telemetry.attack_counts.entry(attack.to_string()).or_insert(0) += 1;
                }
            }
            _ => {}
        }
    }
}
