//! Deterministic simulation core for a 2D action-platformer: fixed-tick
//! movement physics, melee combat, and finite-state enemy AI. Rendering,
//! audio, device input and persistence are external collaborators fed through
//! the notification bus and the normalized input resource.

use bevy::prelude::*;

pub mod combat;
pub mod components;
pub mod config;
pub mod enemy;
pub mod events;
pub mod game_runtime;
pub mod health;
pub mod input;
pub mod physics;
pub mod physics_core;
pub mod player;
pub mod simulation;
pub mod spatial_hash;
pub mod telemetry;
pub mod tilemap;
pub mod timer;

use config::GameConfig;

/// Per-tick pipeline. The order is fixed: decisions read the previous tick's
/// positions, then movement integrates, then hits resolve and mutate health,
/// then notifications are absorbed and one-shot inputs are consumed.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// `FixedPreUpdate`: frame counter and spatial index rebuild.
    Index,
    /// `FixedPreUpdate`: AI decisions on previous-tick positions.
    Decide,
    /// `FixedUpdate`: countdown timers (cooldowns, invincibility).
    Timers,
    /// `FixedUpdate`: gravity, control, integration, grounded bookkeeping.
    Movement,
    /// `FixedUpdate`: attacks, stomps, strikes, contact and hazard damage.
    Combat,
    /// `FixedUpdate`: telemetry scrape and input edge consumption.
    Cleanup,
}

/// The whole simulation core as one plugin. Collaborators are plain
/// resources; nothing reaches for globals.
pub struct SimulationPlugin {
    pub config: GameConfig,
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .insert_resource(enemy::AiRng::seeded(self.config.seed))
            .insert_resource(components::NextActorId::default())
            .configure_sets(FixedPreUpdate, (SimSet::Index, SimSet::Decide).chain())
            .configure_sets(
                FixedUpdate,
                (
                    SimSet::Timers,
                    SimSet::Movement,
                    SimSet::Combat,
                    SimSet::Cleanup,
                )
                    .chain(),
            )
            .add_plugins((
                events::GameEventsPlugin,
                game_runtime::RuntimeStatePlugin,
                input::InputPlugin,
                spatial_hash::SpatialHashPlugin,
                health::HealthPlugin,
                physics::MovementPlugin,
                combat::CombatPlugin,
                enemy::EnemyAiPlugin,
                telemetry::TelemetryPlugin,
            ));
    }
}
