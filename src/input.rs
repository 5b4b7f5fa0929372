use bevy::prelude::*;

use crate::SimSet;

/// Normalized input consumed by the simulation. Device mapping (keyboard,
/// gamepad, touch) lives outside the core; whatever drives the game writes
/// already-debounced values here each tick — the scripted harness does the
/// same in headless runs.
///
/// `jump_pressed`, `punch` and `kick` are one-shot edges: the simulation
/// clears them at the end of every fixed tick so each press is consumed once.
#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct PlayerInput {
    /// Horizontal axis in [-1, 1].
    pub axis: f32,
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub punch: bool,
    pub kick: bool,
}

impl PlayerInput {
    pub fn set_axis(&mut self, axis: f32) {
        self.axis = axis.clamp(-1.0, 1.0);
    }

    pub fn clear_edges(&mut self) {
        self.jump_pressed = false;
        self.punch = false;
        self.kick = false;
    }
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PlayerInput::default())
            .add_systems(FixedUpdate, clear_input_edges.in_set(SimSet::Cleanup));
    }
}

fn clear_input_edges(mut input: ResMut<PlayerInput>) {
    input.clear_edges();
}
