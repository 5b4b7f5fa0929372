use std::collections::HashMap;

use bevy::prelude::*;

use crate::components::{Collider, GamePosition};
use crate::SimSet;

/// Uniform-grid overlap index over every collidable actor. Rebuilt from
/// scratch at the start of each fixed tick, so hit queries always run against
/// the previous tick's settled positions and despawned actors can never go
/// stale in a cell.
#[derive(Resource)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<Entity>>,
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new(64.0)
    }
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
    }

    pub fn insert(&mut self, entity: Entity, x: f32, y: f32, width: f32, height: f32) {
        let (min_cx, min_cy) = self.cell_of(x - width / 2.0, y - height / 2.0);
        let (max_cx, max_cy) = self.cell_of(x + width / 2.0, y + height / 2.0);
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                self.cells.entry((cx, cy)).or_default().push(entity);
            }
        }
    }

    /// All actors whose cells overlap the given rectangle, deduplicated and in
    /// a deterministic order. Callers still need an exact AABB check.
    pub fn query_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<Entity> {
        let (min_cx, min_cy) = self.cell_of(min_x, min_y);
        let (max_cx, max_cy) = self.cell_of(max_x, max_y);
        let mut out = Vec::new();
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                if let Some(entities) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(entities);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn query_radius(&self, x: f32, y: f32, radius: f32) -> Vec<Entity> {
        self.query_rect(x - radius, y - radius, x + radius, y + radius)
    }

    fn cell_of(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }
}

pub struct SpatialHashPlugin;

impl Plugin for SpatialHashPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SpatialHash::default()).add_systems(
            FixedPreUpdate,
            rebuild_spatial_hash
                .in_set(SimSet::Index)
                .run_if(crate::game_runtime::gameplay_systems_enabled),
        );
    }
}

fn rebuild_spatial_hash(
    mut hash: ResMut<SpatialHash>,
    actors: Query<(Entity, &GamePosition, &Collider)>,
) {
    hash.clear();
    for (entity, pos, collider) in actors.iter() {
        hash.insert(entity, pos.x, pos.y, collider.width, collider.height);
    }
}
