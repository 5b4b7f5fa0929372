use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileType {
    Empty = 0,
    Solid = 1,
    Spike = 2,
    Goal = 3,
}

impl TileType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => TileType::Solid,
            2 => TileType::Spike,
            3 => TileType::Goal,
            _ => TileType::Empty,
        }
    }

    pub fn is_solid(self) -> bool {
        self == TileType::Solid
    }
}

/// Where an enemy starts and the two waypoints it patrols between. Waypoints
/// are optional: an enemy without them holds position while patrolling.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct EnemySpawn {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub waypoint_a: Option<(f32, f32)>,
    #[serde(default)]
    pub waypoint_b: Option<(f32, f32)>,
}

/// Static level geometry: ground membership tests for the physics probes plus
/// spawn/waypoint lookups for the actors. The simulation never mutates it.
#[derive(Resource, Clone, Serialize, Deserialize, Default)]
pub struct Tilemap {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<u8>,
    pub player_spawn: (f32, f32),
    #[serde(default)]
    pub enemy_spawns: Vec<EnemySpawn>,
}

impl Tilemap {
    pub fn get_tile(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return TileType::Empty as u8;
        }
        self.tiles[y as usize * self.width + x as usize]
    }

    pub fn get(&self, x: i32, y: i32) -> TileType {
        TileType::from_u8(self.get_tile(x, y))
    }

    pub fn set(&mut self, x: i32, y: i32, tile: TileType) {
        if x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32 {
            self.tiles[y as usize * self.width + x as usize] = tile as u8;
        }
    }

    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_solid()
    }

    /// A small arena for the demo binary and scenario tests: flat ground, a
    /// ledge, a spike pit, a goal post and two patrolling enemies.
    pub fn demo_level() -> Self {
        let width = 40;
        let height = 12;
        let mut map = Self {
            width,
            height,
            tiles: vec![0u8; width * height],
            player_spawn: (24.0, 23.0),
            enemy_spawns: vec![
                EnemySpawn {
                    x: 200.0,
                    y: 23.0,
                    waypoint_a: Some((168.0, 23.0)),
                    waypoint_b: Some((248.0, 23.0)),
                },
                EnemySpawn {
                    x: 420.0,
                    y: 23.0,
                    waypoint_a: Some((390.0, 23.0)),
                    waypoint_b: Some((470.0, 23.0)),
                },
            ],
        };

        // Ground floor
        for x in 0..width as i32 {
            map.set(x, 0, TileType::Solid);
        }
        // Spike pit with a ledge to clear it
        for x in 18..21 {
            map.set(x, 1, TileType::Spike);
        }
        for x in 16..18 {
            map.set(x, 3, TileType::Solid);
        }
        // Goal post near the right edge
        map.set(width as i32 - 3, 1, TileType::Goal);
        map
    }

    /// Load a level from `KWONDO_LEVEL`, falling back to the demo arena.
    pub fn load_or_demo() -> Self {
        let Some(path) = std::env::var("KWONDO_LEVEL").ok().filter(|s| !s.is_empty()) else {
            return Self::demo_level();
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Tilemap>(&contents) {
                Ok(map) => {
                    println!("[kwondo] Loaded level from {}", path);
                    map
                }
                Err(e) => {
                    eprintln!("[kwondo] Failed to parse {}: {}", path, e);
                    Self::demo_level()
                }
            },
            Err(e) => {
                eprintln!("[kwondo] Failed to read {}: {}", path, e);
                Self::demo_level()
            }
        }
    }
}
