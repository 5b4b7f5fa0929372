use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// All tuning constants as a resource so they can be loaded and tweaked
/// without recompiling. The qualitative behavior is fixed; these numbers are
/// deliberately configuration, not invariants.
#[derive(Resource, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the simulation RNG (idle-duration rolls).
    pub seed: u64,
    pub tile_size: f32,
    pub player_max_health: i32,
    /// Invincibility window started after the player survives a hit.
    pub invincibility_duration: f32,
    /// Damage per tick while standing in a spike tile.
    pub hazard_damage: i32,
    pub movement: MovementTuning,
    pub attacks: AttackTable,
    pub enemy: EnemyTuning,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    pub move_speed: f32,
    /// Seconds to accelerate from standstill to `move_speed`.
    pub accel_time: f32,
    /// Seconds to brake from `move_speed` to standstill.
    pub decel_time: f32,
    /// Acceleration multiplier while airborne.
    pub air_control: f32,
    pub gravity: f32,
    /// Gravity multiplier while descending (snappier fall).
    pub fall_multiplier: f32,
    /// Gravity multiplier while rising with the jump button released.
    pub low_jump_multiplier: f32,
    pub jump_velocity: f32,
    /// Upward velocity scale applied once when the jump is released mid-rise.
    pub jump_cut_multiplier: f32,
    /// Total jump budget; 1 disables the double jump.
    pub max_jumps: u32,
    pub coyote_time: f32,
    pub jump_buffer_time: f32,
}

/// Melee attack geometry and effect. The hitbox is centered on
/// `position + (offset_x * facing, offset_y)`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackSpec {
    pub offset_x: f32,
    pub offset_y: f32,
    pub width: f32,
    pub height: f32,
    pub damage: i32,
    pub knockback: f32,
    pub cooldown: f32,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StompSpec {
    pub damage: i32,
    /// Upward velocity forced on the attacker after a stomp connects.
    pub bounce_speed: f32,
    /// A stomp only triggers while falling at least this fast (negative vy).
    pub falling_threshold: f32,
    pub cooldown: f32,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackTable {
    pub punch: AttackSpec,
    pub kick: AttackSpec,
    pub stomp: StompSpec,
}

/// Which state a stunned enemy recovers into. The source iterations disagree,
/// so it is a policy choice.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StunRecovery {
    Chase,
    Idle,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub max_health: i32,
    pub contact_damage: i32,
    pub contact_knockback: f32,
    pub detection_radius: f32,
    /// Chase exits at `detection_radius * chase_exit_multiplier` — the
    /// hysteresis band preventing flicker at the detection boundary.
    pub chase_exit_multiplier: f32,
    pub attack_range: f32,
    pub attack_duration: f32,
    pub attack_damage: i32,
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub idle_duration_min: f32,
    pub idle_duration_max: f32,
    pub waypoint_epsilon: f32,
    pub stun_duration: f32,
    pub defeat_removal_delay: f32,
    pub stun_recovery: StunRecovery,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            tile_size: 16.0,
            player_max_health: 3,
            invincibility_duration: 1.0,
            hazard_damage: 1,
            movement: MovementTuning::default(),
            attacks: AttackTable::default(),
            enemy: EnemyTuning::default(),
        }
    }
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            move_speed: 200.0,
            accel_time: 0.15,
            decel_time: 0.1,
            air_control: 0.7,
            gravity: 980.0,
            fall_multiplier: 1.8,
            low_jump_multiplier: 1.5,
            jump_velocity: 400.0,
            jump_cut_multiplier: 0.5,
            max_jumps: 2,
            coyote_time: 0.1,
            jump_buffer_time: 0.12,
        }
    }
}

impl Default for AttackSpec {
    fn default() -> Self {
        Self {
            offset_x: 10.0,
            offset_y: 0.0,
            width: 8.0,
            height: 7.0,
            damage: 10,
            knockback: 150.0,
            cooldown: 0.35,
        }
    }
}

impl Default for StompSpec {
    fn default() -> Self {
        Self {
            damage: 20,
            bounce_speed: 280.0,
            falling_threshold: -40.0,
            cooldown: 0.2,
        }
    }
}

impl Default for AttackTable {
    fn default() -> Self {
        Self {
            punch: AttackSpec::default(),
            kick: AttackSpec {
                offset_x: 8.0,
                offset_y: -2.0,
                width: 11.0,
                height: 9.0,
                damage: 15,
                knockback: 210.0,
                cooldown: 0.5,
            },
            stomp: StompSpec::default(),
        }
    }
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            max_health: 30,
            contact_damage: 1,
            contact_knockback: 120.0,
            detection_radius: 80.0,
            chase_exit_multiplier: 1.5,
            attack_range: 20.0,
            attack_duration: 0.5,
            attack_damage: 1,
            patrol_speed: 40.0,
            chase_speed: 70.0,
            idle_duration_min: 1.0,
            idle_duration_max: 3.0,
            waypoint_epsilon: 2.0,
            stun_duration: 2.0,
            defeat_removal_delay: 2.0,
            stun_recovery: StunRecovery::Chase,
        }
    }
}

impl GameConfig {
    /// Load from `KWONDO_CONFIG` (or `game.json`), falling back to defaults.
    /// Unknown files are not fatal; a partial file overrides only the fields
    /// it names.
    pub fn load_or_default() -> Self {
        let path = std::env::var("KWONDO_CONFIG")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "game.json".to_string());
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<GameConfig>(&contents) {
                Ok(cfg) => {
                    println!("[kwondo] Loaded config from {}", path);
                    cfg
                }
                Err(e) => {
                    eprintln!("[kwondo] Failed to parse {}: {}", path, e);
                    GameConfig::default()
                }
            },
            Err(_) => GameConfig::default(),
        }
    }
}
