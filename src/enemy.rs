use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::components::{
    Collider, Enemy, Faction, Facing, GamePosition, GravityBody, Grounded, NextActorId, Player,
    Velocity,
};
use crate::config::{EnemyTuning, GameConfig, StunRecovery};
use crate::health::Health;
use crate::tilemap::{EnemySpawn, Tilemap};
use crate::timer::Countdown;
use crate::SimSet;

const ENEMY_WIDTH: f32 = 12.0;
const ENEMY_HEIGHT: f32 = 14.0;

/// Seeded RNG for the AI's randomized idle durations. Seeding it from the
/// config keeps identically-configured runs bit-identical.
#[derive(Resource)]
pub struct AiRng(pub SmallRng);

impl AiRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

/// Enemy behavior state. Exactly one is active per enemy; per-state working
/// data (timers, waypoint index, strike bookkeeping) lives in the variant so
/// it cannot leak across states.
///
/// Defeated is terminal: nothing transitions out of it, the actor just waits
/// out its removal delay and despawns.
#[derive(Component, Clone, Debug)]
pub enum EnemyState {
    Idle { wait: Countdown },
    Patrol { waypoint: usize },
    Chase,
    Attack { swing: Countdown, duration: f32, dealt: bool },
    Stunned { recover: Countdown },
    Defeated { removal: Countdown },
}

impl EnemyState {
    pub fn idle(rng: &mut SmallRng, tuning: &EnemyTuning) -> Self {
        Self::Idle {
            wait: Countdown::running(roll_idle_duration(rng, tuning)),
        }
    }

    pub fn stunned(tuning: &EnemyTuning) -> Self {
        Self::Stunned {
            recover: Countdown::running(tuning.stun_duration),
        }
    }

    pub fn defeated(tuning: &EnemyTuning) -> Self {
        Self::Defeated {
            removal: Countdown::running(tuning.defeat_removal_delay),
        }
    }

    pub fn is_stunned(&self) -> bool {
        matches!(self, Self::Stunned { .. })
    }

    pub fn is_defeated(&self) -> bool {
        matches!(self, Self::Defeated { .. })
    }
}

/// The two patrol waypoints from the level data. Either may be missing, in
/// which case patrolling holds position instead of failing.
#[derive(Component, Clone, Debug, Default)]
pub struct PatrolRoute {
    pub a: Option<(f32, f32)>,
    pub b: Option<(f32, f32)>,
}

impl PatrolRoute {
    pub fn point(&self, index: usize) -> Option<(f32, f32)> {
        if index % 2 == 0 {
            self.a
        } else {
            self.b
        }
    }

    /// Index of the geometrically nearer waypoint, the target on (re)entry to
    /// Patrol.
    pub fn nearer_index(&self, pos: &GamePosition) -> usize {
        match (self.a, self.b) {
            (Some(a), Some(b)) => {
                let da = (a.0 - pos.x).powi(2) + (a.1 - pos.y).powi(2);
                let db = (b.0 - pos.x).powi(2) + (b.1 - pos.y).powi(2);
                usize::from(db < da)
            }
            (None, Some(_)) => 1,
            _ => 0,
        }
    }
}

/// Horizontal movement the state wants this tick. `Brake` bleeds off
/// residual velocity (knockback shove) instead of zeroing it outright.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum Drive {
    Stop,
    Brake,
    Toward { x: f32, speed: f32 },
}

/// Per-tick horizontal decay while stunned, so a knockback impulse carries
/// the enemy a short visible distance before it stops.
const STUN_FRICTION: f32 = 0.8;

/// One guard-evaluation tick for a single enemy, pure so the transition table
/// is testable in isolation. Runs on the previous tick's positions. The
/// Attack swing timer is ticked by the strike system during hit resolution,
/// not here; this only leaves Attack once the swing has played out.
pub(crate) fn tick_enemy_state(
    state: EnemyState,
    pos: &GamePosition,
    player: Option<&GamePosition>,
    route: &PatrolRoute,
    tuning: &EnemyTuning,
    rng: &mut SmallRng,
    dt: f32,
) -> (EnemyState, Drive, bool) {
    let distance = player.map_or(f32::INFINITY, |p| pos.distance_to(p));

    match state {
        EnemyState::Idle { mut wait } => {
            if distance <= tuning.detection_radius {
                (EnemyState::Chase, Drive::Stop, false)
            } else if !wait.tick(dt) {
                (
                    EnemyState::Patrol {
                        waypoint: route.nearer_index(pos),
                    },
                    Drive::Stop,
                    false,
                )
            } else {
                (EnemyState::Idle { wait }, Drive::Stop, false)
            }
        }

        EnemyState::Patrol { waypoint } => {
            if distance <= tuning.detection_radius {
                return (EnemyState::Chase, Drive::Stop, false);
            }
            match route.point(waypoint) {
                // No waypoints configured: hold position, stay patrolling.
                None => (EnemyState::Patrol { waypoint }, Drive::Stop, false),
                Some((wx, _)) => {
                    if (wx - pos.x).abs() < tuning.waypoint_epsilon {
                        (
                            EnemyState::Patrol {
                                waypoint: waypoint ^ 1,
                            },
                            Drive::Stop,
                            false,
                        )
                    } else {
                        (
                            EnemyState::Patrol { waypoint },
                            Drive::Toward {
                                x: wx,
                                speed: tuning.patrol_speed,
                            },
                            false,
                        )
                    }
                }
            }
        }

        EnemyState::Chase => match player {
            None => (
                EnemyState::Patrol {
                    waypoint: route.nearer_index(pos),
                },
                Drive::Stop,
                false,
            ),
            Some(p) => {
                if distance <= tuning.attack_range {
                    (
                        EnemyState::Attack {
                            swing: Countdown::running(tuning.attack_duration),
                            duration: tuning.attack_duration,
                            dealt: false,
                        },
                        Drive::Stop,
                        false,
                    )
                } else if distance > tuning.detection_radius * tuning.chase_exit_multiplier {
                    // Hysteresis band: the exit threshold is wider than the
                    // entry threshold, so the state cannot flicker at the
                    // detection boundary.
                    (
                        EnemyState::Patrol {
                            waypoint: route.nearer_index(pos),
                        },
                        Drive::Stop,
                        false,
                    )
                } else {
                    (
                        EnemyState::Chase,
                        Drive::Toward {
                            x: p.x,
                            speed: tuning.chase_speed,
                        },
                        false,
                    )
                }
            }
        },

        EnemyState::Attack {
            swing,
            duration,
            dealt,
        } => {
            if swing.is_expired() {
                (EnemyState::Chase, Drive::Stop, false)
            } else {
                (
                    EnemyState::Attack {
                        swing,
                        duration,
                        dealt,
                    },
                    Drive::Stop,
                    false,
                )
            }
        }

        EnemyState::Stunned { mut recover } => {
            if !recover.tick(dt) {
                let next = match tuning.stun_recovery {
                    StunRecovery::Chase => EnemyState::Chase,
                    StunRecovery::Idle => EnemyState::idle(rng, tuning),
                };
                (next, Drive::Stop, false)
            } else {
                (EnemyState::Stunned { recover }, Drive::Brake, false)
            }
        }

        EnemyState::Defeated { mut removal } => {
            let expired = !removal.tick(dt);
            (EnemyState::Defeated { removal }, Drive::Stop, expired)
        }
    }
}

fn roll_idle_duration(rng: &mut SmallRng, tuning: &EnemyTuning) -> f32 {
    let min = tuning.idle_duration_min.max(0.0);
    let max = tuning.idle_duration_max;
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

pub struct EnemyAiPlugin;

impl Plugin for EnemyAiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedPreUpdate,
            enemy_ai
                .in_set(SimSet::Decide)
                .run_if(crate::game_runtime::gameplay_systems_enabled),
        );
    }
}

fn enemy_ai(
    mut commands: Commands,
    config: Res<GameConfig>,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<AiRng>,
    players: Query<&GamePosition, (With<Player>, Without<Enemy>)>,
    mut enemies: Query<
        (
            Entity,
            &GamePosition,
            &mut EnemyState,
            &mut Velocity,
            &mut Facing,
            &PatrolRoute,
            Option<&Collider>,
        ),
        With<Enemy>,
    >,
) {
    let dt = time.delta_secs();
    let player_pos = players.iter().next().copied();

    for (entity, pos, mut state, mut vel, mut facing, route, collider) in enemies.iter_mut() {
        let (next, drive, remove) = tick_enemy_state(
            state.clone(),
            pos,
            player_pos.as_ref(),
            route,
            &config.enemy,
            &mut rng.0,
            dt,
        );
        *state = next;

        match drive {
            Drive::Stop => vel.x = 0.0,
            Drive::Brake => {
                vel.x *= STUN_FRICTION;
                if vel.x.abs() < 0.5 {
                    vel.x = 0.0;
                }
            }
            Drive::Toward { x, speed } => {
                let dx = x - pos.x;
                vel.x = if dx.abs() <= 1.0 { 0.0 } else { dx.signum() * speed };
                if vel.x.abs() > 0.1 {
                    facing.0 = vel.x.signum();
                }
            }
        }

        if state.is_defeated() && collider.is_some() {
            // Corpses stop colliding: dropping the Collider removes them from
            // the spatial index and every overlap query.
            commands.entity(entity).remove::<Collider>();
        }
        if remove {
            commands.entity(entity).despawn();
        }
    }
}

/// Spawn one enemy from its level record.
pub fn spawn_enemy(world: &mut World, spawn: &EnemySpawn) -> Entity {
    let tuning = world.resource::<GameConfig>().enemy.clone();
    let initial_state = {
        let mut rng = world.resource_mut::<AiRng>();
        EnemyState::idle(&mut rng.0, &tuning)
    };
    let actor_id = world.resource_mut::<NextActorId>().allocate();
    world
        .spawn((
            actor_id,
            Enemy,
            Faction::Enemy,
            GamePosition {
                x: spawn.x,
                y: spawn.y,
            },
            Velocity::default(),
            Facing::default(),
            Collider {
                width: ENEMY_WIDTH,
                height: ENEMY_HEIGHT,
            },
            Grounded(false),
            GravityBody,
            Health::new(tuning.max_health),
            initial_state,
            PatrolRoute {
                a: spawn.waypoint_a,
                b: spawn.waypoint_b,
            },
        ))
        .id()
}

/// Spawn every enemy the level defines.
pub fn spawn_enemies(world: &mut World) -> Vec<Entity> {
    let spawns = world.resource::<Tilemap>().enemy_spawns.clone();
    spawns
        .iter()
        .map(|spawn| spawn_enemy(world, spawn))
        .collect()
}
