use bevy::prelude::*;

use crate::components::{
    ActorId, Collider, Enemy, Faction, Facing, GamePosition, Player, Velocity,
};
use crate::config::{AttackSpec, EnemyTuning, GameConfig};
use crate::enemy::EnemyState;
use crate::events::{
    GameEventBus, EVENT_ATTACK_PERFORMED, EVENT_DAMAGED, EVENT_DEFEATED, EVENT_GOAL_REACHED,
};
use crate::health::{DamageOutcome, Health};
use crate::input::PlayerInput;
use crate::physics_core::{collides_tile_type, Aabb};
use crate::spatial_hash::SpatialHash;
use crate::tilemap::{TileType, Tilemap};
use crate::timer::Countdown;
use crate::SimSet;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AttackKind {
    Punch,
    Kick,
    Stomp,
}

impl AttackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AttackKind::Punch => "punch",
            AttackKind::Kick => "kick",
            AttackKind::Stomp => "stomp",
        }
    }
}

/// Per-type, per-actor attack cooldowns. Independent: a punch on cooldown
/// never blocks a kick.
#[derive(Component, Clone, Debug, Default)]
pub struct AttackCooldowns {
    punch: Countdown,
    kick: Countdown,
    stomp: Countdown,
}

impl AttackCooldowns {
    pub fn slot_mut(&mut self, kind: AttackKind) -> &mut Countdown {
        match kind {
            AttackKind::Punch => &mut self.punch,
            AttackKind::Kick => &mut self.kick,
            AttackKind::Stomp => &mut self.stomp,
        }
    }

    pub fn is_ready(&self, kind: AttackKind) -> bool {
        match kind {
            AttackKind::Punch => self.punch.is_expired(),
            AttackKind::Kick => self.kick.is_expired(),
            AttackKind::Stomp => self.stomp.is_expired(),
        }
    }

    pub fn tick_all(&mut self, dt: f32) {
        self.punch.tick(dt);
        self.kick.tick(dt);
        self.stomp.tick(dt);
    }
}

/// Hitbox center for a melee attack: the horizontal offset is mirrored by the
/// facing sign so the box always projects forward.
pub fn hitbox_center(pos: &GamePosition, facing: f32, spec: &AttackSpec) -> (f32, f32) {
    (pos.x + spec.offset_x * facing.signum(), pos.y + spec.offset_y)
}

/// Knockback impulse along the attacker→target vector.
fn apply_knockback(vel: &mut Velocity, from: &GamePosition, to: &GamePosition, magnitude: f32) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = if len > 1e-3 {
        (dx / len, dy / len)
    } else {
        (1.0, 0.0)
    };
    vel.x += nx * magnitude;
    vel.y += ny * magnitude;
}

/// Damage the player through the Health contract. Survivable hits start the
/// invincibility window; the defeat notification single-fires because a dead
/// Health ignores all further calls.
fn damage_player(
    health: &mut Health,
    actor: &ActorId,
    amount: i32,
    invincibility_duration: f32,
    bus: &mut GameEventBus,
) -> bool {
    let outcome = health.take_damage(amount);
    match outcome {
        DamageOutcome::Ignored => return false,
        DamageOutcome::Damaged => health.start_invincibility(invincibility_duration),
        DamageOutcome::Defeated => {}
    }
    bus.emit(
        EVENT_DAMAGED,
        serde_json::json!({
            "actor": actor.0,
            "faction": Faction::Player.as_str(),
            "amount": amount,
            "health": health.current(),
        }),
        Some(actor.0),
    );
    if outcome == DamageOutcome::Defeated {
        bus.emit(
            EVENT_DEFEATED,
            serde_json::json!({ "actor": actor.0, "faction": Faction::Player.as_str() }),
            Some(actor.0),
        );
    }
    true
}

/// Damage an enemy. Any surviving hit preempts the current AI state into
/// Stunned (unless it is already stunned); a lethal hit enters the terminal
/// Defeated state. Defeated enemies ignore damage entirely via Health.
fn damage_enemy(
    health: &mut Health,
    state: &mut EnemyState,
    actor: &ActorId,
    amount: i32,
    tuning: &EnemyTuning,
    bus: &mut GameEventBus,
) -> bool {
    let outcome = health.take_damage(amount);
    match outcome {
        DamageOutcome::Ignored => return false,
        DamageOutcome::Damaged => {
            if !state.is_stunned() && !state.is_defeated() {
                *state = EnemyState::stunned(tuning);
            }
        }
        DamageOutcome::Defeated => {
            *state = EnemyState::defeated(tuning);
        }
    }
    bus.emit(
        EVENT_DAMAGED,
        serde_json::json!({
            "actor": actor.0,
            "faction": Faction::Enemy.as_str(),
            "amount": amount,
            "health": health.current(),
        }),
        Some(actor.0),
    );
    if outcome == DamageOutcome::Defeated {
        bus.emit(
            EVENT_DEFEATED,
            serde_json::json!({ "actor": actor.0, "faction": Faction::Enemy.as_str() }),
            Some(actor.0),
        );
    }
    true
}

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            tick_attack_cooldowns
                .in_set(SimSet::Timers)
                .run_if(crate::game_runtime::gameplay_systems_enabled),
        )
        .add_systems(
            FixedUpdate,
            (
                player_attacks,
                stomp_attacks,
                enemy_strikes,
                contact_damage,
                hazard_damage,
                check_goal,
            )
                .chain()
                .in_set(SimSet::Combat)
                .run_if(crate::game_runtime::gameplay_systems_enabled),
        );
    }
}

fn tick_attack_cooldowns(time: Res<Time<Fixed>>, mut query: Query<&mut AttackCooldowns>) {
    let dt = time.delta_secs();
    for mut cooldowns in query.iter_mut() {
        cooldowns.tick_all(dt);
    }
}

type AttackTargetItem<'a> = (
    &'a GamePosition,
    &'a Collider,
    &'a Faction,
    &'a ActorId,
    &'a mut Health,
    &'a mut Velocity,
    &'a mut EnemyState,
);

fn player_attacks(
    config: Res<GameConfig>,
    spatial: Res<SpatialHash>,
    input: Res<PlayerInput>,
    mut bus: ResMut<GameEventBus>,
    mut attackers: Query<
        (
            Entity,
            &GamePosition,
            &Facing,
            &Faction,
            &ActorId,
            &mut AttackCooldowns,
        ),
        With<Player>,
    >,
    mut targets: Query<AttackTargetItem<'_>, (With<Enemy>, Without<Player>)>,
) {
    let requested: &[(AttackKind, bool)] =
        &[(AttackKind::Punch, input.punch), (AttackKind::Kick, input.kick)];

    for (attacker, pos, facing, faction, actor, mut cooldowns) in attackers.iter_mut() {
        for &(kind, triggered) in requested {
            if !triggered {
                continue;
            }
            // On cooldown: the request is dropped and the timer is NOT
            // restarted.
            if !cooldowns.is_ready(kind) {
                continue;
            }
            let spec = match kind {
                AttackKind::Punch => &config.attacks.punch,
                AttackKind::Kick => &config.attacks.kick,
                // Stomps are collision-triggered, never requested here.
                AttackKind::Stomp => continue,
            };
            cooldowns.slot_mut(kind).start(spec.cooldown);

            let (hx, hy) = hitbox_center(pos, facing.0, spec);
            let hitbox = Aabb::from_center(hx, hy, spec.width, spec.height);
            for candidate in spatial.query_rect(hitbox.min_x, hitbox.min_y, hitbox.max_x, hitbox.max_y)
            {
                if candidate == attacker {
                    continue;
                }
                let Ok((tpos, tcol, tfaction, tid, mut thealth, mut tvel, mut tstate)) =
                    targets.get_mut(candidate)
                else {
                    continue;
                };
                if *tfaction == *faction {
                    continue;
                }
                let target_box = Aabb::from_center(tpos.x, tpos.y, tcol.width, tcol.height);
                if !hitbox.overlaps(&target_box) {
                    continue;
                }
                if damage_enemy(
                    &mut thealth,
                    &mut tstate,
                    tid,
                    spec.damage,
                    &config.enemy,
                    &mut bus,
                ) {
                    // Stop, then shove: the stun entry kills prior motion and
                    // the knockback impulse carries from there.
                    *tvel = Velocity::default();
                    apply_knockback(&mut tvel, pos, tpos, spec.knockback);
                }
            }

            bus.emit(
                EVENT_ATTACK_PERFORMED,
                serde_json::json!({ "actor": actor.0, "attack": kind.as_str() }),
                Some(actor.0),
            );
        }
    }
}

/// Stomp: not input-triggered. A downward collision with an enemy from above
/// deals stomp damage, forces the attacker's vertical velocity to the bounce
/// speed for this tick, and stuns the target.
fn stomp_attacks(
    config: Res<GameConfig>,
    spatial: Res<SpatialHash>,
    mut bus: ResMut<GameEventBus>,
    mut players: Query<
        (
            Entity,
            &GamePosition,
            &Collider,
            &mut Velocity,
            &ActorId,
            &mut AttackCooldowns,
        ),
        With<Player>,
    >,
    mut enemies: Query<
        (
            &GamePosition,
            &Collider,
            &mut Health,
            &mut EnemyState,
            &mut Velocity,
            &ActorId,
        ),
        (With<Enemy>, Without<Player>),
    >,
) {
    let stomp = &config.attacks.stomp;
    for (player, pos, collider, mut vel, actor, mut cooldowns) in players.iter_mut() {
        if vel.y > stomp.falling_threshold {
            continue;
        }
        if !cooldowns.is_ready(AttackKind::Stomp) {
            continue;
        }
        let body = Aabb::from_center(pos.x, pos.y, collider.width, collider.height);
        let mut connected = false;
        for candidate in spatial.query_rect(body.min_x, body.min_y, body.max_x, body.max_y) {
            if candidate == player {
                continue;
            }
            let Ok((epos, ecol, mut ehealth, mut estate, mut evel, eid)) =
                enemies.get_mut(candidate)
            else {
                continue;
            };
            if !ehealth.is_alive() || pos.y <= epos.y {
                continue;
            }
            let enemy_box = Aabb::from_center(epos.x, epos.y, ecol.width, ecol.height);
            if !body.overlaps(&enemy_box) {
                continue;
            }
            if damage_enemy(
                &mut ehealth,
                &mut estate,
                eid,
                stomp.damage,
                &config.enemy,
                &mut bus,
            ) {
                // A lethal stomp already moved the state to Defeated;
                // otherwise damage_enemy stunned it. Either way it stops dead.
                *evel = Velocity::default();
                connected = true;
            }
        }
        if connected {
            cooldowns.slot_mut(AttackKind::Stomp).start(stomp.cooldown);
            vel.y = stomp.bounce_speed;
            bus.emit(
                EVENT_ATTACK_PERFORMED,
                serde_json::json!({ "actor": actor.0, "attack": AttackKind::Stomp.as_str() }),
                Some(actor.0),
            );
        }
    }
}

/// Plays out the Attack swing for enemies: at the midpoint of the swing the
/// strike lands once per episode, re-checking range in case the player moved.
fn enemy_strikes(
    config: Res<GameConfig>,
    time: Res<Time<Fixed>>,
    mut bus: ResMut<GameEventBus>,
    mut enemies: Query<(&GamePosition, &mut EnemyState, &ActorId), With<Enemy>>,
    mut players: Query<(&GamePosition, &mut Health, &ActorId), (With<Player>, Without<Enemy>)>,
) {
    let dt = time.delta_secs();
    let mut player_iter = players.iter_mut();
    let Some((player_pos, mut player_health, player_id)) = player_iter.next() else {
        return;
    };
    let player_pos = *player_pos;

    for (pos, mut state, actor) in enemies.iter_mut() {
        let EnemyState::Attack {
            swing,
            duration,
            dealt,
        } = &mut *state
        else {
            continue;
        };
        swing.tick(dt);
        if !*dealt && swing.remaining() <= *duration * 0.5 {
            *dealt = true;
            if pos.distance_to(&player_pos) <= config.enemy.attack_range {
                damage_player(
                    &mut player_health,
                    player_id,
                    config.enemy.attack_damage,
                    config.invincibility_duration,
                    &mut bus,
                );
                bus.emit(
                    EVENT_ATTACK_PERFORMED,
                    serde_json::json!({ "actor": actor.0, "attack": "strike" }),
                    Some(actor.0),
                );
            }
        }
    }
}

/// Touching a live enemy hurts: contact damage with a horizontal shove, gated
/// by the player's invincibility window. Stunned and defeated enemies are
/// safe to touch, which is what makes stomping viable.
fn contact_damage(
    config: Res<GameConfig>,
    mut bus: ResMut<GameEventBus>,
    enemies: Query<(&GamePosition, &Collider, &Health, &EnemyState), (With<Enemy>, Without<Player>)>,
    mut players: Query<
        (&GamePosition, &Collider, &mut Health, &mut Velocity, &ActorId),
        With<Player>,
    >,
) {
    for (pos, collider, mut health, mut vel, actor) in players.iter_mut() {
        let body = Aabb::from_center(pos.x, pos.y, collider.width, collider.height);
        for (epos, ecol, ehealth, estate) in enemies.iter() {
            if !ehealth.is_alive() || estate.is_stunned() || estate.is_defeated() {
                continue;
            }
            let enemy_box = Aabb::from_center(epos.x, epos.y, ecol.width, ecol.height);
            if !body.overlaps(&enemy_box) {
                continue;
            }
            if damage_player(
                &mut health,
                actor,
                config.enemy.contact_damage,
                config.invincibility_duration,
                &mut bus,
            ) {
                vel.x += (pos.x - epos.x).signum() * config.enemy.contact_knockback;
            }
        }
    }
}

type HazardTargetItem<'a> = (
    &'a GamePosition,
    &'a Collider,
    &'a Faction,
    &'a ActorId,
    &'a mut Health,
    Option<&'a mut EnemyState>,
);

/// Spike tiles are an environmental hazard feeding the same Health contract
/// as combat damage.
fn hazard_damage(
    config: Res<GameConfig>,
    tilemap: Option<Res<Tilemap>>,
    mut bus: ResMut<GameEventBus>,
    mut actors: Query<HazardTargetItem<'_>>,
) {
    let Some(tilemap) = tilemap else {
        return;
    };
    for (pos, collider, faction, actor, mut health, state) in actors.iter_mut() {
        let body = Aabb::from_center(pos.x, pos.y, collider.width, collider.height);
        if !collides_tile_type(&tilemap, config.tile_size, &body, TileType::Spike) {
            continue;
        }
        match (faction, state) {
            (Faction::Enemy, Some(mut state)) => {
                damage_enemy(
                    &mut health,
                    &mut state,
                    actor,
                    config.hazard_damage,
                    &config.enemy,
                    &mut bus,
                );
            }
            _ => {
                damage_player(
                    &mut health,
                    actor,
                    config.hazard_damage,
                    config.invincibility_duration,
                    &mut bus,
                );
            }
        }
    }
}

/// Goal tile reached. The runtime state flips to LevelComplete on this event,
/// which stops gameplay systems, so the notification cannot double-fire.
fn check_goal(
    config: Res<GameConfig>,
    tilemap: Option<Res<Tilemap>>,
    mut bus: ResMut<GameEventBus>,
    players: Query<(&GamePosition, &Collider, &ActorId), With<Player>>,
) {
    let Some(tilemap) = tilemap else {
        return;
    };
    for (pos, collider, actor) in players.iter() {
        let body = Aabb::from_center(pos.x, pos.y, collider.width, collider.height);
        if collides_tile_type(&tilemap, config.tile_size, &body, TileType::Goal) {
            bus.emit(
                EVENT_GOAL_REACHED,
                serde_json::json!({ "actor": actor.0 }),
                Some(actor.0),
            );
        }
    }
}
