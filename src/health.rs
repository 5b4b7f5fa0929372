use bevy::prelude::*;

use crate::timer::Countdown;
use crate::SimSet;

/// What a `take_damage` call actually did. Callers use this to decide which
/// notifications to emit and which reactions to trigger.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DamageOutcome {
    /// Dead, invincible, or a non-positive amount: nothing changed.
    Ignored,
    Damaged,
    /// Health reached zero on this call. Returned at most once per actor.
    Defeated,
}

/// Integer health with an invincibility window.
///
/// Invariants: `0 <= current <= max`; once `current` hits zero the actor is
/// permanently not alive — every later `take_damage` is ignored, which is
/// what guarantees the defeat notification single-fires.
#[derive(Component, Clone, Debug)]
pub struct Health {
    current: i32,
    max: i32,
    invincibility: Countdown,
}

impl Health {
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self {
            current: max,
            max,
            invincibility: Countdown::expired(),
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility.is_running()
    }

    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if amount <= 0 || !self.is_alive() || self.is_invincible() {
            return DamageOutcome::Ignored;
        }
        self.current = (self.current - amount).max(0);
        if self.current == 0 {
            DamageOutcome::Defeated
        } else {
            DamageOutcome::Damaged
        }
    }

    pub fn heal(&mut self, amount: i32) {
        if amount <= 0 || !self.is_alive() {
            return;
        }
        self.current = (self.current + amount).min(self.max);
    }

    pub fn start_invincibility(&mut self, duration: f32) {
        self.invincibility.start(duration);
    }

    pub fn tick_invincibility(&mut self, dt: f32) {
        self.invincibility.tick(dt);
    }
}

pub struct HealthPlugin;

impl Plugin for HealthPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            tick_invincibility
                .in_set(SimSet::Timers)
                .run_if(crate::game_runtime::gameplay_systems_enabled),
        );
    }
}

fn tick_invincibility(time: Res<Time<Fixed>>, mut query: Query<&mut Health>) {
    let dt = time.delta_secs();
    for mut health in query.iter_mut() {
        health.tick_invincibility(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_clamps_at_zero() {
        let mut health = Health::new(3);
        assert_eq!(health.take_damage(2), DamageOutcome::Damaged);
        assert_eq!(health.current(), 1);
        assert_eq!(health.take_damage(10), DamageOutcome::Defeated);
        assert_eq!(health.current(), 0);
        assert!(!health.is_alive());
    }

    #[test]
    fn defeated_fires_exactly_once() {
        let mut health = Health::new(1);
        assert_eq!(health.take_damage(1), DamageOutcome::Defeated);
        assert_eq!(health.take_damage(1), DamageOutcome::Ignored);
        assert_eq!(health.take_damage(100), DamageOutcome::Ignored);
        assert_eq!(health.current(), 0);
    }

    #[test]
    fn invincibility_window_blocks_damage() {
        let mut health = Health::new(3);
        health.take_damage(1);
        health.start_invincibility(1.0);
        health.tick_invincibility(0.5);
        assert_eq!(health.take_damage(1), DamageOutcome::Ignored);
        assert_eq!(health.current(), 2);
        health.tick_invincibility(0.6);
        assert_eq!(health.take_damage(1), DamageOutcome::Damaged);
        assert_eq!(health.current(), 1);
    }

    #[test]
    fn heal_clamps_at_max_and_ignores_the_dead() {
        let mut health = Health::new(3);
        health.take_damage(2);
        health.heal(5);
        assert_eq!(health.current(), 3);
        health.take_damage(3);
        health.heal(1);
        assert_eq!(health.current(), 0);
        assert!(!health.is_alive());
    }

    #[test]
    fn non_positive_amounts_are_no_ops() {
        let mut health = Health::new(3);
        assert_eq!(health.take_damage(0), DamageOutcome::Ignored);
        assert_eq!(health.take_damage(-4), DamageOutcome::Ignored);
        health.heal(0);
        health.heal(-2);
        assert_eq!(health.current(), 3);
    }
}
