/// Countdown timer decremented explicitly once per simulation tick.
///
/// Every delayed behavior in the core (attack cooldowns, stun, invincibility,
/// coyote time, jump buffering, defeat removal) is one of these polled on the
/// owning entity's update — there is no suspended execution anywhere.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    /// An already-expired countdown.
    pub fn expired() -> Self {
        Self { remaining: 0.0 }
    }

    /// A countdown started at `duration` seconds.
    pub fn running(duration: f32) -> Self {
        let mut timer = Self::expired();
        timer.start(duration);
        timer
    }

    /// (Re)start the countdown. Overwrites any in-flight value; never additive.
    pub fn start(&mut self, duration: f32) {
        self.remaining = duration.max(0.0);
    }

    /// Advance by `dt` seconds, clamping at zero. Returns whether the
    /// countdown is still running afterwards.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining > 0.0 {
            self.remaining = (self.remaining - dt).max(0.0);
        }
        self.remaining > 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn is_running(&self) -> bool {
        self.remaining > 0.0
    }

    /// Force-expire the countdown.
    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_down_and_clamps_at_zero() {
        let mut timer = Countdown::running(0.1);
        assert!(timer.is_running());
        assert!(timer.tick(0.05));
        assert!((timer.remaining() - 0.05).abs() < 1e-6);
        assert!(!timer.tick(1.0));
        assert_eq!(timer.remaining(), 0.0);
        assert!(timer.is_expired());
    }

    #[test]
    fn restart_overwrites_instead_of_accumulating() {
        let mut timer = Countdown::running(1.0);
        timer.tick(0.4);
        timer.start(0.2);
        assert!((timer.remaining() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn negative_duration_is_treated_as_expired() {
        let mut timer = Countdown::expired();
        timer.start(-3.0);
        assert!(timer.is_expired());
        assert!(!timer.tick(0.016));
    }

    #[test]
    fn ticking_an_expired_timer_stays_expired() {
        let mut timer = Countdown::expired();
        assert!(!timer.tick(0.5));
        assert_eq!(timer.remaining(), 0.0);
    }
}
