use crate::components::MoveState;
use crate::config::MovementTuning;
use crate::tilemap::{TileType, Tilemap};

/// Maximum downward velocity to prevent tunneling through floors at extreme speeds.
pub const MAX_FALL_SPEED: f32 = 800.0;

#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub fn from_center(x: f32, y: f32, width: f32, height: f32) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self {
            min_x: x - hw,
            min_y: y - hh,
            max_x: x + hw,
            max_y: y + hh,
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.max_x > other.min_x
            && self.min_x < other.max_x
            && self.max_y > other.min_y
            && self.min_y < other.max_y
    }
}

#[derive(Clone, Copy)]
pub struct MotionParams {
    pub tile_size: f32,
    pub dt: f32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy)]
pub struct MotionResult {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

/// One step of horizontal control. Acceleration and braking rates are derived
/// from time-to-max-speed so the feel is identical at any fixed tick rate;
/// braking (no input) uses its own, usually quicker, rate.
pub fn horizontal_step(
    current_vx: f32,
    axis: f32,
    grounded: bool,
    tuning: &MovementTuning,
    dt: f32,
) -> f32 {
    let target = axis.clamp(-1.0, 1.0) * tuning.move_speed;
    let time_to_max = if target.abs() > 0.01 {
        tuning.accel_time
    } else {
        tuning.decel_time
    };
    let mut rate = tuning.move_speed / time_to_max.max(1e-4);
    if !grounded {
        rate *= tuning.air_control;
    }
    move_toward(current_vx, target, rate * dt)
}

fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Gravity scale for the current tick: amplified while descending, mildly
/// amplified while rising without the jump button held, nominal otherwise.
pub fn gravity_scale(vy: f32, jump_held: bool, tuning: &MovementTuning) -> f32 {
    if vy < 0.0 {
        tuning.fall_multiplier
    } else if vy > 0.0 && !jump_held {
        tuning.low_jump_multiplier
    } else {
        1.0
    }
}

pub fn apply_gravity(vy: &mut f32, grounded: bool, scale: f32, gravity: f32, dt: f32) {
    if grounded {
        return;
    }
    *vy -= gravity * scale * dt;
    *vy = vy.max(-MAX_FALL_SPEED);
}

/// Consume one jump from the budget if the buffered request can be honored.
///
/// The first jump needs ground contact or an active coyote window; air jumps
/// only need budget left after the first was spent. On success the vertical
/// velocity is set outright (not added) and both windows are cleared.
pub fn try_consume_jump(
    state: &mut MoveState,
    grounded: bool,
    vy: &mut f32,
    tuning: &MovementTuning,
) -> bool {
    if !state.jump_buffer.is_running() {
        return false;
    }
    let max_jumps = tuning.max_jumps.max(1);
    let first_jump =
        (grounded || state.coyote.is_running()) && state.jumps_remaining == max_jumps;
    let air_jump = state.jumps_remaining >= 1 && state.jumps_remaining < max_jumps;
    if !(first_jump || air_jump) {
        return false;
    }
    *vy = tuning.jump_velocity;
    state.jumps_remaining -= 1;
    state.coyote.clear();
    state.jump_buffer.clear();
    state.jump_held = true;
    true
}

/// Variable jump height: the tick the jump input is released while still
/// rising, cut the upward velocity once. An edge effect, not a force.
pub fn apply_jump_cut(state: &mut MoveState, jump_held_input: bool, vy: &mut f32, cut: f32) {
    if state.jump_held && !jump_held_input {
        if *vy > 0.0 {
            *vy *= cut;
        }
        state.jump_held = false;
    }
}

/// Move X then Y against solid tiles, snapping to the blocking tile edge and
/// zeroing the blocked velocity component.
pub fn resolve_motion(tilemap: &Tilemap, params: MotionParams) -> MotionResult {
    let MotionParams {
        tile_size,
        dt,
        x,
        y,
        vx,
        vy,
        width,
        height,
    } = params;
    let mut out_x = x;
    let mut out_y = y;
    let mut out_vx = vx;
    let mut out_vy = vy;

    let dx = vx * dt;
    let dy = vy * dt;

    let new_x = out_x + dx;
    let x_aabb = Aabb::from_center(new_x, out_y, width, height);
    if !collides_solid(tilemap, &x_aabb, tile_size) {
        out_x = new_x;
    } else {
        if dx > 0.0 {
            let tile_x = (x_aabb.max_x / tile_size).floor() as i32;
            out_x = tile_x as f32 * tile_size - width / 2.0 - 0.01;
        } else if dx < 0.0 {
            let tile_x = (x_aabb.min_x / tile_size).floor() as i32;
            out_x = (tile_x + 1) as f32 * tile_size + width / 2.0 + 0.01;
        }
        out_vx = 0.0;
    }

    let new_y = out_y + dy;
    let y_aabb = Aabb::from_center(out_x, new_y, width, height);
    if !collides_solid(tilemap, &y_aabb, tile_size) {
        out_y = new_y;
    } else {
        if dy < 0.0 {
            let tile_y = (y_aabb.min_y / tile_size).floor() as i32;
            out_y = (tile_y + 1) as f32 * tile_size + height / 2.0;
        } else if dy > 0.0 {
            let tile_y = (y_aabb.max_y / tile_size).floor() as i32;
            out_y = tile_y as f32 * tile_size - height / 2.0 - 0.01;
        }
        out_vy = 0.0;
    }

    MotionResult {
        x: out_x,
        y: out_y,
        vx: out_vx,
        vy: out_vy,
    }
}

/// Ground probe: a thin strip one half-pixel below the feet. An empty or
/// missing level reads as permanently airborne rather than crashing.
pub fn compute_grounded(
    tilemap: &Tilemap,
    tile_size: f32,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> bool {
    let check_y = y - height / 2.0 - 0.5;
    let left_x = x - width / 2.0 + 1.0;
    let right_x = x + width / 2.0 - 1.0;

    let left_tile_x = (left_x / tile_size).floor() as i32;
    let right_tile_x = (right_x / tile_size).floor() as i32;
    let tile_y = (check_y / tile_size).floor() as i32;

    for tx in left_tile_x..=right_tile_x {
        if tilemap.is_solid(tx, tile_y) {
            return true;
        }
    }
    false
}

/// Check if an actor AABB overlaps any tile of a specific type.
pub fn collides_tile_type(
    tilemap: &Tilemap,
    tile_size: f32,
    aabb: &Aabb,
    target: TileType,
) -> bool {
    let min_tx = (aabb.min_x / tile_size).floor() as i32;
    let max_tx = ((aabb.max_x - 0.01) / tile_size).floor() as i32;
    let min_ty = (aabb.min_y / tile_size).floor() as i32;
    let max_ty = ((aabb.max_y - 0.01) / tile_size).floor() as i32;

    for ty in min_ty..=max_ty {
        for tx in min_tx..=max_tx {
            if tilemap.get(tx, ty) == target {
                let tile = Aabb {
                    min_x: tx as f32 * tile_size,
                    min_y: ty as f32 * tile_size,
                    max_x: (tx + 1) as f32 * tile_size,
                    max_y: (ty + 1) as f32 * tile_size,
                };
                if aabb.overlaps(&tile) {
                    return true;
                }
            }
        }
    }
    false
}

fn collides_solid(tilemap: &Tilemap, aabb: &Aabb, tile_size: f32) -> bool {
    let min_tx = (aabb.min_x / tile_size).floor() as i32;
    let max_tx = ((aabb.max_x - 0.01) / tile_size).floor() as i32;
    let min_ty = (aabb.min_y / tile_size).floor() as i32;
    let max_ty = ((aabb.max_y - 0.01) / tile_size).floor() as i32;

    for ty in min_ty..=max_ty {
        for tx in min_tx..=max_tx {
            if tilemap.is_solid(tx, ty) {
                let tile = Aabb {
                    min_x: tx as f32 * tile_size,
                    min_y: ty as f32 * tile_size,
                    max_x: (tx + 1) as f32 * tile_size,
                    max_y: (ty + 1) as f32 * tile_size,
                };
                if aabb.overlaps(&tile) {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Countdown;

    const DT: f32 = 1.0 / 60.0;

    fn tilemap_with_tiles(width: usize, height: usize, tiles: Vec<u8>) -> Tilemap {
        Tilemap {
            width,
            height,
            tiles,
            player_spawn: (8.0, 8.0),
            enemy_spawns: Vec::new(),
        }
    }

    fn tuning() -> MovementTuning {
        MovementTuning::default()
    }

    #[test]
    fn horizontal_step_reaches_max_speed_in_accel_time() {
        let t = tuning();
        let mut vx = 0.0;
        let ticks = (t.accel_time / DT).ceil() as usize;
        for _ in 0..ticks {
            vx = horizontal_step(vx, 1.0, true, &t, DT);
        }
        assert!((vx - t.move_speed).abs() < 1e-3);
    }

    #[test]
    fn braking_uses_the_decel_rate() {
        let t = tuning();
        let braked = horizontal_step(t.move_speed, 0.0, true, &t, DT);
        let accelerated = horizontal_step(0.0, 1.0, true, &t, DT);
        // decel_time < accel_time, so one braking tick sheds more speed than
        // one accelerating tick gains.
        assert!(t.move_speed - braked > accelerated);
    }

    #[test]
    fn air_control_slows_acceleration() {
        let t = tuning();
        let on_ground = horizontal_step(0.0, 1.0, true, &t, DT);
        let airborne = horizontal_step(0.0, 1.0, false, &t, DT);
        assert!(airborne < on_ground);
    }

    #[test]
    fn gravity_scales_by_phase() {
        let t = tuning();
        assert_eq!(gravity_scale(-10.0, false, &t), t.fall_multiplier);
        assert_eq!(gravity_scale(10.0, false, &t), t.low_jump_multiplier);
        assert_eq!(gravity_scale(10.0, true, &t), 1.0);
        assert_eq!(gravity_scale(0.0, false, &t), 1.0);
    }

    #[test]
    fn fall_speed_is_clamped() {
        let t = tuning();
        let mut vy = -MAX_FALL_SPEED + 1.0;
        apply_gravity(&mut vy, false, t.fall_multiplier, t.gravity, 1.0);
        assert_eq!(vy, -MAX_FALL_SPEED);
    }

    #[test]
    fn grounded_blocks_gravity() {
        let t = tuning();
        let mut vy = 0.0;
        apply_gravity(&mut vy, true, 1.0, t.gravity, DT);
        assert_eq!(vy, 0.0);
    }

    #[test]
    fn double_jump_budget_is_honored() {
        // Grounded player with a two-jump budget: jump, air jump, then nothing.
        let t = tuning();
        let mut state = MoveState::new(t.max_jumps);
        let mut vy = 0.0;

        state.jump_buffer.start(t.jump_buffer_time);
        state.coyote.start(t.coyote_time);
        assert!(try_consume_jump(&mut state, true, &mut vy, &t));
        assert_eq!(vy, t.jump_velocity);
        assert_eq!(state.jumps_remaining, 1);
        assert!(state.coyote.is_expired() && state.jump_buffer.is_expired());

        vy = -20.0; // mid-air, falling again
        state.jump_buffer.start(t.jump_buffer_time);
        assert!(try_consume_jump(&mut state, false, &mut vy, &t));
        assert_eq!(vy, t.jump_velocity);
        assert_eq!(state.jumps_remaining, 0);

        state.jump_buffer.start(t.jump_buffer_time);
        let before = vy;
        assert!(!try_consume_jump(&mut state, false, &mut vy, &t));
        assert_eq!(vy, before);
        assert_eq!(state.jumps_remaining, 0);
        // The request was ignored, not consumed
        assert!(state.jump_buffer.is_running());
    }

    #[test]
    fn airborne_first_jump_requires_coyote() {
        let t = tuning();
        let mut state = MoveState::new(t.max_jumps);
        let mut vy = -50.0;

        // Walked off a ledge, coyote expired: full budget but no first jump.
        state.jump_buffer.start(t.jump_buffer_time);
        assert!(!try_consume_jump(&mut state, false, &mut vy, &t));

        // Within the coyote window the same request succeeds.
        state.coyote.start(t.coyote_time);
        assert!(try_consume_jump(&mut state, false, &mut vy, &t));
        assert_eq!(vy, t.jump_velocity);
    }

    #[test]
    fn expired_buffer_drops_the_request() {
        let t = tuning();
        let mut state = MoveState::new(t.max_jumps);
        let mut vy = 0.0;
        state.jump_buffer = Countdown::running(t.jump_buffer_time);
        // Let the window lapse unconsumed
        state.jump_buffer.tick(t.jump_buffer_time + 0.01);
        state.coyote.start(t.coyote_time);
        assert!(!try_consume_jump(&mut state, true, &mut vy, &t));
        assert_eq!(vy, 0.0);
    }

    #[test]
    fn jump_cut_fires_once_on_release() {
        let t = tuning();
        let mut state = MoveState::new(t.max_jumps);
        state.jump_held = true;
        let mut vy = 300.0;
        apply_jump_cut(&mut state, false, &mut vy, t.jump_cut_multiplier);
        assert_eq!(vy, 150.0);
        assert!(!state.jump_held);
        // Second release tick does nothing
        apply_jump_cut(&mut state, false, &mut vy, t.jump_cut_multiplier);
        assert_eq!(vy, 150.0);
    }

    #[test]
    fn jump_cut_ignored_while_descending() {
        let t = tuning();
        let mut state = MoveState::new(t.max_jumps);
        state.jump_held = true;
        let mut vy = -80.0;
        apply_jump_cut(&mut state, false, &mut vy, t.jump_cut_multiplier);
        assert_eq!(vy, -80.0);
        assert!(!state.jump_held);
    }

    #[test]
    fn resolve_motion_stops_at_solid_tile() {
        let mut tiles = vec![0u8; 4 * 4];
        tiles[4 + 1] = TileType::Solid as u8;
        let tilemap = tilemap_with_tiles(4, 4, tiles);
        let out = resolve_motion(
            &tilemap,
            MotionParams {
                tile_size: 16.0,
                dt: DT,
                x: 8.0,
                y: 24.0,
                vx: 300.0,
                vy: 0.0,
                width: 12.0,
                height: 14.0,
            },
        );
        assert!((out.x - 9.99).abs() < 0.01);
        assert_eq!(out.vx, 0.0);
    }

    #[test]
    fn resolve_motion_lands_on_floor() {
        let mut tiles = vec![0u8; 4 * 4];
        tiles[1] = TileType::Solid as u8;
        let tilemap = tilemap_with_tiles(4, 4, tiles);
        let out = resolve_motion(
            &tilemap,
            MotionParams {
                tile_size: 16.0,
                dt: DT,
                x: 24.0,
                y: 24.0,
                vx: 0.0,
                vy: -600.0,
                width: 12.0,
                height: 14.0,
            },
        );
        assert!((out.y - 23.0).abs() < 0.01);
        assert_eq!(out.vy, 0.0);
    }

    #[test]
    fn grounded_detects_floor_tile() {
        let mut tiles = vec![0u8; 4 * 4];
        tiles[0] = TileType::Solid as u8;
        let tilemap = tilemap_with_tiles(4, 4, tiles);
        assert!(compute_grounded(&tilemap, 16.0, 8.0, 23.0, 12.0, 14.0));
    }

    #[test]
    fn empty_level_reads_as_airborne() {
        let tilemap = tilemap_with_tiles(4, 4, vec![0u8; 16]);
        assert!(!compute_grounded(&tilemap, 16.0, 8.0, 23.0, 12.0, 14.0));
    }

    #[test]
    fn collides_tile_type_detects_overlap() {
        let mut tiles = vec![0u8; 4 * 4];
        tiles[4 + 1] = TileType::Spike as u8;
        let tilemap = tilemap_with_tiles(4, 4, tiles);
        let aabb = Aabb::from_center(24.0, 24.0, 12.0, 14.0);
        assert!(collides_tile_type(&tilemap, 16.0, &aabb, TileType::Spike));
        assert!(!collides_tile_type(&tilemap, 16.0, &aabb, TileType::Goal));
    }
}
