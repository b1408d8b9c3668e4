/// Movement Executor: one-tile moves as two polled half-step tweens.
///
/// A move is accepted only when nothing is in flight and the target tile
/// is passable. The tile is then covered in two equal half-steps; the
/// first shows the `StepA` frame, the second `StepB`. `advance` is polled
/// once per frame and reports the frame on which the tile completes.

use tracing::debug;

use crate::domain::direction::{Direction, GridPosition, StepPhase, WorldPos};
use crate::domain::grid::CollisionOracle;
use crate::domain::sprite::SpriteKey;

use super::Millis;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Half {
    First,
    Second,
}

/// The active half of a move.
#[derive(Clone, Copy, Debug)]
struct HalfStep {
    half: Half,
    from: WorldPos,
    to: WorldPos,
    started: Millis,
    target: GridPosition,
}

#[derive(Clone, Debug)]
pub struct MovementExecutor {
    grid: GridPosition,
    pos: WorldPos,
    direction: Direction,
    phase: StepPhase,
    tween: Option<HalfStep>,
    tile_size: u32,
    half_step_ms: Millis,
}

impl MovementExecutor {
    /// At rest on `grid`, facing down.
    pub fn new(grid: GridPosition, tile_size: u32, half_step_ms: Millis) -> Self {
        MovementExecutor {
            grid,
            pos: grid.center(tile_size),
            direction: Direction::Down,
            phase: StepPhase::Idle,
            tween: None,
            tile_size,
            half_step_ms,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.tween.is_some()
    }

    /// Tile the player rests on, or is leaving while a move is in flight.
    pub fn grid_position(&self) -> GridPosition {
        self.grid
    }

    /// Sprite centre in world units; fractional mid-move.
    pub fn position(&self) -> WorldPos {
        self.pos
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    pub fn sprite(&self) -> SpriteKey {
        SpriteKey::new(self.direction, self.phase)
    }

    /// Face `dir` without moving. At rest this also shows the idle frame
    /// for the new facing. Returns whether the facing changed.
    pub fn change_direction(&mut self, dir: Direction) -> bool {
        if self.direction == dir {
            return false;
        }
        self.direction = dir;
        if !self.is_moving() {
            self.phase = StepPhase::Idle;
        }
        true
    }

    /// Force the idle frame, even while a tween is still sliding.
    pub fn settle_idle(&mut self) {
        self.phase = StepPhase::Idle;
    }

    /// Start a one-tile move. Rejection leaves every field untouched.
    pub fn try_move(&mut self, dir: Direction, now: Millis, oracle: &CollisionOracle) -> bool {
        if self.is_moving() {
            return false;
        }
        let target = self.grid.step(dir);
        if !oracle.is_passable_at(target) {
            return false;
        }

        self.change_direction(dir);
        self.phase = StepPhase::StepA;

        let half = self.tile_size as f32 / 2.0;
        let (dx, dy) = dir.delta();
        let from = self.pos;
        self.tween = Some(HalfStep {
            half: Half::First,
            from,
            to: from.offset(dx as f32 * half, dy as f32 * half),
            started: now,
            target,
        });
        debug!(dir = dir.name(), col = target.col, row = target.row, "step started");
        true
    }

    /// Interpolate the active half-step at `now`.
    ///
    /// The second half starts at the exact end time of the first, so a
    /// tile always takes two half-steps regardless of frame timing.
    /// Returns the new grid position on the frame the tile completes.
    pub fn advance(&mut self, now: Millis) -> Option<GridPosition> {
        loop {
            let step = self.tween?;
            let end = step.started + self.half_step_ms;
            if now < end {
                let t = now.saturating_sub(step.started) as f32 / self.half_step_ms as f32;
                self.pos = step.from.lerp(step.to, t);
                return None;
            }

            self.pos = step.to;
            match step.half {
                Half::First => {
                    self.phase = StepPhase::StepB;
                    self.tween = Some(HalfStep {
                        half: Half::Second,
                        from: step.to,
                        to: step.target.center(self.tile_size),
                        started: end,
                        target: step.target,
                    });
                }
                Half::Second => {
                    // The logical tile is re-derived from where the body came to rest.
                    self.grid = GridPosition::from_world(self.pos, self.tile_size);
                    debug_assert_eq!(self.grid, step.target);
                    self.tween = None;
                    debug!(col = self.grid.col, row = self.grid.row, "arrived");
                    return Some(self.grid);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::tests::layer_from;
    use crate::domain::grid::TileLayer;

    fn open_map() -> TileLayer {
        layer_from(&[
            "........",
            "........",
            "........",
            "........",
            "....~...",
            "........",
            "........",
        ])
    }

    fn oracle(layer: &TileLayer) -> CollisionOracle<'_> {
        CollisionOracle::new(Some(layer), layer.cols(), layer.rows())
    }

    fn exec_at(col: i32, row: i32) -> MovementExecutor {
        MovementExecutor::new(GridPosition::new(col, row), 16, 125)
    }

    #[test]
    fn accepted_move_covers_two_half_steps() {
        let layer = open_map();
        let o = oracle(&layer);
        let mut ex = exec_at(2, 2);

        assert!(ex.try_move(Direction::Right, 0, &o));
        assert!(ex.is_moving());
        assert_eq!(ex.direction(), Direction::Right);
        assert_eq!(ex.phase(), StepPhase::StepA);
        assert_eq!(ex.sprite().name(), "right-stepA");

        assert_eq!(ex.advance(50), None);
        assert!((ex.position().x - 43.2).abs() < 1e-4);
        assert_eq!(ex.position().y, 40.0);

        assert_eq!(ex.advance(125), None);
        assert_eq!(ex.phase(), StepPhase::StepB);
        assert_eq!(ex.position(), WorldPos::new(48.0, 40.0));

        assert_eq!(ex.advance(249), None);
        assert!(ex.is_moving());
        assert_eq!(ex.advance(250), Some(GridPosition::new(3, 2)));
        assert!(!ex.is_moving());
        assert_eq!(ex.position(), GridPosition::new(3, 2).center(16));
    }

    #[test]
    fn arrival_tile_matches_resting_position() {
        let layer = open_map();
        let o = oracle(&layer);
        let mut ex = exec_at(1, 1);
        let mut now = 0;
        for dir in [Direction::Left, Direction::Up, Direction::Right, Direction::Down, Direction::Down] {
            assert!(ex.try_move(dir, now, &o));
            now += 250;
            let arrived = ex.advance(now).expect("arrived");
            assert_eq!(arrived, GridPosition::from_world(ex.position(), 16));
            assert_eq!(ex.grid_position(), arrived);
        }
        assert_eq!(ex.grid_position(), GridPosition::new(1, 2));
    }

    #[test]
    fn second_move_rejected_while_in_flight() {
        let layer = open_map();
        let o = oracle(&layer);
        let mut ex = exec_at(2, 2);

        assert!(ex.try_move(Direction::Down, 0, &o));
        let before = (ex.grid_position(), ex.direction(), ex.position());
        for t in [0, 60, 125, 200] {
            ex.advance(t);
            let pos = ex.position();
            assert!(!ex.try_move(Direction::Left, t, &o));
            assert_eq!(ex.direction(), Direction::Down);
            assert_eq!(ex.grid_position(), before.0);
            assert_eq!(ex.position(), pos);
        }
        assert_eq!(ex.advance(250), Some(GridPosition::new(2, 3)));
        assert!(ex.try_move(Direction::Left, 250, &o));
    }

    #[test]
    fn blocked_and_out_of_bounds_moves_change_nothing() {
        let layer = open_map();
        let o = oracle(&layer);

        let mut ex = exec_at(4, 3);
        assert!(!ex.try_move(Direction::Down, 0, &o), "water below");
        assert_eq!(ex.direction(), Direction::Down);
        assert_eq!(ex.phase(), StepPhase::Idle);

        let mut corner = exec_at(0, 0);
        corner.change_direction(Direction::Right);
        assert!(!corner.try_move(Direction::Left, 0, &o));
        assert!(!corner.try_move(Direction::Up, 0, &o));
        assert_eq!(corner.direction(), Direction::Right);
        assert!(!corner.is_moving());
    }

    #[test]
    fn late_poll_completes_whole_tile() {
        let layer = open_map();
        let o = oracle(&layer);
        let mut ex = exec_at(2, 2);

        assert!(ex.try_move(Direction::Up, 1000, &o));
        assert_eq!(ex.advance(1400), Some(GridPosition::new(2, 1)));
        assert_eq!(ex.phase(), StepPhase::StepB);
        assert_eq!(ex.advance(1500), None);
    }

    #[test]
    fn zero_length_half_steps_finish_on_first_poll() {
        let layer = open_map();
        let o = oracle(&layer);
        let mut ex = MovementExecutor::new(GridPosition::new(1, 1), 16, 0);
        assert!(ex.try_move(Direction::Right, 10, &o));
        assert_eq!(ex.advance(10), Some(GridPosition::new(2, 1)));
    }

    #[test]
    fn turn_at_rest_shows_idle_frame() {
        let mut ex = exec_at(1, 1);
        assert!(ex.change_direction(Direction::Left));
        assert!(!ex.change_direction(Direction::Left));
        assert_eq!(ex.sprite().name(), "left-idle");
    }

    #[test]
    fn settle_idle_snaps_sprite_mid_move() {
        let layer = open_map();
        let o = oracle(&layer);
        let mut ex = exec_at(2, 2);
        assert!(ex.try_move(Direction::Left, 0, &o));
        ex.advance(40);
        ex.settle_idle();
        assert_eq!(ex.sprite().name(), "left-idle");
        assert!(ex.is_moving());
        assert_eq!(ex.advance(250), Some(GridPosition::new(1, 2)));
    }

    #[test]
    fn random_walk_respects_bounds_and_collision() {
        let layer = open_map();
        let o = oracle(&layer);
        let mut ex = exec_at(3, 3);
        let mut now = 0;
        // Deterministic pseudo-random direction sequence.
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..400 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let dir = Direction::ALL[(seed % 4) as usize];
            ex.try_move(dir, now, &o);
            now += 25;
            if let Some(at) = ex.advance(now) {
                assert!(o.in_bounds(at.col, at.row));
                assert!(o.is_passable_at(at));
            }
        }
    }
}
