/// The Overworld scene: wires the map, Movement Executor, Input State
/// Machine, camera and overlay into one per-frame `update`.
///
/// Frame order:
///   1. advance the executor; on arrival drain the queue or settle idle
///   2. run the input machine on the resolved held direction
///   3. let the camera track the player
///   4. refresh the interact hint, expire overlay feedback

use tracing::{debug, info};

use crate::config::MovementConfig;
use crate::domain::direction::{Direction, GridPosition, HeldDirections, WorldPos};
use crate::domain::sprite::SpriteKey;

use super::camera::{self, CameraLock, LayerDepths};
use super::event::MoveEvent;
use super::executor::MovementExecutor;
use super::map::{PixelSize, TileMap};
use super::press::{InputMachine, PressState};
use super::prompt::PromptOverlay;
use super::Millis;

pub struct Overworld {
    map: TileMap,
    exec: MovementExecutor,
    input: InputMachine,
    camera: Option<CameraLock>,
    prompt: PromptOverlay,
    tile_size: u32,
}

impl Overworld {
    pub fn new(map: TileMap, movement: &MovementConfig) -> Self {
        let exec = MovementExecutor::new(map.spawn(), movement.tile_size, movement.half_step_ms);
        Overworld {
            map,
            exec,
            input: InputMachine::new(movement.hold_threshold_ms),
            camera: None,
            prompt: PromptOverlay::new(),
            tile_size: movement.tile_size,
        }
    }

    /// One-time camera lock setup.
    pub fn initialize(&mut self, viewport: PixelSize) {
        let map_px = self.map.pixel_size(self.tile_size);
        info!(map = %self.map.name, spawn_col = self.map.spawn().col, spawn_row = self.map.spawn().row, "scene start");
        self.camera = Some(CameraLock::configure(map_px, viewport, self.exec.position()));
    }

    pub fn update(&mut self, now: Millis, held: HeldDirections) -> Vec<MoveEvent> {
        let mut events = Vec::new();
        let input = held.resolve();

        if let Some(at) = self.exec.advance(now) {
            events.push(MoveEvent::Arrived { at });
            let promoted = self.input.on_arrival(now);
            if !promoted && input.is_none() && !self.input.is_continuous() {
                self.exec.settle_idle();
            }
        }

        let oracle = self.map.oracle();
        self.input.update(now, input, &mut self.exec, &oracle, &mut events);

        if let Some(cam) = self.camera.as_mut() {
            cam.track(self.exec.position());
        }

        let ahead = self.exec.grid_position().step(self.exec.direction());
        let facing_obstacle = !self.exec.is_moving()
            && oracle.in_bounds(ahead.col, ahead.row)
            && !oracle.is_passable_at(ahead);
        self.prompt.show_hint(facing_obstacle);
        self.prompt.expire(now);

        if !events.is_empty() {
            debug!(?events, state = self.input.state().name(), "frame events");
        }
        events
    }

    pub fn interact(&mut self, now: Millis) {
        self.prompt.interact(now);
    }

    pub fn toggle_music(&mut self, now: Millis) -> bool {
        self.prompt.toggle_music(now)
    }

    // ── Read-only views for the renderer ──

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn player_position(&self) -> WorldPos {
        self.exec.position()
    }

    pub fn player_grid(&self) -> GridPosition {
        self.exec.grid_position()
    }

    pub fn facing(&self) -> Direction {
        self.exec.direction()
    }

    pub fn is_moving(&self) -> bool {
        self.exec.is_moving()
    }

    pub fn sprite(&self) -> SpriteKey {
        self.exec.sprite()
    }

    pub fn press_state(&self) -> PressState {
        self.input.state()
    }

    pub fn depths(&self) -> LayerDepths {
        camera::depths(self.map.has_layer(super::map::ABOVE_LAYER))
    }

    pub fn camera(&self) -> Option<&CameraLock> {
        self.camera.as_ref()
    }

    pub fn prompt(&self) -> &PromptOverlay {
        &self.prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::direction::StepPhase;
    use crate::domain::grid::tests::layer_from;
    use crate::sim::camera::CameraMode;
    use crate::sim::map::builtin_map;

    const FRAME: Millis = 25;
    const VIEW: PixelSize = PixelSize::new(240, 160);

    /// Scene on an ASCII ground diagram, player at (col, row) facing `facing`.
    fn scene_on(rows: &[&str], col: i32, row: i32, facing: Direction) -> Overworld {
        let map = TileMap::new("test", Some(layer_from(rows)), None, Some(GridPosition::new(col, row)))
            .expect("valid test map");
        let mut scene = Overworld::new(map, &MovementConfig::default());
        scene.exec.change_direction(facing);
        scene
    }

    fn open_10x10() -> Vec<&'static str> {
        vec![".........."; 10]
    }

    /// Run frames in [from, to) with the same held input.
    fn hold(scene: &mut Overworld, from: Millis, to: Millis, held: HeldDirections) -> Vec<(Millis, MoveEvent)> {
        let mut out = Vec::new();
        let mut t = from;
        while t < to {
            for e in scene.update(t, held) {
                out.push((t, e));
            }
            t += FRAME;
        }
        out
    }

    fn arrivals(events: &[(Millis, MoveEvent)]) -> Vec<(Millis, GridPosition)> {
        events.iter()
            .filter_map(|(t, e)| match e {
                MoveEvent::Arrived { at } => Some((*t, *at)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn turn_before_step() {
        let mut s = scene_on(&open_10x10(), 5, 5, Direction::Down);
        s.update(0, HeldDirections::only(Direction::Left));
        hold(&mut s, FRAME, 1000, HeldDirections::NONE);

        assert_eq!(s.facing(), Direction::Left);
        assert_eq!(s.player_grid(), GridPosition::new(5, 5));
        assert!(!s.is_moving());
        assert_eq!(s.sprite().name(), "left-idle");
    }

    #[test]
    fn tap_step_when_already_facing() {
        let mut s = scene_on(&open_10x10(), 5, 5, Direction::Left);
        s.update(0, HeldDirections::only(Direction::Left));
        let events = hold(&mut s, FRAME, 1000, HeldDirections::NONE);

        assert_eq!(arrivals(&events), vec![(250, GridPosition::new(4, 5))]);
        assert_eq!(s.player_grid(), GridPosition::new(4, 5));
        assert_eq!(s.player_position(), GridPosition::new(4, 5).center(16));
        assert!(!s.is_moving());
        assert_eq!(s.sprite().phase, StepPhase::Idle);
    }

    #[test]
    fn continuous_walking_steps_every_250() {
        let mut s = scene_on(&open_10x10(), 5, 1, Direction::Down);
        let down = HeldDirections::only(Direction::Down);
        let mut events = hold(&mut s, 0, 1025, down);
        assert!(matches!(s.press_state(), PressState::ContinuousWalking { .. }));
        events.extend(hold(&mut s, 1025, 2000, HeldDirections::NONE));

        assert_eq!(
            arrivals(&events),
            vec![
                (250, GridPosition::new(5, 2)),
                (500, GridPosition::new(5, 3)),
                (750, GridPosition::new(5, 4)),
                (1000, GridPosition::new(5, 5)),
                // The step started at 1000 still lands after release.
                (1250, GridPosition::new(5, 6)),
            ]
        );
        assert_eq!(s.press_state(), PressState::Neutral);
        assert_eq!(s.sprite().name(), "down-idle");
    }

    #[test]
    fn walking_keeps_the_stride_frames() {
        let mut s = scene_on(&open_10x10(), 5, 1, Direction::Down);
        let down = HeldDirections::only(Direction::Down);
        hold(&mut s, 0, 275, down);
        // Step two began at 250 without an idle frame in between.
        assert_eq!(s.sprite().name(), "down-stepA");
        hold(&mut s, 275, 400, down);
        assert_eq!(s.sprite().name(), "down-stepB");
    }

    #[test]
    fn corner_buffering_applies_queued_direction() {
        let mut s = scene_on(&open_10x10(), 5, 5, Direction::Right);
        let mut events = hold(&mut s, 0, 100, HeldDirections::only(Direction::Right));
        events.extend(hold(&mut s, 100, 725, HeldDirections::only(Direction::Up)));

        assert!(events.contains(&(100, MoveEvent::Queued { direction: Direction::Up })));
        assert!(events.contains(&(250, MoveEvent::Turned { direction: Direction::Up })));
        assert!(events.contains(&(
            450,
            MoveEvent::StepStarted { from: GridPosition::new(6, 5), direction: Direction::Up }
        )));
        assert_eq!(
            arrivals(&events),
            vec![(250, GridPosition::new(6, 5)), (700, GridPosition::new(6, 4))]
        );
    }

    #[test]
    fn release_mid_step_snaps_idle_then_finishes_tile() {
        let mut s = scene_on(&open_10x10(), 5, 5, Direction::Right);
        s.update(0, HeldDirections::only(Direction::Right));
        s.update(25, HeldDirections::NONE);
        assert_eq!(s.sprite().name(), "right-idle");
        assert!(s.is_moving());
        // The second half-step still shows its own frame.
        hold(&mut s, 50, 150, HeldDirections::NONE);
        assert_eq!(s.sprite().name(), "right-stepB");
        hold(&mut s, 150, 300, HeldDirections::NONE);
        assert_eq!(s.player_grid(), GridPosition::new(6, 5));
        assert_eq!(s.sprite().name(), "right-idle");
    }

    #[test]
    fn held_priority_prefers_left() {
        let mut s = scene_on(&open_10x10(), 5, 5, Direction::Down);
        let all = HeldDirections { left: true, right: true, up: true, down: true };
        s.update(0, all);
        assert_eq!(s.facing(), Direction::Left);
    }

    /// Deterministic xorshift input stream covering holds, taps, turns
    /// and releases.
    fn scripted_inputs(frames: usize) -> Vec<HeldDirections> {
        let mut seed: u32 = 0x9e37_79b9;
        let mut current = HeldDirections::NONE;
        let mut out = Vec::with_capacity(frames);
        for _ in 0..frames {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            if seed % 7 == 0 {
                current = match (seed >> 8) % 5 {
                    4 => HeldDirections::NONE,
                    n => HeldDirections::only(Direction::ALL[n as usize]),
                };
            }
            out.push(current);
        }
        out
    }

    #[test]
    fn at_most_one_move_in_flight() {
        let mut s = scene_on(&open_10x10(), 5, 5, Direction::Down);
        let mut in_flight = false;
        for (i, held) in scripted_inputs(2000).into_iter().enumerate() {
            for e in s.update(i as Millis * FRAME, held) {
                match e {
                    MoveEvent::StepStarted { .. } => {
                        assert!(!in_flight, "second move started at frame {i}");
                        in_flight = true;
                    }
                    MoveEvent::Arrived { .. } => in_flight = false,
                    _ => {}
                }
            }
            assert_eq!(in_flight, s.is_moving());
        }
    }

    #[test]
    fn never_rests_out_of_bounds_or_on_water() {
        let rows = [
            "~~~~~~~~~~",
            "~........~",
            "~..~~....~",
            "~..~~..~.~",
            "~......~.~",
            "~.~~.....~",
            "~........~",
            "~~~~~~~~~~",
        ];
        let mut s = scene_on(&rows, 1, 1, Direction::Down);
        for (i, held) in scripted_inputs(3000).into_iter().enumerate() {
            s.update(i as Millis * FRAME, held);
            if !s.is_moving() {
                let at = s.player_grid();
                let oracle = s.map().oracle();
                assert!(oracle.in_bounds(at.col, at.row), "out of bounds at {at:?}");
                assert!(oracle.is_passable_at(at), "on water at {at:?}");
            }
        }
    }

    #[test]
    fn edge_of_map_blocks_without_moving() {
        let mut s = scene_on(&open_10x10(), 0, 0, Direction::Left);
        let events = hold(&mut s, 0, 600, HeldDirections::only(Direction::Left));
        assert!(arrivals(&events).is_empty());
        assert_eq!(s.player_grid(), GridPosition::new(0, 0));
        assert_eq!(
            events.iter().filter(|(_, e)| matches!(e, MoveEvent::Blocked { .. })).count(),
            2,
            "the tap and the threshold crossing"
        );
    }

    #[test]
    fn small_map_camera_stays_centered() {
        let map = TileMap::parse(builtin_map("cove").expect("cove")).expect("cove parses");
        let mut s = Overworld::new(map, &MovementConfig::default());
        s.initialize(VIEW);
        let cam = s.camera().expect("configured");
        assert_eq!(cam.mode(), CameraMode::FixedCentered);
        let mid = cam.center();
        assert_eq!(mid, WorldPos::new(80.0, 64.0));

        for (i, held) in scripted_inputs(800).into_iter().enumerate() {
            s.update(i as Millis * FRAME, held);
            assert_eq!(s.camera().map(|c| c.center()), Some(mid));
        }
    }

    #[test]
    fn large_map_camera_follows_clamped_player() {
        let map = TileMap::parse(builtin_map("meadow").expect("meadow")).expect("meadow parses");
        let px = map.pixel_size(16);
        let mut s = Overworld::new(map, &MovementConfig::default());
        s.initialize(VIEW);
        assert_eq!(s.camera().map(|c| c.mode()), Some(CameraMode::Following));

        for (i, held) in scripted_inputs(2000).into_iter().enumerate() {
            s.update(i as Millis * FRAME, held);
            let p = s.player_position();
            let expected = WorldPos::new(
                p.x.clamp(120.0, px.width as f32 - 120.0).round(),
                p.y.clamp(80.0, px.height as f32 - 80.0).round(),
            );
            assert_eq!(s.camera().map(|c| c.center()), Some(expected));
        }
    }

    #[test]
    fn hint_shows_when_facing_water() {
        let mut s = scene_on(&["...", ".~.", "..."], 1, 0, Direction::Left);
        s.update(0, HeldDirections::NONE);
        assert_eq!(s.prompt().hint(), None);
        s.update(25, HeldDirections::only(Direction::Down));
        assert!(s.prompt().hint().is_some());
    }

    #[test]
    fn overlay_feedback_expires_during_updates() {
        let mut s = scene_on(&open_10x10(), 5, 5, Direction::Down);
        s.interact(0);
        s.update(975, HeldDirections::NONE);
        assert!(s.prompt().feedback().is_some());
        s.update(1000, HeldDirections::NONE);
        assert!(s.prompt().feedback().is_none());
        assert!(s.toggle_music(1000));
    }

    #[test]
    fn depths_follow_map_layers() {
        let meadow = TileMap::parse(builtin_map("meadow").expect("meadow")).expect("meadow parses");
        let s = Overworld::new(meadow, &MovementConfig::default());
        assert_eq!(s.depths().above, Some(camera::ABOVE_DEPTH));
        let plain = scene_on(&open_10x10(), 1, 1, Direction::Down);
        assert_eq!(plain.depths().above, None);
    }
}
