/// Camera Lock Controller and draw-depth ordering.
///
/// The follow-or-centre decision is made once, from the static map and
/// viewport sizes:
///   - map fits the viewport on both axes → `FixedCentered` on the map
///     midpoint, never moved again
///   - otherwise → `Following`: the view centre snaps to the player every
///     frame (no lag), clamped so the view stays inside the map, rounded
///     to whole pixels
///
/// Coordinates are world units (1 unit = 1 pixel at zoom 1).

use tracing::info;

use crate::domain::direction::WorldPos;

use super::map::PixelSize;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CameraMode {
    Following,
    FixedCentered,
}

impl CameraMode {
    pub fn name(self) -> &'static str {
        match self {
            CameraMode::Following => "following",
            CameraMode::FixedCentered => "fixed-centered",
        }
    }
}

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn of(size: PixelSize) -> Self {
        Bounds { x: 0.0, y: 0.0, width: size.width as f32, height: size.height as f32 }
    }

    /// Half-open on the far edges, like tile indexing.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

#[derive(Clone, Debug)]
pub struct CameraLock {
    mode: CameraMode,
    map: PixelSize,
    viewport: PixelSize,
    /// Where the player body may go; also the camera's scroll limits.
    bounds: Bounds,
    round_pixels: bool,
    center: WorldPos,
}

impl CameraLock {
    /// One-time setup. `player` is the player's position at scene start.
    pub fn configure(map: PixelSize, viewport: PixelSize, player: WorldPos) -> Self {
        let fits = map.width <= viewport.width && map.height <= viewport.height;
        let mode = if fits { CameraMode::FixedCentered } else { CameraMode::Following };

        let mut cam = CameraLock {
            mode,
            map,
            viewport,
            bounds: Bounds::of(map),
            round_pixels: mode == CameraMode::Following,
            center: WorldPos::new((map.width / 2) as f32, (map.height / 2) as f32),
        };
        if mode == CameraMode::Following {
            cam.follow(player);
        }
        info!(
            mode = mode.name(),
            map_w = map.width,
            map_h = map.height,
            view_w = viewport.width,
            view_h = viewport.height,
            "camera configured"
        );
        cam
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Centre of the visible area.
    pub fn center(&self) -> WorldPos {
        self.center
    }

    /// World position of the viewport's top-left corner. Negative when a
    /// small map is centred inside a larger view.
    pub fn scroll(&self) -> WorldPos {
        self.center.offset(-(self.viewport.width as f32) / 2.0, -(self.viewport.height as f32) / 2.0)
    }

    /// Per-frame tracking; a fixed camera ignores the player.
    pub fn track(&mut self, player: WorldPos) {
        if self.mode == CameraMode::Following {
            self.follow(player);
        }
    }

    fn follow(&mut self, player: WorldPos) {
        let x = clamp_axis(player.x, self.map.width, self.viewport.width);
        let y = clamp_axis(player.y, self.map.height, self.viewport.height);
        self.center = if self.round_pixels {
            WorldPos::new(x.round(), y.round())
        } else {
            WorldPos::new(x, y)
        };
    }
}

/// Keep a view of `view` units inside `[0, map]`; an axis the view
/// already covers stays on the map midpoint.
fn clamp_axis(target: f32, map: u32, view: u32) -> f32 {
    if map <= view {
        return (map / 2) as f32;
    }
    let half = view as f32 / 2.0;
    target.clamp(half, map as f32 - half)
}

// ══════════════════════════════════════════════════════════════
// Depth ordering
// ══════════════════════════════════════════════════════════════

pub const GROUND_DEPTH: i32 = 0;
pub const PLAYER_DEPTH: i32 = 5;
pub const ABOVE_DEPTH: i32 = 10;

/// Draw order, lowest first.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LayerDepths {
    pub ground: i32,
    pub player: i32,
    /// Only when the map has an "Above" layer.
    pub above: Option<i32>,
}

pub fn depths(has_above: bool) -> LayerDepths {
    LayerDepths {
        ground: GROUND_DEPTH,
        player: PLAYER_DEPTH,
        above: has_above.then_some(ABOVE_DEPTH),
    }
}
