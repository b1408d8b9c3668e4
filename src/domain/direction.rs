/// Directions, step phases, and the two coordinate spaces.
///
/// Grid space counts tiles; world space counts world units (16 per tile
/// by default). The player sprite is anchored at its centre, so a resting
/// player at grid (c, r) sits at world (c*T + T/2, r*T + T/2).

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Grid offset of one step in this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

/// Which half of the two-frame walk cycle is showing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum StepPhase {
    #[default]
    Idle,
    StepA,
    StepB,
}

impl StepPhase {
    pub fn name(self) -> &'static str {
        match self {
            StepPhase::Idle => "idle",
            StepPhase::StepA => "stepA",
            StepPhase::StepB => "stepB",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            StepPhase::Idle => 0,
            StepPhase::StepA => 1,
            StepPhase::StepB => 2,
        }
    }
}

/// Tile coordinate. Signed so that "one step off the map" is representable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct GridPosition {
    pub col: i32,
    pub row: i32,
}

impl GridPosition {
    pub const fn new(col: i32, row: i32) -> Self {
        GridPosition { col, row }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        GridPosition { col: self.col + dx, row: self.row + dy }
    }

    /// Floor-divide a world position into the tile containing it.
    pub fn from_world(pos: WorldPos, tile_size: u32) -> Self {
        let t = tile_size as f32;
        GridPosition {
            col: (pos.x / t).floor() as i32,
            row: (pos.y / t).floor() as i32,
        }
    }

    /// World position of this tile's centre.
    pub fn center(self, tile_size: u32) -> WorldPos {
        let t = tile_size as f32;
        WorldPos {
            x: self.col as f32 * t + t / 2.0,
            y: self.row as f32 * t + t / 2.0,
        }
    }
}

/// Continuous world-space position (world units, not tiles).
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32) -> Self {
        WorldPos { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        WorldPos { x: self.x + dx, y: self.y + dy }
    }

    /// Linear interpolation; `t` is clamped to [0, 1].
    pub fn lerp(self, to: WorldPos, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        WorldPos {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

/// Per-frame "is held" signals for the four logical directions.
/// Each flag is already the OR of every physical source (arrows, WASD, pad).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct HeldDirections {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl HeldDirections {
    pub const NONE: HeldDirections = HeldDirections { left: false, right: false, up: false, down: false };

    pub fn only(dir: Direction) -> Self {
        let mut held = HeldDirections::NONE;
        held.set(dir, true);
        held
    }

    pub fn set(&mut self, dir: Direction, down: bool) {
        match dir {
            Direction::Left => self.left = down,
            Direction::Right => self.right = down,
            Direction::Up => self.up = down,
            Direction::Down => self.down = down,
        }
    }

    /// The single direction that wins this frame.
    ///
    /// Priority is Left, Right, Up, Down. The order is inherited for
    /// compatibility and carries no design meaning.
    pub fn resolve(self) -> Option<Direction> {
        if self.left {
            Some(Direction::Left)
        } else if self.right {
            Some(Direction::Right)
        } else if self.up {
            Some(Direction::Up)
        } else if self.down {
            Some(Direction::Down)
        } else {
            None
        }
    }
}
