/// Sprite selection: a pure lookup from (Direction, StepPhase).
///
/// Frame names follow `<direction>-<phase>`, e.g. `left-stepA`.
/// The table is spelled out so a missing frame is a compile error,
/// not a runtime asset miss.

use super::direction::{Direction, StepPhase};

const FRAME_NAMES: [[&str; 3]; 4] = [
    ["up-idle", "up-stepA", "up-stepB"],
    ["down-idle", "down-stepA", "down-stepB"],
    ["left-idle", "left-stepA", "left-stepB"],
    ["right-idle", "right-stepA", "right-stepB"],
];

/// Two-column terminal glyphs: body, then facing marker.
const FRAME_GLYPHS: [[[char; 2]; 3]; 4] = [
    [['●', '↑'], ['◐', '↑'], ['◑', '↑']],
    [['●', '↓'], ['◐', '↓'], ['◑', '↓']],
    [['●', '←'], ['◐', '←'], ['◑', '←']],
    [['●', '→'], ['◐', '→'], ['◑', '→']],
];

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SpriteKey {
    pub direction: Direction,
    pub phase: StepPhase,
}

impl SpriteKey {
    pub const fn new(direction: Direction, phase: StepPhase) -> Self {
        SpriteKey { direction, phase }
    }

    pub fn name(self) -> &'static str {
        FRAME_NAMES[self.direction.index()][self.phase.index()]
    }

    pub fn glyphs(self) -> [char; 2] {
        FRAME_GLYPHS[self.direction.index()][self.phase.index()]
    }
}
