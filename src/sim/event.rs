/// Events emitted during a scene update.
/// The presentation layer consumes these for sound and the HUD.

use crate::domain::direction::{Direction, GridPosition};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveEvent {
    /// Facing changed without a step.
    Turned { direction: Direction },
    StepStarted { from: GridPosition, direction: Direction },
    /// A tap or hold wanted to step but the target tile refused.
    Blocked { at: GridPosition, direction: Direction },
    Arrived { at: GridPosition },
    /// A direction pressed mid-step, held for the next tile boundary.
    Queued { direction: Direction },
    Released,
}
