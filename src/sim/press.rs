/// Input Disambiguation State Machine.
///
/// Classifies the per-frame held direction into a turn, a tap-step, a
/// hold that becomes continuous walking, or a direction queued for the
/// next tile boundary.
///
/// ```text
///   Neutral ──press──▶ Pressed ──facing differs──▶ Turning ─┐
///                         │                                 ├─▶ HeldPending ─(≥ threshold)─▶ ContinuousWalking
///                         └──already facing──▶ TappedStep ──┘
///   any state ──release──▶ Neutral
/// ```
///
/// Every state after `Neutral` carries the pressed direction and the
/// time the press began. A press that arrives mid-step goes into the
/// one-slot queue and becomes `Pressed` when the step lands.

use tracing::debug;

use crate::domain::direction::Direction;
use crate::domain::grid::CollisionOracle;

use super::event::MoveEvent;
use super::executor::MovementExecutor;
use super::Millis;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PressState {
    #[default]
    Neutral,
    /// Adopted this frame; nothing acted on yet.
    Pressed { dir: Direction, since: Millis },
    /// The press turned the player; the turn frame never steps.
    Turning { dir: Direction, since: Millis },
    /// The press was already facing its direction and stepped at once.
    TappedStep { dir: Direction, since: Millis },
    /// Still held, waiting for the hold threshold.
    HeldPending { dir: Direction, since: Millis },
    ContinuousWalking { dir: Direction, since: Millis },
}

impl PressState {
    pub fn pressed(self) -> Option<Direction> {
        match self {
            PressState::Neutral => None,
            PressState::Pressed { dir, .. }
            | PressState::Turning { dir, .. }
            | PressState::TappedStep { dir, .. }
            | PressState::HeldPending { dir, .. }
            | PressState::ContinuousWalking { dir, .. } => Some(dir),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PressState::Neutral => "neutral",
            PressState::Pressed { .. } => "pressed",
            PressState::Turning { .. } => "turning",
            PressState::TappedStep { .. } => "tapped",
            PressState::HeldPending { .. } => "held",
            PressState::ContinuousWalking { .. } => "walking",
        }
    }
}

#[derive(Clone, Debug)]
pub struct InputMachine {
    state: PressState,
    queued: Option<Direction>,
    hold_threshold: Millis,
}

impl InputMachine {
    pub fn new(hold_threshold: Millis) -> Self {
        InputMachine { state: PressState::Neutral, queued: None, hold_threshold }
    }

    pub fn state(&self) -> PressState {
        self.state
    }

    pub fn queued(&self) -> Option<Direction> {
        self.queued
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self.state, PressState::ContinuousWalking { .. })
    }

    /// A step just landed: promote the queued direction to a fresh press.
    pub fn on_arrival(&mut self, now: Millis) -> bool {
        match self.queued.take() {
            Some(dir) => {
                debug!(dir = dir.name(), "queued direction promoted");
                self.state = PressState::Pressed { dir, since: now };
                true
            }
            None => false,
        }
    }

    /// Run one frame of the machine for the resolved held direction.
    pub fn update(
        &mut self,
        now: Millis,
        input: Option<Direction>,
        exec: &mut MovementExecutor,
        oracle: &CollisionOracle,
        events: &mut Vec<MoveEvent>,
    ) {
        self.adopt_input(now, input, exec, events);
        self.act_on_press(now, exec, oracle, events);

        // Continuous-walk pump. A refused step here stays quiet; it
        // would otherwise fire every frame against a wall.
        if let PressState::ContinuousWalking { dir, .. } = self.state {
            if !exec.is_moving() && exec.direction() == dir && exec.try_move(dir, now, oracle) {
                events.push(MoveEvent::StepStarted { from: exec.grid_position(), direction: dir });
            }
        }
    }

    fn adopt_input(
        &mut self,
        now: Millis,
        input: Option<Direction>,
        exec: &mut MovementExecutor,
        events: &mut Vec<MoveEvent>,
    ) {
        if input == self.state.pressed() {
            // Back on the pressed direction mid-step: the queued turn is stale.
            if exec.is_moving() && self.queued.take().is_some() {
                debug!("queued direction dropped");
            }
            return;
        }

        match input {
            Some(dir) if exec.is_moving() => {
                if self.queued != Some(dir) {
                    self.queued = Some(dir);
                    debug!(dir = dir.name(), "direction queued");
                    events.push(MoveEvent::Queued { direction: dir });
                }
            }
            Some(dir) => {
                self.state = PressState::Pressed { dir, since: now };
                self.queued = None;
            }
            None => {
                self.state = PressState::Neutral;
                self.queued = None;
                exec.settle_idle();
                events.push(MoveEvent::Released);
            }
        }
    }

    fn act_on_press(
        &mut self,
        now: Millis,
        exec: &mut MovementExecutor,
        oracle: &CollisionOracle,
        events: &mut Vec<MoveEvent>,
    ) {
        match self.state {
            PressState::Neutral | PressState::ContinuousWalking { .. } => {}
            PressState::Pressed { dir, since } => {
                if exec.direction() != dir {
                    exec.change_direction(dir);
                    self.state = PressState::Turning { dir, since };
                    debug!(dir = dir.name(), "turned");
                    events.push(MoveEvent::Turned { direction: dir });
                } else {
                    self.state = PressState::TappedStep { dir, since };
                    Self::step(dir, now, exec, oracle, events);
                }
            }
            PressState::Turning { dir, since }
            | PressState::TappedStep { dir, since }
            | PressState::HeldPending { dir, since } => {
                if exec.direction() == dir && now.saturating_sub(since) >= self.hold_threshold {
                    self.state = PressState::ContinuousWalking { dir, since };
                    debug!(dir = dir.name(), "continuous walking");
                    Self::step(dir, now, exec, oracle, events);
                } else {
                    self.state = PressState::HeldPending { dir, since };
                }
            }
        }
    }

    /// Deliberate step request: reports a refusal unless a move is
    /// simply still in flight.
    fn step(
        dir: Direction,
        now: Millis,
        exec: &mut MovementExecutor,
        oracle: &CollisionOracle,
        events: &mut Vec<MoveEvent>,
    ) {
        let from = exec.grid_position();
        if exec.try_move(dir, now, oracle) {
            events.push(MoveEvent::StepStarted { from, direction: dir });
        } else if !exec.is_moving() {
            events.push(MoveEvent::Blocked { at: from, direction: dir });
        }
    }
}
