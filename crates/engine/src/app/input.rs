use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    SymbolUp,
    SymbolDown,
    SymbolLeft,
    SymbolRight,
    CastMend,
    CastBolt,
    CastShockwave,
    CastPhase,
    Dilate,
    AbortCast,
    Jump,
    Quit,
}

const ACTION_COUNT: usize = 12;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set_down(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn set_pressed(&mut self, action: InputAction) {
        self.pressed[action.index()] = true;
        self.down[action.index()] = true;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::SymbolUp => 0,
            InputAction::SymbolDown => 1,
            InputAction::SymbolLeft => 2,
            InputAction::SymbolRight => 3,
            InputAction::CastMend => 4,
            InputAction::CastBolt => 5,
            InputAction::CastShockwave => 6,
            InputAction::CastPhase => 7,
            InputAction::Dilate => 8,
            InputAction::AbortCast => 9,
            InputAction::Jump => 10,
            InputAction::Quit => 11,
        }
    }
}

/// Per-tick view of player input.
///
/// `pressed` is edge-triggered: it fires once on the tick the physical press
/// happened and never again while the key is held. `is_down` is the held
/// state and is what movement reads. Frontends build one snapshot per tick;
/// tests and the demo script use the `with_*` builders.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn pressed(&self, action: InputAction) -> bool {
        self.actions.pressed(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set_down(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.actions.set_pressed(action);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }
}

/// Supplies one input snapshot per fixed tick.
pub trait InputSource {
    fn next_tick(&mut self) -> InputSnapshot;
}

/// Replays a prepared snapshot queue, then requests quit once exhausted.
/// Used by the demo binary and end-to-end tests.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputSnapshot>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputSnapshot>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn push(&mut self, snapshot: InputSnapshot) {
        self.frames.push_back(snapshot);
    }

    pub fn push_idle_ticks(&mut self, count: usize) {
        for _ in 0..count {
            self.frames.push_back(InputSnapshot::empty());
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn next_tick(&mut self) -> InputSnapshot {
        self.frames
            .pop_front()
            .unwrap_or_else(|| InputSnapshot::empty().with_quit_requested(true))
    }
}
