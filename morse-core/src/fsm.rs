//! Mode controller: the four-state machine driven by buttons A and B

use crate::types::{Button, Mode, QuizKind};

/// A completed mode transition
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: Mode,
    pub to: Mode,
    pub button: Button,
}

impl Transition {
    /// Quiz to start on entry, if the new mode is a quiz mode
    pub const fn entry_quiz(&self) -> Option<QuizKind> {
        self.to.quiz_kind()
    }
}

/// Holds the current mode and applies the transition table
#[derive(Debug, Default)]
pub struct ModeController {
    mode: Mode,
    transitions: u32,
}

impl ModeController {
    /// Create a controller in T1
    pub const fn new() -> Self {
        Self::with_mode(Mode::TextToMorse)
    }

    /// Create a controller in an arbitrary mode
    pub const fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            transitions: 0,
        }
    }

    /// Get current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of transitions taken since creation or reset
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Apply a button press. Every (mode, button) pair has a transition.
    pub fn handle(&mut self, button: Button) -> Transition {
        let from = self.mode;
        let to = from.next(button);

        self.mode = to;
        self.transitions = self.transitions.wrapping_add(1);

        #[cfg(feature = "defmt")]
        defmt::info!("🔀 Mode {} -> {} ({:?})", from.label(), to.label(), button);

        Transition { from, to, button }
    }

    /// Reset to T1
    pub fn reset(&mut self) {
        self.mode = Mode::TextToMorse;
        self.transitions = 0;
    }
}
