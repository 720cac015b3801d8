//! Button latch: interrupt-safe capture of button presses

use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use crate::types::Button;

/// Edge time meaning "never pressed"
const NEVER: u32 = u32::MAX;

/// Atomic button press latch
///
/// Presses are recorded from interrupt or polling context and consumed by
/// the trainer loop. Each button holds at most one pending press: presses
/// arriving while one is already pending coalesce into it.
pub struct ButtonLatch {
    pending: [AtomicBool; 2],
    last_edge: [AtomicU32; 2],
}

impl ButtonLatch {
    /// Create new latch with nothing pending
    pub const fn new() -> Self {
        Self {
            pending: [AtomicBool::new(false), AtomicBool::new(false)],
            last_edge: [AtomicU32::new(NEVER), AtomicU32::new(NEVER)],
        }
    }

    /// Record a press edge at `now_ms`.
    ///
    /// Returns false when the edge falls inside the debounce window of the
    /// previous accepted edge and is discarded.
    pub fn press(&self, button: Button, now_ms: u32, debounce_ms: u32) -> bool {
        let index = button.index();
        let last = self.last_edge[index].load(Ordering::Relaxed);

        if last != NEVER && now_ms.wrapping_sub(last) < debounce_ms {
            return false;
        }

        self.last_edge[index].store(now_ms, Ordering::Relaxed);
        self.pending[index].store(true, Ordering::Release);
        true
    }

    /// Check if a press is waiting for the given button
    pub fn is_pending(&self, button: Button) -> bool {
        self.pending[button.index()].load(Ordering::Acquire)
    }

    /// Consume the pending press of one button
    pub fn take(&self, button: Button) -> bool {
        self.pending[button.index()].swap(false, Ordering::AcqRel)
    }

    /// Consume the next pending press, A before B
    pub fn take_next(&self) -> Option<Button> {
        Button::ALL.into_iter().find(|button| self.take(*button))
    }

    /// Drop all pending presses and debounce history
    pub fn clear(&self) {
        for index in 0..2 {
            self.pending[index].store(false, Ordering::Relaxed);
            self.last_edge[index].store(NEVER, Ordering::Relaxed);
        }
    }
}

impl Default for ButtonLatch {
    fn default() -> Self {
        Self::new()
    }
}
