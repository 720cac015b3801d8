//! Line framing for the wireless serial link
//!
//! The link delivers raw bytes; the trainer consumes whole lines. Lines end
//! at `\n`, a trailing `\r` is dropped, and empty lines never reach the core.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Sender, TrySendError};
use heapless::{String, Vec};
use crate::codec::MAX_TEXT_LEN;

/// Longest line accepted from the link
pub const MAX_LINE_LEN: usize = MAX_TEXT_LEN;

/// One received line, terminator stripped
pub type Line = String<MAX_LINE_LEN>;

/// Accumulates bytes into lines
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
    dropped: u32,
}

impl LineAssembler {
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflowed: false,
            dropped: 0,
        }
    }

    /// Lines discarded for being too long or not UTF-8
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Feed one byte; returns a line when a terminator completes one
    pub fn push(&mut self, byte: u8) -> Option<Line> {
        match byte {
            b'\n' => self.finish(),
            b'\r' => None,
            _ => {
                if !self.overflowed && self.buffer.push(byte).is_err() {
                    // Discard everything up to the next terminator
                    self.overflowed = true;
                    self.buffer.clear();
                }
                None
            }
        }
    }

    /// Feed a chunk of bytes, yielding every completed line in order
    pub fn feed<'a>(&'a mut self, bytes: &'a [u8]) -> impl Iterator<Item = Line> + 'a {
        bytes.iter().filter_map(move |&byte| self.push(byte))
    }

    /// Forget any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.overflowed = false;
    }

    fn finish(&mut self) -> Option<Line> {
        if core::mem::take(&mut self.overflowed) {
            self.dropped += 1;
            #[cfg(feature = "defmt")]
            defmt::warn!("⚠️ Line longer than {} bytes dropped", MAX_LINE_LEN);
            return None;
        }

        let bytes = core::mem::take(&mut self.buffer);
        if bytes.is_empty() {
            return None;
        }

        match String::from_utf8(bytes) {
            Ok(line) => Some(line),
            Err(_) => {
                self.dropped += 1;
                #[cfg(feature = "defmt")]
                defmt::warn!("⚠️ Non UTF-8 line dropped");
                None
            }
        }
    }
}

/// Hand a finished line to the trainer without waiting.
///
/// While a line is still pending the new one is dropped, so the link never
/// has more than the channel's capacity queued. Returns whether it was taken.
pub fn offer_line<M: RawMutex, const N: usize>(lines: &Sender<'_, M, Line, N>, line: Line) -> bool {
    match lines.try_send(line) {
        Ok(()) => true,
        Err(TrySendError::Full(_line)) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("⚠️ Trainer busy, line '{}' dropped", _line.as_str());
            false
        }
    }
}
