#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # Morse Core
//!
//! Morse trainer core logic for embedded systems.
//! Text <-> Morse codec, timed playback, letter and Morse quizzes, and the
//! four-mode controller driven by two buttons and a serial line link.

pub mod types;
pub mod hal;
pub mod codec;
pub mod playback;
pub mod quiz;
pub mod fsm;
pub mod controller;
pub mod transport;
pub mod dispatcher;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use types::*;
pub use codec::{decode, encode, is_valid_morse_text, CodecError, Encoded, MorseString, Symbol};
pub use playback::{play, plan, Element, Step};
pub use quiz::{Judgement, Question, QuizEngine, QuizError, Verdict};
pub use fsm::{ModeController, Transition};
pub use controller::ButtonLatch;
pub use transport::{offer_line, Line, LineAssembler, MAX_LINE_LEN};
pub use dispatcher::{DecodeFailure, Handled, LineOutcome, Trainer, TrainerEvent};
pub use hal::{*, Instant, Duration};

/// Trainer library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration: 6 WPM, micro-controller friendly feedback timings
pub fn default_config() -> TrainerConfig {
    TrainerConfig::default()
}
