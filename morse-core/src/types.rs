//! Core data types for the Morse trainer

use crate::hal::Duration;

/// Trainer operating modes
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// T1: incoming text is encoded and played
    #[default]
    TextToMorse,
    /// Q1: a letter is played, the user answers with the letter
    QuizLetter,
    /// T2: incoming Morse is decoded to a symbol
    MorseToText,
    /// Q2: a letter is shown, the user answers with its Morse pattern
    QuizMorse,
}

impl Mode {
    /// All modes, in label order
    pub const ALL: [Mode; 4] = [
        Mode::TextToMorse,
        Mode::QuizLetter,
        Mode::MorseToText,
        Mode::QuizMorse,
    ];

    /// Short label shown on the display after every transition
    pub const fn label(&self) -> &'static str {
        match self {
            Mode::TextToMorse => "T1",
            Mode::QuizLetter => "Q1",
            Mode::MorseToText => "T2",
            Mode::QuizMorse => "Q2",
        }
    }

    /// Next mode for a button press. Total over every (mode, button) pair.
    ///
    /// A toggles between converter and quiz within a group,
    /// B toggles between the text group and the Morse group.
    pub const fn next(&self, button: Button) -> Mode {
        match (self, button) {
            (Mode::TextToMorse, Button::A) => Mode::QuizLetter,
            (Mode::TextToMorse, Button::B) => Mode::MorseToText,
            (Mode::QuizLetter, Button::A) => Mode::TextToMorse,
            (Mode::QuizLetter, Button::B) => Mode::QuizMorse,
            (Mode::MorseToText, Button::A) => Mode::QuizMorse,
            (Mode::MorseToText, Button::B) => Mode::TextToMorse,
            (Mode::QuizMorse, Button::A) => Mode::MorseToText,
            (Mode::QuizMorse, Button::B) => Mode::QuizLetter,
        }
    }

    /// Quiz flavour owned by this mode, if it is a quiz mode
    pub const fn quiz_kind(&self) -> Option<QuizKind> {
        match self {
            Mode::QuizLetter => Some(QuizKind::Letter),
            Mode::QuizMorse => Some(QuizKind::Morse),
            Mode::TextToMorse | Mode::MorseToText => None,
        }
    }

    /// Returns true for Q1 and Q2
    pub const fn is_quiz(&self) -> bool {
        self.quiz_kind().is_some()
    }
}

/// Physical button identification
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Button A (left)
    A,
    /// Button B (right)
    B,
}

impl Button {
    pub const ALL: [Button; 2] = [Button::A, Button::B];

    pub const fn index(&self) -> usize {
        match self {
            Button::A => 0,
            Button::B => 1,
        }
    }
}

/// Quiz flavours
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QuizKind {
    /// Pattern is played, answer is a letter
    Letter,
    /// Letter is shown, answer is a Morse pattern
    Morse,
}

/// Icons the presentation layer must be able to show
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Icon {
    /// Tick, used for success
    Yes,
    /// Cross, used for failure
    No,
    /// Diamond, waiting for an answer
    Pending,
    /// Eighth note, shown while a pattern plays
    MusicNote,
}

/// Pixel glyph lit while a tone sounds
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Glyph {
    /// Single centre pixel
    Dot,
    /// Three pixel horizontal bar through the centre
    Dash,
}

impl Glyph {
    /// Pixels (x, y) to plot on the 5x5 matrix
    pub const fn pixels(&self) -> &'static [(u8, u8)] {
        match self {
            Glyph::Dot => &[(2, 2)],
            Glyph::Dash => &[(1, 2), (2, 2), (3, 2)],
        }
    }
}

/// Connection notifications from the wireless link
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
}

/// Trainer timing and feedback parameters
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrainerConfig {
    /// Basic timing unit (dot duration)
    pub unit: Duration,
    /// Playback tone frequency
    pub tone_hz: u32,
    /// Tone for a correct quiz answer
    pub correct_tone_hz: u32,
    /// Tone for a wrong quiz answer
    pub wrong_tone_hz: u32,
    /// Length of the correct/wrong cue tone
    pub cue_tone: Duration,
    /// Hold after a quiz verdict
    pub verdict_hold: Duration,
    /// Hold for the mode label
    pub label_hold: Duration,
    /// Hold for the connection status glyphs
    pub status_hold: Duration,
    /// Short hold used between feedback steps
    pub short_hold: Duration,
    /// Time each character of a shown string stays up
    pub char_period: Duration,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            unit: Duration::from_millis(200), // 6 WPM
            tone_hz: 1000,
            correct_tone_hz: 1200,
            wrong_tone_hz: 200,
            cue_tone: Duration::from_millis(300),
            verdict_hold: Duration::from_millis(1000),
            label_hold: Duration::from_millis(500),
            status_hold: Duration::from_millis(1000),
            short_hold: Duration::from_millis(500),
            char_period: Duration::from_millis(400),
        }
    }
}

impl TrainerConfig {
    /// Slowest supported speed
    pub const MIN_WPM: u32 = 1;
    /// Fastest supported speed
    pub const MAX_WPM: u32 = 40;

    /// Create a configuration at the given speed with default feedback timings
    pub fn from_wpm(wpm: u32) -> Result<Self, &'static str> {
        if !(Self::MIN_WPM..=Self::MAX_WPM).contains(&wpm) {
            return Err("WPM must be between 1 and 40");
        }

        // PARIS standard: 50 units per word
        let unit = Duration::from_millis(1200 / wpm as u64);

        Ok(Self {
            unit,
            ..Self::default()
        })
    }

    /// Get Words Per Minute from current unit timing
    pub fn wpm(&self) -> u32 {
        (1200 / self.unit.as_millis().max(1) as u32).max(1)
    }

    pub fn dot(&self) -> Duration {
        self.unit
    }

    pub fn dash(&self) -> Duration {
        self.unit * 3
    }

    /// Gap after every dot or dash
    pub fn element_pause(&self) -> Duration {
        self.unit
    }

    /// Silence for an inter-letter space
    pub fn letter_pause(&self) -> Duration {
        self.unit * 3
    }

    /// Silence for the word separator
    pub fn word_pause(&self) -> Duration {
        self.unit * 7
    }

    /// How long `text` takes to show, one character per `char_period`
    pub fn text_duration(&self, text: &str) -> Duration {
        self.char_period * text.chars().count() as u32
    }
}
