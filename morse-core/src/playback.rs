//! Timed playback of Morse patterns
//!
//! A pattern is first expanded into a deterministic sequence of [`Step`]s,
//! then executed against the HAL. Keeping the two apart lets tests inspect
//! the exact schedule without a clock.

use heapless::Deque;
use embedded_hal_async::delay::DelayNs;

use crate::hal::{Duration, HalError, LedDisplay, ToneOutput, TrainerHal};
use crate::types::{Glyph, Icon, TrainerConfig};

/// Playable elements of a textual pattern
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Element {
    /// Short mark
    Dot,
    /// Long mark
    Dash,
    /// Space between letters
    LetterSpace,
    /// Word separator token
    WordSpace,
}

impl Element {
    /// Parse one pattern character; anything else is not playable
    pub const fn from_char(c: char) -> Option<Element> {
        match c {
            '.' => Some(Element::Dot),
            '-' => Some(Element::Dash),
            ' ' => Some(Element::LetterSpace),
            '/' => Some(Element::WordSpace),
            _ => None,
        }
    }

    /// Returns true if this element sounds a tone
    pub const fn is_keyed(&self) -> bool {
        match self {
            Element::Dot | Element::Dash => true,
            Element::LetterSpace | Element::WordSpace => false,
        }
    }

    /// Glyph shown while the tone sounds
    pub const fn glyph(&self) -> Option<Glyph> {
        match self {
            Element::Dot => Some(Glyph::Dot),
            Element::Dash => Some(Glyph::Dash),
            Element::LetterSpace | Element::WordSpace => None,
        }
    }

    /// Tone length for marks, silence length for spaces
    pub fn duration(&self, config: &TrainerConfig) -> Duration {
        match self {
            Element::Dot => config.dot(),
            Element::Dash => config.dash(),
            Element::LetterSpace => config.letter_pause(),
            Element::WordSpace => config.word_pause(),
        }
    }
}

/// One timed unit of playback
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Step {
    /// Show an icon without waiting
    Icon(Icon),
    /// Plot the glyph and sound the tone for the duration
    Mark { glyph: Glyph, duration: Duration },
    /// Wait silently, display unchanged
    Gap(Duration),
    /// Blank the display
    Clear,
}

impl Step {
    /// Wall-clock time this step occupies
    pub fn duration(&self) -> Duration {
        match self {
            Step::Mark { duration, .. } | Step::Gap(duration) => *duration,
            Step::Icon(_) | Step::Clear => Duration::from_millis(0),
        }
    }
}

/// Iterator expanding a pattern into playback steps, left to right
pub struct Plan<'a> {
    chars: core::str::Chars<'a>,
    config: TrainerConfig,
    pending: Deque<Step, 4>,
    started: bool,
    finished: bool,
}

impl<'a> Plan<'a> {
    fn push(&mut self, step: Step) {
        // Capacity covers the longest expansion (icon + mark + gap + clear)
        let _ = self.pending.push_back(step);
    }

    fn expand(&mut self, element: Element) {
        if !self.started {
            self.started = true;
            self.push(Step::Icon(Icon::MusicNote));
        }

        match element.glyph() {
            Some(glyph) => {
                self.push(Step::Mark {
                    glyph,
                    duration: element.duration(&self.config),
                });
                self.push(Step::Gap(self.config.element_pause()));
                self.push(Step::Clear);
            }
            None => self.push(Step::Gap(element.duration(&self.config))),
        }
    }
}

impl<'a> Iterator for Plan<'a> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if let Some(step) = self.pending.pop_front() {
            return Some(step);
        }

        while let Some(c) = self.chars.next() {
            if let Some(element) = Element::from_char(c) {
                self.expand(element);
                return self.pending.pop_front();
            }
        }

        // Final clear, only if anything was played
        if self.started && !self.finished {
            self.finished = true;
            return Some(Step::Clear);
        }
        None
    }
}

/// Expand a pattern into its playback schedule.
///
/// Characters other than `.`, `-`, space and `/` are skipped. A pattern
/// with no playable element yields no steps.
pub fn plan<'a>(pattern: &'a str, config: &TrainerConfig) -> Plan<'a> {
    Plan {
        chars: pattern.chars(),
        config: *config,
        pending: Deque::new(),
        started: false,
        finished: false,
    }
}

/// Total time a pattern takes to play
pub fn total_duration(pattern: &str, config: &TrainerConfig) -> Duration {
    plan(pattern, config).fold(Duration::from_millis(0), |acc, step| acc + step.duration())
}

/// Block for the given duration on the HAL delay
pub(crate) async fn hold<H: TrainerHal>(hal: &mut H, duration: Duration) {
    let ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
    hal.delay().delay_ms(ms).await;
}

/// Sound a tone for the given duration, then silence it
pub(crate) async fn sound<H: TrainerHal>(
    hal: &mut H,
    frequency_hz: u32,
    duration: Duration,
) -> Result<(), HalError> {
    hal.buzzer().tone_on(frequency_hz).map_err(Into::<HalError>::into)?;
    hold(hal, duration).await;
    hal.buzzer().tone_off().map_err(Into::into)
}

/// Play a pattern to completion.
///
/// Runs every step in order and returns only when the display has been
/// cleared again. There is no cancellation.
pub async fn play<H: TrainerHal>(
    hal: &mut H,
    pattern: &str,
    config: &TrainerConfig,
) -> Result<(), HalError> {
    #[cfg(feature = "defmt")]
    defmt::debug!("🎵 Playing '{}'", pattern);

    for step in plan(pattern, config) {
        match step {
            Step::Icon(icon) => hal.display().show_icon(icon).map_err(Into::<HalError>::into)?,
            Step::Mark { glyph, duration } => {
                for &(x, y) in glyph.pixels() {
                    hal.display().plot(x, y).map_err(Into::<HalError>::into)?;
                }
                sound(hal, config.tone_hz, duration).await?;
            }
            Step::Gap(duration) => hold(hal, duration).await,
            Step::Clear => hal.display().clear().map_err(Into::<HalError>::into)?,
        }
    }
    Ok(())
}
