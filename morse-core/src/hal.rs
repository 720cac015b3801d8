//! Hardware Abstraction Layer for the trainer
//!
//! The core never touches peripherals directly. It drives a display, a
//! buzzer, a delay provider and a random source through the traits below.

// Re-export time types based on feature
#[cfg(feature = "embassy-time")]
pub use embassy_time::{Duration, Instant};

#[cfg(not(feature = "embassy-time"))]
pub use self::mock_time::{Duration, Instant};

#[cfg(not(feature = "embassy-time"))]
mod mock_time {
    /// Mock instant type for compilation without embassy-time
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Instant(u64);

    impl Instant {
        pub fn from_millis(ms: u64) -> Self {
            Self(ms)
        }

        pub fn duration_since(&self, other: Instant) -> Duration {
            Duration::from_millis(self.0.saturating_sub(other.0))
        }

        pub fn as_millis(&self) -> u64 {
            self.0
        }
    }

    impl core::ops::Add<Duration> for Instant {
        type Output = Instant;

        fn add(self, rhs: Duration) -> Instant {
            Instant(self.0 + rhs.as_millis())
        }
    }

    /// Mock duration type
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Duration(u64);

    impl Duration {
        pub const fn from_millis(ms: u64) -> Self {
            Self(ms)
        }

        pub const fn as_millis(&self) -> u64 {
            self.0
        }
    }

    impl core::ops::Add for Duration {
        type Output = Duration;

        fn add(self, rhs: Duration) -> Duration {
            Duration(self.0 + rhs.0)
        }
    }

    impl core::ops::Div<u32> for Duration {
        type Output = Duration;

        fn div(self, rhs: u32) -> Duration {
            Duration(self.0 / rhs as u64)
        }
    }

    impl core::ops::Mul<u32> for Duration {
        type Output = Duration;

        fn mul(self, rhs: u32) -> Duration {
            Duration(self.0 * rhs as u64)
        }
    }
}

use embedded_hal::digital::InputPin;
use embedded_hal::pwm::SetDutyCycle;
use embedded_hal_async::delay::DelayNs;
use crate::types::Icon;

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Display operation failed
    Display,
    /// Tone generator failed
    Tone,
    /// GPIO operation failed
    Gpio,
    /// Timing operation failed
    Timing,
    /// Hardware not initialized
    NotInitialized,
    /// Invalid configuration
    InvalidConfig,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::Display => write!(f, "Display operation failed"),
            HalError::Tone => write!(f, "Tone generator failed"),
            HalError::Gpio => write!(f, "GPIO operation failed"),
            HalError::Timing => write!(f, "Timing operation failed"),
            HalError::NotInitialized => write!(f, "Hardware not initialized"),
            HalError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Trait for the LED matrix / text display
pub trait LedDisplay {
    type Error: Into<HalError>;

    /// Start showing a string, one character per period; the trainer waits
    /// out `TrainerConfig::text_duration` before its next step
    fn show_text(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Show a full-screen icon
    fn show_icon(&mut self, icon: Icon) -> Result<(), Self::Error>;

    /// Light a single pixel, leaving the rest of the screen as is
    fn plot(&mut self, x: u8, y: u8) -> Result<(), Self::Error>;

    /// Blank the screen
    fn clear(&mut self) -> Result<(), Self::Error>;
}

/// Trait for the tone generator
///
/// Tones are keyed on and off; the caller owns the timing in between.
pub trait ToneOutput {
    type Error: Into<HalError>;

    /// Start sounding at the given frequency
    fn tone_on(&mut self, frequency_hz: u32) -> Result<(), Self::Error>;

    /// Silence the buzzer
    fn tone_off(&mut self) -> Result<(), Self::Error>;
}

/// Uniform random integers
pub trait RandomSource {
    /// Uniform integer in `[0, n)`. `n` must be non-zero.
    fn next_below(&mut self, n: u32) -> u32;
}

/// Adapter drawing from any `rand` generator
pub struct RngSource<R>(pub R);

impl<R: rand::RngCore> RandomSource for RngSource<R> {
    fn next_below(&mut self, n: u32) -> u32 {
        rand::Rng::gen_range(&mut self.0, 0..n)
    }
}

/// Complete trainer HAL interface
pub trait TrainerHal {
    type Display: LedDisplay;
    type Buzzer: ToneOutput;
    type Delay: DelayNs;
    type Rng: RandomSource;

    /// Initialize hardware
    fn initialize(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    /// Access to the display
    fn display(&mut self) -> &mut Self::Display;

    /// Access to the buzzer
    fn buzzer(&mut self) -> &mut Self::Buzzer;

    /// Access to the delay provider
    fn delay(&mut self) -> &mut Self::Delay;

    /// Access to the random source
    fn rng(&mut self) -> &mut Self::Rng;
}

/// Push button on an embedded-hal input pin
///
/// Active low (pulled up, grounded when pressed).
pub struct EmbeddedHalButton<P> {
    pin: P,
    was_pressed: bool,
}

impl<P> EmbeddedHalButton<P>
where
    P: InputPin,
{
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            was_pressed: false,
        }
    }

    /// Check if the button is currently held
    pub fn is_pressed(&mut self) -> Result<bool, HalError> {
        self.pin.is_low().map_err(|_| HalError::Gpio)
    }

    /// Sample the pin and report a released-to-pressed edge
    pub fn poll_press(&mut self) -> Result<bool, HalError> {
        let pressed = self.is_pressed()?;
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        Ok(edge)
    }

    /// Release the underlying pin
    pub fn release(self) -> P {
        self.pin
    }
}

/// Piezo buzzer on an embedded-hal PWM channel
///
/// The PWM period is fixed by the board timer, so the requested frequency is
/// only recorded; boards with a retunable timer implement `ToneOutput` directly.
pub struct EmbeddedHalBuzzer<P> {
    pwm: P,
    frequency_hz: Option<u32>,
}

impl<P> EmbeddedHalBuzzer<P>
where
    P: SetDutyCycle,
{
    pub fn new(pwm: P) -> Self {
        Self {
            pwm,
            frequency_hz: None,
        }
    }

    /// Frequency of the tone currently sounding
    pub fn frequency_hz(&self) -> Option<u32> {
        self.frequency_hz
    }
}

impl<P> ToneOutput for EmbeddedHalBuzzer<P>
where
    P: SetDutyCycle,
{
    type Error = HalError;

    fn tone_on(&mut self, frequency_hz: u32) -> Result<(), Self::Error> {
        self.pwm
            .set_duty_cycle_percent(50)
            .map_err(|_| HalError::Tone)?;
        self.frequency_hz = Some(frequency_hz);
        Ok(())
    }

    fn tone_off(&mut self) -> Result<(), Self::Error> {
        self.pwm
            .set_duty_cycle_fully_off()
            .map_err(|_| HalError::Tone)?;
        self.frequency_hz = None;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use core::cell::RefCell;

    /// Display that remembers what it shows
    #[derive(Default)]
    pub struct MockDisplay {
        text: RefCell<Option<heapless::String<16>>>,
        icon: RefCell<Option<Icon>>,
        pixels: RefCell<[[bool; 5]; 5]>,
    }

    impl MockDisplay {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn text(&self) -> Option<heapless::String<16>> {
            self.text.borrow().clone()
        }

        pub fn icon(&self) -> Option<Icon> {
            *self.icon.borrow()
        }

        pub fn is_lit(&self, x: u8, y: u8) -> bool {
            self.pixels.borrow()[y as usize][x as usize]
        }

        pub fn is_blank(&self) -> bool {
            self.text.borrow().is_none()
                && self.icon.borrow().is_none()
                && self.pixels.borrow().iter().flatten().all(|lit| !lit)
        }
    }

    impl LedDisplay for MockDisplay {
        type Error = HalError;

        fn show_text(&mut self, text: &str) -> Result<(), Self::Error> {
            let mut shown = heapless::String::new();
            shown.push_str(text).map_err(|_| HalError::Display)?;
            self.clear()?;
            *self.text.borrow_mut() = Some(shown);
            Ok(())
        }

        fn show_icon(&mut self, icon: Icon) -> Result<(), Self::Error> {
            self.clear()?;
            *self.icon.borrow_mut() = Some(icon);
            Ok(())
        }

        fn plot(&mut self, x: u8, y: u8) -> Result<(), Self::Error> {
            if x > 4 || y > 4 {
                return Err(HalError::InvalidConfig);
            }
            self.pixels.borrow_mut()[y as usize][x as usize] = true;
            Ok(())
        }

        fn clear(&mut self) -> Result<(), Self::Error> {
            *self.text.borrow_mut() = None;
            *self.icon.borrow_mut() = None;
            *self.pixels.borrow_mut() = [[false; 5]; 5];
            Ok(())
        }
    }

    /// Buzzer that tracks its keyed state
    #[derive(Default)]
    pub struct MockBuzzer {
        frequency_hz: RefCell<Option<u32>>,
        tones_started: RefCell<u32>,
    }

    impl MockBuzzer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn is_sounding(&self) -> bool {
            self.frequency_hz.borrow().is_some()
        }

        pub fn frequency_hz(&self) -> Option<u32> {
            *self.frequency_hz.borrow()
        }

        pub fn tones_started(&self) -> u32 {
            *self.tones_started.borrow()
        }
    }

    impl ToneOutput for MockBuzzer {
        type Error = HalError;

        fn tone_on(&mut self, frequency_hz: u32) -> Result<(), Self::Error> {
            if frequency_hz == 0 {
                return Err(HalError::Tone);
            }
            *self.frequency_hz.borrow_mut() = Some(frequency_hz);
            *self.tones_started.borrow_mut() += 1;
            Ok(())
        }

        fn tone_off(&mut self) -> Result<(), Self::Error> {
            *self.frequency_hz.borrow_mut() = None;
            Ok(())
        }
    }

    /// Delay that returns immediately and sums what was requested
    #[derive(Default)]
    pub struct MockDelay {
        pub elapsed_ns: u64,
    }

    impl MockDelay {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn elapsed_ms(&self) -> u64 {
            self.elapsed_ns / 1_000_000
        }
    }

    impl DelayNs for MockDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.elapsed_ns += ns as u64;
        }
    }

    /// Random source replaying a fixed script, wrapping around
    pub struct ScriptedRandom<const N: usize> {
        values: [u32; N],
        next: usize,
    }

    impl<const N: usize> ScriptedRandom<N> {
        pub fn new(values: [u32; N]) -> Self {
            Self { values, next: 0 }
        }

        /// Number of draws made so far
        pub fn draws(&self) -> usize {
            self.next
        }
    }

    impl<const N: usize> RandomSource for ScriptedRandom<N> {
        fn next_below(&mut self, n: u32) -> u32 {
            let value = self.values[self.next % N];
            self.next += 1;
            value % n
        }
    }

    /// Mock hardware collection
    pub struct MockTrainerHal<const N: usize> {
        pub display: MockDisplay,
        pub buzzer: MockBuzzer,
        pub delay: MockDelay,
        pub rng: ScriptedRandom<N>,
    }

    impl<const N: usize> MockTrainerHal<N> {
        pub fn new(script: [u32; N]) -> Self {
            Self {
                display: MockDisplay::new(),
                buzzer: MockBuzzer::new(),
                delay: MockDelay::new(),
                rng: ScriptedRandom::new(script),
            }
        }
    }

    impl<const N: usize> TrainerHal for MockTrainerHal<N> {
        type Display = MockDisplay;
        type Buzzer = MockBuzzer;
        type Delay = MockDelay;
        type Rng = ScriptedRandom<N>;

        fn display(&mut self) -> &mut Self::Display {
            &mut self.display
        }

        fn buzzer(&mut self) -> &mut Self::Buzzer {
            &mut self.buzzer
        }

        fn delay(&mut self) -> &mut Self::Delay {
            &mut self.delay
        }

        fn rng(&mut self) -> &mut Self::Rng {
            &mut self.rng
        }
    }
}
