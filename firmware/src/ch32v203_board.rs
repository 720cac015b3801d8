//! CH32V203 board support
//!
//! 64KB Flash / 20KB RAM. 5x5 LED matrix on GPIOB, piezo buzzer on TIM2 CH1
//! (PA15), buttons A/B on PA0/PA1, BLE-UART module on USART1 with its
//! connection STATE line on PA4.

use core::cell::RefCell;
use core::convert::Infallible;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::pipe::Pipe;
use embassy_time::{Delay, Duration, Instant};
use embedded_hal::digital::{ErrorType as DigitalErrorType, InputPin};
use embedded_hal::pwm::{ErrorType as PwmErrorType, SetDutyCycle};
use heapless::String;
use portable_atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

use morse_core::{
    Button, EmbeddedHalBuzzer, HalError, Icon, LedDisplay, RandomSource, ToneOutput, TrainerHal,
};

/// CH32V203 pin configuration constants
pub mod pins {
    /// Button A input pin
    pub const BUTTON_A_PIN: u8 = 0; // PA0
    /// Button B input pin
    pub const BUTTON_B_PIN: u8 = 1; // PA1
    /// BLE module connection state input
    pub const LINK_STATE_PIN: u8 = 4; // PA4
    /// USART1 RX from the BLE module
    pub const UART_RX_PIN: u8 = 10; // PA10
    /// Buzzer PWM output (TIM2 CH1 remapped)
    pub const BUZZER_PIN: u8 = 15; // PA15
    /// Matrix rows on PB0..PB4, columns on PB5..PB9
    pub const MATRIX_ROW_BASE: u8 = 0;
    pub const MATRIX_COL_BASE: u8 = 5;
}

/// CH32V203 memory layout information
pub mod memory {
    /// Available Flash memory (actual usable)
    pub const FLASH_SIZE: u32 = 60 * 1024;
    /// Available RAM
    pub const RAM_SIZE: u32 = 20 * 1024;
    /// Recommended Embassy task arena size
    pub const TASK_ARENA_SIZE: u32 = 8 * 1024;
}

static BUTTON_LOW: [AtomicBool; 2] = [AtomicBool::new(false), AtomicBool::new(false)];
static LINK_CONNECTED: AtomicBool = AtomicBool::new(false);

/// EXTI0/EXTI1 handler body: record the new pin level
pub fn on_button_exti(button: Button, low: bool) {
    BUTTON_LOW[button.index()].store(low, Ordering::Release);
}

/// EXTI4 handler body: BLE module STATE line changed
pub fn on_link_state_exti(connected: bool) {
    LINK_CONNECTED.store(connected, Ordering::Release);
}

/// Button input (PA0/PA1, pulled up, active low) mirrored from EXTI
#[derive(Copy, Clone)]
pub struct ButtonPin {
    button: Button,
}

impl ButtonPin {
    pub const fn new(button: Button) -> Self {
        Self { button }
    }
}

impl DigitalErrorType for ButtonPin {
    type Error = Infallible;
}

impl InputPin for ButtonPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!BUTTON_LOW[self.button.index()].load(Ordering::Acquire))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(BUTTON_LOW[self.button.index()].load(Ordering::Acquire))
    }
}

/// BLE module STATE line (PA4, high while a central is connected)
#[derive(Copy, Clone, Default)]
pub struct LinkStatePin;

impl DigitalErrorType for LinkStatePin {
    type Error = Infallible;
}

impl InputPin for LinkStatePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(LINK_CONNECTED.load(Ordering::Acquire))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!LINK_CONNECTED.load(Ordering::Acquire))
    }
}

/// Bytes received from the BLE module, filled from the USART1 interrupt
pub static UART_RX: Pipe<CriticalSectionRawMutex, 64> = Pipe::new();

static UART_OVERRUNS: AtomicU32 = AtomicU32::new(0);

/// USART1 RXNE handler body
pub fn on_usart1_rx(byte: u8) {
    if UART_RX.try_write(&[byte]).is_err() {
        UART_OVERRUNS.fetch_add(1, Ordering::Relaxed);
    }
}

/// Bytes lost because the receive pipe was full
pub fn uart_overruns() -> u32 {
    UART_OVERRUNS.load(Ordering::Relaxed)
}

/// One 5x5 frame, one byte per row, bit 4 is the leftmost column
pub type Frame = [u8; 5];

const BLANK: Frame = [0; 5];

/// Time each character of a longer string stays up
pub const CHAR_PERIOD: Duration = Duration::from_millis(400);

fn icon_frame(icon: Icon) -> Frame {
    match icon {
        Icon::Yes => [0b00000, 0b00001, 0b00010, 0b10100, 0b01000],
        Icon::No => [0b10001, 0b01010, 0b00100, 0b01010, 0b10001],
        Icon::Pending => [0b00100, 0b01010, 0b10001, 0b01010, 0b00100],
        Icon::MusicNote => [0b00100, 0b00110, 0b00101, 0b11100, 0b11100],
    }
}

fn char_frame(c: char) -> Frame {
    match c.to_ascii_uppercase() {
        'A' => [0b01100, 0b10010, 0b11110, 0b10010, 0b10010],
        'B' => [0b11100, 0b10010, 0b11100, 0b10010, 0b11100],
        'C' => [0b01110, 0b10000, 0b10000, 0b10000, 0b01110],
        'D' => [0b11100, 0b10010, 0b10010, 0b10010, 0b11100],
        'E' => [0b11110, 0b10000, 0b11100, 0b10000, 0b11110],
        'F' => [0b11110, 0b10000, 0b11100, 0b10000, 0b10000],
        'G' => [0b01110, 0b10000, 0b10011, 0b10001, 0b01110],
        'H' => [0b10010, 0b10010, 0b11110, 0b10010, 0b10010],
        'I' => [0b11100, 0b01000, 0b01000, 0b01000, 0b11100],
        'J' => [0b11111, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10010, 0b10100, 0b11000, 0b10100, 0b10010],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b11110],
        'M' => [0b10001, 0b11011, 0b10101, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001],
        'O' => [0b01100, 0b10010, 0b10010, 0b10010, 0b01100],
        'P' => [0b11100, 0b10010, 0b11100, 0b10000, 0b10000],
        'Q' => [0b01100, 0b10010, 0b10010, 0b01100, 0b00110],
        'R' => [0b11100, 0b10010, 0b11100, 0b10010, 0b10001],
        'S' => [0b01110, 0b10000, 0b01100, 0b00010, 0b11100],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10010, 0b10010, 0b10010, 0b10010, 0b01100],
        'V' => [0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10101, 0b11011, 0b10001],
        'X' => [0b10010, 0b10010, 0b01100, 0b10010, 0b10010],
        'Y' => [0b10001, 0b01010, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11110, 0b00100, 0b01000, 0b10000, 0b11110],
        '0' => [0b01100, 0b10010, 0b10010, 0b10010, 0b01100],
        '1' => [0b01000, 0b11000, 0b01000, 0b01000, 0b11100],
        '2' => [0b11100, 0b00010, 0b01100, 0b10000, 0b11110],
        '3' => [0b11110, 0b00010, 0b00100, 0b10010, 0b01100],
        '4' => [0b00110, 0b01010, 0b10010, 0b11111, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b11110],
        '6' => [0b00010, 0b00100, 0b01110, 0b10001, 0b01110],
        '7' => [0b11111, 0b00010, 0b00100, 0b01000, 0b10000],
        '8' => [0b01110, 0b10001, 0b01110, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b01110, 0b00100, 0b01000],
        '?' => [0b01110, 0b10001, 0b00110, 0b00000, 0b00100],
        '=' => [0b00000, 0b11110, 0b00000, 0b11110, 0b00000],
        _ => BLANK,
    }
}

/// What the matrix is currently showing
enum Content {
    Pixels(Frame),
    Text { text: String<16>, since: Instant },
}

static SCREEN: Mutex<CriticalSectionRawMutex, RefCell<Content>> =
    Mutex::new(RefCell::new(Content::Pixels(BLANK)));

/// Frame to scan out at `now`. Strings step one character per period and
/// stay on the last one.
pub fn current_frame(now: Instant) -> Frame {
    SCREEN.lock(|screen| match &*screen.borrow() {
        Content::Pixels(frame) => *frame,
        Content::Text { text, since } => {
            let last = text.chars().count().saturating_sub(1) as u64;
            let period = CHAR_PERIOD.as_millis().max(1);
            let index = (now.duration_since(*since).as_millis() / period).min(last);
            text.chars().nth(index as usize).map_or(BLANK, char_frame)
        }
    })
}

/// Drive one multiplexed row: rows are active high, columns sink current
pub fn scan_row(row: usize, frame: &Frame) {
    let columns = frame[row % 5];
    // GPIOB OUTDR: row bit on PB0..PB4, inverted column bits on PB5..PB9
    let outdr = (1u16 << (pins::MATRIX_ROW_BASE as usize + row % 5))
        | ((!columns as u16 & 0x1f) << pins::MATRIX_COL_BASE);
    MATRIX_OUTDR.store(outdr, Ordering::Relaxed);
}

static MATRIX_OUTDR: AtomicU16 = AtomicU16::new(0);

/// Display handle writing into the shared frame buffer
pub struct MatrixDisplay;

impl LedDisplay for MatrixDisplay {
    type Error = HalError;

    fn show_text(&mut self, text: &str) -> Result<(), Self::Error> {
        let mut shown = String::new();
        shown.push_str(text).map_err(|_| HalError::Display)?;
        let since = Instant::now();
        SCREEN.lock(|screen| *screen.borrow_mut() = Content::Text { text: shown, since });
        Ok(())
    }

    fn show_icon(&mut self, icon: Icon) -> Result<(), Self::Error> {
        SCREEN.lock(|screen| *screen.borrow_mut() = Content::Pixels(icon_frame(icon)));
        Ok(())
    }

    fn plot(&mut self, x: u8, y: u8) -> Result<(), Self::Error> {
        if x > 4 || y > 4 {
            return Err(HalError::InvalidConfig);
        }
        SCREEN.lock(|screen| {
            let mut content = screen.borrow_mut();
            // Plotting over text starts from a blank frame
            let mut frame = match &*content {
                Content::Pixels(frame) => *frame,
                Content::Text { .. } => BLANK,
            };
            frame[y as usize] |= 1 << (4 - x);
            *content = Content::Pixels(frame);
        });
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        SCREEN.lock(|screen| *screen.borrow_mut() = Content::Pixels(BLANK));
        Ok(())
    }
}

/// TIM2 counter clock after the prescaler
const TIMER_CLOCK_HZ: u32 = 1_000_000;

static TIM2_ATRLR: AtomicU16 = AtomicU16::new(1000);
static TIM2_CH1CVR: AtomicU16 = AtomicU16::new(0);

/// TIM2 channel 1 compare register
pub struct Tim2Ch1;

impl PwmErrorType for Tim2Ch1 {
    type Error = Infallible;
}

impl SetDutyCycle for Tim2Ch1 {
    fn max_duty_cycle(&self) -> u16 {
        TIM2_ATRLR.load(Ordering::Relaxed)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        TIM2_CH1CVR.store(duty, Ordering::Relaxed);
        Ok(())
    }
}

/// Piezo buzzer: retunes the TIM2 period, then keys the channel
pub struct PiezoBuzzer {
    channel: EmbeddedHalBuzzer<Tim2Ch1>,
}

impl PiezoBuzzer {
    pub fn new() -> Self {
        Self {
            channel: EmbeddedHalBuzzer::new(Tim2Ch1),
        }
    }
}

impl Default for PiezoBuzzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneOutput for PiezoBuzzer {
    type Error = HalError;

    fn tone_on(&mut self, frequency_hz: u32) -> Result<(), Self::Error> {
        if frequency_hz == 0 {
            return Err(HalError::Tone);
        }
        let period = u16::try_from(TIMER_CLOCK_HZ / frequency_hz).map_err(|_| HalError::Tone)?;
        TIM2_ATRLR.store(period, Ordering::Relaxed);
        self.channel.tone_on(frequency_hz)
    }

    fn tone_off(&mut self) -> Result<(), Self::Error> {
        self.channel.tone_off()
    }
}

/// `SmallRng` stirred with the tick counter on every draw.
///
/// Draws happen on button presses and answers, so their timing is the
/// entropy source.
pub struct JitterRandom {
    rng: SmallRng,
}

impl JitterRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for JitterRandom {
    fn next_below(&mut self, n: u32) -> u32 {
        let stirred = self.rng.next_u64() ^ Instant::now().as_ticks();
        self.rng = SmallRng::seed_from_u64(stirred);
        self.rng.gen_range(0..n)
    }
}

/// CH32V203 hardware abstraction layer implementation
pub struct Ch32v203Board {
    display: MatrixDisplay,
    buzzer: PiezoBuzzer,
    delay: Delay,
    rng: JitterRandom,
}

impl Ch32v203Board {
    pub fn new() -> Self {
        Self {
            display: MatrixDisplay,
            buzzer: PiezoBuzzer::new(),
            delay: Delay,
            rng: JitterRandom::new(Instant::now().as_ticks()),
        }
    }
}

impl Default for Ch32v203Board {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainerHal for Ch32v203Board {
    type Display = MatrixDisplay;
    type Buzzer = PiezoBuzzer;
    type Delay = Delay;
    type Rng = JitterRandom;

    fn initialize(&mut self) -> Result<(), HalError> {
        // GPIO, TIM2 and USART1 setup:
        // 1. PA0/PA1 input pull-up, EXTI0/EXTI1 on both edges
        // 2. PA4 floating input, EXTI4 on both edges
        // 3. PB0..PB9 push-pull outputs for the matrix
        // 4. TIM2 prescaler to TIMER_CLOCK_HZ, CH1 PWM mode 1 on PA15
        // 5. USART1 9600 8N1, RXNE interrupt
        self.display.clear()?;
        self.buzzer.tone_off()?;

        #[cfg(feature = "defmt")]
        defmt::info!("🔌 CH32V203 board initialized");

        Ok(())
    }

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
