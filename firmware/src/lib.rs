#![no_std]

//! Firmware library exposing the board, a mock board and the trainer tasks

pub use embassy_executor::Spawner;
pub use embassy_time::Duration;

pub use morse_core::*;

// Re-export hardware implementations
pub use crate::ch32v203_board::*;
pub use crate::mock_hardware::*;
pub use crate::tasks::*;

/// Board the trainer task drives
#[cfg(not(feature = "mock-board"))]
pub type Board = ch32v203_board::Ch32v203Board;

#[cfg(feature = "mock-board")]
pub type Board = mock_hardware::MockBoard;

// Mock hardware module
pub mod mock_hardware {
    use embassy_time::Delay;
    use morse_core::hal::{HalError, LedDisplay, RandomSource, ToneOutput, TrainerHal};
    use morse_core::types::Icon;

    /// Display that only logs
    #[derive(Debug, Default)]
    pub struct LogDisplay;

    impl LedDisplay for LogDisplay {
        type Error = HalError;

        fn show_text(&mut self, _text: &str) -> Result<(), Self::Error> {
            #[cfg(feature = "defmt")]
            defmt::info!("🖥️ Text: {}", _text);
            Ok(())
        }

        fn show_icon(&mut self, _icon: Icon) -> Result<(), Self::Error> {
            #[cfg(feature = "defmt")]
            defmt::info!("🖥️ Icon: {:?}", _icon);
            Ok(())
        }

        fn plot(&mut self, _x: u8, _y: u8) -> Result<(), Self::Error> {
            #[cfg(feature = "defmt")]
            defmt::trace!("🖥️ Plot ({}, {})", _x, _y);
            Ok(())
        }

        fn clear(&mut self) -> Result<(), Self::Error> {
            #[cfg(feature = "defmt")]
            defmt::trace!("🖥️ Clear");
            Ok(())
        }
    }

    /// Buzzer that only logs
    #[derive(Debug, Default)]
    pub struct LogBuzzer {
        sounding: bool,
    }

    impl LogBuzzer {
        /// Get current tone state for testing
        pub fn is_sounding(&self) -> bool {
            self.sounding
        }
    }

    impl ToneOutput for LogBuzzer {
        type Error = HalError;

        fn tone_on(&mut self, _frequency_hz: u32) -> Result<(), Self::Error> {
            #[cfg(feature = "defmt")]
            defmt::debug!("🔊 Tone {} Hz", _frequency_hz);
            self.sounding = true;
            Ok(())
        }

        fn tone_off(&mut self) -> Result<(), Self::Error> {
            self.sounding = false;
            Ok(())
        }
    }

    /// Linear congruential random source
    #[derive(Debug)]
    pub struct LcgRandom {
        state: u32,
    }

    impl RandomSource for LcgRandom {
        fn next_below(&mut self, n: u32) -> u32 {
            self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (self.state >> 8) % n
        }
    }

    /// Mock hardware collection
    pub struct MockBoard {
        pub display: LogDisplay,
        pub buzzer: LogBuzzer,
        delay: Delay,
        rng: LcgRandom,
    }

    impl MockBoard {
        pub fn new() -> Self {
            #[cfg(feature = "defmt")]
            defmt::info!("🧪 Using mock hardware (for testing)");
            Self {
                display: LogDisplay,
                buzzer: LogBuzzer::default(),
                delay: Delay,
                rng: LcgRandom { state: 0x5eed },
            }
        }
    }

    impl Default for MockBoard {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TrainerHal for MockBoard {
        type Display = LogDisplay;
        type Buzzer = LogBuzzer;
        type Delay = Delay;
        type Rng = LcgRandom;

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

// Embassy tasks module
pub mod tasks {
    use super::*;
    use embassy_futures::select::{select3, Either3};
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::channel::{Receiver, Sender};
    use embassy_sync::pipe::Pipe;
    use embassy_sync::signal::Signal;
    use embassy_time::{Instant, Timer};
    use embedded_hal::digital::InputPin;

    /// Button sampling period
    pub const BUTTON_POLL: Duration = Duration::from_millis(5);
    /// Presses closer than this to the previous one are bounce
    pub const DEBOUNCE_MS: u32 = 30;
    /// Link state sampling period
    pub const LINK_POLL: Duration = Duration::from_millis(100);
    /// Matrix row dwell; five rows give a 100 Hz refresh
    pub const ROW_PERIOD: Duration = Duration::from_millis(2);

    pub type LineSender = Sender<'static, CriticalSectionRawMutex, Line, 1>;
    pub type LineReceiver = Receiver<'static, CriticalSectionRawMutex, Line, 1>;
    pub type LinkSignal = Signal<CriticalSectionRawMutex, ConnectionEvent>;

    /// Sample one button and latch debounced presses
    #[embassy_executor::task(pool_size = 2)]
    pub async fn button_task(button: Button, pin: ButtonPin, latch: &'static ButtonLatch) {
        #[cfg(feature = "defmt")]
        defmt::info!("🔘 Button {:?} task started", button);

        let mut input = EmbeddedHalButton::new(pin);
        loop {
            if let Ok(true) = input.poll_press() {
                let now_ms = Instant::now().as_millis() as u32;
                if latch.press(button, now_ms, DEBOUNCE_MS) {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("🔘 Button {:?} pressed", button);
                }
            }
            Timer::after(BUTTON_POLL).await;
        }
    }

    /// Assemble serial bytes into lines and hand them over one at a time
    #[embassy_executor::task]
    pub async fn uart_rx_task(rx: &'static Pipe<CriticalSectionRawMutex, 64>, lines: LineSender) {
        #[cfg(feature = "defmt")]
        defmt::info!("📥 UART RX task started");

        let mut assembler = LineAssembler::new();
        let mut buf = [0u8; 16];
        loop {
            let count = rx.read(&mut buf).await;
            for byte in &buf[..count] {
                if let Some(line) = assembler.push(*byte) {
                    // At most one line waits while the trainer is busy
                    offer_line(&lines, line);
                }
            }
        }
    }

    /// Watch the BLE module STATE line and report changes
    #[embassy_executor::task]
    pub async fn link_task(mut pin: LinkStatePin, events: &'static LinkSignal) {
        #[cfg(feature = "defmt")]
        defmt::info!("📡 Link task started");

        let mut connected = false;
        loop {
            if let Ok(level) = pin.is_high() {
                if level != connected {
                    connected = level;
                    events.signal(if connected {
                        ConnectionEvent::Connected
                    } else {
                        ConnectionEvent::Disconnected
                    });
                }
            }
            Timer::after(LINK_POLL).await;
        }
    }

    /// Multiplex the LED matrix one row per tick
    #[embassy_executor::task]
    pub async fn display_task() {
        #[cfg(feature = "defmt")]
        defmt::info!("🖥️ Display task started");

        let mut row = 0;
        loop {
            let frame = current_frame(Instant::now());
            scan_row(row, &frame);
            row = (row + 1) % 5;
            Timer::after(ROW_PERIOD).await;
        }
    }

    /// Wait for the next event. Buttons win over link changes, link over lines.
    pub async fn next_event(
        latch: &ButtonLatch,
        lines: &LineReceiver,
        link: &LinkSignal,
    ) -> TrainerEvent {
        let button = async {
            loop {
                if let Some(button) = latch.take_next() {
                    break button;
                }
                Timer::after(BUTTON_POLL).await;
            }
        };

        match select3(button, link.wait(), lines.receive()).await {
            Either3::First(button) => TrainerEvent::Button(button),
            Either3::Second(event) => TrainerEvent::Connection(event),
            Either3::Third(line) => TrainerEvent::Line(line),
        }
    }

    /// Own the trainer and service events strictly one at a time
    #[embassy_executor::task]
    pub async fn trainer_task(
        board: Board,
        config: TrainerConfig,
        latch: &'static ButtonLatch,
        lines: LineReceiver,
        link: &'static LinkSignal,
    ) {
        #[cfg(feature = "defmt")]
        defmt::info!("🧠 Trainer task started");

        let mut trainer = Trainer::new(board, config);
        if let Err(_e) = trainer.start().await {
            #[cfg(feature = "defmt")]
            defmt::error!("💥 Startup failed: {:?}", _e);
        }

        // Presses made during the banner are not commands
        latch.clear();

        loop {
            let event = next_event(latch, &lines, link).await;
            if let Err(_e) = trainer.handle(event).await {
                #[cfg(feature = "defmt")]
                defmt::error!("💥 Event failed: {:?}", _e);
            }
        }
    }
}

// CH32V203 board module
pub mod ch32v203_board;

// Time driver for embassy
pub mod time_driver;
