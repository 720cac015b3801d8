#![no_std]
#![no_main]

#[cfg(feature = "defmt")]
use defmt_rtt as _;

// RISC-V runtime
use riscv_rt as _;

// Panic handler
#[cfg(feature = "defmt")]
use panic_probe as _;
#[cfg(not(feature = "defmt"))]
use panic_halt as _;

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Duration;

use morse_trainer_firmware::*;

// Static resources
static BUTTONS: ButtonLatch = ButtonLatch::new();
static LINES: Channel<CriticalSectionRawMutex, Line, 1> = Channel::new();
static LINK: LinkSignal = LinkSignal::new();

/// Main firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    #[cfg(feature = "defmt")]
    defmt::info!("🔧 Morse Trainer Firmware Starting...");

    let board = init_hardware();
    #[cfg(feature = "defmt")]
    defmt::info!("✅ Hardware initialized");

    let config = TrainerConfig {
        char_period: CHAR_PERIOD,
        ..default_config()
    };
    #[cfg(feature = "defmt")]
    defmt::info!("⚙️ Trainer config: {} WPM, tone {} Hz", config.wpm(), config.tone_hz);

    #[cfg(feature = "defmt")]
    defmt::info!("🚀 Spawning trainer tasks...");

    spawner.must_spawn(display_task());
    spawner.must_spawn(button_task(Button::A, ButtonPin::new(Button::A), &BUTTONS));
    spawner.must_spawn(button_task(Button::B, ButtonPin::new(Button::B), &BUTTONS));
    spawner.must_spawn(uart_rx_task(&UART_RX, LINES.sender()));
    spawner.must_spawn(link_task(LinkStatePin, &LINK));
    spawner.must_spawn(trainer_task(board, config, &BUTTONS, LINES.receiver(), &LINK));

    #[cfg(feature = "defmt")]
    defmt::info!("✨ Trainer firmware ready!");

    // Main supervision loop
    loop {
        embassy_time::Timer::after(Duration::from_secs(1)).await;
        #[cfg(feature = "defmt")]
        defmt::trace!("💓 Heartbeat, {} UART overruns", uart_overruns());
    }
}

/// Initialize hardware abstraction layer
fn init_hardware() -> Board {
    #[cfg(feature = "defmt")]
    defmt::info!("🔌 Initializing hardware...");

    Board::new()
}
