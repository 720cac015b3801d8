//! Input plumbing: pins, button latch and serial line framing

use embedded_hal_mock::eh1::pin::{Mock as PinMock, State, Transaction};
use morse_core::{Button, ButtonLatch, EmbeddedHalButton, LineAssembler, MAX_LINE_LEN};
use std::sync::Arc;

#[test]
fn test_button_edge_detection_on_mock_pin() {
    let expectations = [
        Transaction::get(State::High),
        Transaction::get(State::Low),
        Transaction::get(State::Low),
        Transaction::get(State::High),
        Transaction::get(State::Low),
    ];
    let mut button = EmbeddedHalButton::new(PinMock::new(&expectations));

    let edges: Vec<bool> = (0..5).map(|_| button.poll_press().unwrap()).collect();
    assert_eq!(edges, [false, true, false, false, true]);

    button.release().done();
}

#[test]
fn test_latch_holds_one_press_per_button_across_threads() {
    let latch = Arc::new(ButtonLatch::new());

    std::thread::scope(|scope| {
        for offset in 0..4u32 {
            let latch = Arc::clone(&latch);
            scope.spawn(move || {
                for i in 0..50u32 {
                    latch.press(Button::A, offset * 1000 + i * 40, 10);
                }
            });
        }
    });

    // However many presses landed, only one is pending
    assert_eq!(latch.take_next(), Some(Button::A));
    assert_eq!(latch.take_next(), None);
}

#[test]
fn test_latch_feeds_buttons_in_fixed_order() {
    let latch = ButtonLatch::new();
    assert!(latch.press(Button::B, 0, 30));
    assert!(latch.press(Button::A, 10, 30));
    // Bounce on B
    assert!(!latch.press(Button::B, 15, 30));

    assert_eq!(latch.take_next(), Some(Button::A));
    assert_eq!(latch.take_next(), Some(Button::B));
}

#[tokio::test]
async fn test_line_assembler_across_chunks() {
    let mut assembler = LineAssembler::new();
    let chunks: [&[u8]; 4] = [b"HEL", b"LO\r", b"\n\n.-", b"\r\n"];

    let mut lines = Vec::new();
    for chunk in chunks {
        lines.extend(assembler.feed(chunk).map(|line| line.to_string()));
        tokio::task::yield_now().await;
    }

    assert_eq!(lines, ["HELLO", ".-"]);
}

#[test]
fn test_line_assembler_recovers_after_overflow() {
    let mut assembler = LineAssembler::new();
    let mut bytes = vec![b'X'; MAX_LINE_LEN * 2];
    bytes.extend_from_slice(b"\r\nSOS\n");

    let lines: Vec<String> = assembler.feed(&bytes).map(|line| line.to_string()).collect();
    assert_eq!(lines, ["SOS"]);
    assert_eq!(assembler.dropped(), 1);
}

#[test]
fn test_mock_delay_in_tokio_test_runtime() {
    use embedded_hal_async::delay::DelayNs;
    use morse_core::hal::mock::MockDelay;

    let mut delay = MockDelay::new();
    tokio_test::block_on(async {
        delay.delay_ms(200).await;
        delay.delay_ms(600).await;
    });
    assert_eq!(delay.elapsed_ms(), 800);
}
