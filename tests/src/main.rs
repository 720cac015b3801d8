// Host-side walkthrough of a trainer session on the recording HAL

use morse_core::{Button, ConnectionEvent, HalError, Handled, Mode};
use morse_trainer_tests::{clock, log, recording_trainer, run_script, Input};

#[tokio::main]
async fn main() -> Result<(), HalError> {
    println!("🧪 Morse Trainer Session Walkthrough");

    let mut trainer = recording_trainer(2024);
    trainer.start().await?;
    println!("  🚀 Started in {} after {}ms", trainer.mode().label(), clock(&trainer).elapsed_ms());

    // Text to Morse
    let handled = run_script(&mut trainer, &[Input::Bytes(b"SOS\r\n")]).await?;
    report(&handled);
    println!("    Played: {}", log(&trainer).played_pattern(trainer.config()));

    // Morse to Text
    log(&trainer).clear();
    let handled = run_script(
        &mut trainer,
        &[Input::Press(Button::B), Input::Bytes(b"-- --- .-. ... .\n.-..\n")],
    )
    .await?;
    report(&handled);

    // Morse quiz with a deliberately wrong answer
    let handled = run_script(&mut trainer, &[Input::Press(Button::A)]).await?;
    report(&handled);
    if let Some(question) = trainer.pending_question() {
        println!("    Asked for '{}'", question.target.as_char());
    }
    let handled = run_script(&mut trainer, &[Input::Bytes(b"......\n")]).await?;
    report(&handled);

    // Wireless link
    let handled = run_script(
        &mut trainer,
        &[
            Input::Link(ConnectionEvent::Connected),
            Input::Link(ConnectionEvent::Disconnected),
        ],
    )
    .await?;
    report(&handled);

    assert_eq!(trainer.mode(), Mode::QuizMorse);
    println!("✅ Session finished at {}ms virtual time", clock(&trainer).elapsed_ms());
    println!();
    println!("📝 Run the full suite with: cargo test");
    Ok(())
}

fn report(handled: &[Handled]) {
    for outcome in handled {
        println!("  ➡️ {:?}", outcome);
    }
}
