//! End-to-end trainer scenarios on the recording HAL

use crate::{clock, line, log, recording_trainer, run_script, Input};
use morse_core::test_utils::output_capture::{HalEvent, ToneSpan};
use morse_core::{
    decode, encode, Button, ConnectionEvent, DecodeFailure, Handled, Icon, LineOutcome, Mode,
    QuizKind, Symbol, TrainerConfig, TrainerEvent, Verdict,
};
use morse_core::test_utils::output_capture::EventLog;
use rstest::rstest;

/// Time from a text appearing until the next display or tone event
fn shown_for(log: &EventLog, text: &str) -> Option<u64> {
    let events = log.events();
    let index = events
        .iter()
        .position(|r| r.event == HalEvent::Text(text.to_string()))?;
    events.get(index + 1).map(|next| next.at_ms - events[index].at_ms)
}

#[rstest]
#[case("SOS", "... --- ...")]
#[case("sos", "... --- ...")]
#[case("HI U", ".... .. / ..-")]
#[case("A?B", ".- -...")]
#[case("8", "---..")]
#[case("", "")]
fn test_encode_cases(#[case] text: &str, #[case] expected: &str) {
    assert_eq!(encode(text).unwrap().pattern.as_str(), expected);
}

#[rstest]
#[case(".-", Some('A'))]
#[case(" -- ", Some('M'))]
#[case("--..", Some('Z'))]
#[case("/", Some(' '))]
#[case(".... .", None)]
#[case(".- -", None)]
#[case("", None)]
fn test_decode_cases(#[case] pattern: &str, #[case] expected: Option<char>) {
    assert_eq!(decode(pattern).map(|symbol| symbol.as_char()), expected);
}

#[rstest]
#[case(Mode::TextToMorse, Button::A, Mode::QuizLetter, Some(QuizKind::Letter))]
#[case(Mode::TextToMorse, Button::B, Mode::MorseToText, None)]
#[case(Mode::QuizLetter, Button::A, Mode::TextToMorse, None)]
#[case(Mode::QuizLetter, Button::B, Mode::QuizMorse, Some(QuizKind::Morse))]
#[case(Mode::MorseToText, Button::A, Mode::QuizMorse, Some(QuizKind::Morse))]
#[case(Mode::MorseToText, Button::B, Mode::TextToMorse, None)]
#[case(Mode::QuizMorse, Button::A, Mode::MorseToText, None)]
#[case(Mode::QuizMorse, Button::B, Mode::QuizLetter, Some(QuizKind::Letter))]
fn test_transition_table(
    #[case] from: Mode,
    #[case] button: Button,
    #[case] to: Mode,
    #[case] quiz: Option<QuizKind>,
) {
    let mut controller = morse_core::ModeController::with_mode(from);
    let transition = controller.handle(button);
    assert_eq!(transition.to, to);
    assert_eq!(transition.entry_quiz(), quiz);
}

#[rstest]
#[case("SOS", "... --- ...")]
#[case("hi u", ".... .. / ..-")]
#[case("73", "--... ...--")]
#[case("PARIS", ".--. .- .-. .. ...")]
#[tokio::test]
async fn test_t1_playback_sounds_pattern(#[case] text: &str, #[case] expected: &str) {
    let mut trainer = recording_trainer(1);
    let outcome = trainer.on_line(text).await.unwrap();

    assert_eq!(outcome, LineOutcome::Played { skipped: 0 });
    assert_eq!(log(&trainer).played_pattern(trainer.config()), expected);
}

#[tokio::test]
async fn test_startup_banner() {
    let mut trainer = recording_trainer(1);
    trainer.start().await.unwrap();

    assert_eq!(log(&trainer).texts(), ["READY", "T1"]);
    // READY one character at a time, short hold, then the label
    assert_eq!(clock(&trainer).elapsed_ms(), 2000 + 500 + 800);
    assert_eq!(shown_for(&log(&trainer), "READY"), Some(2500));
}

#[tokio::test]
async fn test_t1_playback_timeline() {
    let mut trainer = recording_trainer(1);
    trainer.on_line("ET").await.unwrap();

    let log = log(&trainer);
    assert_eq!(
        log.tone_spans(),
        [
            ToneSpan { frequency_hz: 1000, start_ms: 0, duration_ms: 200 },
            ToneSpan { frequency_hz: 1000, start_ms: 1000, duration_ms: 600 },
        ]
    );
    assert_eq!(log.icons(), [Icon::MusicNote]);

    // Dash glyph is the three pixel bar
    let plots: Vec<HalEvent> = log
        .events()
        .into_iter()
        .filter(|r| r.at_ms == 1000 && matches!(r.event, HalEvent::Plot(..)))
        .map(|r| r.event)
        .collect();
    assert_eq!(plots, [HalEvent::Plot(1, 2), HalEvent::Plot(2, 2), HalEvent::Plot(3, 2)]);

    // Ends cleared, after the final element pause
    let last = log.events().pop().unwrap();
    assert_eq!(last.event, HalEvent::Clear);
    assert_eq!(last.at_ms, 1800);
    assert_eq!(clock(&trainer).elapsed_ms(), 1800);
}

#[tokio::test]
async fn test_t1_unrecognized_only_is_silent() {
    let mut trainer = recording_trainer(1);
    let outcome = trainer.on_line("#$%").await.unwrap();

    assert_eq!(outcome, LineOutcome::Played { skipped: 3 });
    assert!(log(&trainer).events().is_empty());
    assert_eq!(clock(&trainer).elapsed_ms(), 0);
}

#[tokio::test]
async fn test_t2_no_match_is_not_malformed() {
    let mut trainer = recording_trainer(1);
    trainer.on_button(Button::B).await.unwrap();

    let outcome = trainer.on_line(".- -").await.unwrap();
    assert_eq!(outcome, LineOutcome::DecodeFailed(DecodeFailure::NoMatch));
    assert_eq!(log(&trainer).icons().last(), Some(&Icon::No));
}

#[tokio::test]
async fn test_t2_success_shows_letter() {
    let mut trainer = recording_trainer(1);
    trainer.on_button(Button::B).await.unwrap();
    log(&trainer).clear();

    let outcome = trainer.on_line("-.-.").await.unwrap();
    assert_eq!(outcome, LineOutcome::Decoded(Symbol::from_char('C').unwrap()));
    assert_eq!(log(&trainer).icons(), [Icon::Yes]);
    assert_eq!(log(&trainer).texts(), ["C"]);
}

#[tokio::test]
async fn test_q2_malformed_keeps_question() {
    let mut trainer = recording_trainer(9);
    trainer.on_button(Button::B).await.unwrap();
    trainer.on_button(Button::A).await.unwrap();
    assert_eq!(trainer.mode(), Mode::QuizMorse);

    let before = trainer.pending_question();
    log(&trainer).clear();
    let start = clock(&trainer).elapsed_ms();

    let outcome = trainer.on_line("X").await.unwrap();
    assert_eq!(outcome, LineOutcome::MorseRejected);
    assert_eq!(trainer.pending_question(), before);
    assert_eq!(log(&trainer).icons(), [Icon::No, Icon::Pending]);
    assert_eq!(clock(&trainer).elapsed_ms() - start, 500);
}

#[tokio::test]
async fn test_button_cycle_returns_to_t1() {
    let mut trainer = recording_trainer(3);
    for button in [Button::A, Button::B, Button::A, Button::B] {
        trainer.on_button(button).await.unwrap();
    }
    assert_eq!(trainer.mode(), Mode::TextToMorse);

    let labels: Vec<String> = log(&trainer)
        .texts()
        .into_iter()
        .filter(|text| text.len() == 2 && !text.starts_with('='))
        .collect();
    assert_eq!(labels, ["Q1", "Q2", "T2", "T1"]);
}

#[tokio::test]
async fn test_entering_q1_presents_question_before_label() {
    let mut trainer = recording_trainer(5);
    trainer.on_button(Button::A).await.unwrap();

    let question = trainer.pending_question().unwrap();
    let log = log(&trainer);
    assert_eq!(log.texts(), ["?", "Q1"]);
    assert_eq!(log.icons(), [Icon::MusicNote, Icon::Pending]);
    assert_eq!(log.played_pattern(trainer.config()), question.expected_pattern());
    assert_eq!(log.events().last().map(|r| r.event.clone()), Some(HalEvent::Clear));
}

#[tokio::test]
async fn test_q1_correct_answer_cue() {
    let mut trainer = recording_trainer(11);
    trainer.on_button(Button::A).await.unwrap();
    let question = trainer.pending_question().unwrap();
    log(&trainer).clear();

    let answer = question.target.as_char().to_ascii_lowercase().to_string();
    let handled = trainer.handle(TrainerEvent::Line(line(&answer))).await.unwrap();

    let Handled::Line(LineOutcome::LetterJudged(judgement)) = handled else {
        panic!("unexpected {:?}", handled);
    };
    assert_eq!(judgement.verdict, Verdict::Correct);
    assert_eq!(trainer.pending_question(), Some(judgement.next));

    let cue = log(&trainer).tone_spans()[0];
    assert_eq!((cue.frequency_hz, cue.duration_ms), (1200, 300));
    assert_eq!(log(&trainer).icons()[0], Icon::Yes);
}

#[tokio::test]
async fn test_q1_wrong_answer_reveals_letter() {
    let mut trainer = recording_trainer(11);
    trainer.on_button(Button::A).await.unwrap();
    let target = trainer.pending_question().unwrap().target.as_char();
    log(&trainer).clear();

    let answer = if target == 'A' { "B" } else { "A" };
    let outcome = trainer.on_line(answer).await.unwrap();
    assert!(matches!(
        outcome,
        LineOutcome::LetterJudged(judgement) if judgement.verdict == Verdict::Wrong
    ));

    let log = log(&trainer);
    let cue = log.tone_spans()[0];
    assert_eq!((cue.frequency_hz, cue.duration_ms), (200, 300));
    // Reveal, then the next question
    assert_eq!(log.texts()[..2], [format!("={}", target), "?".to_string()]);
}

#[tokio::test]
async fn test_q2_wrong_answer_replays_correct_pattern() {
    let mut trainer = recording_trainer(21);
    trainer.on_button(Button::B).await.unwrap();
    trainer.on_button(Button::A).await.unwrap();
    let question = trainer.pending_question().unwrap();
    log(&trainer).clear();

    // Six dots is well-formed but belongs to no symbol
    let outcome = trainer.on_line("......").await.unwrap();
    let LineOutcome::MorseJudged(judgement) = outcome else {
        panic!("unexpected {:?}", outcome);
    };
    assert_eq!(judgement.verdict, Verdict::Wrong);
    assert_eq!(judgement.answered, question);

    let log = log(&trainer);
    assert_eq!(log.texts()[0], "=");
    assert_eq!(log.played_pattern(trainer.config()), question.expected_pattern());
    assert_eq!(log.icons().last(), Some(&Icon::Pending));
    // Next Morse question shows its letter
    assert_eq!(
        log.texts().last().cloned(),
        Some(judgement.next.target.as_char().to_string())
    );
}

#[tokio::test]
async fn test_connection_glyphs() {
    let mut trainer = recording_trainer(1);
    run_script(
        &mut trainer,
        &[
            Input::Link(ConnectionEvent::Connected),
            Input::Link(ConnectionEvent::Disconnected),
        ],
    )
    .await
    .unwrap();

    let log = log(&trainer);
    assert_eq!(log.icons(), [Icon::Yes, Icon::No]);
    assert_eq!(log.texts(), ["T1"]);
    assert_eq!(clock(&trainer).elapsed_ms(), 1000 + 800 + 500 + 1000);
}

#[tokio::test]
async fn test_scripted_session() {
    let mut trainer = recording_trainer(42);
    trainer.start().await.unwrap();

    let handled = run_script(
        &mut trainer,
        &[
            Input::Bytes(b"SOS\r\n"),
            Input::Press(Button::B),
            Input::Bytes(b"...\n\n-.-\n"),
            Input::Bytes(b"..x\n"),
        ],
    )
    .await
    .unwrap();

    assert_eq!(handled.len(), 5);
    assert_eq!(handled[0], Handled::Line(LineOutcome::Played { skipped: 0 }));
    assert!(matches!(&handled[1], Handled::Transition(t) if t.to == Mode::MorseToText));
    assert_eq!(
        handled[2],
        Handled::Line(LineOutcome::Decoded(Symbol::from_char('S').unwrap()))
    );
    assert_eq!(
        handled[3],
        Handled::Line(LineOutcome::Decoded(Symbol::from_char('K').unwrap()))
    );
    assert_eq!(
        handled[4],
        Handled::Line(LineOutcome::DecodeFailed(DecodeFailure::Malformed))
    );
}

#[tokio::test]
async fn test_faster_config_scales_playback() {
    let config = TrainerConfig::from_wpm(20).unwrap();
    let mut trainer = morse_core::Trainer::new(
        morse_core::test_utils::output_capture::RecordingHal::new(
            morse_core::test_utils::output_capture::seeded_rng(1),
        ),
        config,
    );

    trainer.on_line("T").await.unwrap();
    // Dash plus element pause at 60 ms per unit
    assert_eq!(trainer.hal().clock.elapsed_ms(), 240);
}

#[tokio::test]
async fn test_q2_marker_stays_up_before_replay() {
    let mut trainer = recording_trainer(21);
    trainer.on_button(Button::B).await.unwrap();
    trainer.on_button(Button::A).await.unwrap();
    log(&trainer).clear();

    trainer.on_line("......").await.unwrap();
    // The marker holds one character period before the music note
    assert_eq!(shown_for(&log(&trainer), "="), Some(400));
}

#[tokio::test]
async fn test_q1_reveal_shows_every_character() {
    let mut trainer = recording_trainer(11);
    trainer.on_button(Button::A).await.unwrap();
    let target = trainer.pending_question().unwrap().target.as_char();
    let answer = if target == 'A' { "B" } else { "A" };

    trainer.on_line(answer).await.unwrap();
    // Both characters, then the short hold
    assert_eq!(shown_for(&log(&trainer), &format!("={}", target)), Some(800 + 500));
}

#[tokio::test]
async fn test_mode_label_shows_both_characters() {
    let mut trainer = recording_trainer(1);
    trainer.on_button(Button::B).await.unwrap();

    assert_eq!(shown_for(&log(&trainer), "T2"), Some(800 + 500));
}

#[tokio::test]
async fn test_overlong_line_is_dropped_before_the_trainer() {
    let mut trainer = recording_trainer(1);
    let handled = run_script(
        &mut trainer,
        &[
            Input::Bytes(b"PARIS PARIS PARIS PARIS PARIS PARIS PARIS PARIS PARIS PARIS PARIS PARIS\n"),
            Input::Bytes(b"E\n"),
        ],
    )
    .await
    .unwrap();

    // Only the short line reaches the trainer
    assert_eq!(handled, [Handled::Line(LineOutcome::Played { skipped: 0 })]);
    assert_eq!(log(&trainer).played_pattern(trainer.config()), ".");
}
