//! Property tests for the codec, mode table and quiz engine

use morse_core::test_utils::output_capture::seeded_rng;
use morse_core::{
    decode, encode, is_valid_morse_text, Button, Mode, ModeController, QuizEngine, QuizError,
    QuizKind, Symbol,
};
use proptest::prelude::*;

fn button() -> impl Strategy<Value = Button> {
    prop_oneof![Just(Button::A), Just(Button::B)]
}

fn mode() -> impl Strategy<Value = Mode> {
    prop::sample::select(Mode::ALL.to_vec())
}

proptest! {
    #[test]
    fn single_symbol_round_trips(c in "[A-Za-z0-9 ]") {
        let c = c.chars().next().unwrap();
        let encoded = encode(&c.to_string()).unwrap();
        prop_assert_eq!(decode(&encoded.pattern), Symbol::from_char(c));
    }

    #[test]
    fn encoded_text_is_valid_morse(text in "[A-Za-z0-9 ]{0,48}") {
        let encoded = encode(&text).unwrap();
        // The word separator is a symbol of its own, not raw Morse
        let without_words = encoded.pattern.replace('/', " ");
        prop_assert!(is_valid_morse_text(&without_words));
        prop_assert_eq!(encoded.skipped, 0);
    }

    #[test]
    fn letters_are_joined_by_single_spaces(text in "[A-Z0-9]{1,48}") {
        let encoded = encode(&text).unwrap();
        let pattern = encoded.pattern.as_str();
        prop_assert!(!pattern.starts_with(' '));
        prop_assert!(!pattern.ends_with(' '));
        prop_assert!(!pattern.contains("  "));
        prop_assert_eq!(pattern.split(' ').count(), text.len());
    }

    #[test]
    fn skipped_counts_unknown_characters(text in "\\PC{0,40}") {
        let expected = text.chars().filter(|c| Symbol::from_char(*c).is_none()).count();
        let encoded = encode(&text).unwrap();
        prop_assert_eq!(encoded.skipped, expected);
    }

    #[test]
    fn mode_cycle_stays_closed(start in mode(), presses in prop::collection::vec(button(), 0..64)) {
        let mut controller = ModeController::with_mode(start);
        for press in presses {
            let transition = controller.handle(press);
            prop_assert!(Mode::ALL.contains(&transition.to));
            prop_assert_eq!(transition.entry_quiz(), transition.to.quiz_kind());
        }
    }

    #[test]
    fn same_button_twice_is_identity(start in mode(), press in button()) {
        let mut controller = ModeController::with_mode(start);
        controller.handle(press);
        controller.handle(press);
        prop_assert_eq!(controller.mode(), start);
    }

    #[test]
    fn letter_quiz_always_advances(seed in any::<u64>(), answers in prop::collection::vec("\\PC{0,4}", 1..20)) {
        let mut rng = seeded_rng(seed);
        let mut engine = QuizEngine::new();
        engine.start(QuizKind::Letter, &mut rng);

        for answer in answers {
            let before = engine.pending().unwrap();
            let judgement = engine.judge_letter(&answer, &mut rng).unwrap();
            prop_assert_eq!(judgement.answered, before);
            prop_assert_eq!(judgement.next.serial, before.serial + 1);
            prop_assert!(judgement.next.target.is_letter());
        }
    }

    #[test]
    fn morse_quiz_advances_only_on_valid_input(seed in any::<u64>(), answers in prop::collection::vec("[.\\- A-Z]{0,6}", 1..20)) {
        let mut rng = seeded_rng(seed);
        let mut engine = QuizEngine::new();
        engine.start(QuizKind::Morse, &mut rng);

        for answer in answers {
            let before = engine.pending().unwrap();
            match engine.judge_morse(&answer, &mut rng) {
                Ok(judgement) => {
                    prop_assert!(is_valid_morse_text(answer.trim()));
                    prop_assert_eq!(judgement.next.serial, before.serial + 1);
                    prop_assert_eq!(judgement.verdict.is_correct(), answer.trim() == before.expected_pattern());
                }
                Err(error) => {
                    prop_assert_eq!(error, QuizError::MalformedAnswer);
                    prop_assert_eq!(engine.pending(), Some(before));
                }
            }
        }
    }
}
