//! Quiz engine: one pending question, fresh draws, judged answers

use crate::codec::{is_valid_morse_text, Symbol, LETTER_COUNT};
use crate::hal::RandomSource;
use crate::types::QuizKind;

/// A pending quiz question
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Question {
    /// Letter the user must identify or encode
    pub target: Symbol,
    /// How the answer is expected
    pub kind: QuizKind,
    /// Draw number, unique per engine
    pub serial: u32,
}

impl Question {
    /// Morse pattern of the target letter
    pub const fn expected_pattern(&self) -> &'static str {
        self.target.pattern()
    }
}

/// Outcome of judging a well-formed answer
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    Correct,
    Wrong,
}

impl Verdict {
    pub const fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }
}

/// A judged answer together with the question that replaced it
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Judgement {
    pub verdict: Verdict,
    /// The question that was answered
    pub answered: Question,
    /// The new pending question
    pub next: Question,
}

/// Quiz errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QuizError {
    /// An answer arrived before any question was asked
    NoPendingQuestion,
    /// A Morse answer contained characters other than `.`, `-` and space
    MalformedAnswer,
}

#[cfg(feature = "std")]
impl core::fmt::Display for QuizError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            QuizError::NoPendingQuestion => write!(f, "No pending quiz question"),
            QuizError::MalformedAnswer => write!(f, "Answer is not valid Morse text"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for QuizError {}

/// Holds the single pending question
#[derive(Debug, Default)]
pub struct QuizEngine {
    pending: Option<Question>,
    issued: u32,
}

impl QuizEngine {
    /// Create an engine with no pending question
    pub const fn new() -> Self {
        Self {
            pending: None,
            issued: 0,
        }
    }

    /// Current pending question, if a quiz has started
    pub fn pending(&self) -> Option<Question> {
        self.pending
    }

    /// Number of questions drawn so far
    pub fn issued(&self) -> u32 {
        self.issued
    }

    /// Draw a letter to be answered by name
    pub fn start_letter_question<R: RandomSource>(&mut self, rng: &mut R) -> Question {
        self.start(QuizKind::Letter, rng)
    }

    /// Draw a letter to be answered with its Morse pattern
    pub fn start_morse_question<R: RandomSource>(&mut self, rng: &mut R) -> Question {
        self.start(QuizKind::Morse, rng)
    }

    /// Replace the pending question with a fresh uniform draw over A-Z
    pub fn start<R: RandomSource>(&mut self, kind: QuizKind, rng: &mut R) -> Question {
        let index = rng.next_below(LETTER_COUNT as u32) as usize;
        let target = Symbol::letter_wrapping(index);

        self.issued = self.issued.wrapping_add(1);
        let question = Question {
            target,
            kind,
            serial: self.issued,
        };
        self.pending = Some(question);

        #[cfg(feature = "defmt")]
        defmt::debug!("❓ Question #{}: {:?} ({:?})", question.serial, target, kind);

        question
    }

    /// Judge a letter answer without advancing
    pub fn check_letter(&self, input: &str) -> Result<Verdict, QuizError> {
        let question = self.pending.ok_or(QuizError::NoPendingQuestion)?;
        let answer = input.chars().next().map(|c| c.to_ascii_uppercase());

        if answer == Some(question.target.as_char()) {
            Ok(Verdict::Correct)
        } else {
            Ok(Verdict::Wrong)
        }
    }

    /// Judge a Morse answer without advancing
    pub fn check_morse(&self, input: &str) -> Result<Verdict, QuizError> {
        let question = self.pending.ok_or(QuizError::NoPendingQuestion)?;
        let answer = input.trim();

        if !is_valid_morse_text(answer) {
            return Err(QuizError::MalformedAnswer);
        }

        if answer == question.expected_pattern() {
            Ok(Verdict::Correct)
        } else {
            Ok(Verdict::Wrong)
        }
    }

    /// Judge the first character of `input` against the pending letter,
    /// then draw the next letter question whatever the verdict.
    pub fn judge_letter<R: RandomSource>(
        &mut self,
        input: &str,
        rng: &mut R,
    ) -> Result<Judgement, QuizError> {
        let verdict = self.check_letter(input)?;
        self.advance(verdict, QuizKind::Letter, rng)
    }

    /// Judge a Morse answer by exact pattern equality.
    ///
    /// Malformed input leaves the pending question in place. Any well-formed
    /// answer is judged and followed by a fresh Morse question.
    pub fn judge_morse<R: RandomSource>(
        &mut self,
        input: &str,
        rng: &mut R,
    ) -> Result<Judgement, QuizError> {
        let verdict = self.check_morse(input)?;
        self.advance(verdict, QuizKind::Morse, rng)
    }

    fn advance<R: RandomSource>(
        &mut self,
        verdict: Verdict,
        kind: QuizKind,
        rng: &mut R,
    ) -> Result<Judgement, QuizError> {
        let answered = self.pending.ok_or(QuizError::NoPendingQuestion)?;
        let next = self.start(kind, rng);
        Ok(Judgement {
            verdict,
            answered,
            next,
        })
    }

    /// Drop any pending question
    pub fn reset(&mut self) {
        self.pending = None;
    }
}
