//! Message dispatcher: routes buttons, lines and link events to the core
//!
//! [`Trainer`] owns the two pieces of shared state (current mode and the
//! pending quiz question) together with the HAL. Each event runs to
//! completion before the next one is accepted.

use crate::codec::{self, CodecError, Symbol};
use crate::fsm::{ModeController, Transition};
use crate::hal::{Duration, HalError, LedDisplay, TrainerHal};
use crate::playback::{self, hold, sound};
use crate::quiz::{Judgement, Question, QuizEngine, QuizError, Verdict};
use crate::transport::Line;
use crate::types::{Button, ConnectionEvent, Icon, Mode, QuizKind, TrainerConfig};

/// Text shown once at power-up
pub const READY_TEXT: &str = "READY";

/// Events serviced by the trainer, one at a time
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrainerEvent {
    Button(Button),
    Line(Line),
    Connection(ConnectionEvent),
}

/// Why a Morse-to-text line produced no symbol
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeFailure {
    /// Characters other than `.`, `-` and space
    Malformed,
    /// Well-formed, but no symbol owns the pattern
    NoMatch,
}

/// What a received line did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineOutcome {
    /// Empty line, nothing done
    Ignored,
    /// T1: the line was encoded and played
    Played { skipped: usize },
    /// T1: the encoded line did not fit
    EncodeFailed(CodecError),
    /// Q1: answer judged, next question presented
    LetterJudged(Judgement),
    /// T2: the line decoded to a symbol
    Decoded(Symbol),
    /// T2: the line did not decode
    DecodeFailed(DecodeFailure),
    /// Q2: answer judged, next question presented
    MorseJudged(Judgement),
    /// Q2: malformed answer, question kept
    MorseRejected,
    /// Quiz mode without a question yet; one was started instead
    QuestionStarted(Question),
}

/// Result of servicing one [`TrainerEvent`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handled {
    Transition(Transition),
    Line(LineOutcome),
    Connection(ConnectionEvent),
}

/// The trainer application context
pub struct Trainer<H: TrainerHal> {
    hal: H,
    config: TrainerConfig,
    modes: ModeController,
    quiz: QuizEngine,
}

impl<H: TrainerHal> Trainer<H> {
    /// Create a trainer in T1 with no pending question
    pub fn new(hal: H, config: TrainerConfig) -> Self {
        Self {
            hal,
            config,
            modes: ModeController::new(),
            quiz: QuizEngine::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn pending_question(&self) -> Option<Question> {
        self.quiz.pending()
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    pub fn into_hal(self) -> H {
        self.hal
    }

    /// Initialize hardware and show the power-up banner
    pub async fn start(&mut self) -> Result<(), HalError> {
        self.hal.initialize()?;

        #[cfg(feature = "defmt")]
        defmt::info!("🚀 Trainer ready at {} WPM", self.config.wpm());

        self.show_text(READY_TEXT).await?;
        self.hold(self.config.short_hold).await;
        self.show_text(self.mode().label()).await
    }

    /// Service one event to completion
    pub async fn handle(&mut self, event: TrainerEvent) -> Result<Handled, HalError> {
        match event {
            TrainerEvent::Button(button) => self.on_button(button).await.map(Handled::Transition),
            TrainerEvent::Line(line) => self.on_line(&line).await.map(Handled::Line),
            TrainerEvent::Connection(event) => {
                self.on_connection(event).await?;
                Ok(Handled::Connection(event))
            }
        }
    }

    /// Apply a button press: switch mode, start a quiz on entry, show the label
    pub async fn on_button(&mut self, button: Button) -> Result<Transition, HalError> {
        let transition = self.modes.handle(button);

        if let Some(kind) = transition.entry_quiz() {
            let question = self.quiz.start(kind, self.hal.rng());
            self.present_question(question).await?;
        }

        self.flash_label().await?;
        Ok(transition)
    }

    /// React to the wireless link coming up or going down
    pub async fn on_connection(&mut self, event: ConnectionEvent) -> Result<(), HalError> {
        #[cfg(feature = "defmt")]
        defmt::info!("📡 Link {:?}", event);

        match event {
            ConnectionEvent::Connected => {
                self.show_icon(Icon::Yes)?;
                self.hold(self.config.status_hold).await;
                self.clear()?;
                self.flash_label().await
            }
            ConnectionEvent::Disconnected => {
                self.show_icon(Icon::No)?;
                self.hold(self.config.status_hold).await;
                self.clear()
            }
        }
    }

    /// Handle one received line according to the current mode
    pub async fn on_line(&mut self, line: &str) -> Result<LineOutcome, HalError> {
        if line.is_empty() {
            return Ok(LineOutcome::Ignored);
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("📨 {} <- '{}'", self.mode().label(), line);

        match self.mode() {
            Mode::TextToMorse => self.text_to_morse(line).await,
            Mode::QuizLetter => self.answer_letter(line).await,
            Mode::MorseToText => self.morse_to_text(line).await,
            Mode::QuizMorse => self.answer_morse(line).await,
        }
    }

    async fn text_to_morse(&mut self, line: &str) -> Result<LineOutcome, HalError> {
        match codec::encode(line) {
            Ok(encoded) => {
                playback::play(&mut self.hal, &encoded.pattern, &self.config).await?;
                Ok(LineOutcome::Played {
                    skipped: encoded.skipped,
                })
            }
            Err(error) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("❌ Encode failed: {:?}", error);

                self.fail().await?;
                Ok(LineOutcome::EncodeFailed(error))
            }
        }
    }

    async fn morse_to_text(&mut self, line: &str) -> Result<LineOutcome, HalError> {
        let morse = line.trim();

        if !codec::is_valid_morse_text(morse) {
            self.fail().await?;
            return Ok(LineOutcome::DecodeFailed(DecodeFailure::Malformed));
        }

        match codec::decode(morse) {
            Some(symbol) => {
                self.show_icon(Icon::Yes)?;
                self.hold(self.config.short_hold).await;
                let mut buf = [0u8; 4];
                self.show_text(symbol.as_char().encode_utf8(&mut buf)).await?;
                Ok(LineOutcome::Decoded(symbol))
            }
            None => {
                self.fail().await?;
                Ok(LineOutcome::DecodeFailed(DecodeFailure::NoMatch))
            }
        }
    }

    async fn answer_letter(&mut self, line: &str) -> Result<LineOutcome, HalError> {
        let judgement = match self.quiz.judge_letter(line, self.hal.rng()) {
            Ok(judgement) => judgement,
            Err(_) => return self.begin_quiz(QuizKind::Letter).await,
        };

        self.cue(judgement.verdict).await?;
        if !judgement.verdict.is_correct() {
            let mut reveal: heapless::String<2> = heapless::String::new();
            reveal.push('=').map_err(|_| HalError::Display)?;
            reveal
                .push(judgement.answered.target.as_char())
                .map_err(|_| HalError::Display)?;
            self.show_text(&reveal).await?;
            self.hold(self.config.short_hold).await;
        }

        self.present_question(judgement.next).await?;
        Ok(LineOutcome::LetterJudged(judgement))
    }

    async fn answer_morse(&mut self, line: &str) -> Result<LineOutcome, HalError> {
        let judgement = match self.quiz.judge_morse(line, self.hal.rng()) {
            Ok(judgement) => judgement,
            Err(QuizError::MalformedAnswer) => {
                self.show_icon(Icon::No)?;
                self.hold(self.config.short_hold).await;
                self.show_icon(Icon::Pending)?;
                return Ok(LineOutcome::MorseRejected);
            }
            Err(QuizError::NoPendingQuestion) => return self.begin_quiz(QuizKind::Morse).await,
        };

        self.cue(judgement.verdict).await?;
        if !judgement.verdict.is_correct() {
            self.show_text("=").await?;
            playback::play(&mut self.hal, judgement.answered.expected_pattern(), &self.config)
                .await?;
            self.hold(self.config.short_hold).await;
        }

        self.present_question(judgement.next).await?;
        Ok(LineOutcome::MorseJudged(judgement))
    }

    async fn begin_quiz(&mut self, kind: QuizKind) -> Result<LineOutcome, HalError> {
        let question = self.quiz.start(kind, self.hal.rng());
        self.present_question(question).await?;
        Ok(LineOutcome::QuestionStarted(question))
    }

    /// Show a question and leave the pending icon up
    async fn present_question(&mut self, question: Question) -> Result<(), HalError> {
        match question.kind {
            QuizKind::Letter => {
                self.show_text("?").await?;
                self.hold(self.config.short_hold).await;
                playback::play(&mut self.hal, question.expected_pattern(), &self.config).await?;
            }
            QuizKind::Morse => {
                let mut buf = [0u8; 4];
                self.show_text(question.target.as_char().encode_utf8(&mut buf)).await?;
                self.hold(self.config.short_hold).await;
            }
        }
        self.show_icon(Icon::Pending)
    }

    /// Verdict feedback: icon, cue tone, hold
    async fn cue(&mut self, verdict: Verdict) -> Result<(), HalError> {
        let (icon, frequency_hz) = match verdict {
            Verdict::Correct => (Icon::Yes, self.config.correct_tone_hz),
            Verdict::Wrong => (Icon::No, self.config.wrong_tone_hz),
        };

        self.show_icon(icon)?;
        sound(&mut self.hal, frequency_hz, self.config.cue_tone).await?;
        self.hold(self.config.verdict_hold).await;
        Ok(())
    }

    async fn fail(&mut self) -> Result<(), HalError> {
        self.show_icon(Icon::No)?;
        self.hold(self.config.short_hold).await;
        Ok(())
    }

    async fn flash_label(&mut self) -> Result<(), HalError> {
        self.show_text(self.mode().label()).await?;
        self.hold(self.config.label_hold).await;
        self.clear()
    }

    async fn hold(&mut self, duration: Duration) {
        hold(&mut self.hal, duration).await
    }

    /// Show a string and wait until every character has been up
    async fn show_text(&mut self, text: &str) -> Result<(), HalError> {
        self.hal
            .display()
            .show_text(text)
            .map_err(Into::<HalError>::into)?;
        self.hold(self.config.text_duration(text)).await;
        Ok(())
    }

    fn show_icon(&mut self, icon: Icon) -> Result<(), HalError> {
        self.hal.display().show_icon(icon).map_err(Into::into)
    }

    fn clear(&mut self) -> Result<(), HalError> {
        self.hal.display().clear().map_err(Into::into)
    }
}
