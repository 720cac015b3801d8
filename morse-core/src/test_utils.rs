//! Test utilities for the trainer core

#[cfg(all(feature = "test-utils", feature = "std", feature = "embassy-time"))]
pub mod virtual_time {
    //! Virtual time simulation for deterministic testing

    use embassy_time::{Duration, Instant};
    use embedded_hal_async::delay::DelayNs;
    use std::sync::{Arc, Mutex};

    /// Shared virtual clock, advanced only by delays
    #[derive(Clone, Default)]
    pub struct VirtualClock {
        now_ns: Arc<Mutex<u64>>,
    }

    impl VirtualClock {
        pub fn new() -> Self {
            Self::default()
        }

        /// Get current virtual time
        pub fn now(&self) -> Instant {
            Instant::from_micros(*self.now_ns.lock().unwrap() / 1_000)
        }

        /// Milliseconds since the clock was created
        pub fn elapsed_ms(&self) -> u64 {
            *self.now_ns.lock().unwrap() / 1_000_000
        }

        /// Advance virtual time by duration
        pub fn advance(&self, duration: Duration) {
            self.advance_ns(duration.as_micros() * 1_000);
        }

        fn advance_ns(&self, ns: u64) {
            *self.now_ns.lock().unwrap() += ns;
        }

        /// Delay provider that advances this clock instead of sleeping
        pub fn delay(&self) -> VirtualDelay {
            VirtualDelay {
                clock: self.clone(),
            }
        }
    }

    /// `DelayNs` on top of a [`VirtualClock`]
    #[derive(Clone)]
    pub struct VirtualDelay {
        clock: VirtualClock,
    }

    impl DelayNs for VirtualDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.clock.advance_ns(ns as u64);
        }
    }
}

#[cfg(all(feature = "test-utils", feature = "std", feature = "embassy-time"))]
pub mod output_capture {
    //! Output capture and analysis for testing

    use super::virtual_time::{VirtualClock, VirtualDelay};
    use crate::hal::{HalError, LedDisplay, RandomSource, RngSource, ToneOutput, TrainerHal};
    use crate::types::{Icon, TrainerConfig};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::string::String;
    use std::sync::{Arc, Mutex};
    use std::vec::Vec;

    /// One presentation or audio action
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HalEvent {
        Text(String),
        Icon(Icon),
        Plot(u8, u8),
        Clear,
        ToneOn(u32),
        ToneOff,
    }

    /// An action stamped with the virtual time it happened at
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Recorded {
        pub at_ms: u64,
        pub event: HalEvent,
    }

    /// A completed tone
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ToneSpan {
        pub frequency_hz: u32,
        pub start_ms: u64,
        pub duration_ms: u64,
    }

    /// Shared, time-stamped event log
    #[derive(Clone, Default)]
    pub struct EventLog {
        clock: VirtualClock,
        events: Arc<Mutex<Vec<Recorded>>>,
    }

    impl EventLog {
        pub fn new(clock: VirtualClock) -> Self {
            Self {
                clock,
                events: Arc::default(),
            }
        }

        fn record(&self, event: HalEvent) {
            let at_ms = self.clock.elapsed_ms();
            self.events.lock().unwrap().push(Recorded { at_ms, event });
        }

        /// Get all captured events
        pub fn events(&self) -> Vec<Recorded> {
            self.events.lock().unwrap().clone()
        }

        /// Clear capture buffer
        pub fn clear(&self) {
            self.events.lock().unwrap().clear();
        }

        /// Every string shown, in order
        pub fn texts(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|r| match &r.event {
                    HalEvent::Text(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Every icon shown, in order
        pub fn icons(&self) -> Vec<Icon> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|r| match r.event {
                    HalEvent::Icon(icon) => Some(icon),
                    _ => None,
                })
                .collect()
        }

        /// Pair tone-on and tone-off events into spans
        pub fn tone_spans(&self) -> Vec<ToneSpan> {
            let mut spans = Vec::new();
            let mut open: Option<(u32, u64)> = None;

            for recorded in self.events.lock().unwrap().iter() {
                match recorded.event {
                    HalEvent::ToneOn(frequency_hz) => open = Some((frequency_hz, recorded.at_ms)),
                    HalEvent::ToneOff => {
                        if let Some((frequency_hz, start_ms)) = open.take() {
                            spans.push(ToneSpan {
                                frequency_hz,
                                start_ms,
                                duration_ms: recorded.at_ms - start_ms,
                            });
                        }
                    }
                    _ => {}
                }
            }
            spans
        }

        /// Rebuild the textual pattern from playback tones.
        ///
        /// Only tones at `config.tone_hz` count. Gaps map back to nothing
        /// (element pause), a letter space, or a word separator.
        pub fn played_pattern(&self, config: &TrainerConfig) -> String {
            let unit = config.unit.as_millis().max(1);
            let mut pattern = String::new();
            let mut last_end: Option<u64> = None;

            let marks = self
                .tone_spans()
                .into_iter()
                .filter(|span| span.frequency_hz == config.tone_hz);

            for span in marks {
                if let Some(end) = last_end {
                    match (span.start_ms - end) / unit {
                        0 | 1 => {}
                        4 => pattern.push(' '),
                        14 => pattern.push_str(" / "),
                        _ => pattern.push('?'),
                    }
                }
                pattern.push(if span.duration_ms / unit >= 3 { '-' } else { '.' });
                last_end = Some(span.start_ms + span.duration_ms);
            }
            pattern
        }
    }

    /// Display writing into an [`EventLog`]
    pub struct RecordingDisplay {
        log: EventLog,
    }

    impl LedDisplay for RecordingDisplay {
        type Error = HalError;

        fn show_text(&mut self, text: &str) -> Result<(), Self::Error> {
            self.log.record(HalEvent::Text(text.into()));
            Ok(())
        }

        fn show_icon(&mut self, icon: Icon) -> Result<(), Self::Error> {
            self.log.record(HalEvent::Icon(icon));
            Ok(())
        }

        fn plot(&mut self, x: u8, y: u8) -> Result<(), Self::Error> {
            self.log.record(HalEvent::Plot(x, y));
            Ok(())
        }

        fn clear(&mut self) -> Result<(), Self::Error> {
            self.log.record(HalEvent::Clear);
            Ok(())
        }
    }

    /// Buzzer writing into an [`EventLog`]
    pub struct RecordingBuzzer {
        log: EventLog,
    }

    impl ToneOutput for RecordingBuzzer {
        type Error = HalError;

        fn tone_on(&mut self, frequency_hz: u32) -> Result<(), Self::Error> {
            self.log.record(HalEvent::ToneOn(frequency_hz));
            Ok(())
        }

        fn tone_off(&mut self) -> Result<(), Self::Error> {
            self.log.record(HalEvent::ToneOff);
            Ok(())
        }
    }

    /// HAL that records every action against a virtual clock
    pub struct RecordingHal<R> {
        pub clock: VirtualClock,
        pub log: EventLog,
        display: RecordingDisplay,
        buzzer: RecordingBuzzer,
        delay: VirtualDelay,
        rng: R,
    }

    impl<R: RandomSource> RecordingHal<R> {
        pub fn new(rng: R) -> Self {
            let clock = VirtualClock::new();
            let log = EventLog::new(clock.clone());
            Self {
                display: RecordingDisplay { log: log.clone() },
                buzzer: RecordingBuzzer { log: log.clone() },
                delay: clock.delay(),
                clock,
                log,
                rng,
            }
        }
    }

    impl<R: RandomSource> TrainerHal for RecordingHal<R> {
        type Display = RecordingDisplay;
        type Buzzer = RecordingBuzzer;
        type Delay = VirtualDelay;
        type Rng = R;

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

    /// Deterministic `rand` generator for reproducible quizzes
    pub fn seeded_rng(seed: u64) -> RngSource<SmallRng> {
        RngSource(SmallRng::seed_from_u64(seed))
    }
}
