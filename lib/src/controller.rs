// Copyright 2025 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use crate::context::EventSource;
use crate::event::{ClassifiedEvent, Classifier};
use crate::interest::InterestMask;
use crate::{Error, StopFlag};
use std::io::Write;
use std::time::Duration;

/// Pause between two drains of the event queue.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Stopping,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RunMode {
    /// Stop after the first drain that saw a requested event.
    #[default]
    SingleShot,
    /// Keep reporting until a stop is requested.
    Monitor,
}

/// Summary of a finished run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Report {
    pub state: RunState,
    pub events: usize,
    pub cycles: usize,
}

impl Report {
    /// Whether any requested event occurred during the run.
    #[must_use]
    pub fn matched(&self) -> bool {
        self.events > 0
    }
}

/// Drives the drain, report, and terminate cycle of a single invocation.
#[derive(Debug)]
pub struct Controller {
    state: RunState,
    interest: InterestMask,
    mode: RunMode,
    quiet: bool,
    stop: StopFlag,
}

impl Controller {
    #[must_use]
    pub fn new(interest: InterestMask, mode: RunMode, stop: StopFlag) -> Self {
        Self {
            state: RunState::Idle,
            interest: interest.effective(),
            mode,
            quiet: false,
            stop,
        }
    }

    /// Suppresses output lines without changing which events match.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, state: RunState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "run state");
            self.state = state;
        }
    }

    /// Whether `event` belongs to a requested class.
    #[must_use]
    pub fn matches(&self, event: &ClassifiedEvent) -> bool {
        event
            .class()
            .is_some_and(|class| self.interest.contains(class))
    }

    /// Polls `source` until a stop is requested, or until the first match in single-shot mode.
    ///
    /// # Errors
    ///
    /// Returns error if the source fails or if writing to `out` fails.
    pub async fn run<S: EventSource, W: Write>(
        mut self,
        source: &mut S,
        out: &mut W,
    ) -> Result<Report, Error> {
        let classifier = Classifier::new(source.event_base());
        let mut events = 0;
        let mut cycles = 0;

        self.transition(RunState::Running);

        loop {
            if self.stop.is_requested() {
                self.transition(RunState::Stopping);
            }

            if self.state != RunState::Running {
                break;
            }

            let matched = self.cycle(&classifier, source, out)?;
            events += matched;
            cycles += 1;

            if matched > 0 && self.mode == RunMode::SingleShot {
                self.transition(RunState::Stopping);
            }

            tokio::select! {
                () = tokio::time::sleep(POLL_INTERVAL) => (),
                () = self.stop.requested() => (),
            }
        }

        Ok(Report {
            state: self.state,
            events,
            cycles,
        })
    }

    /// Drains every pending event once, returning how many matched.
    fn cycle<S: EventSource, W: Write>(
        &self,
        classifier: &Classifier,
        source: &mut S,
        out: &mut W,
    ) -> Result<usize, Error> {
        let mut matched = 0;
        let mut written = false;

        for raw in source.drain()? {
            let event = classifier.classify(&raw?);
            tracing::debug!(event = event.name(), "received event");

            if !self.matches(&event) {
                continue;
            }

            matched += 1;

            if self.quiet {
                continue;
            }

            if let Some(line) = event.line() {
                writeln!(out, "{line}")?;
                written = true;
            }
        }

        if written {
            out.flush()?;
        }

        Ok(matched)
    }
}
