// Copyright 2025 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

//! Translation of process signals into stop requests.

use crate::{Error, StopFlag};
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::task::JoinHandle;

/// The signals which end a run.
pub struct Signals {
    interrupt: Signal,
    hangup: Signal,
    terminate: Signal,
    user_defined1: Signal,
    alarm: Signal,
}

impl Signals {
    /// Registers handlers for every stopping signal.
    ///
    /// # Errors
    ///
    /// Returns error if a handler cannot be registered, or if called outside of a tokio runtime.
    pub fn install() -> Result<Self, Error> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            hangup: signal(SignalKind::hangup())?,
            terminate: signal(SignalKind::terminate())?,
            user_defined1: signal(SignalKind::user_defined1())?,
            alarm: signal(SignalKind::alarm())?,
        })
    }

    /// Waits for the next stopping signal and returns its name.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.hangup.recv() => "SIGHUP",
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.user_defined1.recv() => "SIGUSR1",
            _ = self.alarm.recv() => "SIGALRM",
        }
    }
}

/// Spawns a task on the current runtime which requests a stop on every stopping signal.
///
/// # Errors
///
/// Returns error if the signal handlers cannot be registered.
pub fn watch(stop: StopFlag) -> Result<JoinHandle<()>, Error> {
    let mut signals = Signals::install()?;

    Ok(tokio::spawn(async move {
        loop {
            let signal = signals.recv().await;
            tracing::debug!(signal, "received signal, stopping");
            stop.request();
        }
    }))
}

/// Arranges for SIGALRM to be delivered after `seconds`, replacing any pending alarm.
///
/// Returns the seconds that were left on a previous alarm.
pub fn schedule_alarm(seconds: u32) -> Option<u32> {
    tracing::debug!(seconds, "scheduling timeout");
    nix::unistd::alarm::set(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stop_flag;
    use nix::sys::signal::{Signal as NixSignal, raise};
    use std::time::Duration;

    #[tokio::test]
    async fn user_signal_requests_stop() {
        let stop = stop_flag();
        let watcher = watch(stop.clone()).unwrap();

        raise(NixSignal::SIGUSR1).unwrap();
        tokio::time::timeout(Duration::from_secs(5), stop.requested())
            .await
            .expect("stop was not requested");

        watcher.abort();
    }

    #[tokio::test]
    async fn alarm_requests_stop() {
        let stop = stop_flag();
        let watcher = watch(stop.clone()).unwrap();

        schedule_alarm(1);
        tokio::time::timeout(Duration::from_secs(5), stop.requested())
            .await
            .expect("alarm did not request a stop");

        watcher.abort();
    }
}
