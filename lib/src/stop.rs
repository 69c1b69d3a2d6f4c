// Copyright 2025 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Create a flag for requesting the run loop to stop.
#[must_use]
pub fn stop_flag() -> StopFlag {
    StopFlag(Arc::new(Inner {
        requested: AtomicBool::new(false),
        notify: tokio::sync::Notify::const_new(),
    }))
}

struct Inner {
    pub(self) requested: AtomicBool,
    pub(self) notify: tokio::sync::Notify,
}

/// A sticky stop request shared between signal delivery and the run loop.
#[derive(Clone)]
pub struct StopFlag(Arc<Inner>);

impl StopFlag {
    pub fn request(&self) {
        self.0.requested.store(true, Ordering::SeqCst);
        self.0.notify.notify_one();
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.requested.load(Ordering::SeqCst)
    }

    /// Returns once a stop has been requested.
    pub async fn requested(&self) {
        loop {
            if self.is_requested() {
                return;
            }

            self.0.notify.notified().await;
        }
    }
}

impl std::fmt::Debug for StopFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StopFlag")
            .field(&self.is_requested())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_shared_between_clones() {
        let stop = stop_flag();
        let remote = stop.clone();
        assert!(!stop.is_requested());

        remote.request();
        assert!(stop.is_requested());

        // Requests are sticky.
        remote.request();
        assert!(stop.is_requested());
    }

    #[tokio::test]
    async fn requested_wakes_a_waiting_task() {
        let stop = stop_flag();
        let remote = stop.clone();

        let waiter = tokio::spawn(async move { stop.requested().await });
        tokio::task::yield_now().await;
        remote.request();

        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn requested_returns_immediately_after_request() {
        let stop = stop_flag();
        stop.request();
        stop.requested().await;
    }
}
