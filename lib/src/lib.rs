// Copyright 2023 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

mod stop;
pub use stop::{StopFlag, stop_flag};

pub mod context;
pub use context::{Context, EventSource};

pub mod controller;
pub use controller::{Controller, Report, RunMode, RunState};

pub mod event;
pub use event::{ClassifiedEvent, Classifier, RawEvent};

pub mod interest;
pub use interest::{EventClass, InterestMask};

pub mod signals;

/// Opens an X11 connection listening for the RandR notifications in `interest`.
///
/// # Errors
///
/// Returns error if the display cannot be reached or lacks the RandR extension.
pub fn connect(interest: InterestMask) -> Result<Context, Error> {
    Context::open(interest)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("cannot open display")]
    Connect(#[from] x11rb::errors::ConnectError),
    #[error("X11 connection error")]
    Connection(#[from] x11rb::errors::ConnectionError),
    #[error("X11 request failed")]
    Reply(#[from] x11rb::errors::ReplyError),
    #[error("display has no screen {0}")]
    NoScreen(usize),
    #[error("RandR extension is not supported by the display")]
    Unsupported,
    #[error("display connection is not open")]
    NotConnected,
}

impl Error {
    /// Whether the display lacks a usable RandR extension.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported)
    }
}

#[derive(thiserror::Error, Clone, Copy, Debug, Eq, PartialEq)]
pub enum CloseError {
    #[error("display connection already closed")]
    AlreadyClosed,
    #[error("display connection was never opened")]
    InvalidHandle,
}
