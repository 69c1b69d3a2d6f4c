// Copyright 2025 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use crate::event::RawEvent;
use crate::interest::InterestMask;
use crate::{CloseError, Error};
use std::fmt;
use x11rb::connection::{Connection as _, RequestConnection as _};
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xproto::Window;
use x11rb::rust_connection::RustConnection;

/// Oldest RandR revision which reports CRTC and output changes.
const MIN_VERSION: (u32, u32) = (1, 2);

/// Anything the run loop can drain events from.
pub trait EventSource {
    /// The first event code assigned to the RandR extension.
    fn event_base(&self) -> u8;

    /// Sends any buffered requests so that their events may arrive.
    ///
    /// # Errors
    ///
    /// Returns error if the connection failed.
    fn flush(&mut self) -> Result<(), Error>;

    /// Returns the next queued event without blocking.
    ///
    /// # Errors
    ///
    /// Returns error if the connection failed.
    fn poll_event(&mut self) -> Result<Option<RawEvent>, Error>;

    /// Flushes, then iterates every event that has already arrived.
    ///
    /// # Errors
    ///
    /// Returns error if the flush failed.
    fn drain(&mut self) -> Result<Drain<'_, Self>, Error>
    where
        Self: Sized,
    {
        self.flush()?;
        Ok(Drain {
            source: self,
            done: false,
        })
    }
}

/// Lazy iterator over the events pending on an [`EventSource`].
pub struct Drain<'a, S> {
    source: &'a mut S,
    done: bool,
}

impl<S: EventSource> Iterator for Drain<'_, S> {
    type Item = Result<RawEvent, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.source.poll_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(why) => {
                self.done = true;
                Some(Err(why))
            }
        }
    }
}

#[derive(Default)]
enum Handle {
    #[default]
    Uninitialized,
    Open(Box<RustConnection>),
    Closed,
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Handle::Uninitialized => "Uninitialized",
            Handle::Open(_) => "Open",
            Handle::Closed => "Closed",
        })
    }
}

/// An X11 connection listening for RandR notifications on the default root window.
#[derive(Debug, Default)]
pub struct Context {
    handle: Handle,
    pub screen: usize,
    pub root: Window,
    pub event_base: u8,
    pub interest: InterestMask,
}

impl Context {
    /// Connects to `$DISPLAY` and selects `interest` on the root window.
    ///
    /// An empty `interest` selects every notification class.
    ///
    /// # Errors
    ///
    /// - [`Error::Unsupported`] if the server lacks RandR 1.2.
    /// - Connection or request errors if the server cannot be reached.
    pub fn open(interest: InterestMask) -> Result<Self, Error> {
        let (connection, screen) = x11rb::connect(None)?;

        let root = connection
            .setup()
            .roots
            .get(screen)
            .ok_or(Error::NoScreen(screen))?
            .root;

        let Some(extension) = connection.extension_information(randr::X11_EXTENSION_NAME)? else {
            return Err(Error::Unsupported);
        };

        let version = connection.randr_query_version(1, 6)?.reply()?;
        if (version.major_version, version.minor_version) < MIN_VERSION {
            tracing::debug!(
                major = version.major_version,
                minor = version.minor_version,
                "RandR version too old"
            );
            return Err(Error::Unsupported);
        }

        let interest = interest.effective();
        connection
            .randr_select_input(root, randr::NotifyMask::from(interest.bits()))?
            .check()?;

        tracing::debug!(
            screen,
            root,
            event_base = extension.first_event,
            error_base = extension.first_error,
            major = version.major_version,
            minor = version.minor_version,
            %interest,
            "listening for RandR events"
        );

        Ok(Self {
            handle: Handle::Open(Box::new(connection)),
            screen,
            root,
            event_base: extension.first_event,
            interest,
        })
    }

    fn connection(&self) -> Result<&RustConnection, Error> {
        match &self.handle {
            Handle::Open(connection) => Ok(connection),
            _ => Err(Error::NotConnected),
        }
    }

    /// Releases the connection to the X server.
    ///
    /// # Errors
    ///
    /// - [`CloseError::AlreadyClosed`] if the context was closed before.
    /// - [`CloseError::InvalidHandle`] if the context was never opened.
    pub fn close(&mut self) -> Result<(), CloseError> {
        match std::mem::replace(&mut self.handle, Handle::Closed) {
            Handle::Open(connection) => {
                drop(connection);
                tracing::debug!(screen = self.screen, "closed display connection");
                Ok(())
            }
            Handle::Closed => Err(CloseError::AlreadyClosed),
            Handle::Uninitialized => {
                self.handle = Handle::Uninitialized;
                Err(CloseError::InvalidHandle)
            }
        }
    }
}

impl EventSource for Context {
    fn event_base(&self) -> u8 {
        self.event_base
    }

    fn flush(&mut self) -> Result<(), Error> {
        Ok(self.connection()?.flush()?)
    }

    fn poll_event(&mut self) -> Result<Option<RawEvent>, Error> {
        Ok(self
            .connection()?
            .poll_for_raw_event()?
            .map(|buffer| RawEvent::from_slice(&buffer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_before_open_is_invalid() {
        let mut context = Context::default();
        assert_eq!(context.close(), Err(CloseError::InvalidHandle));
        assert_eq!(context.close(), Err(CloseError::InvalidHandle));
        assert!(matches!(context.handle, Handle::Uninitialized));
    }

    #[test]
    fn close_twice_is_already_closed() {
        let mut context = Context {
            handle: Handle::Closed,
            ..Context::default()
        };
        assert_eq!(context.close(), Err(CloseError::AlreadyClosed));
    }

    #[test]
    fn drain_requires_connection() {
        let mut context = Context::default();
        assert!(matches!(context.drain(), Err(Error::NotConnected)));
        assert!(matches!(context.poll_event(), Err(Error::NotConnected)));
    }

    struct Scripted(Vec<Result<Option<RawEvent>, Error>>);

    impl EventSource for Scripted {
        fn event_base(&self) -> u8 {
            0
        }

        fn flush(&mut self) -> Result<(), Error> {
            Ok(())
        }

        fn poll_event(&mut self) -> Result<Option<RawEvent>, Error> {
            if self.0.is_empty() {
                panic!("polled past the end of the drain");
            }
            self.0.remove(0)
        }
    }

    #[test]
    fn drain_stops_at_first_empty_poll() {
        let event = RawEvent::new([1; 32]);
        let mut source = Scripted(vec![Ok(Some(event)), Ok(Some(event)), Ok(None)]);

        let drained: Vec<_> = source.drain().unwrap().collect();
        assert_eq!(drained.len(), 2);
        assert!(source.0.is_empty());
    }

    #[test]
    fn drain_ends_after_error() {
        let mut source = Scripted(vec![Err(Error::NotConnected), Ok(None)]);

        let mut drain = source.drain().unwrap();
        assert!(matches!(drain.next(), Some(Err(Error::NotConnected))));
        assert!(drain.next().is_none());
    }
}
