// Copyright 2025 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

//! Decoding of RandR notifications into their canonical textual form.

use crate::interest::EventClass;
use std::fmt;
use x11rb::protocol::randr;

/// Size of every core and extension event on the wire.
pub const EVENT_SIZE: usize = 32;

// RRNotify subcodes.
const NOTIFY_CRTC_CHANGE: u8 = 0;
const NOTIFY_OUTPUT_CHANGE: u8 = 1;

// Set on events delivered through SendEvent.
const SEND_EVENT_BIT: u8 = 0x80;

const ROTATION_BITS: u16 = 0x000f;
const ROTATE_0: u16 = 1 << 0;
const ROTATE_90: u16 = 1 << 1;
const ROTATE_180: u16 = 1 << 2;
const ROTATE_270: u16 = 1 << 3;

const REFLECTION_BITS: u16 = 0x00f0;
const REFLECT_X: u16 = 1 << 4;
const REFLECT_Y: u16 = 1 << 5;

/// An undecoded event as read from the X connection, in native byte order.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct RawEvent {
    bytes: [u8; EVENT_SIZE],
}

impl RawEvent {
    #[must_use]
    pub const fn new(bytes: [u8; EVENT_SIZE]) -> Self {
        Self { bytes }
    }

    /// Copies the fixed-size head of an event buffer.
    ///
    /// Generic events longer than 32 bytes are truncated, shorter buffers are zero-filled.
    #[must_use]
    pub fn from_slice(buffer: &[u8]) -> Self {
        let mut bytes = [0; EVENT_SIZE];
        let len = buffer.len().min(EVENT_SIZE);
        bytes[..len].copy_from_slice(&buffer[..len]);
        Self { bytes }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; EVENT_SIZE] {
        &self.bytes
    }

    /// Event type without the SendEvent flag.
    #[must_use]
    pub const fn response_type(&self) -> u8 {
        self.bytes[0] & !SEND_EVENT_BIT
    }

    #[must_use]
    pub const fn subtype(&self) -> u8 {
        self.bytes[1]
    }

    fn u8_at(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }

    fn u16_at(&self, offset: usize) -> u16 {
        u16::from_ne_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }

    fn i16_at(&self, offset: usize) -> i16 {
        i16::from_ne_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }

    fn u32_at(&self, offset: usize) -> u32 {
        u32::from_ne_bytes([
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ])
    }
}

impl fmt::Debug for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawEvent")
            .field("response_type", &self.response_type())
            .field("subtype", &self.subtype())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Unknown,
    Error(u8),
}

impl From<u8> for ConnectionStatus {
    fn from(raw: u8) -> Self {
        match raw {
            0 => ConnectionStatus::Connected,
            1 => ConnectionStatus::Disconnected,
            2 => ConnectionStatus::Unknown,
            other => ConnectionStatus::Error(other),
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionStatus::Connected => "Y",
            ConnectionStatus::Disconnected => "N",
            ConnectionStatus::Unknown => "?",
            ConnectionStatus::Error(_) => "E",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
    Error(u16),
}

impl Rotation {
    /// Decodes the rotation nibble of a RandR rotation field.
    ///
    /// Exactly one rotation bit must be set; no bit at all is an error.
    #[must_use]
    pub fn from_bits(raw: u16) -> Self {
        match raw & ROTATION_BITS {
            ROTATE_0 => Rotation::Deg0,
            ROTATE_90 => Rotation::Deg90,
            ROTATE_180 => Rotation::Deg180,
            ROTATE_270 => Rotation::Deg270,
            other => Rotation::Error(other),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rotation::Deg0 => "0",
            Rotation::Deg90 => "90",
            Rotation::Deg180 => "180",
            Rotation::Deg270 => "270",
            Rotation::Error(_) => "E",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reflection {
    None,
    X,
    Y,
    Both,
    Error(u16),
}

impl Reflection {
    /// Decodes the reflection nibble of a RandR rotation field.
    #[must_use]
    pub fn from_bits(raw: u16) -> Self {
        match raw & REFLECTION_BITS {
            0 => Reflection::None,
            REFLECT_X => Reflection::X,
            REFLECT_Y => Reflection::Y,
            bits if bits == REFLECT_X | REFLECT_Y => Reflection::Both,
            other => Reflection::Error(other),
        }
    }
}

impl fmt::Display for Reflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reflection::None => "0",
            Reflection::X => "X",
            Reflection::Y => "Y",
            Reflection::Both => "XY",
            Reflection::Error(_) => "E",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OutputChange {
    pub output: u32,
    pub crtc: u32,
    pub mode: u32,
    pub connection: ConnectionStatus,
}

impl OutputChange {
    fn decode(raw: &RawEvent) -> Self {
        Self {
            output: raw.u32_at(16),
            crtc: raw.u32_at(20),
            mode: raw.u32_at(24),
            connection: ConnectionStatus::from(raw.u8_at(30)),
        }
    }
}

impl fmt::Display for OutputChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "XRROutputChangeNotifyEvent output={:#x} crtc={:#x} mode={:#x} connection={}",
            self.output, self.crtc, self.mode, self.connection
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CrtcChange {
    pub crtc: u32,
    pub width: u16,
    pub height: u16,
    pub x: i16,
    pub y: i16,
    pub mode: u32,
    pub rotation: Rotation,
    pub reflection: Reflection,
}

impl CrtcChange {
    fn decode(raw: &RawEvent) -> Self {
        let rotation = raw.u16_at(20);

        Self {
            crtc: raw.u32_at(12),
            mode: raw.u32_at(16),
            rotation: Rotation::from_bits(rotation),
            reflection: Reflection::from_bits(rotation),
            x: raw.i16_at(24),
            y: raw.i16_at(26),
            width: raw.u16_at(28),
            height: raw.u16_at(30),
        }
    }
}

impl fmt::Display for CrtcChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "XRRCrtcChangeNotifyEvent crtc={:#x} res={}x{} pos={}x{} mode={:#x} rotation={} reflection={}",
            self.crtc,
            self.width,
            self.height,
            self.x,
            self.y,
            self.mode,
            self.rotation,
            self.reflection
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClassifiedEvent {
    OutputChanged(OutputChange),
    CrtcChanged(CrtcChange),
    ScreenChanged,
    /// Anything else; `randr` is set for RRNotify subtypes this tool does not report.
    Unrecognized { randr: bool },
}

impl ClassifiedEvent {
    #[must_use]
    pub const fn class(&self) -> Option<EventClass> {
        match self {
            ClassifiedEvent::OutputChanged(_) => Some(EventClass::OutputChange),
            ClassifiedEvent::CrtcChanged(_) => Some(EventClass::CrtcChange),
            ClassifiedEvent::ScreenChanged => Some(EventClass::ScreenChange),
            ClassifiedEvent::Unrecognized { .. } => None,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ClassifiedEvent::OutputChanged(_) => "RRNotify_OutputChange",
            ClassifiedEvent::CrtcChanged(_) => "RRNotify_CrtcChange",
            ClassifiedEvent::ScreenChanged => "RRScreenChangeNotify",
            ClassifiedEvent::Unrecognized { randr: true } => "(other XRandR event)",
            ClassifiedEvent::Unrecognized { randr: false } => "(other event)",
        }
    }

    /// The line reported for this event, if it has one.
    #[must_use]
    pub fn line(&self) -> Option<String> {
        match self {
            ClassifiedEvent::OutputChanged(event) => Some(event.to_string()),
            ClassifiedEvent::CrtcChanged(event) => Some(event.to_string()),
            ClassifiedEvent::ScreenChanged | ClassifiedEvent::Unrecognized { .. } => None,
        }
    }
}

/// Maps raw events to RandR notifications relative to the extension's event base.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Classifier {
    event_base: u8,
}

impl Classifier {
    #[must_use]
    pub const fn new(event_base: u8) -> Self {
        Self { event_base }
    }

    #[must_use]
    pub fn classify(&self, raw: &RawEvent) -> ClassifiedEvent {
        let Some(kind) = raw.response_type().checked_sub(self.event_base) else {
            return ClassifiedEvent::Unrecognized { randr: false };
        };

        match kind {
            randr::SCREEN_CHANGE_NOTIFY_EVENT => ClassifiedEvent::ScreenChanged,

            randr::NOTIFY_EVENT => match raw.subtype() {
                NOTIFY_OUTPUT_CHANGE => ClassifiedEvent::OutputChanged(OutputChange::decode(raw)),
                NOTIFY_CRTC_CHANGE => ClassifiedEvent::CrtcChanged(CrtcChange::decode(raw)),
                _ => ClassifiedEvent::Unrecognized { randr: true },
            },

            _ => ClassifiedEvent::Unrecognized { randr: false },
        }
    }
}
