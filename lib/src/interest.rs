// Copyright 2025 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use std::fmt;

/// A class of RandR configuration notification.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EventClass {
    CrtcChange,
    OutputChange,
    ScreenChange,
}

impl EventClass {
    pub const ALL: [EventClass; 3] = [
        EventClass::CrtcChange,
        EventClass::OutputChange,
        EventClass::ScreenChange,
    ];

    /// The bit this class occupies in the RandR `NotifyMask`.
    #[must_use]
    pub const fn bit(self) -> u16 {
        match self {
            EventClass::ScreenChange => 1 << 0,
            EventClass::CrtcChange => 1 << 1,
            EventClass::OutputChange => 1 << 2,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EventClass::CrtcChange => "crtc_change",
            EventClass::OutputChange => "output_change",
            EventClass::ScreenChange => "screen_change",
        }
    }
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<&str> for EventClass {
    type Error = &'static str;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(match value {
            "crtc_change" => EventClass::CrtcChange,
            "output_change" => EventClass::OutputChange,
            "screen_change" => EventClass::ScreenChange,
            _ => return Err("unknown event class"),
        })
    }
}

/// The set of notification classes selected on the root window.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct InterestMask(u16);

impl InterestMask {
    pub const EMPTY: InterestMask = InterestMask(0);

    /// Every class this tool knows how to report.
    pub const ALL: InterestMask = InterestMask(
        EventClass::CrtcChange.bit()
            | EventClass::OutputChange.bit()
            | EventClass::ScreenChange.bit(),
    );

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn contains(self, class: EventClass) -> bool {
        self.0 & class.bit() != 0
    }

    #[must_use]
    pub const fn with(self, class: EventClass) -> Self {
        InterestMask(self.0 | class.bit())
    }

    /// The mask actually registered with the server: an empty selection means everything.
    #[must_use]
    pub const fn effective(self) -> Self {
        if self.is_empty() { Self::ALL } else { self }
    }

    pub fn iter(self) -> impl Iterator<Item = EventClass> {
        EventClass::ALL
            .into_iter()
            .filter(move |class| self.contains(*class))
    }
}

impl FromIterator<EventClass> for InterestMask {
    fn from_iter<I: IntoIterator<Item = EventClass>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, InterestMask::with)
    }
}

impl fmt::Display for InterestMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, class) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            f.write_str(class.name())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_to_classes() {
        for class in EventClass::ALL {
            assert_eq!(EventClass::try_from(class.name()), Ok(class));
        }
        assert_eq!(EventClass::CrtcChange.name(), "crtc_change");
        assert_eq!(EventClass::OutputChange.name(), "output_change");
        assert_eq!(EventClass::ScreenChange.name(), "screen_change");
        assert!(EventClass::try_from("CRTC_CHANGE").is_err());
        assert!(EventClass::try_from("").is_err());
    }

    #[test]
    fn bits_follow_randr_notify_mask() {
        assert_eq!(EventClass::ScreenChange.bit(), 1);
        assert_eq!(EventClass::CrtcChange.bit(), 2);
        assert_eq!(EventClass::OutputChange.bit(), 4);
        assert_eq!(InterestMask::ALL.bits(), 7);
    }

    #[test]
    fn empty_mask_is_effectively_everything() {
        assert_eq!(InterestMask::EMPTY.effective(), InterestMask::ALL);

        let output_only: InterestMask = [EventClass::OutputChange].into_iter().collect();
        assert_eq!(output_only.effective(), output_only);
        assert!(output_only.contains(EventClass::OutputChange));
        assert!(!output_only.contains(EventClass::CrtcChange));
    }

    #[test]
    fn union_of_repeated_classes() {
        let mask: InterestMask = [
            EventClass::ScreenChange,
            EventClass::CrtcChange,
            EventClass::ScreenChange,
        ]
        .into_iter()
        .collect();

        assert_eq!(mask.bits(), 3);
        assert_eq!(mask.to_string(), "crtc_change,screen_change");
    }
}
