use chrono::NaiveTime;

/// Marker rendered for any slot without a usable time.
pub const ABSENCE_MARKER: &str = "-";

/// A clock slot value constructed only through validated parsing.
///
/// Display-layer inputs are untrusted free text in some code paths, so
/// parsing never fails loudly: unrecognized text degrades to `Malformed`,
/// which renders as the absence marker and contributes nothing to
/// undertime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockValue {
    Valid(NaiveTime),
    Absent,
    Malformed,
}

impl ClockValue {
    /// Lifts an optional stored time (24-hour `HH:MM:SS` column) into a slot value.
    pub fn from_stored(time: Option<NaiveTime>) -> Self {
        match time {
            Some(t) => ClockValue::Valid(t),
            None => ClockValue::Absent,
        }
    }

    /// Parses display text: `h:mm AM/PM`, `HH:MM:SS` or `HH:MM`.
    /// Empty input or the absence marker is `Absent`; anything else that
    /// fails to parse is `Malformed`.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() || input == ABSENCE_MARKER {
            return ClockValue::Absent;
        }

        for format in ["%I:%M %p", "%H:%M:%S", "%H:%M"] {
            if let Ok(t) = NaiveTime::parse_from_str(input, format) {
                return ClockValue::Valid(t);
            }
        }

        ClockValue::Malformed
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            ClockValue::Valid(t) => Some(*t),
            _ => None,
        }
    }

    /// Minutes since midnight, for interval arithmetic.
    pub fn minutes_since_midnight(&self) -> Option<u32> {
        use chrono::Timelike;
        self.as_time().map(|t| t.hour() * 60 + t.minute())
    }

    /// 12-hour `h:mm AM/PM` rendering; non-times render as the absence marker.
    pub fn display(&self) -> String {
        match self {
            ClockValue::Valid(t) => t.format("%-I:%M %p").to_string(),
            _ => ABSENCE_MARKER.to_string(),
        }
    }
}
