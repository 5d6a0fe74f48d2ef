//! Pure classification of raw call events.

use crate::call::CallEvent;

/// Classification of a raw call event for lead-creation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualification {
    Accepted,
    Missed,
    Unqualified,
}

impl Qualification {
    /// Whether the event should produce a call record.
    pub fn qualifies(&self) -> bool {
        !matches!(self, Qualification::Unqualified)
    }

    /// Stored call-type label for qualified events.
    pub fn call_type(&self) -> Option<&'static str> {
        match self {
            Qualification::Accepted => Some("Accepted"),
            Qualification::Missed => Some("Missed"),
            Qualification::Unqualified => None,
        }
    }
}

/// Classify a call event.
///
/// Rules, in order: events without legs and non-inbound events never qualify;
/// an event with any leg whose result is "accepted" (any casing) is Accepted
/// regardless of its top-level result; otherwise a top-level result of
/// "missed" (any casing) is Missed; everything else is Unqualified.
pub fn qualify(event: &CallEvent) -> Qualification {
    if event.legs.is_empty() {
        return Qualification::Unqualified;
    }
    if event.direction != "Inbound" {
        return Qualification::Unqualified;
    }
    if event
        .legs
        .iter()
        .any(|leg| leg.result.eq_ignore_ascii_case("accepted"))
    {
        return Qualification::Accepted;
    }
    if event.result.eq_ignore_ascii_case("missed") {
        return Qualification::Missed;
    }
    Qualification::Unqualified
}
