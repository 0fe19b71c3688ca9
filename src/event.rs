use serde::{Serialize, Serializer};
use std::fmt;

/// Per-frame signal for the host (audio cue, toast).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepEvent {
    /// A correct rep was counted; carries the new total.
    Rep(u32),
    Incorrect,
    ResetCounters,
}

impl RepEvent {
    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepEvent::Rep(n) => write!(f, "rep:{}", n),
            RepEvent::Incorrect => f.write_str("incorrect"),
            RepEvent::ResetCounters => f.write_str("reset_counters"),
        }
    }
}

impl Serialize for RepEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
