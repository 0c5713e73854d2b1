//! Event taxonomy
//!
//! Every entry in a node's event log is one of these kinds. SEND, RECEIVE and
//! INTERNAL mutate the logical clock; ERROR records a failed or impossible
//! operation without halting the node.

use std::fmt;

/// Event kind classification for the per-node log
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Send,
    Receive,
    Internal,
    Error,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Send => "SEND",
            EventKind::Receive => "RECEIVE",
            EventKind::Internal => "INTERNAL",
            EventKind::Error => "ERROR",
        }
    }

    /// Does this kind advance the logical clock?
    pub fn mutates_clock(self) -> bool {
        !matches!(self, EventKind::Error)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
