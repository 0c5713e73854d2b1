//! Lamport clock implementation
//!
//! INVARIANT: the clock value only increases. Every mutation is either `+1`
//! (internal event, send) or `max(local, received) + 1` (receive).

/// Lamport merge rule for a received timestamp.
/// Strictly greater than both inputs; ties broken by the `+1`.
#[inline]
pub fn merged(local: u64, received: u64) -> u64 {
    local.max(received).saturating_add(1)
}

/// Per-node logical clock
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LamportClock {
    value: u64,
}

impl LamportClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        LamportClock::default()
    }

    /// Current value without advancing
    #[inline]
    pub fn now(&self) -> u64 {
        self.value
    }

    /// Advance for an internal event. Returns the new value.
    pub fn advance(&mut self) -> u64 {
        self.value = self.value.saturating_add(1);
        self.value
    }

    /// Advance for a send. The returned value is the value to transmit:
    /// the wire carries the post-increment clock.
    pub fn stamp_send(&mut self) -> u64 {
        self.advance()
    }

    /// Merge a received timestamp. Returns the new value.
    pub fn observe(&mut self, received: u64) -> u64 {
        self.value = merged(self.value, received);
        self.value
    }
}
