//! Wire format
//!
//! Plain text, newline-delimited, one message per line, exactly
//! `clock:<decimal-integer>\n`. No framing beyond the newline, no
//! acknowledgement, no handshake.

/// Line prefix for clock messages
pub const CLOCK_PREFIX: &str = "clock:";

/// Encode a clock value as one wire line, newline included
pub fn encode_clock(value: u64) -> String {
    format!("{CLOCK_PREFIX}{value}\n")
}

/// Parse one wire line. Anything that is not the prefix followed by a
/// decimal integer yields `None` and is discarded by the caller.
pub fn parse_clock_line(line: &str) -> Option<u64> {
    line.trim().strip_prefix(CLOCK_PREFIX)?.parse().ok()
}
