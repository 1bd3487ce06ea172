//! Trace timestamps
//!
//! ftrace prints `seconds.fraction` where the fraction is usually six digits
//! (microseconds) but may be nine (nanoseconds) depending on the clock.

use serde::Serialize;
use std::fmt;

/// Point in time taken from a trace line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timestamp {
    pub secs: u64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(secs: u64, nanos: u32) -> Self {
        Self { secs, nanos }
    }

    /// Parse a `seconds.fraction` token.
    ///
    /// Returns `None` for anything that is not two runs of ASCII digits
    /// separated by a single dot, or a fraction longer than nine digits.
    pub fn parse(token: &str) -> Option<Self> {
        let (secs, fraction) = token.split_once('.')?;
        if secs.is_empty() || fraction.is_empty() || fraction.len() > 9 {
            return None;
        }
        if !secs.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let secs: u64 = secs.parse().ok()?;
        let raw: u32 = fraction.parse().ok()?;
        let nanos = raw * 10u32.pow(9 - fraction.len() as u32);

        Some(Self { secs, nanos })
    }

    pub fn micros(&self) -> u32 {
        self.nanos / 1000
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_microseconds() {
        let ts = Timestamp::parse("1234.567890").unwrap();
        assert_eq!(ts.secs, 1234);
        assert_eq!(ts.nanos, 567_890_000);
        assert_eq!(ts.micros(), 567_890);
    }

    #[test]
    fn test_parse_nanoseconds() {
        let ts = Timestamp::parse("5.000000123").unwrap();
        assert_eq!(ts, Timestamp::new(5, 123));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Timestamp::parse("12a4.000001").is_none());
        assert!(Timestamp::parse("1234").is_none());
        assert!(Timestamp::parse(".5").is_none());
        assert!(Timestamp::parse("1.").is_none());
        assert!(Timestamp::parse("1.1234567890").is_none());
        assert!(Timestamp::parse("-1.000001").is_none());
    }

    #[test]
    fn test_ordering_and_display() {
        let a = Timestamp::new(10, 999_999_000);
        let b = Timestamp::new(11, 0);
        assert!(a < b);
        assert_eq!(a.to_string(), "10.999999");
        assert_eq!(Timestamp::new(3, 42_000).to_string(), "3.000042");
    }
}
