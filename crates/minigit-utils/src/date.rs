use bstr::{BStr, BString, ByteSlice, ByteVec};
use chrono::Local;

use crate::error::UtilError;
use crate::Result;

/// A git date: seconds since the Unix epoch plus a timezone offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitDate {
    /// Seconds since Unix epoch.
    pub timestamp: i64,
    /// Timezone offset in minutes from UTC (e.g., -300 for EST).
    pub tz_offset: i32,
}

/// Git stores the timezone as a decimal `±HHMM` (e.g. -0500 parses to the
/// integer -500). Convert that representation to minutes.
fn tz_offset_to_minutes(tz: i32) -> i32 {
    let sign = if tz < 0 { -1 } else { 1 };
    let abs = tz.unsigned_abs() as i32;
    let hours = abs / 100;
    let mins = abs % 100;
    sign * (hours * 60 + mins)
}

/// Convert a minutes offset back to the `±HHMM` decimal representation.
fn minutes_to_tz_offset(minutes: i32) -> i32 {
    let sign = if minutes < 0 { -1 } else { 1 };
    let abs = minutes.unsigned_abs() as i32;
    let hours = abs / 60;
    let mins = abs % 60;
    sign * (hours * 100 + mins)
}

impl GitDate {
    /// Create a GitDate from a Unix timestamp and timezone offset in minutes.
    pub fn new(timestamp: i64, tz_offset_minutes: i32) -> Self {
        Self {
            timestamp,
            tz_offset: tz_offset_minutes,
        }
    }

    /// The current time with the local timezone offset.
    pub fn now() -> Self {
        let now = Local::now();
        let offset_secs = now.offset().local_minus_utc();
        Self {
            timestamp: now.timestamp(),
            tz_offset: offset_secs / 60,
        }
    }

    /// Parse raw git format: `"<timestamp> <±HHMM>"` or just `"<timestamp>"`.
    pub fn parse_raw(input: &str) -> Result<Self> {
        let input = input.trim();

        let parts: Vec<&str> = input.splitn(2, ' ').collect();

        let timestamp: i64 = parts[0]
            .parse()
            .map_err(|_| UtilError::DateParse(format!("invalid timestamp: '{}'", parts[0])))?;

        let tz_offset = if parts.len() > 1 {
            let tz_str = parts[1].trim();
            let tz_int: i32 = tz_str
                .parse()
                .map_err(|_| UtilError::DateParse(format!("invalid timezone: '{}'", tz_str)))?;
            tz_offset_to_minutes(tz_int)
        } else {
            0
        };

        Ok(Self {
            timestamp,
            tz_offset,
        })
    }

    /// Format in raw git style: `"<timestamp> <±HHMM>"`.
    pub fn to_raw(&self) -> String {
        let tz = minutes_to_tz_offset(self.tz_offset);
        format!("{} {:+05}", self.timestamp, tz)
    }
}

/// An identity line as embedded in commit and tag objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    pub date: GitDate,
}

impl Signature {
    /// Parse from git format: `Name <email> timestamp tz`
    ///
    /// Example: "John Doe <john@example.com> 1234567890 +0000"
    pub fn parse(input: &BStr) -> Result<Self> {
        let input = input.as_bytes();

        // Find the last '>' to split off the date portion
        let gt_pos = input
            .iter()
            .rposition(|&b| b == b'>')
            .ok_or_else(|| UtilError::SignatureParse("missing '>' in signature".into()))?;

        // Find the '<' for the email
        let lt_pos = input[..gt_pos]
            .iter()
            .rposition(|&b| b == b'<')
            .ok_or_else(|| UtilError::SignatureParse("missing '<' in signature".into()))?;

        let name = input[..lt_pos].trim();
        let email = &input[lt_pos + 1..gt_pos];

        let date_str = input[gt_pos + 1..].trim();
        let date_str = std::str::from_utf8(date_str)
            .map_err(|_| UtilError::SignatureParse("non-UTF-8 date in signature".into()))?;

        let date = GitDate::parse_raw(date_str)?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            date,
        })
    }

    /// Format in git's canonical format: `Name <email> timestamp tz`
    pub fn to_bytes(&self) -> BString {
        let mut out = BString::new(Vec::new());
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(b"> ");
        out.push_str(self.date.to_raw().as_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_raw_with_offset() {
        let date = GitDate::parse_raw("1700000000 +0130").unwrap();
        assert_eq!(date.timestamp, 1_700_000_000);
        assert_eq!(date.tz_offset, 90);
    }

    #[test]
    fn parse_raw_negative_offset() {
        let date = GitDate::parse_raw("1234567890 -0500").unwrap();
        assert_eq!(date.tz_offset, -300);
    }

    #[test]
    fn parse_raw_no_offset() {
        let date = GitDate::parse_raw("42").unwrap();
        assert_eq!(date.timestamp, 42);
        assert_eq!(date.tz_offset, 0);
    }

    #[test]
    fn raw_roundtrip() {
        for raw in ["1700000000 +0000", "1234567890 -0500", "1 +1345"] {
            let date = GitDate::parse_raw(raw).unwrap();
            assert_eq!(date.to_raw(), raw);
        }
    }

    #[test]
    fn parse_raw_rejects_garbage() {
        assert!(GitDate::parse_raw("yesterday").is_err());
        assert!(GitDate::parse_raw("1700000000 noon").is_err());
    }

    #[test]
    fn signature_roundtrip() {
        let sig = Signature::parse(BStr::new(
            b"John Doe <john@example.com> 1234567890 +0000",
        ))
        .unwrap();
        assert_eq!(sig.name, "John Doe");
        assert_eq!(sig.email, "john@example.com");
        assert_eq!(sig.date.timestamp, 1_234_567_890);
        assert_eq!(
            sig.to_bytes(),
            BString::from("John Doe <john@example.com> 1234567890 +0000")
        );
    }

    #[test]
    fn signature_missing_email_brackets() {
        assert!(Signature::parse(BStr::new(b"John Doe 1234567890 +0000")).is_err());
    }
}
