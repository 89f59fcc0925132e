//! Commit dates and author/committer signatures.
//!
//! Timestamps are stored exactly as they appear on the wire: seconds since
//! the Unix epoch plus a timezone offset. Formatting for display goes through
//! chrono; parsing never does.

use bstr::{BStr, BString, ByteSlice, ByteVec};
use chrono::{FixedOffset, TimeZone};

use crate::error::UtilError;
use crate::Result;

/// A timestamp with timezone information, as recorded in commit headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitDate {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Timezone offset in minutes from UTC (e.g. -300 for EST).
    pub tz_offset: i32,
}

/// Convert the on-wire `+hhmm` decimal form to minutes (`-0130` → -90).
fn tz_to_minutes(tz: i32) -> i32 {
    let sign = if tz < 0 { -1 } else { 1 };
    let abs = tz.unsigned_abs() as i32;
    sign * (abs / 100 * 60 + abs % 100)
}

/// Convert minutes back to the `+hhmm` decimal form (-90 → -130).
fn minutes_to_tz(minutes: i32) -> i32 {
    let sign = if minutes < 0 { -1 } else { 1 };
    let abs = minutes.unsigned_abs() as i32;
    sign * (abs / 60 * 100 + abs % 60)
}

impl GitDate {
    pub fn new(timestamp: i64, tz_offset_minutes: i32) -> Self {
        Self {
            timestamp,
            tz_offset: tz_offset_minutes,
        }
    }

    /// Parse the raw wire format: `<unix-seconds> <+/-hhmm>`.
    ///
    /// A missing offset is treated as UTC.
    pub fn parse_raw(input: &str) -> Result<Self> {
        let input = input.trim();
        let mut parts = input.splitn(2, ' ');

        let ts_str = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| UtilError::DateParse("empty date string".into()))?;
        let timestamp: i64 = ts_str
            .parse()
            .map_err(|_| UtilError::DateParse(format!("invalid timestamp: '{ts_str}'")))?;

        let tz_offset = match parts.next() {
            Some(tz_str) => {
                let tz: i32 = tz_str
                    .trim()
                    .parse()
                    .map_err(|_| UtilError::DateParse(format!("invalid timezone: '{tz_str}'")))?;
                tz_to_minutes(tz)
            }
            None => 0,
        };

        Ok(Self {
            timestamp,
            tz_offset,
        })
    }

    /// Format in the wire form: `<unix-seconds> <+/-hhmm>`.
    pub fn to_raw(&self) -> String {
        format!("{} {:+05}", self.timestamp, minutes_to_tz(self.tz_offset))
    }

    /// Format for human display in the date's own timezone, e.g.
    /// `Thu Feb 13 23:31:30 2009 +0000`.
    pub fn format_default(&self) -> String {
        let offset = FixedOffset::east_opt(self.tz_offset * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        match offset.timestamp_opt(self.timestamp, 0).single() {
            Some(dt) => dt.format("%a %b %-d %H:%M:%S %Y %z").to_string(),
            None => self.to_raw(),
        }
    }
}

/// An author or committer identity: `Name <email> timestamp tz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    pub date: GitDate,
}

impl Signature {
    /// Parse from the wire format, splitting at the last `<`/`>` pair so that
    /// names containing angle brackets still parse.
    pub fn parse(input: &BStr) -> Result<Self> {
        let bytes = input.as_bytes();

        let gt = bytes
            .iter()
            .rposition(|&b| b == b'>')
            .ok_or_else(|| UtilError::SignatureParse("missing '>'".into()))?;
        let lt = bytes[..gt]
            .iter()
            .rposition(|&b| b == b'<')
            .ok_or_else(|| UtilError::SignatureParse("missing '<'".into()))?;

        let name = bytes[..lt].trim();
        let email = &bytes[lt + 1..gt];

        let date_str = bytes[gt + 1..].trim();
        let date_str = std::str::from_utf8(date_str)
            .map_err(|_| UtilError::SignatureParse("non-UTF-8 date".into()))?;
        let date = GitDate::parse_raw(date_str)?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            date,
        })
    }

    /// Format in the canonical wire form.
    pub fn to_bytes(&self) -> BString {
        let mut out = BString::new(Vec::new());
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(b"> ");
        out.push_str(self.date.to_raw().as_bytes());
        out
    }

    /// `Name <email>` without the date.
    pub fn who(&self) -> BString {
        let mut out = BString::new(Vec::new());
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(b">");
        out
    }
}
