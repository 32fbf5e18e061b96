use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::IdentifierError;

// ============================================================================
// Fiscal Year Windows & Human-Readable Order Codes
// ============================================================================
//
// Code format: `YY-YY/<channel>/NNNN`, e.g. `25-26/W/0001`.
// Fallback codes replace the sequence with `FB-<token>` and are never
// counted when looking for the highest sequence of a window.
//
// ============================================================================

pub const SEQUENCE_WIDTH: usize = 4;
pub const MAX_SEQUENCE: u32 = 9_999;
const FALLBACK_PREFIX: &str = "FB-";

/// A twelve-month numbering period starting on a configured month boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalWindow {
    pub start_year: i32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FiscalWindow {
    /// Key used for counters and indexes, e.g. `25-26`.
    pub fn label(&self) -> String {
        format!(
            "{:02}-{:02}",
            self.start_year.rem_euclid(100),
            (self.start_year + 1).rem_euclid(100)
        )
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}

#[derive(Debug, Clone)]
pub struct FiscalPolicy {
    start_month: u32,
    offset: FixedOffset,
    channel: String,
}

impl FiscalPolicy {
    pub fn new(
        start_month: u32,
        utc_offset_minutes: i32,
        channel: impl Into<String>,
    ) -> Result<Self, IdentifierError> {
        if !(1..=12).contains(&start_month) {
            return Err(IdentifierError::InvalidPolicy(format!(
                "fiscal start month must be 1-12, got {start_month}"
            )));
        }
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).ok_or_else(|| {
            IdentifierError::InvalidPolicy(format!("invalid UTC offset: {utc_offset_minutes} minutes"))
        })?;
        let channel = channel.into();
        if channel.is_empty() || channel.contains('/') {
            return Err(IdentifierError::InvalidPolicy(format!(
                "invalid order code channel: {channel:?}"
            )));
        }

        Ok(Self {
            start_month,
            offset,
            channel,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Window containing `now`, evaluated in the policy's local offset.
    pub fn window(&self, now: DateTime<Utc>) -> Result<FiscalWindow, IdentifierError> {
        let local = now.with_timezone(&self.offset);
        let start_year = if local.month() >= self.start_month {
            local.year()
        } else {
            local.year() - 1
        };

        Ok(FiscalWindow {
            start_year,
            start: self.boundary(start_year)?,
            end: self.boundary(start_year + 1)?,
        })
    }

    fn boundary(&self, year: i32) -> Result<DateTime<Utc>, IdentifierError> {
        self.offset
            .with_ymd_and_hms(year, self.start_month, 1, 0, 0, 0)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| IdentifierError::InvalidPolicy(format!("no fiscal boundary for year {year}")))
    }
}

/// Fiscal-year-scoped order code. Assigned once, never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HumanCode(String);

impl HumanCode {
    pub fn sequential(
        window: &FiscalWindow,
        channel: &str,
        sequence: u32,
    ) -> Result<Self, IdentifierError> {
        if sequence == 0 || sequence > MAX_SEQUENCE {
            return Err(IdentifierError::SequenceExhausted {
                fiscal_year: window.label(),
                sequence,
            });
        }
        Ok(Self(format!(
            "{}/{}/{:0width$}",
            window.label(),
            channel,
            sequence,
            width = SEQUENCE_WIDTH
        )))
    }

    /// Non-sequential code used when the counter cannot be reached.
    pub fn fallback(window: &FiscalWindow, channel: &str, token: &str) -> Self {
        Self(format!(
            "{}/{}/{}{}",
            window.label(),
            channel,
            FALLBACK_PREFIX,
            token.to_ascii_uppercase()
        ))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split('/');
        let (label, channel, tail) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || channel.is_empty() {
            return None;
        }
        let (from, to) = label.split_once('-')?;
        let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(from) || !two_digits(to) {
            return None;
        }
        let valid_tail = match tail.strip_prefix(FALLBACK_PREFIX) {
            Some(token) => !token.is_empty(),
            None => tail.len() == SEQUENCE_WIDTH && tail.bytes().all(|b| b.is_ascii_digit()),
        };
        valid_tail.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn fiscal_label(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    /// Trailing numeric sequence; `None` for fallback codes.
    pub fn sequence(&self) -> Option<u32> {
        self.0.rsplit('/').next().and_then(|tail| tail.parse().ok())
    }

    pub fn is_fallback(&self) -> bool {
        self.0
            .rsplit('/')
            .next()
            .is_some_and(|tail| tail.starts_with(FALLBACK_PREFIX))
    }
}

impl fmt::Display for HumanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> FiscalPolicy {
        FiscalPolicy::new(4, 330, "W").unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_window_after_start_month() {
        let window = policy().window(at(2025, 7, 15)).unwrap();

        assert_eq!(window.start_year, 2025);
        assert_eq!(window.label(), "25-26");
        assert!(window.contains(at(2026, 3, 31)));
        assert!(!window.contains(at(2026, 4, 2)));
    }

    #[test]
    fn test_window_before_start_month_belongs_to_previous_year() {
        let window = policy().window(at(2026, 2, 1)).unwrap();
        assert_eq!(window.label(), "25-26");
    }

    #[test]
    fn test_boundary_uses_local_offset() {
        // 2025-03-31 20:00 UTC is already April 1st at +05:30.
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 20, 0, 0).unwrap();
        assert_eq!(policy().window(now).unwrap().label(), "25-26");
    }

    #[test]
    fn test_century_rollover_label() {
        let window = policy().window(at(2099, 6, 1)).unwrap();
        assert_eq!(window.label(), "99-00");
    }

    #[test]
    fn test_sequential_code_format_and_parse() {
        let window = policy().window(at(2025, 4, 10)).unwrap();
        let code = HumanCode::sequential(&window, "W", 1).unwrap();

        assert_eq!(code.as_str(), "25-26/W/0001");
        assert_eq!(code.sequence(), Some(1));
        assert_eq!(code.fiscal_label(), "25-26");
        assert_eq!(HumanCode::parse("25-26/W/0001"), Some(code));
    }

    #[test]
    fn test_sequence_exhausted() {
        let window = policy().window(at(2025, 4, 10)).unwrap();
        let result = HumanCode::sequential(&window, "W", MAX_SEQUENCE + 1);

        assert!(matches!(
            result,
            Err(IdentifierError::SequenceExhausted { sequence: 10_000, .. })
        ));
    }

    #[test]
    fn test_fallback_code_is_marked() {
        let window = policy().window(at(2025, 4, 10)).unwrap();
        let code = HumanCode::fallback(&window, "W", "1a2b3c4d");

        assert_eq!(code.as_str(), "25-26/W/FB-1A2B3C4D");
        assert!(code.is_fallback());
        assert_eq!(code.sequence(), None);
        assert!(HumanCode::parse(code.as_str()).is_some());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(HumanCode::parse("25-26/W/01").is_none());
        assert!(HumanCode::parse("2025/W/0001").is_none());
        assert!(HumanCode::parse("25-26/W/0001/x").is_none());
        assert!(HumanCode::parse("random").is_none());
    }

    #[test]
    fn test_invalid_policy() {
        assert!(FiscalPolicy::new(13, 0, "W").is_err());
        assert!(FiscalPolicy::new(4, 0, "W/X").is_err());
    }
}
