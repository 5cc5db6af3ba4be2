use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::ValidationError;

/// Calendar date in strict `YYYY-MM-DD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDate(Date);

impl TradeDate {
    /// Parse a `YYYY-MM-DD` date, rejecting impossible months and days.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDate {
            value: input.to_owned(),
        };

        let shape_ok = input.len() == 10
            && input.bytes().enumerate().all(|(index, byte)| match index {
                4 | 7 => byte == b'-',
                _ => byte.is_ascii_digit(),
            });
        if !shape_ok {
            return Err(invalid());
        }

        Date::parse(input, format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| invalid())
    }

    /// Today's date in UTC.
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    /// The date `days` days earlier, saturating at the minimum date.
    pub fn minus_days(self, days: i64) -> Self {
        Self(self.0.checked_sub(Duration::days(days)).unwrap_or(Date::MIN))
    }

    pub fn format_iso(self) -> String {
        format!(
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl Display for TradeDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for TradeDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for TradeDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

/// Inclusive `[start, end]` range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: TradeDate,
    pub end: TradeDate,
}

impl DateWindow {
    pub fn new(start: TradeDate, end: TradeDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// The `weeks` weeks ending on `end`, both bounds included.
    pub fn trailing_weeks(end: TradeDate, weeks: u32) -> Self {
        Self {
            start: end.minus_days(i64::from(weeks) * 7),
            end,
        }
    }

    pub fn contains(&self, date: TradeDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_date() {
        let date = TradeDate::parse("2024-02-29").expect("leap day");
        assert_eq!(date.to_string(), "2024-02-29");
    }

    #[test]
    fn rejects_impossible_month() {
        let err = TradeDate::parse("2020-13-01").expect_err("month 13");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn rejects_non_padded_and_timestamped_input() {
        for input in ["2020-1-01", "2020-01-01T00:00:00", "20200101", "2021-02-29", ""] {
            assert!(TradeDate::parse(input).is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn trailing_window_includes_both_bounds() {
        let end = TradeDate::parse("2024-03-15").expect("date");
        let window = DateWindow::trailing_weeks(end, 2);

        assert_eq!(window.start.to_string(), "2024-03-01");
        assert!(window.contains(TradeDate::parse("2024-03-01").expect("date")));
        assert!(window.contains(end));
        assert!(!window.contains(TradeDate::parse("2024-02-29").expect("date")));
        assert!(!window.contains(TradeDate::parse("2024-03-16").expect("date")));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let start = TradeDate::parse("2024-03-15").expect("date");
        let end = TradeDate::parse("2024-03-01").expect("date");
        assert!(matches!(
            DateWindow::new(start, end),
            Err(ValidationError::InvertedDateRange { .. })
        ));
    }
}
