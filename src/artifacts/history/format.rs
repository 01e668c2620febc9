//! Display columns for history rows
//!
//! Rendering is pure: the same row and [`DateDisplay`] always give the same
//! columns.

use crate::artifacts::history::row::{HeadMarkers, HistoryRow};
use anyhow::Context;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Offset};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How commit timestamps are rendered: a `strftime` pattern and the offset
/// the timestamp is converted to first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateDisplay {
    format: String,
    offset: FixedOffset,
}

impl DateDisplay {
    /// Fails when `format` holds an unknown or incomplete specifier
    pub fn try_new(format: impl Into<String>, offset: FixedOffset) -> anyhow::Result<Self> {
        let format = format.into();

        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            anyhow::bail!("invalid date format: {format:?}");
        }

        Ok(DateDisplay { format, offset })
    }

    /// Default format in the offset of the machine's local time zone
    pub fn local() -> Self {
        DateDisplay {
            format: DEFAULT_DATE_FORMAT.to_string(),
            offset: chrono::Local::now().offset().fix(),
        }
    }

    pub fn utc() -> Self {
        DateDisplay {
            format: DEFAULT_DATE_FORMAT.to_string(),
            offset: chrono::Utc.fix(),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn render(&self, timestamp: DateTime<FixedOffset>) -> String {
        timestamp
            .with_timezone(&self.offset)
            .format(&self.format)
            .to_string()
    }
}

impl Default for DateDisplay {
    fn default() -> Self {
        DateDisplay::local()
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM` or `Z`
pub fn parse_utc_offset(value: &str) -> anyhow::Result<FixedOffset> {
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(chrono::Utc.fix());
    }

    let (sign, digits) = match value.split_at_checked(1) {
        Some(("+", digits)) => (1, digits),
        Some(("-", digits)) => (-1, digits),
        _ => anyhow::bail!("invalid UTC offset {value:?}, expected ±HH:MM"),
    };
    let digits = digits.replace(':', "");
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("invalid UTC offset {value:?}, expected ±HH:MM");
    }

    let hours: i32 = digits[..2].parse()?;
    let minutes: i32 = digits[2..].parse()?;
    if minutes >= 60 {
        anyhow::bail!("invalid UTC offset {value:?}, minutes out of range");
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .with_context(|| format!("UTC offset out of range: {value}"))
}

/// Display columns of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowColumns {
    pub short_id: String,
    pub markers: HeadMarkers,
    pub message: String,
    pub author: String,
    pub date: String,
}

impl RowColumns {
    /// Head marker and short message separated by a space, or the message alone
    pub fn label(&self) -> String {
        label(self.markers.label(), &self.message)
    }
}

pub fn label(marker: Option<&str>, message: &str) -> String {
    match marker {
        Some(marker) => format!("{marker} {message}"),
        None => message.to_string(),
    }
}

impl HistoryRow {
    pub fn columns(&self, dates: &DateDisplay) -> RowColumns {
        let commit = self.commit();

        RowColumns {
            short_id: self.oid().to_short_oid(),
            markers: self.markers(),
            message: commit.short_message(),
            author: commit.author().name().to_string(),
            date: dates.render(commit.timestamp()),
        }
    }
}
