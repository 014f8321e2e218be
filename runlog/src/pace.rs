use serde::{Deserialize, Serialize};

/// Result of reading a pace string such as `5'06` or `05:06`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaceParse {
    /// Seconds per kilometer.
    Parsed(u32),
    /// The text did not have the `minutes<sep>seconds` shape.
    Unparsed,
}

impl PaceParse {
    pub fn seconds(self) -> Option<u32> {
        match self {
            PaceParse::Parsed(s) => Some(s),
            PaceParse::Unparsed => None,
        }
    }

    /// Lossy value used where a number is always needed; unparsed text reads as 0.
    pub fn seconds_or_zero(self) -> u32 {
        self.seconds().unwrap_or(0)
    }

    pub fn is_parsed(self) -> bool {
        matches!(self, PaceParse::Parsed(_))
    }
}

/// Parse a per-kilometer pace. `'` and `:` are both accepted as the
/// minute/second separator and a trailing seconds mark (`''` or `"`) is ignored.
///
/// Seconds are not carried into minutes: `4:75` reads as 315.
pub fn parse_pace(text: &str) -> PaceParse {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_suffix("''")
        .or_else(|| trimmed.strip_suffix('"'))
        .unwrap_or(trimmed);
    let normalized = trimmed.replace('\'', ":");

    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() != 2 {
        return PaceParse::Unparsed;
    }
    let minutes = parts[0].trim().parse::<u32>();
    let seconds = parts[1].trim().parse::<u32>();
    match (minutes, seconds) {
        (Ok(m), Ok(s)) => m
            .checked_mul(60)
            .and_then(|total| total.checked_add(s))
            .map_or(PaceParse::Unparsed, PaceParse::Parsed),
        _ => PaceParse::Unparsed,
    }
}

/// Render seconds per kilometer as `M:SS`.
pub fn format_pace(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
