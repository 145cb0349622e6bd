//! Best-effort announcement-date extraction from free text.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // October 23, 2024
        Regex::new(r"\w+\s+\d{1,2},\s*20\d{2}").expect("valid regex"),
        // 23 October 2024
        Regex::new(r"\d{1,2}\s+\w+\s+20\d{2}").expect("valid regex"),
        // 2024-10-23
        Regex::new(r"20\d{2}-\d{1,2}-\d{1,2}").expect("valid regex"),
    ]
});

const FORMATS: [&str; 5] = ["%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y", "%Y-%m-%d"];

/// First recognizable date in `text` as a month-year token such as `Oct-24`.
///
/// Patterns are tried in order; for each, only the first match is parsed. A
/// match that fits no format moves on to the next pattern.
pub fn extract_date(text: &str) -> Option<String> {
    PATTERNS.iter().find_map(|pattern| {
        let candidate = pattern.find(text)?.as_str();
        let candidate = collapse_spaces(candidate);
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&candidate, fmt).ok())
            .map(|date| date.format("%b-%y").to_string())
    })
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
