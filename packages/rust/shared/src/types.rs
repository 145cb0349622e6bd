//! Core domain types for partnership records, search results, and verdicts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PartnershipPair
// ---------------------------------------------------------------------------

/// Unordered pair of normalized (trimmed, lower-cased) company names.
///
/// Members are stored sorted, so `("Acme", "Globex")` and `("globex", " ACME ")`
/// compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartnershipPair {
    first: String,
    second: String,
}

impl PartnershipPair {
    /// Build a pair from two raw names. Returns `None` if either name is
    /// empty after normalization.
    pub fn new(a: &str, b: &str) -> Option<Self> {
        let a = normalize_name(a);
        let b = normalize_name(b);
        if a.is_empty() || b.is_empty() {
            return None;
        }
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Some(Self { first, second })
    }
}

impl std::fmt::Display for PartnershipPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} + {}", self.first, self.second)
    }
}

/// Case-fold and trim a company name for identity comparisons.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// KnownPairs
// ---------------------------------------------------------------------------

/// Set of partnership pairs already present in storage (or accepted earlier in
/// the same run). Grows monotonically.
#[derive(Debug, Clone, Default)]
pub struct KnownPairs(HashSet<PartnershipPair>);

impl KnownPairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, pair: &PartnershipPair) -> bool {
        self.0.contains(pair)
    }

    /// Insert a pair; returns `false` if it was already known.
    pub fn insert(&mut self, pair: PartnershipPair) -> bool {
        self.0.insert(pair)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PartnershipPair> for KnownPairs {
    fn from_iter<I: IntoIterator<Item = PartnershipPair>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// PartnershipRecord
// ---------------------------------------------------------------------------

/// One row of the persisted partnership table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartnershipRecord {
    pub partner1: String,
    pub partner2: String,
    pub partner3: Option<String>,
    /// Coarse month-year token, e.g. `Oct-24`.
    pub announced: Option<String>,
    /// Primary announcement link.
    pub link: Option<String>,
    /// Secondary link, consulted when the primary one is unusable.
    pub link2: Option<String>,
    pub summary: Option<String>,
    /// Source text the summary was generated from.
    pub raw_content: Option<String>,
    /// Columns this tool does not interpret, as `(header, value)` in column
    /// order. Headers may repeat.
    pub extra: Vec<(String, String)>,
}

impl PartnershipRecord {
    pub fn new(partner1: impl Into<String>, partner2: impl Into<String>) -> Self {
        Self {
            partner1: partner1.into(),
            partner2: partner2.into(),
            ..Default::default()
        }
    }

    /// Both primary partner names are present; otherwise the record is skipped.
    pub fn is_enrichable(&self) -> bool {
        !self.partner1.trim().is_empty() && !self.partner2.trim().is_empty()
    }

    /// Dedup identity of this record.
    pub fn pair(&self) -> Option<PartnershipPair> {
        PartnershipPair::new(&self.partner1, &self.partner2)
    }

    /// Third partner, if one is recorded.
    pub fn partner3(&self) -> Option<&str> {
        self.partner3
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn has_announced(&self) -> bool {
        is_present(&self.announced)
    }

    pub fn has_summary(&self) -> bool {
        is_present(&self.summary)
    }
}

fn is_present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Search types
// ---------------------------------------------------------------------------

/// Provider search depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    #[default]
    Advanced,
}

impl SearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
        }
    }
}

/// Provider recency window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    /// Smallest window covering `days`; `None` for 0 or anything past a year.
    pub fn covering_days(days: u32) -> Option<Self> {
        match days {
            0 => None,
            1 => Some(Self::Day),
            2..=7 => Some(Self::Week),
            8..=31 => Some(Self::Month),
            32..=366 => Some(Self::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

/// A single search query with its provider parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
    pub depth: SearchDepth,
    pub time_range: Option<TimeRange>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
            depth: SearchDepth::default(),
            time_range: None,
        }
    }

    pub fn depth(mut self, depth: SearchDepth) -> Self {
        self.depth = depth;
        self
    }

    pub fn time_range(mut self, time_range: Option<TimeRange>) -> Self {
        self.time_range = time_range;
        self
    }
}

/// One ranked search hit. Ephemeral, never persisted as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

// ---------------------------------------------------------------------------
// ValidationVerdict
// ---------------------------------------------------------------------------

/// Answers to the three partnership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub is_partnership: bool,
    pub is_ai_related: bool,
    pub are_real_companies: bool,
}

impl ValidationVerdict {
    pub fn accepted(&self) -> bool {
        self.is_partnership && self.is_ai_related && self.are_real_companies
    }

    /// Descriptions of the checks that failed, in fixed order.
    pub fn failed_checks(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if !self.is_partnership {
            failed.push("not a valid partnership");
        }
        if !self.is_ai_related {
            failed.push("not AI-related");
        }
        if !self.are_real_companies {
            failed.push("companies not verified as real");
        }
        failed
    }

    /// `"passed"`, or the comma-joined failed checks.
    pub fn reason(&self) -> String {
        if self.accepted() {
            "passed".into()
        } else {
            self.failed_checks().join(", ")
        }
    }
}
