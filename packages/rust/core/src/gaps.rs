//! Gap filling: complete link, date, and summary fields of existing records.
//!
//! Per record, one of three branches runs:
//!
//! - **lookup**: no usable link, or no announcement date. Search by partner
//!   names, pick the most relevant hit, and take link, date, summary and source
//!   text from it. An existing date is never overwritten.
//! - **refresh**: a usable link but no summary. Re-query the link itself for
//!   fresh content and summarize it, falling back to a lookup when the link
//!   yields nothing.
//! - **complete**: link and summary present; nothing to do.

use tracing::{debug, info, instrument, warn};
use url::Url;

use partnerscout_shared::{PartnershipRecord, Result, SearchRequest, SearchResult};

use crate::dates::extract_date;
use crate::pipeline::{EnrichmentPipeline, ProgressReporter};
use crate::prompts;

/// Stored as the summary when the chosen hit carries no usable content.
pub const NO_CONTENT_FROM_LINK: &str = "No content available from link";

/// Stored as the summary when neither the link nor a lookup produced content.
pub const NO_CONTENT_FROM_ANY_SOURCE: &str = "No content available from any source";

/// Content must be longer than this (after trimming) to be summarized.
pub const MIN_SUMMARY_CONTENT_CHARS: usize = 10;

const PARTNERSHIP_KEYWORDS: [&str; 5] = [
    "partner",
    "collaboration",
    "agreement",
    "alliance",
    "join",
];

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GapFillSummary {
    pub total: usize,
    /// Records without both primary partner names.
    pub skipped: usize,
    pub lookups: usize,
    pub refreshes: usize,
    pub complete: usize,
}

/// What a partner-name lookup found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupResult {
    pub link: Option<String>,
    pub announced: Option<String>,
    /// Generated summary or [`NO_CONTENT_FROM_LINK`]; `None` when generation
    /// failed.
    pub summary: Option<String>,
    pub raw_content: Option<String>,
}

/// A link is usable when it parses and names a host.
pub fn is_valid_link(link: &str) -> bool {
    Url::parse(link.trim()).is_ok_and(|url| url.host_str().is_some_and(|h| !h.is_empty()))
}

/// Lookup query for a record's partners.
pub fn lookup_query(partner1: &str, partner2: &str, partner3: Option<&str>) -> String {
    let mut query = format!("{} {} AI partnership announcement", partner1.trim(), partner2.trim());
    if let Some(p3) = partner3 {
        query.push(' ');
        query.push_str(p3);
    }
    query
}

/// Prefer a hit mentioning both partners and a partnership keyword; otherwise
/// the first hit.
pub fn choose_result<'a>(
    results: &'a [SearchResult],
    partner1: &str,
    partner2: &str,
) -> Option<&'a SearchResult> {
    let p1 = partner1.trim().to_lowercase();
    let p2 = partner2.trim().to_lowercase();
    results
        .iter()
        .find(|r| {
            let text = format!("{} {}", r.title, r.content).to_lowercase();
            text.contains(&p1)
                && text.contains(&p2)
                && PARTNERSHIP_KEYWORDS.iter().any(|k| text.contains(k))
        })
        .or_else(|| results.first())
}

fn has_summarizable_content(content: &str) -> bool {
    content.trim().chars().count() > MIN_SUMMARY_CONTENT_CHARS
}

impl EnrichmentPipeline {
    /// Fill missing link/date/summary fields in place, one record at a time.
    #[instrument(skip_all, fields(records = records.len()))]
    pub async fn fill_gaps(
        &self,
        records: &mut [PartnershipRecord],
        progress: &dyn ProgressReporter,
    ) -> GapFillSummary {
        progress.phase("Filling gaps");
        let mut summary = GapFillSummary {
            total: records.len(),
            ..Default::default()
        };

        let total = records.len();
        for (index, record) in records.iter_mut().enumerate() {
            if !record.is_enrichable() {
                debug!(index, "missing partner names, skipping");
                summary.skipped += 1;
                continue;
            }

            let label = format!("{} + {}", record.partner1.trim(), record.partner2.trim());
            progress.record_started(&label, index + 1, total);
            self.pacer.wait().await;

            let valid_link = [&record.link, &record.link2]
                .into_iter()
                .flatten()
                .find(|l| is_valid_link(l))
                .cloned();

            if valid_link.is_none() || !record.has_announced() {
                info!(index, partners = %label, "looking up partnership");
                summary.lookups += 1;
                if let Some(found) = self.find_partnership_info(record).await {
                    apply_lookup(record, found);
                }
            } else if !record.has_summary() {
                info!(index, partners = %label, "refreshing summary from link");
                summary.refreshes += 1;
                if let Some(link) = valid_link {
                    self.refresh_from_link(record, &link).await;
                }
            } else {
                debug!(index, "record complete");
                summary.complete += 1;
            }
        }

        progress.done(&format!(
            "{} lookups, {} refreshes, {} complete, {} skipped",
            summary.lookups, summary.refreshes, summary.complete, summary.skipped
        ));
        summary
    }

    /// Search by partner names and derive link, date, summary and source text
    /// from the most relevant hit. `None` when the search produced nothing.
    pub async fn find_partnership_info(&self, record: &PartnershipRecord) -> Option<LookupResult> {
        let query = lookup_query(&record.partner1, &record.partner2, record.partner3());
        let request =
            SearchRequest::new(query, self.options.lookup_max_results).depth(self.options.depth);
        let results = self.search(&request).await;
        let chosen = choose_result(&results, &record.partner1, &record.partner2)?;

        let summary = if has_summarizable_content(&chosen.content) {
            self.summarize(record, &chosen.content).await
        } else {
            warn!(url = %chosen.url, "no usable content in chosen result");
            Some(NO_CONTENT_FROM_LINK.to_string())
        };

        Some(LookupResult {
            link: Some(chosen.url.clone()).filter(|u| !u.is_empty()),
            announced: extract_date(&chosen.content),
            summary,
            raw_content: Some(chosen.content.clone()).filter(|c| !c.is_empty()),
        })
    }

    async fn refresh_from_link(&self, record: &mut PartnershipRecord, link: &str) {
        let request =
            SearchRequest::new(link, self.options.link_max_results).depth(self.options.depth);
        let results = self.search(&request).await;

        if let Some(first) = results.first() {
            if has_summarizable_content(&first.content) {
                if let Some(summary) = self.summarize(record, &first.content).await {
                    record.summary = Some(summary);
                    record.raw_content = Some(first.content.clone());
                }
                return;
            }
            debug!(%link, "link returned no usable content, falling back to lookup");
        } else {
            debug!(%link, "link returned no results, falling back to lookup");
        }

        let found = self.find_partnership_info(record).await.unwrap_or_default();
        let has_raw = found.raw_content.is_some();
        apply_lookup(record, found);
        if !has_raw {
            record.summary = Some(NO_CONTENT_FROM_ANY_SOURCE.to_string());
        }
    }

    async fn summarize(&self, record: &PartnershipRecord, content: &str) -> Option<String> {
        match self.try_summarize(record, content).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(
                    stage = "summarize",
                    partner1 = %record.partner1,
                    partner2 = %record.partner2,
                    error = %e,
                    "summary generation failed"
                );
                None
            }
        }
    }

    async fn try_summarize(&self, record: &PartnershipRecord, content: &str) -> Result<String> {
        let prompt = prompts::summary(
            record.partner1.trim(),
            record.partner2.trim(),
            prompts::clip(content, self.options.max_content_chars),
        );
        let text = self.generator.generate(&prompt).await?;
        Ok(text.trim().to_string())
    }
}

fn apply_lookup(record: &mut PartnershipRecord, found: LookupResult) {
    if let Some(link) = found.link.filter(|l| is_valid_link(l)) {
        record.link = Some(link);
    }
    if let Some(date) = found.announced {
        if !record.has_announced() {
            record.announced = Some(date);
        }
    }
    if let Some(summary) = found.summary.filter(|s| !s.is_empty()) {
        record.summary = Some(summary);
    }
    if let Some(raw) = found.raw_content {
        record.raw_content = Some(raw);
    }
}
