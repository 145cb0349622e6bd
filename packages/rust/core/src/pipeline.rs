//! Enrichment pipeline: discovery of new partnerships.
//!
//! [`EnrichmentPipeline`] owns the search and generation backends plus the
//! extractor and validator built on them. Discovery lives here; gap filling of
//! existing records is in [`crate::gaps`].
//!
//! Every provider failure is logged and treated as "no result"; nothing in this
//! module aborts a run.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use partnerscout_llm::TextGenerator;
use partnerscout_search::ResultSource;
use partnerscout_shared::{
    AppConfig, KnownPairs, PartnershipPair, PartnershipRecord, SearchDepth, SearchRequest,
    SearchResult, TimeRange,
};

use crate::dates::extract_date;
use crate::extractor::EntityExtractor;
use crate::pacing::Pacer;
use crate::validator::PartnershipValidator;

/// Results with less content than this are not sent to extraction.
pub const MIN_DISCOVERY_CONTENT_CHARS: usize = 50;

/// Extracted names shorter than this are treated as noise.
pub const MIN_COMPANY_NAME_CHARS: usize = 3;

// ---------------------------------------------------------------------------
// Options and progress
// ---------------------------------------------------------------------------

/// Search parameters used by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Results requested when looking up a record by partner names.
    pub lookup_max_results: usize,
    /// Results requested when re-querying an existing link.
    pub link_max_results: usize,
    pub depth: SearchDepth,
    /// Recency window applied to discovery queries.
    pub time_range: Option<TimeRange>,
    /// Source text embedded in any one prompt, in characters.
    pub max_content_chars: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            lookup_max_results: 3,
            link_max_results: 1,
            depth: SearchDepth::default(),
            time_range: None,
            max_content_chars: usize::MAX,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            lookup_max_results: config.pipeline.lookup_max_results,
            link_max_results: config.search.default_max_results.max(1),
            depth: config.search.search_depth,
            time_range: TimeRange::covering_days(config.pipeline.days_back),
            max_content_chars: config.llm.max_content_chars,
        }
    }
}

/// Progress callback for long-running pipeline operations.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each discovery query.
    fn query_started(&self, query: &str, current: usize, total: usize);
    /// Called before each record during gap filling.
    fn record_started(&self, label: &str, current: usize, total: usize);
    /// Called when discovery accepts a new partnership.
    fn partnership_found(&self, record: &PartnershipRecord);
    /// Called when the operation completes.
    fn done(&self, message: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn query_started(&self, _query: &str, _current: usize, _total: usize) {}
    fn record_started(&self, _label: &str, _current: usize, _total: usize) {}
    fn partnership_found(&self, _record: &PartnershipRecord) {}
    fn done(&self, _message: &str) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct EnrichmentPipeline {
    pub(crate) source: Arc<dyn ResultSource>,
    pub(crate) generator: Arc<dyn TextGenerator>,
    pub(crate) extractor: EntityExtractor,
    pub(crate) validator: PartnershipValidator,
    pub(crate) pacer: Pacer,
    pub(crate) options: PipelineOptions,
}

impl EnrichmentPipeline {
    pub fn new(
        source: Arc<dyn ResultSource>,
        generator: Arc<dyn TextGenerator>,
        pacer: Pacer,
        options: PipelineOptions,
    ) -> Self {
        Self {
            extractor: EntityExtractor::new(generator.clone())
                .with_max_content_chars(options.max_content_chars),
            validator: PartnershipValidator::new(generator.clone())
                .with_max_content_chars(options.max_content_chars),
            source,
            generator,
            pacer,
            options,
        }
    }

    /// Search the open web for partnerships not already in `known`.
    ///
    /// Each accepted pair is added to `known` immediately, so no pair is
    /// returned twice and no pair already known is returned at all.
    #[instrument(skip_all, fields(queries = queries.len(), known = known.len()))]
    pub async fn discover(
        &self,
        known: &mut KnownPairs,
        queries: &[String],
        max_results_per_query: usize,
        progress: &dyn ProgressReporter,
    ) -> Vec<PartnershipRecord> {
        progress.phase("Discovering partnerships");
        let mut found = Vec::new();

        for (i, query) in queries.iter().enumerate() {
            progress.query_started(query, i + 1, queries.len());
            self.pacer.wait().await;

            let request = SearchRequest::new(query.as_str(), max_results_per_query)
                .depth(self.options.depth)
                .time_range(self.options.time_range);
            let results = self.search(&request).await;
            if results.is_empty() {
                debug!(%query, "no usable results");
                continue;
            }

            for result in &results {
                self.discover_in_result(result, known, &mut found, progress)
                    .await;
            }
        }

        info!(found = found.len(), "discovery complete");
        progress.done(&format!("Found {} new partnerships", found.len()));
        found
    }

    async fn discover_in_result(
        &self,
        result: &SearchResult,
        known: &mut KnownPairs,
        found: &mut Vec<PartnershipRecord>,
        progress: &dyn ProgressReporter,
    ) {
        if result.content.chars().count() < MIN_DISCOVERY_CONTENT_CHARS {
            debug!(url = %result.url, "content too short, skipping");
            return;
        }

        let text = format!("{} {}", result.content, result.title);
        let companies = self.extractor.extract(&text).await;
        if companies.len() < 2 {
            debug!(url = %result.url, count = companies.len(), "fewer than two companies");
            return;
        }

        for (i, first) in companies.iter().enumerate() {
            for second in &companies[i + 1..] {
                if first.chars().count() < MIN_COMPANY_NAME_CHARS
                    || second.chars().count() < MIN_COMPANY_NAME_CHARS
                {
                    continue;
                }
                let Some(pair) = PartnershipPair::new(first, second) else {
                    continue;
                };
                if known.contains(&pair) {
                    debug!(%pair, "already known");
                    continue;
                }

                let outcome = self.validator.validate(first, second, &result.content).await;
                if !outcome.accepted {
                    info!(%pair, reason = %outcome.reason, "candidate rejected");
                    continue;
                }

                let mut record = PartnershipRecord::new(first.as_str(), second.as_str());
                record.announced = extract_date(&result.content);
                record.link = Some(result.url.clone());
                record.raw_content = Some(result.content.clone());

                info!(%pair, url = %result.url, "new partnership");
                known.insert(pair);
                progress.partnership_found(&record);
                found.push(record);
            }
        }
    }

    /// Run a search, logging and swallowing failures.
    pub(crate) async fn search(&self, request: &SearchRequest) -> Vec<SearchResult> {
        match self.source.search(request).await {
            Ok(results) => results,
            Err(e) => {
                warn!(stage = "search", query = %request.query, error = %e, "search failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FnGenerator, FnSource, hit};
    use partnerscout_shared::{Result, ScoutError};

    const ACME_GLOBEX: &str = "On October 23, 2024, Acme announced a strategic AI partnership with \
                               Globex to co-develop machine learning tooling for retailers.";

    /// Generator that answers extraction prompts with `companies` and
    /// validation prompts with `verdict`.
    fn scripted(companies: &'static str, verdict: &'static str) -> FnGenerator {
        FnGenerator::new(move |prompt: &str| -> Result<String> {
            if prompt.starts_with("Extract") {
                Ok(companies.to_string())
            } else if prompt.starts_with("Judge") {
                Ok(verdict.to_string())
            } else {
                Ok("summary".to_string())
            }
        })
    }

    fn pipeline(source: FnSource, generator: FnGenerator) -> EnrichmentPipeline {
        EnrichmentPipeline::new(
            Arc::new(source),
            Arc::new(generator),
            Pacer::unlimited(),
            PipelineOptions::default(),
        )
    }

    #[test]
    fn options_follow_config() {
        let mut config = AppConfig::default();
        config.pipeline.days_back = 7;
        config.search.default_max_results = 0;
        let options = PipelineOptions::from_config(&config);
        assert_eq!(options.time_range, Some(TimeRange::Week));
        assert_eq!(options.link_max_results, 1);
        assert_eq!(options.lookup_max_results, 3);
        assert_eq!(options.depth, SearchDepth::Advanced);
        assert_eq!(options.max_content_chars, config.llm.max_content_chars);
    }

    fn queries(list: &[&str]) -> Vec<String> {
        list.iter().map(|q| q.to_string()).collect()
    }

    #[tokio::test]
    async fn discovers_new_pair_with_date_and_link() {
        let source = FnSource::new(|_| {
            Ok(vec![hit("https://news.example/1", "Acme x Globex", ACME_GLOBEX)])
        });
        let p = pipeline(source, scripted(r#"["Acme Corp", "Globex"]"#, "yes, yes, yes"));

        let mut known = KnownPairs::new();
        let found = p
            .discover(&mut known, &queries(&["q"]), 5, &SilentProgress)
            .await;

        assert_eq!(found.len(), 1);
        let record = &found[0];
        assert_eq!(record.partner1, "Acme");
        assert_eq!(record.partner2, "Globex");
        assert_eq!(record.announced.as_deref(), Some("Oct-24"));
        assert_eq!(record.link.as_deref(), Some("https://news.example/1"));
        assert_eq!(record.raw_content.as_deref(), Some(ACME_GLOBEX));
        assert!(known.contains(&PartnershipPair::new("acme", "globex").unwrap()));
    }

    #[tokio::test]
    async fn never_emits_known_or_repeated_pairs() {
        let source = FnSource::new(|_| {
            Ok(vec![
                hit("https://news.example/1", "one", ACME_GLOBEX),
                hit("https://news.example/2", "two", ACME_GLOBEX),
            ])
        });
        let p = pipeline(
            source,
            scripted(r#"["Acme", "Globex", "Initech"]"#, "yes, yes, yes"),
        );

        let mut known: KnownPairs = [PartnershipPair::new("GLOBEX", " acme").unwrap()]
            .into_iter()
            .collect();
        let found = p
            .discover(&mut known, &queries(&["q1", "q2"]), 5, &SilentProgress)
            .await;

        let pairs: Vec<PartnershipPair> = found.iter().filter_map(|r| r.pair()).collect();
        assert_eq!(
            pairs,
            vec![
                PartnershipPair::new("acme", "initech").unwrap(),
                PartnershipPair::new("globex", "initech").unwrap(),
            ]
        );
        assert_eq!(known.len(), 3);
    }

    #[tokio::test]
    async fn short_content_never_reaches_extraction() {
        let source = FnSource::new(|_| {
            Ok(vec![hit(
                "https://n.example",
                "Acme Globex",
                "Acme partners with Globex.",
            )])
        });
        let generator = Arc::new(scripted(r#"["Acme", "Globex"]"#, "yes, yes, yes"));
        let p = EnrichmentPipeline::new(
            Arc::new(source),
            generator.clone(),
            Pacer::unlimited(),
            PipelineOptions::default(),
        );

        let found = p
            .discover(&mut KnownPairs::new(), &queries(&["q"]), 5, &SilentProgress)
            .await;
        assert!(found.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn short_names_are_skipped() {
        let source = FnSource::new(|_| Ok(vec![hit("https://n.example", "t", ACME_GLOBEX)]));
        let p = pipeline(source, scripted(r#"["AB", "Globex", "Acme"]"#, "yes, yes, yes"));

        let found = p
            .discover(&mut KnownPairs::new(), &queries(&["q"]), 5, &SilentProgress)
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pair(), PartnershipPair::new("acme", "globex"));
    }

    #[tokio::test]
    async fn rejected_candidates_are_dropped() {
        let source = FnSource::new(|_| Ok(vec![hit("https://n.example", "t", ACME_GLOBEX)]));
        let p = pipeline(source, scripted(r#"["Acme", "Globex"]"#, "yes, no, yes"));

        let mut known = KnownPairs::new();
        let found = p
            .discover(&mut known, &queries(&["q"]), 5, &SilentProgress)
            .await;
        assert!(found.is_empty());
        assert!(known.is_empty());
    }

    #[tokio::test]
    async fn search_failure_skips_query() {
        let source = FnSource::new(|request| {
            if request.query == "broken" {
                Err(ScoutError::Provider("HTTP 500".into()))
            } else {
                Ok(vec![hit("https://n.example", "t", ACME_GLOBEX)])
            }
        });
        let p = pipeline(source, scripted(r#"["Acme", "Globex"]"#, "yes, yes, yes"));

        let found = p
            .discover(&mut KnownPairs::new(), &queries(&["broken", "ok"]), 5, &SilentProgress)
            .await;
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn discovery_requests_carry_options() {
        let source = Arc::new(FnSource::empty());
        let options = PipelineOptions {
            time_range: Some(TimeRange::Month),
            depth: SearchDepth::Basic,
            ..Default::default()
        };
        let p = EnrichmentPipeline::new(
            source.clone(),
            Arc::new(FnGenerator::fixed("[]")),
            Pacer::unlimited(),
            options,
        );

        p.discover(&mut KnownPairs::new(), &queries(&["a", "b"]), 7, &SilentProgress)
            .await;

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].query, "a");
        assert_eq!(requests[1].max_results, 7);
        assert_eq!(requests[1].time_range, Some(TimeRange::Month));
        assert_eq!(requests[1].depth, SearchDepth::Basic);
    }
}
