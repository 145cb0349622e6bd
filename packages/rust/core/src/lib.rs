//! Partnership enrichment for PartnerScout.
//!
//! Ties the search and generation backends together into the two pipeline
//! modes: discovering new partnerships ([`EnrichmentPipeline::discover`]) and
//! filling gaps in existing records ([`EnrichmentPipeline::fill_gaps`]).

pub mod benchmark;
pub mod dates;
pub mod extractor;
pub mod gaps;
pub mod pacing;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod validator;

#[cfg(test)]
mod testing;

pub use benchmark::{BenchmarkReport, ModelRun, ModelStats, run_benchmark};
pub use dates::extract_date;
pub use extractor::EntityExtractor;
pub use gaps::{GapFillSummary, LookupResult, is_valid_link};
pub use pacing::Pacer;
pub use pipeline::{EnrichmentPipeline, PipelineOptions, ProgressReporter, SilentProgress};
pub use retry::{RetryPolicy, RetryingGenerator, RetryingSource};
pub use validator::{PartnershipValidator, ValidationOutcome};
