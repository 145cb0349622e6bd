//! Shared types, error model, and configuration for PartnerScout.
//!
//! This crate is the foundation depended on by all other PartnerScout crates.
//! It provides:
//! - [`ScoutError`] — the unified error type
//! - Domain types ([`PartnershipPair`], [`PartnershipRecord`], [`KnownPairs`], [`SearchResult`])
//! - Configuration ([`AppConfig`], config loading, secret resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BenchmarkConfig, LlmConfig, PipelineConfig, SearchConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_secret,
};
pub use error::{Result, ScoutError};
pub use types::{
    KnownPairs, PartnershipPair, PartnershipRecord, SearchDepth, SearchRequest, SearchResult,
    TimeRange, ValidationVerdict,
};
