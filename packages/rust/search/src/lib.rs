//! Web-search backends.
//!
//! The pipeline only sees the [`ResultSource`] trait: a query goes in, a ranked
//! list of [`SearchResult`]s comes out. [`TavilyClient`] is the production
//! backend.

mod tavily;

use async_trait::async_trait;
use partnerscout_shared::{Result, SearchRequest, SearchResult};

pub use tavily::TavilyClient;

/// A web-search provider.
///
/// Failures are returned, not swallowed; callers decide whether a failed search
/// means "no results" (the pipeline does) or aborts.
#[async_trait]
pub trait ResultSource: Send + Sync {
    /// Run one query and return results in provider rank order.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>>;
}

#[async_trait]
impl<T: ResultSource + ?Sized> ResultSource for Box<T> {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        (**self).search(request).await
    }
}
