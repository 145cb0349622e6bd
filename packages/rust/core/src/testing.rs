//! Closure-backed fakes for the search and generation boundaries.

use std::sync::Mutex;

use async_trait::async_trait;

use partnerscout_llm::TextGenerator;
use partnerscout_search::ResultSource;
use partnerscout_shared::{Result, SearchRequest, SearchResult};

/// Generator answering each prompt with a closure; records every prompt.
pub(crate) struct FnGenerator {
    respond: Box<dyn Fn(&str) -> Result<String> + Send + Sync>,
    pub prompts: Mutex<Vec<String>>,
}

impl FnGenerator {
    pub fn new(respond: impl Fn(&str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`.
    pub fn fixed(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for FnGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt)
    }

    fn model(&self) -> &str {
        "fake"
    }
}

/// Search source answering each request with a closure; records every request.
pub(crate) struct FnSource {
    respond: Box<dyn Fn(&SearchRequest) -> Result<Vec<SearchResult>> + Send + Sync>,
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl FnSource {
    pub fn new(
        respond: impl Fn(&SearchRequest) -> Result<Vec<SearchResult>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(|_| Ok(Vec::new()))
    }

    pub fn queries(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.query.clone())
            .collect()
    }
}

#[async_trait]
impl ResultSource for FnSource {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)(request)
    }
}

/// A search hit with the given URL, title and content.
pub(crate) fn hit(url: &str, title: &str, content: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        url: url.to_string(),
        content: content.to_string(),
        score: 0.9,
        published_date: None,
    }
}
