//! Tavily search API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use partnerscout_shared::{Result, ScoutError, SearchRequest, SearchResult};

use crate::ResultSource;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("PartnerScout/", env!("CARGO_PKG_VERSION"));

/// Tavily search client.
pub struct TavilyClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

/// Request body for `POST /search`.
#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_range: Option<&'static str>,
}

/// Response body from `POST /search`.
#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

impl TavilyClient {
    /// Create a client for `endpoint` (e.g. `https://api.tavily.com`).
    pub fn new(endpoint: &str, api_key: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScoutError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl ResultSource for TavilyClient {
    #[instrument(skip_all, fields(query = %request.query, max_results = request.max_results))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let query = request.query.trim().trim_matches('"');
        let body = TavilyRequest {
            query,
            max_results: request.max_results,
            search_depth: request.depth.as_str(),
            time_range: request.time_range.map(|t| t.as_str()),
        };

        let url = format!("{}/search", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScoutError::Provider(format!("tavily: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(ScoutError::Provider(format!("tavily: HTTP {status}: {snippet}")));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| ScoutError::parse(format!("tavily response: {e}")))?;

        debug!(count = parsed.results.len(), "search returned");
        Ok(parsed.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partnerscout_shared::{SearchDepth, TimeRange};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TavilyClient {
        TavilyClient::new(&server.uri(), "tvly-test".into(), 5).unwrap()
    }

    #[tokio::test]
    async fn search_maps_results() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("authorization", "Bearer tvly-test"))
            .and(body_partial_json(serde_json::json!({
                "query": "Acme Globex AI partnership announcement",
                "max_results": 3,
                "search_depth": "advanced",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": "Acme Globex AI partnership announcement",
                "results": [
                    {
                        "title": "Acme and Globex partner on AI",
                        "url": "https://news.example.com/acme-globex",
                        "content": "Acme announced a partnership with Globex.",
                        "score": 0.92,
                        "published_date": "2024-10-23"
                    },
                    {
                        "title": "Other",
                        "url": "https://news.example.com/other",
                        "content": "Unrelated.",
                        "score": 0.11
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = SearchRequest::new("\"Acme Globex AI partnership announcement\"", 3);
        let results = client_for(&server).search(&request).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://news.example.com/acme-globex");
        assert_eq!(results[0].published_date.as_deref(), Some("2024-10-23"));
        assert!(results[1].published_date.is_none());
    }

    #[tokio::test]
    async fn search_sends_depth_and_time_range() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_partial_json(serde_json::json!({
                "search_depth": "basic",
                "time_range": "month",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = SearchRequest::new("anything", 5)
            .depth(SearchDepth::Basic)
            .time_range(Some(TimeRange::Month));
        let results = client_for(&server).search(&request).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn http_error_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .search(&SearchRequest::new("q", 1))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn garbage_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .search(&SearchRequest::new("q", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::Parse { .. }));
    }
}
