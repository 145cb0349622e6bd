//! Single-page fetch helper.
//!
//! Fetches one article URL and returns its main content as Markdown. Not used
//! by the enrichment pipeline itself; the CLI exposes it for inspecting the
//! pages that search results point at.

mod markdown;

use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use partnerscout_shared::{Result, ScoutError};

pub use markdown::html_to_markdown;

const USER_AGENT: &str = concat!("PartnerScout/", env!("CARGO_PKG_VERSION"));

/// A fetched page reduced to Markdown.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub title: Option<String>,
    pub markdown: String,
}

/// HTTP page fetcher.
pub struct PageFetcher {
    client: Client,
    allow_private: bool,
}

impl PageFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScoutError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            allow_private: false,
        })
    }

    /// Allow loopback/private hosts (mock servers in tests).
    #[cfg(test)]
    fn allow_private(mut self) -> Self {
        self.allow_private = true;
        self
    }

    /// Fetch `url` and convert its main content to Markdown.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed = Url::parse(url)
            .map_err(|e| ScoutError::validation(format!("invalid URL {url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScoutError::validation(format!(
                "refusing to fetch non-HTTP URL: {url}"
            )));
        }
        if !self.allow_private && is_private_target(&parsed) {
            return Err(ScoutError::validation(format!(
                "refusing to fetch private address: {url}"
            )));
        }

        let response = self
            .client
            .get(parsed.as_str())
            .send()
            .await
            .map_err(|e| ScoutError::Provider(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::Provider(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScoutError::Provider(format!("{url}: body read failed: {e}")))?;
        debug!(len = body.len(), "page fetched");

        let (title, markdown) = html_to_markdown(&body)?;
        Ok(FetchedPage {
            url: parsed.to_string(),
            title,
            markdown,
        })
    }
}

fn is_private_target(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return true;
    };
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => {
                v4.is_loopback()
                    || v4.is_private()
                    || v4.is_link_local()
                    || v4.is_broadcast()
                    || v4.is_unspecified()
            }
            IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
        };
    }
    host == "localhost" || host.ends_with(".local") || host.ends_with(".internal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE: &str = r#"<html><head><title>ignored</title></head><body>
        <nav><a href="/">Home</a> | <a href="/news">News</a></nav>
        <article>
            <h1>Acme and Globex Announce AI Partnership</h1>
            <p>October 23, 2024 - Acme today announced a strategic partnership with Globex.</p>
            <aside>Related stories</aside>
            <script>trackPageView();</script>
        </article>
        <footer>Copyright Example News</footer>
    </body></html>"#;

    #[tokio::test]
    async fn fetch_returns_article_markdown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(5).unwrap().allow_private();
        let page = fetcher
            .fetch(&format!("{}/story", server.uri()))
            .await
            .unwrap();

        assert_eq!(
            page.title.as_deref(),
            Some("Acme and Globex Announce AI Partnership")
        );
        assert!(page.markdown.contains("# Acme and Globex Announce AI Partnership"));
        assert!(page.markdown.contains("strategic partnership with Globex"));
        assert!(!page.markdown.contains("Related stories"));
        assert!(!page.markdown.contains("trackPageView"));
        assert!(!page.markdown.contains("Copyright"));
    }

    #[tokio::test]
    async fn http_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(5).unwrap().allow_private();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, ScoutError::Provider(_)));
    }

    #[tokio::test]
    async fn refuses_non_http_and_private_targets() {
        let fetcher = PageFetcher::new(5).unwrap();
        for url in [
            "file:///etc/passwd",
            "http://127.0.0.1/",
            "http://localhost:8080/x",
            "not a url",
        ] {
            let err = fetcher.fetch(url).await.unwrap_err();
            assert!(matches!(err, ScoutError::Validation { .. }), "{url}");
        }
    }
}
