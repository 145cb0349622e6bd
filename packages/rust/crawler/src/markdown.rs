//! HTML-to-Markdown reduction for article pages.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use partnerscout_shared::{Result, ScoutError};

static CONTENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["main", "article", r#"[role="main"]"#, "body"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

static CHROME_SELECTOR: LazyLock<Option<Selector>> = LazyLock::new(|| {
    Selector::parse("nav, header, footer, aside, script, style, noscript, form, .sidebar, .nav")
        .ok()
});

static H1_SELECTOR: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("h1").ok());

/// Convert a full HTML document to `(title, markdown)`.
///
/// The title is the first `<h1>` text, if any.
pub fn html_to_markdown(html: &str) -> Result<(Option<String>, String)> {
    let doc = Html::parse_document(html);

    let title = H1_SELECTOR.as_ref().and_then(|sel| {
        doc.select(sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let content = CONTENT_SELECTORS
        .iter()
        .find_map(|sel| doc.select(sel).next())
        .map(|el| el.inner_html())
        .unwrap_or_else(|| html.to_string());
    let content = strip_chrome(&content);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "nav", "iframe", "noscript", "svg"])
        .build();
    let raw = converter
        .convert(&content)
        .map_err(|e| ScoutError::Conversion(format!("htmd conversion failed: {e}")))?;

    let markdown = clean_blank_lines(raw.trim());
    debug!(len = markdown.len(), "converted to markdown");
    Ok((title, markdown))
}

/// Remove navigation and other page chrome from an HTML fragment.
fn strip_chrome(html: &str) -> String {
    let Some(chrome) = CHROME_SELECTOR.as_ref() else {
        return html.to_string();
    };
    let doc = Html::parse_fragment(html);

    let mut result = html.to_string();
    for el in doc.select(chrome) {
        result = result.replace(&el.html(), "");
    }
    result
}

/// Collapse runs of blank lines to one and end with a newline.
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+").expect("valid regex"));

    let mut out = MULTI_BLANK_RE.replace_all(md, "\n\n").into_owned();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
