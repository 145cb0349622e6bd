//! Company-name extraction via the text generator.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use partnerscout_llm::TextGenerator;
use partnerscout_shared::Result;

use crate::prompts;

static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(Inc\.?|Ltd\.?|LLC|Corp\.?|Corporation)$").expect("valid regex")
});

static PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(The|A|An)\s+").expect("valid regex"));

/// Pulls company-name candidates out of free text.
pub struct EntityExtractor {
    generator: Arc<dyn TextGenerator>,
    max_content_chars: usize,
}

impl EntityExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_content_chars: usize::MAX,
        }
    }

    /// Embed at most `max_chars` characters of the input text in the prompt.
    pub fn with_max_content_chars(mut self, max_chars: usize) -> Self {
        self.max_content_chars = max_chars;
        self
    }

    /// Extract normalized, de-duplicated company names, surfacing generator
    /// failures.
    pub async fn try_extract(&self, text: &str) -> Result<Vec<String>> {
        let prompt = prompts::extraction(prompts::clip(text, self.max_content_chars));
        let response = self.generator.generate(&prompt).await?;
        let names = dedup(
            parse_company_list(&response)
                .iter()
                .filter_map(|raw| normalize_company_name(raw)),
        );
        debug!(count = names.len(), "companies extracted");
        Ok(names)
    }

    /// Like [`try_extract`](Self::try_extract), but a failure yields no names.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub async fn extract(&self, text: &str) -> Vec<String> {
        match self.try_extract(text).await {
            Ok(names) => names,
            Err(e) => {
                warn!(stage = "extract", error = %e, "company extraction failed");
                Vec::new()
            }
        }
    }
}

/// Raw candidate names from a model response.
///
/// The first JSON array in the response is used, preferring one that holds
/// strings (non-string elements are ignored). Parsing starts at each `[` and
/// stops at the matching `]`, so prose after the array does not matter. If no
/// array parses, the whole response is split on commas instead.
pub fn parse_company_list(response: &str) -> Vec<String> {
    if let Some(items) = first_json_array(response) {
        return items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect();
    }
    debug!("no JSON array in response, splitting on commas");

    response
        .split(',')
        .map(|token| token.trim().trim_matches(|c| c == '[' || c == ']').trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn first_json_array(response: &str) -> Option<Vec<Value>> {
    let mut arrays = response.match_indices('[').filter_map(|(start, _)| {
        serde_json::Deserializer::from_str(&response[start..])
            .into_iter::<Vec<Value>>()
            .next()
            .and_then(|parsed| parsed.ok())
    });
    let has_strings = |items: &Vec<Value>| items.iter().any(Value::is_string);

    let first = arrays.next()?;
    if has_strings(&first) {
        return Some(first);
    }
    Some(arrays.find(has_strings).unwrap_or(first))
}

/// Strip quotes, corporate suffixes and leading articles. `None` if nothing
/// is left.
pub fn normalize_company_name(raw: &str) -> Option<String> {
    let name = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    let name = SUFFIX_RE.replace(name, "");
    let name = PREFIX_RE.replace(&name, "");
    let name = name.trim().trim_end_matches(',').trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Case-insensitive dedup, keeping the first spelling seen.
fn dedup(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FnGenerator;
    use partnerscout_shared::ScoutError;

    #[test]
    fn normalizes_suffixes_and_articles() {
        assert_eq!(normalize_company_name("Acme Corp").as_deref(), Some("Acme"));
        assert_eq!(normalize_company_name("The Widget Inc.").as_deref(), Some("Widget"));
        assert_eq!(normalize_company_name("Globex Corporation").as_deref(), Some("Globex"));
        assert_eq!(normalize_company_name("\"Initech LLC\"").as_deref(), Some("Initech"));
        assert_eq!(normalize_company_name("an Hooli ltd").as_deref(), Some("Hooli"));
        assert_eq!(normalize_company_name("Umbrella, Inc.").as_deref(), Some("Umbrella"));
        assert_eq!(normalize_company_name("  '' "), None);
    }

    #[test]
    fn keeps_names_that_only_contain_suffix_words() {
        assert_eq!(normalize_company_name("Incite").as_deref(), Some("Incite"));
        assert_eq!(normalize_company_name("Theranos").as_deref(), Some("Theranos"));
    }

    #[test]
    fn parses_json_array_inside_prose() {
        let response = "Sure! Here you go:\n[\"Acme Corp\",\n \"The Widget Inc.\", 42]\nDone.";
        assert_eq!(
            parse_company_list(response),
            vec!["Acme Corp".to_string(), "The Widget Inc.".to_string()]
        );
    }

    #[test]
    fn ignores_bracketed_prose_after_array() {
        let response = "[\"Acme\", \"Globex\"]\nNote: suffixes like [Inc] were removed.";
        assert_eq!(parse_company_list(response), vec!["Acme", "Globex"]);
    }

    #[test]
    fn skips_leading_bracketed_text() {
        let response = "Answer [1]: [\"Acme Corp\", \"Globex\"]";
        assert_eq!(parse_company_list(response), vec!["Acme Corp", "Globex"]);
        assert!(parse_company_list("Nothing found: []").is_empty());
    }

    #[test]
    fn falls_back_to_comma_split() {
        assert_eq!(
            parse_company_list("Acme, Globex ,  Initech"),
            vec!["Acme", "Globex", "Initech"]
        );
        assert_eq!(
            parse_company_list("[\"Acme\", \"Globex\""),
            vec!["\"Acme\"", "\"Globex\""]
        );
        assert_eq!(parse_company_list("[Acme, Globex]"), vec!["Acme", "Globex"]);
    }

    #[tokio::test]
    async fn extract_normalizes_and_dedups() {
        let generator = Arc::new(FnGenerator::fixed(
            r#"["Acme Corp", "The Widget Inc.", "acme", "Widget"]"#,
        ));
        let extractor = EntityExtractor::new(generator.clone());

        let names = extractor.extract("Acme and Widget announce a partnership").await;
        assert_eq!(names, vec!["Acme", "Widget"]);
        assert_eq!(generator.calls(), 1);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("Acme and Widget announce a partnership"));
    }

    #[tokio::test]
    async fn extract_swallows_generator_failure() {
        let generator = Arc::new(FnGenerator::new(|_| {
            Err(ScoutError::Provider("connection refused".into()))
        }));
        let extractor = EntityExtractor::new(generator);

        assert!(extractor.extract("anything").await.is_empty());
        assert!(extractor.try_extract("anything").await.is_err());
    }

    #[tokio::test]
    async fn long_input_is_clipped_in_prompt() {
        let generator = Arc::new(FnGenerator::fixed("[]"));
        let extractor = EntityExtractor::new(generator.clone()).with_max_content_chars(10);

        extractor.extract(&"y".repeat(100)).await;
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains(&"y".repeat(10)));
        assert!(!prompts[0].contains(&"y".repeat(11)));
        assert!(prompts[0].contains("Example format"));
    }

    #[tokio::test]
    async fn empty_array_yields_nothing() {
        let extractor = EntityExtractor::new(Arc::new(FnGenerator::fixed("[]")));
        assert!(extractor.extract("no companies here").await.is_empty());
    }
}
