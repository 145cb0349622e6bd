//! Three-question partnership judge.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use partnerscout_llm::TextGenerator;
use partnerscout_shared::{Result, ScoutError, ValidationVerdict};

use crate::prompts;

/// Reason given when the model does not answer with exactly three tokens.
pub const INVALID_FORMAT: &str = "invalid response format";

/// Accept/reject decision for one candidate pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub accepted: bool,
    pub reason: String,
    /// Parsed answers, when the model produced any.
    pub verdict: Option<ValidationVerdict>,
}

pub struct PartnershipValidator {
    generator: Arc<dyn TextGenerator>,
    max_content_chars: usize,
}

impl PartnershipValidator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_content_chars: usize::MAX,
        }
    }

    /// Embed at most `max_chars` characters of supporting text in the prompt.
    pub fn with_max_content_chars(mut self, max_chars: usize) -> Self {
        self.max_content_chars = max_chars;
        self
    }

    /// Ask the model and parse its three answers.
    pub async fn judge(
        &self,
        partner1: &str,
        partner2: &str,
        supporting_text: &str,
    ) -> Result<ValidationVerdict> {
        let text = prompts::clip(supporting_text, self.max_content_chars);
        let prompt = prompts::validation(partner1, partner2, text);
        let response = self.generator.generate(&prompt).await?;
        parse_verdict(&response)
    }

    /// Judge a pair; every failure becomes a rejection carrying its cause.
    #[instrument(skip(self, supporting_text))]
    pub async fn validate(
        &self,
        partner1: &str,
        partner2: &str,
        supporting_text: &str,
    ) -> ValidationOutcome {
        match self.judge(partner1, partner2, supporting_text).await {
            Ok(verdict) => {
                debug!(reason = %verdict.reason(), "validation verdict");
                ValidationOutcome {
                    accepted: verdict.accepted(),
                    reason: verdict.reason(),
                    verdict: Some(verdict),
                }
            }
            Err(ScoutError::Parse { message }) => ValidationOutcome {
                accepted: false,
                reason: message,
                verdict: None,
            },
            Err(e) => {
                warn!(stage = "validate", error = %e, "validation call failed");
                ValidationOutcome {
                    accepted: false,
                    reason: e.to_string(),
                    verdict: None,
                }
            }
        }
    }
}

/// Parse `"yes, no, yes"` style answers. Only an exact `yes` counts as true.
pub fn parse_verdict(response: &str) -> Result<ValidationVerdict> {
    let normalized = response.trim().to_lowercase();
    let answers: Vec<bool> = normalized.split(',').map(|t| t.trim() == "yes").collect();

    match answers.as_slice() {
        &[is_partnership, is_ai_related, are_real_companies] => Ok(ValidationVerdict {
            is_partnership,
            is_ai_related,
            are_real_companies,
        }),
        _ => Err(ScoutError::parse(INVALID_FORMAT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FnGenerator;

    fn validator(answer: &str) -> PartnershipValidator {
        PartnershipValidator::new(Arc::new(FnGenerator::fixed(answer)))
    }

    #[tokio::test]
    async fn three_yes_passes() {
        let outcome = validator("Yes, yes , YES\n").validate("Acme", "Globex", "text").await;
        assert!(outcome.accepted);
        assert_eq!(outcome.reason, "passed");
    }

    #[tokio::test]
    async fn wrong_token_count_is_format_error() {
        let outcome = validator("yes, yes").validate("Acme", "Globex", "text").await;
        assert!(!outcome.accepted);
        assert_eq!(outcome.reason, INVALID_FORMAT);
        assert!(outcome.verdict.is_none());

        let outcome = validator("yes, yes, yes, yes").validate("Acme", "Globex", "text").await;
        assert_eq!(outcome.reason, INVALID_FORMAT);
    }

    #[tokio::test]
    async fn single_failed_check_is_named() {
        let outcome = validator("yes,no,yes").validate("Acme", "Globex", "text").await;
        assert!(!outcome.accepted);
        assert_eq!(outcome.reason, "not AI-related");
    }

    #[tokio::test]
    async fn non_yes_tokens_are_false() {
        let outcome = validator("yes, yes., y").validate("Acme", "Globex", "text").await;
        assert!(!outcome.accepted);
        assert_eq!(
            outcome.reason,
            "not AI-related, companies not verified as real"
        );
    }

    #[tokio::test]
    async fn provider_failure_is_rejection() {
        let validator = PartnershipValidator::new(Arc::new(FnGenerator::new(|_| {
            Err(ScoutError::Provider("timeout".into()))
        })));
        let outcome = validator.validate("Acme", "Globex", "text").await;
        assert!(!outcome.accepted);
        assert!(outcome.reason.contains("timeout"));
    }

    #[tokio::test]
    async fn prompt_names_both_partners() {
        let generator = Arc::new(FnGenerator::fixed("yes, yes, yes"));
        let validator = PartnershipValidator::new(generator.clone());
        validator.validate("Acme", "Globex", "supporting text").await;

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("Acme and Globex"));
        assert!(prompts[0].contains("supporting text"));
    }
}
