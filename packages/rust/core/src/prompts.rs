//! Prompt templates sent to the text generator.
//!
//! Templates embed source text as given; callers bound it with [`clip`] so the
//! instructions around it always reach the model intact.

/// At most `max_chars` characters of `text`.
pub fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Ask for a bare JSON array of company names found in `text`.
pub fn extraction(text: &str) -> String {
    format!(
        "Extract the names of companies involved in a partnership or collaboration from the following text.\n\
         Return ONLY a JSON array of company names, with no additional text or explanation.\n\
         If there are no companies mentioned, return an empty array.\n\
         Clean up company names by removing common suffixes like 'Inc', 'Ltd', 'LLC', 'Corp', 'Corporation'.\n\
         Remove any common prefixes like 'The', 'A', 'An'.\n\
         \n\
         Text:\n\
         {text}\n\
         \n\
         Example format:\n\
         [\"Company1\", \"Company2\"]\n"
    )
}

/// Ask three yes/no questions about a candidate pair, answered in fixed order.
pub fn validation(partner1: &str, partner2: &str, text: &str) -> String {
    format!(
        "Judge whether the following text describes a partnership between two companies.\n\
         Answer three questions:\n\
         1. Does the text describe a valid partnership or collaboration between {partner1} and {partner2}?\n\
         2. Is the partnership related to artificial intelligence or machine learning?\n\
         3. Are both {partner1} and {partner2} real companies?\n\
         \n\
         Respond with exactly three comma-separated answers, each either yes or no, in the order above.\n\
         Example: yes, yes, no\n\
         \n\
         Text:\n\
         {text}\n"
    )
}

/// One-sentence summary of an announcement between two partners.
pub fn summary(partner1: &str, partner2: &str, content: &str) -> String {
    format!(
        "Summarize the following AI partnership announcement between {partner1} and {partner2} in one sentence:\n{content}"
    )
}

/// Benchmark prompt: a fixed instruction followed by the source text.
pub fn benchmark(instruction: &str, content: &str) -> String {
    format!("{instruction}\n{content}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_counts_characters() {
        assert_eq!(clip("short", 100), "short");
        assert_eq!(clip("ééééé", 3), "ééé");
        assert_eq!(clip("abc", 0), "");
    }

    #[test]
    fn clipped_text_keeps_trailing_instructions() {
        let long = "x".repeat(500);
        let prompt = extraction(clip(&long, 20));
        assert!(prompt.contains(&"x".repeat(20)));
        assert!(!prompt.contains(&"x".repeat(21)));
        assert!(prompt.trim_end().ends_with("[\"Company1\", \"Company2\"]"));
    }

    #[test]
    fn prompts_embed_inputs_and_differ() {
        let e = extraction("Acme partners with Globex");
        let v = validation("Acme", "Globex", "Acme partners with Globex");
        let s = summary("Acme", "Globex", "Acme partners with Globex");

        assert!(e.contains("JSON array") && e.contains("Acme partners with Globex"));
        assert!(v.contains("between Acme and Globex") && v.contains("yes, yes, no"));
        assert!(s.starts_with("Summarize") && s.ends_with("Acme partners with Globex"));

        let first_lines: Vec<&str> = [&e, &v, &s].iter().filter_map(|p| p.lines().next()).collect();
        assert_ne!(first_lines[0], first_lines[1]);
        assert_ne!(first_lines[1], first_lines[2]);
    }
}
