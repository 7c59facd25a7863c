//! Refusal detection and salvage.
//!
//! A "refusal" is model output declining to produce the requested content
//! instead of the content itself. Detection is heuristic: a fixed library
//! of declarative pattern rules is tested against the head of the text, and
//! a refusal verdict requires two or more independent rules to match — a
//! single apology inside character dialogue must not trip the classifier.
//!
//! The rule set lives behind the narrow [`RefusalClassifier`] interface so
//! it can be extended or swapped without touching pipeline logic.

use std::sync::LazyLock;

use regex::Regex;

/// How many leading characters of a text the classifier inspects.
const HEAD_CHARS: usize = 500;

/// One declarative refusal-indicator rule.
struct RefusalRule {
    name: &'static str,
    pattern: Regex,
}

impl RefusalRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("static refusal pattern compiles"),
        }
    }
}

static RULES: LazyLock<Vec<RefusalRule>> = LazyLock::new(|| {
    vec![
        RefusalRule::new(
            "apology",
            r"(?i)\b(i'm sorry|i am sorry|i apologize|i apologise|my apologies)\b",
        ),
        RefusalRule::new(
            "cannot_produce",
            r"(?i)\b(?:i\s+)?(?:can(?:'t|not)|won't|am unable to|i'm unable to)\s+(?:produce|write|generate|create|provide|complete|fulfill|continue)\b",
        ),
        RefusalRule::new(
            "full_work_disclaimer",
            r"(?i)\b(?:a\s+)?(?:full|complete|entire)(?:-length)?\s+(?:novel|book|chapter|story|text|document|manuscript)\b.{0,80}\bin (?:a|one) (?:single\s+)?(?:response|reply|message)\b",
        ),
        RefusalRule::new(
            "length_limit",
            r"(?i)\bdue to (?:output|length|token|response|size)\s+(?:limit|constraint|restriction)s?\b|\b(?:output|token|length)\s+limit(?:ation)?s?\s+(?:prevent|of this)\b",
        ),
        RefusalRule::new(
            "option_offer",
            r"(?i)\b(?:would you like(?: me)? to|i can offer|i could offer|here are (?:a few|some|several) (?:options|alternatives|approaches)|shall i)\b",
        ),
        RefusalRule::new(
            "instead_offer",
            r"(?i)\binstead,?\s+i\s+(?:can|could|will|'ll)\b|\bi\s+(?:can|could)\s+instead\b",
        ),
        RefusalRule::new("as_an_ai", r"(?i)\bas an ai(?:\s+(?:language\s+)?model)?\b"),
        RefusalRule::new(
            "numbered_alternatives",
            r"(?im)^\s*(?:option\s+[1-9]|[1-9][.)]\s+(?:an?\s+)?(?:shorter|condensed|summary|summariz|outline|alternative|abridged|partial))",
        ),
    ]
});

/// The classifier verdict for one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Whether the text reads as a refusal.
    pub is_refusal: bool,
    /// Usable prose extracted from the text.
    ///
    /// Equal to the full input when the text is not a refusal, or when no
    /// clean paragraph could be found — callers must apply their own length
    /// thresholds before trusting the latter case.
    pub salvaged: String,
}

/// Pattern-based refusal detector.
///
/// Never errors: the worst case for every operation is returning the input
/// unchanged.
///
/// # Examples
///
/// ```
/// use vasari_engine::RefusalClassifier;
///
/// let classifier = RefusalClassifier::new();
/// let verdict = classifier.classify("The rain had not stopped for three days.");
/// assert!(!verdict.is_refusal);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RefusalClassifier;

impl RefusalClassifier {
    /// Create a classifier over the built-in rule library.
    pub fn new() -> Self {
        Self
    }

    /// Classify a text and extract salvageable prose.
    ///
    /// The leading [`HEAD_CHARS`] characters are tested against the rule
    /// library after quote normalization; two or more independent rule
    /// matches classify the text as a refusal. For refusals, salvage is the
    /// first paragraph onward that matches zero rules and is not a
    /// structural artifact.
    pub fn classify(&self, text: &str) -> Classification {
        let normalized = normalize_quotes(text);
        let head: String = normalized.chars().take(HEAD_CHARS).collect();
        let matched = matching_rules(&head);
        if matched.len() < 2 {
            return Classification {
                is_refusal: false,
                salvaged: text.to_string(),
            };
        }
        tracing::debug!(rules = ?matched, "Classified text as refusal");

        let paragraphs: Vec<&str> = text.split("\n\n").collect();
        for (index, paragraph) in paragraphs.iter().enumerate() {
            if paragraph.trim().is_empty() {
                continue;
            }
            let clean = matching_rules(&normalize_quotes(paragraph)).is_empty()
                && !is_structural_artifact(paragraph);
            if clean {
                return Classification {
                    is_refusal: true,
                    salvaged: paragraphs[index..].join("\n\n"),
                };
            }
        }
        Classification {
            is_refusal: true,
            salvaged: text.to_string(),
        }
    }

    /// Remove refusal blocks anywhere in a text.
    ///
    /// Unlike [`classify`](Self::classify), every paragraph is scanned, not
    /// just the head; this catches refusal blocks injected mid-document by
    /// an expansion step after otherwise valid content. A paragraph is
    /// dropped when it matches two or more rules or structurally resembles
    /// an alternative-options list. All other paragraphs and the blank-line
    /// spacing between them are preserved, which makes the operation
    /// idempotent.
    pub fn scrub(&self, text: &str) -> String {
        let kept: Vec<&str> = text
            .split("\n\n")
            .filter(|paragraph| {
                let normalized = normalize_quotes(paragraph);
                let refusal_block = matching_rules(&normalized).len() >= 2;
                if refusal_block || is_option_list(paragraph) {
                    tracing::debug!(
                        words = paragraph.split_whitespace().count(),
                        "Scrubbing refusal paragraph"
                    );
                    false
                } else {
                    true
                }
            })
            .collect();
        kept.join("\n\n")
    }
}

/// Names of rules matching the text, each counted at most once.
fn matching_rules(text: &str) -> Vec<&'static str> {
    RULES
        .iter()
        .filter(|rule| rule.pattern.is_match(text))
        .map(|rule| rule.name)
        .collect()
}

/// Fold typographic quote variants down to their ASCII forms.
fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2039}' | '\u{203A}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{00AB}' | '\u{00BB}' => '"',
            other => other,
        })
        .collect()
}

/// Paragraphs that are list scaffolding rather than prose.
fn is_structural_artifact(paragraph: &str) -> bool {
    let trimmed = paragraph.trim();
    if trimmed.is_empty() {
        return true;
    }
    // Numbered option: "1. ...", "2) ...", "3: ..."
    let mut chars = trimmed.chars();
    if let Some(first) = chars.next() {
        if first.is_ascii_digit() && matches!(chars.next(), Some('.') | Some(')') | Some(':')) {
            return true;
        }
    }
    // Horizontal rule
    if trimmed.len() >= 3
        && trimmed
            .chars()
            .all(|c| c == '-' || c == '*' || c == '_' || c == ' ')
    {
        return true;
    }
    // Markdown header or bolded label naming an option
    let lower = trimmed.to_lowercase();
    (lower.starts_with('#') || lower.starts_with("**")) && lower.contains("option")
}

/// Whether a paragraph reads as a numbered "alternative options" list.
fn is_option_list(paragraph: &str) -> bool {
    let lower = paragraph.to_lowercase();
    let numbered_lines = paragraph
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            let mut chars = trimmed.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_digit())
                && matches!(chars.next(), Some('.') | Some(')') | Some(':'))
        })
        .count();
    let option_flavored = ["option", "alternative", "instead", "shorter", "condensed", "outline"]
        .iter()
        .any(|kw| lower.contains(kw));
    numbered_lines >= 2 && option_flavored
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFUSAL: &str = "I'm sorry, but I cannot produce a complete novel in a single response due to output limits.\n\nWould you like me to:\n1. An outline of the story\n2. A condensed version\n\nThe storm broke over the harbor at dusk, and Mara watched the boats scatter.";

    #[test]
    fn single_pattern_is_not_a_refusal() {
        let classifier = RefusalClassifier::new();
        let text = "\u{201C}I'm sorry,\u{201D} she whispered, and turned back to the sea.";
        let verdict = classifier.classify(text);
        assert!(!verdict.is_refusal);
        assert_eq!(verdict.salvaged, text);
    }

    #[test]
    fn two_patterns_classify_as_refusal() {
        let classifier = RefusalClassifier::new();
        assert!(classifier.classify(REFUSAL).is_refusal);
    }

    #[test]
    fn salvage_skips_refusal_and_structural_paragraphs() {
        let classifier = RefusalClassifier::new();
        let verdict = classifier.classify(REFUSAL);
        assert!(verdict.is_refusal);
        assert!(verdict.salvaged.starts_with("The storm broke over the harbor"));
    }

    #[test]
    fn salvage_falls_back_to_original_when_nothing_is_clean() {
        let classifier = RefusalClassifier::new();
        let text = "I'm sorry, but as an AI I cannot write this.";
        let verdict = classifier.classify(text);
        assert!(verdict.is_refusal);
        assert_eq!(verdict.salvaged, text);
    }

    #[test]
    fn refusal_patterns_deep_in_a_text_do_not_flip_classify() {
        let classifier = RefusalClassifier::new();
        let mut text = "The first light crept across the valley floor. ".repeat(20);
        text.push_str("I'm sorry, I cannot continue. As an AI I have limits.");
        assert!(!classifier.classify(&text).is_refusal);
    }

    #[test]
    fn scrub_removes_mid_text_refusal_blocks() {
        let classifier = RefusalClassifier::new();
        let text = "The caravan reached the ridge by noon.\n\nI'm sorry, but I cannot continue this scene as an AI model.\n\nBelow, the valley opened into farmland.";
        let scrubbed = classifier.scrub(text);
        assert_eq!(
            scrubbed,
            "The caravan reached the ridge by noon.\n\nBelow, the valley opened into farmland."
        );
    }

    #[test]
    fn scrub_removes_option_lists() {
        let classifier = RefusalClassifier::new();
        let text = "The chapter ended quietly.\n\n1. A shorter version\n2. An outline instead\n3. A summary";
        assert_eq!(classifier.scrub(text), "The chapter ended quietly.");
    }

    #[test]
    fn scrub_is_idempotent() {
        let classifier = RefusalClassifier::new();
        let once = classifier.scrub(REFUSAL);
        assert_eq!(classifier.scrub(&once), once);
    }

    #[test]
    fn scrub_preserves_clean_text_and_spacing() {
        let classifier = RefusalClassifier::new();
        let text = "First paragraph.\n\n\n\nSecond paragraph.";
        assert_eq!(classifier.scrub(text), text);
    }

    #[test]
    fn quotes_normalize_before_matching() {
        let classifier = RefusalClassifier::new();
        let text = "I\u{2019}m sorry, but I can\u{2019}t write that. Would you like me to outline it instead?";
        assert!(classifier.classify(text).is_refusal);
    }
}
