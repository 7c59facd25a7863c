//! Text measurement utilities shared by the engine.

/// Count whitespace-separated words in a text.
///
/// # Examples
///
/// ```
/// use vasari_core::word_count;
///
/// assert_eq!(word_count("the rain in Spain"), 4);
/// assert_eq!(word_count("  \n "), 0);
/// ```
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Return the trailing `max_chars` characters of a text.
///
/// Operates on characters rather than bytes, so multibyte text is never
/// split inside a code point.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    let mut count = 0usize;
    for (idx, _) in text.char_indices().rev() {
        count += 1;
        if count == max_chars {
            return &text[idx..];
        }
    }
    text
}

/// Truncate a text to at most `max_words` words on sentence boundaries.
///
/// Whole sentences are appended until the word cap would be exceeded; the
/// text is never cut mid-sentence. Used as the deterministic fallback when
/// a rolling summary overruns its cap and condensation fails.
///
/// # Examples
///
/// ```
/// use vasari_core::truncate_sentences;
///
/// let text = "One two three. Four five. Six seven eight nine.";
/// assert_eq!(truncate_sentences(text, 5), "One two three. Four five.");
/// ```
pub fn truncate_sentences(text: &str, max_words: usize) -> String {
    let mut out = String::new();
    let mut words = 0usize;
    for sentence in split_sentences(text) {
        let sentence_words = word_count(sentence);
        if words + sentence_words > max_words {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(sentence.trim());
        words += sentence_words;
    }
    out
}

/// Split text into sentences, keeping the terminating punctuation.
///
/// A sentence ends at `.`, `!`, `?` or `…` followed by whitespace or the
/// end of input. Trailing prose without a terminator counts as a final
/// sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut prev_was_terminator = false;
    for (idx, ch) in text.char_indices() {
        if prev_was_terminator && ch.is_whitespace() {
            let slice = text[start..idx].trim();
            if !slice.is_empty() {
                sentences.push(slice);
            }
            start = idx;
        }
        prev_was_terminator = matches!(ch, '.' | '!' | '?' | '…');
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_respects_char_boundaries() {
        assert_eq!(tail_chars("héllo", 3), "llo");
        assert_eq!(tail_chars("ab", 10), "ab");
        assert_eq!(tail_chars("abc", 0), "");
    }

    #[test]
    fn truncation_never_cuts_mid_sentence() {
        let text = "Alpha beta gamma. Delta epsilon zeta eta theta.";
        assert_eq!(truncate_sentences(text, 4), "Alpha beta gamma.");
        assert_eq!(truncate_sentences(text, 2), "");
    }

    #[test]
    fn truncation_keeps_everything_under_cap() {
        let text = "One. Two three.";
        assert_eq!(truncate_sentences(text, 50), "One. Two three.");
    }

    #[test]
    fn splits_on_multiple_terminators() {
        let got = split_sentences("Really? Yes! Fine.");
        assert_eq!(got, vec!["Really?", "Yes!", "Fine."]);
    }
}
