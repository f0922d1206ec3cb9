//! Answer extraction for competition-math solutions

use once_cell::sync::Lazy;
use regex::Regex;

static BOXED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\boxed\{((?:[^{}]|\{[^{}]*\})*)\}").expect("boxed pattern is valid")
});

/// Content of the last `\boxed{...}` in the text (one level of nested braces)
pub fn last_boxed(text: &str) -> Option<String> {
    BOXED
        .captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Extract the candidate answer: the last boxed expression, or else the last
/// sentence of the text.
pub fn extract_model_answer(text: &str) -> String {
    last_boxed(text).unwrap_or_else(|| last_sentence(text))
}

/// Last non-empty sentence.
///
/// Sentences end at `.`, `!` or `?` followed by whitespace, unless the mark
/// directly follows a digit (so `3.5` and `42. ` do not split).
pub fn last_sentence(text: &str) -> String {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (idx, c) = chars[i];
        let after_digit = i > 0 && chars[i - 1].1.is_ascii_digit();
        let before_space = chars.get(i + 1).is_some_and(|(_, next)| next.is_whitespace());

        if matches!(c, '.' | '!' | '?') && !after_digit && before_space {
            sentences.push(&text[start..idx]);
            let mut j = i + 1;
            while j < chars.len() && chars[j].1.is_whitespace() {
                j += 1;
            }
            start = chars.get(j).map(|(pos, _)| *pos).unwrap_or(text.len());
            i = j;
            continue;
        }
        i += 1;
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or("")
        .to_string()
}
