use std::fmt;

use crate::shared::validation::ValidationError;

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?'];

/// One sentence of narration, trimmed and free of terminal punctuation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sentence(String);

impl Sentence {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty {
                field: "sentence",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prepares generated narration for splitting.
///
/// Removes delivery markers such as `[SERIOUS]` or `[CALL_TO_ACTION]` that the
/// story generator embeds for the voice, then collapses all whitespace runs to
/// single spaces.
pub fn normalize_narration(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(close) if is_marker(&after[..close]) => {
                stripped.push_str(&rest[..open]);
                stripped.push(' ');
                rest = &after[close + 1..];
            }
            _ => {
                stripped.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }
    stripped.push_str(rest);

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_marker(inner: &str) -> bool {
    !inner.is_empty()
        && inner
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == '_')
}

/// Splits normalized narration on `.`, `!` and `?`, keeping source order.
///
/// Pieces that are empty after trimming are dropped, so runs like `?!` or
/// `...` never produce blank sentences.
pub fn split_sentences(text: &str) -> Vec<Sentence> {
    text.split(SENTENCE_TERMINATORS)
        .filter_map(|piece| Sentence::new(piece).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(sentences: &[Sentence]) -> Vec<&str> {
        sentences.iter().map(Sentence::as_str).collect()
    }

    #[test]
    fn test_sentence_rejects_blank() {
        assert!(Sentence::new("   ").is_err());
    }

    #[test]
    fn test_sentence_trims() {
        assert_eq!(Sentence::new("  hi there ").unwrap().as_str(), "hi there");
    }

    #[test]
    fn test_split_on_all_terminators() {
        let sentences = split_sentences("Hello world. This is great! Are you sure?");
        assert_eq!(
            texts(&sentences),
            vec!["Hello world", "This is great", "Are you sure"]
        );
    }

    #[test]
    fn test_split_drops_empty_pieces() {
        let sentences = split_sentences("Wait... what?! Really.");
        assert_eq!(texts(&sentences), vec!["Wait", "what", "Really"]);
    }

    #[test]
    fn test_split_keeps_trailing_fragment() {
        let sentences = split_sentences("First. second without stop");
        assert_eq!(texts(&sentences), vec!["First", "second without stop"]);
    }

    #[test]
    fn test_split_no_terminal_punctuation_survives() {
        for s in split_sentences("Ναι! Σοβαρά; Τέλειο. Όχι?") {
            assert!(!s.as_str().contains(SENTENCE_TERMINATORS));
        }
    }

    #[test]
    fn test_split_empty_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences(" . ! ? ").is_empty());
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_narration("a  b\n\n c\t d "), "a b c d");
    }

    #[test]
    fn test_normalize_strips_markers() {
        let text = "[SERIOUS] Big news today. [CALL_TO_ACTION]Follow for more!";
        assert_eq!(
            normalize_narration(text),
            "Big news today. Follow for more!"
        );
    }

    #[test]
    fn test_normalize_keeps_non_marker_brackets() {
        assert_eq!(
            normalize_narration("See [note 1] and [x]. [EMPHASIS] ok"),
            "See [note 1] and [x]. ok"
        );
    }

    #[test]
    fn test_normalize_unclosed_bracket() {
        assert_eq!(normalize_narration("odd [SERIOUS text"), "odd [SERIOUS text");
    }
}
