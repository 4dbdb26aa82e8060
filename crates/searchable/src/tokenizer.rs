//! Search string tokenization.

use std::sync::LazyLock;

use regex::Regex;

/// A double-quoted phrase, or a run of non-whitespace.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)"|(\S+)"#).expect("token pattern is valid"));

/// Tokens extracted from one search string.
///
/// Built once per compilation and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    words: Vec<String>,
    ordered_words: Vec<String>,
}

impl TokenSet {
    /// Tokenizes `search`, keeping at most `max_words` tokens.
    ///
    /// Returns `None` when the normalized string yields no tokens, which the
    /// caller treats as a pass-through search.
    ///
    /// Input that contains only digits once punctuation and whitespace are
    /// removed becomes a single digit token, so `(555) 123-4567` searches for
    /// `5551234567`.
    pub fn parse(search: &str, max_words: usize) -> Option<TokenSet> {
        let normalized = search.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let stripped: String = normalized
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();

        let mut words: Vec<String> =
            if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
                vec![stripped]
            } else {
                TOKEN_PATTERN
                    .captures_iter(&normalized)
                    .filter_map(|caps| {
                        if let Some(phrase) = caps.get(1) {
                            Some(phrase.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
                        } else {
                            caps.get(2).map(|m| m.as_str().trim_matches('"').to_string())
                        }
                    })
                    .filter(|w| !w.is_empty())
                    .collect()
            };

        words.truncate(max_words);
        if words.is_empty() {
            return None;
        }

        let mut ordered_words = words.clone();
        ordered_words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

        Some(TokenSet {
            words,
            ordered_words,
        })
    }

    /// Tokens in order of appearance.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Tokens longest first; ties keep their order of appearance.
    pub fn ordered_words(&self) -> &[String] {
        &self.ordered_words
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false for a parsed set; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// All tokens joined by single spaces, in order of appearance.
    pub fn phrase(&self) -> String {
        self.words.join(" ")
    }

    /// All tokens joined by single spaces, longest first.
    pub fn fulltext_phrase(&self) -> String {
        self.ordered_words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace() {
        assert!(TokenSet::parse("", 5).is_none());
        assert!(TokenSet::parse("   \t\n", 5).is_none());
        assert!(TokenSet::parse("\"\"", 5).is_none());
    }

    #[test]
    fn test_lowercases_and_splits() {
        let tokens = TokenSet::parse("  John SMITH ", 5).unwrap();
        assert_eq!(tokens.words(), ["john", "smith"]);
        assert_eq!(tokens.phrase(), "john smith");
    }

    #[test]
    fn test_quoted_phrase_is_one_token() {
        let tokens = TokenSet::parse(r#"acme "new   york" office"#, 5).unwrap();
        assert_eq!(tokens.words(), ["acme", "new york", "office"]);
    }

    #[test]
    fn test_unterminated_quote() {
        let tokens = TokenSet::parse(r#""new york"#, 5).unwrap();
        assert_eq!(tokens.words(), ["new", "york"]);
    }

    #[test]
    fn test_phone_number_heuristic() {
        let tokens = TokenSet::parse("(555) 123-4567", 5).unwrap();
        assert_eq!(tokens.words(), ["5551234567"]);

        let tokens = TokenSet::parse("route 66", 5).unwrap();
        assert_eq!(tokens.words(), ["route", "66"]);
    }

    #[test]
    fn test_truncates_to_max_words() {
        let tokens = TokenSet::parse("a b c d e f g", 3).unwrap();
        assert_eq!(tokens.words(), ["a", "b", "c"]);
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_ordered_words_longest_first_stable() {
        let tokens = TokenSet::parse("ab cde fg hijk xy", 5).unwrap();
        assert_eq!(tokens.ordered_words(), ["hijk", "cde", "ab", "fg", "xy"]);
        assert_eq!(tokens.fulltext_phrase(), "hijk cde ab fg xy");
    }
}
