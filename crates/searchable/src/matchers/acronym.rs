//! Acronym matcher.

use crate::query::{SqlFragment, SqlParam};

use super::{case_when, like};

/// Scores columns whose words start with the token's letters, in order.
///
/// `"fb"` matches `"Foo Bar"` and `"Fizz Buzz Bar"` but not `"FreeBeer"`:
/// every letter after the first must follow a space.
pub struct AcronymMatcher;

impl AcronymMatcher {
    /// Builds the acronym comparison. Tokens without letters or digits
    /// contribute nothing.
    pub fn build_sql(token: &str, column: &str, weight: f64) -> SqlFragment {
        match Self::pattern(token) {
            Some(pattern) => SqlFragment::with_params(
                case_when(&like(column), weight),
                vec![SqlParam::string(pattern)],
            ),
            None => SqlFragment::new("0"),
        }
    }

    fn pattern(token: &str) -> Option<String> {
        let letters: Vec<String> = token
            .chars()
            .filter(|c| c.is_alphanumeric())
            .map(|c| c.to_string())
            .collect();
        if letters.is_empty() {
            return None;
        }
        Some(format!("{}%", letters.join("% ")))
    }
}
