//! [`LikePattern`] definition.

use derive_more::Display;
use postgres_types::{FromSql, ToSql};

/// SQL `LIKE` pattern matching any text containing the given substring.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct LikePattern(String);

impl LikePattern {
    /// Creates a new [`LikePattern`] matching the given `substring`
    /// literally.
    #[must_use]
    pub fn containing(substring: &str) -> Self {
        Self(format!(
            "%{}%",
            substring
                .replace('\\', r"\\")
                .replace('%', r"\%")
                .replace('_', r"\_"),
        ))
    }
}

#[cfg(test)]
mod spec {
    use super::LikePattern;

    #[test]
    fn escapes_wildcards() {
        assert_eq!(LikePattern::containing("Hua").to_string(), "%Hua%");
        assert_eq!(
            LikePattern::containing(r"50%_off\").to_string(),
            r"%50\%\_off\\%",
        );
    }
}
