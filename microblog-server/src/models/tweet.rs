//! Tweet text validation

use super::ValidationError;

/// Maximum length for tweet text, matches `tweets.data VARCHAR(1000)`
const MAX_TWEET_LEN: usize = 1000;

/// Validated tweet text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetContent(String);

impl TweetContent {
    /// Create new tweet content.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 1000 characters
    ///
    /// # Example
    /// ```
    /// use microblog_server::models::TweetContent;
    ///
    /// assert!(TweetContent::new("hello world").is_ok());
    /// assert!(TweetContent::new("").is_err());
    /// assert!(TweetContent::new("   ").is_err());  // whitespace only
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "tweet_data" });
        }

        // VARCHAR limits count characters, not bytes
        if trimmed.chars().count() > MAX_TWEET_LEN {
            return Err(ValidationError::TooLong {
                field: "tweet_data",
                max: MAX_TWEET_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Get the content as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TweetContent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_whitespace_only() {
        assert!(matches!(
            TweetContent::new(" \n\t ").unwrap_err(),
            ValidationError::Empty { .. }
        ));
    }

    #[test]
    fn max_length_counts_chars() {
        assert!(TweetContent::new(&"a".repeat(1000)).is_ok());

        let err = TweetContent::new(&"a".repeat(1001)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 1000, .. }));

        // 1000 two-byte characters still fit
        assert!(TweetContent::new(&"é".repeat(1000)).is_ok());
    }

    #[test]
    fn trims_whitespace() {
        let content = TweetContent::new("  hello  ").unwrap();
        assert_eq!(content.as_str(), "hello");
    }
}
