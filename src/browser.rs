use regex::{Regex, RegexBuilder};

/// Decides whether a client needs the full-file compatibility response on its
/// first request.
///
/// Implementations must be pure: the same user agent always classifies the
/// same way.
pub trait BrowserClassifier: Send + Sync {
    fn is_legacy_safari(&self, user_agent: &str) -> bool;
}

/// [`BrowserClassifier`] backed by a case-insensitive regular expression.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    pattern: Regex,
}

impl PatternClassifier {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(PatternClassifier { pattern })
    }
}

impl BrowserClassifier for PatternClassifier {
    fn is_legacy_safari(&self, user_agent: &str) -> bool {
        self.pattern.is_match(user_agent)
    }
}

impl<F> BrowserClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_legacy_safari(&self, user_agent: &str) -> bool {
        self(user_agent)
    }
}
