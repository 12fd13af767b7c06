use serde::{Deserialize, Serialize};

/// A spelling correction applied to a unit phrase, e.g. `meter` -> `metre`.
///
/// Every occurrence of `pattern` in the phrase is replaced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRule {
    pub pattern: String,
    pub replacement: String,
}

impl CorrectionRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Rewritten phrase, or `None` when the pattern does not occur.
    pub fn apply(&self, phrase: &str) -> Option<String> {
        if self.pattern.is_empty() || !phrase.contains(self.pattern.as_str()) {
            return None;
        }
        Some(phrase.replace(self.pattern.as_str(), &self.replacement))
    }
}

/// American-to-British metre spelling, then plural feet.
pub fn default_correction_rules() -> Vec<CorrectionRule> {
    vec![
        CorrectionRule::new("ter", "tre"),
        CorrectionRule::new("feet", "foot"),
    ]
}
