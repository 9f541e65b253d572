//! Maps a search result's distance score to a relevance bucket.

/// Scores at or below this are a high match
pub const HIGH_MATCH_MAX: f64 = 0.8;
/// Scores above [`HIGH_MATCH_MAX`] and at or below this are a good match
pub const GOOD_MATCH_MAX: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relevance {
    High,
    Medium,
    Low,
}

impl Relevance {
    /// Classify a distance score (lower is more relevant).
    ///
    /// Anything that is not at or below a threshold, including NaN, is
    /// `Low`.
    pub fn from_score(score: f64) -> Self {
        if score <= HIGH_MATCH_MAX {
            Relevance::High
        } else if score <= GOOD_MATCH_MAX {
            Relevance::Medium
        } else {
            Relevance::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relevance::High => "high",
            Relevance::Medium => "medium",
            Relevance::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Relevance::High => "High Match",
            Relevance::Medium => "Good Match",
            Relevance::Low => "Partial Match",
        }
    }
}
