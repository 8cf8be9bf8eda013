//! Rating records and the five-score contract
//!
//! Every Evaluator response must carry exactly five named scores, each in
//! [1.0, 10.0] with a non-empty justification. Validation rejects
//! out-of-range values outright; normalization rounds accepted values to
//! one decimal. Scores are never clamped into range.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ComparisonPair;

/// Lowest admissible score value
pub const SCORE_MIN: f64 = 1.0;
/// Highest admissible score value
pub const SCORE_MAX: f64 = 10.0;

/// One scored rubric dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub value: f64,
    pub justification: String,
}

impl Score {
    pub fn new(value: f64, justification: impl Into<String>) -> Self {
        Self {
            value,
            justification: justification.into(),
        }
    }
}

/// The fixed five-dimension rubric result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub content_correspondence: Score,
    pub compositional_alignment: Score,
    pub fidelity_completeness: Score,
    pub stylistic_congruence: Score,
    pub semantic_intent: Score,
}

impl ScoreSet {
    /// A score set with the same value and justification on every
    /// dimension; handy for fixtures and placeholder raters
    pub fn uniform(value: f64, justification: &str) -> Self {
        Self {
            content_correspondence: Score::new(value, justification),
            compositional_alignment: Score::new(value, justification),
            fidelity_completeness: Score::new(value, justification),
            stylistic_congruence: Score::new(value, justification),
            semantic_intent: Score::new(value, justification),
        }
    }

    /// All five dimensions with their canonical names, in rubric order
    pub fn dimensions(&self) -> [(&'static str, &Score); 5] {
        [
            ("content_correspondence", &self.content_correspondence),
            ("compositional_alignment", &self.compositional_alignment),
            ("fidelity_completeness", &self.fidelity_completeness),
            ("stylistic_congruence", &self.stylistic_congruence),
            ("semantic_intent", &self.semantic_intent),
        ]
    }

    /// Check the scoring contract: every value in range, every
    /// justification non-empty. Returns the first violation found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, score) in self.dimensions() {
            if !score.value.is_finite() || score.value < SCORE_MIN || score.value > SCORE_MAX {
                return Err(format!(
                    "score '{}' out of range [{}, {}]: {}",
                    name, SCORE_MIN, SCORE_MAX, score.value
                ));
            }
            if score.justification.trim().is_empty() {
                return Err(format!("score '{}' has an empty justification", name));
            }
        }
        Ok(())
    }

    /// Round every value to one decimal of precision
    pub fn normalized(mut self) -> Self {
        for score in [
            &mut self.content_correspondence,
            &mut self.compositional_alignment,
            &mut self.fidelity_completeness,
            &mut self.stylistic_congruence,
            &mut self.semantic_intent,
        ] {
            score.value = (score.value * 10.0).round() / 10.0;
        }
        self
    }
}

/// Whether a pair ended up scored or degraded to the unscored sentinel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RatingOutcome {
    Scored { scores: ScoreSet },
    Unscored { reason: String },
}

impl RatingOutcome {
    pub fn is_scored(&self) -> bool {
        matches!(self, RatingOutcome::Scored { .. })
    }
}

/// Durable rating for one comparison pair; immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub item_id: String,
    pub pair: ComparisonPair,
    #[serde(flatten)]
    pub outcome: RatingOutcome,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PairKind;

    fn uniform_scores(value: f64) -> ScoreSet {
        ScoreSet {
            content_correspondence: Score::new(value, "same subjects"),
            compositional_alignment: Score::new(value, "same layout"),
            fidelity_completeness: Score::new(value, "no missing elements"),
            stylistic_congruence: Score::new(value, "same palette"),
            semantic_intent: Score::new(value, "same message"),
        }
    }

    #[test]
    fn test_validate_accepts_in_range() {
        assert!(uniform_scores(1.0).validate().is_ok());
        assert!(uniform_scores(10.0).validate().is_ok());
        assert!(uniform_scores(7.3).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let err = uniform_scores(0.9).validate().unwrap_err();
        assert!(err.contains("out of range"));
        assert!(uniform_scores(10.1).validate().is_err());
        assert!(uniform_scores(-1.0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert!(uniform_scores(f64::NAN).validate().is_err());
        assert!(uniform_scores(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_justification() {
        let mut scores = uniform_scores(5.0);
        scores.stylistic_congruence.justification = "  ".to_string();
        let err = scores.validate().unwrap_err();
        assert!(err.contains("stylistic_congruence"));
    }

    #[test]
    fn test_validate_names_offending_dimension() {
        let mut scores = uniform_scores(5.0);
        scores.fidelity_completeness.value = 11.0;
        let err = scores.validate().unwrap_err();
        assert!(err.contains("fidelity_completeness"));
    }

    #[test]
    fn test_normalized_rounds_to_one_decimal() {
        let scores = uniform_scores(7.25).normalized();
        // round-half-away-from-zero: 7.25 -> 7.3 at one decimal
        assert!((scores.semantic_intent.value - 7.3).abs() < 1e-9);
        let scores = uniform_scores(7.04).normalized();
        assert!((scores.semantic_intent.value - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_does_not_clamp() {
        // normalization is precision-only; range enforcement is validate()'s job
        let scores = uniform_scores(12.34).normalized();
        assert!((scores.semantic_intent.value - 12.3).abs() < 1e-9);
        assert!(scores.validate().is_err());
    }

    #[test]
    fn test_score_set_requires_all_five_keys() {
        let json = r#"{
            "content_correspondence": {"value": 5.0, "justification": "x"},
            "compositional_alignment": {"value": 5.0, "justification": "x"},
            "fidelity_completeness": {"value": 5.0, "justification": "x"},
            "stylistic_congruence": {"value": 5.0, "justification": "x"}
        }"#;
        let result: std::result::Result<ScoreSet, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_rating_record_roundtrip_scored() {
        let record = RatingRecord {
            item_id: "input_0".to_string(),
            pair: ComparisonPair::new("input_0", PairKind::CrossModal, 0, 1),
            outcome: RatingOutcome::Scored {
                scores: uniform_scores(8.0),
            },
            computed_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"status\":\"scored\""));
        let parsed: RatingRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert!(parsed.outcome.is_scored());
    }

    #[test]
    fn test_rating_record_roundtrip_unscored() {
        let record = RatingRecord {
            item_id: "input_0".to_string(),
            pair: ComparisonPair::new("input_0", PairKind::IntraModalImage, 0, 2),
            outcome: RatingOutcome::Unscored {
                reason: "retry budget exhausted".to_string(),
            },
            computed_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"status\":\"unscored\""));
        let parsed: RatingRecord = serde_json::from_str(&json).unwrap();
        assert!(!parsed.outcome.is_scored());
    }
}
