//! Loop specification and the modality cycle
//!
//! The alternating-modality control flow is a state table over (iteration
//! index, modality): position `i` in the chain always has modality
//! `cycle[i % period]`. Adding a new loop shape (e.g. a three-modality
//! cycle) means a longer cycle vector, not new branching.

use serde::{Deserialize, Serialize};

use crate::domain::Modality;
use crate::error::{DriftError, Result};

/// Immutable description of one item's transformation loop
///
/// Parsed from a pattern string like "I-T-I" or "T-I-T" plus an iteration
/// count. A Completed loop holds exactly `iterations + 1` artifacts,
/// indices 0..=iterations, whose modalities walk the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopSpec {
    cycle: Vec<Modality>,
    iterations: u32,
}

impl LoopSpec {
    /// Build a spec from a pattern string and iteration count.
    ///
    /// The pattern names one loop cycle ("I-T-I" = image to text back to
    /// image); a trailing symbol equal to the first marks the cycle closing
    /// and is folded into the period.
    pub fn parse(pattern: &str, iterations: u32) -> Result<Self> {
        let mut cycle: Vec<Modality> = Vec::new();
        for part in pattern.split('-') {
            let part = part.trim();
            let mut chars = part.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Err(DriftError::InvalidSpec(format!(
                    "bad pattern segment '{}' in '{}'",
                    part, pattern
                )));
            };
            let modality = Modality::from_symbol(c).ok_or_else(|| {
                DriftError::InvalidSpec(format!("unknown modality symbol '{}' in '{}'", c, pattern))
            })?;
            cycle.push(modality);
        }

        // "I-T-I" closes the cycle explicitly; fold the return step away
        if cycle.len() >= 3 && cycle.first() == cycle.last() {
            cycle.pop();
        }

        Self::new(cycle, iterations)
    }

    /// Build a spec directly from a modality cycle.
    pub fn new(cycle: Vec<Modality>, iterations: u32) -> Result<Self> {
        if iterations == 0 {
            return Err(DriftError::InvalidSpec(
                "iteration count must be positive".to_string(),
            ));
        }
        if cycle.len() < 2 {
            return Err(DriftError::InvalidSpec(
                "cycle needs at least two modalities".to_string(),
            ));
        }
        for i in 0..cycle.len() {
            let next = cycle[(i + 1) % cycle.len()];
            if cycle[i] == next {
                return Err(DriftError::InvalidSpec(format!(
                    "cycle repeats modality '{}' at adjacent steps",
                    cycle[i]
                )));
            }
        }
        Ok(Self { cycle, iterations })
    }

    /// Number of transformation steps per item
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Total artifacts in a Completed loop (seed + one per step)
    pub fn artifact_count(&self) -> u32 {
        self.iterations + 1
    }

    /// Modality of the seed artifact (index 0)
    pub fn seed_modality(&self) -> Modality {
        self.cycle[0]
    }

    /// Modality of the artifact at the given chain index
    pub fn modality_at(&self, index: u32) -> Modality {
        self.cycle[(index as usize) % self.cycle.len()]
    }

    /// Target modality for transformation step `step` (1-based: the step
    /// that produces the artifact at index `step`)
    pub fn target_for_step(&self, step: u32) -> Modality {
        self.modality_at(step)
    }

    /// Length of one cycle period: the distance between consecutive
    /// same-modality artifacts in the chain
    pub fn period(&self) -> u32 {
        self.cycle.len() as u32
    }

    /// Chain index of the first artifact carrying the given modality (its
    /// "origin" for intra-modal drift comparisons), if the modality
    /// appears in the cycle at all
    pub fn origin_of(&self, modality: Modality) -> Option<u32> {
        self.cycle
            .iter()
            .position(|m| *m == modality)
            .map(|i| i as u32)
    }

    /// Pattern string naming one closed cycle, e.g. "I-T-I"
    pub fn pattern_string(&self) -> String {
        let mut symbols: Vec<String> = self.cycle.iter().map(|m| m.symbol().to_string()).collect();
        symbols.push(self.cycle[0].symbol().to_string());
        symbols.join("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iti() {
        let spec = LoopSpec::parse("I-T-I", 2).unwrap();
        assert_eq!(spec.seed_modality(), Modality::Image);
        assert_eq!(spec.modality_at(0), Modality::Image);
        assert_eq!(spec.modality_at(1), Modality::Text);
        assert_eq!(spec.modality_at(2), Modality::Image);
        assert_eq!(spec.modality_at(3), Modality::Text);
        assert_eq!(spec.artifact_count(), 3);
    }

    #[test]
    fn test_parse_tit() {
        let spec = LoopSpec::parse("T-I-T", 4).unwrap();
        assert_eq!(spec.seed_modality(), Modality::Text);
        assert_eq!(spec.modality_at(1), Modality::Image);
        assert_eq!(spec.modality_at(4), Modality::Image);
        assert_eq!(spec.artifact_count(), 5);
    }

    #[test]
    fn test_parse_open_pattern_equivalent_to_closed() {
        let open = LoopSpec::parse("I-T", 3).unwrap();
        let closed = LoopSpec::parse("I-T-I", 3).unwrap();
        assert_eq!(open, closed);
    }

    #[test]
    fn test_parse_lowercase_symbols() {
        let spec = LoopSpec::parse("i-t-i", 1).unwrap();
        assert_eq!(spec.seed_modality(), Modality::Image);
    }

    #[test]
    fn test_parse_rejects_unknown_symbol() {
        let result = LoopSpec::parse("I-X-I", 2);
        assert!(matches!(result, Err(DriftError::InvalidSpec(_))));
    }

    #[test]
    fn test_parse_rejects_repeated_modality() {
        let result = LoopSpec::parse("I-I", 2);
        assert!(matches!(result, Err(DriftError::InvalidSpec(_))));
    }

    #[test]
    fn test_parse_rejects_zero_iterations() {
        let result = LoopSpec::parse("I-T-I", 0);
        assert!(matches!(result, Err(DriftError::InvalidSpec(_))));
    }

    #[test]
    fn test_parse_rejects_single_modality() {
        let result = LoopSpec::parse("I", 2);
        assert!(matches!(result, Err(DriftError::InvalidSpec(_))));
    }

    #[test]
    fn test_target_for_step_alternates() {
        let spec = LoopSpec::parse("I-T-I", 4).unwrap();
        assert_eq!(spec.target_for_step(1), Modality::Text);
        assert_eq!(spec.target_for_step(2), Modality::Image);
        assert_eq!(spec.target_for_step(3), Modality::Text);
        assert_eq!(spec.target_for_step(4), Modality::Image);
    }

    #[test]
    fn test_period_and_origins() {
        let spec = LoopSpec::parse("I-T-I", 4).unwrap();
        assert_eq!(spec.period(), 2);
        assert_eq!(spec.origin_of(Modality::Image), Some(0));
        assert_eq!(spec.origin_of(Modality::Text), Some(1));

        let spec = LoopSpec::parse("T-I-T", 4).unwrap();
        assert_eq!(spec.origin_of(Modality::Text), Some(0));
        assert_eq!(spec.origin_of(Modality::Image), Some(1));
    }

    #[test]
    fn test_pattern_string_roundtrip() {
        let spec = LoopSpec::parse("I-T-I", 2).unwrap();
        assert_eq!(spec.pattern_string(), "I-T-I");
        let spec = LoopSpec::parse("T-I-T", 2).unwrap();
        assert_eq!(spec.pattern_string(), "T-I-T");
    }

    #[test]
    fn test_serialization_roundtrip() {
        let spec = LoopSpec::parse("I-T-I", 3).unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        let parsed: LoopSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, spec);
    }
}
