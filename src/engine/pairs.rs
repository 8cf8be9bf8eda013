//! Deterministic comparison-pair enumeration
//!
//! Fixed policy, identical for every item:
//! - one cross-modal pair per transformation step (input vs. output);
//! - for every artifact with an earlier same-modality artifact, one
//!   intra-modal pair against that modality's origin artifact and one
//!   against the immediately preceding same-modality artifact, collapsed
//!   when they coincide.
//!
//! Pairs are ordered left=earlier, and enumerated step by step so the same
//! chain always yields the same ordered set.

use crate::domain::{ComparisonPair, LoopSpec, Modality, PairKind};

/// Enumerate all required pairs for a chain of `artifact_count` artifacts
/// (seed included). Pass a shorter count to enumerate over a Failed item's
/// completed prefix.
pub fn enumerate_pairs(item_id: &str, spec: &LoopSpec, artifact_count: u32) -> Vec<ComparisonPair> {
    let mut pairs = Vec::new();
    let count = artifact_count.min(spec.artifact_count());

    for right in 1..count {
        // the step that produced artifact `right` read artifact `right - 1`
        pairs.push(ComparisonPair::new(
            item_id,
            PairKind::CrossModal,
            right - 1,
            right,
        ));

        let modality = spec.modality_at(right);
        if right >= spec.period() {
            let kind = intra_kind(modality);
            let origin = spec
                .origin_of(modality)
                .expect("chain modalities come from the cycle");
            let previous = right - spec.period();

            pairs.push(ComparisonPair::new(item_id, kind, origin, right));
            if previous != origin {
                pairs.push(ComparisonPair::new(item_id, kind, previous, right));
            }
        }
    }

    pairs
}

fn intra_kind(modality: Modality) -> PairKind {
    match modality {
        Modality::Image => PairKind::IntraModalImage,
        Modality::Text => PairKind::IntraModalText,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(pattern: &str, iterations: u32) -> LoopSpec {
        LoopSpec::parse(pattern, iterations).unwrap()
    }

    #[test]
    fn test_iti_two_iterations_example() {
        // seed image, caption, regenerated image: two cross-modal pairs
        // plus the full-cycle image drift pair
        let pairs = enumerate_pairs("item", &spec("I-T-I", 2), 3);
        assert_eq!(
            pairs,
            vec![
                ComparisonPair::new("item", PairKind::CrossModal, 0, 1),
                ComparisonPair::new("item", PairKind::CrossModal, 1, 2),
                ComparisonPair::new("item", PairKind::IntraModalImage, 0, 2),
            ]
        );
    }

    #[test]
    fn test_tit_two_iterations() {
        let pairs = enumerate_pairs("item", &spec("T-I-T", 2), 3);
        assert_eq!(
            pairs,
            vec![
                ComparisonPair::new("item", PairKind::CrossModal, 0, 1),
                ComparisonPair::new("item", PairKind::CrossModal, 1, 2),
                ComparisonPair::new("item", PairKind::IntraModalText, 0, 2),
            ]
        );
    }

    #[test]
    fn test_longer_chain_gets_origin_and_previous_pairs() {
        let pairs = enumerate_pairs("item", &spec("I-T-I", 4), 5);
        assert_eq!(
            pairs,
            vec![
                ComparisonPair::new("item", PairKind::CrossModal, 0, 1),
                ComparisonPair::new("item", PairKind::CrossModal, 1, 2),
                ComparisonPair::new("item", PairKind::IntraModalImage, 0, 2),
                ComparisonPair::new("item", PairKind::CrossModal, 2, 3),
                ComparisonPair::new("item", PairKind::IntraModalText, 1, 3),
                ComparisonPair::new("item", PairKind::CrossModal, 3, 4),
                ComparisonPair::new("item", PairKind::IntraModalImage, 0, 4),
                ComparisonPair::new("item", PairKind::IntraModalImage, 2, 4),
            ]
        );
    }

    #[test]
    fn test_left_is_always_earlier() {
        let pairs = enumerate_pairs("item", &spec("I-T-I", 6), 7);
        assert!(pairs.iter().all(|p| p.left < p.right));
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        let s = spec("T-I-T", 5);
        let first = enumerate_pairs("item", &s, 6);
        let second = enumerate_pairs("item", &s, 6);
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_prefix_enumeration() {
        // a Failed item with only seed + one caption: just the one
        // cross-modal pair exists
        let pairs = enumerate_pairs("item", &spec("I-T-I", 4), 2);
        assert_eq!(
            pairs,
            vec![ComparisonPair::new("item", PairKind::CrossModal, 0, 1)]
        );
    }

    #[test]
    fn test_seed_only_chain_has_no_pairs() {
        let pairs = enumerate_pairs("item", &spec("I-T-I", 4), 1);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_count_clamped_to_spec_length() {
        let pairs_exact = enumerate_pairs("item", &spec("I-T-I", 2), 3);
        let pairs_over = enumerate_pairs("item", &spec("I-T-I", 2), 10);
        assert_eq!(pairs_exact, pairs_over);
    }
}
