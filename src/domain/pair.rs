//! Comparison pairs
//!
//! Pairs are derived, never stored as their own source of truth: the engine
//! recomputes them deterministically from a completed chain. Left is always
//! the earlier iteration index, so seed comparisons place the seed left.

use serde::{Deserialize, Serialize};

/// What a comparison pair measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairKind {
    /// Opposite-modality artifacts across one transformation step
    #[serde(rename = "cross-modal")]
    CrossModal,
    /// Two text artifacts at different points in the loop
    #[serde(rename = "intra-modal-text")]
    IntraModalText,
    /// Two image artifacts at different points in the loop
    #[serde(rename = "intra-modal-image")]
    IntraModalImage,
}

impl PairKind {
    /// Short tag used in rating file names
    pub fn tag(&self) -> &'static str {
        match self {
            PairKind::CrossModal => "cross",
            PairKind::IntraModalText => "intra_text",
            PairKind::IntraModalImage => "intra_image",
        }
    }
}

/// One required comparison between two artifacts of the same item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComparisonPair {
    pub item_id: String,
    pub kind: PairKind,
    /// Iteration index of the earlier artifact
    pub left: u32,
    /// Iteration index of the later artifact
    pub right: u32,
}

impl ComparisonPair {
    pub fn new(item_id: impl Into<String>, kind: PairKind, left: u32, right: u32) -> Self {
        debug_assert!(left < right, "pairs are ordered left=earlier");
        Self {
            item_id: item_id.into(),
            kind,
            left,
            right,
        }
    }

    /// Stable file stem for this pair's rating record
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.kind.tag(), self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&PairKind::CrossModal).unwrap(),
            "\"cross-modal\""
        );
        assert_eq!(
            serde_json::to_string(&PairKind::IntraModalText).unwrap(),
            "\"intra-modal-text\""
        );
        assert_eq!(
            serde_json::to_string(&PairKind::IntraModalImage).unwrap(),
            "\"intra-modal-image\""
        );
    }

    #[test]
    fn test_pair_file_stem() {
        let pair = ComparisonPair::new("input_0", PairKind::CrossModal, 0, 1);
        assert_eq!(pair.file_stem(), "cross_0_1");

        let pair = ComparisonPair::new("input_0", PairKind::IntraModalImage, 0, 2);
        assert_eq!(pair.file_stem(), "intra_image_0_2");
    }

    #[test]
    fn test_pair_roundtrip() {
        let pair = ComparisonPair::new("input_0", PairKind::IntraModalText, 1, 3);
        let json = serde_json::to_string(&pair).unwrap();
        let parsed: ComparisonPair = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pair);
    }
}
