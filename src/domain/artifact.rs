//! Artifacts and modalities
//!
//! An artifact is one element of a loop's generation chain: the seed at
//! index 0, then one artifact per transformation step. Records are immutable
//! once written; the payload lives in a file owned by the artifact store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The representation class of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Image,
    Text,
}

impl Modality {
    /// Short symbol used in pattern strings ("I-T-I")
    pub fn symbol(&self) -> char {
        match self {
            Modality::Image => 'I',
            Modality::Text => 'T',
        }
    }

    /// Parse a single pattern symbol
    pub fn from_symbol(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'I' => Some(Modality::Image),
            'T' => Some(Modality::Text),
            _ => None,
        }
    }

    /// Default file extension for persisted payloads of this modality
    pub fn file_ext(&self) -> &'static str {
        match self {
            Modality::Image => "png",
            Modality::Text => "txt",
        }
    }

    /// Lowercase name used in artifact file stems ("iter0_image")
    pub fn name(&self) -> &'static str {
        match self {
            Modality::Image => "image",
            Modality::Text => "text",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// In-memory artifact payload passed to capabilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Image(Vec<u8>),
}

impl Payload {
    /// The modality this payload belongs to
    pub fn modality(&self) -> Modality {
        match self {
            Payload::Text(_) => Modality::Text,
            Payload::Image(_) => Modality::Image,
        }
    }

    /// Raw bytes of the payload (UTF-8 for text)
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(s) => s.as_bytes(),
            Payload::Image(b) => b,
        }
    }
}

/// One persisted artifact in an item's generation chain
///
/// `file_name` is the payload reference, relative to the item's directory.
/// `index` is 0 for the seed and strictly increasing per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub item_id: String,
    pub index: u32,
    pub modality: Modality,
    pub file_name: String,
    /// Hex sha256 of the payload bytes, for provenance
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Canonical file stem for an artifact at the given index and modality
    pub fn file_stem(index: u32, modality: Modality) -> String {
        format!("iter{}_{}", index, modality.name())
    }

    /// Canonical file name using the modality's default extension
    pub fn default_file_name(index: u32, modality: Modality) -> String {
        format!("{}.{}", Self::file_stem(index, modality), modality.file_ext())
    }
}

/// One seed supplied by the seed source, with its stable identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedItem {
    pub id: String,
    pub payload: Payload,
}

impl SeedItem {
    pub fn new(id: impl Into<String>, payload: Payload) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_symbols_roundtrip() {
        assert_eq!(Modality::from_symbol('I'), Some(Modality::Image));
        assert_eq!(Modality::from_symbol('t'), Some(Modality::Text));
        assert_eq!(Modality::from_symbol('X'), None);
        assert_eq!(Modality::Image.symbol(), 'I');
        assert_eq!(Modality::Text.symbol(), 'T');
    }

    #[test]
    fn test_modality_serialization() {
        assert_eq!(serde_json::to_string(&Modality::Image).unwrap(), "\"image\"");
        assert_eq!(serde_json::to_string(&Modality::Text).unwrap(), "\"text\"");
    }

    #[test]
    fn test_payload_modality() {
        assert_eq!(Payload::Text("hi".into()).modality(), Modality::Text);
        assert_eq!(Payload::Image(vec![0u8]).modality(), Modality::Image);
    }

    #[test]
    fn test_payload_as_bytes() {
        assert_eq!(Payload::Text("ab".into()).as_bytes(), b"ab");
        assert_eq!(Payload::Image(vec![1, 2]).as_bytes(), &[1, 2]);
    }

    #[test]
    fn test_artifact_file_naming() {
        assert_eq!(Artifact::file_stem(0, Modality::Image), "iter0_image");
        assert_eq!(
            Artifact::default_file_name(3, Modality::Text),
            "iter3_text.txt"
        );
        assert_eq!(
            Artifact::default_file_name(2, Modality::Image),
            "iter2_image.png"
        );
    }

    #[test]
    fn test_artifact_serialization_roundtrip() {
        let artifact = Artifact {
            item_id: "input_0".to_string(),
            index: 1,
            modality: Modality::Text,
            file_name: "iter1_text.txt".to_string(),
            sha256: "ab".repeat(32),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&artifact).expect("serialize");
        let parsed: Artifact = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, artifact);
    }
}
