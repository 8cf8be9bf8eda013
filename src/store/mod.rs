//! Artifact store - per-item filesystem persistence
//!
//! Layout under the store root, one namespace per item so items never
//! contend for the same files:
//!
//! ```text
//! <root>/
//!   summary.json                     run summary for the reporting layer
//!   <item_id>/
//!     iter0_image.png                one file per artifact, index+modality
//!     iter1_text.txt
//!     meta/iter1.json                one IterationRecord per step
//!     eval/cross_0_1.json            one RatingRecord per comparison pair
//! ```
//!
//! Records are append-only: nothing here mutates an existing artifact,
//! iteration record, or rating. Iteration records must arrive in index
//! order; `write_iteration` rejects gaps.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::domain::{Artifact, IterationRecord, Modality, Payload, RatingRecord};
use crate::error::{DriftError, Result};
use crate::id;

/// Subdirectory holding iteration records
const META_DIR: &str = "meta";
/// Subdirectory holding rating records
const EVAL_DIR: &str = "eval";

/// Hex sha256 of a payload's bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Filesystem-backed artifact store
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open or create a store rooted at the given directory
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn item_dir(&self, item_id: &str) -> PathBuf {
        self.root.join(item_id)
    }

    fn meta_path(&self, item_id: &str, index: u32) -> PathBuf {
        self.item_dir(item_id)
            .join(META_DIR)
            .join(format!("iter{}.json", index))
    }

    /// Register the seed payload as iteration 0.
    ///
    /// Idempotent: if the seed artifact already exists on disk it is left
    /// untouched and its record is rebuilt from the file.
    pub fn register_seed(&self, item_id: &str, payload: &Payload) -> Result<Artifact> {
        if let Some(existing) = self.find_artifact(item_id, 0, payload.modality())? {
            return Ok(existing);
        }
        self.write_artifact(item_id, 0, payload)
    }

    /// Persist a payload as the artifact at the given index
    pub fn write_artifact(&self, item_id: &str, index: u32, payload: &Payload) -> Result<Artifact> {
        let modality = payload.modality();
        let file_name = Artifact::default_file_name(index, modality);
        let dir = self.item_dir(item_id);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(&file_name), payload.as_bytes())?;

        Ok(Artifact {
            item_id: item_id.to_string(),
            index,
            modality,
            file_name,
            sha256: sha256_hex(payload.as_bytes()),
            created_at: id::now(),
        })
    }

    /// Load an artifact's payload back into memory
    pub fn load_payload(&self, artifact: &Artifact) -> Result<Payload> {
        let path = self.item_dir(&artifact.item_id).join(&artifact.file_name);
        let bytes = fs::read(&path)
            .map_err(|_| DriftError::MissingArtifact(format!("{}/{}", artifact.item_id, artifact.file_name)))?;
        match artifact.modality {
            Modality::Text => {
                let text = String::from_utf8(bytes).map_err(|e| {
                    DriftError::Store(format!("{}: non-UTF8 text artifact: {}", artifact.file_name, e))
                })?;
                Ok(Payload::Text(text))
            }
            Modality::Image => Ok(Payload::Image(bytes)),
        }
    }

    /// Find the persisted artifact at (index, modality), if any.
    ///
    /// Matches on the canonical file stem so seeds keep their original
    /// extension (.jpg seeds stay .jpg).
    pub fn find_artifact(
        &self,
        item_id: &str,
        index: u32,
        modality: Modality,
    ) -> Result<Option<Artifact>> {
        let dir = self.item_dir(item_id);
        if !dir.exists() {
            return Ok(None);
        }
        let stem = Artifact::file_stem(index, modality);
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            let matches = Path::new(&file_name)
                .file_stem()
                .map(|s| s.to_string_lossy() == stem)
                .unwrap_or(false);
            if matches {
                let bytes = fs::read(entry.path())?;
                let created_at = entry
                    .metadata()?
                    .modified()
                    .map(chrono::DateTime::from)
                    .unwrap_or_else(|_| id::now());
                return Ok(Some(Artifact {
                    item_id: item_id.to_string(),
                    index,
                    modality,
                    file_name,
                    sha256: sha256_hex(&bytes),
                    created_at,
                }));
            }
        }
        Ok(None)
    }

    /// Load the contiguous artifact chain starting at the seed, following
    /// the modality cycle, stopping at the first missing index
    pub fn load_chain(&self, item_id: &str, spec: &crate::domain::LoopSpec) -> Result<Vec<Artifact>> {
        let mut chain = Vec::new();
        for index in 0..=spec.iterations() {
            match self.find_artifact(item_id, index, spec.modality_at(index))? {
                Some(artifact) => chain.push(artifact),
                None => break,
            }
        }
        Ok(chain)
    }

    /// Persist one iteration record; records must arrive in index order
    pub fn write_iteration(&self, record: &IterationRecord) -> Result<()> {
        if record.index > 1 && !self.meta_path(&record.item_id, record.index - 1).exists() {
            return Err(DriftError::Store(format!(
                "iteration record {} for '{}' written before record {}",
                record.index,
                record.item_id,
                record.index - 1
            )));
        }
        let path = self.meta_path(&record.item_id, record.index);
        self.write_json_at(&path, record)
    }

    /// Load all iteration records for an item, sorted by index
    pub fn load_iterations(&self, item_id: &str) -> Result<Vec<IterationRecord>> {
        let dir = self.item_dir(item_id).join(META_DIR);
        let mut records: Vec<IterationRecord> = self.read_json_dir(&dir)?;
        records.sort_by_key(|r| r.index);
        Ok(records)
    }

    /// Persist one rating record under the item's eval directory
    pub fn write_rating(&self, record: &RatingRecord) -> Result<()> {
        let path = self
            .item_dir(&record.item_id)
            .join(EVAL_DIR)
            .join(format!("{}.json", record.pair.file_stem()));
        self.write_json_at(&path, record)
    }

    /// Load all rating records for an item
    pub fn load_ratings(&self, item_id: &str) -> Result<Vec<RatingRecord>> {
        self.read_json_dir(&self.item_dir(item_id).join(EVAL_DIR))
    }

    /// Whether a rating for this pair is already persisted
    pub fn has_rating(&self, pair: &crate::domain::ComparisonPair) -> bool {
        self.item_dir(&pair.item_id)
            .join(EVAL_DIR)
            .join(format!("{}.json", pair.file_stem()))
            .exists()
    }

    /// All item ids with a namespace in this store, sorted
    pub fn list_items(&self) -> Result<Vec<String>> {
        let mut items = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                items.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        items.sort();
        Ok(items)
    }

    /// Write a JSON document at a path relative to the store root
    pub fn write_json<T: serde::Serialize>(&self, rel: &str, value: &T) -> Result<()> {
        self.write_json_at(&self.root.join(rel), value)
    }

    /// Read a JSON document at a path relative to the store root
    pub fn read_json<T: serde::de::DeserializeOwned>(&self, rel: &str) -> Result<T> {
        let bytes = fs::read(self.root.join(rel))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_json_at<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(value)?)?;
        Ok(())
    }

    fn read_json_dir<T: serde::de::DeserializeOwned>(&self, dir: &Path) -> Result<Vec<T>> {
        let mut values = Vec::new();
        if !dir.exists() {
            return Ok(values);
        }
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .collect();
        paths.sort();
        for path in paths {
            let bytes = fs::read(&path)?;
            values.push(serde_json::from_slice(&bytes)?);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComparisonPair, LoopSpec, PairKind, RatingOutcome, ScoreSet, StepStatus};
    use tempfile::TempDir;

    fn test_store() -> (ArtifactStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::open(temp.path()).unwrap();
        (store, temp)
    }

    fn record(item_id: &str, index: u32, status: StepStatus) -> IterationRecord {
        IterationRecord {
            item_id: item_id.to_string(),
            index,
            input: format!("iter{}_image.png", index - 1),
            output: Some(format!("iter{}_text.txt", index)),
            attempts: 1,
            status,
            error: None,
            started_at: id::now(),
            finished_at: id::now(),
        }
    }

    #[test]
    fn test_sha256_hex() {
        // sha256 of empty input
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_write_and_load_text_artifact() {
        let (store, _temp) = test_store();
        let payload = Payload::Text("a cat on a mat".to_string());
        let artifact = store.write_artifact("input_0", 1, &payload).unwrap();

        assert_eq!(artifact.file_name, "iter1_text.txt");
        assert_eq!(artifact.sha256, sha256_hex(b"a cat on a mat"));
        assert_eq!(store.load_payload(&artifact).unwrap(), payload);
    }

    #[test]
    fn test_write_and_load_image_artifact() {
        let (store, _temp) = test_store();
        let payload = Payload::Image(vec![0x89, 0x50, 0x4E, 0x47]);
        let artifact = store.write_artifact("input_0", 2, &payload).unwrap();

        assert_eq!(artifact.file_name, "iter2_image.png");
        assert_eq!(store.load_payload(&artifact).unwrap(), payload);
    }

    #[test]
    fn test_register_seed_idempotent() {
        let (store, _temp) = test_store();
        let payload = Payload::Text("seed".to_string());

        let first = store.register_seed("item", &payload).unwrap();
        let second = store.register_seed("item", &payload).unwrap();

        assert_eq!(first.index, 0);
        assert_eq!(first.file_name, second.file_name);
        assert_eq!(first.sha256, second.sha256);
    }

    #[test]
    fn test_find_artifact_matches_any_extension() {
        let (store, _temp) = test_store();
        // seed dropped in with a non-default extension
        let dir = store.root().join("item");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("iter0_image.jpg"), b"jpeg bytes").unwrap();

        let found = store
            .find_artifact("item", 0, Modality::Image)
            .unwrap()
            .unwrap();
        assert_eq!(found.file_name, "iter0_image.jpg");
        assert_eq!(found.sha256, sha256_hex(b"jpeg bytes"));
    }

    #[test]
    fn test_find_artifact_absent() {
        let (store, _temp) = test_store();
        assert!(
            store
                .find_artifact("missing", 0, Modality::Image)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_load_chain_stops_at_gap() {
        let (store, _temp) = test_store();
        let spec = LoopSpec::parse("I-T-I", 3).unwrap();

        store
            .write_artifact("item", 0, &Payload::Image(vec![1]))
            .unwrap();
        store
            .write_artifact("item", 1, &Payload::Text("caption".into()))
            .unwrap();
        // index 2 missing
        store
            .write_artifact("item", 3, &Payload::Text("late".into()))
            .unwrap();

        let chain = store.load_chain("item", &spec).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].index, 0);
        assert_eq!(chain[1].index, 1);
    }

    #[test]
    fn test_iteration_records_roundtrip_sorted() {
        let (store, _temp) = test_store();
        store
            .write_iteration(&record("item", 1, StepStatus::Succeeded))
            .unwrap();
        store
            .write_iteration(&record("item", 2, StepStatus::Failed))
            .unwrap();

        let records = store.load_iterations("item").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].index, 1);
        assert_eq!(records[1].index, 2);
        assert_eq!(records[1].status, StepStatus::Failed);
    }

    #[test]
    fn test_write_iteration_rejects_out_of_order() {
        let (store, _temp) = test_store();
        let result = store.write_iteration(&record("item", 2, StepStatus::Succeeded));
        assert!(matches!(result, Err(DriftError::Store(_))));
    }

    #[test]
    fn test_load_iterations_empty_item() {
        let (store, _temp) = test_store();
        assert!(store.load_iterations("nothing").unwrap().is_empty());
    }

    #[test]
    fn test_rating_record_roundtrip() {
        let (store, _temp) = test_store();
        let pair = ComparisonPair::new("item", PairKind::CrossModal, 0, 1);
        let rating = RatingRecord {
            item_id: "item".to_string(),
            pair: pair.clone(),
            outcome: RatingOutcome::Scored {
                scores: ScoreSet::uniform(7.0, "close"),
            },
            computed_at: id::now(),
        };

        assert!(!store.has_rating(&pair));
        store.write_rating(&rating).unwrap();
        assert!(store.has_rating(&pair));

        let loaded = store.load_ratings("item").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], rating);
    }

    #[test]
    fn test_list_items_sorted() {
        let (store, _temp) = test_store();
        store
            .write_artifact("beta", 0, &Payload::Text("b".into()))
            .unwrap();
        store
            .write_artifact("alpha", 0, &Payload::Text("a".into()))
            .unwrap();

        assert_eq!(store.list_items().unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_write_read_json_roundtrip() {
        let (store, _temp) = test_store();
        let value = serde_json::json!({"run": "run-1", "items": 3});
        store.write_json("summary.json", &value).unwrap();
        let loaded: serde_json::Value = store.read_json("summary.json").unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_persistence_across_instances() {
        let temp = TempDir::new().unwrap();
        {
            let store = ArtifactStore::open(temp.path()).unwrap();
            store
                .write_artifact("item", 0, &Payload::Text("seed".into()))
                .unwrap();
            store
                .write_iteration(&record("item", 1, StepStatus::Succeeded))
                .unwrap();
        }
        {
            let store = ArtifactStore::open(temp.path()).unwrap();
            assert!(
                store
                    .find_artifact("item", 0, Modality::Text)
                    .unwrap()
                    .is_some()
            );
            assert_eq!(store.load_iterations("item").unwrap().len(), 1);
        }
    }
}
