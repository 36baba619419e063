//! Snapshot archive — versioned on-disk persistence for phylogenic trees
//!
//! Long evolutionary runs checkpoint periodically. The archive writes each
//! snapshot as a timestamped JSON file next to a `manifest.json`, keeps a
//! SHA-256 checksum per version, and can load or verify any of them.

use chrono::{DateTime, Utc};
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::genome::Genome;
use crate::species::{SnapshotError, SpeciesTree, TreeConfig};

/// Why an archive operation failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("checksum mismatch for version {version}: expected {expected}, found {found}")]
    ChecksumMismatch {
        version: u64,
        expected: String,
        found: String,
    },

    #[error("no snapshot with version {0}")]
    UnknownVersion(u64),

    #[error("archive is empty")]
    Empty,
}

/// Metadata for one archived snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub version: u64,
    pub timestamp: DateTime<Utc>,
    pub checksum: String,
    pub size_bytes: u64,
    pub species_count: usize,
    pub step: u64,
    pub description: String,
    pub filename: String,
}

/// Manifest tracking every snapshot in an archive directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub snapshots: Vec<SnapshotMeta>,
    pub next_version: u64,
    pub archive_dir: String,
}

impl ArchiveManifest {
    pub fn new(archive_dir: impl Into<String>) -> Self {
        Self {
            snapshots: Vec::new(),
            next_version: 1,
            archive_dir: archive_dir.into(),
        }
    }

    /// Loads an existing manifest or starts a fresh one.
    pub fn load_or_create(archive_dir: &str) -> Self {
        let manifest_path = Path::new(archive_dir).join("manifest.json");
        if manifest_path.exists() {
            if let Ok(json) = std::fs::read_to_string(&manifest_path) {
                if let Ok(manifest) = serde_json::from_str::<ArchiveManifest>(&json) {
                    info!("loaded archive manifest with {} snapshots", manifest.snapshots.len());
                    return manifest;
                }
            }
        }
        Self::new(archive_dir)
    }

    /// Persists the manifest into its archive directory.
    pub fn save(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.archive_dir)?;
        let path = Path::new(&self.archive_dir).join("manifest.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// The archive manager.
pub struct TreeArchive {
    pub manifest: ArchiveManifest,
}

impl TreeArchive {
    /// Opens (or creates) an archive in the given directory.
    pub fn open(archive_dir: impl AsRef<Path>) -> Self {
        let dir = archive_dir.as_ref().to_string_lossy().into_owned();
        Self {
            manifest: ArchiveManifest::load_or_create(&dir),
        }
    }

    /// Serializes the tree into a new versioned snapshot and records it in
    /// the manifest. Returns the metadata of the written snapshot.
    pub fn save_snapshot<G>(
        &mut self,
        tree: &SpeciesTree<G>,
        description: &str,
    ) -> Result<SnapshotMeta, StoreError>
    where
        G: Genome + Clone + Serialize,
    {
        let json = tree.to_json()?;
        let version = self.manifest.next_version;
        let timestamp = Utc::now();
        let filename = format!("snapshot_v{}_{}.json", version, timestamp.format("%Y%m%d_%H%M%S"));

        std::fs::create_dir_all(&self.manifest.archive_dir)?;
        let path = self.snapshot_path(&filename);
        std::fs::write(&path, &json)?;

        let meta = SnapshotMeta {
            version,
            timestamp,
            checksum: checksum(json.as_bytes()),
            size_bytes: json.len() as u64,
            species_count: tree.species_count(),
            step: tree.step(),
            description: description.to_string(),
            filename,
        };
        self.manifest.snapshots.push(meta.clone());
        self.manifest.next_version += 1;
        self.manifest.save()?;

        info!(
            "archived snapshot v{} ({} species, step {}, {} bytes)",
            meta.version, meta.species_count, meta.step, meta.size_bytes
        );
        Ok(meta)
    }

    /// Loads and decodes one archived version, verifying its checksum first.
    pub fn load_snapshot<G>(
        &self,
        version: u64,
        config: TreeConfig,
    ) -> Result<SpeciesTree<G>, StoreError>
    where
        G: Genome + Clone + DeserializeOwned,
    {
        let meta = self.meta(version)?;
        let json = std::fs::read_to_string(self.snapshot_path(&meta.filename))?;
        let found = checksum(json.as_bytes());
        if found != meta.checksum {
            return Err(StoreError::ChecksumMismatch {
                version,
                expected: meta.checksum.clone(),
                found,
            });
        }
        Ok(SpeciesTree::from_json(config, &json)?)
    }

    /// Loads the most recently archived snapshot.
    pub fn load_latest<G>(&self, config: TreeConfig) -> Result<SpeciesTree<G>, StoreError>
    where
        G: Genome + Clone + DeserializeOwned,
    {
        let latest = self.manifest.snapshots.last().ok_or(StoreError::Empty)?;
        self.load_snapshot(latest.version, config)
    }

    /// Checks one version's file against its recorded checksum.
    pub fn verify(&self, version: u64) -> Result<bool, StoreError> {
        let meta = self.meta(version)?;
        let json = std::fs::read_to_string(self.snapshot_path(&meta.filename))?;
        Ok(checksum(json.as_bytes()) == meta.checksum)
    }

    /// Verifies every archived version; returns `(version, intact)` pairs.
    pub fn verify_all(&self) -> Vec<(u64, bool)> {
        self.manifest
            .snapshots
            .iter()
            .map(|meta| (meta.version, self.verify(meta.version).unwrap_or(false)))
            .collect()
    }

    fn meta(&self, version: u64) -> Result<&SnapshotMeta, StoreError> {
        self.manifest
            .snapshots
            .iter()
            .find(|m| m.version == version)
            .ok_or(StoreError::UnknownVersion(version))
    }

    fn snapshot_path(&self, filename: &str) -> PathBuf {
        Path::new(&self.manifest.archive_dir).join(filename)
    }
}

fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
