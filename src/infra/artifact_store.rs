// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Saves and restores ModelBundles as single files under the
// model storage directory (model_dump/ by default).
//
// On-disk layout of one artifact:
//
//   bytes 0..4   magic  b"MSVB"
//   bytes 4..8   format version, u32 little-endian
//   bytes 8..    bincode-encoded ModelBundle
//
// Load failures are typed so the caller can tell "you never
// trained this model" apart from "this file is not a model we
// can read":
//   - NotFound      → no file at the path
//   - Io            → file exists but cannot be read
//   - Corrupt       → bad magic, truncated, or undecodable
//   - Incompatible  → written by a different format version

use anyhow::{Context, Result};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::ml::bundle::ModelBundle;
use crate::ml::inferencer::Pipeline;

pub const ARTIFACT_MAGIC: [u8; 4] = *b"MSVB";
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found at '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read artifact '{}': {}", .path.display(), .source)]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("artifact '{}' is corrupt: {}", .path.display(), .reason)]
    Corrupt { path: PathBuf, reason: String },

    #[error(
        "artifact '{}' has format version {}, this build reads version {}",
        .path.display(), .found, .expected
    )]
    Incompatible { path: PathBuf, found: u32, expected: u32 },
}

/// Frame a bundle with the magic and version header.
pub fn encode(bundle: &ModelBundle) -> Result<Vec<u8>> {
    let payload = bincode::serialize(bundle).context("Cannot encode model bundle")?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&ARTIFACT_MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Check the header and decode the bundle. `path` is only used
/// in error messages.
pub fn decode(path: &Path, bytes: &[u8]) -> Result<ModelBundle, ArtifactError> {
    let corrupt = |reason: String| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() < HEADER_LEN {
        return Err(corrupt(format!("file is only {} bytes long", bytes.len())));
    }
    if bytes[0..4] != ARTIFACT_MAGIC {
        return Err(corrupt("not a model artifact (bad magic bytes)".to_string()));
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[4..8]);
    let found = u32::from_le_bytes(version);
    if found != FORMAT_VERSION {
        return Err(ArtifactError::Incompatible {
            path: path.to_path_buf(),
            found,
            expected: FORMAT_VERSION,
        });
    }

    bincode::deserialize(&bytes[HEADER_LEN..]).map_err(|e| corrupt(e.to_string()))
}

// ─── ArtifactStore ────────────────────────────────────────────────────────────
/// Reads and writes artifacts in one directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write a bundle, creating the directory if needed.
    /// Returns the full path written.
    pub fn save(&self, name: &str, bundle: &ModelBundle) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create model directory '{}'", self.dir.display()))?;

        let path  = self.path_for(name);
        let bytes = encode(bundle)?;
        fs::write(&path, bytes)
            .with_context(|| format!("Cannot write artifact to '{}'", path.display()))?;

        tracing::debug!("Saved {} artifact to '{}'", bundle.kind(), path.display());
        Ok(path)
    }

    /// Read and decode a bundle.
    pub fn load(&self, name: &str) -> Result<ModelBundle, ArtifactError> {
        let path = self.path_for(name);
        let bytes = fs::read(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ArtifactError::NotFound(path.clone()),
            _ => ArtifactError::Io { path: path.clone(), source },
        })?;
        decode(&path, &bytes)
    }

    /// Read a bundle and rebuild the servable pipeline from it.
    /// A bundle whose parts disagree is reported as corrupt.
    pub fn load_pipeline(&self, name: &str) -> Result<Pipeline, ArtifactError> {
        let bundle = self.load(name)?;
        Pipeline::from_bundle(bundle).map_err(|e| ArtifactError::Corrupt {
            path:   self.path_for(name),
            reason: e.to_string(),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::StandardScaler;
    use crate::ml::bundle::{Evaluation, ModelParams, TrainingSummary};

    fn bundle() -> ModelBundle {
        ModelBundle {
            feature_names: vec!["x".into(), "y".into()],
            scaler: StandardScaler { mean: vec![1.0, 2.0], scale: vec![0.5, 4.0] },
            params: ModelParams::Linear { coefficients: vec![0.1, -0.2], intercept: 3.0 },
            summary: TrainingSummary {
                dataset:    "unit".into(),
                seed:       42,
                test_size:  0.2,
                n_train:    8,
                n_test:     2,
                evaluation: Evaluation::Regression { mse: 0.1, r2: 0.9 },
            },
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("model_dump"));

        let path = store.save("m.bin", &bundle()).unwrap();
        assert!(path.exists());
        assert_eq!(store.load("m.bin").unwrap(), bundle());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(store.load("absent.bin"), Err(ArtifactError::NotFound(_))));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(store.path_for("junk.bin"), b"definitely not a model").unwrap();
        assert!(matches!(store.load("junk.bin"), Err(ArtifactError::Corrupt { .. })));
    }

    #[test]
    fn test_truncated_payload_is_corrupt() {
        let bytes = encode(&bundle()).unwrap();
        let res   = decode(Path::new("t.bin"), &bytes[..bytes.len() - 5]);
        assert!(matches!(res, Err(ArtifactError::Corrupt { .. })));
    }

    #[test]
    fn test_other_version_is_incompatible() {
        let mut bytes = encode(&bundle()).unwrap();
        bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
        let res = decode(Path::new("v.bin"), &bytes);
        assert!(matches!(
            res,
            Err(ArtifactError::Incompatible { found: 99, expected: FORMAT_VERSION, .. })
        ));
    }

    #[test]
    fn test_load_pipeline_rejects_inconsistent_bundle() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let mut b = bundle();
        b.feature_names.push("z".into());
        store.save("bad.bin", &b).unwrap();
        assert!(matches!(store.load_pipeline("bad.bin"), Err(ArtifactError::Corrupt { .. })));
    }
}
