//! Model artifact retrieval by stable (bucket, path) identifier.

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use crate::{
    error::{PanelError, PanelResult},
    model::ModelBundle,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub path:   String,
}

impl ArtifactLocation {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self { bucket: bucket.into(), path: path.into() }
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.path)
    }
}

pub trait ArtifactStore {
    fn fetch(&self, location: &ArtifactLocation) -> PanelResult<Vec<u8>>;
}

/// Buckets are directories under `root`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, location: &ArtifactLocation) -> PanelResult<PathBuf> {
        let relative = Path::new(&location.bucket).join(&location.path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || location.bucket.is_empty() || location.path.is_empty() {
            return Err(PanelError::Validation(format!(
                "artifact location '{location}' is not a plain bucket/path"
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn fetch(&self, location: &ArtifactLocation) -> PanelResult<Vec<u8>> {
        let path = self.resolve(location)?;
        match std::fs::read(&path) {
            Ok(bytes) => {
                log::debug!("artifacts: read {} bytes from {location}", bytes.len());
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PanelError::not_found("artifact", location.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Fetch and decode a model bundle.
pub fn load_bundle(store: &dyn ArtifactStore, location: &ArtifactLocation) -> PanelResult<ModelBundle> {
    let bytes = store.fetch(location)?;
    let bundle = ModelBundle::from_slice(&bytes)?;
    log::info!(
        "artifacts: loaded model {location} version={} columns={}",
        bundle.version,
        bundle.columns.len()
    );
    Ok(bundle)
}
