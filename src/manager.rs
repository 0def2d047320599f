use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::info;

use crate::classifier::knn::FlatIndex;
use crate::classifier::labels::LabelCodec;
use crate::classifier::linear::LinearClassifier;
use crate::config::ArtifactPaths;
use crate::error::{ArtifactKind, ModelLoadError};

/// The three artifacts a prediction needs, loaded together and shared
/// read-only for the rest of the process lifetime.
pub struct ModelSet {
    pub classifier: LinearClassifier,
    pub labels: LabelCodec,
    pub index: FlatIndex,
}

impl ModelSet {
    /// Cross-artifact consistency checks. A failure here means the artifact
    /// files were not produced by one builder run.
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.classifier.n_classes() == 0
            || self.classifier.class_ids().len() != self.classifier.n_classes()
            || self.classifier.intercept_len() != self.classifier.n_classes()
        {
            return Err(ModelLoadError::Malformed {
                artifact: ArtifactKind::Classifier,
                reason: format!(
                    "{} weight rows, {} class ids, {} intercepts",
                    self.classifier.n_classes(),
                    self.classifier.class_ids().len(),
                    self.classifier.intercept_len()
                ),
            });
        }

        let mut class_ids = self.classifier.class_ids().to_vec();
        class_ids.sort_unstable();
        class_ids.dedup();
        let codec_ids: Vec<usize> = (0..self.labels.len()).collect();
        if class_ids != codec_ids {
            return Err(ModelLoadError::VocabularyMismatch {
                classifier_classes: self.classifier.n_classes(),
                codec_classes: self.labels.len(),
            });
        }

        if self.index.is_empty() {
            return Err(ModelLoadError::EmptyIndex);
        }

        if self.classifier.dim() != self.index.dim() {
            return Err(ModelLoadError::DimensionMismatch {
                classifier_dim: self.classifier.dim(),
                index_dim: self.index.dim(),
            });
        }

        if self.classifier.corpus_id() != self.index.corpus_id() {
            return Err(ModelLoadError::CorpusMismatch {
                classifier_corpus: self.classifier.corpus_id().to_string(),
                index_corpus: self.index.corpus_id().to_string(),
            });
        }

        Ok(())
    }
}

/// Owns the lazily loaded artifact triple.
///
/// The first `ensure_loaded` call performs the whole load; concurrent first
/// callers wait on the same initialization and observe either a fully loaded
/// set or the load error, never a partial state. After success the load never
/// re-runs.
pub struct ModelManager {
    paths: ArtifactPaths,
    cell: OnceCell<Arc<ModelSet>>,
}

impl ModelManager {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            cell: OnceCell::new(),
        }
    }

    pub async fn ensure_loaded(&self) -> Result<Arc<ModelSet>, ModelLoadError> {
        let set = self
            .cell
            .get_or_try_init(|| async {
                let set = load_model_set(&self.paths)?;
                info!(
                    classes = set.labels.len(),
                    examples = set.index.len(),
                    dim = set.index.dim(),
                    corpus = %set.index.corpus_id(),
                    "model artifacts loaded"
                );
                Ok(Arc::new(set))
            })
            .await?;
        Ok(Arc::clone(set))
    }
}

#[cfg(test)]
impl ModelManager {
    /// Test constructor that skips disk entirely.
    pub(crate) fn preloaded(set: ModelSet) -> Self {
        Self {
            paths: ArtifactPaths {
                classifier: Default::default(),
                labels: Default::default(),
                index: Default::default(),
            },
            cell: OnceCell::new_with(Some(Arc::new(set))),
        }
    }
}

fn load_model_set(paths: &ArtifactPaths) -> Result<ModelSet, ModelLoadError> {
    let classifier = read_artifact(ArtifactKind::Classifier, &paths.classifier)?;
    let labels = read_artifact(ArtifactKind::Labels, &paths.labels)?;
    let index = read_artifact(ArtifactKind::Index, &paths.index)?;

    let set = ModelSet {
        classifier,
        labels,
        index,
    };
    set.validate()?;
    Ok(set)
}

pub fn read_artifact<T: DeserializeOwned>(
    artifact: ArtifactKind,
    path: &Path,
) -> Result<T, ModelLoadError> {
    let bytes = fs::read(path).map_err(|source| ModelLoadError::Io {
        artifact,
        path: path.to_path_buf(),
        source,
    })?;
    bincode::deserialize(&bytes).map_err(|source| ModelLoadError::Decode {
        artifact,
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_artifact<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = bincode::serialize(value)?;
    fs::write(path, bytes)?;
    Ok(())
}
