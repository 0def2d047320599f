use std::path::PathBuf;

use thiserror::Error;

/// Which of the three persisted artifacts an error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Classifier,
    Labels,
    Index,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Classifier => "classifier",
            ArtifactKind::Labels => "labels",
            ArtifactKind::Index => "index",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("{artifact} artifact unreadable at {}: {source}", .path.display())]
    Io {
        artifact: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{artifact} artifact at {} failed to decode: {source}", .path.display())]
    Decode {
        artifact: ArtifactKind,
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("classifier knows {classifier_classes} classes but label codec knows {codec_classes}")]
    VocabularyMismatch {
        classifier_classes: usize,
        codec_classes: usize,
    },

    #[error("classifier expects {classifier_dim}-dim embeddings, index holds {index_dim}-dim vectors")]
    DimensionMismatch {
        classifier_dim: usize,
        index_dim: usize,
    },

    #[error("classifier built from corpus {classifier_corpus} but index from corpus {index_corpus}")]
    CorpusMismatch {
        classifier_corpus: String,
        index_corpus: String,
    },

    #[error("{artifact} artifact is internally inconsistent: {reason}")]
    Malformed {
        artifact: ArtifactKind,
        reason: String,
    },

    #[error("index artifact contains no vectors")]
    EmptyIndex,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown class id {0}")]
    UnknownClassId(usize),

    #[error("unknown intent label '{0}'")]
    UnknownLabel(String),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("embedding response was missing vectors")]
    EmptyResponse,

    #[error("embedding endpoint returned {got}-dim vector, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("fallback request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fallback endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("fallback completion was empty")]
    EmptyCompletion,
}

/// Anything the decision pipeline can surface to the serving layer.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Load(#[from] ModelLoadError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Fallback(#[from] FallbackError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
