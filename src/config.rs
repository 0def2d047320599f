use std::path::PathBuf;

use anyhow::{Context, Result};

/// Thresholds for the escalation policy. Both depend on the embedding model
/// and distance metric, so deployments tune them per environment.
#[derive(Debug, Clone, Copy)]
pub struct EscalationPolicy {
    /// Minimum classifier confidence before the fallback model is consulted.
    pub clf_threshold: f32,
    /// Maximum nearest-neighbor distance before the fallback model is consulted.
    pub retrieval_threshold: f32,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            clf_threshold: 0.60,
            retrieval_threshold: 1.2,
        }
    }
}

impl EscalationPolicy {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            clf_threshold: env_f32("CLF_THRESHOLD").unwrap_or(defaults.clf_threshold),
            retrieval_threshold: env_f32("RETRIEVAL_THRESHOLD")
                .unwrap_or(defaults.retrieval_threshold),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment: String,
    pub dimensions: usize,
}

impl EmbeddingSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: require("EMB_MODEL_DEPLOY_TARGET_URI")?,
            api_key: require("EMB_MODEL_DEPLOY_KEY")?,
            api_version: require("AZURE_OPENAI_APIVERSION")?,
            deployment: require("EMB_MODEL")?,
            dimensions: require("EMB_DIM")?
                .parse()
                .context("EMB_DIM is not a valid dimension")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment: String,
}

impl ChatSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: require("CHAT_ENDPOINT_URI")?,
            api_key: require("CHAT_ENDPOINT_KEY")?,
            api_version: require("AZURE_OPENAI_APIVERSION")?,
            deployment: require("CHAT_MODEL")?,
        })
    }
}

/// Where the three model artifacts live on disk.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub classifier: PathBuf,
    pub labels: PathBuf,
    pub index: PathBuf,
}

impl ArtifactPaths {
    pub fn from_env() -> Self {
        Self {
            classifier: env_path("CLASSIFIER_PATH", "model/artifacts/classifier.bin"),
            labels: env_path("LABELS_PATH", "model/artifacts/labels.bin"),
            index: env_path("INDEX_PATH", "data/vector_db/index.bin"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub policy: EscalationPolicy,
    pub embedding: EmbeddingSettings,
    pub chat: ChatSettings,
    pub artifacts: ArtifactPaths,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: dotenvy::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            policy: EscalationPolicy::from_env(),
            embedding: EmbeddingSettings::from_env()?,
            chat: ChatSettings::from_env()?,
            artifacts: ArtifactPaths::from_env(),
        })
    }
}

fn require(key: &str) -> Result<String> {
    dotenvy::var(key).with_context(|| format!("missing required env var {key}"))
}

fn env_f32(key: &str) -> Option<f32> {
    dotenvy::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_path(key: &str, default: &str) -> PathBuf {
    dotenvy::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
