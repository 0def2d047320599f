use std::sync::Arc;

use async_trait::async_trait;
use ndarray::Array1;
use tracing::warn;

use crate::config::EscalationPolicy;
use crate::error::{EmbeddingError, FallbackError, PredictError};
use crate::manager::ModelManager;
use crate::model::decision::DecisionResult;

/// Turns text into a fixed-width embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Batched variant used by the offline artifact builder.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Free-text intent guess from a large model, consulted only on escalation.
#[async_trait]
pub trait FallbackModel: Send + Sync {
    async fn llm_fallback(&self, text: &str) -> Result<String, FallbackError>;
}

/// The hybrid decision engine.
///
/// Fuses two independent uncertainty signals, the classifier's own confidence
/// and the distance from the query to the nearest training example, and
/// escalates to the fallback model when either says the fast path cannot be
/// trusted.
pub struct IntentPipeline {
    manager: ModelManager,
    embedder: Arc<dyn Embedder>,
    fallback: Arc<dyn FallbackModel>,
    policy: EscalationPolicy,
}

impl IntentPipeline {
    pub fn new(
        manager: ModelManager,
        embedder: Arc<dyn Embedder>,
        fallback: Arc<dyn FallbackModel>,
        policy: EscalationPolicy,
    ) -> Self {
        Self {
            manager,
            embedder,
            fallback,
            policy,
        }
    }

    /// Classify one query. Empty text is a valid, low-information query and
    /// still produces a best-effort result.
    pub async fn predict(&self, text: &str) -> Result<DecisionResult, PredictError> {
        let models = self.manager.ensure_loaded().await?;

        let embedding = Array1::from(self.embedder.embed_query(text).await?);

        let (class_id, clf_confidence) = models.classifier.predict(embedding.view());
        let clf_intent = models.labels.decode(class_id)?.to_string();

        let retrieval_distance = models
            .index
            .nearest(embedding.view())
            .map_or(f32::INFINITY, |(_, distance)| distance);
        // The retrieval signal reports the classifier's own label; the
        // nearest neighbor's identity stays internal to the index.
        let retrieval_intent = clf_intent.clone();

        let fallback_used = clf_confidence < self.policy.clf_threshold
            || retrieval_distance > self.policy.retrieval_threshold;

        let intent = if fallback_used {
            let raw = self.fallback.llm_fallback(text).await?;
            let label = raw.trim().to_string();
            if !models.labels.contains(&label) {
                warn!(%label, "fallback model returned a label outside the trained vocabulary");
            }
            label
        } else {
            clf_intent.clone()
        };

        Ok(DecisionResult {
            text: text.to_owned(),
            intent,
            clf_intent,
            clf_confidence,
            retrieval_intent,
            retrieval_distance,
            fallback_used,
        })
    }
}
