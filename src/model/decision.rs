use serde::{Deserialize, Serialize};

/// Outcome of one classification, with full provenance of how the intent was
/// decided. Built once per query and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    /// The query text as received.
    pub text: String,
    /// Final intent served to the caller.
    pub intent: String,
    /// What the local classifier predicted.
    pub clf_intent: String,
    /// Maximum of the classifier's probability distribution.
    pub clf_confidence: f32,
    /// Label attached to the retrieval signal (the classifier's own label;
    /// the nearest neighbor's identity is not surfaced).
    pub retrieval_intent: String,
    /// Squared-L2 distance to the nearest training example.
    pub retrieval_distance: f32,
    /// Whether the fallback model produced the final intent.
    pub fallback_used: bool,
}
