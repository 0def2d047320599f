use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// One-vs-rest logistic regression over embedding vectors.
///
/// Holds the fitted weights only; fitting happens offline and the rows arrive
/// through the artifact builder. `class_ids[row]` maps each weight row to the
/// class id the label codec understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    coef: Array2<f32>,
    intercept: Array1<f32>,
    class_ids: Vec<usize>,
    corpus_id: String,
}

impl LinearClassifier {
    pub fn new(
        coef: Array2<f32>,
        intercept: Array1<f32>,
        class_ids: Vec<usize>,
        corpus_id: impl Into<String>,
    ) -> Self {
        Self {
            coef,
            intercept,
            class_ids,
            corpus_id: corpus_id.into(),
        }
    }

    pub fn n_classes(&self) -> usize {
        self.coef.nrows()
    }

    pub fn dim(&self) -> usize {
        self.coef.ncols()
    }

    pub fn class_ids(&self) -> &[usize] {
        &self.class_ids
    }

    pub fn intercept_len(&self) -> usize {
        self.intercept.len()
    }

    pub fn corpus_id(&self) -> &str {
        &self.corpus_id
    }

    /// Raw per-class scores, one per weight row.
    pub fn decision_function(&self, x: ArrayView1<f32>) -> Array1<f32> {
        self.coef.dot(&x) + &self.intercept
    }

    /// Probability distribution over the weight rows: per-class sigmoid,
    /// normalized to sum to 1 (the one-vs-rest scheme liblinear uses).
    pub fn predict_proba(&self, x: ArrayView1<f32>) -> Array1<f32> {
        let mut scores = self.decision_function(x);
        scores.mapv_inplace(sigmoid);
        let total: f32 = scores.sum();
        if total > 0.0 {
            scores.mapv_inplace(|p| p / total);
        }
        scores
    }

    /// Arg-max class id and its probability.
    pub fn predict(&self, x: ArrayView1<f32>) -> (usize, f32) {
        let proba = self.predict_proba(x);
        let (row, confidence) = argmax(proba.view()).unwrap_or((0, 0.0));
        let class_id = self.class_ids.get(row).copied().unwrap_or(row);
        (class_id, confidence)
    }
}

fn sigmoid(score: f32) -> f32 {
    1.0 / (1.0 + (-score).exp())
}

fn argmax(values: ArrayView1<f32>) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}
