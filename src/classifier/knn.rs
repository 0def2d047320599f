use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Flat nearest-neighbor index over the training-example embeddings.
///
/// Brute-force squared-Euclidean scan, exact by construction. The corpus is
/// low-thousands of rows, so a full scan stays sub-millisecond. Only vectors
/// are stored; labels live in the codec artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    vectors: Array2<f32>,
    corpus_id: String,
}

impl FlatIndex {
    pub fn new(vectors: Array2<f32>, corpus_id: impl Into<String>) -> Self {
        Self {
            vectors,
            corpus_id: corpus_id.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.nrows() == 0
    }

    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn corpus_id(&self) -> &str {
        &self.corpus_id
    }

    /// Row index and squared-L2 distance of the nearest stored vector.
    pub fn nearest(&self, query: ArrayView1<f32>) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (row, vector) in self.vectors.rows().into_iter().enumerate() {
            let distance: f32 = vector
                .iter()
                .zip(query.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            match best {
                Some((_, current)) if current <= distance => {}
                _ => best = Some((row, distance)),
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn nearest_returns_exact_row_and_squared_distance() {
        let index = FlatIndex::new(
            array![[0.0, 0.0], [3.0, 4.0], [1.0, 1.0]],
            "corpus-test",
        );
        let (row, distance) = index.nearest(array![1.0, 0.0].view()).unwrap();
        assert_eq!(row, 0);
        assert!((distance - 1.0).abs() < 1e-6);

        let (row, distance) = index.nearest(array![3.0, 3.0].view()).unwrap();
        assert_eq!(row, 1);
        assert!((distance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_index_has_no_neighbor() {
        let index = FlatIndex::new(Array2::zeros((0, 8)), "corpus-test");
        assert!(index.is_empty());
        assert!(index.nearest(ndarray::Array1::zeros(8).view()).is_none());
    }

    #[test]
    fn identical_vector_is_at_distance_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        let stored: Vec<f32> = (0..16).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let index = FlatIndex::new(
            Array2::from_shape_vec((1, 16), stored.clone()).unwrap(),
            "corpus-test",
        );
        let query = ndarray::Array1::from(stored);
        let (row, distance) = index.nearest(query.view()).unwrap();
        assert_eq!(row, 0);
        assert!(distance.abs() < 1e-6);
    }
}
