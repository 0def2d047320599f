use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Bijection between class ids and intent label strings.
///
/// Class ids are row positions in the sorted class list, so the mapping is
/// stable for one fitted vocabulary and meaningless across model generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelCodec {
    classes: Vec<String>,
}

impl LabelCodec {
    /// Fit the codec on training labels. Duplicates collapse, classes sort.
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = labels.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn decode(&self, class_id: usize) -> Result<&str, CodecError> {
        self.classes
            .get(class_id)
            .map(String::as_str)
            .ok_or(CodecError::UnknownClassId(class_id))
    }

    pub fn encode(&self, label: &str) -> Result<usize, CodecError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| CodecError::UnknownLabel(label.to_string()))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.encode(label).is_ok()
    }
}
