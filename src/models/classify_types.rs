use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// Top-K predictions for one image, highest confidence first.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct PredictionSet(Vec<Prediction>);

impl PredictionSet {
    /// Wraps predictions that are already ranked and truncated.
    pub(crate) fn from_ranked(predictions: Vec<Prediction>) -> Self {
        debug_assert!(predictions
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
        Self(predictions)
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.0
    }

    pub fn top(&self) -> Option<&Prediction> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.0.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.0.iter().map(|p| p.label.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a PredictionSet {
    type Item = &'a Prediction;
    type IntoIter = std::slice::Iter<'a, Prediction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
