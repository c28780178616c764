mod serde;

use rand::Rng;

use self::serde::RawMultiView;

use crate::{
    error::{DataError, Result},
    utils::randn,
    Float,
};

// MultiView is the basic container of all data in a dataset.
// It holds `views` modalities of the same `entities`, every entity
// carrying one feature record of `feature_shape` per view. The values
// live in a single row-major buffer laid out as [views, entities, features...],
// so row `j` of every view describes the same entity.
#[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
#[serde(try_from = "RawMultiView")]
pub struct MultiView {
    views: usize,
    entities: usize,
    feature_shape: Vec<usize>,

    pub w: Vec<Float>,
}

// Only for shapes already validated by `checked_len`.
fn feature_len(feature_shape: &[usize]) -> usize {
    feature_shape.iter().product()
}

// Product of `dims`, or an error when it does not fit in `usize`.
fn checked_len(dims: impl IntoIterator<Item = usize>) -> Result<usize> {
    dims.into_iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(d))
        .ok_or_else(|| DataError::InvalidShape("shape size overflows usize".to_string()))
}

impl MultiView {
    pub fn from_raw(
        views: usize,
        entities: usize,
        feature_shape: Vec<usize>,
        w: Vec<Float>,
    ) -> Result<Self> {
        // the feature record alone must fit, even when views or entities are 0
        let row_len = checked_len(feature_shape.iter().copied())?;
        let n = checked_len([views, entities, row_len])?;
        if w.len() != n {
            return Err(DataError::InvalidShape(format!(
                "buffer of {} values does not match shape [{views}, {entities}, {:?}]",
                w.len(),
                feature_shape
            )));
        }

        Ok(Self {
            views,
            entities,
            feature_shape,
            w,
        })
    }

    pub fn with_constant(
        views: usize,
        entities: usize,
        feature_shape: &[usize],
        constant: Float,
    ) -> Self {
        let n = views * entities * feature_len(feature_shape);
        Self {
            views,
            entities,
            feature_shape: feature_shape.to_vec(),
            w: vec![constant; n],
        }
    }

    pub fn zeros(views: usize, entities: usize, feature_shape: &[usize]) -> Self {
        Self::with_constant(views, entities, feature_shape, 0.0)
    }

    /// Fills every feature with a sample of `N(0, 1)`.
    pub fn random_normal<R: Rng + ?Sized>(
        views: usize,
        entities: usize,
        feature_shape: &[usize],
        rng: &mut R,
    ) -> Self {
        let mut tensor = Self::zeros(views, entities, feature_shape);
        for w in tensor.w.iter_mut() {
            *w = randn(0.0, 1.0, rng);
        }
        tensor
    }

    /// Stacks per-view buffers into one tensor.
    ///
    /// Each buffer holds the entities of one view back to back, every entity
    /// contributing `feature_shape.iter().product()` values. All views must
    /// describe the same number of entities. An empty list of views gives a
    /// tensor without entities.
    pub fn stack(feature_shape: &[usize], views: &[Vec<Float>]) -> Result<Self> {
        let row_len = checked_len(feature_shape.iter().copied())?;
        let Some(first) = views.first() else {
            return Ok(Self::zeros(0, 0, feature_shape));
        };

        if row_len == 0 {
            return Err(DataError::InvalidShape(format!(
                "cannot infer entity count from empty feature shape {feature_shape:?}"
            )));
        }
        if first.len() % row_len != 0 {
            return Err(DataError::InvalidShape(format!(
                "view 0 holds {} values, not a multiple of the feature size {row_len}",
                first.len()
            )));
        }

        let entities = first.len() / row_len;
        let mut w = Vec::with_capacity(views.len() * first.len());
        for view in views {
            if view.len() != first.len() {
                return Err(DataError::ShapeMismatch {
                    expected: entities,
                    actual: view.len() / row_len,
                });
            }
            w.extend_from_slice(view);
        }

        Ok(Self {
            views: views.len(),
            entities,
            feature_shape: feature_shape.to_vec(),
            w,
        })
    }

    pub fn views(&self) -> usize {
        self.views
    }
    pub fn entities(&self) -> usize {
        self.entities
    }
    pub fn feature_shape(&self) -> &[usize] {
        &self.feature_shape
    }

    /// Number of values in one entity's feature record.
    pub fn row_len(&self) -> usize {
        feature_len(&self.feature_shape)
    }

    /// Number of values in one view.
    pub fn view_len(&self) -> usize {
        self.entities * self.row_len()
    }

    pub fn view(&self, v: usize) -> &[Float] {
        let n = self.view_len();
        &self.w[v * n..(v + 1) * n]
    }

    pub fn view_mut(&mut self, v: usize) -> &mut [Float] {
        let n = self.view_len();
        &mut self.w[v * n..(v + 1) * n]
    }

    fn get_index(&self, v: usize, e: usize) -> usize {
        (v * self.entities + e) * self.row_len()
    }

    pub fn row(&self, v: usize, e: usize) -> &[Float] {
        let index = self.get_index(v, e);
        &self.w[index..index + self.row_len()]
    }

    pub fn row_mut(&mut self, v: usize, e: usize) -> &mut [Float] {
        let index = self.get_index(v, e);
        let n = self.row_len();
        &mut self.w[index..index + n]
    }

    // Gathers entities along the entity axis, the same way for every view.
    // `indices` must be in range; duplicates are allowed.
    pub(crate) fn take_entities(&self, indices: &[usize]) -> Self {
        let row_len = self.row_len();
        let mut w = Vec::with_capacity(self.views * indices.len() * row_len);
        for v in 0..self.views {
            for &e in indices {
                debug_assert!(e < self.entities);
                w.extend_from_slice(self.row(v, e));
            }
        }

        Self {
            views: self.views,
            entities: indices.len(),
            feature_shape: self.feature_shape.clone(),
            w,
        }
    }

    /// Positional selection along the entity axis.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.entities) {
            return Err(DataError::IndexOutOfRange {
                index,
                len: self.entities,
            });
        }
        Ok(self.take_entities(indices))
    }
}
