use serde::{Deserialize, Serialize};

use crate::{
    error::{DataError, Result},
    utils::argsort_stable,
    ClassId,
};

/// Class ids of the entities of a dataset, index aligned with the entity
/// axis of a [`MultiView`](crate::MultiView).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels {
    ids: Vec<ClassId>,
}

impl From<Vec<ClassId>> for Labels {
    fn from(ids: Vec<ClassId>) -> Self {
        Self { ids }
    }
}

impl From<&[ClassId]> for Labels {
    fn from(ids: &[ClassId]) -> Self {
        Self { ids: ids.to_vec() }
    }
}

impl Labels {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_slice(&self) -> &[ClassId] {
        &self.ids
    }

    pub fn into_inner(self) -> Vec<ClassId> {
        self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.ids.iter().copied()
    }

    pub fn get(&self, index: usize) -> Option<ClassId> {
        self.ids.get(index).copied()
    }

    pub(crate) fn take(&self, indices: &[usize]) -> Self {
        Self {
            ids: indices.iter().map(|&i| self.ids[i]).collect(),
        }
    }

    /// Positional selection, mirroring [`MultiView::select`](crate::MultiView::select).
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(DataError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(self.take(indices))
    }

    /// Sorts the labels, returning the stable sorting permutation together
    /// with the runs of equal labels in the sorted order.
    pub fn sorted_runs(&self) -> (Vec<usize>, LabelRuns) {
        let order = argsort_stable(&self.ids);
        let sorted: Vec<ClassId> = order.iter().map(|&i| self.ids[i]).collect();
        (order, LabelRuns::from_sorted(&sorted))
    }
}

/// Boundaries of the maximal runs of equal labels in a sorted label
/// sequence: the start of every run followed by the sequence length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRuns {
    bounds: Vec<usize>,
}

impl LabelRuns {
    pub fn from_sorted(sorted: &[ClassId]) -> Self {
        debug_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));

        let mut bounds = Vec::new();
        let mut current = None;
        for (i, &label) in sorted.iter().enumerate() {
            if current != Some(label) {
                current = Some(label);
                bounds.push(i);
            }
        }
        bounds.push(sorted.len());

        Self { bounds }
    }

    pub fn bounds(&self) -> &[usize] {
        &self.bounds
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.bounds.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(start, end)` of every run, in order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.bounds.windows(2).map(|w| (w[0], w[1]))
    }
}
