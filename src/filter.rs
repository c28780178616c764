use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{labels::Labels, ClassId};

/// Occurrence count of every class id, ascending by class id.
pub type FrequencyTable = BTreeMap<ClassId, usize>;

pub fn frequency_table(y: &Labels) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    for label in y.iter() {
        *table.entry(label).or_insert(0) += 1;
    }
    table
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequentClasses {
    /// Positions whose label is frequent, ascending.
    pub indices: Vec<usize>,
    /// Frequent class ids, ascending.
    pub classes: Vec<ClassId>,
}

/// Keeps the classes seen at least `min_count` times that are not in
/// `excluded`, together with the positions of their entities.
pub fn frequent_indices(
    y: &Labels,
    min_count: usize,
    excluded: &BTreeSet<ClassId>,
) -> FrequentClasses {
    let table = frequency_table(y);

    let classes: Vec<ClassId> = table
        .iter()
        .filter(|&(class, &count)| count >= min_count && !excluded.contains(class))
        .map(|(&class, _)| class)
        .collect();
    debug!(
        "{} of {} classes reach {min_count} entities",
        classes.len(),
        table.len()
    );

    let frequent: BTreeSet<ClassId> = classes.iter().copied().collect();
    let indices: Vec<usize> = y
        .iter()
        .enumerate()
        .filter(|(_, label)| frequent.contains(label))
        .map(|(i, _)| i)
        .collect();

    info!(
        "kept {} of {} entities in {} frequent classes",
        indices.len(),
        y.len(),
        classes.len()
    );

    FrequentClasses { indices, classes }
}

/// Threshold and exclusions of [`frequent_indices`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyFilter {
    pub min_count: usize,
    pub excluded: BTreeSet<ClassId>,
}

impl Default for FrequencyFilter {
    // class 15 holds the ill-defined conditions
    fn default() -> Self {
        Self {
            min_count: 40,
            excluded: BTreeSet::from([15]),
        }
    }
}

impl FrequencyFilter {
    pub fn new(min_count: usize) -> Self {
        Self {
            min_count,
            excluded: BTreeSet::new(),
        }
    }

    pub fn exclude(mut self, class: ClassId) -> Self {
        self.excluded.insert(class);
        self
    }

    pub fn apply(&self, y: &Labels) -> FrequentClasses {
        frequent_indices(y, self.min_count, &self.excluded)
    }
}
