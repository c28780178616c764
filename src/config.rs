use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::Result, filter::FrequencyFilter, ClassId};

/// How [`prepare`](crate::prepare) turns a loaded dataset into a training set.
///
/// Every field may be left out of the JSON file. An explicit `"filter": null`
/// keeps all classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    pub filter: Option<FrequencyFilter>,
    pub shuffle: bool,
    pub parallel: bool,
    /// Seed for the `mvprep` binary's generator. [`prepare`](crate::prepare)
    /// takes its generator from the caller and does not read it.
    pub seed: Option<u64>,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            filter: Some(FrequencyFilter::default()),
            shuffle: true,
            parallel: false,
            seed: None,
        }
    }
}

impl PrepareConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Applies a threshold and extra exclusions on top of the configured
    /// filter. A filter switched off is switched back on, starting from the
    /// default threshold and no exclusions.
    pub fn override_filter(&mut self, min_count: Option<usize>, exclude: &[ClassId]) {
        if min_count.is_none() && exclude.is_empty() {
            return;
        }

        let filter = self
            .filter
            .get_or_insert_with(|| FrequencyFilter::new(FrequencyFilter::default().min_count));
        if let Some(min_count) = min_count {
            filter.min_count = min_count;
        }
        filter.excluded.extend(exclude.iter().copied());
    }
}
