use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::PrepareConfig,
    error::{DataError, Result},
    filter::{FrequencyFilter, FrequentClasses},
    labels::Labels,
    shuffle::StratifiedShuffler,
    tensor::MultiView,
    ClassId, Float,
};

/// One entity as seen by every view.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<'a> {
    pub views: Vec<&'a [Float]>,
    pub label: ClassId,
}

/// A multi-view tensor with its labels, checked to describe the same
/// number of entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct MultiViewDataset {
    x: MultiView,
    y: Labels,
}

#[derive(Deserialize)]
struct RawDataset {
    x: MultiView,
    y: Labels,
}

impl TryFrom<RawDataset> for MultiViewDataset {
    type Error = DataError;

    fn try_from(raw: RawDataset) -> Result<Self> {
        Self::new(raw.x, raw.y)
    }
}

impl MultiViewDataset {
    pub fn new(x: MultiView, y: Labels) -> Result<Self> {
        if x.entities() != y.len() {
            return Err(DataError::ShapeMismatch {
                expected: x.entities(),
                actual: y.len(),
            });
        }
        Ok(Self { x, y })
    }

    /// Reads a dataset written by [`save`](Self::save): JSON when the
    /// path ends in `.json`, bincode otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let dataset: Self = if is_json(path) {
            serde_json::from_reader(reader)?
        } else {
            bincode::deserialize_from(reader)?
        };

        info!(
            "loaded {} entities of {} views from {}",
            dataset.len(),
            dataset.num_views(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        if is_json(path) {
            serde_json::to_writer(writer, self)?;
        } else {
            bincode::serialize_into(writer, self)?;
        }
        Ok(())
    }

    pub fn x(&self) -> &MultiView {
        &self.x
    }
    pub fn y(&self) -> &Labels {
        &self.y
    }

    pub fn into_parts(self) -> (MultiView, Labels) {
        (self.x, self.y)
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn num_views(&self) -> usize {
        self.x.views()
    }

    pub fn entity(&self, index: usize) -> Option<Entity<'_>> {
        let label = self.y.get(index)?;
        let views = (0..self.x.views()).map(|v| self.x.row(v, index)).collect();
        Some(Entity { views, label })
    }

    pub fn shuffle<R: Rng + ?Sized>(
        &mut self,
        shuffler: &StratifiedShuffler,
        rng: &mut R,
    ) -> Result<()> {
        let (x, y) = shuffler.shuffle(&self.x, &self.y, rng)?;
        self.x = x;
        self.y = y;
        Ok(())
    }

    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        Ok(Self {
            x: self.x.select(indices)?,
            y: self.y.select(indices)?,
        })
    }

    /// Drops the entities of infrequent or excluded classes.
    pub fn retain_frequent(&mut self, filter: &FrequencyFilter) -> FrequentClasses {
        let frequent = filter.apply(&self.y);
        self.x = self.x.take_entities(&frequent.indices);
        self.y = self.y.take(&frequent.indices);
        frequent
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Filters, then shuffles, a dataset as configured. Returns the frequent
/// classes when a filter is configured.
pub fn prepare<R: Rng + ?Sized>(
    dataset: &mut MultiViewDataset,
    config: &PrepareConfig,
    rng: &mut R,
) -> Result<Option<FrequentClasses>> {
    let frequent = config
        .filter
        .as_ref()
        .map(|filter| dataset.retain_frequent(filter));

    if config.shuffle {
        let shuffler = StratifiedShuffler::new().parallel(config.parallel);
        dataset.shuffle(&shuffler, rng)?;
    }

    Ok(frequent)
}
