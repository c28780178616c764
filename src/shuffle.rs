use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rayon::prelude::*;

use crate::{
    error::{DataError, Result},
    labels::{LabelRuns, Labels},
    tensor::MultiView,
    utils::randperm,
    Float,
};

/// Label-stratified two stage shuffle of a multi-view dataset.
///
/// The entities are first sorted by label and, for every view on its own,
/// permuted within each run of equal labels. Inside a class the rows of the
/// different views therefore no longer describe the same entity, while no
/// row ever leaves its class. A single permutation of the whole dataset is
/// then applied to every view and to the labels alike.
///
/// Every view draws its within-class permutation from its own generator,
/// seeded from the caller's generator up front, so a seeded run gives the
/// same result whether the views are processed in parallel or not.
#[derive(Debug, Clone, Copy, Default)]
pub struct StratifiedShuffler {
    parallel: bool,
}

impl StratifiedShuffler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process the views of the within-class stage on the rayon pool.
    pub fn parallel(mut self, value: bool) -> Self {
        self.parallel = value;
        self
    }

    pub fn shuffle<R: Rng + ?Sized>(
        &self,
        x: &MultiView,
        y: &Labels,
        rng: &mut R,
    ) -> Result<(MultiView, Labels)> {
        if x.entities() != y.len() {
            return Err(DataError::ShapeMismatch {
                expected: x.entities(),
                actual: y.len(),
            });
        }

        let (order, runs) = y.sorted_runs();
        debug!(
            "shuffling {} entities of {} views within {} label runs",
            y.len(),
            x.views(),
            runs.len()
        );

        let x_sorted = x.take_entities(&order);
        let y_sorted = y.take(&order);
        let x_grouped = self.shuffle_within_runs(&x_sorted, &runs, rng);

        let perm = randperm(y.len(), rng);
        Ok((x_grouped.take_entities(&perm), y_sorted.take(&perm)))
    }

    // x must already be sorted by label, `runs` being its label runs.
    fn shuffle_within_runs<R: Rng + ?Sized>(
        &self,
        x: &MultiView,
        runs: &LabelRuns,
        rng: &mut R,
    ) -> MultiView {
        let seeds: Vec<u64> = (0..x.views()).map(|_| rng.gen()).collect();

        let mut out = x.clone();
        let view_len = x.view_len();
        if view_len == 0 {
            return out;
        }

        let row_len = x.row_len();
        let permute_view = |(v, (dst, seed)): (usize, (&mut [Float], &u64))| {
            let mut view_rng = StdRng::seed_from_u64(*seed);
            let perm = run_local_permutation(runs, &mut view_rng);
            let src = x.view(v);
            for (j, &k) in perm.iter().enumerate() {
                dst[j * row_len..(j + 1) * row_len]
                    .copy_from_slice(&src[k * row_len..(k + 1) * row_len]);
            }
        };

        if self.parallel {
            out.w
                .par_chunks_mut(view_len)
                .zip(seeds.par_iter())
                .enumerate()
                .for_each(permute_view);
        } else {
            out.w
                .chunks_mut(view_len)
                .zip(seeds.iter())
                .enumerate()
                .for_each(permute_view);
        }

        out
    }
}

/// Shuffles with a default [`StratifiedShuffler`].
pub fn shuffle_stratified<R: Rng + ?Sized>(
    x: &MultiView,
    y: &Labels,
    rng: &mut R,
) -> Result<(MultiView, Labels)> {
    StratifiedShuffler::new().shuffle(x, y, rng)
}

// Index buffer that permutes every run independently and leaves
// the runs themselves in place.
fn run_local_permutation<R: Rng + ?Sized>(runs: &LabelRuns, rng: &mut R) -> Vec<usize> {
    let n = runs.bounds().last().copied().unwrap_or(0);
    let mut perm: Vec<usize> = (0..n).collect();
    for (start, end) in runs.iter() {
        perm[start..end].shuffle(rng);
    }
    perm
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::{error::DataError, labels::Labels, tensor::MultiView, ClassId, Float};

    use super::{run_local_permutation, shuffle_stratified, StratifiedShuffler};

    // every feature encodes `label * 100 + entity`, the same in every view
    fn tagged(views: usize, labels: &[ClassId]) -> (MultiView, Labels) {
        let view: Vec<Float> = labels
            .iter()
            .enumerate()
            .map(|(e, &l)| (l * 100) as Float + e as Float)
            .collect();
        let x = MultiView::stack(&[1], &vec![view; views]).unwrap();
        (x, Labels::from(labels.to_vec()))
    }

    fn label_of(value: Float) -> ClassId {
        (value / 100.0).floor() as ClassId
    }

    fn sorted(values: &[Float]) -> Vec<Float> {
        let mut values = values.to_vec();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values
    }

    #[test]
    fn two_views_two_classes() {
        let (x, y) = tagged(2, &[0, 0, 0, 1, 1, 1]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (xs, ys) = shuffle_stratified(&x, &y, &mut rng).unwrap();

            let mut labels = ys.as_slice().to_vec();
            labels.sort_unstable();
            assert_eq!(labels, vec![0, 0, 0, 1, 1, 1]);

            assert_eq!(xs.views(), 2);
            assert_eq!(xs.entities(), 6);
            for v in 0..2 {
                for p in 0..6 {
                    assert_eq!(label_of(xs.row(v, p)[0]), ys.as_slice()[p]);
                }
            }
        }
    }

    #[test]
    fn global_shuffle_mixes_classes() {
        let (x, y) = tagged(2, &[0, 0, 0, 1, 1, 1]);
        let mut unsorted = 0;
        let mut orders = Vec::new();
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (_, ys) = shuffle_stratified(&x, &y, &mut rng).unwrap();
            if ys.as_slice().windows(2).any(|w| w[0] > w[1]) {
                unsorted += 1;
            }
            if !orders.contains(&ys) {
                orders.push(ys);
            }
        }
        // without the final permutation every output would be [0, 0, 0, 1, 1, 1]
        assert!(unsorted > 0);
        assert!(orders.len() > 1);
    }

    #[test]
    fn keeps_rows_of_every_view() {
        let labels = [3, 1, 2, 1, 3, 3, 0, 2, 1, 1];
        let (x, y) = tagged(3, &labels);
        let mut rng = StdRng::seed_from_u64(11);
        let (xs, ys) = shuffle_stratified(&x, &y, &mut rng).unwrap();

        assert_eq!(xs.feature_shape(), x.feature_shape());
        assert_eq!(ys.len(), y.len());
        for v in 0..3 {
            assert_eq!(sorted(xs.view(v)), sorted(x.view(v)));
            for p in 0..labels.len() {
                assert_eq!(label_of(xs.row(v, p)[0]), ys.as_slice()[p]);
            }
        }
    }

    #[test]
    fn views_are_scrambled_independently_within_a_class() {
        let (x, y) = tagged(2, &[5; 10]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (xs, _) = shuffle_stratified(&x, &y, &mut rng).unwrap();
            assert_ne!(xs.view(0), xs.view(1));
        }
    }

    #[test]
    fn within_runs_never_mixes_classes() {
        let (x, y) = tagged(4, &[0, 0, 0, 1, 1, 2, 2, 2, 2]);
        let (_, runs) = y.sorted_runs();
        let mut rng = StdRng::seed_from_u64(3);
        let grouped = StratifiedShuffler::new().shuffle_within_runs(&x, &runs, &mut rng);
        for v in 0..4 {
            for p in 0..9 {
                assert_eq!(label_of(grouped.row(v, p)[0]), y.as_slice()[p]);
            }
        }
    }

    #[test]
    fn run_local_permutation_stays_in_runs() {
        let y = Labels::from(vec![0, 0, 1, 1, 1, 1, 2]);
        let (_, runs) = y.sorted_runs();
        let mut rng = StdRng::seed_from_u64(5);
        let perm = run_local_permutation(&runs, &mut rng);
        assert_eq!(perm.len(), 7);
        for (start, end) in runs.iter() {
            let mut chunk = perm[start..end].to_vec();
            chunk.sort_unstable();
            assert_eq!(chunk, (start..end).collect::<Vec<_>>());
        }
    }

    #[test]
    fn same_seed_same_result() {
        let (x, y) = tagged(3, &[1, 0, 1, 0, 2, 2, 1, 0]);
        let a = shuffle_stratified(&x, &y, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = shuffle_stratified(&x, &y, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(21);
        let x = MultiView::random_normal(6, 40, &[2, 3], &mut rng);
        let y = Labels::from((0..40).map(|i| (i % 4) as ClassId).collect::<Vec<_>>());

        let sequential = StratifiedShuffler::new()
            .shuffle(&x, &y, &mut StdRng::seed_from_u64(4))
            .unwrap();
        let parallel = StratifiedShuffler::new()
            .parallel(true)
            .shuffle(&x, &y, &mut StdRng::seed_from_u64(4))
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn without_views_only_labels_move() {
        let x = MultiView::zeros(0, 5, &[3]);
        let y = Labels::from(vec![4, 3, 2, 1, 0]);
        let mut rng = StdRng::seed_from_u64(2);
        let (xs, ys) = shuffle_stratified(&x, &y, &mut rng).unwrap();
        assert_eq!(xs.views(), 0);
        assert_eq!(xs.entities(), 5);
        let mut labels = ys.into_inner();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn empty_dataset() {
        let x = MultiView::zeros(2, 0, &[3]);
        let y = Labels::default();
        let mut rng = StdRng::seed_from_u64(0);
        let (xs, ys) = shuffle_stratified(&x, &y, &mut rng).unwrap();
        assert_eq!(xs.entities(), 0);
        assert!(xs.w.is_empty());
        assert!(ys.is_empty());
    }

    #[test]
    fn mismatched_entities() {
        let (x, _) = tagged(2, &[0, 1, 2]);
        let y = Labels::from(vec![0, 1]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            shuffle_stratified(&x, &y, &mut rng),
            Err(DataError::ShapeMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }
}
