use rand::{seq::SliceRandom, Rng};
use rand_distr::{Distribution, StandardNormal};

use crate::Float;

pub fn gauss_random<R: Rng + ?Sized>(rng: &mut R) -> Float {
    StandardNormal.sample(rng)
}

pub fn randn<R: Rng + ?Sized>(mu: Float, std: Float, rng: &mut R) -> Float {
    mu + gauss_random(rng) * std
}

// uniform random permutation of 0..n
pub fn randperm<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..n).collect();
    perm.shuffle(rng);
    perm
}

// indices that sort `keys` ascending; equal keys keep their relative order.
pub fn argsort_stable<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by_key(|&i| &keys[i]);
    order
}
