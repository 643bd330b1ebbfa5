use std::cmp::Ordering;

use num::Num;

use crate::vectorizer::sparse::SparseVec;

/// dot積
/// d(a, b) = Σ(a_i * b_i)
///
/// Both iterators must yield indices in ascending order.
pub fn dot<N>(vec: impl Iterator<Item = (usize, N)>, other: impl Iterator<Item = (usize, N)>) -> f64
where
    N: Num + Copy + Into<f64>,
{
    let mut a_it = vec.fuse();
    let mut b_it = other.fuse();
    let mut a_next = a_it.next();
    let mut b_next = b_it.next();
    let mut dot = 0_f64;
    while let (Some((ia, va)), Some((ib, vb))) = (a_next, b_next) {
        match ia.cmp(&ib) {
            Ordering::Equal => {
                dot += va.into() * vb.into();
                a_next = a_it.next();
                b_next = b_it.next();
            }
            Ordering::Less => a_next = a_it.next(),
            Ordering::Greater => b_next = b_it.next(),
        }
    }
    dot
}

/// L2 norm
/// ||a|| = sqrt(Σ(a_i^2))
pub fn norm<N>(vec: impl Iterator<Item = (usize, N)>) -> f64
where
    N: Num + Copy + Into<f64>,
{
    vec.map(|(_, v)| {
        let v: f64 = v.into();
        v * v
    })
    .sum::<f64>()
    .sqrt()
}

/// コサイン類似度
/// cos(θ) = Σ(a_i * b_i) / (||a|| * ||b||)
///
/// Merges two index-sorted sparse streams in a single pass.
/// An empty or all-zero side gives 0.0; the result is clamped to [-1, 1].
pub fn cosine_similarity<N>(vec: impl Iterator<Item = (usize, N)>, other: impl Iterator<Item = (usize, N)>) -> f64
where
    N: Num + Copy + Into<f64>,
{
    let mut a_it = vec.fuse();
    let mut b_it = other.fuse();
    let mut a_next = a_it.next();
    let mut b_next = b_it.next();
    let mut norm_a = 0_f64;
    let mut norm_b = 0_f64;
    let mut dot = 0_f64;
    while let (Some((ia, va)), Some((ib, vb))) = (a_next, b_next) {
        let (fa, fb): (f64, f64) = (va.into(), vb.into());
        match ia.cmp(&ib) {
            Ordering::Equal => {
                norm_a += fa * fa;
                norm_b += fb * fb;
                dot += fa * fb;
                a_next = a_it.next();
                b_next = b_it.next();
            }
            Ordering::Less => {
                norm_a += fa * fa;
                a_next = a_it.next();
            }
            Ordering::Greater => {
                norm_b += fb * fb;
                b_next = b_it.next();
            }
        }
    }
    // tails only add to the norms
    while let Some((_, va)) = a_next {
        let fa: f64 = va.into();
        norm_a += fa * fa;
        a_next = a_it.next();
    }
    while let Some((_, vb)) = b_next {
        let fb: f64 = vb.into();
        norm_b += fb * fb;
        b_next = b_it.next();
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
    }
}

impl<N> SparseVec<N>
where
    N: Num + Copy + Into<f64>,
{
    /// Cosine similarity against another sparse vector
    #[inline]
    pub fn cosine(&self, other: &SparseVec<N>) -> f64 {
        cosine_similarity(self.iter(), other.iter())
    }

    #[inline]
    pub fn dot(&self, other: &SparseVec<N>) -> f64 {
        dot(self.iter(), other.iter())
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        norm(self.iter())
    }
}
