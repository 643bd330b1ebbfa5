use std::fmt;

use num::Num;
use serde::{Deserialize, Serialize};

/// SparseVec is a sparse vector that omits zero elements.
/// It keeps `inds` (element indices) and `vals` (element values)
/// side by side.
///
/// Indices are kept unique and sorted in ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVec<N>
where
    N: Num + Copy,
{
    inds: Vec<u32>,
    vals: Vec<N>,
}

/// (dictionary index, count) for every lemma of one document
pub type BagOfWords = SparseVec<u32>;

/// (topic component, weight) produced by the LSI transform
pub type TopicVector = SparseVec<f64>;

impl<N> Default for SparseVec<N>
where
    N: Num + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> SparseVec<N>
where
    N: Num + Copy,
{
    #[inline]
    pub fn new() -> Self {
        SparseVec {
            inds: Vec::new(),
            vals: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        SparseVec {
            inds: Vec::with_capacity(cap),
            vals: Vec::with_capacity(cap),
        }
    }

    /// Append an element after the current last index
    ///
    /// Zero values are not stored.
    /// Returns `false` (and stores nothing) when `index` does not
    /// come after the last stored index.
    #[inline]
    pub fn push(&mut self, index: usize, value: N) -> bool {
        if let Some(&last) = self.inds.last() {
            if index as u64 <= last as u64 {
                return false;
            }
        }
        if value != N::zero() {
            self.inds.push(index as u32);
            self.vals.push(value);
        }
        true
    }

    /// Build from (index, value) pairs in any order.
    /// Values of repeated indices are summed.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, N)>,
    {
        let mut pairs: Vec<(usize, N)> = pairs.into_iter().collect();
        pairs.sort_by_key(|(idx, _)| *idx);
        let mut vec = SparseVec::with_capacity(pairs.len());
        let mut pending: Option<(usize, N)> = None;
        for (idx, val) in pairs {
            pending = match pending {
                Some((p_idx, p_val)) if p_idx == idx => Some((idx, p_val + val)),
                Some((p_idx, p_val)) => {
                    vec.push(p_idx, p_val);
                    Some((idx, val))
                }
                None => Some((idx, val)),
            };
        }
        if let Some((idx, val)) = pending {
            vec.push(idx, val);
        }
        vec
    }

    /// Number of stored (non-zero) elements
    #[inline]
    pub fn nnz(&self) -> usize {
        self.inds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inds.is_empty()
    }

    /// Value at `index`, zero when absent
    #[inline]
    pub fn get(&self, index: usize) -> N {
        match self.inds.binary_search(&(index as u32)) {
            Ok(pos) => self.vals[pos],
            Err(_) => N::zero(),
        }
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.inds
    }

    #[inline]
    pub fn values(&self) -> &[N] {
        &self.vals
    }

    /// Iterate stored elements as (index, &value)
    #[inline]
    pub fn raw_iter(&self) -> impl Iterator<Item = (usize, &N)> + '_ {
        self.inds.iter().map(|&i| i as usize).zip(self.vals.iter())
    }

    /// Iterate stored elements as (index, value)
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (usize, N)> + '_ {
        self.raw_iter().map(|(i, v)| (i, *v))
    }

    /// Stored elements as (index, value) pairs in ascending index order
    pub fn to_pairs(&self) -> Vec<(usize, N)> {
        self.iter().collect()
    }

    pub fn shrink_to_fit(&mut self) {
        self.inds.shrink_to_fit();
        self.vals.shrink_to_fit();
    }
}

impl<N> FromIterator<(usize, N)> for SparseVec<N>
where
    N: Num + Copy,
{
    fn from_iter<I: IntoIterator<Item = (usize, N)>>(iter: I) -> Self {
        SparseVec::from_pairs(iter)
    }
}

impl<N> fmt::Display for SparseVec<N>
where
    N: Num + Copy + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (pos, (idx, val)) in self.raw_iter().enumerate() {
            if pos > 0 {
                write!(f, ", ")?;
            }
            match f.precision() {
                Some(p) => write!(f, "({}, {:.*})", idx, p, val)?,
                None => write!(f, "({}, {})", idx, val)?,
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_ascending_order_and_skips_zero() {
        let mut v: SparseVec<f64> = SparseVec::new();
        assert!(v.push(1, 0.5));
        assert!(v.push(3, 0.0));
        assert!(v.push(4, -1.0));
        assert!(!v.push(2, 1.0));
        assert_eq!(v.to_pairs(), vec![(1, 0.5), (4, -1.0)]);
        assert_eq!(v.get(4), -1.0);
        assert_eq!(v.get(3), 0.0);
    }

    #[test]
    fn from_pairs_sorts_and_merges_duplicates() {
        let v: BagOfWords = vec![(5, 1), (2, 1), (5, 2), (0, 1)].into_iter().collect();
        assert_eq!(v.indices(), &[0, 2, 5]);
        assert_eq!(v.values(), &[1, 1, 3]);
        assert_eq!(v.nnz(), 3);
    }

    #[test]
    fn display_honours_precision() {
        let v: TopicVector = SparseVec::from_pairs(vec![(0, 0.12345), (2, -1.0)]);
        assert_eq!(format!("{:.2}", v), "[(0, 0.12), (2, -1.00)]");
        assert_eq!(format!("{}", SparseVec::<u32>::new()), "[]");
    }
}
