use std::marker::PhantomData;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::artifact;
use crate::vectorizer::dictionary::Dictionary;
use crate::vectorizer::sparse::{BagOfWords, SparseVec};

/// Weights below this magnitude are dropped from the output
const WEIGHT_EPS: f64 = 1e-12;

/// TF-IDF calculation strategy
///
/// By implementing this trait, a different weighting can be plugged
/// into `TfidfModel<E>`.
pub trait TfidfEngine {
    /// local weight of a term occurring `count` times in a document
    fn tf(count: u32) -> f64;
    /// global weight of a term occurring in `doc_freq` of `num_docs` documents
    fn idf(doc_freq: u64, num_docs: u64) -> f64;
}

/// デフォルトのTF-IDFエンジン
/// raw term count × log2(num_docs / doc_freq)
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTfidfEngine;

impl TfidfEngine for DefaultTfidfEngine {
    #[inline]
    fn tf(count: u32) -> f64 {
        count as f64
    }

    #[inline]
    fn idf(doc_freq: u64, num_docs: u64) -> f64 {
        if doc_freq == 0 {
            return 0.0;
        }
        (num_docs as f64 / doc_freq as f64).log2()
    }
}

/// Weighting model fitted once from a dictionary's document frequencies
///
/// Maps a bag-of-words to a sparse weighted vector:
/// weight = tf × idf, absent and zero-weight indices are omitted, and
/// the result is L2-normalized when `normalize` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfModel<E = DefaultTfidfEngine> {
    /// IDF per dictionary index
    idfs: Vec<f64>,
    /// document count at fit time
    num_docs: u64,
    normalize: bool,
    #[serde(skip)]
    _marker: PhantomData<E>,
}

impl<E> TfidfModel<E>
where
    E: TfidfEngine,
{
    /// Fit from the dictionary's document frequencies
    pub fn fit(dictionary: &Dictionary) -> Self {
        let num_docs = dictionary.num_docs();
        let idfs = dictionary
            .iter()
            .map(|(_, _, df)| E::idf(df, num_docs))
            .collect();
        Self {
            idfs,
            num_docs,
            normalize: true,
            _marker: PhantomData,
        }
    }

    /// Disable or enable unit-length normalization of the output
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Weight a bag-of-words
    pub fn transform(&self, bow: &BagOfWords) -> SparseVec<f64> {
        let mut weighted = SparseVec::with_capacity(bow.nnz());
        let mut sq_sum = 0.0;
        for (idx, &count) in bow.raw_iter() {
            let Some(&idf) = self.idfs.get(idx) else {
                continue;
            };
            let w = E::tf(count) * idf;
            if w.abs() < WEIGHT_EPS {
                continue;
            }
            sq_sum += w * w;
            weighted.push(idx, w);
        }
        if !self.normalize || weighted.is_empty() {
            return weighted;
        }
        let norm = sq_sum.sqrt();
        weighted.iter().map(|(idx, w)| (idx, w / norm)).collect()
    }

    /// IDF of a dictionary index, None when out of range
    #[inline]
    pub fn idf(&self, index: usize) -> Option<f64> {
        self.idfs.get(index).copied()
    }

    /// Number of weighted dimensions
    #[inline]
    pub fn num_terms(&self) -> usize {
        self.idfs.len()
    }

    #[inline]
    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        artifact::save(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        artifact::load(path)
    }
}
