pub mod svd;

use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TopicError};
use crate::model::artifact;
use crate::vectorizer::dictionary::Dictionary;
use crate::vectorizer::sparse::{SparseVec, TopicVector};
use svd::{truncated_svd, SvdParams};

/// Topic weights below this magnitude are treated as exact zeros
const TOPIC_EPS: f64 = 1e-9;

/// Tuning of the truncated SVD behind `LsiModel::fit`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LsiOptions {
    /// power iterations applied to the sampled range
    pub power_iters: usize,
    /// oversampling beyond the requested number of topics
    pub extra_samples: usize,
    /// seed of the random test matrix; fixed seed means reproducible models
    pub seed: u64,
    /// documents held in memory at once while fitting
    pub chunk_size: usize,
}

impl Default for LsiOptions {
    fn default() -> Self {
        Self {
            power_iters: 2,
            extra_samples: 100,
            seed: 1,
            chunk_size: 2048,
        }
    }
}

/// Weighted documents that can be walked, in order, more than once
///
/// Each document is one column of the term × document matrix.
pub trait ColumnSource {
    fn num_columns(&self) -> usize;

    /// Hand the columns to `f` in order, at most `chunk_size` at a time
    fn for_each_chunk(
        &self,
        chunk_size: usize,
        f: &mut dyn FnMut(&[SparseVec<f64>]) -> Result<()>,
    ) -> Result<()>;
}

impl ColumnSource for [SparseVec<f64>] {
    fn num_columns(&self) -> usize {
        self.len()
    }

    fn for_each_chunk(
        &self,
        chunk_size: usize,
        f: &mut dyn FnMut(&[SparseVec<f64>]) -> Result<()>,
    ) -> Result<()> {
        for chunk in self.chunks(chunk_size.max(1)) {
            f(chunk)?;
        }
        Ok(())
    }
}

impl ColumnSource for Vec<SparseVec<f64>> {
    fn num_columns(&self) -> usize {
        self.len()
    }

    fn for_each_chunk(
        &self,
        chunk_size: usize,
        f: &mut dyn FnMut(&[SparseVec<f64>]) -> Result<()>,
    ) -> Result<()> {
        self.as_slice().for_each_chunk(chunk_size, f)
    }
}

/// Latent Semantic Indexing model
///
/// Holds the truncated left singular vectors `U_k` of the TF-IDF
/// term × document matrix. A weighted vector `x` maps to `U_kᵀ x`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LsiModel {
    /// num_terms × kept topics
    projection: Array2<f64>,
    singular_values: Vec<f64>,
    /// requested number of topics; the kept count may be lower
    num_topics: usize,
}

impl LsiModel {
    /// Fit from a TF-IDF weighted corpus
    ///
    /// The corpus is read chunk by chunk, a few times over, and never
    /// held in memory as a whole.
    ///
    /// # Arguments
    /// * `corpus` - one weighted vector per document
    /// * `num_terms` - vocabulary size (rows of the term × document matrix)
    /// * `num_topics` - requested dimensions of the topic space
    pub fn fit<C>(corpus: &C, num_terms: usize, num_topics: usize, options: &LsiOptions) -> Result<Self>
    where
        C: ColumnSource + ?Sized,
    {
        if num_topics == 0 {
            return Err(TopicError::InvalidConfig("number of topics must be positive".into()));
        }
        let params = SvdParams {
            rank: num_topics,
            extra_samples: options.extra_samples,
            power_iters: options.power_iters,
            seed: options.seed,
            chunk_size: options.chunk_size,
        };
        let svd = truncated_svd(corpus, num_terms, &params)?;
        debug!(
            docs = corpus.num_columns(),
            terms = num_terms,
            requested = num_topics,
            kept = svd.s.len(),
            "lsi fitted"
        );
        Ok(Self {
            projection: svd.u,
            singular_values: svd.s,
            num_topics,
        })
    }

    /// Project a weighted vector into topic space
    /// Indices beyond the vocabulary contribute nothing
    pub fn transform(&self, weighted: &SparseVec<f64>) -> TopicVector {
        let mut acc: Array1<f64> = Array1::zeros(self.projection.ncols());
        for (term, w) in weighted.iter() {
            if term < self.projection.nrows() {
                acc.scaled_add(w, &self.projection.row(term));
            }
        }
        acc.iter()
            .enumerate()
            .filter(|(_, x)| x.abs() >= TOPIC_EPS)
            .map(|(topic, &x)| (topic, x))
            .collect()
    }

    /// Requested number of topics
    #[inline]
    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    /// Topics actually kept (bounded by the corpus rank)
    #[inline]
    pub fn num_components(&self) -> usize {
        self.singular_values.len()
    }

    #[inline]
    pub fn num_terms(&self) -> usize {
        self.projection.nrows()
    }

    /// Singular values, largest first
    #[inline]
    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    /// Terms with the largest absolute weight in a topic
    ///
    /// # Returns
    /// * `Vec<(String, f64)>` - (lemma key, signed weight), strongest first;
    ///   empty when `topic` is out of range
    pub fn top_terms(&self, topic: usize, n: usize, dictionary: &Dictionary) -> Vec<(String, f64)> {
        if topic >= self.num_components() {
            return Vec::new();
        }
        let column = self.projection.column(topic);
        let mut weights: Vec<(usize, f64)> = column.iter().copied().enumerate().collect();
        weights.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        weights
            .into_iter()
            .filter_map(|(idx, w)| dictionary.key_of(idx).map(|key| (key.to_string(), w)))
            .take(n)
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        artifact::save(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        artifact::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<SparseVec<f64>> {
        vec![
            vec![(0, 0.8), (1, 0.6)].into_iter().collect(),
            vec![(1, 0.6), (2, 0.8)].into_iter().collect(),
            vec![(3, 1.0)].into_iter().collect(),
        ]
    }

    #[test]
    fn fit_keeps_at_most_the_corpus_rank() {
        let model = LsiModel::fit(&columns(), 4, 200, &LsiOptions::default()).unwrap();
        assert_eq!(model.num_topics(), 200);
        assert_eq!(model.num_components(), 3);
        assert_eq!(model.num_terms(), 4);
        let s = model.singular_values();
        assert!(s.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn transform_preserves_geometry_of_training_documents() {
        let corpus = columns();
        let model = LsiModel::fit(&corpus, 4, 10, &LsiOptions::default()).unwrap();
        let a = model.transform(&corpus[0]);
        let b = model.transform(&corpus[1]);
        let c = model.transform(&corpus[2]);
        // full-rank projection is an isometry on the column space
        assert!((a.cosine(&b) - corpus[0].cosine(&corpus[1])).abs() < 1e-9);
        assert!(a.cosine(&c).abs() < 1e-9);
    }

    #[test]
    fn transform_of_empty_is_empty() {
        let model = LsiModel::fit(&columns(), 4, 2, &LsiOptions::default()).unwrap();
        assert!(model.transform(&SparseVec::new()).is_empty());
        let outside: SparseVec<f64> = vec![(99, 1.0)].into_iter().collect();
        assert!(model.transform(&outside).is_empty());
    }

    #[test]
    fn zero_topics_is_rejected() {
        assert!(matches!(
            LsiModel::fit(&columns(), 4, 0, &LsiOptions::default()),
            Err(TopicError::InvalidConfig(_))
        ));
    }

    #[test]
    fn top_terms_names_the_dominant_keys() {
        let dictionary = Dictionary::build(vec![vec!["a/x", "b/x", "c/x", "d/x"]]).unwrap();
        let model = LsiModel::fit(&columns(), 4, 3, &LsiOptions::default()).unwrap();
        let top = model.top_terms(0, 2, &dictionary);
        assert_eq!(top.len(), 2);
        assert!(top[0].1.abs() >= top[1].1.abs());
        assert!(model.top_terms(7, 2, &dictionary).is_empty());
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.lsi");
        let model = LsiModel::fit(&columns(), 4, 2, &LsiOptions::default()).unwrap();
        model.save(&path).unwrap();
        let loaded = LsiModel::load(&path).unwrap();
        assert_eq!(loaded.singular_values(), model.singular_values());
        assert_eq!(loaded.transform(&columns()[0]), model.transform(&columns()[0]));
    }
}
