use std::fmt;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::artifact;
use crate::vectorizer::sparse::TopicVector;

/// Ranked search results
pub struct Hits {
    /// (document number, score)
    pub list: Vec<(usize, f64)>,
}

impl Hits {
    pub fn new(list: Vec<(usize, f64)>) -> Self {
        Hits { list }
    }

    /// Sort results by descending score, dropping NaN scores
    /// Ties keep document order
    pub fn sort_by_score(&mut self) -> &mut Self {
        self.list.retain(|(_, s)| !s.is_nan());
        self.list.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        self
    }

    /// Keep the first `n` results
    pub fn truncate(&mut self, n: usize) -> &mut Self {
        self.list.truncate(n);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Document numbers in rank order
    pub fn documents(&self) -> Vec<usize> {
        self.list.iter().map(|(doc, _)| *doc).collect()
    }
}

impl fmt::Debug for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Hits [")?;
            for (doc, score) in &self.list {
                writeln!(f, "    {}: {:.6}", doc, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

impl fmt::Display for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (doc, score) in &self.list {
            writeln!(f, "{:.6}\t{}", score, doc)?;
        }
        Ok(())
    }
}

/// Topic vectors of the training documents, in corpus order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimilarityIndex {
    vectors: Vec<TopicVector>,
}

impl SimilarityIndex {
    pub fn new(vectors: Vec<TopicVector>) -> Self {
        Self { vectors }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get(&self, doc: usize) -> Option<&TopicVector> {
        self.vectors.get(doc)
    }

    /// Cosine similarity of the query to every indexed document,
    /// most similar first
    pub fn search(&self, query: &TopicVector, top_n: Option<usize>) -> Hits {
        let scores: Vec<(usize, f64)> = self
            .vectors
            .par_iter()
            .enumerate()
            .map(|(doc, vec)| (doc, query.cosine(vec)))
            .collect();
        let mut hits = Hits::new(scores);
        hits.sort_by_score();
        if let Some(n) = top_n {
            hits.truncate(n);
        }
        hits
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        artifact::save(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        artifact::load(path)
    }
}
