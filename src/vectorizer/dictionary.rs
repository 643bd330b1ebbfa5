use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TopicError};
use crate::model::artifact;
use crate::vectorizer::sparse::BagOfWords;

/// Vocabulary of lemma keys
///
/// Keeps, for every lemma key seen in the corpus:
/// - a dense index (the key's position, `0..len()`)
/// - its document frequency (number of documents containing it)
///
/// plus the number of documents and lemma positions processed.
/// It is the base data for IDF calculation and for converting
/// documents into bags-of-words.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dictionary {
    /// key -> document frequency, in index order
    #[serde(with = "indexmap::map::serde_seq")]
    doc_freqs: IndexMap<Box<str>, u64>,
    /// number of documents processed
    num_docs: u64,
    /// number of lemma positions processed
    num_pos: u64,
}

impl Dictionary {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary in a single pass over documents of lemma keys
    ///
    /// Fails with `EmptyVocabulary` when no document held a single key.
    pub fn build<I, D, S>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Self::new();
        for doc in documents {
            dictionary.add_doc(doc);
        }
        if dictionary.is_empty() {
            return Err(TopicError::EmptyVocabulary { min_count: 0, max_ratio: 1.0 });
        }
        debug!(
            terms = dictionary.len(),
            docs = dictionary.num_docs,
            positions = dictionary.num_pos,
            "dictionary built"
        );
        Ok(dictionary)
    }

    /// Add one document's keys
    /// Each distinct key counts once toward its document frequency.
    /// A document without keys is not counted.
    pub fn add_doc<D, S>(&mut self, keys: D)
    where
        D: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<Box<str>> = HashSet::new();
        for key in keys {
            let key = key.as_ref();
            self.num_pos += 1;
            if seen.contains(key) {
                continue;
            }
            seen.insert(key.into());
            self.doc_freqs
                .entry(key.into())
                .and_modify(|count| *count += 1)
                .or_insert(1);
        }
        if !seen.is_empty() {
            self.num_docs += 1;
        }
    }

    /// Drop rare and overly common keys, then re-densify indices
    ///
    /// Removes keys whose document frequency is below `min_count`
    /// or above `max_ratio * num_docs`.
    /// `min_count == 0` disables the lower bound and `max_ratio >= 1.0`
    /// disables the upper bound.
    /// Surviving keys keep their relative order.
    ///
    /// # Returns
    /// * `usize` - number of removed keys
    pub fn prune(&mut self, min_count: u64, max_ratio: f64) -> usize {
        let before = self.doc_freqs.len();
        let max_docs = max_ratio * self.num_docs as f64;
        self.doc_freqs.retain(|_, df| {
            let too_rare = min_count > 0 && *df < min_count;
            let too_common = max_ratio < 1.0 && *df as f64 > max_docs;
            !(too_rare || too_common)
        });
        let removed = before - self.doc_freqs.len();
        debug!(removed, kept = self.doc_freqs.len(), min_count, max_ratio, "dictionary pruned");
        removed
    }

    /// Convert a document's keys into a bag-of-words
    /// Keys missing from the dictionary are ignored
    pub fn doc2bow<S>(&self, keys: &[S]) -> BagOfWords
    where
        S: AsRef<str>,
    {
        let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
        for key in keys {
            if let Some(idx) = self.index_of(key.as_ref()) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }
        let mut bow = BagOfWords::with_capacity(counts.len());
        for (idx, count) in counts {
            bow.push(idx, count);
        }
        bow
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.doc_freqs.contains_key(key)
    }

    #[inline]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.doc_freqs.get_index_of(key)
    }

    #[inline]
    pub fn key_of(&self, index: usize) -> Option<&str> {
        self.doc_freqs.get_index(index).map(|(key, _)| key.as_ref())
    }

    /// Document frequency of a key, 0 when absent
    #[inline]
    pub fn doc_freq(&self, key: &str) -> u64 {
        self.doc_freqs.get(key).copied().unwrap_or(0)
    }

    /// Document frequency by index, 0 when out of range
    #[inline]
    pub fn doc_freq_at(&self, index: usize) -> u64 {
        self.doc_freqs.get_index(index).map_or(0, |(_, df)| *df)
    }

    /// Number of keys
    #[inline]
    pub fn len(&self) -> usize {
        self.doc_freqs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.doc_freqs.is_empty()
    }

    #[inline]
    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    #[inline]
    pub fn num_pos(&self) -> u64 {
        self.num_pos
    }

    /// Iterate (index, key, document frequency) in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, u64)> + '_ {
        self.doc_freqs
            .iter()
            .enumerate()
            .map(|(idx, (key, df))| (idx, key.as_ref(), *df))
    }

    /// Persist the dictionary
    pub fn save(&self, path: &Path) -> Result<()> {
        artifact::save(path, self)
    }

    /// Load a dictionary written by `save`
    pub fn load(path: &Path) -> Result<Self> {
        artifact::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> Dictionary {
        let docs = vec![
            vec!["maður/kk", "fara/so", "út/ao", "í/fs", "búð/kvk"],
            vec!["búð/kvk", "vera/so", "lokaður/lo"],
            vec!["maður/kk", "vera/so", "leiður/lo"],
            vec!["hægur/lo", "vera/so", "að/nhm", "kaupa/so", "matur/kk", "í/fs", "búð/kvk"],
        ];
        Dictionary::build(docs).unwrap()
    }

    #[test]
    fn build_counts_documents_and_frequencies() {
        let d = toy();
        assert_eq!(d.num_docs(), 4);
        assert_eq!(d.num_pos(), 18);
        assert_eq!(d.len(), 12);
        assert!(d.contains("maður/kk"));
        assert!(d.contains("búð/kvk"));
        assert!(!d.contains("hundur/kk"));
        assert_eq!(d.doc_freq("búð/kvk"), 3);
        assert_eq!(d.doc_freq("maður/kk"), 2);
        assert_eq!(d.index_of("maður/kk"), Some(0));
        assert_eq!(d.key_of(4), Some("búð/kvk"));
    }

    #[test]
    fn repeated_key_counts_once_per_document() {
        let d = Dictionary::build(vec![vec!["a/x", "a/x", "b/x"], vec!["a/x"]]).unwrap();
        assert_eq!(d.doc_freq("a/x"), 2);
        assert_eq!(d.num_pos(), 4);
    }

    #[test]
    fn empty_documents_are_not_counted() {
        let d = Dictionary::build(vec![vec!["a/x"], vec![], vec!["b/x"]]).unwrap();
        assert_eq!(d.num_docs(), 2);
    }

    #[test]
    fn build_rejects_empty_input() {
        let docs: Vec<Vec<&str>> = vec![];
        assert!(matches!(Dictionary::build(docs), Err(TopicError::EmptyVocabulary { .. })));
    }

    #[test]
    fn prune_drops_rare_and_common_and_redensifies() {
        let mut d = toy();
        let removed = d.prune(2, 0.5);
        // df >= 2 and df <= 2 leaves only maður/kk and í/fs
        assert_eq!(removed, 10);
        let keys: Vec<&str> = d.iter().map(|(_, k, _)| k).collect();
        assert_eq!(keys, vec!["maður/kk", "í/fs"]);
        assert_eq!(d.index_of("í/fs"), Some(1));
        assert_eq!(d.num_docs(), 4);
    }

    #[test]
    fn prune_with_open_bounds_keeps_everything() {
        let mut d = toy();
        assert_eq!(d.prune(0, 1.0), 0);
        assert_eq!(d.len(), 12);
    }

    #[test]
    fn doc2bow_counts_known_keys_only() {
        let d = toy();
        let bow = d.doc2bow(&["búð/kvk", "hundur/kk", "maður/kk", "búð/kvk"]);
        assert_eq!(bow.to_pairs(), vec![(0, 1), (4, 2)]);
        assert!(d.doc2bow(&["khljsdf/xx"]).is_empty());
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.dict");
        let mut d = toy();
        d.prune(2, 1.0);
        d.save(&path).unwrap();
        let loaded = Dictionary::load(&path).unwrap();
        let before: Vec<(usize, &str, u64)> = d.iter().collect();
        let after: Vec<(usize, &str, u64)> = loaded.iter().collect();
        assert_eq!(before, after);
        assert_eq!(loaded.num_docs(), d.num_docs());
        assert_eq!(loaded.num_pos(), d.num_pos());
    }

    #[test]
    fn load_missing_file_is_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.dict");
        assert!(matches!(Dictionary::load(&path), Err(TopicError::MissingArtifact(p)) if p == path));
    }
}
