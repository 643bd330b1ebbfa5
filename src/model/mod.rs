//! Topic model pipeline
//!
//! A `Model` owns a set of artifacts identified by its name inside its
//! directory, trains them stage by stage, and lazily loads whichever of
//! them an operation needs.
//!
//! | stage | artifact |
//! |---|---|
//! | dictionary | `<name>.dict` |
//! | plain corpus (scratch) | `<name>.corpus` + `<name>.corpus.index` |
//! | TF-IDF model | `<name>.tfidf` |
//! | TF-IDF corpus (scratch) | `<name>.corpus-tfidf` + `<name>.corpus-tfidf.index` |
//! | LSI model | `<name>.lsi` |
//! | similarity index | `<name>.index` |

pub(crate) mod artifact;
pub mod config;
pub mod index;
pub mod store;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::corpus::{Corpus, CorpusItem, CorpusIterator, Document};
use crate::error::{Result, TopicError};
use crate::vectorizer::dictionary::Dictionary;
use crate::vectorizer::key::{keys_from_inputs, LemmaInput};
use crate::vectorizer::lsi::{LsiModel, LsiOptions};
use crate::vectorizer::sparse::{BagOfWords, TopicVector};
use crate::vectorizer::tfidf::TfidfModel;
use config::{ModelConfig, TrainOptions};
use index::{Hits, SimilarityIndex};
use store::StoredCorpus;

const DICTIONARY_EXT: &str = "dict";
const PLAIN_CORPUS_EXT: &str = "corpus";
const TFIDF_CORPUS_EXT: &str = "corpus-tfidf";
const TFIDF_MODEL_EXT: &str = "tfidf";
const LSI_MODEL_EXT: &str = "lsi";
const SIMILARITY_INDEX_EXT: &str = "index";

/// Topic model over lemmatized documents
#[derive(Debug, Clone)]
pub struct Model {
    config: ModelConfig,
    dictionary: Option<Dictionary>,
    tfidf: Option<TfidfModel>,
    lsi: Option<LsiModel>,
    index: Option<SimilarityIndex>,
}

/// The three inference stages, all resident
#[derive(Clone, Copy)]
struct Pipeline<'m> {
    dictionary: &'m Dictionary,
    tfidf: &'m TfidfModel,
    lsi: &'m LsiModel,
}

impl Pipeline<'_> {
    fn project<S: AsRef<str>>(&self, keys: &[S]) -> TopicVector {
        let bow = self.dictionary.doc2bow(keys);
        if bow.is_empty() {
            return TopicVector::new();
        }
        self.lsi.transform(&self.tfidf.transform(&bow))
    }
}

impl Model {
    /// Model with default settings stored under `default_directory()`
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::with_config(ModelConfig::new(name))
    }

    pub fn with_config(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dictionary: None,
            tfidf: None,
            lsi: None,
            index: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[inline]
    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    #[inline]
    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn path_for(&self, ext: &str) -> PathBuf {
        self.config.directory.join(format!("{}.{}", self.config.name, ext))
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.path_for(DICTIONARY_EXT)
    }

    pub fn plain_corpus_path(&self) -> PathBuf {
        self.path_for(PLAIN_CORPUS_EXT)
    }

    pub fn tfidf_corpus_path(&self) -> PathBuf {
        self.path_for(TFIDF_CORPUS_EXT)
    }

    pub fn tfidf_model_path(&self) -> PathBuf {
        self.path_for(TFIDF_MODEL_EXT)
    }

    pub fn lsi_model_path(&self) -> PathBuf {
        self.path_for(LSI_MODEL_EXT)
    }

    pub fn similarity_index_path(&self) -> PathBuf {
        self.path_for(SIMILARITY_INDEX_EXT)
    }

    /// Resident dictionary, if trained or loaded
    #[inline]
    pub fn dictionary(&self) -> Option<&Dictionary> {
        self.dictionary.as_ref()
    }

    #[inline]
    pub fn tfidf_model(&self) -> Option<&TfidfModel> {
        self.tfidf.as_ref()
    }

    #[inline]
    pub fn lsi_model(&self) -> Option<&LsiModel> {
        self.lsi.as_ref()
    }

    #[inline]
    pub fn similarity_index(&self) -> Option<&SimilarityIndex> {
        self.index.as_ref()
    }

    fn ensure_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.config.directory)?;
        Ok(())
    }

    // ---- training ----

    /// Build, prune and persist the dictionary with the configured bounds
    pub fn train_dictionary(&mut self, corpus: &dyn Corpus) -> Result<&Dictionary> {
        self.train_dictionary_with(corpus, self.config.min_count, self.config.max_ratio)
    }

    /// Build, prune and persist the dictionary
    ///
    /// Fails with `EmptyVocabulary` when nothing survives pruning.
    pub fn train_dictionary_with(&mut self, corpus: &dyn Corpus, min_count: u64, max_ratio: f64) -> Result<&Dictionary> {
        config::check_max_ratio(max_ratio)?;
        let start = Instant::now();
        self.ensure_directory()?;
        let mut dictionary = Dictionary::new();
        for keys in CorpusIterator::new(corpus, None).iter().filter_map(CorpusItem::into_keys) {
            dictionary.add_doc(keys);
        }
        let seen = dictionary.len();
        let removed = dictionary.prune(min_count, max_ratio);
        if dictionary.is_empty() {
            return Err(TopicError::EmptyVocabulary { min_count, max_ratio });
        }
        self.discard_similarity_index()?;
        dictionary.save(&self.dictionary_path())?;
        info!(
            name = %self.config.name,
            docs = dictionary.num_docs(),
            seen,
            removed,
            kept = dictionary.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "dictionary trained"
        );
        Ok(self.dictionary.insert(dictionary))
    }

    /// Persist one bag-of-words per non-empty document, in corpus order
    ///
    /// # Returns
    /// * `usize` - number of documents written
    pub fn train_plain_corpus(&mut self, corpus: &dyn Corpus) -> Result<usize> {
        let start = Instant::now();
        self.ensure_directory()?;
        self.ensure_dictionary()?;
        let path = self.plain_corpus_path();
        let dictionary = self.resident_dictionary()?;
        let documents = CorpusIterator::new(corpus, Some(dictionary));
        let bags = documents.iter().filter_map(CorpusItem::into_bag).map(Ok);
        let written = store::serialize(&path, dictionary.len(), bags)?;
        info!(name = %self.config.name, docs = written, elapsed_ms = start.elapsed().as_millis() as u64, "plain corpus trained");
        Ok(written)
    }

    /// Fit and persist the TF-IDF model from the dictionary
    pub fn train_tfidf_model(&mut self) -> Result<&TfidfModel> {
        self.ensure_directory()?;
        self.ensure_dictionary()?;
        let tfidf: TfidfModel = TfidfModel::fit(self.resident_dictionary()?);
        tfidf.save(&self.tfidf_model_path())?;
        info!(name = %self.config.name, terms = tfidf.num_terms(), docs = tfidf.num_docs(), "tfidf model trained");
        Ok(self.tfidf.insert(tfidf))
    }

    /// Weight every plain corpus vector and persist the result, in order
    ///
    /// # Returns
    /// * `usize` - number of documents written
    pub fn train_tfidf_corpus(&mut self) -> Result<usize> {
        let start = Instant::now();
        self.ensure_directory()?;
        self.ensure_tfidf_model()?;
        let plain = self.load_plain_corpus()?;
        let tfidf = self.resident_tfidf()?;
        let weighted = plain.iter()?.map(|bag| bag.map(|bag| tfidf.transform(&bag)));
        let written = store::serialize(&self.tfidf_corpus_path(), plain.num_terms(), weighted)?;
        info!(name = %self.config.name, docs = written, elapsed_ms = start.elapsed().as_millis() as u64, "tfidf corpus trained");
        Ok(written)
    }

    /// Fit and persist the LSI model from the TF-IDF corpus
    pub fn train_lsi_model(&mut self, options: &LsiOptions) -> Result<&LsiModel> {
        let start = Instant::now();
        self.ensure_directory()?;
        self.ensure_dictionary()?;
        let weighted = self.load_tfidf_corpus()?;
        let num_terms = self.resident_dictionary()?.len();
        let lsi = LsiModel::fit(&weighted, num_terms, self.config.dimensions, options)?;
        self.discard_similarity_index()?;
        lsi.save(&self.lsi_model_path())?;
        info!(
            name = %self.config.name,
            docs = weighted.len(),
            terms = num_terms,
            topics = lsi.num_components(),
            requested = lsi.num_topics(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "lsi model trained"
        );
        Ok(self.lsi.insert(lsi))
    }

    /// Run every training stage in order
    ///
    /// The artifact directory is created if absent. Unless
    /// `keep_temp_files` is set, both scratch corpora and their
    /// indices are removed afterwards, whether or not training succeeded.
    /// A similarity index from an earlier run is removed; use
    /// `train_similarity` to rebuild it.
    pub fn train(&mut self, corpus: &dyn Corpus, options: &TrainOptions) -> Result<()> {
        options.validate()?;
        let start = Instant::now();
        info!(name = %self.config.name, directory = %self.config.directory.display(), "training started");
        let trained = self.train_stages(corpus, options);
        if !options.keep_temp_files {
            match (&trained, self.remove_temp_files()) {
                (_, Ok(_)) => {}
                (Ok(()), Err(e)) => return Err(e),
                (Err(_), Err(e)) => warn!(name = %self.config.name, error = %e, "scratch files not removed"),
            }
        }
        trained?;
        info!(name = %self.config.name, elapsed_ms = start.elapsed().as_millis() as u64, "training finished");
        Ok(())
    }

    fn train_stages(&mut self, corpus: &dyn Corpus, options: &TrainOptions) -> Result<()> {
        self.train_dictionary_with(corpus, options.min_count, options.max_ratio)?;
        self.train_plain_corpus(corpus)?;
        self.train_tfidf_model()?;
        self.train_tfidf_corpus()?;
        self.train_lsi_model(&options.lsi)?;
        Ok(())
    }

    /// Forget the similarity index, resident and on disk
    /// Its vectors live in the topic space being replaced
    fn discard_similarity_index(&mut self) -> Result<()> {
        self.index = None;
        let path = self.similarity_index_path();
        if artifact::remove(&path)? {
            info!(path = %path.display(), "stale similarity index removed");
        }
        Ok(())
    }

    /// Delete both scratch corpora and their indices
    ///
    /// # Returns
    /// * `usize` - number of files removed
    pub fn remove_temp_files(&self) -> Result<usize> {
        let mut removed = 0;
        for corpus in [self.plain_corpus_path(), self.tfidf_corpus_path()] {
            for path in [store::index_path(&corpus), corpus] {
                if artifact::remove(&path)? {
                    debug!(path = %path.display(), "scratch file removed");
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Train every stage, then index the topic vector of every document
    pub fn train_similarity(&mut self, corpus: &dyn Corpus, options: &TrainOptions) -> Result<usize> {
        self.train(corpus, options)?;
        self.build_similarity_index(corpus)
    }

    /// Compute and persist the topic vector of every document in the corpus
    ///
    /// Document numbers are positions in the corpus; documents with
    /// no lemmas are indexed with an empty vector.
    pub fn build_similarity_index(&mut self, corpus: &dyn Corpus) -> Result<usize> {
        let start = Instant::now();
        self.ensure_directory()?;
        let pipeline = self.pipeline()?;
        let keys: Vec<Vec<String>> = corpus.documents().map(|doc| doc.keys()).collect();
        let vectors: Vec<TopicVector> = keys.par_iter().map(|keys| pipeline.project(keys)).collect();
        let index = SimilarityIndex::new(vectors);
        index.save(&self.similarity_index_path())?;
        info!(name = %self.config.name, docs = index.len(), elapsed_ms = start.elapsed().as_millis() as u64, "similarity index built");
        let len = index.len();
        self.index = Some(index);
        Ok(len)
    }

    // ---- loading ----

    pub fn load_dictionary(&mut self) -> Result<&Dictionary> {
        let dictionary = Dictionary::load(&self.dictionary_path())?;
        Ok(self.dictionary.insert(dictionary))
    }

    pub fn load_tfidf_model(&mut self) -> Result<&TfidfModel> {
        let tfidf = TfidfModel::load(&self.tfidf_model_path())?;
        Ok(self.tfidf.insert(tfidf))
    }

    pub fn load_lsi_model(&mut self) -> Result<&LsiModel> {
        let lsi = LsiModel::load(&self.lsi_model_path())?;
        Ok(self.lsi.insert(lsi))
    }

    pub fn load_similarity_index(&mut self) -> Result<&SimilarityIndex> {
        let index = SimilarityIndex::load(&self.similarity_index_path())?;
        Ok(self.index.insert(index))
    }

    /// Open the persisted plain corpus
    pub fn load_plain_corpus(&self) -> Result<StoredCorpus<u32>> {
        StoredCorpus::open(&self.plain_corpus_path())
    }

    /// Open the persisted TF-IDF corpus
    pub fn load_tfidf_corpus(&self) -> Result<StoredCorpus<f64>> {
        StoredCorpus::open(&self.tfidf_corpus_path())
    }

    fn ensure_dictionary(&mut self) -> Result<()> {
        if self.dictionary.is_none() {
            self.load_dictionary()?;
        }
        Ok(())
    }

    fn ensure_tfidf_model(&mut self) -> Result<()> {
        if self.tfidf.is_none() {
            self.load_tfidf_model()?;
        }
        Ok(())
    }

    fn ensure_lsi_model(&mut self) -> Result<()> {
        if self.lsi.is_none() {
            self.load_lsi_model()?;
        }
        Ok(())
    }

    fn resident_dictionary(&self) -> Result<&Dictionary> {
        self.dictionary
            .as_ref()
            .ok_or_else(|| TopicError::MissingArtifact(self.dictionary_path()))
    }

    fn resident_tfidf(&self) -> Result<&TfidfModel> {
        self.tfidf
            .as_ref()
            .ok_or_else(|| TopicError::MissingArtifact(self.tfidf_model_path()))
    }

    fn resident_lsi(&self) -> Result<&LsiModel> {
        self.lsi
            .as_ref()
            .ok_or_else(|| TopicError::MissingArtifact(self.lsi_model_path()))
    }

    /// Load whatever inference needs, then borrow it
    fn ensure_pipeline(&mut self) -> Result<()> {
        self.ensure_dictionary()?;
        self.ensure_tfidf_model()?;
        self.ensure_lsi_model()
    }

    fn pipeline(&mut self) -> Result<Pipeline<'_>> {
        self.ensure_pipeline()?;
        Ok(Pipeline {
            dictionary: self.resident_dictionary()?,
            tfidf: self.resident_tfidf()?,
            lsi: self.resident_lsi()?,
        })
    }

    // ---- inference ----

    /// Topic vector of a list of lemmas
    ///
    /// The list holds either (lemma, category) tuples or "lemma/category"
    /// keys, not both. An empty list gives an empty vector without
    /// touching any artifact; a list of only unknown lemmas gives an
    /// empty vector too.
    pub fn topic_vector(&mut self, lemmas: &[LemmaInput]) -> Result<TopicVector> {
        let keys = keys_from_inputs(lemmas)?;
        if keys.is_empty() {
            return Ok(TopicVector::new());
        }
        Ok(self.pipeline()?.project(&keys))
    }

    /// Topic vector of any document
    pub fn topic_vector_for(&mut self, document: &dyn Document) -> Result<TopicVector> {
        let keys = document.keys();
        if keys.is_empty() {
            return Ok(TopicVector::new());
        }
        Ok(self.pipeline()?.project(&keys))
    }

    /// Bag-of-words of a list of lemmas over the current dictionary
    pub fn doc2bow(&mut self, lemmas: &[LemmaInput]) -> Result<BagOfWords> {
        let keys = keys_from_inputs(lemmas)?;
        self.ensure_dictionary()?;
        Ok(self.resident_dictionary()?.doc2bow(&keys))
    }

    /// Training documents closest to a topic vector, most similar first
    pub fn nearest_neighbors(&mut self, query: &TopicVector, top_n: Option<usize>) -> Result<Hits> {
        if self.index.is_none() {
            self.load_similarity_index()?;
        }
        let index = self
            .index
            .as_ref()
            .ok_or_else(|| TopicError::MissingArtifact(self.similarity_index_path()))?;
        Ok(index.search(query, top_n))
    }

    /// Cosine similarity of two topic vectors, 0.0 when either is empty
    pub fn similarity(a: &TopicVector, b: &TopicVector) -> f64 {
        a.cosine(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{KeyDocument, VecCorpus};

    fn model(dir: &Path) -> Model {
        Model::with_config(ModelConfig::new("unit").with_directory(dir)).unwrap()
    }

    #[test]
    fn artifact_paths_follow_name_and_directory() {
        let m = model(Path::new("/tmp/models"));
        assert_eq!(m.dictionary_path(), Path::new("/tmp/models/unit.dict"));
        assert_eq!(m.plain_corpus_path(), Path::new("/tmp/models/unit.corpus"));
        assert_eq!(m.tfidf_corpus_path(), Path::new("/tmp/models/unit.corpus-tfidf"));
        assert_eq!(m.tfidf_model_path(), Path::new("/tmp/models/unit.tfidf"));
        assert_eq!(m.lsi_model_path(), Path::new("/tmp/models/unit.lsi"));
        assert_eq!(m.similarity_index_path(), Path::new("/tmp/models/unit.index"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(Model::new(""), Err(TopicError::InvalidConfig(_))));
    }

    #[test]
    fn empty_query_touches_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = model(dir.path());
        assert!(m.topic_vector(&[]).unwrap().is_empty());
        assert!(m.dictionary().is_none());
    }

    #[test]
    fn stages_fail_without_prerequisites() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = model(dir.path());
        let dictionary_path = m.dictionary_path();
        let res = m.train_tfidf_model().map(|_| ());
        assert!(matches!(res, Err(TopicError::MissingArtifact(p)) if p == dictionary_path));
        let corpus: VecCorpus<KeyDocument> = vec![KeyDocument::from_text("a/x b/x")].into_iter().collect();
        m.train_dictionary_with(&corpus, 0, 1.0).unwrap();
        assert!(matches!(m.train_tfidf_corpus(), Err(TopicError::MissingArtifact(_))));
    }

    #[test]
    fn remove_temp_files_counts_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = model(dir.path());
        let corpus: VecCorpus<KeyDocument> = vec![KeyDocument::from_text("a/x b/x"), KeyDocument::from_text("b/x")]
            .into_iter()
            .collect();
        m.train_dictionary_with(&corpus, 0, 1.0).unwrap();
        assert_eq!(m.train_plain_corpus(&corpus).unwrap(), 2);
        assert_eq!(m.remove_temp_files().unwrap(), 2);
        assert_eq!(m.remove_temp_files().unwrap(), 0);
    }
}
