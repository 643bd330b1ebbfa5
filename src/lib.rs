/// This crate is a topic model engine for lemmatized documents.
/// Documents become a pruned vocabulary, a TF-IDF weighting and a
/// latent semantic (LSI) space; lemma lists are then mapped into that
/// space and compared by cosine similarity.
pub mod corpus;
pub mod error;
pub mod model;
pub mod vectorizer;

/// Topic Model
/// The top-level struct of this crate. It trains and persists every
/// stage of the pipeline and answers inference queries.
///
/// Stages, each persisted under `<directory>/<name>.<ext>`:
/// - Dictionary (`.dict`)
/// - Plain corpus (`.corpus`, scratch)
/// - TF-IDF model (`.tfidf`)
/// - TF-IDF corpus (`.corpus-tfidf`, scratch)
/// - LSI model (`.lsi`)
/// - Similarity index (`.index`, optional)
///
/// Any stage loads its prerequisites from disk the first time it needs
/// them, so training and inference can run in separate processes.
pub use model::Model;

/// Model configuration
/// `ModelConfig` carries the name, artifact directory, number of topics
/// and dictionary pruning bounds. `TrainOptions` carries the knobs of
/// the composite `Model::train`.
pub use model::config::{ModelConfig, TrainOptions};

/// Error type of every fallible operation
pub use error::{Result, TopicError};

/// Vocabulary
/// Maps lemma keys to dense indices and keeps their document
/// frequencies. It is the base data for IDF calculation.
pub use vectorizer::dictionary::Dictionary;

/// Lemma keys
/// A `(lemma, category)` pair becomes the key `lemma/category` with the
/// lemma lower-cased, hyphens dropped and spaces turned into underscores.
pub use vectorizer::key::{lemma_key, LemmaInput, LemmaTuple};

/// Sparse vectors
/// `BagOfWords` holds counts per dictionary index,
/// `TopicVector` holds weights per LSI topic.
pub use vectorizer::sparse::{BagOfWords, SparseVec, TopicVector};

/// TF IDF Calculation Engine Trait
/// A trait that defines the behavior of a TF-IDF calculation engine.
///
/// By implementing this trait, you can plug different TF-IDF calculation
/// strategies into `TfidfModel<E>`.
/// The default, `DefaultTfidfEngine`, weighs raw counts by log2(N / df).
pub use vectorizer::tfidf::{DefaultTfidfEngine, TfidfEngine, TfidfModel};

/// LSI model, its fitting options and the column stream it is fitted from
pub use vectorizer::lsi::{ColumnSource, LsiModel, LsiOptions};

/// Documents and corpora
/// Anything implementing `Document` can be trained on or projected;
/// `Corpus` yields documents and must support several passes.
pub use corpus::{Corpus, CorpusIterator, DocItem, Document, KeyDocument, TupleDocument, VecCorpus};

/// Search Hits
/// Ranked (document number, score) results of `Model::nearest_neighbors`.
pub use model::index::{Hits, SimilarityIndex};
