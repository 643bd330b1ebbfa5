pub mod compare;
pub mod dictionary;
pub mod key;
pub mod lsi;
pub mod sparse;
pub mod tfidf;

pub use compare::cosine_similarity;
pub use dictionary::Dictionary;
pub use key::{keys_from_inputs, lemma_key, LemmaInput, LemmaTuple};
pub use lsi::{ColumnSource, LsiModel, LsiOptions};
pub use sparse::{BagOfWords, SparseVec, TopicVector};
pub use tfidf::{DefaultTfidfEngine, TfidfEngine, TfidfModel};
