//! Documents, corpora and the iterator that feeds them into training
//!
//! A `Document` yields lemma items, a `Corpus` yields documents, and a
//! `CorpusIterator` turns a corpus into either lists of lemma keys
//! (to build a vocabulary) or bags-of-words (once a vocabulary exists).

pub mod parsed;
pub mod tagged;
pub mod token;
pub mod tuple;

use crate::vectorizer::dictionary::Dictionary;
use crate::vectorizer::key::{lemma_key, LemmaTuple};
use crate::vectorizer::sparse::BagOfWords;

pub use parsed::{ParsedDocument, Parser};
pub use tagged::TaggedTextTokenizer;
pub use token::{Meaning, PersonName, Sentence, Token, TokenDocument, Tokenizer};
pub use tuple::{KeyDocument, TupleDocument};

/// One lemma produced by a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocItem {
    /// (lemma, category), normalized on use
    Tuple(LemmaTuple),
    /// already normalized "lemma/category" key
    Key(String),
}

impl DocItem {
    /// Vocabulary key of this item
    pub fn into_key(self) -> String {
        match self {
            DocItem::Tuple((lemma, category)) => lemma_key(&lemma, &category),
            DocItem::Key(key) => key,
        }
    }
}

/// Source of the lemma stream of one document
///
/// `items` may be called more than once; every call restarts the stream.
pub trait Document {
    fn items(&self) -> Box<dyn Iterator<Item = DocItem> + '_>;

    /// All vocabulary keys of the document, in order
    fn keys(&self) -> Vec<String> {
        self.items().map(DocItem::into_key).collect()
    }
}

impl<D> Document for &D
where
    D: Document + ?Sized,
{
    fn items(&self) -> Box<dyn Iterator<Item = DocItem> + '_> {
        (**self).items()
    }
}

impl<D> Document for Box<D>
where
    D: Document + ?Sized,
{
    fn items(&self) -> Box<dyn Iterator<Item = DocItem> + '_> {
        (**self).items()
    }
}

/// A collection of documents that can be walked more than once
pub trait Corpus {
    fn documents(&self) -> Box<dyn Iterator<Item = Box<dyn Document + '_>> + '_>;
}

/// In-memory corpus
#[derive(Debug, Clone, Default)]
pub struct VecCorpus<D> {
    docs: Vec<D>,
}

impl<D> VecCorpus<D>
where
    D: Document,
{
    pub fn new(docs: Vec<D>) -> Self {
        Self { docs }
    }

    pub fn push(&mut self, doc: D) {
        self.docs.push(doc);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl<D> FromIterator<D> for VecCorpus<D>
where
    D: Document,
{
    fn from_iter<I: IntoIterator<Item = D>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<D> Corpus for VecCorpus<D>
where
    D: Document,
{
    fn documents(&self) -> Box<dyn Iterator<Item = Box<dyn Document + '_>> + '_> {
        Box::new(self.docs.iter().map(|doc| Box::new(doc) as Box<dyn Document + '_>))
    }
}

/// What the iterator emits per document
#[derive(Debug, Clone, Copy)]
pub enum Transform<'d> {
    /// the document's lemma keys as-is
    Identity,
    /// a bag-of-words over this dictionary; unknown keys are dropped
    Lookup(&'d Dictionary),
}

/// One element of a `CorpusIterator`
#[derive(Debug, Clone, PartialEq)]
pub enum CorpusItem {
    Keys(Vec<String>),
    Bag(BagOfWords),
}

impl CorpusItem {
    pub fn into_keys(self) -> Option<Vec<String>> {
        match self {
            CorpusItem::Keys(keys) => Some(keys),
            CorpusItem::Bag(_) => None,
        }
    }

    pub fn into_bag(self) -> Option<BagOfWords> {
        match self {
            CorpusItem::Bag(bag) => Some(bag),
            CorpusItem::Keys(_) => None,
        }
    }
}

/// Adapts a corpus into training input
///
/// Emits one element per document that yields at least one lemma.
/// Documents with no lemmas are skipped entirely, so they never count
/// toward document frequencies. A document whose keys are all unknown
/// to the dictionary still yields one (empty) bag.
pub struct CorpusIterator<'c, 'd> {
    corpus: &'c dyn Corpus,
    transform: Transform<'d>,
}

impl<'c, 'd> CorpusIterator<'c, 'd> {
    /// `Identity` without a dictionary, `Lookup` with one
    pub fn new(corpus: &'c dyn Corpus, dictionary: Option<&'d Dictionary>) -> Self {
        let transform = match dictionary {
            Some(dictionary) => Transform::Lookup(dictionary),
            None => Transform::Identity,
        };
        Self::with_transform(corpus, transform)
    }

    pub fn with_transform(corpus: &'c dyn Corpus, transform: Transform<'d>) -> Self {
        Self { corpus, transform }
    }

    #[inline]
    pub fn transform(&self) -> Transform<'d> {
        self.transform
    }

    pub fn iter(&self) -> impl Iterator<Item = CorpusItem> + '_ {
        let transform = self.transform;
        self.corpus.documents().filter_map(move |doc| {
            let keys = doc.keys();
            if keys.is_empty() {
                return None;
            }
            Some(match transform {
                Transform::Identity => CorpusItem::Keys(keys),
                Transform::Lookup(dictionary) => CorpusItem::Bag(dictionary.doc2bow(&keys)),
            })
        })
    }
}
