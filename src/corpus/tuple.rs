use crate::corpus::{DocItem, Document};
use crate::vectorizer::key::LemmaTuple;

/// Document backed by (lemma, category) pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleDocument {
    tuples: Vec<LemmaTuple>,
}

impl TupleDocument {
    pub fn new(tuples: Vec<LemmaTuple>) -> Self {
        Self { tuples }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

impl<L, C> FromIterator<(L, C)> for TupleDocument
where
    L: Into<String>,
    C: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (L, C)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(l, c)| (l.into(), c.into())).collect())
    }
}

impl Document for TupleDocument {
    fn items(&self) -> Box<dyn Iterator<Item = DocItem> + '_> {
        Box::new(self.tuples.iter().cloned().map(DocItem::Tuple))
    }
}

/// Document backed by already normalized "lemma/category" keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDocument {
    keys: Vec<String>,
}

impl KeyDocument {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    /// Split whitespace-separated keys, e.g. `"maður/kk fara/so"`
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split_whitespace().map(str::to_string).collect())
    }
}

impl Document for KeyDocument {
    fn items(&self) -> Box<dyn Iterator<Item = DocItem> + '_> {
        Box::new(self.keys.iter().cloned().map(DocItem::Key))
    }
}
