use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::corpus::token::{sentence_lemmas, Token, Tokenizer};
use crate::corpus::{DocItem, Document};
use crate::vectorizer::key::LemmaTuple;

/// Full syntactic parser of a sentence
pub trait Parser: Send + Sync {
    /// (lemma, category) of every terminal of the best derivation,
    /// or None when the sentence has no derivation
    fn parse(&self, sentence: &[Token]) -> Option<Vec<LemmaTuple>>;
}

/// Document lemmatized through a parser, sentence by sentence
///
/// A sentence the parser cannot handle is lemmatized with the
/// first-candidate token strategy instead; the rest of the document
/// is unaffected.
#[derive(Clone)]
pub struct ParsedDocument {
    text: String,
    tokenizer: Arc<dyn Tokenizer>,
    parser: Arc<dyn Parser>,
}

impl ParsedDocument {
    pub fn new(text: impl Into<String>, tokenizer: Arc<dyn Tokenizer>, parser: Arc<dyn Parser>) -> Self {
        Self {
            text: text.into(),
            tokenizer,
            parser,
        }
    }

    /// Lemmas of every sentence, in order
    pub fn lemmas(&self) -> Vec<LemmaTuple> {
        let mut lemmas = Vec::new();
        for (idx, sentence) in self.tokenizer.tokenize(&self.text).iter().enumerate() {
            match self.parser.parse(sentence) {
                Some(terminals) => lemmas.extend(terminals),
                None => {
                    warn!(sentence = idx, tokens = sentence.len(), "no parse, using token lemmas");
                    lemmas.extend(sentence_lemmas(sentence));
                }
            }
        }
        lemmas
    }
}

impl fmt::Debug for ParsedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedDocument").field("text", &self.text).finish_non_exhaustive()
    }
}

impl Document for ParsedDocument {
    fn items(&self) -> Box<dyn Iterator<Item = DocItem> + '_> {
        Box::new(self.lemmas().into_iter().map(DocItem::Tuple))
    }
}
