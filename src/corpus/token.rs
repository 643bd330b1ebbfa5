use std::fmt;
use std::sync::Arc;

use crate::corpus::{DocItem, Document};
use crate::vectorizer::key::LemmaTuple;

/// Category given to words the tokenizer could not look up
pub const UNKNOWN_CATEGORY: &str = "x";

/// One lemma candidate of a word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meaning {
    pub lemma: String,
    pub category: String,
}

impl Meaning {
    pub fn new(lemma: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            lemma: lemma.into(),
            category: category.into(),
        }
    }
}

/// One reading of a person name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    pub name: String,
    /// kk / kvk / hk
    pub gender: String,
}

impl PersonName {
    pub fn new(name: impl Into<String>, gender: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gender: gender.into(),
        }
    }
}

/// Typed token produced by a `Tokenizer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// word with its lemma candidates, best first; empty when unknown
    Word { text: String, meanings: Vec<Meaning> },
    Person { text: String, names: Vec<PersonName> },
    Entity { text: String },
    Company { text: String },
    Punctuation { text: String },
    Other { text: String },
}

/// Tokens of one sentence
pub type Sentence = Vec<Token>;

impl Token {
    pub fn word(text: impl Into<String>, meanings: Vec<Meaning>) -> Self {
        Token::Word {
            text: text.into(),
            meanings,
        }
    }

    /// Surface text
    pub fn text(&self) -> &str {
        match self {
            Token::Word { text, .. }
            | Token::Person { text, .. }
            | Token::Entity { text }
            | Token::Company { text }
            | Token::Punctuation { text }
            | Token::Other { text } => text,
        }
    }

    /// (lemma, category) of the token, taking the first candidate
    ///
    /// Unknown words keep their surface form with category `x`;
    /// punctuation and other tokens have no lemma.
    pub fn lemma(&self) -> Option<LemmaTuple> {
        match self {
            Token::Word { text, meanings } => Some(match meanings.first() {
                Some(m) => (m.lemma.clone(), m.category.clone()),
                None => (text.clone(), UNKNOWN_CATEGORY.to_string()),
            }),
            Token::Person { text, names } => Some(match names.first() {
                Some(n) => (n.name.clone(), format!("person_{}", n.gender)),
                None => (text.clone(), "person".to_string()),
            }),
            Token::Entity { text } => Some((text.clone(), "entity".to_string())),
            Token::Company { text } => Some((text.clone(), "company".to_string())),
            Token::Punctuation { .. } | Token::Other { .. } => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Lemmas of a sentence with the first-candidate strategy
pub fn sentence_lemmas(sentence: &[Token]) -> Vec<LemmaTuple> {
    sentence.iter().filter_map(Token::lemma).collect()
}

/// Splits raw text into sentences of typed tokens
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Sentence>;
}

/// Document backed by raw text and a tokenizer
#[derive(Clone)]
pub struct TokenDocument {
    text: String,
    tokenizer: Arc<dyn Tokenizer>,
}

impl TokenDocument {
    pub fn new(text: impl Into<String>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            text: text.into(),
            tokenizer,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Debug for TokenDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenDocument").field("text", &self.text).finish_non_exhaustive()
    }
}

impl Document for TokenDocument {
    fn items(&self) -> Box<dyn Iterator<Item = DocItem> + '_> {
        let sentences = self.tokenizer.tokenize(&self.text);
        Box::new(
            sentences
                .into_iter()
                .flatten()
                .filter_map(|token| token.lemma())
                .map(DocItem::Tuple),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_takes_first_meaning_or_falls_back_to_unknown() {
        let known = Token::word("menn", vec![Meaning::new("maður", "kk"), Meaning::new("menn", "x")]);
        assert_eq!(known.lemma(), Some(("maður".into(), "kk".into())));
        let unknown = Token::word("khljsdf", vec![]);
        assert_eq!(unknown.lemma(), Some(("khljsdf".into(), "x".into())));
    }

    #[test]
    fn names_and_entities() {
        let person = Token::Person {
            text: "Jóni".into(),
            names: vec![PersonName::new("Jón", "kk")],
        };
        assert_eq!(person.lemma(), Some(("Jón".into(), "person_kk".into())));
        let bare = Token::Person {
            text: "Jóni".into(),
            names: vec![],
        };
        assert_eq!(bare.lemma(), Some(("Jóni".into(), "person".into())));
        let entity = Token::Entity { text: "Reykjavík".into() };
        assert_eq!(entity.lemma(), Some(("Reykjavík".into(), "entity".into())));
        let company = Token::Company { text: "Miðeind ehf.".into() };
        assert_eq!(company.lemma(), Some(("Miðeind ehf.".into(), "company".into())));
    }

    #[test]
    fn punctuation_has_no_lemma() {
        assert_eq!(Token::Punctuation { text: ".".into() }.lemma(), None);
        assert_eq!(Token::Other { text: "12:00".into() }.lemma(), None);
        assert!(sentence_lemmas(&[Token::Punctuation { text: ",".into() }]).is_empty());
    }
}
