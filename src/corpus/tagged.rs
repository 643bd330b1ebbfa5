//! Tokenizer for the output of an external tagger + lemmatizer
//!
//! Input is one token per line, `surface tag lemma`, separated by
//! whitespace, with a blank line between sentences. Tags follow the
//! IceNLP tagset; the lemmatizer's `<UNKNOWN>` markers are ignored.
//! A line with only two columns uses the surface form as lemma.

use tracing::debug;

use crate::corpus::token::{Meaning, PersonName, Sentence, Token, Tokenizer};

const UNKNOWN_MARKER: &str = "<UNKNOWN>";

#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedTextTokenizer;

impl TaggedTextTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for TaggedTextTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        let mut current: Sentence = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let mut cols = line.split_whitespace().filter(|col| *col != UNKNOWN_MARKER);
            let (Some(surface), Some(tag)) = (cols.next(), cols.next()) else {
                if line.trim().is_empty() {
                    if !current.is_empty() {
                        sentences.push(std::mem::take(&mut current));
                    }
                } else {
                    debug!(line = lineno + 1, "tagged line without a tag, skipped");
                }
                continue;
            };
            let lemma = cols.next().unwrap_or(surface);
            current.push(classify(surface, tag, lemma));
        }
        if !current.is_empty() {
            sentences.push(current);
        }
        sentences
    }
}

/// Build a typed token from one tagged line
fn classify(surface: &str, tag: &str, lemma: &str) -> Token {
    let mut chars = tag.chars();
    let Some(class) = chars.next() else {
        return Token::Other { text: surface.into() };
    };
    if !class.is_alphabetic() {
        return Token::Punctuation { text: surface.into() };
    }
    let sub = chars.next();
    let word = |category: &str| Token::word(surface, vec![Meaning::new(lemma, category)]);
    match class {
        'n' => {
            let gender = match sub {
                Some('k') => "kk",
                Some('v') => "kvk",
                Some('h') => "hk",
                _ => "x",
            };
            if tag.ends_with("-m") {
                Token::Person {
                    text: surface.into(),
                    names: vec![PersonName::new(lemma, gender)],
                }
            } else if tag.ends_with("-ö") || tag.ends_with("-s") {
                Token::Entity { text: lemma.into() }
            } else {
                word(gender)
            }
        }
        's' => word("so"),
        'l' => word("lo"),
        'g' => word("gr"),
        't' => word("to"),
        'f' if sub == Some('p') => word("pfn"),
        'f' => word("fn"),
        'a' => match sub {
            Some('o') | Some('þ') | Some('e') => word("fs"),
            Some('u') => word("uh"),
            _ => word("ao"),
        },
        'c' if sub == Some('n') => word("nhm"),
        'c' => word("st"),
        'e' => word("e"),
        'x' => Token::word(surface, Vec::new()),
        _ => Token::Other { text: surface.into() },
    }
}
