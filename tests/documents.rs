use std::sync::Arc;

use topic_vectorizer::corpus::{
    Document, Meaning, ParsedDocument, Parser, PersonName, Sentence, TaggedTextTokenizer, Token, TokenDocument,
    Tokenizer, VecCorpus,
};
use topic_vectorizer::{LemmaInput, LemmaTuple, Model, ModelConfig, TrainOptions};

/// Splits on '.' into sentences and on whitespace into tokens.
/// Capitalized words are people, words ending in '?' are unknown,
/// everything else is its own lemma with category "kk".
struct FakeTokenizer;

impl Tokenizer for FakeTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Sentence> {
        text.split('.')
            .map(|s| {
                s.split_whitespace()
                    .map(|w| {
                        if let Some(stem) = w.strip_suffix('?') {
                            Token::word(stem, vec![])
                        } else if w.chars().next().is_some_and(char::is_uppercase) {
                            Token::Person {
                                text: w.to_string(),
                                names: vec![PersonName::new(w, "kvk")],
                            }
                        } else {
                            Token::word(w, vec![Meaning::new(w, "kk"), Meaning::new(w, "so")])
                        }
                    })
                    .collect::<Sentence>()
            })
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Parses only sentences of exactly two tokens, tagging every terminal "p"
struct PickyParser;

impl Parser for PickyParser {
    fn parse(&self, sentence: &[Token]) -> Option<Vec<LemmaTuple>> {
        if sentence.len() != 2 {
            return None;
        }
        Some(sentence.iter().map(|t| (t.text().to_string(), "p".to_string())).collect())
    }
}

#[test]
fn token_document_uses_first_candidate() {
    let doc = TokenDocument::new("hestur Anna khljsdf?", Arc::new(FakeTokenizer));
    assert_eq!(doc.keys(), vec!["hestur/kk", "anna/person_kvk", "khljsdf/x"]);
}

#[test]
fn parse_failure_falls_back_per_sentence() {
    let doc = ParsedDocument::new(
        "hestur hundur. köttur mús rotta. fugl fiskur",
        Arc::new(FakeTokenizer),
        Arc::new(PickyParser),
    );
    assert_eq!(
        doc.keys(),
        vec![
            "hestur/p",
            "hundur/p",
            // three tokens: no parse, token strategy
            "köttur/kk",
            "mús/kk",
            "rotta/kk",
            "fugl/p",
            "fiskur/p",
        ]
    );
}

#[test]
fn tokenizer_and_parser_are_shared_between_documents() {
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(FakeTokenizer);
    let parser: Arc<dyn Parser> = Arc::new(PickyParser);
    let docs: Vec<ParsedDocument> = ["a b", "c d e"]
        .iter()
        .map(|text| ParsedDocument::new(*text, tokenizer.clone(), parser.clone()))
        .collect();
    assert_eq!(Arc::strong_count(&tokenizer), 3);
    assert_eq!(docs[0].keys(), vec!["a/p", "b/p"]);
    assert_eq!(docs[1].keys(), vec!["c/kk", "d/kk", "e/kk"]);
}

#[test]
fn tagged_text_trains_a_model() {
    let tagged = [
        "Maðurinn nkeng maður\nfór sfg3eþ fara\nút aa út\ní aþ í\nbúðina nveog búð\n. . .\n",
        "Búðin nvengr búð\nvar sfg3eþ vera\nlokuð lvensf lokaður\n. . .\n",
        "Maðurinn nkeng maður\nvar sfg3eþ vera\nleiður lkensf leiður\n. . .\n",
        "Það fphen það\nvar sfg3eþ vera\nhægt lhensf hægur\nað cn að\nkaupa sng kaupa\nmat nkeo matur\ní aþ í\nbúðinni nveþg búð\n. . .\n",
    ];
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(TaggedTextTokenizer::new());
    let corpus: VecCorpus<TokenDocument> = tagged
        .iter()
        .map(|text| TokenDocument::new(*text, tokenizer.clone()))
        .collect();
    assert_eq!(
        corpus_keys(&corpus, 1),
        vec!["búð/kvk", "vera/so", "lokaður/lo"]
    );

    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::with_config(ModelConfig::new("tagged").with_directory(dir.path())).unwrap();
    model
        .train(&corpus, &TrainOptions::default().with_min_count(0))
        .unwrap();
    let a = model
        .topic_vector(&[LemmaInput::key("maður/kk"), LemmaInput::key("búð/kvk")])
        .unwrap();
    let first = TokenDocument::new(tagged[0], tokenizer.clone());
    let b = model.topic_vector_for(&first).unwrap();
    assert!(!a.is_empty());
    assert!(Model::similarity(&a, &b) > 0.5);
}

fn corpus_keys(corpus: &VecCorpus<TokenDocument>, n: usize) -> Vec<String> {
    use topic_vectorizer::corpus::Corpus;
    corpus.documents().nth(n).map(|doc| doc.keys()).unwrap_or_default()
}
