use crate::error::{Result, TopicError};

/// Separator between the lemma and its category in a lemma key
pub const KEY_SEPARATOR: char = '/';

/// (lemma, category)
pub type LemmaTuple = (String, String);

/// Convert a (lemma, category) pair into a vocabulary key
///
/// The lemma is lower-cased, hyphens are dropped and spaces become
/// underscores, then the category is appended after a `/`.
///
/// # Examples
/// ```
/// use topic_vectorizer::vectorizer::key::lemma_key;
/// assert_eq!(lemma_key("borgarstjórnar-fundur", "kk"), "borgarstjórnarfundur/kk");
/// assert_eq!(lemma_key("að minnsta kosti", "ao"), "að_minnsta_kosti/ao");
/// ```
pub fn lemma_key(lemma: &str, category: &str) -> String {
    let mut key = lemma.to_lowercase().replace('-', "").replace(' ', "_");
    key.push(KEY_SEPARATOR);
    key.push_str(category);
    key
}

/// Whether the string carries a category separator
#[inline]
pub fn is_lemma_key(s: &str) -> bool {
    s.contains(KEY_SEPARATOR)
}

/// One element of an inference query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LemmaInput {
    /// (lemma, category), normalized on use
    Tuple(String, String),
    /// already normalized "lemma/category" key
    Key(String),
}

impl LemmaInput {
    pub fn tuple(lemma: impl Into<String>, category: impl Into<String>) -> Self {
        LemmaInput::Tuple(lemma.into(), category.into())
    }

    pub fn key(key: impl Into<String>) -> Self {
        LemmaInput::Key(key.into())
    }
}

impl From<&str> for LemmaInput {
    fn from(key: &str) -> Self {
        LemmaInput::Key(key.to_string())
    }
}

impl From<String> for LemmaInput {
    fn from(key: String) -> Self {
        LemmaInput::Key(key)
    }
}

impl From<(&str, &str)> for LemmaInput {
    fn from((lemma, category): (&str, &str)) -> Self {
        LemmaInput::tuple(lemma, category)
    }
}

impl From<LemmaTuple> for LemmaInput {
    fn from((lemma, category): LemmaTuple) -> Self {
        LemmaInput::Tuple(lemma, category)
    }
}

/// Turn a query list into vocabulary keys
///
/// The shape of the whole list is taken from its first element:
/// a list starting with a tuple must hold only tuples, a list starting
/// with a key must hold only keys, and every key must contain `/`.
pub fn keys_from_inputs(inputs: &[LemmaInput]) -> Result<Vec<String>> {
    let Some(first) = inputs.first() else {
        return Ok(Vec::new());
    };
    match first {
        LemmaInput::Tuple(..) => inputs
            .iter()
            .map(|input| match input {
                LemmaInput::Tuple(lemma, category) => Ok(lemma_key(lemma, category)),
                LemmaInput::Key(_) => Err(TopicError::MixedLemmaInput),
            })
            .collect(),
        LemmaInput::Key(_) => inputs
            .iter()
            .map(|input| match input {
                LemmaInput::Key(key) if is_lemma_key(key) => Ok(key.clone()),
                LemmaInput::Key(key) => Err(TopicError::MalformedLemma(key.clone())),
                LemmaInput::Tuple(..) => Err(TopicError::MixedLemmaInput),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lemma_key_collapses_case_hyphen_and_space() {
        assert_eq!(lemma_key("maður", "kk"), "maður/kk");
        assert_eq!(lemma_key("að minnsta kosti", "ao"), "að_minnsta_kosti/ao");
        assert_eq!(lemma_key("borgarstjórnar-fundur", "kk"), "borgarstjórnarfundur/kk");
        assert_eq!(lemma_key("Vestur-Þýskaland", "hk"), "vesturþýskaland/hk");
        assert_eq!(
            lemma_key("dóms- og kirkjumálaráðherra", "kk"),
            "dóms_og_kirkjumálaráðherra/kk"
        );
        assert_eq!(lemma_key("Friðjón Þórðarson", "person_kk"), "friðjón_þórðarson/person_kk");
    }

    #[test]
    fn lemma_key_is_idempotent_on_the_lemma_part() {
        for (lemma, cat) in [("Borgar-Stjórn", "kvk"), ("AÐ minnsta  KOSTI", "ao"), ("", "x")] {
            let key = lemma_key(lemma, cat);
            let (normalized, category) = key.rsplit_once(KEY_SEPARATOR).unwrap();
            assert_eq!(category, cat);
            assert_eq!(lemma_key(normalized, cat), key);
            assert_eq!(lemma_key(lemma, cat), key);
        }
    }

    #[test]
    fn lemma_key_variants_share_one_key() {
        let keys: Vec<String> = ["Búðar-Lok", "búðar lok", "BÚÐAR LOK", "búðarlok"]
            .iter()
            .map(|v| lemma_key(v, "kvk"))
            .collect();
        assert_eq!(keys[0], "búðarlok/kvk");
        assert_eq!(keys[1], "búðar_lok/kvk");
        assert_eq!(keys[1], keys[2]);
        assert_eq!(keys[0], keys[3]);
    }

    #[test]
    fn keys_from_tuples_and_keys() {
        let tuples = vec![LemmaInput::tuple("Maður", "kk"), ("búð", "kvk").into()];
        assert_eq!(keys_from_inputs(&tuples).unwrap(), vec!["maður/kk", "búð/kvk"]);

        let keys: Vec<LemmaInput> = vec!["maður/kk".into(), "búð/kvk".into()];
        assert_eq!(keys_from_inputs(&keys).unwrap(), vec!["maður/kk", "búð/kvk"]);

        assert!(keys_from_inputs(&[]).unwrap().is_empty());
    }

    #[test]
    fn keys_without_separator_are_rejected() {
        let keys: Vec<LemmaInput> = vec!["maður/kk".into(), "búð".into()];
        match keys_from_inputs(&keys) {
            Err(TopicError::MalformedLemma(k)) => assert_eq!(k, "búð"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mixed_inputs_are_rejected() {
        let mixed = vec![LemmaInput::tuple("maður", "kk"), "búð/kvk".into()];
        assert!(matches!(keys_from_inputs(&mixed), Err(TopicError::MixedLemmaInput)));
        let mixed = vec!["búð/kvk".into(), LemmaInput::tuple("maður", "kk")];
        assert!(matches!(keys_from_inputs(&mixed), Err(TopicError::MixedLemmaInput)));
    }
}
