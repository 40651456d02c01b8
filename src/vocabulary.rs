// imports
use crate::corpus::CorpusStats;
use fnv::FnvHashMap;
use std::sync::Arc;


/// Read access shared by both vocabulary variants.
pub trait Lexicon {
    /// Index of `token`, or `None` when the token is out of vocabulary.
    fn index_of(&self, token: &str) -> Option<usize>;

    /// Token stored at `index`.
    fn token(&self, index: usize) -> Option<&str>;

    /// Tokens in index order.
    fn tokens(&self) -> &[String];

    fn len(&self) -> usize {
        self.tokens().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, token: &str) -> bool {
        self.index_of(token).is_some()
    }

    fn iter(&self) -> std::slice::Iter<'_, String> {
        self.tokens().iter()
    }
}


// ordered tokens plus the reverse map; indices are contiguous from 0
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Words {
    words: Vec<String>,
    t2i: FnvHashMap<String, usize>,
}

impl Words {

    fn get(&self, token: &str) -> Option<usize> {
        self.t2i.get(token).copied()
    }

    fn push(&mut self, token: &str) -> usize {
        if let Some(i) = self.get(token) {
            return i
        }
        let i = self.words.len();
        self.words.push(token.to_owned());
        self.t2i.insert(token.to_owned(), i);
        i
    }
}


/// Closed vocabulary, built before counting starts and never modified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Vocabulary {
    inner: Words,
}

impl Vocabulary {

    /// Builds a vocabulary in the given order. A repeated token keeps the
    /// index of its first occurrence.
    pub fn new<I, W>(words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str> {

        let mut inner = Words::default();
        for word in words {
            inner.push(word.as_ref());
        }
        Self { inner }
    }

    /// The `max_size` most frequent tokens of the corpus, most frequent first.
    /// Ties are broken lexicographically so the result does not depend on
    /// hash map ordering.
    pub fn most_frequent(stats: &CorpusStats, max_size: usize) -> Self {

        let mut tup = stats.iter().collect::<Vec<(&str, u64)>>();
        tup.sort_unstable_by(|(word_a, freq_a), (word_b, freq_b)| {
            freq_b.cmp(freq_a).then_with(|| word_a.cmp(word_b))
        });
        tup.truncate(max_size);

        Self::new(tup.into_iter().map(|(word, _)| word))
    }
}

impl Lexicon for Vocabulary {
    fn index_of(&self, token: &str) -> Option<usize> {
        self.inner.get(token)
    }

    fn token(&self, index: usize) -> Option<&str> {
        self.inner.words.get(index).map(|w| w.as_str())
    }

    fn tokens(&self) -> &[String] {
        &self.inner.words
    }
}

impl From<DynamicVocabulary> for Vocabulary {
    fn from(vocab: DynamicVocabulary) -> Self {
        Self { inner: vocab.inner }
    }
}


/// Vocabulary that grows on demand. Indices are only ever appended.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicVocabulary {
    inner: Words,
}

impl DynamicVocabulary {

    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `token`, appending it first if it was never seen.
    pub fn index_of_or_insert(&mut self, token: &str) -> usize {
        self.inner.push(token)
    }

    /// Freezes the vocabulary once no more growth is expected.
    pub fn freeze(self) -> Vocabulary {
        Vocabulary::from(self)
    }
}

impl Lexicon for DynamicVocabulary {
    fn index_of(&self, token: &str) -> Option<usize> {
        self.inner.get(token)
    }

    fn token(&self, index: usize) -> Option<&str> {
        self.inner.words.get(index).map(|w| w.as_str())
    }

    fn tokens(&self) -> &[String] {
        &self.inner.words
    }
}


/// How context tokens are indexed during a run: against a vocabulary given
/// up front, or against one discovered while counting.
#[derive(Clone, Debug)]
pub enum ContextVocabulary {
    Fixed(Arc<Vocabulary>),
    Dynamic,
}

impl ContextVocabulary {

    pub fn fixed(vocab: Vocabulary) -> Self {
        ContextVocabulary::Fixed(Arc::new(vocab))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ContextVocabulary::Dynamic)
    }
}


#[cfg(test)]
mod tests {

    use super::{CorpusStats, DynamicVocabulary, Lexicon, Vocabulary};

    #[test]
    fn fixed_vocabulary_lookup() {
        let vocab = Vocabulary::new(["a", "b", "c", "b"]);

        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.index_of("a"), Some(0));
        assert_eq!(vocab.index_of("b"), Some(1));
        assert_eq!(vocab.index_of("c"), Some(2));
        assert_eq!(vocab.index_of("d"), None);
        assert_eq!(vocab.token(2), Some("c"));
        assert_eq!(vocab.token(3), None);

        // restartable, in index order
        let first = vocab.iter().cloned().collect::<Vec<String>>();
        let second = vocab.iter().cloned().collect::<Vec<String>>();
        assert_eq!(first, vec!["a", "b", "c"]);
        assert_eq!(first, second);
    }

    #[test]
    fn dynamic_vocabulary_only_appends() {
        let mut vocab = DynamicVocabulary::new();
        assert!(vocab.is_empty());

        assert_eq!(vocab.index_of_or_insert("x"), 0);
        assert_eq!(vocab.index_of_or_insert("y"), 1);
        assert_eq!(vocab.index_of_or_insert("x"), 0);
        assert_eq!(vocab.index_of("z"), None);
        assert_eq!(vocab.index_of_or_insert("z"), 2);

        let frozen = vocab.freeze();
        assert_eq!(frozen.tokens(), &["x".to_string(), "y".to_string(), "z".to_string()]);
    }

    #[test]
    fn most_frequent_breaks_ties_by_token() {
        let stats = CorpusStats::from_frequencies([("you", 4), ("are", 3), ("a", 3), ("pro", 1)]);
        let vocab = Vocabulary::most_frequent(&stats, 3);

        assert_eq!(vocab.tokens(), &["you".to_string(), "a".to_string(), "are".to_string()]);

        let all = Vocabulary::most_frequent(&stats, 100);
        assert_eq!(all.len(), 4);
    }
}
