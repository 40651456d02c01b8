// imports
use fnv::FnvHashMap;
use std::io::{self, BufRead, Lines};


/// A token as seen by the counting engine. Only its surface form is ever
/// consulted; annotated tokens implement this to expose the form (or lemma)
/// they should be counted under.
pub trait Token {
    fn surface(&self) -> &str;
}

impl Token for String {
    fn surface(&self) -> &str {
        self.as_str()
    }
}

impl Token for &str {
    fn surface(&self) -> &str {
        self
    }
}

impl Token for Box<str> {
    fn surface(&self) -> &str {
        self
    }
}


/// Corpus statistics needed by the subsampler: how many times each token
/// appears, and how many tokens the corpus holds in total.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorpusStats {
    frequencies: FnvHashMap<String, u64>,
    total: u64,
}

impl CorpusStats {

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds statistics from already known frequencies. The total is the sum of them.
    pub fn from_frequencies<I, W>(frequencies: I) -> Self
    where
        I: IntoIterator<Item = (W, u64)>,
        W: Into<String> {

        let mut stats = Self::new();
        for (word, count) in frequencies {
            stats.add_count(word.into(), count);
        }
        stats
    }

    /// One pass over the sentences, accumulating occurrences of every token.
    pub fn from_sentences<I, S, T>(sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[T]>,
        T: Token {

        let mut stats = Self::new();
        for sentence in sentences {
            stats.accumulate(sentence.as_ref());
        }
        stats
    }

    pub fn accumulate<T: Token>(&mut self, sentence: &[T]) {
        for tok in sentence {
            match self.frequencies.get_mut(tok.surface()) {
                Some(count) => *count += 1,
                None => { self.frequencies.insert(tok.surface().to_owned(), 1); }
            }
        }
        self.total += sentence.len() as u64;
    }

    fn add_count(&mut self, word: String, count: u64) {
        *self.frequencies.entry(word).or_insert(0) += count;
        self.total += count;
    }

    pub fn count(&self, word: &str) -> u64 {
        self.frequencies.get(word).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct tokens.
    pub fn distinct(&self) -> usize {
        self.frequencies.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.frequencies.iter().map(|(word, count)| (word.as_str(), *count))
    }
}


/// Reads a plain text corpus, one sentence per line, tokens separated by
/// whitespace. Empty lines are skipped.
pub struct LineSentences<R> {
    lines: Lines<R>,
    lowercase: bool,
}

impl<R: BufRead> LineSentences<R> {

    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), lowercase: false }
    }

    pub fn lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    fn parse_line(&self, line: &str) -> Vec<String> {
        let line = line.trim();
        if self.lowercase {
            line.to_lowercase().split_whitespace().map(|x| x.to_string()).collect()
        } else {
            line.split_whitespace().map(|x| x.to_string()).collect()
        }
    }
}

impl<R: BufRead> Iterator for LineSentences<R> {
    type Item = io::Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            let sentence = self.parse_line(&line);
            if !sentence.is_empty() {
                return Some(Ok(sentence));
            }
        }
    }
}
