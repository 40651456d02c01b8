// imports
use crate::corpus::{CorpusStats, Token};
use crate::error::{CoocError, Result};
use fnv::FnvHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};


/// What happens to an occurrence the subsampler drops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroppedTokens {
    /// It is no longer a focus word but still serves as context for its neighbours.
    #[default]
    KeepAsContext,
    /// It is removed from the sentence before windowing.
    Remove,
}


/// Per-word probability of dropping an occurrence from focus consideration.
///
/// With `t' = threshold * corpus_size`, a word seen `count > t'` times is
/// dropped with probability `1 - sqrt(t' / count)`. Rarer words never are,
/// and are left out of the table.
#[derive(Clone, Debug)]
pub struct Subsampler {
    probabilities: FnvHashMap<String, f64>,
    threshold: f64,
}

impl Subsampler {

    pub const DEFAULT_THRESHOLD: f64 = 1e-5;

    pub fn build(stats: &CorpusStats, threshold: f64) -> Result<Subsampler> {
        Subsampler::from_frequencies(stats.iter(), stats.total(), threshold)
    }

    pub fn from_frequencies<'a, I>(frequencies: I, corpus_size: u64, threshold: f64) -> Result<Subsampler>
    where
        I: IntoIterator<Item = (&'a str, u64)> {

        // a zero threshold would drop every occurrence of every word
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(CoocError::Config(format!("subsampling threshold must be in (0, 1), got {}", threshold)));
        }

        let relative = threshold * corpus_size as f64;
        let probabilities = frequencies
            .into_iter()
            .filter(|(_, count)| *count as f64 > relative)
            .map(|(word, count)| (word.to_owned(), 1.0 - (relative / count as f64).sqrt()))
            .collect::<FnvHashMap<String, f64>>();

        tracing::debug!("subsampling {} frequent words, relative threshold {}", probabilities.len(), relative);

        Ok(Subsampler { probabilities, threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Probability of dropping one occurrence of `word`; 0 for words absent from the table.
    pub fn probability(&self, word: &str) -> f64 {
        self.probabilities.get(word).copied().unwrap_or(0.0)
    }

    /// Number of words with a non-zero probability.
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Draws one uniform number per token and returns the focus mask:
    /// `false` marks an occurrence that was dropped.
    pub fn apply<T: Token, R: Rng>(&self, sentence: &[T], rng: &mut R) -> Vec<bool> {
        sentence
            .iter()
            .map(|tok| {
                let draw: f64 = rng.gen();
                draw >= self.probability(tok.surface())
            })
            .collect()
    }
}
