// imports
use crate::config::{CountingConfig, CountingMetadata};
use crate::context::ContextWindow;
use crate::corpus::{CorpusStats, Token};
use crate::error::{CoocError, Result};
use crate::matrix::CsrMatrix;
use crate::reducer::{combine_fixed, Reducer};
use crate::subsampling::Subsampler;
use crate::table::check_indexable;
use crate::vocabulary::{ContextVocabulary, Lexicon, Vocabulary};
use crate::worker::{shard_rng, PartialCounts, Worker};

use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;


/// The result of a run: the matrix, the vocabularies indexing its rows and
/// columns, and what it was computed from.
#[derive(Clone, Debug)]
pub struct Cooccurrences {
    pub matrix: CsrMatrix,
    pub words: Arc<Vocabulary>,
    pub contexts: Arc<Vocabulary>,
    pub metadata: CountingMetadata,
}

impl Cooccurrences {

    /// Count of `context` inside the window of `word`; 0 when either is unknown.
    pub fn get(&self, word: &str, context: &str) -> u64 {
        match (self.words.index_of(word), self.contexts.index_of(context)) {
            (Some(row), Some(col)) => self.matrix.get(row, col),
            _ => 0,
        }
    }
}


/// Counts co-occurrences over a corpus with a pool of workers.
///
/// The sentence source is read by a single producer in waves; each wave is
/// cut into contiguous shards of `shard_size` sentences that the pool counts
/// in parallel, then the reducer folds the partial tables into the global
/// accumulator. Any failure aborts the whole run.
pub struct CooccurrenceCounter {
    words: Arc<Vocabulary>,
    contexts: ContextVocabulary,
    window: ContextWindow,
    subsampler: Option<Subsampler>,
    config: CountingConfig,
}

impl CooccurrenceCounter {

    /// Checks the configuration and prepares the read-only state shared by
    /// the workers. `stats` is only needed when subsampling is on.
    pub fn new(words: Vocabulary,
        contexts: ContextVocabulary,
        config: CountingConfig,
        stats: Option<&CorpusStats>) -> Result<CooccurrenceCounter> {

        config.validate()?;

        if words.is_empty() {
            return Err(CoocError::Config("word vocabulary is empty".to_string()))
        }
        // rows and columns must fit in a packed cell key
        check_indexable(words.len())?;
        if let ContextVocabulary::Fixed(vocab) = &contexts {
            check_indexable(vocab.len())?;
        }

        let subsampler = match (config.subsampling, stats) {
            (false, _) => None,
            (true, Some(stats)) => Some(Subsampler::build(stats, config.threshold)?),
            (true, None) => return Err(CoocError::Config("subsampling requires corpus statistics".to_string())),
        };

        Ok(CooccurrenceCounter {
            words: Arc::new(words),
            contexts,
            window: config.window.to_window(),
            subsampler,
            config,
        })
    }

    pub fn config(&self) -> &CountingConfig {
        &self.config
    }

    pub fn window(&self) -> ContextWindow {
        self.window
    }

    pub fn subsampler(&self) -> Option<&Subsampler> {
        self.subsampler.as_ref()
    }

    /// Counts over an infallible sentence source.
    pub fn count<I, S, T>(&self, sentences: I) -> Result<Cooccurrences>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[T]> + Send,
        T: Token {

        self.try_count(sentences.into_iter().map(Ok::<S, Infallible>))
    }

    /// Counts over a fallible sentence source. The first source error aborts
    /// the run; nothing read so far is returned.
    pub fn try_count<I, S, T, E>(&self, sentences: I) -> Result<Cooccurrences>
    where
        I: IntoIterator<Item = std::result::Result<S, E>>,
        S: AsRef<[T]> + Send,
        T: Token,
        E: Display {

        let timer = Instant::now();
        let workers = self.config.workers();
        let shard_size = self.config.shard_size;
        tracing::info!("{}", self.config);

        let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
        let mut reducer = Reducer::new(&self.contexts);
        let mut sentences = sentences.into_iter();
        let mut next_shard = 0usize;
        let mut n_sentences = 0usize;
        let mut exhausted = false;

        while !exhausted {

            // single producer: cut the next `workers` shards off the source
            let mut shards: Vec<(usize, Vec<S>)> = Vec::with_capacity(workers);
            while shards.len() < workers && !exhausted {
                let mut shard = Vec::new();
                while shard.len() < shard_size {
                    match sentences.next() {
                        Some(Ok(sentence)) => shard.push(sentence),
                        Some(Err(e)) => return Err(CoocError::Source { shard: next_shard, message: e.to_string() }),
                        None => {
                            exhausted = true;
                            break
                        }
                    }
                }
                if !shard.is_empty() {
                    n_sentences += shard.len();
                    shards.push((next_shard, shard));
                    next_shard += 1;
                }
            }

            if shards.is_empty() {
                break
            }

            tracing::debug!("counting shards {}..{}, {} sentences read so far", next_shard - shards.len(), next_shard, n_sentences);
            let partials = self.count_wave(&pool, shards)?;
            reducer.merge_all(partials)?;
        }

        let (accumulator, contexts) = reducer.finish()?;
        let matrix = CsrMatrix::assemble(accumulator, self.words.len(), contexts.len())?;

        tracing::info!(
            "counted {} pairs over {} sentences in {} shards: {}x{} matrix, {} non-zero (density {:.3e}), took {} seconds",
            matrix.sum(), n_sentences, next_shard, matrix.rows(), matrix.cols(), matrix.nnz(), matrix.density(),
            timer.elapsed().as_secs()
        );

        let metadata = self.metadata(workers, n_sentences);
        Ok(Cooccurrences { matrix, words: Arc::clone(&self.words), contexts, metadata })
    }

    // runs one wave of shards on the pool; fixed-context partials are
    // tree-reduced in parallel, dynamic ones are kept in shard order
    fn count_wave<S, T>(&self, pool: &ThreadPool, shards: Vec<(usize, Vec<S>)>) -> Result<Vec<PartialCounts>>
    where
        S: AsRef<[T]> + Send,
        T: Token {

        let worker = self.worker();
        let seed = self.config.seed;

        pool.install(|| {
            let results = shards.into_par_iter().map(|(shard, sentences)| {
                let mut rng = shard_rng(seed, shard);
                worker.process(shard, &sentences, &mut rng)
            });

            if self.contexts.is_dynamic() {
                results.collect::<Result<Vec<PartialCounts>>>()
            } else {
                match results.try_reduce_with(|left, right| Ok(combine_fixed(left, right))) {
                    Some(partial) => Ok(vec![partial?]),
                    None => Ok(Vec::new()),
                }
            }
        })
    }

    fn worker(&self) -> Worker<'_> {
        Worker {
            words: &self.words,
            contexts: &self.contexts,
            window: self.window,
            subsampler: self.subsampler.as_ref(),
            dropped: self.config.dropped_tokens,
        }
    }

    fn metadata(&self, num_workers: usize, sentences: usize) -> CountingMetadata {
        CountingMetadata {
            corpus: self.config.corpus.clone(),
            window: self.window,
            subsampling: self.subsampler.is_some(),
            threshold: self.subsampler.as_ref().map(|sub| sub.threshold()),
            dropped_tokens: self.config.dropped_tokens,
            dynamic_contexts: self.contexts.is_dynamic(),
            seed: self.config.seed,
            shard_size: self.config.shard_size,
            num_workers,
            sentences,
        }
    }
}
