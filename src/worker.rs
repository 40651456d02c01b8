// imports
use crate::context::ContextWindow;
use crate::corpus::Token;
use crate::error::Result;
use crate::subsampling::{DroppedTokens, Subsampler};
use crate::table::{narrow, CellKey, CountTable};
use crate::vocabulary::{ContextVocabulary, DynamicVocabulary, Lexicon, Vocabulary};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;


/// One worker's local tally over its shard.
///
/// With a dynamic context vocabulary, column indices of `table` refer to
/// `fragment`, the worker's private vocabulary, not to any global numbering.
/// `pairs` is the number of pairs observed, tracked apart from the table so
/// the reducer can check that nothing was lost on the way.
#[derive(Clone, Debug, Default)]
pub struct PartialCounts {
    pub shard: usize,
    pub table: CountTable,
    pub fragment: Option<DynamicVocabulary>,
    pub sentences: usize,
    pub pairs: u64,
}

impl PartialCounts {

    pub fn total(&self) -> u64 {
        self.table.total()
    }
}


/// The random stream of a shard. It depends only on the run seed and the
/// shard ordinal, so results do not depend on how many workers run.
pub fn shard_rng(seed: u64, shard: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(shard as u64);
    rng
}


// resolves context tokens to column indices while a shard is processed
enum Columns<'a> {
    Fixed(&'a Vocabulary),
    Local(DynamicVocabulary),
}

impl<'a> Columns<'a> {

    fn admits(&self, token: &str) -> bool {
        match self {
            Columns::Fixed(vocab) => vocab.contains(token),
            Columns::Local(_) => true,
        }
    }

    fn column(&mut self, token: &str) -> Result<Option<u32>> {
        let index = match self {
            Columns::Fixed(vocab) => vocab.index_of(token),
            Columns::Local(local) => Some(local.index_of_or_insert(token)),
        };
        index.map(narrow).transpose()
    }
}


/// Everything a worker reads while processing a shard. All of it is shared
/// read-only between workers.
#[derive(Clone, Copy)]
pub struct Worker<'a> {
    pub words: &'a Vocabulary,
    pub contexts: &'a ContextVocabulary,
    pub window: ContextWindow,
    pub subsampler: Option<&'a Subsampler>,
    pub dropped: DroppedTokens,
}

impl<'a> Worker<'a> {

    /// Counts every (focus, context) pair of the shard into a fresh table.
    /// An empty shard gives an empty table.
    pub fn process<S, T>(&self, shard: usize, sentences: &[S], rng: &mut ChaCha8Rng) -> Result<PartialCounts>
    where
        S: AsRef<[T]>,
        T: Token {

        let mut table = CountTable::new();
        let mut columns = match self.contexts {
            ContextVocabulary::Fixed(vocab) => Columns::Fixed(vocab.as_ref()),
            ContextVocabulary::Dynamic => Columns::Local(DynamicVocabulary::new()),
        };

        for sentence in sentences {
            self.count_sentence(sentence.as_ref(), &mut table, &mut columns, rng)?;
        }

        let fragment = match columns {
            Columns::Local(local) => Some(local),
            Columns::Fixed(_) => None,
        };

        tracing::debug!("shard {}: {} sentences, {} pairs in {} cells", shard, sentences.len(), table.total(), table.len());

        let pairs = table.total();
        Ok(PartialCounts { shard, table, fragment, sentences: sentences.len(), pairs })
    }

    fn count_sentence<T: Token>(&self,
        sentence: &[T],
        table: &mut CountTable,
        columns: &mut Columns,
        rng: &mut ChaCha8Rng) -> Result<()> {

        let mut surfaces = sentence.iter().map(|tok| tok.surface()).collect::<Vec<&str>>();
        let mut mask = self.subsampler.map(|sub| sub.apply(sentence, rng));

        if let (Some(keep), DroppedTokens::Remove) = (&mask, self.dropped) {
            surfaces = surfaces.iter().zip(keep).filter(|(_, k)| **k).map(|(s, _)| *s).collect();
            mask = None;
        }

        let len = surfaces.len();
        for focus in 0..len {

            if let Some(keep) = &mask {
                if !keep[focus] { continue }
            }

            let row = match self.words.index_of(surfaces[focus]) {
                Some(row) => narrow(row)?,
                None => continue,
            };

            let extent = self.window.sample_extent(len, rng);
            let positions = self.window.positions(len, focus, extent, |p| columns.admits(surfaces[p]));

            for p in positions {
                if let Some(col) = columns.column(surfaces[p])? {
                    table.increment(CellKey::pack(row, col));
                }
            }
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {

    use super::{shard_rng, Worker};
    use crate::context::ContextWindow;
    use crate::corpus::CorpusStats;
    use crate::subsampling::{DroppedTokens, Subsampler};
    use crate::vocabulary::{ContextVocabulary, Lexicon, Vocabulary};

    fn worker<'a>(words: &'a Vocabulary, contexts: &'a ContextVocabulary, half_size: usize) -> Worker<'a> {
        Worker {
            words,
            contexts,
            window: ContextWindow::symmetric(half_size),
            subsampler: None,
            dropped: DroppedTokens::KeepAsContext,
        }
    }

    #[test]
    fn fixed_context_counts() {
        let words = Vocabulary::new(["a", "b", "c", "d"]);
        let contexts = ContextVocabulary::fixed(words.clone());
        let shard = vec![vec!["a", "b", "c"], vec!["b", "c", "d"]];

        let partial = worker(&words, &contexts, 1).process(0, &shard, &mut shard_rng(0, 0)).unwrap();

        assert!(partial.fragment.is_none());
        assert_eq!(partial.sentences, 2);
        assert_eq!(partial.total(), 8);
        assert_eq!(partial.table.get(0, 1), 1);
        assert_eq!(partial.table.get(1, 0), 1);
        assert_eq!(partial.table.get(1, 2), 2);
        assert_eq!(partial.table.get(2, 1), 2);
        assert_eq!(partial.table.get(2, 3), 1);
        assert_eq!(partial.table.get(3, 2), 1);
    }

    #[test]
    fn out_of_vocabulary_tokens_are_skipped() {
        let words = Vocabulary::new(["a"]);
        let contexts = ContextVocabulary::fixed(Vocabulary::new(["b"]));
        let shard = vec![vec!["a", "x", "b", "a"]];

        let partial = worker(&words, &contexts, 2).process(0, &shard, &mut shard_rng(0, 0)).unwrap();

        // first "a" sees b at distance 2, last "a" sees b at distance 1
        assert_eq!(partial.table.get(0, 0), 2);
        assert_eq!(partial.total(), 2);
    }

    #[test]
    fn dynamic_context_builds_local_fragment() {
        let words = Vocabulary::new(["a"]);
        let contexts = ContextVocabulary::Dynamic;
        let shard = vec![vec!["z", "a", "y"], vec!["q"], vec!["a", "z"]];

        let partial = worker(&words, &contexts, 1).process(3, &shard, &mut shard_rng(0, 3)).unwrap();
        let fragment = partial.fragment.as_ref().unwrap();

        // "q" is never in the window of a focus word, so it is not a context
        assert_eq!(fragment.tokens(), &["z".to_string(), "y".to_string()]);
        assert_eq!(partial.shard, 3);
        assert_eq!(partial.table.get(0, 0), 2);
        assert_eq!(partial.table.get(0, 1), 1);
        assert_eq!(partial.total(), 3);
    }

    #[test]
    fn dirty_window_walks_past_unknown_contexts() {
        let words = Vocabulary::new(["a", "x", "b"]);
        let contexts = ContextVocabulary::fixed(Vocabulary::new(["a", "b"]));
        let shard = vec![vec!["a", "x", "x", "b"]];

        let mut dirty = worker(&words, &contexts, 1);
        dirty.window = ContextWindow::symmetric(1).dirty(true);
        let partial = dirty.process(0, &shard, &mut shard_rng(0, 0)).unwrap();

        // rows a, x, b; columns a, b
        assert_eq!(partial.table.get(0, 1), 1);
        assert_eq!(partial.table.get(1, 0), 2);
        assert_eq!(partial.table.get(1, 1), 2);
        assert_eq!(partial.table.get(2, 0), 1);
        assert_eq!(partial.total(), 6);

        // the clean window only sees the direct neighbours
        let clean = worker(&words, &contexts, 1).process(0, &shard, &mut shard_rng(0, 0)).unwrap();
        assert_eq!(clean.table.get(0, 1), 0);
        assert_eq!(clean.table.get(1, 0), 1);
        assert_eq!(clean.table.get(1, 1), 1);
        assert_eq!(clean.total(), 2);
    }

    #[test]
    fn sentence_context_sees_whole_sentence() {
        let words = Vocabulary::new(["a", "b"]);
        let contexts = ContextVocabulary::fixed(words.clone());
        let shard = vec![vec!["a", "b", "a"], vec!["b"]];

        let mut whole = worker(&words, &contexts, 1);
        whole.window = ContextWindow::Sentence;
        let partial = whole.process(0, &shard, &mut shard_rng(0, 0)).unwrap();

        assert_eq!(partial.table.get(0, 0), 2);
        assert_eq!(partial.table.get(0, 1), 2);
        assert_eq!(partial.table.get(1, 0), 2);
        assert_eq!(partial.table.get(1, 1), 0);
        assert_eq!(partial.total(), 6);
    }

    #[test]
    fn dynamic_window_never_exceeds_its_maximum() {
        let words = Vocabulary::new(["a"]);
        let contexts = ContextVocabulary::fixed(Vocabulary::new(["b"]));
        let shard = vec![vec!["b", "b", "b", "a", "b", "b", "b"]; 50];

        let mut dynamic = worker(&words, &contexts, 3);
        dynamic.window = ContextWindow::symmetric(3).dynamic(true);
        let partial = dynamic.process(0, &shard, &mut shard_rng(5, 0)).unwrap();

        // each focus sees between 2 and 6 contexts
        assert!(partial.total() >= 100);
        assert!(partial.total() <= 300);

        // same seed and shard, same counts
        let again = dynamic.process(0, &shard, &mut shard_rng(5, 0)).unwrap();
        assert_eq!(again.table, partial.table);
    }

    #[test]
    fn empty_shard() {
        let words = Vocabulary::new(["a"]);
        let contexts = ContextVocabulary::Dynamic;
        let shard: Vec<Vec<&str>> = Vec::new();

        let partial = worker(&words, &contexts, 1).process(0, &shard, &mut shard_rng(0, 0)).unwrap();
        assert!(partial.table.is_empty());
        assert!(partial.fragment.unwrap().is_empty());
    }

    #[test]
    fn dropped_tokens_policy() {
        // t' is just above 1, so "the" is dropped with probability 1 - 1e-6
        // and the two singletons are never dropped
        let stats = CorpusStats::from_frequencies([("the", 1_000_000_000_000), ("cat", 1), ("sat", 1)]);
        let sub = Subsampler::build(&stats, 1e-12).unwrap();
        assert!(sub.probability("the") > 0.999);
        assert_eq!(sub.probability("cat"), 0.0);

        let words = Vocabulary::new(["the", "cat", "sat"]);
        let contexts = ContextVocabulary::fixed(words.clone());
        let shard = vec![vec!["cat", "the", "sat"]];

        let mut keep = worker(&words, &contexts, 1);
        keep.subsampler = Some(&sub);
        let kept = keep.process(0, &shard, &mut shard_rng(1, 0)).unwrap();
        // "the" is no focus but still context of both neighbours
        assert_eq!(kept.table.get(1, 0), 1);
        assert_eq!(kept.table.get(2, 0), 1);
        assert_eq!(kept.table.get(0, 1), 0);
        assert_eq!(kept.total(), 2);

        let mut remove = keep;
        remove.dropped = DroppedTokens::Remove;
        let removed = remove.process(0, &shard, &mut shard_rng(1, 0)).unwrap();
        // with "the" gone, cat and sat become neighbours
        assert_eq!(removed.table.get(1, 2), 1);
        assert_eq!(removed.table.get(2, 1), 1);
        assert_eq!(removed.total(), 2);
    }
}
