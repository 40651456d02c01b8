// imports
use crate::error::{CoocError, Result};
use crate::table::{narrow, CountTable};
use crate::vocabulary::{ContextVocabulary, DynamicVocabulary, Lexicon, Vocabulary};
use crate::worker::PartialCounts;
use std::sync::Arc;


// the reducer's view of the column vocabulary
#[derive(Debug)]
enum ContextSide {
    Fixed(Arc<Vocabulary>),
    Dynamic(DynamicVocabulary),
}


/// Folds partial tables into the global accumulator.
///
/// With a fixed context vocabulary the merge is a plain cell-wise sum and the
/// order of partials does not matter. With a dynamic one, each partial's local
/// columns are translated to global ones, appending tokens the global
/// vocabulary has not seen yet; whichever partial is merged first claims the
/// lower index, so two runs fed in different orders give column permutations
/// of the same matrix.
#[derive(Debug)]
pub struct Reducer {
    accumulator: CountTable,
    contexts: ContextSide,
    columns: usize,
    expected: u64,
    merged: usize,
}

impl Reducer {

    pub fn new(contexts: &ContextVocabulary) -> Reducer {
        let (contexts, columns) = match contexts {
            ContextVocabulary::Fixed(vocab) => (ContextSide::Fixed(Arc::clone(vocab)), vocab.len()),
            ContextVocabulary::Dynamic => (ContextSide::Dynamic(DynamicVocabulary::new()), 0),
        };
        Reducer {
            accumulator: CountTable::new(),
            contexts,
            columns,
            expected: 0,
            merged: 0,
        }
    }

    /// Current column extent of the accumulator. Grows with the dynamic vocabulary.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of partials merged so far.
    pub fn merged(&self) -> usize {
        self.merged
    }

    pub fn merge(&mut self, partial: PartialCounts) -> Result<()> {

        let PartialCounts { shard, table, fragment, pairs, .. } = partial;
        self.expected += pairs;

        match &mut self.contexts {
            ContextSide::Fixed(_) => {
                if fragment.is_some() {
                    return Err(CoocError::Inconsistent {
                        shard,
                        message: "local context vocabulary given to a fixed-context reducer".to_string(),
                    })
                }
                self.accumulator.merge(table);
            }
            ContextSide::Dynamic(global) => {
                let fragment = fragment.unwrap_or_default();

                // local column -> global column, appending unseen tokens
                let translation = fragment
                    .iter()
                    .map(|tok| narrow(global.index_of_or_insert(tok)))
                    .collect::<Result<Vec<u32>>>()?;

                // widen to the grown vocabulary
                self.columns = global.len();

                for (key, count) in table {
                    let col = match translation.get(key.col()) {
                        Some(col) => *col,
                        None => return Err(CoocError::Inconsistent {
                            shard,
                            message: format!("column {} is outside its context fragment of {} tokens", key.col(), translation.len()),
                        }),
                    };
                    self.accumulator.add(key.with_col(col), count);
                }
            }
        }

        self.merged += 1;
        tracing::trace!("merged shard {}, accumulator holds {} cells", shard, self.accumulator.len());
        Ok(())
    }

    pub fn merge_all<I>(&mut self, partials: I) -> Result<()>
    where
        I: IntoIterator<Item = PartialCounts> {

        for partial in partials {
            self.merge(partial)?;
        }
        Ok(())
    }

    /// Checks that every pair reported by the partials made it into the
    /// accumulator, and hands back the accumulator and final context vocabulary.
    pub fn finish(self) -> Result<(CountTable, Arc<Vocabulary>)> {

        let found = self.accumulator.recount();
        if found != self.expected || self.accumulator.total() != self.expected {
            return Err(CoocError::MergeInvariant { expected: self.expected, found })
        }

        let contexts = match self.contexts {
            ContextSide::Fixed(vocab) => vocab,
            ContextSide::Dynamic(global) => Arc::new(global.freeze()),
        };
        Ok((self.accumulator, contexts))
    }
}


/// Pairwise combination of two fixed-context partials, for tree reduction.
pub fn combine_fixed(mut left: PartialCounts, right: PartialCounts) -> PartialCounts {
    left.table.merge(right.table);
    left.sentences += right.sentences;
    left.pairs += right.pairs;
    left.shard = left.shard.min(right.shard);
    left
}
