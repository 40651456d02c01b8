//! Word × context co-occurrence counting.
//!
//! A corpus of tokenized sentences is cut into shards, each shard is counted
//! by a worker of a fixed-size pool, and the partial tables are merged into a
//! single compressed sparse row matrix.
//!
//! ```no_run
//! use cooc_engine::{ContextVocabulary, CooccurrenceCounter, CountingConfig, Vocabulary};
//!
//! let sentences = vec![vec!["a", "b", "c"], vec!["b", "c", "d"]];
//! let words = Vocabulary::new(["a", "b", "c", "d"]);
//! let counter = CooccurrenceCounter::new(words, ContextVocabulary::Dynamic, CountingConfig::default(), None)?;
//! let cooc = counter.count(&sentences)?;
//! assert_eq!(cooc.get("b", "c"), 2);
//! # Ok::<(), cooc_engine::CoocError>(())
//! ```

mod config;
mod context;
mod cooccurrence;
mod corpus;
mod error;
mod matrix;
mod reducer;
mod subsampling;
mod table;
mod vocabulary;
mod worker;

pub use config::{CountingConfig, CountingMetadata, WindowConfig, WindowKind};
pub use context::{ContextWindow, Extent};
pub use cooccurrence::{CooccurrenceCounter, Cooccurrences};
pub use corpus::{CorpusStats, LineSentences, Token};
pub use error::{CoocError, Result};
pub use matrix::CsrMatrix;
pub use reducer::{combine_fixed, Reducer};
pub use subsampling::{DroppedTokens, Subsampler};
pub use table::{CellKey, CountTable};
pub use vocabulary::{ContextVocabulary, DynamicVocabulary, Lexicon, Vocabulary};
pub use worker::{shard_rng, PartialCounts, Worker};
