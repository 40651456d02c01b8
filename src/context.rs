//! Definitions of the context of a focus word within a sentence.
//!
//! Windows are clipped at sentence edges; a context never crosses into the
//! neighbouring sentence. All methods are pure except the dynamic window
//! extent, which is drawn from the caller's rng.

use rand::Rng;
use serde::{Deserialize, Serialize};


/// What counts as "nearby" for a focus word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextWindow {
    /// Up to `before` positions to the left and `after` to the right.
    Window {
        before: usize,
        after: usize,
        /// Skip positions whose token is not an admissible context and keep
        /// extending until the quota is met or the sentence edge is reached.
        #[serde(default)]
        dirty: bool,
        /// Draw the effective extent in `1..=before` / `1..=after` for each focus.
        #[serde(default)]
        dynamic: bool,
    },
    /// Every other position of the sentence.
    Sentence,
}

/// Effective extent used for one focus position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub before: usize,
    pub after: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        ContextWindow::symmetric(1)
    }
}

impl ContextWindow {

    pub fn symmetric(half_size: usize) -> Self {
        ContextWindow::asymmetric(half_size, half_size)
    }

    pub fn asymmetric(before: usize, after: usize) -> Self {
        ContextWindow::Window { before, after, dirty: false, dynamic: false }
    }

    pub fn dirty(self, enabled: bool) -> Self {
        match self {
            ContextWindow::Window { before, after, dynamic, .. } => ContextWindow::Window { before, after, dirty: enabled, dynamic },
            ContextWindow::Sentence => self,
        }
    }

    pub fn dynamic(self, enabled: bool) -> Self {
        match self {
            ContextWindow::Window { before, after, dirty, .. } => ContextWindow::Window { before, after, dirty, dynamic: enabled },
            ContextWindow::Sentence => self,
        }
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self, ContextWindow::Window { dirty: true, .. })
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ContextWindow::Window { dynamic: true, .. })
    }

    /// Context positions for `focus`, using the full extent and treating
    /// every position as admissible. A dirty window therefore gives the same
    /// positions as a clean one here; to skip tokens that are not countable
    /// contexts, call [`ContextWindow::positions`] with an `admissible` test.
    ///
    /// With a `focus_mask`, a focus whose mask entry is `false` gets no
    /// context at all. Positions are returned in sentence order.
    pub fn contexts<T>(&self, sentence: &[T], focus: usize, focus_mask: Option<&[bool]>) -> Vec<usize> {
        if !is_focus(focus_mask, focus) {
            return Vec::new()
        }
        self.positions(sentence.len(), focus, self.full_extent(sentence.len()), |_| true)
    }

    /// The extent to use for the next focus. Only a dynamic window consumes
    /// randomness.
    pub fn sample_extent<R: Rng>(&self, len: usize, rng: &mut R) -> Extent {

        match *self {
            ContextWindow::Window { before, after, dynamic: true, .. } => {
                let sample = |max: usize, rng: &mut R| if max > 0 { rng.gen_range(1..=max) } else { 0 };
                let b = sample(before, rng);
                let a = if after == before { b } else { sample(after, rng) };
                Extent { before: b, after: a }
            }
            _ => self.full_extent(len),
        }
    }

    fn full_extent(&self, len: usize) -> Extent {
        match *self {
            ContextWindow::Window { before, after, .. } => Extent { before, after },
            ContextWindow::Sentence => Extent { before: len, after: len },
        }
    }

    /// Context positions of `focus` within a sentence of length `len`.
    ///
    /// `admissible` tells whether a position holds a countable context token.
    /// A clean window returns every in-range position regardless; a dirty
    /// window skips inadmissible ones and keeps walking outward.
    pub fn positions<F>(&self, len: usize, focus: usize, extent: Extent, admissible: F) -> Vec<usize>
    where
        F: Fn(usize) -> bool {

        if focus >= len {
            return Vec::new()
        }

        if !self.is_dirty() {
            let start = focus.saturating_sub(extent.before);
            let end = len.min(focus.saturating_add(extent.after).saturating_add(1));
            return (start..focus).chain(focus + 1..end).collect()
        }

        let mut before_list = Vec::with_capacity(extent.before);
        let mut i = focus;
        while i > 0 && before_list.len() < extent.before {
            i -= 1;
            if admissible(i) {
                before_list.push(i);
            }
        }
        before_list.reverse();

        let mut after_list = Vec::with_capacity(extent.after);
        let mut i = focus + 1;
        while i < len && after_list.len() < extent.after {
            if admissible(i) {
                after_list.push(i);
            }
            i += 1;
        }

        before_list.extend(after_list);
        before_list
    }
}

fn is_focus(mask: Option<&[bool]>, position: usize) -> bool {
    match mask {
        Some(mask) => mask.get(position).copied().unwrap_or(false),
        None => true,
    }
}
