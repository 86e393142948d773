//! Backtrackable symbol bindings.
//!
//! Bindings from every table share one stack; a lookup scans from the
//! top for the newest binding under the requested name, so an inner
//! binding shadows an outer one until it is dropped. Failure recovery
//! truncates the stack to the watermark saved in the failure frame, and
//! `CutSyms` truncates it to the mark taken at scope entry.

use woodrat_program::NameId;

/// One bound span of input, keyed by table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    table: NameId,
    start: usize,
    end: usize,
}

#[derive(Debug, Default)]
pub(crate) struct SymStack {
    bindings: Vec<Binding>,
}

impl SymStack {
    pub(crate) fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Current depth, used as a watermark.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Drop bindings made after `watermark`.
    #[inline]
    pub(crate) fn truncate(&mut self, watermark: usize) {
        self.bindings.truncate(watermark);
    }

    pub(crate) fn bind(&mut self, table: NameId, start: usize, end: usize) {
        self.bindings.push(Binding { table, start, end });
    }

    /// Span of the newest binding in `table`, if any.
    pub(crate) fn top(&self, table: NameId) -> Option<(usize, usize)> {
        self.bindings
            .iter()
            .rev()
            .find(|binding| binding.table == table)
            .map(|binding| (binding.start, binding.end))
    }

    pub(crate) fn exists(&self, table: NameId) -> bool {
        self.bindings.iter().any(|binding| binding.table == table)
    }
}
