//! Packrat memo table.
//!
//! Keyed by rule and start position. Only rules the compiler marked
//! memoizable land here, and those are context-free: their outcome at a
//! position depends on nothing but the position. An entry therefore
//! stays valid even when the attempt that computed it is rolled back,
//! and the table is deliberately never truncated on backtracking.

use std::collections::HashMap;

use woodrat_program::RuleId;

use crate::tree::NodeId;

/// Recorded outcome of one rule application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemoEntry {
    /// The rule cannot match at this position.
    Fail,
    /// The rule matched up to `end`, committing `node` if it built one.
    Hit { end: usize, node: Option<NodeId> },
}

#[derive(Debug, Default)]
pub(crate) struct MemoTable {
    entries: HashMap<(RuleId, usize), MemoEntry>,
}

impl MemoTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn probe(&self, rule: RuleId, pos: usize) -> Option<MemoEntry> {
        self.entries.get(&(rule, pos)).copied()
    }

    pub(crate) fn store(&mut self, rule: RuleId, pos: usize, entry: MemoEntry) {
        self.entries.insert((rule, pos), entry);
    }
}
