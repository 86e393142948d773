//! Speculative AST log.
//!
//! Tree construction during a match is journaled, not performed: every
//! structural instruction appends one op here, and backtracking
//! truncates the journal to the watermark saved in the failure frame.
//! Ops from an abandoned attempt never reach a node.
//! [`commit`](crate::tree::commit) replays a surviving slice into real
//! nodes.

use woodrat_program::{LitId, NameId};

use crate::tree::NodeId;

/// One journaled tree-construction action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AstOp {
    /// A node starts at `pos`.
    Open { pos: u32 },
    /// The innermost open node ends at `pos`.
    Close { pos: u32 },
    /// Tag the node under construction.
    Tag(NameId),
    /// Override the captured text of the node under construction.
    Replace(LitId),
    /// Attach an already committed node under `slot`. Negative slots
    /// attach unlabeled.
    Attach { slot: i16, node: NodeId },
}

/// Append-only op journal with truncation support for backtracking.
#[derive(Debug, Default)]
pub(crate) struct AstLog {
    ops: Vec<AstOp>,
}

impl AstLog {
    pub(crate) fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Current length, used as a watermark by failure frames.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub(crate) fn push(&mut self, op: AstOp) {
        self.ops.push(op);
    }

    /// Drop ops recorded after `watermark`.
    #[inline]
    pub(crate) fn truncate(&mut self, watermark: usize) {
        self.ops.truncate(watermark);
    }

    /// Ops recorded at or after `mark`.
    pub(crate) fn since(&self, mark: usize) -> &[AstOp] {
        &self.ops[mark..]
    }

    pub(crate) fn as_slice(&self) -> &[AstOp] {
        &self.ops
    }
}
