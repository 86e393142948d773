//! Parsing-expression IR.
//!
//! Expressions are immutable and hash-consed into an [`ExprPool`]:
//! structurally equal subtrees share one [`ExprId`]. Interning makes
//! equality an integer compare, lets analysis caches be shared between
//! identical subtrees, and lets the encoder deduplicate dispatch targets
//! that lower the same expression.

use std::collections::HashMap;

use crate::byteset::ByteSet;
use crate::interner::Symbol;

/// Handle to an interned [`Expr`] in its [`ExprPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One parsing expression node.
///
/// Composite variants hold [`ExprId`] children, so a node never owns its
/// subtree. Rule references are by name ([`Symbol`]); they are resolved
/// against the production table, not the pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Matches nothing and always succeeds.
    Empty,
    /// Always fails without consuming.
    Fail,
    /// Matches one exact byte.
    Byte(u8),
    /// Matches one byte drawn from a class.
    Class(ByteSet),
    /// Matches a multi-byte literal run. Produced by optimization passes,
    /// never by the builder.
    Lit(Box<[u8]>),
    /// Matches any single byte.
    Any,
    /// Succeeds only at end of input, consuming nothing.
    Eof,
    /// Matches children left to right; fails when any child fails.
    Seq(Vec<ExprId>),
    /// Ordered choice. `predict` is attached by the optimizer when a
    /// first-byte dispatch is worthwhile.
    Alt {
        arms: Vec<ExprId>,
        predict: Option<Box<Prediction>>,
    },
    /// Zero or more repetitions, greedy.
    Star(ExprId),
    /// One or more repetitions, greedy.
    Plus(ExprId),
    /// Zero or one occurrence.
    Opt(ExprId),
    /// Positive lookahead. Runs `inner`, then resets the cursor.
    And(ExprId),
    /// Negative lookahead. Succeeds only when `inner` fails.
    Not(ExprId),
    /// Call of a named rule.
    Ref(Symbol),
    /// Begins constructing an AST node at the current position.
    Open,
    /// Finishes the innermost node begun by [`Expr::Open`].
    Close,
    /// Sets the tag of the node under construction.
    Tag(Symbol),
    /// Replaces the captured text of the node under construction.
    Replace(Box<[u8]>),
    /// Attaches the node produced by `inner` to the enclosing node under
    /// `slot`. Negative slots mean unlabeled children.
    Link { slot: i16, inner: ExprId },
    /// Matches `inner` and records its consumed text in table `table`.
    SymDef { table: Symbol, inner: ExprId },
    /// Matches the exact text most recently recorded in `table`.
    SymIs(Symbol),
    /// Succeeds when `table` holds at least one binding. Consumes nothing.
    SymExists(Symbol),
    /// Records the current line indentation. Consumes nothing.
    IndentDef,
    /// Matches the most recently recorded indentation.
    IndentIs,
    /// Runs `inner`, then discards symbol bindings made inside it.
    Scope(ExprId),
    /// Succeeds when `flag` currently equals `expect`. Consumes nothing.
    FlagIf { flag: Symbol, expect: bool },
    /// Matches `inner`, then sets `flag` to `value`. The write sticks
    /// until backtracking unwinds past it.
    FlagSet {
        flag: Symbol,
        value: bool,
        inner: ExprId,
    },
}

impl Expr {
    /// Child expressions, in evaluation order.
    pub fn children(&self) -> Children<'_> {
        let inner = match self {
            Expr::Seq(items) | Expr::Alt { arms: items, .. } => ChildrenInner::Many(items.iter()),
            Expr::Star(e)
            | Expr::Plus(e)
            | Expr::Opt(e)
            | Expr::And(e)
            | Expr::Not(e)
            | Expr::Link { inner: e, .. }
            | Expr::SymDef { inner: e, .. }
            | Expr::Scope(e)
            | Expr::FlagSet { inner: e, .. } => ChildrenInner::One(Some(*e)),
            _ => ChildrenInner::None,
        };
        Children { inner }
    }
}

/// Iterator over the direct children of an [`Expr`].
pub struct Children<'a> {
    inner: ChildrenInner<'a>,
}

enum ChildrenInner<'a> {
    None,
    One(Option<ExprId>),
    Many(std::slice::Iter<'a, ExprId>),
}

impl Iterator for Children<'_> {
    type Item = ExprId;

    fn next(&mut self) -> Option<ExprId> {
        match &mut self.inner {
            ChildrenInner::None => None,
            ChildrenInner::One(slot) => slot.take(),
            ChildrenInner::Many(iter) => iter.next().copied(),
        }
    }
}

/// Outcome of first-byte prediction for one lookahead value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredEntry {
    /// No arm can start with this byte; the choice fails without trying any.
    Reject,
    /// Exactly one arm can match; value is its index in `arms`.
    One(u16),
    /// Several arms remain candidates; value indexes [`Prediction::groups`].
    Group(u16),
}

/// First-byte dispatch table for an [`Expr::Alt`].
///
/// Index 256 classifies end of input. Groups keep arm indices in the
/// original arm order, so dispatching through a group preserves ordered
/// choice among the remaining candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prediction {
    pub entries: [PredEntry; 257],
    pub groups: Vec<Vec<u16>>,
}

impl Prediction {
    /// Entry for a concrete lookahead, `None` meaning end of input.
    pub fn entry(&self, lookahead: Option<u8>) -> PredEntry {
        match lookahead {
            Some(b) => self.entries[b as usize],
            None => self.entries[256],
        }
    }
}

/// Hash-consing pool of [`Expr`] nodes.
#[derive(Debug, Default, Clone)]
pub struct ExprPool {
    map: HashMap<Expr, ExprId>,
    nodes: Vec<Expr>,
}

impl ExprPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `expr`, returning the id of the canonical copy.
    pub fn intern(&mut self, expr: Expr) -> ExprId {
        if let Some(&id) = self.map.get(&expr) {
            return id;
        }
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr.clone());
        self.map.insert(expr, id);
        id
    }

    /// Borrows the node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this pool.
    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    /// Number of distinct interned nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
