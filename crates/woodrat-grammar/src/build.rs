//! Programmatic grammar assembly.
//!
//! [`GrammarBuilder`] interns expressions as they are built, so repeated
//! constructions of the same shape share pool nodes. Building is
//! infallible; defects (duplicate rules, dangling references) surface
//! from [`GrammarBuilder::finish`].

use std::collections::HashSet;

use crate::byteset::ByteSet;
use crate::error::GrammarError;
use crate::expr::{Expr, ExprId};
use crate::grammar::Grammar;
use crate::interner::Symbol;

/// Assembles a [`Grammar`] rule by rule.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    grammar: Grammar,
    defect: Option<GrammarError>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Atoms
    // ------------------------------------------------------------------

    /// Matches exactly `byte`.
    pub fn byte(&mut self, byte: u8) -> ExprId {
        self.grammar.intern(Expr::Byte(byte))
    }

    /// Matches the bytes of `text` in order. Empty text matches nothing.
    pub fn text(&mut self, text: impl AsRef<[u8]>) -> ExprId {
        let bytes = text.as_ref();
        match bytes {
            [] => self.empty(),
            [b] => self.byte(*b),
            _ => {
                let items: Vec<ExprId> = bytes.iter().map(|&b| self.byte(b)).collect();
                self.grammar.intern(Expr::Seq(items))
            }
        }
    }

    /// Matches one byte from `set`.
    pub fn class(&mut self, set: ByteSet) -> ExprId {
        self.grammar.intern(Expr::Class(set))
    }

    /// Matches one byte in `lo..=hi`.
    pub fn range(&mut self, lo: u8, hi: u8) -> ExprId {
        self.class(ByteSet::range(lo, hi))
    }

    /// Matches one byte listed in `bytes`.
    pub fn one_of(&mut self, bytes: impl AsRef<[u8]>) -> ExprId {
        let set: ByteSet = bytes.as_ref().iter().copied().collect();
        self.class(set)
    }

    /// Matches any single byte.
    pub fn any(&mut self) -> ExprId {
        self.grammar.intern(Expr::Any)
    }

    /// Succeeds only at end of input.
    pub fn eof(&mut self) -> ExprId {
        self.grammar.intern(Expr::Eof)
    }

    /// Matches nothing and succeeds.
    pub fn empty(&mut self) -> ExprId {
        self.grammar.intern(Expr::Empty)
    }

    /// Always fails.
    pub fn fail(&mut self) -> ExprId {
        self.grammar.intern(Expr::Fail)
    }

    // ------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------

    /// Matches `items` left to right.
    pub fn seq(&mut self, items: &[ExprId]) -> ExprId {
        match items {
            [] => self.empty(),
            [only] => *only,
            _ => self.grammar.intern(Expr::Seq(items.to_vec())),
        }
    }

    /// Ordered choice over `arms`.
    pub fn alt(&mut self, arms: &[ExprId]) -> ExprId {
        match arms {
            [] => self.fail(),
            [only] => *only,
            _ => self.grammar.intern(Expr::Alt {
                arms: arms.to_vec(),
                predict: None,
            }),
        }
    }

    /// Zero or more repetitions of `inner`.
    pub fn star(&mut self, inner: ExprId) -> ExprId {
        self.grammar.intern(Expr::Star(inner))
    }

    /// One or more repetitions of `inner`.
    pub fn plus(&mut self, inner: ExprId) -> ExprId {
        self.grammar.intern(Expr::Plus(inner))
    }

    /// Zero or one occurrence of `inner`.
    pub fn opt(&mut self, inner: ExprId) -> ExprId {
        self.grammar.intern(Expr::Opt(inner))
    }

    /// Positive lookahead.
    pub fn and(&mut self, inner: ExprId) -> ExprId {
        self.grammar.intern(Expr::And(inner))
    }

    /// Negative lookahead.
    pub fn not(&mut self, inner: ExprId) -> ExprId {
        self.grammar.intern(Expr::Not(inner))
    }

    /// Call of the rule named `name`. The rule may be defined later.
    pub fn call(&mut self, name: &str) -> ExprId {
        let sym = self.grammar.intern_name(name);
        self.grammar.intern(Expr::Ref(sym))
    }

    // ------------------------------------------------------------------
    // AST construction
    // ------------------------------------------------------------------

    pub fn open(&mut self) -> ExprId {
        self.grammar.intern(Expr::Open)
    }

    pub fn close(&mut self) -> ExprId {
        self.grammar.intern(Expr::Close)
    }

    /// Tags the node under construction.
    pub fn tag(&mut self, name: &str) -> ExprId {
        let sym = self.grammar.intern_name(name);
        self.grammar.intern(Expr::Tag(sym))
    }

    /// Overrides the captured text of the node under construction.
    pub fn replace(&mut self, value: impl AsRef<[u8]>) -> ExprId {
        self.grammar
            .intern(Expr::Replace(value.as_ref().to_vec().into_boxed_slice()))
    }

    /// Attaches the node produced by `inner` under `slot`. Negative slots
    /// attach an unlabeled child.
    pub fn link(&mut self, slot: i16, inner: ExprId) -> ExprId {
        self.grammar.intern(Expr::Link { slot, inner })
    }

    /// `{ inner #tag }`: a tagged node around `inner`.
    pub fn tree(&mut self, tag: &str, inner: ExprId) -> ExprId {
        let open = self.open();
        let tag = self.tag(tag);
        let close = self.close();
        self.seq(&[open, inner, tag, close])
    }

    // ------------------------------------------------------------------
    // Context
    // ------------------------------------------------------------------

    /// Matches `inner` and records its consumed text in `table`.
    pub fn sym_def(&mut self, table: &str, inner: ExprId) -> ExprId {
        let table = self.grammar.intern_name(table);
        self.grammar.intern(Expr::SymDef { table, inner })
    }

    /// Matches the most recent binding of `table`.
    pub fn sym_is(&mut self, table: &str) -> ExprId {
        let table = self.grammar.intern_name(table);
        self.grammar.intern(Expr::SymIs(table))
    }

    /// Succeeds when `table` holds a binding, consuming nothing.
    pub fn sym_exists(&mut self, table: &str) -> ExprId {
        let table = self.grammar.intern_name(table);
        self.grammar.intern(Expr::SymExists(table))
    }

    /// Records the current line indentation.
    pub fn indent_def(&mut self) -> ExprId {
        self.grammar.intern(Expr::IndentDef)
    }

    /// Matches the most recently recorded indentation.
    pub fn indent_is(&mut self) -> ExprId {
        self.grammar.intern(Expr::IndentIs)
    }

    /// Runs `inner`, then discards symbol bindings made inside it.
    pub fn scope(&mut self, inner: ExprId) -> ExprId {
        self.grammar.intern(Expr::Scope(inner))
    }

    /// Succeeds when `flag` equals `expect`.
    pub fn flag_if(&mut self, flag: &str, expect: bool) -> ExprId {
        let flag = self.grammar.intern_name(flag);
        self.grammar.intern(Expr::FlagIf { flag, expect })
    }

    /// Matches `inner`, then sets `flag` to `value`. The write sticks
    /// until backtracking unwinds past it.
    pub fn flag_set(&mut self, flag: &str, value: bool, inner: ExprId) -> ExprId {
        let flag = self.grammar.intern_name(flag);
        self.grammar.intern(Expr::FlagSet { flag, value, inner })
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    /// Defines a rule. Duplicate names are reported by [`finish`].
    ///
    /// [`finish`]: GrammarBuilder::finish
    pub fn rule(&mut self, name: &str, body: ExprId) -> &mut Self {
        if let Err(err) = self.grammar.define(name, body) {
            self.defect.get_or_insert(err);
        }
        self
    }

    /// Interns a name without building an expression.
    pub fn name(&mut self, name: &str) -> Symbol {
        self.grammar.intern_name(name)
    }

    /// Validates the grammar and hands it over.
    ///
    /// Fails on the first defect recorded while building, or on a rule
    /// reference with no definition reachable from any rule body.
    pub fn finish(self) -> Result<Grammar, GrammarError> {
        if let Some(err) = self.defect {
            return Err(err);
        }
        let grammar = self.grammar;
        let mut seen: HashSet<ExprId> = HashSet::new();
        let mut stack: Vec<ExprId> = grammar.iter().map(|p| p.body).collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let expr = grammar.expr(id);
            if let Expr::Ref(sym) = expr {
                if grammar.get(*sym).is_none() {
                    return Err(GrammarError::undefined(grammar.name(*sym)));
                }
            }
            stack.extend(expr.children());
        }
        Ok(grammar)
    }
}
