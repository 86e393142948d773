//! Named productions and the grammar table.
//!
//! A [`Grammar`] owns the expression pool, the name interner, and an
//! insertion-ordered table of [`Production`]s. Productions carry the
//! facts the compiler derives about them: typestate, recursion, consume
//! behavior, context sensitivity, and the per-byte acceptance table.

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;

use crate::byteset::ByteSet;
use crate::error::GrammarError;
use crate::expr::{Expr, ExprId, ExprPool};
use crate::interner::{Interner, Symbol};

/// AST side-effect classification of an expression or rule.
///
/// - `Boolean` rules only recognize input.
/// - `Object` rules construct and return exactly one AST node.
/// - `Operation` rules mutate the node their caller is constructing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Typestate {
    /// Not yet inferred, or no signal either way.
    #[default]
    Undefined,
    Boolean,
    Object,
    Operation,
}

impl Typestate {
    pub fn as_str(self) -> &'static str {
        match self {
            Typestate::Undefined => "undefined",
            Typestate::Boolean => "boolean",
            Typestate::Object => "object",
            Typestate::Operation => "operation",
        }
    }
}

/// Per-lookahead first-set classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Acceptance {
    /// The expression can match starting with this lookahead.
    Accept,
    /// The expression can succeed without consuming the lookahead.
    Unconsumed,
    /// The expression always fails on this lookahead.
    Reject,
}

/// Index of the end-of-input entry in a 257-entry acceptance table.
pub const EOF_SLOT: usize = 256;

/// Bit set of compile options that change acceptance classification.
pub type OptionMask = u8;

/// Binary-input mode: byte value 0 is an ordinary byte, not end of input.
pub const MASK_BINARY: OptionMask = 1 << 0;

/// 257-entry acceptance table: one entry per byte value plus end of input.
///
/// The table records the option mask it was computed under; a cached
/// table is stale when the mask differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptTable {
    pub mask: OptionMask,
    pub entries: Box<[Acceptance; 257]>,
}

impl AcceptTable {
    pub fn new(mask: OptionMask, entries: Box<[Acceptance; 257]>) -> Self {
        Self { mask, entries }
    }

    /// Classification for a concrete lookahead, `None` meaning end of input.
    #[inline]
    pub fn get(&self, lookahead: Option<u8>) -> Acceptance {
        match lookahead {
            Some(b) => self.entries[b as usize],
            None => self.entries[EOF_SLOT],
        }
    }
}

/// One named rule and the analysis facts recorded on it.
#[derive(Debug, Clone)]
pub struct Production {
    pub name: Symbol,
    pub body: ExprId,
    /// Inferred AST discipline. `Undefined` until analysis runs.
    pub typestate: Typestate,
    /// Whether the rule can reach itself through rule references.
    pub recursive: bool,
    /// Number of reference sites across all rule bodies.
    pub ref_count: u32,
    /// Whether every successful match consumes at least one byte.
    /// `None` until analysis runs.
    pub always_consumes: Option<bool>,
    /// Whether the rule reads or writes symbol tables, indentation,
    /// or flags. Context-sensitive rules are never memoized.
    pub ctx_sensitive: bool,
    /// Cached per-byte acceptance, tagged with its option mask.
    pub acceptance: Option<AcceptTable>,
}

impl Production {
    pub fn new(name: Symbol, body: ExprId) -> Self {
        Self {
            name,
            body,
            typestate: Typestate::Undefined,
            recursive: false,
            ref_count: 0,
            always_consumes: None,
            ctx_sensitive: false,
            acceptance: None,
        }
    }
}

/// A set of named productions over a shared expression pool.
///
/// Productions keep their definition order; iteration, compilation, and
/// dumps all follow it.
#[derive(Debug, Default, Clone)]
pub struct Grammar {
    pool: ExprPool,
    names: Interner,
    productions: IndexMap<Symbol, Production>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns an expression into the pool.
    pub fn intern(&mut self, expr: Expr) -> ExprId {
        self.pool.intern(expr)
    }

    /// Borrows the expression behind `id`.
    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        self.pool.get(id)
    }

    pub fn pool(&self) -> &ExprPool {
        &self.pool
    }

    /// Interns a name (rule, tag, table, or flag).
    pub fn intern_name(&mut self, name: &str) -> Symbol {
        self.names.intern(name)
    }

    /// Resolves a name symbol back to its string.
    #[inline]
    pub fn name(&self, sym: Symbol) -> &str {
        self.names.resolve(sym)
    }

    pub fn names(&self) -> &Interner {
        &self.names
    }

    /// Defines a rule. Fails when `name` is already defined.
    pub fn define(&mut self, name: &str, body: ExprId) -> Result<Symbol, GrammarError> {
        let sym = self.names.intern(name);
        if self.productions.contains_key(&sym) {
            return Err(GrammarError::duplicate(name));
        }
        self.productions.insert(sym, Production::new(sym, body));
        Ok(sym)
    }

    /// Looks up a production by name symbol.
    pub fn get(&self, sym: Symbol) -> Option<&Production> {
        self.productions.get(&sym)
    }

    pub fn get_mut(&mut self, sym: Symbol) -> Option<&mut Production> {
        self.productions.get_mut(&sym)
    }

    /// Borrows a production that is known to exist.
    ///
    /// # Panics
    ///
    /// Panics if `sym` is not a defined rule.
    #[inline]
    pub fn production(&self, sym: Symbol) -> &Production {
        &self.productions[&sym]
    }

    /// Mutable counterpart of [`production`](Grammar::production).
    #[inline]
    pub fn production_mut(&mut self, sym: Symbol) -> &mut Production {
        &mut self.productions[&sym]
    }

    /// Resolves a rule by name, as the public entry points do.
    pub fn resolve(&self, name: &str) -> Result<&Production, GrammarError> {
        self.names
            .lookup(name)
            .and_then(|sym| self.productions.get(&sym))
            .ok_or_else(|| GrammarError::undefined(name))
    }

    /// Rule name symbols in definition order.
    pub fn rule_symbols(&self) -> Vec<Symbol> {
        self.productions.keys().copied().collect()
    }

    /// Productions in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Production> {
        self.productions.values()
    }

    /// Position of a rule in definition order.
    pub fn index_of(&self, sym: Symbol) -> Option<usize> {
        self.productions.get_index_of(&sym)
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Renders an expression as grammar text.
    pub fn render(&self, id: ExprId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    fn render_into(&self, id: ExprId, out: &mut String) {
        match self.pool.get(id) {
            Expr::Empty => out.push_str("''"),
            Expr::Fail => out.push_str("<fail>"),
            Expr::Byte(b) => {
                out.push('\'');
                push_escaped(out, *b);
                out.push('\'');
            }
            Expr::Class(set) => {
                write!(out, "{set}").unwrap();
            }
            Expr::Lit(bytes) => {
                out.push('\'');
                for &b in bytes.iter() {
                    push_escaped(out, b);
                }
                out.push('\'');
            }
            Expr::Any => out.push('.'),
            Expr::Eof => out.push_str("<eof>"),
            Expr::Seq(items) => {
                out.push('(');
                for (i, &item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    self.render_into(item, out);
                }
                out.push(')');
            }
            Expr::Alt { arms, .. } => {
                out.push('(');
                for (i, &arm) in arms.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" / ");
                    }
                    self.render_into(arm, out);
                }
                out.push(')');
            }
            Expr::Star(e) => {
                self.render_into(*e, out);
                out.push('*');
            }
            Expr::Plus(e) => {
                self.render_into(*e, out);
                out.push('+');
            }
            Expr::Opt(e) => {
                self.render_into(*e, out);
                out.push('?');
            }
            Expr::And(e) => {
                out.push('&');
                self.render_into(*e, out);
            }
            Expr::Not(e) => {
                out.push('!');
                self.render_into(*e, out);
            }
            Expr::Ref(sym) => out.push_str(self.names.resolve(*sym)),
            Expr::Open => out.push('{'),
            Expr::Close => out.push('}'),
            Expr::Tag(sym) => {
                out.push('#');
                out.push_str(self.names.resolve(*sym));
            }
            Expr::Replace(bytes) => {
                out.push('`');
                for &b in bytes.iter() {
                    push_escaped(out, b);
                }
                out.push('`');
            }
            Expr::Link { slot, inner } => {
                out.push('$');
                if *slot >= 0 {
                    write!(out, "{slot}").unwrap();
                }
                out.push('(');
                self.render_into(*inner, out);
                out.push(')');
            }
            Expr::SymDef { table, inner } => {
                write!(out, "<def {} ", self.names.resolve(*table)).unwrap();
                self.render_into(*inner, out);
                out.push('>');
            }
            Expr::SymIs(sym) => {
                write!(out, "<is {}>", self.names.resolve(*sym)).unwrap();
            }
            Expr::SymExists(sym) => {
                write!(out, "<exists {}>", self.names.resolve(*sym)).unwrap();
            }
            Expr::IndentDef => out.push_str("<defindent>"),
            Expr::IndentIs => out.push_str("<indent>"),
            Expr::Scope(e) => {
                out.push_str("<scope ");
                self.render_into(*e, out);
                out.push('>');
            }
            Expr::FlagIf { flag, expect } => {
                let bang = if *expect { "" } else { "!" };
                write!(out, "<if {bang}{}>", self.names.resolve(*flag)).unwrap();
            }
            Expr::FlagSet { flag, value, inner } => {
                let bang = if *value { "" } else { "!" };
                write!(out, "<on {bang}{} ", self.names.resolve(*flag)).unwrap();
                self.render_into(*inner, out);
                out.push('>');
            }
        }
    }

    /// Renders every rule as `Name = body`, one per line, in definition
    /// order.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for prod in self.productions.values() {
            writeln!(
                out,
                "{} = {}",
                self.names.resolve(prod.name),
                self.render(prod.body)
            )
            .unwrap();
        }
        out
    }
}

fn push_escaped(out: &mut String, byte: u8) {
    match byte {
        b'\n' => out.push_str("\\n"),
        b'\r' => out.push_str("\\r"),
        b'\t' => out.push_str("\\t"),
        b'\'' | b'\\' | b'`' => {
            out.push('\\');
            out.push(byte as char);
        }
        0x20..=0x7e => out.push(byte as char),
        _ => {
            write!(out, "\\x{byte:02x}").unwrap();
        }
    }
}

/// Builds the full byte class an expression can start with, when the
/// expression is a single-byte matcher. Used by encoder specializations.
pub fn atom_class(grammar: &Grammar, id: ExprId) -> Option<ByteSet> {
    match grammar.expr(id) {
        Expr::Byte(b) => Some(ByteSet::single(*b)),
        Expr::Class(set) => Some(*set),
        Expr::Any => Some(ByteSet::FULL),
        _ => None,
    }
}
