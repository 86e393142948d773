//! Context-sensitivity analysis.
//!
//! A rule is context-sensitive when it can reach an expression that
//! reads or writes matcher context: symbol tables, indentation, or
//! flags. Writes count as well as reads, because a memoized replay would
//! skip the write and later reads would observe stale context.

use std::collections::{HashMap, HashSet};

use woodrat_grammar::{Expr, ExprId, Grammar, Symbol};

pub(crate) fn run(grammar: &mut Grammar) {
    let syms = grammar.rule_symbols();
    let mut pass = Pass {
        grammar,
        cache: HashMap::new(),
        visiting: HashSet::new(),
    };
    for &sym in &syms {
        pass.rule(sym);
    }

    let cache = pass.cache;
    for &sym in &syms {
        grammar.production_mut(sym).ctx_sensitive = cache[&sym];
    }
}

struct Pass<'g> {
    grammar: &'g Grammar,
    cache: HashMap<Symbol, bool>,
    visiting: HashSet<Symbol>,
}

impl Pass<'_> {
    fn rule(&mut self, sym: Symbol) -> bool {
        if let Some(&known) = self.cache.get(&sym) {
            return known;
        }
        if !self.visiting.insert(sym) {
            // In-progress rules answer "insensitive"; if the cycle does
            // touch context, the branch that touches it decides.
            return false;
        }
        let body = self.grammar.production(sym).body;
        let sensitive = self.expr(body);
        self.visiting.remove(&sym);
        self.cache.insert(sym, sensitive);
        sensitive
    }

    fn expr(&mut self, id: ExprId) -> bool {
        let g = self.grammar;
        let expr = g.expr(id);
        match expr {
            Expr::SymDef { .. }
            | Expr::SymIs(_)
            | Expr::SymExists(_)
            | Expr::IndentDef
            | Expr::IndentIs
            | Expr::FlagIf { .. }
            | Expr::FlagSet { .. } => true,

            Expr::Ref(target) => self.rule(*target),

            _ => expr.children().any(|child| self.expr(child)),
        }
    }
}
