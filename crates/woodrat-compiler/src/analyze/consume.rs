//! Always-consumes analysis.
//!
//! A rule always consumes when every successful match moves the cursor.
//! Recursion that loops back without consuming anything in between is
//! pinned to "may match empty", which keeps the fixpoint sound for
//! left-recursive shapes instead of diverging.

use std::collections::HashMap;

use woodrat_grammar::{Expr, ExprId, Grammar, Symbol};

pub(crate) fn run(grammar: &mut Grammar) {
    let syms = grammar.rule_symbols();
    let mut pass = Pass {
        grammar,
        cache: HashMap::new(),
        stack: Vec::new(),
    };
    for &sym in &syms {
        pass.rule(sym);
    }

    let cache = pass.cache;
    for &sym in &syms {
        grammar.production_mut(sym).always_consumes = Some(cache[&sym]);
    }
}

struct Pass<'g> {
    grammar: &'g Grammar,
    cache: HashMap<Symbol, bool>,
    stack: Vec<Symbol>,
}

impl Pass<'_> {
    fn rule(&mut self, sym: Symbol) -> bool {
        if let Some(&known) = self.cache.get(&sym) {
            return known;
        }
        if self.stack.contains(&sym) {
            // Reached again without consuming anything in between: the
            // cycle can succeed on empty input, so pin it.
            self.cache.insert(sym, false);
            return false;
        }
        self.stack.push(sym);
        let body = self.grammar.production(sym).body;
        let consumes = self.expr(body);
        self.stack.pop();
        // A nested use may have pinned the rule while the body was being
        // computed; the pin wins.
        *self.cache.entry(sym).or_insert(consumes)
    }

    fn expr(&mut self, id: ExprId) -> bool {
        let g = self.grammar;
        match g.expr(id) {
            Expr::Byte(_) | Expr::Class(_) | Expr::Lit(_) | Expr::Any => true,

            Expr::Empty
            | Expr::Fail
            | Expr::Eof
            | Expr::Open
            | Expr::Close
            | Expr::Tag(_)
            | Expr::Replace(_)
            | Expr::SymIs(_)
            | Expr::SymExists(_)
            | Expr::IndentDef
            | Expr::IndentIs
            | Expr::FlagIf { .. } => false,

            Expr::And(_) | Expr::Not(_) | Expr::Star(_) | Expr::Opt(_) => false,

            Expr::Seq(items) => items.iter().any(|&item| self.expr(item)),
            Expr::Alt { arms, .. } => arms.iter().all(|&arm| self.expr(arm)),

            Expr::Plus(inner)
            | Expr::Scope(inner)
            | Expr::Link { inner, .. }
            | Expr::SymDef { inner, .. }
            | Expr::FlagSet { inner, .. } => self.expr(*inner),

            Expr::Ref(target) => self.rule(*target),
        }
    }
}
