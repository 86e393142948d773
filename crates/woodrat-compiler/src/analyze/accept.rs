//! Per-byte acceptance classification.
//!
//! For each of the 256 byte values plus end of input, an expression
//! either can match starting there (`Accept`), can succeed without
//! consuming it (`Unconsumed`), or is guaranteed to fail (`Reject`).
//! The 257-entry tables cached on productions are the ground truth for
//! first-byte prediction.
//!
//! In text mode byte 0 is classified exactly like end of input; binary
//! mode treats it as an ordinary byte. Tables record the option mask
//! they were computed under and are recomputed when it changes.

use std::collections::{HashMap, HashSet};

use woodrat_grammar::{
    AcceptTable, Acceptance, EOF_SLOT, Expr, ExprId, Grammar, MASK_BINARY, OptionMask, Symbol,
};

use crate::Options;

/// Computes and caches the 257-entry acceptance table of every rule.
pub(crate) fn run(grammar: &mut Grammar, options: &Options) {
    let syms = grammar.rule_symbols();
    let mask = mask_of(options);

    let mut fresh: Vec<Option<AcceptTable>> = Vec::with_capacity(syms.len());
    {
        let mut classifier = Classifier::new(grammar, options);
        for &sym in &syms {
            let cached = grammar
                .production(sym)
                .acceptance
                .as_ref()
                .is_some_and(|table| table.mask == mask);
            if cached {
                fresh.push(None);
            } else {
                fresh.push(Some(classifier.table(sym)));
            }
        }
    }

    for (&sym, table) in syms.iter().zip(fresh) {
        if let Some(table) = table {
            grammar.production_mut(sym).acceptance = Some(table);
        }
    }
}

pub(crate) fn mask_of(options: &Options) -> OptionMask {
    if options.binary { MASK_BINARY } else { 0 }
}

/// Acceptance oracle over one grammar under one option mask.
///
/// Rule lookups prefer tables already cached under the same mask, so a
/// classifier built after [`run`] answers reference queries from the
/// cache instead of re-deriving them.
pub(crate) struct Classifier<'g> {
    grammar: &'g Grammar,
    mask: OptionMask,
    done: HashMap<(Symbol, usize), Acceptance>,
    visiting: HashSet<(Symbol, usize)>,
}

impl<'g> Classifier<'g> {
    pub(crate) fn new(grammar: &'g Grammar, options: &Options) -> Self {
        Self {
            grammar,
            mask: mask_of(options),
            done: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    /// Classifies `id` against a lookahead slot (0..=256, where 256 is
    /// end of input).
    pub(crate) fn classify(&mut self, id: ExprId, look: usize) -> Acceptance {
        let look = self.effective(look);
        self.expr(id, look)
    }

    /// Builds the full table for one rule.
    pub(crate) fn table(&mut self, sym: Symbol) -> AcceptTable {
        let mut entries = Box::new([Acceptance::Reject; 257]);
        for (look, entry) in entries.iter_mut().enumerate() {
            let look = self.effective(look);
            *entry = self.rule(sym, look);
        }
        AcceptTable::new(self.mask, entries)
    }

    /// In text mode a NUL byte terminates input, so slot 0 aliases the
    /// end-of-input slot.
    fn effective(&self, look: usize) -> usize {
        if look == 0 && self.mask & MASK_BINARY == 0 {
            EOF_SLOT
        } else {
            look
        }
    }

    fn rule(&mut self, sym: Symbol, look: usize) -> Acceptance {
        if let Some(table) = &self.grammar.production(sym).acceptance {
            if table.mask == self.mask {
                return table.entries[look];
            }
        }
        if let Some(&known) = self.done.get(&(sym, look)) {
            return known;
        }
        if !self.visiting.insert((sym, look)) {
            return Acceptance::Unconsumed;
        }
        let body = self.grammar.production(sym).body;
        let result = self.expr(body, look);
        self.visiting.remove(&(sym, look));
        self.done.insert((sym, look), result);
        result
    }

    fn expr(&mut self, id: ExprId, look: usize) -> Acceptance {
        let g = self.grammar;
        match g.expr(id) {
            Expr::Byte(b) => {
                if look == *b as usize {
                    Acceptance::Accept
                } else {
                    Acceptance::Reject
                }
            }
            Expr::Class(set) => {
                if look < 256 && set.contains(look as u8) {
                    Acceptance::Accept
                } else {
                    Acceptance::Reject
                }
            }
            Expr::Lit(bytes) => {
                if look == bytes[0] as usize {
                    Acceptance::Accept
                } else {
                    Acceptance::Reject
                }
            }
            Expr::Any => {
                if look < 256 {
                    Acceptance::Accept
                } else {
                    Acceptance::Reject
                }
            }
            Expr::Eof => {
                if look == EOF_SLOT {
                    Acceptance::Unconsumed
                } else {
                    Acceptance::Reject
                }
            }

            Expr::Empty
            | Expr::Open
            | Expr::Close
            | Expr::Tag(_)
            | Expr::Replace(_)
            | Expr::SymIs(_)
            | Expr::SymExists(_)
            | Expr::IndentDef
            | Expr::IndentIs
            | Expr::FlagIf { .. } => Acceptance::Unconsumed,

            Expr::Fail => Acceptance::Reject,

            Expr::Seq(items) => {
                for &item in items {
                    match self.expr(item, look) {
                        Acceptance::Unconsumed => continue,
                        decided => return decided,
                    }
                }
                Acceptance::Unconsumed
            }
            Expr::Alt { arms, .. } => {
                let mut result = Acceptance::Reject;
                for &arm in arms {
                    match self.expr(arm, look) {
                        Acceptance::Accept => return Acceptance::Accept,
                        Acceptance::Unconsumed => result = Acceptance::Unconsumed,
                        Acceptance::Reject => {}
                    }
                }
                result
            }

            Expr::Star(inner) | Expr::Opt(inner) => match self.expr(*inner, look) {
                Acceptance::Accept => Acceptance::Accept,
                _ => Acceptance::Unconsumed,
            },
            Expr::Plus(inner) => self.expr(*inner, look),

            Expr::And(inner) => match self.expr(*inner, look) {
                Acceptance::Reject => Acceptance::Reject,
                _ => Acceptance::Unconsumed,
            },
            Expr::Not(inner) => {
                // Inversion is only sound for a matcher that consumes
                // exactly the probed byte. !'int' still accepts 'i'.
                let single = matches!(
                    g.expr(*inner),
                    Expr::Byte(_) | Expr::Class(_) | Expr::Any
                );
                if single && self.expr(*inner, look) == Acceptance::Accept {
                    Acceptance::Reject
                } else {
                    Acceptance::Unconsumed
                }
            }

            Expr::Link { inner, .. }
            | Expr::SymDef { inner, .. }
            | Expr::Scope(inner)
            | Expr::FlagSet { inner, .. } => self.expr(*inner, look),

            Expr::Ref(target) => self.rule(*target, look),
        }
    }
}
