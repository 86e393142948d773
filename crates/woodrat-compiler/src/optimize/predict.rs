//! First-byte choice prediction.
//!
//! For each choice, every lookahead value is classified against every
//! arm: the arms that do not reject it stay candidates. A lookahead with
//! one candidate dispatches straight to that arm with no failure frame;
//! several candidates fall back to ordered choice over just those arms;
//! zero candidates fail immediately. A table that never narrows
//! anything is not attached.

use woodrat_grammar::{Acceptance, Expr, ExprId, Grammar, PredEntry, Prediction};

use crate::Options;
use crate::analyze::accept::Classifier;

pub(crate) fn run(grammar: &mut Grammar, options: &Options) {
    for sym in grammar.rule_symbols() {
        let body = grammar.production(sym).body;
        let rewritten = rewrite(grammar, options, body);
        grammar.production_mut(sym).body = rewritten;
    }
}

fn rewrite(grammar: &mut Grammar, options: &Options, id: ExprId) -> ExprId {
    match grammar.expr(id).clone() {
        Expr::Alt { arms, .. } => {
            let arms: Vec<ExprId> = arms
                .into_iter()
                .map(|arm| rewrite(grammar, options, arm))
                .collect();
            let predict = build(grammar, options, &arms).map(Box::new);
            grammar.intern(Expr::Alt { arms, predict })
        }

        Expr::Seq(items) => {
            let items: Vec<ExprId> = items
                .into_iter()
                .map(|item| rewrite(grammar, options, item))
                .collect();
            grammar.intern(Expr::Seq(items))
        }

        Expr::Star(inner) => {
            let inner = rewrite(grammar, options, inner);
            grammar.intern(Expr::Star(inner))
        }
        Expr::Plus(inner) => {
            let inner = rewrite(grammar, options, inner);
            grammar.intern(Expr::Plus(inner))
        }
        Expr::Opt(inner) => {
            let inner = rewrite(grammar, options, inner);
            grammar.intern(Expr::Opt(inner))
        }
        Expr::And(inner) => {
            let inner = rewrite(grammar, options, inner);
            grammar.intern(Expr::And(inner))
        }
        Expr::Not(inner) => {
            let inner = rewrite(grammar, options, inner);
            grammar.intern(Expr::Not(inner))
        }
        Expr::Link { slot, inner } => {
            let inner = rewrite(grammar, options, inner);
            grammar.intern(Expr::Link { slot, inner })
        }
        Expr::SymDef { table, inner } => {
            let inner = rewrite(grammar, options, inner);
            grammar.intern(Expr::SymDef { table, inner })
        }
        Expr::Scope(inner) => {
            let inner = rewrite(grammar, options, inner);
            grammar.intern(Expr::Scope(inner))
        }
        Expr::FlagSet { flag, value, inner } => {
            let inner = rewrite(grammar, options, inner);
            grammar.intern(Expr::FlagSet { flag, value, inner })
        }

        _ => id,
    }
}

fn build(grammar: &Grammar, options: &Options, arms: &[ExprId]) -> Option<Prediction> {
    let mut classifier = Classifier::new(grammar, options);
    let mut entries = [PredEntry::Reject; 257];
    let mut groups: Vec<Vec<u16>> = Vec::new();
    let mut narrows = false;

    for (look, entry) in entries.iter_mut().enumerate() {
        let candidates: Vec<u16> = arms
            .iter()
            .enumerate()
            .filter(|&(_, &arm)| classifier.classify(arm, look) != Acceptance::Reject)
            .map(|(index, _)| index as u16)
            .collect();

        if candidates.len() != arms.len() {
            narrows = true;
        }
        *entry = match candidates.len() {
            0 => PredEntry::Reject,
            1 => PredEntry::One(candidates[0]),
            _ => PredEntry::Group(group_id(&mut groups, candidates)),
        };
    }

    // A table where every lookahead still tries every arm buys nothing.
    narrows.then(|| Prediction { entries, groups })
}

fn group_id(groups: &mut Vec<Vec<u16>>, candidates: Vec<u16>) -> u16 {
    if let Some(index) = groups.iter().position(|g| *g == candidates) {
        return index as u16;
    }
    groups.push(candidates);
    (groups.len() - 1) as u16
}
