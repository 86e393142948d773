//! Grammar-level optimization passes.
//!
//! Folding runs before acceptance analysis so tables see the final
//! shapes; prediction runs after it because it consumes the tables.

pub(crate) mod predict;

#[cfg(test)]
mod fold_tests;

use woodrat_grammar::{ByteSet, Expr, ExprId, Grammar};

/// Folds byte-class choices and literal runs, flattening nested
/// sequences and choices on the way.
///
/// - A choice whose arms are all single-byte matchers becomes one class.
/// - A sequence of exact bytes becomes one literal run.
///
/// Both rewrites preserve match semantics exactly: single-byte arms
/// consume one byte on success, so ordered choice over them is plain
/// membership, and a literal run fails at its first mismatching byte
/// just as the byte sequence would.
pub(crate) fn fold(grammar: &mut Grammar) {
    for sym in grammar.rule_symbols() {
        let body = grammar.production(sym).body;
        let folded = fold_expr(grammar, body);
        grammar.production_mut(sym).body = folded;
    }
}

fn fold_expr(grammar: &mut Grammar, id: ExprId) -> ExprId {
    match grammar.expr(id).clone() {
        Expr::Seq(items) => {
            let mut flat: Vec<ExprId> = Vec::with_capacity(items.len());
            for item in items {
                let item = fold_expr(grammar, item);
                match grammar.expr(item) {
                    Expr::Seq(sub) => flat.extend(sub.iter().copied()),
                    Expr::Empty => {}
                    _ => flat.push(item),
                }
            }

            let mut bytes = Vec::with_capacity(flat.len());
            for &item in &flat {
                match grammar.expr(item) {
                    Expr::Byte(b) => bytes.push(*b),
                    Expr::Lit(run) => bytes.extend_from_slice(run),
                    _ => {
                        bytes.clear();
                        break;
                    }
                }
            }
            if bytes.len() >= 2 {
                return grammar.intern(Expr::Lit(bytes.into_boxed_slice()));
            }

            match flat.len() {
                0 => grammar.intern(Expr::Empty),
                1 => flat[0],
                _ => grammar.intern(Expr::Seq(flat)),
            }
        }
        Expr::Alt { arms, .. } => {
            let mut flat: Vec<ExprId> = Vec::with_capacity(arms.len());
            for arm in arms {
                let arm = fold_expr(grammar, arm);
                match grammar.expr(arm) {
                    Expr::Alt { arms: sub, .. } => flat.extend(sub.iter().copied()),
                    Expr::Fail => {}
                    _ => flat.push(arm),
                }
            }

            let mut set = ByteSet::EMPTY;
            let mut single_byte = !flat.is_empty();
            for &arm in &flat {
                match grammar.expr(arm) {
                    Expr::Byte(b) => set.insert(*b),
                    Expr::Class(s) => set = set.union(s),
                    _ => {
                        single_byte = false;
                        break;
                    }
                }
            }
            if single_byte && flat.len() >= 2 {
                return grammar.intern(Expr::Class(set));
            }

            match flat.len() {
                0 => grammar.intern(Expr::Fail),
                1 => flat[0],
                _ => grammar.intern(Expr::Alt {
                    arms: flat,
                    predict: None,
                }),
            }
        }

        Expr::Star(inner) => {
            let inner = fold_expr(grammar, inner);
            grammar.intern(Expr::Star(inner))
        }
        Expr::Plus(inner) => {
            let inner = fold_expr(grammar, inner);
            grammar.intern(Expr::Plus(inner))
        }
        Expr::Opt(inner) => {
            let inner = fold_expr(grammar, inner);
            grammar.intern(Expr::Opt(inner))
        }
        Expr::And(inner) => {
            let inner = fold_expr(grammar, inner);
            grammar.intern(Expr::And(inner))
        }
        Expr::Not(inner) => {
            let inner = fold_expr(grammar, inner);
            grammar.intern(Expr::Not(inner))
        }
        Expr::Link { slot, inner } => {
            let inner = fold_expr(grammar, inner);
            grammar.intern(Expr::Link { slot, inner })
        }
        Expr::SymDef { table, inner } => {
            let inner = fold_expr(grammar, inner);
            grammar.intern(Expr::SymDef { table, inner })
        }
        Expr::Scope(inner) => {
            let inner = fold_expr(grammar, inner);
            grammar.intern(Expr::Scope(inner))
        }
        Expr::FlagSet { flag, value, inner } => {
            let inner = fold_expr(grammar, inner);
            grammar.intern(Expr::FlagSet { flag, value, inner })
        }

        _ => id,
    }
}
