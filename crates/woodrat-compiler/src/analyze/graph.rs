//! Reference-graph facts: reference counts, recursion, resolution.

use woodrat_grammar::{Expr, Grammar, GrammarError};

/// Counts reference sites, marks recursive rules, and rejects references
/// to undefined rules.
pub(crate) fn run(grammar: &mut Grammar) -> Result<(), GrammarError> {
    let syms = grammar.rule_symbols();
    let mut counts = vec![0u32; syms.len()];
    let mut targets: Vec<Vec<usize>> = vec![Vec::new(); syms.len()];

    for (index, &sym) in syms.iter().enumerate() {
        let mut stack = vec![grammar.production(sym).body];
        while let Some(id) = stack.pop() {
            let expr = grammar.expr(id);
            if let Expr::Ref(target) = expr {
                let Some(target_index) = grammar.index_of(*target) else {
                    return Err(GrammarError::undefined(grammar.name(*target)));
                };
                counts[target_index] += 1;
                targets[index].push(target_index);
            }
            stack.extend(expr.children());
        }
        targets[index].sort_unstable();
        targets[index].dedup();
    }

    let mut recursive = vec![false; syms.len()];
    for start in 0..syms.len() {
        let mut seen = vec![false; syms.len()];
        let mut stack: Vec<usize> = targets[start].clone();
        while let Some(index) = stack.pop() {
            if index == start {
                recursive[start] = true;
                break;
            }
            if seen[index] {
                continue;
            }
            seen[index] = true;
            stack.extend(targets[index].iter().copied());
        }
    }

    for (index, &sym) in syms.iter().enumerate() {
        let prod = grammar.production_mut(sym);
        prod.ref_count = counts[index];
        prod.recursive = recursive[index];
    }
    Ok(())
}
