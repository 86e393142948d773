//! Typestate inference and the naming-convention lint.
//!
//! Every expression is classified as `Boolean` (recognition only),
//! `Object` (builds one node), or `Operation` (mutates the caller's
//! node). Rules are inferred by fixpoint: a recursive use still in
//! progress is provisionally `Boolean`, and a rule whose final state
//! contradicts a provisional answer it handed out is a fatal mismatch.

use std::collections::{HashMap, HashSet};

use woodrat_grammar::{Expr, ExprId, Grammar, GrammarError, Symbol, Typestate};

use crate::{Notice, Report};

pub(crate) fn run(grammar: &mut Grammar, report: &mut Report) -> Result<(), GrammarError> {
    let syms = grammar.rule_symbols();
    let mut pass = Pass {
        grammar,
        done: HashMap::new(),
        in_progress: HashSet::new(),
        provisional: HashSet::new(),
        notices: Vec::new(),
    };
    for &sym in &syms {
        pass.rule(sym)?;
    }

    let done = pass.done;
    let mut notices = pass.notices;
    for &sym in &syms {
        let name = grammar.name(sym).to_owned();
        let inferred = done[&sym];
        let suggested = convention(&name);
        if suggested != Typestate::Undefined && suggested != inferred {
            notices.push(Notice {
                rule: name,
                message: format!(
                    "name suggests typestate {}, inference found {}",
                    suggested.as_str(),
                    inferred.as_str()
                ),
            });
        }
    }
    report.notices.append(&mut notices);

    for &sym in &syms {
        grammar.production_mut(sym).typestate = done[&sym];
    }
    Ok(())
}

/// Typestate a rule name promises under the naming convention.
///
/// Capitalized names containing a lowercase letter promise node
/// construction, lowercase names containing an uppercase letter promise
/// an operation, and all-caps or quoted-style names promise recognition.
/// Leading underscores are skipped; everything after a `!` is ignored.
pub(crate) fn convention(name: &str) -> Typestate {
    let bytes = name.as_bytes();
    if matches!(bytes.first(), Some(b'~') | Some(b'"')) {
        return Typestate::Boolean;
    }
    let mut start = 0;
    while bytes.get(start) == Some(&b'_') {
        start += 1;
    }
    let Some(&first) = bytes.get(start) else {
        return Typestate::Boolean;
    };
    let first_upper = first.is_ascii_uppercase();
    for &b in &bytes[start + 1..] {
        if b == b'!' {
            break;
        }
        if b.is_ascii_uppercase() && !first_upper {
            return Typestate::Operation;
        }
        if b.is_ascii_lowercase() && first_upper {
            return Typestate::Object;
        }
    }
    if first_upper {
        Typestate::Boolean
    } else {
        Typestate::Undefined
    }
}

struct Pass<'g> {
    grammar: &'g Grammar,
    done: HashMap<Symbol, Typestate>,
    in_progress: HashSet<Symbol>,
    /// Rules whose in-progress state was observed by a recursive use.
    provisional: HashSet<Symbol>,
    notices: Vec<Notice>,
}

impl Pass<'_> {
    fn rule(&mut self, sym: Symbol) -> Result<Typestate, GrammarError> {
        if let Some(&state) = self.done.get(&sym) {
            return Ok(state);
        }
        if self.in_progress.contains(&sym) {
            self.provisional.insert(sym);
            return Ok(Typestate::Boolean);
        }
        self.in_progress.insert(sym);
        let body = self.grammar.production(sym).body;
        let state = self.expr(body, sym)?;
        self.in_progress.remove(&sym);

        if self.provisional.contains(&sym) && state != Typestate::Boolean {
            return Err(GrammarError::typestate(
                self.grammar.name(sym),
                format!(
                    "recursive uses were assumed boolean, but the rule is {}",
                    state.as_str()
                ),
            ));
        }
        self.done.insert(sym, state);
        Ok(state)
    }

    fn expr(&mut self, id: ExprId, rule: Symbol) -> Result<Typestate, GrammarError> {
        let g = self.grammar;
        let state = match g.expr(id) {
            Expr::Empty
            | Expr::Fail
            | Expr::Byte(_)
            | Expr::Class(_)
            | Expr::Lit(_)
            | Expr::Any
            | Expr::Eof
            | Expr::SymIs(_)
            | Expr::SymExists(_)
            | Expr::IndentDef
            | Expr::IndentIs
            | Expr::FlagIf { .. } => Typestate::Boolean,

            Expr::Open | Expr::Close => Typestate::Object,
            Expr::Tag(_) | Expr::Replace(_) => Typestate::Operation,

            // Lookahead discards whatever its inner expression builds.
            Expr::And(inner) | Expr::Not(inner) => {
                self.expr(*inner, rule)?;
                Typestate::Boolean
            }

            Expr::Seq(items) => {
                let mut result = Typestate::Boolean;
                for &item in items {
                    let state = self.expr(item, rule)?;
                    if result == Typestate::Boolean {
                        result = state;
                    }
                }
                result
            }
            Expr::Alt { arms, .. } => {
                let mut result = Typestate::Boolean;
                for &arm in arms {
                    let state = self.expr(arm, rule)?;
                    if result == Typestate::Boolean {
                        result = state;
                    }
                }
                result
            }

            Expr::Star(inner) | Expr::Plus(inner) => {
                let state = self.expr(*inner, rule)?;
                if state == Typestate::Object {
                    self.notices.push(Notice {
                        rule: g.name(rule).to_owned(),
                        message: "node built in a repetition is not linked; \
                                  only the last iteration survives"
                            .to_owned(),
                    });
                }
                state
            }
            Expr::Opt(inner) | Expr::Scope(inner) | Expr::FlagSet { inner, .. } => {
                self.expr(*inner, rule)?
            }

            Expr::Link { inner, .. } => {
                let before = self.provisional.len();
                let state = self.expr(*inner, rule)?;
                if state == Typestate::Boolean && self.provisional.len() == before {
                    self.notices.push(Notice {
                        rule: g.name(rule).to_owned(),
                        message: "link inner expression never builds a node".to_owned(),
                    });
                }
                Typestate::Operation
            }
            Expr::SymDef { inner, .. } => {
                let state = self.expr(*inner, rule)?;
                if state != Typestate::Boolean {
                    self.notices.push(Notice {
                        rule: g.name(rule).to_owned(),
                        message: "symbol text should come from a boolean expression".to_owned(),
                    });
                }
                Typestate::Boolean
            }

            Expr::Ref(target) => self.rule(*target)?,
        };
        Ok(state)
    }
}
