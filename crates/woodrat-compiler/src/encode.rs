//! Lowering from grammar IR to executable code.
//!
//! Control flow is emit-and-patch: forward targets are emitted as holes
//! and filled once the target address is known. Every rule body is
//! emitted standalone (so any rule can be a start rule); inlinable rules
//! are additionally expanded at their single call site.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use woodrat_grammar::{ByteSet, Expr, ExprId, Grammar, PredEntry, Prediction, Symbol, Typestate, atom_class};
use woodrat_program::{Addr, FlagId, Inst, NameId, Program, ProgramBuilder, RuleId, RuleMeta};

use crate::Options;

/// Name of the reserved symbol table indentation bindings live in.
const INDENT_TABLE: &str = "indent";

pub(crate) fn encode(grammar: &Grammar, options: &Options) -> Program {
    let mut enc = Encoder {
        grammar,
        options,
        b: ProgramBuilder::new(),
        rules: IndexMap::new(),
        inline: HashSet::new(),
    };
    enc.b.set_binary(options.binary);
    enc.b.set_ast(options.ast);

    // Register every rule first so calls can refer forward.
    for sym in grammar.rule_symbols() {
        let prod = grammar.production(sym);
        // Recognition-only programs emit no AST instructions, so every
        // rule behaves as a recognizer at call boundaries.
        let typestate = if options.ast {
            prod.typestate
        } else {
            Typestate::Boolean
        };
        let memo = options.memo && !prod.ctx_sensitive && typestate != Typestate::Operation;
        let meta = RuleMeta {
            entry: Addr::HOLE,
            typestate,
            memo,
            ctx_sensitive: prod.ctx_sensitive,
            always_consumes: prod.always_consumes.unwrap_or(false),
        };
        let id = enc.b.add_rule(grammar.name(sym), meta);
        enc.rules.insert(sym, id);

        if options.inline
            && prod.typestate == Typestate::Boolean
            && !prod.recursive
            && prod.ref_count == 1
        {
            enc.inline.insert(sym);
        }
    }

    for sym in grammar.rule_symbols() {
        let id = enc.rules[&sym];
        let entry = enc.b.here();
        enc.b.set_entry(id, entry);
        enc.expr(grammar.production(sym).body);
        enc.b.push(Inst::Return);
    }

    enc.b.finish()
}

struct Encoder<'g> {
    grammar: &'g Grammar,
    options: &'g Options,
    b: ProgramBuilder,
    rules: IndexMap<Symbol, RuleId>,
    inline: HashSet<Symbol>,
}

impl Encoder<'_> {
    fn expr(&mut self, id: ExprId) {
        let g = self.grammar;
        match g.expr(id) {
            Expr::Empty => {}
            Expr::Fail => {
                self.b.push(Inst::Fail);
            }
            Expr::Byte(b) => {
                self.b.push(Inst::Byte(*b));
            }
            Expr::Class(set) => {
                let class = self.b.class_id(*set);
                self.b.push(Inst::Class(class));
            }
            Expr::Lit(bytes) => {
                let lit = self.b.lit_id(bytes);
                self.b.push(Inst::Lit(lit));
            }
            Expr::Any => {
                self.b.push(Inst::Any);
            }
            Expr::Eof => {
                self.b.push(Inst::Eof);
            }

            Expr::Seq(items) => {
                for &item in items {
                    self.expr(item);
                }
            }
            Expr::Alt { arms, predict } => self.alt(arms, predict.as_deref()),
            Expr::Star(inner) => self.star(*inner),
            Expr::Plus(inner) => {
                self.expr(*inner);
                self.star(*inner);
            }
            Expr::Opt(inner) => self.opt(*inner),
            Expr::And(inner) => self.and(*inner),
            Expr::Not(inner) => self.not(*inner),

            Expr::Ref(sym) => {
                if self.inline.contains(sym) {
                    self.expr(g.production(*sym).body);
                } else {
                    let rule = self.rules[sym];
                    self.b.push(Inst::Call(rule));
                }
            }

            Expr::Open => {
                if self.options.ast {
                    self.b.push(Inst::Open);
                }
            }
            Expr::Close => {
                if self.options.ast {
                    self.b.push(Inst::Close);
                }
            }
            Expr::Tag(sym) => {
                if self.options.ast {
                    let name = self.name(*sym);
                    self.b.push(Inst::Tag(name));
                }
            }
            Expr::Replace(bytes) => {
                if self.options.ast {
                    let lit = self.b.lit_id(bytes);
                    self.b.push(Inst::Replace(lit));
                }
            }
            Expr::Link { slot, inner } => {
                if self.options.ast {
                    self.b.push(Inst::MarkLog);
                    self.expr(*inner);
                    self.b.push(Inst::Attach { slot: *slot });
                } else {
                    self.expr(*inner);
                }
            }

            Expr::SymDef { table, inner } => {
                self.b.push(Inst::MarkPos);
                self.expr(*inner);
                let name = self.name(*table);
                self.b.push(Inst::SymDef(name));
            }
            Expr::SymIs(sym) => {
                let name = self.name(*sym);
                self.b.push(Inst::SymIs(name));
            }
            Expr::SymExists(sym) => {
                let name = self.name(*sym);
                self.b.push(Inst::SymExists(name));
            }
            Expr::IndentDef => {
                let name = self.b.name_id(INDENT_TABLE);
                self.b.push(Inst::IndentDef(name));
            }
            Expr::IndentIs => {
                let name = self.b.name_id(INDENT_TABLE);
                self.b.push(Inst::SymIs(name));
            }
            Expr::Scope(inner) => {
                self.b.push(Inst::MarkSyms);
                self.expr(*inner);
                self.b.push(Inst::CutSyms);
            }
            Expr::FlagIf { flag, expect } => {
                let flag = self.flag(*flag);
                self.b.push(Inst::TestFlag {
                    flag,
                    expect: *expect,
                });
            }
            Expr::FlagSet { flag, value, inner } => {
                self.expr(*inner);
                let flag = self.flag(*flag);
                self.b.push(Inst::SetFlag {
                    flag,
                    value: *value,
                });
            }
        }
    }

    /// `e*`: a `Span` for single-byte atoms, otherwise the choice loop.
    fn star(&mut self, inner: ExprId) {
        if let Some(set) = atom_class(self.grammar, inner) {
            let class = self.b.class_id(set);
            self.b.push(Inst::Span(class));
            return;
        }
        let head = self.b.here();
        let choice = self.b.push(Inst::Choice(Addr::HOLE));
        self.expr(inner);
        let lc = self.b.push(Inst::LoopCommit {
            body: head,
            exit: Addr::HOLE,
        });
        let exit = self.b.here();
        self.b.patch(choice, Inst::Choice(exit));
        self.b.patch(lc, Inst::LoopCommit { body: head, exit });
    }

    /// `e?`: frameless specializations for atoms, otherwise
    /// choice/commit.
    fn opt(&mut self, inner: ExprId) {
        match self.grammar.expr(inner) {
            Expr::Byte(b) => {
                self.b.push(Inst::OptByte(*b));
                return;
            }
            Expr::Lit(bytes) => {
                let lit = self.b.lit_id(bytes);
                self.b.push(Inst::OptLit(lit));
                return;
            }
            Expr::Class(set) => {
                let class = self.b.class_id(*set);
                self.b.push(Inst::OptClass(class));
                return;
            }
            Expr::Any => {
                let class = self.b.class_id(ByteSet::FULL);
                self.b.push(Inst::OptClass(class));
                return;
            }
            _ => {}
        }
        let choice = self.b.push(Inst::Choice(Addr::HOLE));
        self.expr(inner);
        let commit = self.b.push(Inst::Commit(Addr::HOLE));
        let exit = self.b.here();
        self.b.patch(choice, Inst::Choice(exit));
        self.b.patch(commit, Inst::Commit(exit));
    }

    /// `&e`: run `e` under a frame, then restore through `BackCommit`.
    fn and(&mut self, inner: ExprId) {
        let choice = self.b.push(Inst::Choice(Addr::HOLE));
        self.expr(inner);
        let back = self.b.push(Inst::BackCommit(Addr::HOLE));
        let on_fail = self.b.here();
        self.b.patch(choice, Inst::Choice(on_fail));
        self.b.push(Inst::Fail);
        let exit = self.b.here();
        self.b.patch(back, Inst::BackCommit(exit));
    }

    /// `!e`: frameless specializations for atoms, otherwise
    /// choice/FailTwice.
    fn not(&mut self, inner: ExprId) {
        match self.grammar.expr(inner) {
            Expr::Byte(b) => {
                self.b.push(Inst::NotByte(*b));
                return;
            }
            Expr::Lit(bytes) => {
                let lit = self.b.lit_id(bytes);
                self.b.push(Inst::NotLit(lit));
                return;
            }
            Expr::Class(set) => {
                let class = self.b.class_id(*set);
                self.b.push(Inst::NotClass(class));
                return;
            }
            Expr::Any => {
                let class = self.b.class_id(ByteSet::FULL);
                self.b.push(Inst::NotClass(class));
                return;
            }
            _ => {}
        }
        let choice = self.b.push(Inst::Choice(Addr::HOLE));
        self.expr(inner);
        self.b.push(Inst::FailTwice);
        let exit = self.b.here();
        self.b.patch(choice, Inst::Choice(exit));
    }

    fn alt(&mut self, arms: &[ExprId], predict: Option<&Prediction>) {
        match predict {
            Some(p) if arms.len() >= 2 => self.dispatch(arms, p),
            _ => self.chain(arms),
        }
    }

    /// Ordered choice: `Choice`/`Commit` chain, last arm bare.
    fn chain(&mut self, arms: &[ExprId]) {
        let mut commits = Vec::new();
        for (index, &arm) in arms.iter().enumerate() {
            if index + 1 < arms.len() {
                let choice = self.b.push(Inst::Choice(Addr::HOLE));
                self.expr(arm);
                commits.push(self.b.push(Inst::Commit(Addr::HOLE)));
                let next = self.b.here();
                self.b.patch(choice, Inst::Choice(next));
            } else {
                self.expr(arm);
            }
        }
        let exit = self.b.here();
        for commit in commits {
            self.b.patch(commit, Inst::Commit(exit));
        }
    }

    /// Predicted choice: a `Dispatch` through a 257-entry table into
    /// per-outcome snippets. Snippets are deduplicated by arm identity
    /// (for unique predictions) and group identity (for ambiguous ones).
    fn dispatch(&mut self, arms: &[ExprId], p: &Prediction) {
        let table = self.b.new_table();
        self.b.push(Inst::Dispatch(table));

        let mut entries = Box::new([Addr::HOLE; 257]);
        let mut jumps: Vec<Addr> = Vec::new();
        let mut commits: Vec<Addr> = Vec::new();
        let mut fail_at: Option<Addr> = None;
        let mut singles: HashMap<ExprId, Addr> = HashMap::new();
        let mut grouped: HashMap<u16, Addr> = HashMap::new();

        for look in 0..257 {
            entries[look] = match p.entries[look] {
                PredEntry::Reject => match fail_at {
                    Some(at) => at,
                    None => {
                        let at = self.b.push(Inst::Fail);
                        fail_at = Some(at);
                        at
                    }
                },
                // A unique candidate runs with no failure frame: if it
                // fails here, no other arm could have matched.
                PredEntry::One(k) => {
                    let arm = arms[k as usize];
                    match singles.get(&arm).copied() {
                        Some(at) => at,
                        None => {
                            let at = self.b.here();
                            self.expr(arm);
                            jumps.push(self.b.push(Inst::Jump(Addr::HOLE)));
                            singles.insert(arm, at);
                            at
                        }
                    }
                }
                PredEntry::Group(gi) => match grouped.get(&gi).copied() {
                    Some(at) => at,
                    None => {
                        let at = self.b.here();
                        let members = &p.groups[gi as usize];
                        for (index, &k) in members.iter().enumerate() {
                            if index + 1 < members.len() {
                                let choice = self.b.push(Inst::Choice(Addr::HOLE));
                                self.expr(arms[k as usize]);
                                commits.push(self.b.push(Inst::Commit(Addr::HOLE)));
                                let next = self.b.here();
                                self.b.patch(choice, Inst::Choice(next));
                            } else {
                                self.expr(arms[k as usize]);
                                jumps.push(self.b.push(Inst::Jump(Addr::HOLE)));
                            }
                        }
                        grouped.insert(gi, at);
                        at
                    }
                },
            };
        }

        let exit = self.b.here();
        for at in jumps {
            self.b.patch(at, Inst::Jump(exit));
        }
        for at in commits {
            self.b.patch(at, Inst::Commit(exit));
        }
        self.b.set_table(table, entries);
    }

    fn name(&mut self, sym: Symbol) -> NameId {
        self.b.name_id(self.grammar.name(sym))
    }

    fn flag(&mut self, sym: Symbol) -> FlagId {
        self.b.flag_id(self.grammar.name(sym))
    }
}
