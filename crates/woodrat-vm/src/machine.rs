//! The matching engine.
//!
//! A [`Machine`] interprets a compiled [`Program`] over a byte slice.
//! Failure recovery is O(1): `Choice` pushes one frame capturing the
//! cursor and a watermark into every backtrackable store, and failing
//! truncates those stores back to the top frame's watermarks. The AST
//! log, symbol stack, mark stack, and flag journal all roll back this
//! way; the memo table deliberately does not, because memoized rules
//! are context-free and their results survive speculation.

use woodrat_grammar::{EOF_SLOT, Typestate};
use woodrat_program::{Addr, FlagId, Inst, Program, RuleId};

use crate::error::RuntimeError;
use crate::log::{AstLog, AstOp};
use crate::memo::{MemoEntry, MemoTable};
use crate::symbols::SymStack;
use crate::trace::{NoopTracer, Tracer};
use crate::tree::{self, NodeArena, Tree};

/// Runtime limits for one match.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Maximum instructions executed (default: 100,000,000).
    pub(crate) step_fuel: u64,
    /// Maximum rule-call depth (default: 1,024).
    pub(crate) max_depth: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            step_fuel: 100_000_000,
            max_depth: 1024,
        }
    }
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the instruction budget.
    pub fn step_fuel(mut self, fuel: u64) -> Self {
        self.step_fuel = fuel;
        self
    }

    /// Set the rule-call depth limit.
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Failure continuation: where to resume and what to roll back.
#[derive(Debug, Clone, Copy)]
struct FailFrame {
    /// Resume address.
    addr: Addr,
    /// Input cursor to restore.
    pos: usize,
    /// Watermarks into the backtrackable stores.
    log: usize,
    syms: usize,
    flags: usize,
    marks: usize,
    /// Call depth when the frame was pushed. Deeper calls are unwound
    /// on failure.
    calls: usize,
}

/// One active rule call.
#[derive(Debug, Clone, Copy)]
struct CallFrame {
    ret: usize,
    rule: RuleId,
    entry_pos: usize,
    log_mark: usize,
}

/// Outcome of a finished match.
///
/// Fatal conditions come back as [`RuntimeError`] instead; a mismatch
/// is an ordinary result with `matched() == false`.
#[derive(Debug)]
pub struct MatchResult {
    matched: bool,
    end: usize,
    furthest: usize,
    tree: Option<Tree>,
}

impl MatchResult {
    pub fn matched(&self) -> bool {
        self.matched
    }

    /// End of the consumed prefix. Zero when the match failed.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Furthest input position any attempt reached. After a mismatch
    /// this is the best error location available.
    pub fn furthest(&self) -> usize {
        self.furthest
    }

    /// The committed tree, present when the match succeeded, the
    /// program was compiled with AST support, and the start rule builds
    /// or edits nodes.
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    pub fn into_tree(self) -> Option<Tree> {
        self.tree
    }

    /// Input left over after the consumed prefix, when the match
    /// succeeded without reaching the end.
    pub fn unconsumed_tail<'i>(&self, input: &'i [u8]) -> Option<&'i [u8]> {
        (self.matched && self.end < input.len()).then(|| &input[self.end..])
    }
}

/// Backtracking interpreter for one program over one input.
pub struct Machine<'p, 'i> {
    program: &'p Program,
    input: &'i [u8],
    pos: usize,
    pc: usize,
    fail_stack: Vec<FailFrame>,
    call_stack: Vec<CallFrame>,
    /// Shared stack for the mark/cut instruction pairs. Pairs nest, so
    /// one stack serves positions, log lengths, and symbol depths alike.
    marks: Vec<usize>,
    log: AstLog,
    arena: NodeArena,
    syms: SymStack,
    flags: Vec<bool>,
    flag_journal: Vec<(FlagId, bool)>,
    memo: MemoTable,
    furthest: usize,
    fuel: u64,
    limits: Limits,
}

impl<'p, 'i> Machine<'p, 'i> {
    pub fn new(program: &'p Program, input: &'i [u8]) -> Self {
        let limits = Limits::default();
        Self {
            program,
            input,
            pos: 0,
            pc: 0,
            fail_stack: Vec::new(),
            call_stack: Vec::new(),
            marks: Vec::new(),
            log: AstLog::new(),
            arena: NodeArena::new(),
            syms: SymStack::new(),
            flags: vec![false; program.flag_count()],
            flag_journal: Vec::new(),
            memo: MemoTable::new(),
            furthest: 0,
            fuel: limits.step_fuel,
            limits,
        }
    }

    /// Replace the default limits.
    pub fn limits(mut self, limits: Limits) -> Self {
        self.fuel = limits.step_fuel;
        self.limits = limits;
        self
    }

    /// Preset a flag before the match starts. Flags default to false.
    /// A name the program never tests is ignored.
    pub fn flag(mut self, name: &str, value: bool) -> Self {
        for index in 0..self.program.flag_count() {
            if self.program.flag_name(FlagId::new(index)) == name {
                self.flags[index] = value;
            }
        }
        self
    }

    /// Match the input from the rule named `start`.
    pub fn run(self, start: &str) -> Result<MatchResult, RuntimeError> {
        self.run_with(start, &mut NoopTracer)
    }

    /// Match with a tracer watching rule activity.
    pub fn run_with<T: Tracer>(
        mut self,
        start: &str,
        tracer: &mut T,
    ) -> Result<MatchResult, RuntimeError> {
        let program = self.program;
        let Some((_, meta)) = program.rule_named(start) else {
            return Err(RuntimeError::UnknownRule(start.to_owned()));
        };
        let typestate = meta.typestate;
        let build_tree = program.ast() && typestate != Typestate::Boolean;
        // Operation bodies edit their caller's node. At top level there
        // is no caller, so seed one spanning the whole match.
        if build_tree && typestate == Typestate::Operation {
            self.log.push(AstOp::Open { pos: 0 });
        }
        self.pc = meta.entry.index();
        tracer.trace_call(start, 0);

        let matched = loop {
            if self.fuel == 0 {
                return Err(RuntimeError::FuelExhausted(self.limits.step_fuel));
            }
            self.fuel -= 1;

            match program.inst(Addr::new(self.pc)) {
                Inst::Byte(byte) => {
                    if self.current() == Some(byte) {
                        self.pos += 1;
                        self.pc += 1;
                    } else if !self.fail(tracer) {
                        break false;
                    }
                }
                Inst::Class(class) => match self.current() {
                    Some(byte) if program.class(class).contains(byte) => {
                        self.pos += 1;
                        self.pc += 1;
                    }
                    _ => {
                        if !self.fail(tracer) {
                            break false;
                        }
                    }
                },
                Inst::Lit(lit) => match self.lit_end(program.lit(lit)) {
                    Ok(end) => {
                        self.pos = end;
                        self.pc += 1;
                    }
                    Err(reached) => {
                        self.furthest = self.furthest.max(reached);
                        if !self.fail(tracer) {
                            break false;
                        }
                    }
                },
                Inst::Any => {
                    if self.current().is_some() {
                        self.pos += 1;
                        self.pc += 1;
                    } else if !self.fail(tracer) {
                        break false;
                    }
                }
                Inst::Eof => {
                    if self.current().is_none() {
                        self.pc += 1;
                    } else if !self.fail(tracer) {
                        break false;
                    }
                }
                Inst::Span(class) => {
                    let set = program.class(class);
                    while let Some(byte) = self.current() {
                        if !set.contains(byte) {
                            break;
                        }
                        self.pos += 1;
                    }
                    self.pc += 1;
                }
                Inst::OptByte(byte) => {
                    if self.current() == Some(byte) {
                        self.pos += 1;
                    }
                    self.pc += 1;
                }
                Inst::OptClass(class) => {
                    if let Some(byte) = self.current()
                        && program.class(class).contains(byte)
                    {
                        self.pos += 1;
                    }
                    self.pc += 1;
                }
                Inst::OptLit(lit) => {
                    if let Ok(end) = self.lit_end(program.lit(lit)) {
                        self.pos = end;
                    }
                    self.pc += 1;
                }
                Inst::NotByte(byte) => {
                    if self.current() == Some(byte) {
                        if !self.fail(tracer) {
                            break false;
                        }
                    } else {
                        self.pc += 1;
                    }
                }
                Inst::NotClass(class) => match self.current() {
                    Some(byte) if program.class(class).contains(byte) => {
                        if !self.fail(tracer) {
                            break false;
                        }
                    }
                    _ => self.pc += 1,
                },
                Inst::NotLit(lit) => {
                    if self.lit_end(program.lit(lit)).is_ok() {
                        if !self.fail(tracer) {
                            break false;
                        }
                    } else {
                        self.pc += 1;
                    }
                }

                Inst::Jump(target) => self.pc = target.index(),
                Inst::Choice(target) => {
                    self.push_frame(target);
                    self.pc += 1;
                }
                Inst::Commit(target) => {
                    self.pop_frame();
                    self.pc = target.index();
                }
                Inst::LoopCommit { body, exit } => {
                    // Leave the loop when the iteration matched zero
                    // bytes, so a zero-width body cannot spin.
                    let frame = self.pop_frame();
                    if self.pos > frame.pos {
                        self.pc = body.index();
                    } else {
                        self.pc = exit.index();
                    }
                }
                Inst::BackCommit(target) => {
                    let frame = self.pop_frame();
                    self.restore(&frame);
                    self.pc = target.index();
                }
                Inst::FailTwice => {
                    self.pop_frame();
                    if !self.fail(tracer) {
                        break false;
                    }
                }
                Inst::Fail => {
                    if !self.fail(tracer) {
                        break false;
                    }
                }
                Inst::Call(rule) => {
                    let meta = program.rule(rule);
                    if meta.memo
                        && let Some(entry) = self.memo.probe(rule, self.pos)
                    {
                        tracer.trace_memo(program.rule_name(rule), self.pos);
                        match entry {
                            MemoEntry::Fail => {
                                if !self.fail(tracer) {
                                    break false;
                                }
                            }
                            MemoEntry::Hit { end, node } => {
                                self.pos = end;
                                if let Some(node) = node {
                                    self.log.push(AstOp::Attach { slot: -1, node });
                                }
                                self.pc += 1;
                            }
                        }
                    } else {
                        if self.call_stack.len() >= self.limits.max_depth as usize {
                            return Err(RuntimeError::DepthExceeded(self.limits.max_depth));
                        }
                        tracer.trace_call(program.rule_name(rule), self.pos);
                        self.call_stack.push(CallFrame {
                            ret: self.pc + 1,
                            rule,
                            entry_pos: self.pos,
                            log_mark: self.log.len(),
                        });
                        self.pc = meta.entry.index();
                    }
                }
                Inst::Return => {
                    let Some(frame) = self.call_stack.pop() else {
                        break true;
                    };
                    let meta = program.rule(frame.rule);
                    let mut node = None;
                    if program.ast() && meta.typestate == Typestate::Object {
                        node = tree::commit(
                            &mut self.arena,
                            self.log.since(frame.log_mark),
                            self.input,
                            program,
                        );
                        self.log.truncate(frame.log_mark);
                        if let Some(node) = node {
                            self.log.push(AstOp::Attach { slot: -1, node });
                        }
                    }
                    if meta.memo {
                        self.memo.store(
                            frame.rule,
                            frame.entry_pos,
                            MemoEntry::Hit {
                                end: self.pos,
                                node,
                            },
                        );
                    }
                    tracer.trace_return(
                        program.rule_name(frame.rule),
                        frame.entry_pos,
                        self.pos,
                        true,
                    );
                    self.pc = frame.ret;
                }
                Inst::Dispatch(table) => {
                    let slot = match self.current() {
                        Some(byte) => byte as usize,
                        None => EOF_SLOT,
                    };
                    self.pc = program.table(table)[slot].index();
                }

                Inst::Open => {
                    self.log.push(AstOp::Open {
                        pos: self.pos as u32,
                    });
                    self.pc += 1;
                }
                Inst::Close => {
                    self.log.push(AstOp::Close {
                        pos: self.pos as u32,
                    });
                    self.pc += 1;
                }
                Inst::Tag(name) => {
                    self.log.push(AstOp::Tag(name));
                    self.pc += 1;
                }
                Inst::Replace(lit) => {
                    self.log.push(AstOp::Replace(lit));
                    self.pc += 1;
                }
                Inst::MarkLog => {
                    self.marks.push(self.log.len());
                    self.pc += 1;
                }
                Inst::Attach { slot } => {
                    let mark = self.pop_mark();
                    let node =
                        tree::commit(&mut self.arena, self.log.since(mark), self.input, program);
                    self.log.truncate(mark);
                    if let Some(node) = node {
                        self.log.push(AstOp::Attach { slot, node });
                    }
                    self.pc += 1;
                }

                Inst::MarkPos => {
                    self.marks.push(self.pos);
                    self.pc += 1;
                }
                Inst::SymDef(name) => {
                    let start = self.pop_mark();
                    self.syms.bind(name, start, self.pos);
                    self.pc += 1;
                }
                Inst::SymIs(name) => match self.syms.top(name) {
                    Some((start, end)) => match self.lit_end(&self.input[start..end]) {
                        Ok(stop) => {
                            self.pos = stop;
                            self.pc += 1;
                        }
                        Err(reached) => {
                            self.furthest = self.furthest.max(reached);
                            if !self.fail(tracer) {
                                break false;
                            }
                        }
                    },
                    None => {
                        if !self.fail(tracer) {
                            break false;
                        }
                    }
                },
                Inst::SymExists(name) => {
                    if self.syms.exists(name) {
                        self.pc += 1;
                    } else if !self.fail(tracer) {
                        break false;
                    }
                }
                Inst::MarkSyms => {
                    self.marks.push(self.syms.len());
                    self.pc += 1;
                }
                Inst::CutSyms => {
                    let mark = self.pop_mark();
                    self.syms.truncate(mark);
                    self.pc += 1;
                }
                Inst::IndentDef(name) => {
                    let line = self.input[..self.pos]
                        .iter()
                        .rposition(|&byte| byte == b'\n')
                        .map_or(0, |at| at + 1);
                    self.syms.bind(name, line, self.pos);
                    self.pc += 1;
                }
                Inst::TestFlag { flag, expect } => {
                    if self.flags[flag.index()] == expect {
                        self.pc += 1;
                    } else if !self.fail(tracer) {
                        break false;
                    }
                }
                Inst::SetFlag { flag, value } => {
                    self.flag_journal.push((flag, self.flags[flag.index()]));
                    self.flags[flag.index()] = value;
                    self.pc += 1;
                }
            }
        };

        tracer.trace_return(start, 0, self.pos, matched);
        if !matched {
            return Ok(MatchResult {
                matched: false,
                end: 0,
                furthest: self.furthest,
                tree: None,
            });
        }

        let end = self.pos;
        let furthest = self.furthest.max(end);
        let mut result_tree = None;
        if build_tree {
            if typestate == Typestate::Operation {
                self.log.push(AstOp::Close { pos: end as u32 });
            }
            if let Some(root) =
                tree::commit(&mut self.arena, self.log.as_slice(), self.input, program)
            {
                result_tree = Some(Tree::new(self.arena, root, program));
            }
        }
        Ok(MatchResult {
            matched: true,
            end,
            furthest,
            tree: result_tree,
        })
    }

    /// Next input byte, or `None` at end of input. In text mode a zero
    /// byte terminates the input.
    fn current(&self) -> Option<u8> {
        match self.input.get(self.pos) {
            Some(&byte) if byte != 0 || self.program.binary() => Some(byte),
            _ => None,
        }
    }

    /// Where `lit` would end if matched at the cursor. `Err` carries
    /// the position of the first mismatch, for failure reporting.
    fn lit_end(&self, lit: &[u8]) -> Result<usize, usize> {
        let mut pos = self.pos;
        for &expect in lit {
            match self.input.get(pos) {
                Some(&byte) if byte == expect && (expect != 0 || self.program.binary()) => pos += 1,
                _ => return Err(pos),
            }
        }
        Ok(pos)
    }

    fn push_frame(&mut self, addr: Addr) {
        self.fail_stack.push(FailFrame {
            addr,
            pos: self.pos,
            log: self.log.len(),
            syms: self.syms.len(),
            flags: self.flag_journal.len(),
            marks: self.marks.len(),
            calls: self.call_stack.len(),
        });
    }

    /// The commit family runs strictly balanced against `Choice`.
    fn pop_frame(&mut self) -> FailFrame {
        self.fail_stack
            .pop()
            .expect("commit without an open choice frame")
    }

    fn pop_mark(&mut self) -> usize {
        self.marks.pop().expect("cut without a matching mark")
    }

    /// Roll the speculative stores back to a frame's watermarks.
    fn restore(&mut self, frame: &FailFrame) {
        self.pos = frame.pos;
        self.log.truncate(frame.log);
        self.syms.truncate(frame.syms);
        self.marks.truncate(frame.marks);
        self.rewind_flags(frame.flags);
    }

    fn rewind_flags(&mut self, watermark: usize) {
        while self.flag_journal.len() > watermark {
            if let Some((flag, old)) = self.flag_journal.pop() {
                self.flags[flag.index()] = old;
            }
        }
    }

    /// Unwind to the newest failure continuation. Returns false when
    /// none is left, which makes the whole match a mismatch.
    fn fail<T: Tracer>(&mut self, tracer: &mut T) -> bool {
        let program = self.program;
        self.furthest = self.furthest.max(self.pos);
        let Some(frame) = self.fail_stack.pop() else {
            return false;
        };
        // The frame sits outside calls entered after it, so those rules
        // have no alternatives left: their failure at the entry
        // position is definitive and can be memoized.
        while self.call_stack.len() > frame.calls {
            if let Some(call) = self.call_stack.pop() {
                let meta = program.rule(call.rule);
                if meta.memo {
                    self.memo.store(call.rule, call.entry_pos, MemoEntry::Fail);
                }
                tracer.trace_return(
                    program.rule_name(call.rule),
                    call.entry_pos,
                    self.pos,
                    false,
                );
            }
        }
        tracer.trace_backtrack(self.pos, frame.pos);
        self.restore(&frame);
        self.pc = frame.addr.index();
        true
    }
}
