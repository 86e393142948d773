//! Execution tracing.
//!
//! The machine reports rule activity through a [`Tracer`]. Tracing is an
//! observational side channel: a tracer sees rule entries, memo hits,
//! and backtracking, but nothing it does feeds back into the match
//! outcome. The default [`NoopTracer`] compiles away entirely.

use std::collections::HashMap;

/// Observer for machine events. Every method defaults to a no-op.
pub trait Tracer {
    /// A rule call is entered at `pos`.
    fn trace_call(&mut self, rule: &str, pos: usize) {
        let _ = (rule, pos);
    }

    /// A rule call finished; `matched` tells how.
    fn trace_return(&mut self, rule: &str, start: usize, end: usize, matched: bool) {
        let _ = (rule, start, end, matched);
    }

    /// A rule call was answered from the memo table.
    fn trace_memo(&mut self, rule: &str, pos: usize) {
        let _ = (rule, pos);
    }

    /// The machine unwound from `from` to the failure continuation
    /// saved at `to`.
    fn trace_backtrack(&mut self, from: usize, to: usize) {
        let _ = (from, to);
    }
}

/// Tracer that records nothing. Calls through it optimize away.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// Prints every event to stderr, indented by call depth.
#[derive(Debug, Default)]
pub struct PrintTracer {
    depth: usize,
}

impl PrintTracer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tracer for PrintTracer {
    fn trace_call(&mut self, rule: &str, pos: usize) {
        eprintln!("{:width$}{rule} @ {pos}", "", width = self.depth * 2);
        self.depth += 1;
    }

    fn trace_return(&mut self, rule: &str, start: usize, end: usize, matched: bool) {
        self.depth = self.depth.saturating_sub(1);
        if matched {
            eprintln!("{:width$}{rule} ok {start}..{end}", "", width = self.depth * 2);
        } else {
            eprintln!("{:width$}{rule} fail @ {start}", "", width = self.depth * 2);
        }
    }

    fn trace_memo(&mut self, rule: &str, pos: usize) {
        eprintln!("{:width$}{rule} memo @ {pos}", "", width = self.depth * 2);
    }

    fn trace_backtrack(&mut self, from: usize, to: usize) {
        eprintln!("{:width$}backtrack {from} -> {to}", "", width = self.depth * 2);
    }
}

/// Counts rule activity. Useful for asserting that memoization or
/// prediction changed how much work a match did without changing what
/// it matched.
#[derive(Debug, Clone, Default)]
pub struct CountingTracer {
    calls: HashMap<String, u32>,
    memo_hits: u32,
    backtracks: u32,
}

impl CountingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Times `rule` was actually entered. Memo hits do not count.
    pub fn calls(&self, rule: &str) -> u32 {
        self.calls.get(rule).copied().unwrap_or(0)
    }

    pub fn memo_hits(&self) -> u32 {
        self.memo_hits
    }

    pub fn backtracks(&self) -> u32 {
        self.backtracks
    }
}

impl Tracer for CountingTracer {
    fn trace_call(&mut self, rule: &str, _pos: usize) {
        *self.calls.entry(rule.to_owned()).or_insert(0) += 1;
    }

    fn trace_memo(&mut self, _rule: &str, _pos: usize) {
        self.memo_hits += 1;
    }

    fn trace_backtrack(&mut self, _from: usize, _to: usize) {
        self.backtracks += 1;
    }
}
