//! Woodrat: byte-level PEG grammars with typestate inference, an
//! optimizing compiler, and a backtracking virtual machine.
//!
//! # Example
//!
//! ```
//! use woodrat::{GrammarBuilder, Parser};
//!
//! let mut b = GrammarBuilder::new();
//! let digit = b.range(b'0', b'9');
//! let digits = b.plus(digit);
//! let num = b.tree("num", digits);
//! b.rule("Number", num);
//!
//! let parser = Parser::new(b.finish()?)?;
//! let result = parser.parse("Number", b"6502")?;
//! assert!(result.matched());
//! assert_eq!(result.tree().unwrap().dump(), "(#num '6502')\n");
//! # Ok::<(), woodrat::Error>(())
//! ```
//!
//! [`GrammarBuilder`] assembles the expression IR, [`compile`] analyzes
//! and lowers it, and [`Machine`] runs the result. [`Parser`] bundles
//! the last two steps for the common case.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]


pub use woodrat_compiler::{CompiledGrammar, Notice, Options, Report, compile};
pub use woodrat_grammar::{ByteSet, Grammar, GrammarBuilder, GrammarError, Typestate};
pub use woodrat_program::Program;
pub use woodrat_vm::{
    CountingTracer, Limits, Machine, MatchResult, NodeId, NodeRef, NoopTracer, PrintTracer,
    RuntimeError, Tracer, Tree,
};

/// Any failure on the way from a grammar to a match result.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The grammar is defective: an undefined or duplicate rule, or a
    /// typestate contradiction.
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// Execution hit a resource limit or was started from an unknown
    /// rule.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A compiled grammar ready to match inputs.
#[derive(Debug)]
pub struct Parser {
    program: Program,
    report: Report,
}

impl Parser {
    /// Compiles `grammar` with default [`Options`].
    pub fn new(grammar: Grammar) -> Result<Self> {
        Self::with_options(grammar, &Options::default())
    }

    pub fn with_options(grammar: Grammar, options: &Options) -> Result<Self> {
        let compiled = compile(grammar, options)?;
        Ok(Self {
            report: compiled.report().clone(),
            program: compiled.into_program(),
        })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Advisory findings collected while compiling.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Matches `input` from the rule named `start`.
    pub fn parse(&self, start: &str, input: &[u8]) -> Result<MatchResult> {
        Ok(Machine::new(&self.program, input).run(start)?)
    }

    /// A bare machine over `input`, for presetting flags or limits or
    /// for attaching a [`Tracer`].
    pub fn machine<'i>(&self, input: &'i [u8]) -> Machine<'_, 'i> {
        Machine::new(&self.program, input)
    }
}
