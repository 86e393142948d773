#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Grammar compiler: static analysis, optimization, and lowering.
//!
//! [`compile`] drives the pipeline over a [`Grammar`]:
//! 1. reference-graph facts: reference counts, recursion, resolution
//! 2. typestate inference, the naming lint, and structural notices
//! 3. always-consumes and context-sensitivity analysis
//! 4. byte-class and literal-run folding (optional)
//! 5. per-byte acceptance tables, then first-byte prediction (optional)
//! 6. lowering to a [`Program`]
//!
//! Analyses record their facts on the grammar's productions; the
//! encoder reads them back when it specializes instructions and decides
//! memoization.

mod analyze;
mod encode;
mod optimize;


use serde::Serialize;
use woodrat_grammar::{Grammar, GrammarError};
use woodrat_program::Program;

/// Compilation switches. Defaults enable every optimization and produce
/// AST-building programs for text input.
#[derive(Debug, Clone)]
pub struct Options {
    /// Emit AST construction instructions. Off means recognition only.
    pub ast: bool,
    /// Memoize eligible rules at call sites.
    pub memo: bool,
    /// Attach first-byte dispatch tables to choices.
    pub predict: bool,
    /// Fold byte-class choices and literal runs.
    pub fold: bool,
    /// Inline trivial rules at their single call site.
    pub inline: bool,
    /// Treat byte 0 as ordinary input rather than end of input.
    pub binary: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ast: true,
            memo: true,
            predict: true,
            fold: true,
            inline: true,
            binary: false,
        }
    }
}

impl Options {
    pub fn with_ast(mut self, ast: bool) -> Self {
        self.ast = ast;
        self
    }

    pub fn with_memo(mut self, memo: bool) -> Self {
        self.memo = memo;
        self
    }

    pub fn with_predict(mut self, predict: bool) -> Self {
        self.predict = predict;
        self
    }

    pub fn with_fold(mut self, fold: bool) -> Self {
        self.fold = fold;
        self
    }

    pub fn with_inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }

    pub fn with_binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    /// Everything off except plain backtracking execution.
    pub fn minimal() -> Self {
        Self {
            ast: true,
            memo: false,
            predict: false,
            fold: false,
            inline: false,
            binary: false,
        }
    }
}

/// One advisory finding. Notices never fail compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub rule: String,
    pub message: String,
}

/// Advisory findings collected while compiling.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub notices: Vec<Notice>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.notices.is_empty()
    }

    pub(crate) fn notice(&mut self, rule: &str, message: impl Into<String>) {
        self.notices.push(Notice {
            rule: rule.to_owned(),
            message: message.into(),
        });
    }
}

/// A compiled grammar: the analyzed IR, the lowered program, and the
/// advisory report.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    grammar: Grammar,
    program: Program,
    report: Report,
}

impl CompiledGrammar {
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_program(self) -> Program {
        self.program
    }
}

/// Analyzes, optimizes, and lowers `grammar`.
///
/// Fails on the first fatal defect: an unresolved rule reference or a
/// typestate contradiction. Naming-convention findings and suspicious
/// AST shapes are reported as notices instead.
pub fn compile(grammar: Grammar, options: &Options) -> Result<CompiledGrammar, GrammarError> {
    let mut grammar = grammar;
    let mut report = Report::default();

    analyze::graph::run(&mut grammar)?;
    analyze::typestate::run(&mut grammar, &mut report)?;
    analyze::consume::run(&mut grammar);
    analyze::context::run(&mut grammar);

    if options.fold {
        optimize::fold(&mut grammar);
    }
    analyze::accept::run(&mut grammar, options);
    if options.predict {
        optimize::predict::run(&mut grammar, options);
    }

    let program = encode::encode(&grammar, options);
    Ok(CompiledGrammar {
        grammar,
        program,
        report,
    })
}
