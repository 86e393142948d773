#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Grammar-side data structures for Woodrat.
//!
//! This crate contains:
//! - Parsing-expression IR ([`Expr`]) hash-consed into an [`ExprPool`]
//! - 256-bit byte classes ([`ByteSet`]) with range extraction
//! - The named-rule table ([`Grammar`], [`Production`]) and the analysis
//!   facts the compiler records on it
//! - A programmatic assembly API ([`GrammarBuilder`])

mod build;
mod byteset;
mod error;
mod expr;
mod grammar;
mod interner;

#[cfg(test)]
mod build_tests;
#[cfg(test)]
mod byteset_tests;
#[cfg(test)]
mod expr_tests;

pub use build::GrammarBuilder;
pub use byteset::ByteSet;
pub use error::{GrammarError, GrammarErrorKind};
pub use expr::{Children, Expr, ExprId, ExprPool, PredEntry, Prediction};
pub use grammar::{
    AcceptTable, Acceptance, EOF_SLOT, Grammar, MASK_BINARY, OptionMask, Production, Typestate,
    atom_class,
};
pub use interner::{Interner, Symbol};
