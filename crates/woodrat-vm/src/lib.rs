#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! The Woodrat matching engine.
//!
//! This crate executes the instruction format produced by
//! `woodrat-compiler`:
//! - [`Machine`] interprets a [`Program`](woodrat_program::Program)
//!   over a byte slice, backtracking through failure continuations and
//!   memoizing context-free rule results
//! - [`Tree`] is the syntax tree a successful match commits, built by
//!   replaying the speculative AST log
//! - [`Tracer`] observes rule activity without affecting the outcome

mod error;
mod log;
mod machine;
mod memo;
mod symbols;
mod trace;
mod tree;


pub use error::RuntimeError;
pub use machine::{Limits, Machine, MatchResult};
pub use trace::{CountingTracer, NoopTracer, PrintTracer, Tracer};
pub use tree::{NodeId, NodeRef, Tree};
