#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Lowered instruction format for Woodrat.
//!
//! This crate contains:
//! - The instruction set ([`Inst`]) the matcher executes
//! - The [`Program`] container: code, rule metadata, and the pooled
//!   classes, literals, names, flags, and dispatch tables instructions
//!   refer to
//! - [`ProgramBuilder`], the emit-and-patch assembly interface
//! - A textual [`dump`] of all of the above

mod dump;
mod inst;
mod program;

#[cfg(test)]
mod dump_tests;

pub use dump::dump;
pub use inst::{Addr, ClassId, FlagId, Inst, LitId, NameId, RuleId, TableId};
pub use program::{Program, ProgramBuilder, RuleMeta};
