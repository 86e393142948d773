//! Static analyses over the grammar.
//!
//! Each pass reads the grammar, computes its facts locally, and writes
//! them onto the productions in one apply step, so a pass never observes
//! its own partial results.

pub(crate) mod accept;
pub(crate) mod consume;
pub(crate) mod context;
pub(crate) mod graph;
pub(crate) mod typestate;

#[cfg(test)]
mod accept_tests;
#[cfg(test)]
mod consume_tests;
#[cfg(test)]
mod context_tests;
#[cfg(test)]
mod graph_tests;
#[cfg(test)]
mod typestate_tests;
