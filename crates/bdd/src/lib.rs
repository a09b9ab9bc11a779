//! A thin, reference-counted handle layer over [`oxidd`]'s binary decision
//! diagrams: the algebraic operations the synthesis engine needs, variable
//! cubes and vectors, and the [`FixedPoint`] convergence helper.
//!
//! This crate does not know anything about GR(1); it is a general-purpose
//! boolean function layer. The GR(1)-specific game context and fixpoint
//! algorithm live in `gr1_game`.

#![forbid(unsafe_code)]

mod fixpoint;
mod manager;
mod reorder;
mod vars;

pub use fixpoint::*;
pub use manager::*;
pub use reorder::*;
pub use vars::*;
