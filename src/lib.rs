//! A solver for NaviCust-style grid customization puzzles.
//!
//! The caller describes a fixed grid, the parts that exist, and a list of
//! requirements saying which parts must appear and under what constraints.
//! [`solve`] then lazily enumerates every valid arrangement, one solution per
//! pull on the iterator, and [`place_all`] turns a solution back into a
//! per-square ownership map for display or verification.
//!
//! The crate does no I/O and installs no logger; embedders own the transport
//! and can pick the solutions up wherever they run the iterator.

pub mod solver;

pub use solver::{
    partsets, place_all, solve, Constraint, GridSettings, Location, Mask, MaskShapeError, Part,
    PlaceError, Placement, Position, Requirement, Solution, Tristate,
};
