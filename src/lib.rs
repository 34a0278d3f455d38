//! Solver for the SHENZHEN I/O solitaire: best-first search over boards that
//! are normalized by safe auto-play after every move.

pub mod action;
#[cfg(feature = "autoplay")]
pub mod autoplay;
pub mod board;
pub mod card;
pub mod solver;
