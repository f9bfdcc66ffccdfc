//! Rules engine for the 2048 sliding-tile puzzle.
//!
//! Everything lives under [`engine`]; a presentation layer drives a
//! [`engine::Game`] and reads copies of its state back.

pub mod engine;
