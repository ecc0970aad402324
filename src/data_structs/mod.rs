//! Core containers for DNA-microarray tracks.
//!
//! This module holds the probe name codec and the [`Sequence`] container
//! together with the iterators that walk several tracks in step:
//!
//! - [`Chromosome`] and [`ProbeName`]: the compact chromosome encoding and
//!   the `id/chromosome/position` naming scheme probes travel under.
//! - [`Sequence`]: ordered `(name, value)` probe measurements.
//! - [`PairedIter`] / [`MultiIter`] / [`align`]: name-matching traversal of
//!   two or more tracks whose probe sets do not line up exactly.
//! - [`typedef`]: scalar type aliases shared across the crate.

mod point;
mod sequence;
pub mod typedef;

#[cfg(test)]
mod tests;

pub use point::{
    compose_name,
    decode_position,
    split_name,
    Chromosome,
    ProbeName,
};
pub use sequence::{
    align,
    MultiIter,
    PairedIter,
    Sequence,
    SequenceIter,
};
