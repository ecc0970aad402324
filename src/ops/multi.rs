//! Operations across any number of sequences at once.
//!
//! The member tracks are matched row by row with [`MultiIter`], so they may
//! disagree about which probes they carry; each emitted row combines the
//! values of one matched probe set and takes its name from the first
//! member.

use crate::data_structs::typedef::ValueType;
use crate::data_structs::{
    MultiIter,
    Sequence,
};
use crate::utils::median_in_place;

pub fn add(sequences: &[&Sequence]) -> Sequence {
    let mut out = Sequence::new();
    let mut iter = MultiIter::new(sequences);
    while iter.is_valid() {
        let mut value = 0.0;
        for index in 0..sequences.len() {
            value += iter.value(index);
        }
        out.push(iter.name().cloned(), value);
        iter.advance();
    }
    out
}

/// Arithmetic mean of the member values at every row.
pub fn arithmetic(sequences: &[&Sequence]) -> Sequence {
    let divisor = if sequences.is_empty() {
        1.0
    }
    else {
        sequences.len() as ValueType
    };
    let mut out = Sequence::new();
    let mut iter = MultiIter::new(sequences);
    while iter.is_valid() {
        let mut value = 0.0;
        for index in 0..sequences.len() {
            value += iter.value(index);
        }
        out.push(iter.name().cloned(), value / divisor);
        iter.advance();
    }
    out
}

pub fn mul(sequences: &[&Sequence]) -> Sequence {
    let mut out = Sequence::new();
    let mut iter = MultiIter::new(sequences);
    while iter.is_valid() {
        let mut value = 1.0;
        for index in 0..sequences.len() {
            value *= iter.value(index);
        }
        out.push(iter.name().cloned(), value);
        iter.advance();
    }
    out
}

/// Geometric mean of the member values at every row, with the same sign
/// convention as [`pow`](super::pow): the magnitude of the product is
/// rooted and a negative product contributes `cos(pi / n)`.
pub fn geometric(sequences: &[&Sequence]) -> Sequence {
    let divisor = if sequences.is_empty() {
        1.0
    }
    else {
        sequences.len() as ValueType
    };
    let negative_factor = (std::f32::consts::PI / divisor).cos();
    let mut out = Sequence::new();
    let mut iter = MultiIter::new(sequences);
    while iter.is_valid() {
        let mut value = 1.0;
        for index in 0..sequences.len() {
            value *= iter.value(index);
        }
        let magnitude =
            (value.abs() as f64).powf(1.0 / divisor as f64) as ValueType;
        let signed = if value >= 0.0 {
            magnitude
        }
        else {
            magnitude * negative_factor
        };
        out.push(iter.name().cloned(), signed);
        iter.advance();
    }
    out
}

pub fn min(sequences: &[&Sequence]) -> Sequence {
    let mut out = Sequence::new();
    let mut iter = MultiIter::new(sequences);
    while iter.is_valid() {
        let mut value = iter.value(0);
        for index in 1..sequences.len() {
            if iter.value(index) < value {
                value = iter.value(index);
            }
        }
        out.push(iter.name().cloned(), value);
        iter.advance();
    }
    out
}

pub fn max(sequences: &[&Sequence]) -> Sequence {
    let mut out = Sequence::new();
    let mut iter = MultiIter::new(sequences);
    while iter.is_valid() {
        let mut value = iter.value(0);
        for index in 1..sequences.len() {
            if iter.value(index) > value {
                value = iter.value(index);
            }
        }
        out.push(iter.name().cloned(), value);
        iter.advance();
    }
    out
}

/// Median of the member values at every row.
pub fn median(sequences: &[&Sequence]) -> Sequence {
    let mut out = Sequence::new();
    let mut buffer = vec![0.0; sequences.len()];
    let mut iter = MultiIter::new(sequences);
    while iter.is_valid() {
        for (index, slot) in buffer.iter_mut().enumerate() {
            *slot = iter.value(index);
        }
        out.push(iter.name().cloned(), median_in_place(&mut buffer));
        iter.advance();
    }
    out
}

/// Euclidean norm of the member values at every row.
pub fn deviation(sequences: &[&Sequence]) -> Sequence {
    let mut out = Sequence::new();
    let mut iter = MultiIter::new(sequences);
    while iter.is_valid() {
        let mut value = 0.0;
        for index in 0..sequences.len() {
            value += iter.value(index) * iter.value(index);
        }
        out.push(iter.name().cloned(), value.sqrt());
        iter.advance();
    }
    out
}
