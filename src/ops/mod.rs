//! Elementary operations on measurement tracks.
//!
//! Every operation is pure: it reads one or more [`Sequence`]s and builds a
//! new one, carrying the probe names over. Operations come in three
//! arities, mirrored by the module layout:
//!
//! - this module: one sequence, with or without a scalar parameter;
//! - [`dual`]: two sequences, matched probe by probe;
//! - [`multi`]: any number of sequences, matched as one aligned row set.
//!
//! NaN values mark probes that carry no measurement. Arithmetic lets them
//! propagate; the filtering operations ([`cut`], [`avg`], [`rank`]) state
//! explicitly how they treat them.

mod blur;
pub mod multi;

use hashbrown::HashMap;
use itertools::Itertools;
use log::*;
use statrs::function::erf;

pub use self::blur::blur;
use crate::data_structs::split_name;
use crate::data_structs::typedef::ValueType;
use crate::data_structs::{
    PairedIter,
    Sequence,
};
use crate::utils::nan_mean;

pub fn add(
    sequence: &Sequence,
    p: ValueType,
) -> Sequence {
    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        out.push(name.cloned(), value + p);
    }
    out
}

pub fn sub(
    sequence: &Sequence,
    p: ValueType,
) -> Sequence {
    add(sequence, -p)
}

pub fn mul(
    sequence: &Sequence,
    p: ValueType,
) -> Sequence {
    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        out.push(name.cloned(), value * p);
    }
    out
}

pub fn div(
    sequence: &Sequence,
    p: ValueType,
) -> Sequence {
    mul(sequence, 1.0 / p)
}

/// Raises every value to the power `p`.
///
/// Negative bases keep a meaningful sign: the magnitude is exponentiated
/// and the result is multiplied by `cos(pi * p)`, so integer exponents
/// behave like repeated multiplication and fractional exponents interpolate
/// instead of producing NaN.
pub fn pow(
    sequence: &Sequence,
    p: ValueType,
) -> Sequence {
    let negative_factor = (std::f32::consts::PI * p).cos();
    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        let magnitude = (value.abs() as f64).powf(p as f64) as ValueType;
        let signed = if value >= 0.0 {
            magnitude
        }
        else {
            magnitude * negative_factor
        };
        out.push(name.cloned(), signed);
    }
    out
}

pub fn root(
    sequence: &Sequence,
    p: ValueType,
) -> Sequence {
    pow(sequence, 1.0 / p)
}

/// Clamps every value into `[-p, p]`. NaN values pass through untouched;
/// infinite values clamp like any other.
pub fn trunc(
    sequence: &Sequence,
    p: ValueType,
) -> Sequence {
    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        if value.is_nan() {
            out.push(name.cloned(), value);
        }
        else {
            out.push(name.cloned(), value.max(-p).min(p));
        }
    }
    out
}

/// Drops every probe whose value is NaN or lies outside `[-p, p]`.
pub fn cut(
    sequence: &Sequence,
    p: ValueType,
) -> Sequence {
    let mut out = Sequence::new();
    for (name, value) in sequence.iter() {
        if !value.is_nan() && value >= -p && value <= p {
            out.push(name.cloned(), value);
        }
    }
    debug!("cut kept {} of {} probes", out.len(), sequence.len());
    out
}

pub fn exp(sequence: &Sequence) -> Sequence {
    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        out.push(name.cloned(), (value as f64).exp() as ValueType);
    }
    out
}

pub fn log(sequence: &Sequence) -> Sequence {
    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        out.push(name.cloned(), (value as f64).ln() as ValueType);
    }
    out
}

pub fn abs(sequence: &Sequence) -> Sequence {
    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        out.push(name.cloned(), value.abs());
    }
    out
}

pub fn erf(sequence: &Sequence) -> Sequence {
    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        out.push(name.cloned(), erf::erf(value as f64) as ValueType);
    }
    out
}

/// Replaces every probe with the mean of the whole track, skipping NaN
/// values in the sum and leaving NaN probes as they are.
pub fn avg(sequence: &Sequence) -> Sequence {
    let mean = nan_mean(sequence.values().iter().map(|&value| value as f64))
        as ValueType;
    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        if value.is_nan() {
            out.push(name.cloned(), value);
        }
        else {
            out.push(name.cloned(), mean);
        }
    }
    out
}

/// Replaces every value with its midrank, mapped linearly into `(-1, 1)`.
///
/// Equal values share one rank placed in the middle of their run. NaN
/// values take no rank and stay NaN.
pub fn rank(sequence: &Sequence) -> Sequence {
    let size = sequence.len() as ValueType;
    let mut sorted: Vec<ValueType> = sequence
        .values()
        .iter()
        .copied()
        .filter(|value| !value.is_nan())
        .map(canonical_zero)
        .collect();
    sorted.sort_unstable_by(ValueType::total_cmp);

    let mut ranks = HashMap::new();
    let mut current = -1.0;
    for (count, value) in sorted.iter().dedup_by_with_count(|a, b| a == b) {
        let step = count as ValueType / size;
        current += step;
        ranks.insert(value.to_bits(), current);
        current += step;
    }

    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        let ranked = if value.is_nan() {
            value
        }
        else {
            ranks
                .get(&canonical_zero(value).to_bits())
                .copied()
                .unwrap_or(0.0)
        };
        out.push(name.cloned(), ranked);
    }
    out
}

// Folds -0.0 into 0.0 so the two share a rank key.
fn canonical_zero(value: ValueType) -> ValueType {
    if value == 0.0 {
        0.0
    }
    else {
        value
    }
}

/// Stable reordering by `(name, value)`. Unnamed probes sort first.
pub fn sort_names(sequence: &Sequence) -> Sequence {
    let mut rows: Vec<_> = sequence.iter().collect();
    rows.sort_by(|a, b| {
        let name_a = a.0.map(|n| n.as_str()).unwrap_or("");
        let name_b = b.0.map(|n| n.as_str()).unwrap_or("");
        name_a.cmp(name_b).then_with(|| a.1.total_cmp(&b.1))
    });

    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in rows {
        out.push(name.cloned(), value);
    }
    out
}

/// Stable reordering by `(value, name)`.
pub fn sort_values(sequence: &Sequence) -> Sequence {
    let mut rows: Vec<_> = sequence.iter().collect();
    rows.sort_by(|a, b| {
        let name_a = a.0.map(|n| n.as_str()).unwrap_or("");
        let name_b = b.0.map(|n| n.as_str()).unwrap_or("");
        a.1.total_cmp(&b.1).then_with(|| name_a.cmp(name_b))
    });

    let mut out = Sequence::with_capacity(sequence.len());
    for (name, value) in rows {
        out.push(name.cloned(), value);
    }
    out
}

/// Keeps only probes whose raw chromosome field is one or two digits,
/// dropping the sex chromosomes, the mitochondrial probes and everything
/// unnamed or unparseable.
pub fn strip_xy(sequence: &Sequence) -> Sequence {
    let mut out = Sequence::new();
    for (name, value) in sequence.iter() {
        let keep = match name {
            Some(name) => {
                let (_, chr, _) = split_name(name.as_str());
                !chr.is_empty()
                    && chr.len() <= 2
                    && chr.bytes().all(|b| b.is_ascii_digit())
            },
            None => false,
        };
        if keep {
            out.push(name.cloned(), value);
        }
    }
    debug!(
        "strip_xy kept {} of {} probes",
        out.len(),
        sequence.len()
    );
    out
}

/// Operations on two sequences at once. The probes are matched by name via
/// [`PairedIter`], so tracks with slightly different probe sets line up on
/// their shared identifiers.
pub mod dual {
    use super::*;

    pub fn add(
        first: &Sequence,
        second: &Sequence,
    ) -> Sequence {
        let mut out = Sequence::new();
        for (name, a, b) in PairedIter::new(first, second) {
            out.push(name.cloned(), a + b);
        }
        out
    }

    pub fn sub(
        first: &Sequence,
        second: &Sequence,
    ) -> Sequence {
        let mut out = Sequence::new();
        for (name, a, b) in PairedIter::new(first, second) {
            out.push(name.cloned(), a - b);
        }
        out
    }

    pub fn mul(
        first: &Sequence,
        second: &Sequence,
    ) -> Sequence {
        let mut out = Sequence::new();
        for (name, a, b) in PairedIter::new(first, second) {
            out.push(name.cloned(), a * b);
        }
        out
    }

    pub fn div(
        first: &Sequence,
        second: &Sequence,
    ) -> Sequence {
        let mut out = Sequence::new();
        for (name, a, b) in PairedIter::new(first, second) {
            out.push(name.cloned(), a / b);
        }
        out
    }

    /// Reorders `first` into the probe order of `second`. Probes of
    /// `second` that `first` does not carry come out as 0.
    pub fn sort(
        first: &Sequence,
        second: &Sequence,
    ) -> Sequence {
        let mut lookup: HashMap<&str, ValueType> = HashMap::new();
        for (name, value) in first.iter() {
            lookup.insert(name.map(|n| n.as_str()).unwrap_or(""), value);
        }

        let mut out = Sequence::with_capacity(second.len());
        for (name, _) in second.iter() {
            let key = name.map(|n| n.as_str()).unwrap_or("");
            out.push(name.cloned(), lookup.get(key).copied().unwrap_or(0.0));
        }
        out
    }
}
