use log::*;
use rayon::prelude::*;

use crate::data_structs::typedef::ValueType;
use crate::data_structs::Sequence;

/// Gaussian low-pass with a period of `p` probes.
///
/// The track is smoothed with a Gaussian kernel of standard deviation
/// `p / 2pi` samples, wrapping around circularly, which suppresses
/// oscillations shorter than roughly `p` probes while leaving the track
/// mean untouched. Probes with NaN or infinite values take no part in the
/// smoothing: the finite values are compacted, filtered as if they were
/// adjacent, and written back, while the non-finite probes pass through
/// unchanged.
pub fn blur(
    sequence: &Sequence,
    p: ValueType,
) -> Sequence {
    let finite: Vec<f64> = sequence
        .values()
        .iter()
        .filter(|value| value.is_finite())
        .map(|&value| value as f64)
        .collect();

    let smoothed = convolve_circular(&finite, p.abs() as f64);

    let mut out = Sequence::with_capacity(sequence.len());
    let mut cursor = 0;
    for (name, value) in sequence.iter() {
        if value.is_finite() {
            out.push(name.cloned(), smoothed[cursor] as ValueType);
            cursor += 1;
        }
        else {
            out.push(name.cloned(), value);
        }
    }
    out
}

fn convolve_circular(
    values: &[f64],
    period: f64,
) -> Vec<f64> {
    let len = values.len();
    if len == 0 {
        return Vec::new();
    }

    let sigma = period / (2.0 * std::f64::consts::PI);
    let radius = (4.0 * sigma).ceil() as usize;
    if radius == 0 {
        return values.to_vec();
    }

    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|offset| {
            let distance = offset as f64 - radius as f64;
            (-distance * distance / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = kernel.iter().sum();
    for weight in kernel.iter_mut() {
        *weight /= total;
    }
    debug!("blur kernel: sigma {:.2} samples, radius {}", sigma, radius);

    // A kernel wider than the track would visit the same probe repeatedly
    // as it wraps, so fold it into one weight per residue first.
    let (taps, shift) = if 2 * radius + 1 >= len {
        let mut folded = vec![0.0; len];
        for (offset, weight) in kernel.iter().enumerate() {
            let slot = (offset as isize - radius as isize)
                .rem_euclid(len as isize) as usize;
            folded[slot] += weight;
        }
        (folded, 0isize)
    }
    else {
        (kernel, -(radius as isize))
    };

    (0..len)
        .into_par_iter()
        .map(|index| {
            taps.iter()
                .enumerate()
                .map(|(offset, weight)| {
                    let tap = (index as isize + shift + offset as isize)
                        .rem_euclid(len as isize)
                        as usize;
                    weight * values[tap]
                })
                .sum()
        })
        .collect()
}
