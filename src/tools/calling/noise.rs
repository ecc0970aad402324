//! Randomized estimation of the noise floor.

use log::*;
use rand::Rng;

use super::score::{left_jump, right_jump};
use crate::data_structs::typedef::ValueType;

/// Random triplets drawn per segment width.
const DRAWS_PER_WIDTH: usize = 512;

/// Expected magnitude of trend jumps caused by noise alone, per segment
/// width.
///
/// The profile answers the question "how big a jump does plain noise
/// produce across a boundary of a segment this wide". Wider segments
/// average more probes, so their trend jumps shrink; the profile is forced
/// monotone non-increasing to keep sampling error from ever suggesting
/// otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoiseProfile {
    deviations: Vec<f64>,
}

impl NoiseProfile {
    /// Estimates the noise floor of `values` for every width in
    /// `1..=max_width`.
    ///
    /// For each width, a fixed number of random triplet positions is drawn
    /// uniformly over the sequence; draws whose triplet would overrun the
    /// end are discarded. Both directional jumps of each surviving triplet
    /// contribute their square to the estimate, and the stored entry is the
    /// minimum of the raw estimate and its predecessor. A width with no
    /// surviving draws yields NaN, which never replaces a finite
    /// predecessor.
    ///
    /// # Arguments
    ///
    /// * `values` - the signal to sample; an empty slice yields an empty
    ///   profile.
    /// * `max_width` - profile length, normally the `max_width` of the
    ///   calling configuration.
    /// * `rng` - the random source, injectable for reproducible runs.
    pub fn analyze<R: Rng + ?Sized>(
        values: &[ValueType],
        max_width: usize,
        rng: &mut R,
    ) -> Self {
        if values.is_empty() || max_width == 0 {
            return Self::default();
        }

        let mut deviations = Vec::with_capacity(max_width);
        for width in 1..=max_width {
            let mut samples = 0usize;
            let mut sum_of_squares = 0.0f64;

            for _ in 0..DRAWS_PER_WIDTH {
                let left = rng.gen_range(0..values.len());
                let center = left + width;
                let right = center + width;
                if right > values.len() {
                    continue;
                }

                let back = &values[left..center];
                let front = &values[center..right];
                let entering = left_jump(back, front);
                let leaving = right_jump(back, front);
                sum_of_squares += entering * entering + leaving * leaving;
                samples += 2;
            }

            let raw = (sum_of_squares / samples as f64).sqrt();
            let entry = match deviations.last() {
                Some(&previous) if !(raw < previous) => previous,
                _ => raw,
            };
            deviations.push(entry);
        }

        trace!(
            "noise profile over {} widths, deviation {:.4} at width 1",
            deviations.len(),
            deviations[0]
        );
        Self { deviations }
    }

    /// A flat profile with the same deviation at every width.
    pub fn constant(
        deviation: f64,
        len: usize,
    ) -> Self {
        Self {
            deviations: vec![deviation; len],
        }
    }

    /// The noise deviation for a segment of `width` probes. NaN when the
    /// width is outside the profile.
    pub fn deviation(
        &self,
        width: usize,
    ) -> f64 {
        match width.checked_sub(1).and_then(|index| self.deviations.get(index)) {
            Some(&deviation) => deviation,
            None => f64::NAN,
        }
    }

    pub fn deviations(&self) -> &[f64] {
        &self.deviations
    }

    pub fn len(&self) -> usize {
        self.deviations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deviations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, Normal};

    use super::*;

    fn noisy_signal(len: usize) -> Vec<f32> {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let normal = Normal::new(0.0f32, 0.2).unwrap();
        (0..len).map(|_| normal.sample(&mut rng)).collect()
    }

    #[test]
    fn test_empty_input() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let profile = NoiseProfile::analyze(&[], 64, &mut rng);
        assert!(profile.is_empty());
    }

    #[test]
    fn test_profile_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let profile = NoiseProfile::analyze(&noisy_signal(500), 64, &mut rng);
        assert_eq!(profile.len(), 64);
    }

    #[test]
    fn test_profile_is_monotone_non_increasing() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let profile = NoiseProfile::analyze(&noisy_signal(2000), 128, &mut rng);
        for pair in profile.deviations().windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_constant_signal_has_zero_noise() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let profile = NoiseProfile::analyze(&[0.25; 400], 16, &mut rng);
        for &deviation in profile.deviations() {
            assert_eq!(deviation, 0.0);
        }
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let signal = noisy_signal(800);
        let mut rng1 = ChaCha8Rng::seed_from_u64(9);
        let mut rng2 = ChaCha8Rng::seed_from_u64(9);
        let first = NoiseProfile::analyze(&signal, 32, &mut rng1);
        let second = NoiseProfile::analyze(&signal, 32, &mut rng2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_too_short_input_yields_nan() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let profile = NoiseProfile::analyze(&[0.5], 4, &mut rng);
        assert_eq!(profile.len(), 4);
        for &deviation in profile.deviations() {
            assert!(deviation.is_nan());
        }
    }

    #[test]
    fn test_deviation_indexing() {
        let profile = NoiseProfile::constant(0.3, 8);
        assert_eq!(profile.deviation(1), 0.3);
        assert_eq!(profile.deviation(8), 0.3);
        assert!(profile.deviation(0).is_nan());
        assert!(profile.deviation(9).is_nan());
    }
}
