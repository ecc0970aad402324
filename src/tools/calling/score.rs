//! Boundary scoring for candidate segments.
//!
//! A boundary is judged by the jump of the weighted signal trend across it.
//! Each side of the boundary is summarised by a weighted mean whose
//! quadratic taper concentrates weight at the edge facing the boundary, so
//! probes close to the boundary dominate and far probes barely matter. The
//! jump is then compared against the noise deviation expected at the
//! segment width to decide how surprising it is.

use super::config::CallingConfig;
use super::noise::NoiseProfile;
use super::report::Polarity;
use crate::data_structs::typedef::ValueType;

/// Prior probability of the baseline copy number at any one probe.
const NORMAL_PRIOR: f64 = 0.99;

/// Which edge of a window the taper concentrates weight at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Taper {
    /// Weight grows towards the end of the window.
    Back,
    /// Weight falls from the start of the window.
    Front,
}

/// Weighted mean of a window under a quadratic taper. The weight at offset
/// `i` of a window of width `w` is `((2i + 1) / 2w)²` for a back taper and
/// its mirror image `((2(w − i) − 1) / 2w)²` for a front taper. An empty
/// window has trend 0.
fn weighted_trend(
    window: &[ValueType],
    taper: Taper,
) -> f64 {
    if window.is_empty() {
        return 0.0;
    }

    let width = window.len() as f64;
    let mut weighted_sum = 0.0;
    let mut divisor = 0.0;
    for (offset, &value) in window.iter().enumerate() {
        let numerator = match taper {
            Taper::Back => 2.0 * offset as f64 + 1.0,
            Taper::Front => 2.0 * (width - offset as f64) - 1.0,
        };
        let weight = (numerator / (2.0 * width)).powi(2);
        weighted_sum += weight * value as f64;
        divisor += weight;
    }
    weighted_sum / divisor
}

/// Trend jump when entering the region `front` from the region `back`.
pub fn left_jump(
    back: &[ValueType],
    front: &[ValueType],
) -> f64 {
    weighted_trend(front, Taper::Front) - weighted_trend(back, Taper::Back)
}

/// Trend jump when leaving the region `back` into the region `front`.
pub fn right_jump(
    back: &[ValueType],
    front: &[ValueType],
) -> f64 {
    weighted_trend(back, Taper::Back) - weighted_trend(front, Taper::Front)
}

fn gaussian_bell(
    x: f64,
    deviation: f64,
) -> f64 {
    (-0.5 * x * x / (deviation * deviation)).exp()
}

fn posterior_normal(
    jump: f64,
    deviation: f64,
    shift: f64,
) -> f64 {
    let normal = gaussian_bell(jump, deviation) * NORMAL_PRIOR;
    let shifted = gaussian_bell(jump - shift, deviation) * (1.0 - NORMAL_PRIOR);
    normal / (normal + shifted)
}

/// Probability that the left boundary of a candidate segment is ordinary
/// noise rather than the entry into a copy number change.
///
/// # Arguments
///
/// * `profile` - noise deviations per segment width.
/// * `back` - values directly before the boundary.
/// * `inner` - values of the candidate segment; its width selects the
///   deviation.
/// * `polarity` - the copy number change under test.
///
/// # Returns
///
/// A probability in [0, 1]; low values mean a convincing boundary. NaN when
/// the inner width has no noise estimate.
pub fn enter_score(
    profile: &NoiseProfile,
    back: &[ValueType],
    inner: &[ValueType],
    polarity: Polarity,
    config: &CallingConfig,
) -> f64 {
    let jump = left_jump(back, inner);
    let deviation = profile.deviation(inner.len());
    posterior_normal(jump, deviation, config.expected_shift(polarity))
}

/// Probability that the right boundary of a candidate segment is ordinary
/// noise rather than the exit from a copy number change. The counterpart of
/// [`enter_score`]; `inner` precedes the boundary and `front` follows it.
pub fn leave_score(
    profile: &NoiseProfile,
    inner: &[ValueType],
    front: &[ValueType],
    polarity: Polarity,
    config: &CallingConfig,
) -> f64 {
    let jump = right_jump(inner, front);
    let deviation = profile.deviation(inner.len());
    posterior_normal(jump, deviation, config.expected_shift(polarity))
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_weighted_trend_empty() {
        assert_eq!(weighted_trend(&[], Taper::Back), 0.0);
        assert_eq!(weighted_trend(&[], Taper::Front), 0.0);
    }

    #[test]
    fn test_weighted_trend_single() {
        assert_approx_eq!(weighted_trend(&[2.5], Taper::Back), 2.5);
        assert_approx_eq!(weighted_trend(&[2.5], Taper::Front), 2.5);
    }

    #[test]
    fn test_weighted_trend_tapers() {
        // Width 2 weights are (1/4)² and (3/4)², so the heavy end carries
        // nine tenths of the total.
        assert_approx_eq!(weighted_trend(&[0.0, 1.0], Taper::Back), 0.9);
        assert_approx_eq!(weighted_trend(&[0.0, 1.0], Taper::Front), 0.1);
    }

    #[test]
    fn test_trend_mirror_symmetry() {
        let window = [0.1, -0.4, 0.25, 0.7, -0.3];
        let reversed: Vec<f32> = window.iter().rev().copied().collect();
        assert_approx_eq!(
            weighted_trend(&window, Taper::Back),
            weighted_trend(&reversed, Taper::Front)
        );
    }

    #[test]
    fn test_jumps_on_step() {
        let back = [0.0, 0.0, 0.0, 0.0];
        let front = [1.0, 1.0, 1.0, 1.0];
        assert_approx_eq!(left_jump(&back, &front), 1.0);
        assert_approx_eq!(right_jump(&back, &front), -1.0);
        assert_approx_eq!(left_jump(&[], &[]), 0.0);
    }

    #[test]
    fn test_scores_react_to_matching_step() {
        let profile = NoiseProfile::constant(0.1, 16);
        let config = CallingConfig::default();
        let back = [0.0; 8];
        let inner = [0.58; 8];

        let entering = enter_score(
            &profile,
            &back,
            &inner,
            Polarity::Duplication,
            &config,
        );
        assert!(entering < 0.01);

        // The same step is no evidence at all for the opposite polarity.
        let opposite = enter_score(
            &profile,
            &back,
            &inner,
            Polarity::Deletion,
            &config,
        );
        assert!(opposite > 0.99);

        let leaving = leave_score(
            &profile,
            &inner,
            &back,
            Polarity::Duplication,
            &config,
        );
        assert!(leaving < 0.01);
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.29)]
    #[case(-0.58)]
    #[case(1.2)]
    fn test_scores_are_probabilities(#[case] level: f32) {
        let profile = NoiseProfile::constant(0.2, 16);
        let config = CallingConfig::default();
        let inner = [level; 6];
        for polarity in [Polarity::Deletion, Polarity::Duplication] {
            let score = enter_score(&profile, &[0.0; 6], &inner, polarity, &config);
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn test_score_nan_outside_profile() {
        let profile = NoiseProfile::constant(0.1, 4);
        let config = CallingConfig::default();
        let inner = [0.0; 32];
        let score = enter_score(
            &profile,
            &[0.0; 4],
            &inner,
            Polarity::Deletion,
            &config,
        );
        assert!(score.is_nan());
    }
}
