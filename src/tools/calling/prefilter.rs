//! Despiking prefilter for the scan grid.

use rayon::prelude::*;

use crate::data_structs::typedef::ValueType;
use crate::utils::median_in_place;

/// Builds the working grid the scanner picks candidates from: each cell is
/// the median of the values at `[i − 2, i + 3)`, clipped to the sequence.
/// Single-probe spikes vanish while genuine multi-probe shifts survive, so
/// the scanner does not waste passes on outliers.
pub fn prefilter(values: &[ValueType]) -> Vec<f64> {
    values
        .par_iter()
        .enumerate()
        .map_init(
            || Vec::with_capacity(5),
            |buffer, (index, _)| {
                let start = index.saturating_sub(2);
                let end = (index + 3).min(values.len());
                buffer.clear();
                buffer.extend(values[start..end].iter().map(|&value| value as f64));
                median_in_place(buffer)
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(prefilter(&[]).is_empty());
    }

    #[test]
    fn test_spike_is_removed() {
        let grid = prefilter(&[0.0, 0.0, 9.0, 0.0, 0.0]);
        assert_eq!(grid[2], 0.0);
    }

    #[test]
    fn test_shift_survives() {
        let values = [0.0, 0.0, 0.0, 0.6, 0.6, 0.6, 0.6, 0.0, 0.0];
        let grid = prefilter(&values);
        assert_eq!(grid[4], 0.6);
        assert_eq!(grid[5], 0.6);
    }

    #[test]
    fn test_window_clipping_at_edges() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let grid = prefilter(&values);
        // First cell sees [1, 2, 3], second the whole even-sized window.
        assert_eq!(grid[0], 2.0);
        assert_eq!(grid[1], 2.5);
        assert_eq!(grid[3], 3.0);
    }

    #[test]
    fn test_nan_passes_through_median() {
        let values = [f32::NAN, f32::NAN, f32::NAN, f32::NAN, f32::NAN];
        let grid = prefilter(&values);
        assert!(grid.iter().all(|cell| cell.is_nan()));
    }
}
