//! Removal of systematic noise shared by a cohort of samples.
//!
//! Genotyping arrays imprint the same artifacts on every sample they
//! process: slow genomic waves picked up by GC content and per-probe
//! offsets of individual oligos. Both repeat across samples while true
//! copy number changes do not, so the cohort median isolates them. The
//! pipeline splits each track into a slow wave component and a per-probe
//! residual, builds the median profile of each component across the
//! cohort, and subtracts the profiles from each track scaled by its own
//! covariance with them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data_structs::{Chromosome, ProbeName, Sequence};
use crate::io::{native, penncnv};
use crate::ops;
use crate::utils::nan_mean;

/// Parameters of the shared-noise filter.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Keep X and Y probes instead of stripping them before profiling.
    pub use_sex_chromosomes:       bool,
    /// Stop after writing the profiles, do not correct any file.
    pub only_profiles:             bool,
    /// Period handed to the low-pass blur separating wave from residual.
    pub blur_period:               f64,
    /// Appended to each input path to form the corrected output path.
    pub output_suffix:             String,
    /// Precomputed wave profile to load instead of computing one.
    pub wave_profile:              Option<PathBuf>,
    /// Precomputed per-probe profile to load instead of computing one.
    pub per_probe_profile:         Option<PathBuf>,
    /// Where a computed wave profile is saved.
    pub wave_profile_output:       PathBuf,
    /// Where a computed per-probe profile is saved.
    pub per_probe_profile_output:  PathBuf,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            use_sex_chromosomes:      false,
            only_profiles:            false,
            blur_period:              1000.0,
            output_suffix:            ".nf".to_string(),
            wave_profile:             None,
            per_probe_profile:        None,
            wave_profile_output:      PathBuf::from("wave_profile"),
            per_probe_profile_output: PathBuf::from("per-snp_profile"),
        }
    }
}

/// The two systematic components shared across a cohort.
#[derive(Debug, Clone, Default)]
pub struct NoiseProfiles {
    /// Cohort median of the slow wave component.
    pub wave:      Sequence,
    /// Cohort median of the per-probe residual component.
    pub per_probe: Sequence,
}

/// Per-file diagnostics of one profile application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackStats {
    pub path:                       String,
    pub variance:                   f64,
    pub wave_variance:              f64,
    pub per_probe_variance:         f64,
    pub wave_profile_variance:      f64,
    pub per_probe_profile_variance: f64,
    pub wave_covariance:            f64,
    pub per_probe_covariance:       f64,
    pub wave_correlation:           f64,
    pub per_probe_correlation:      f64,
    pub wave_factor:                f64,
    pub per_probe_factor:           f64,
}

/// Centers a track for cross-sample comparison.
///
/// Autosome probes get the autosome mean subtracted and X probes the X
/// mean; probes of any other chromosome are dropped. Only finite values
/// contribute to the means. Returns the centered track and the X mean so
/// [`restore_x`] can undo the X shift after correction.
pub fn normalize(sequence: &Sequence) -> (Sequence, f64) {
    let mut autosome_sum = 0.0f64;
    let mut autosome_count = 0usize;
    let mut x_sum = 0.0f64;
    let mut x_count = 0usize;

    for (name, value) in sequence.iter() {
        if !value.is_finite() {
            continue;
        }
        let name = name.map(|name| name.as_str()).unwrap_or("");
        match ProbeName::decompose(name).chromosome {
            chromosome if chromosome.is_autosome() => {
                autosome_sum += value as f64;
                autosome_count += 1;
            }
            Chromosome::X => {
                x_sum += value as f64;
                x_count += 1;
            }
            _ => {}
        }
    }

    let autosome_mean = if autosome_count > 0 {
        autosome_sum / autosome_count as f64
    }
    else {
        0.0
    };
    let x_mean = if x_count > 0 { x_sum / x_count as f64 } else { 0.0 };

    let mut normalized = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        let raw = name.map(|name| name.as_str()).unwrap_or("");
        match ProbeName::decompose(raw).chromosome {
            chromosome if chromosome.is_autosome() => {
                normalized.push(name.cloned(), value - autosome_mean as f32);
            }
            Chromosome::X => {
                normalized.push(name.cloned(), value - x_mean as f32);
            }
            _ => {}
        }
    }

    debug!(
        "normalized {} probes, autosome mean {:.4}, X mean {:.4}",
        normalized.len(),
        autosome_mean,
        x_mean
    );
    (normalized, x_mean)
}

/// Re-adds the X mean that [`normalize`] removed from X probes.
pub fn restore_x(
    sequence: &Sequence,
    x_mean: f64,
) -> Sequence {
    let mut restored = Sequence::with_capacity(sequence.len());
    for (name, value) in sequence.iter() {
        let raw = name.map(|n| n.as_str()).unwrap_or("");
        let shifted = match ProbeName::decompose(raw).chromosome {
            Chromosome::X => value + x_mean as f32,
            _ => value,
        };
        restored.push(name.cloned(), shifted);
    }
    restored
}

/// Builds both noise profiles from prepared tracks.
pub fn compute_profiles(
    tracks: &[Sequence],
    blur_period: f64,
) -> NoiseProfiles {
    let waves: Vec<Sequence> = tracks
        .par_iter()
        .map(|track| ops::blur(track, blur_period as f32))
        .collect();
    let residuals: Vec<Sequence> = tracks
        .iter()
        .zip(waves.iter())
        .map(|(track, wave)| ops::dual::sub(track, wave))
        .collect();

    let wave_refs: Vec<&Sequence> = waves.iter().collect();
    let residual_refs: Vec<&Sequence> = residuals.iter().collect();
    NoiseProfiles {
        wave:      ops::multi::median(&wave_refs),
        per_probe: ops::multi::median(&residual_refs),
    }
}

fn aligned_mean_product(
    left: &Sequence,
    right: &Sequence,
) -> f64 {
    let product = ops::dual::mul(left, right);
    nan_mean(product.values().iter().map(|&value| value as f64))
}

fn mean_square(sequence: &Sequence) -> f64 {
    nan_mean(
        sequence
            .values()
            .iter()
            .map(|&value| value as f64 * value as f64),
    )
}

/// Subtracts the scaled profiles from one prepared track.
///
/// Each component loses `profile · cov/var`, the least-squares share of
/// the profile present in it. Returns the corrected track with the X
/// shift restored, plus the diagnostics of the fit.
pub fn apply_profiles(
    path: &Path,
    track: &Sequence,
    x_mean: f64,
    profiles: &NoiseProfiles,
    blur_period: f64,
) -> (Sequence, TrackStats) {
    let wave = ops::blur(track, blur_period as f32);
    let residual = ops::dual::sub(track, &wave);

    let wave_profile_variance = mean_square(&profiles.wave);
    let per_probe_profile_variance = mean_square(&profiles.per_probe);
    let wave_variance = mean_square(&wave);
    let per_probe_variance = mean_square(&residual);
    let wave_covariance = aligned_mean_product(&wave, &profiles.wave);
    let per_probe_covariance = aligned_mean_product(&residual, &profiles.per_probe);

    let wave_factor = wave_covariance / wave_profile_variance;
    let per_probe_factor = per_probe_covariance / per_probe_profile_variance;

    let stats = TrackStats {
        path: path.display().to_string(),
        variance: mean_square(track),
        wave_variance,
        per_probe_variance,
        wave_profile_variance,
        per_probe_profile_variance,
        wave_covariance,
        per_probe_covariance,
        wave_correlation: wave_covariance
            / (wave_variance * wave_profile_variance).sqrt(),
        per_probe_correlation: per_probe_covariance
            / (per_probe_variance * per_probe_profile_variance).sqrt(),
        wave_factor,
        per_probe_factor,
    };

    let scaled_wave = ops::mul(&profiles.wave, wave_factor as f32);
    let scaled_residual = ops::mul(&profiles.per_probe, per_probe_factor as f32);
    let corrected = ops::dual::add(
        &ops::dual::sub(&wave, &scaled_wave),
        &ops::dual::sub(&residual, &scaled_residual),
    );

    (restore_x(&corrected, x_mean), stats)
}

struct PreparedTrack {
    path:     PathBuf,
    prepared: Sequence,
    baf:      Sequence,
    x_mean:   f64,
}

fn prepare_track(
    path: &Path,
    config: &FilterConfig,
) -> Result<PreparedTrack> {
    let (mut lrr, baf) = penncnv::load(path)?;
    if !config.use_sex_chromosomes {
        lrr = ops::strip_xy(&lrr);
    }
    let (prepared, x_mean) = normalize(&lrr);
    Ok(PreparedTrack {
        path: path.to_path_buf(),
        prepared,
        baf,
        x_mean,
    })
}

fn resolve_profiles(
    tracks: &[PreparedTrack],
    config: &FilterConfig,
) -> Result<NoiseProfiles> {
    let prepared: Vec<Sequence> =
        tracks.iter().map(|track| track.prepared.clone()).collect();

    let wave = match &config.wave_profile {
        Some(path) => {
            info!("loading wave profile from {}", path.display());
            Some(native::load(path)?)
        }
        None => None,
    };
    let per_probe = match &config.per_probe_profile {
        Some(path) => {
            info!("loading per-probe profile from {}", path.display());
            Some(native::load(path)?)
        }
        None => None,
    };

    let computed = if wave.is_none() || per_probe.is_none() {
        info!("computing noise profiles over {} tracks", prepared.len());
        compute_profiles(&prepared, config.blur_period)
    }
    else {
        NoiseProfiles::default()
    };

    let profiles = NoiseProfiles {
        wave: match wave {
            Some(sequence) => sequence,
            None => {
                native::save(&computed.wave, &config.wave_profile_output)?;
                computed.wave
            }
        },
        per_probe: match per_probe {
            Some(sequence) => sequence,
            None => {
                native::save(&computed.per_probe, &config.per_probe_profile_output)?;
                computed.per_probe
            }
        },
    };
    Ok(profiles)
}

/// Runs the whole filter over a cohort of PennCNV files.
///
/// Loads and centers every track, resolves the two noise profiles
/// (computing and saving them unless precomputed ones are configured) and,
/// unless `only_profiles` is set, writes a corrected `<input><suffix>`
/// PennCNV file per input with the untouched BAF track.
///
/// # Returns
///
/// The per-file diagnostics, empty when only profiles were requested.
pub fn run(
    paths: &[PathBuf],
    config: &FilterConfig,
) -> Result<Vec<TrackStats>> {
    let tracks: Vec<PreparedTrack> = paths
        .par_iter()
        .map(|path| prepare_track(path, config))
        .collect::<Result<_>>()?;

    let profiles = resolve_profiles(&tracks, config)?;
    if config.only_profiles {
        return Ok(Vec::new());
    }

    info!("applying noise profiles to {} tracks", tracks.len());
    let stats = tracks
        .par_iter()
        .map(|track| {
            let (corrected, stats) = apply_profiles(
                &track.path,
                &track.prepared,
                track.x_mean,
                &profiles,
                config.blur_period,
            );
            let output =
                PathBuf::from(format!("{}{}", track.path.display(), config.output_suffix));
            penncnv::save(&corrected, &track.baf, &output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            debug!("wrote {}", output.display());
            Ok(stats)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use arcstr::ArcStr;
    use assert_approx_eq::assert_approx_eq;
    use tempfile::TempDir;

    use super::*;

    fn named(pairs: &[(&str, f32)]) -> Sequence {
        pairs
            .iter()
            .map(|&(name, value)| (ArcStr::from(name), value))
            .collect()
    }

    #[test]
    fn test_normalize_centers_per_group() {
        let sequence = named(&[
            ("a/1/10", 1.0),
            ("b/2/20", 3.0),
            ("c/X/30", 10.0),
            ("d/X/40", 12.0),
            ("e/Mt/50", 99.0),
        ]);
        let (normalized, x_mean) = normalize(&sequence);

        assert_eq!(normalized.len(), 4);
        assert_eq!(normalized.values(), &[-1.0, 1.0, -1.0, 1.0]);
        assert_eq!(x_mean, 11.0);
    }

    #[test]
    fn test_normalize_skips_non_finite() {
        let sequence = named(&[
            ("a/1/10", 2.0),
            ("b/1/20", f32::NAN),
            ("c/1/30", 4.0),
        ]);
        let (normalized, _) = normalize(&sequence);
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized.values()[0], -1.0);
        assert!(normalized.values()[1].is_nan());
        assert_eq!(normalized.values()[2], 1.0);
    }

    #[test]
    fn test_restore_x_round_trip() {
        let sequence = named(&[("a/1/10", 1.0), ("b/X/20", 5.0)]);
        let (normalized, x_mean) = normalize(&sequence);
        let restored = restore_x(&normalized, x_mean);
        assert_eq!(restored.values()[1], 5.0);
    }

    #[test]
    fn test_apply_profiles_removes_shared_pattern() {
        // Two identical tracks: the per-probe profile captures the whole
        // pattern, so the correction should cancel it almost entirely.
        let pattern: Vec<f32> = (0..200)
            .map(|i| 0.05 + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect();
        let track: Sequence = pattern
            .iter()
            .enumerate()
            .map(|(i, &value)| (ArcStr::from(format!("rs{}/1/{}", i, i * 10)), value))
            .collect();

        let profiles = compute_profiles(&[track.clone(), track.clone()], 1000.0);
        let (corrected, stats) =
            apply_profiles(Path::new("t"), &track, 0.0, &profiles, 1000.0);

        assert_eq!(corrected.len(), track.len());
        for &value in corrected.values() {
            assert!(value.abs() < 0.01, "residual {}", value);
        }
        assert_approx_eq!(stats.per_probe_factor, 1.0, 1e-3);
        assert_approx_eq!(stats.per_probe_correlation, 1.0, 1e-3);
    }

    #[test]
    fn test_run_writes_outputs_and_profiles() {
        let directory = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for sample in 0..2 {
            let path = directory.path().join(format!("s{}.txt", sample));
            let track = named(&[
                ("rs1/1/100", 0.25),
                ("rs2/1/200", -0.25),
                ("rs3/1/300", 0.1),
            ]);
            let baf = named(&[
                ("rs1/1/100", 0.5),
                ("rs2/1/200", 0.5),
                ("rs3/1/300", 0.5),
            ]);
            penncnv::save(&track, &baf, &path).unwrap();
            paths.push(path);
        }

        let config = FilterConfig {
            wave_profile_output: directory.path().join("wave_profile"),
            per_probe_profile_output: directory.path().join("per-snp_profile"),
            ..Default::default()
        };
        let stats = run(&paths, &config).unwrap();

        assert_eq!(stats.len(), 2);
        assert!(config.wave_profile_output.exists());
        assert!(config.per_probe_profile_output.exists());
        for path in &paths {
            let output = PathBuf::from(format!("{}.nf", path.display()));
            let (corrected, baf) = penncnv::load(&output).unwrap();
            assert_eq!(corrected.len(), 3);
            assert_eq!(baf.values(), &[0.5, 0.5, 0.5]);
        }
    }

    #[test]
    fn test_run_only_profiles() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("s.txt");
        let track = named(&[("rs1/1/100", 0.25), ("rs2/1/200", -0.25)]);
        penncnv::save(&track, &track, &path).unwrap();

        let config = FilterConfig {
            only_profiles: true,
            wave_profile_output: directory.path().join("wave_profile"),
            per_probe_profile_output: directory.path().join("per-snp_profile"),
            ..Default::default()
        };
        let stats = run(&[path.clone()], &config).unwrap();

        assert!(stats.is_empty());
        assert!(config.wave_profile_output.exists());
        assert!(!PathBuf::from(format!("{}.nf", path.display())).exists());
    }
}
