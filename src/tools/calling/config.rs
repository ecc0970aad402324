use anyhow::{bail, Result};

use super::report::Polarity;

/// Parameters of the segment search.
///
/// The defaults are tuned for log R ratio tracks of SNP microarrays, where
/// a heterozygous deletion shifts the signal by about −0.58 and a
/// heterozygous duplication by about +0.58.
#[derive(Debug, Clone, PartialEq)]
pub struct CallingConfig {
    /// Emit per-stage progress through the log.
    pub verbose:             bool,
    /// Run the deletion pass of [`detect`](super::detect).
    pub search_deletions:    bool,
    /// Run the duplication pass of [`detect`](super::detect).
    pub search_duplications: bool,
    /// Expected signal shift of a deletion, strictly negative.
    pub deletion_shift:      f64,
    /// Expected signal shift of a duplication, strictly positive.
    pub duplication_shift:   f64,
    /// Minimum distance a boundary keeps from the sequence edges while a
    /// candidate expands.
    pub border_width:        usize,
    /// Bounds both the noise profile length and candidate growth.
    pub max_width:           usize,
    /// Magnitude a smoothed extremum must reach to seed a search.
    pub trigger_threshold:   f64,
    /// Minimum combined score a candidate needs to be reported.
    pub final_threshold:     f64,
}

impl Default for CallingConfig {
    fn default() -> Self {
        Self {
            verbose:             false,
            search_deletions:    true,
            search_duplications: true,
            deletion_shift:      -0.58,
            duplication_shift:   0.58,
            border_width:        8,
            max_width:           2048,
            trigger_threshold:   0.58 * 0.5,
            final_threshold:     0.5,
        }
    }
}

impl CallingConfig {
    /// Checks the parameters for combinations the search cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_width < 4 {
            bail!("max width must be at least 4, got {}", self.max_width);
        }
        if !(0.0..=1.0).contains(&self.trigger_threshold) {
            bail!(
                "trigger threshold must lie in [0, 1], got {}",
                self.trigger_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.final_threshold) {
            bail!(
                "final threshold must lie in [0, 1], got {}",
                self.final_threshold
            );
        }
        if !(self.deletion_shift < 0.0) {
            bail!(
                "deletion shift must be negative, got {}",
                self.deletion_shift
            );
        }
        if !(self.duplication_shift > 0.0) {
            bail!(
                "duplication shift must be positive, got {}",
                self.duplication_shift
            );
        }
        Ok(())
    }

    /// The expected signal shift of the given polarity.
    pub fn expected_shift(
        &self,
        polarity: Polarity,
    ) -> f64 {
        match polarity {
            Polarity::Deletion => self.deletion_shift,
            Polarity::Duplication => self.duplication_shift,
        }
    }
}
