//! Copy number segment calling on microarray log R ratio tracks.
//!
//! The search runs in stages. A randomized pass estimates how large trend
//! jumps plain noise produces at every segment width ([`NoiseProfile`]). A
//! median prefilter flattens single-probe spikes into a working grid
//! ([`prefilter`]). The detector then repeatedly seeds a candidate at the
//! strongest unmasked grid extremum, grows its boundaries greedily while
//! Bayesian boundary scores improve ([`enter_score`], [`leave_score`]) and
//! masks the covered cells so the next pass finds the next segment. Every
//! candidate that keeps a convincing combined score becomes a
//! [`ReportEntry`].
//!
//! Deletions and duplications are searched in separate passes over
//! polarity-local copies of the grid; the noise profile is shared.

mod config;
mod noise;
mod prefilter;
mod report;
mod score;

use log::*;
use rand::Rng;

pub use self::config::CallingConfig;
pub use self::noise::NoiseProfile;
pub use self::prefilter::prefilter;
pub use self::report::{Polarity, ReportEntry};
pub use self::score::{enter_score, leave_score, left_jump, right_jump};
use crate::data_structs::{ProbeName, Sequence};

/// Cells closer than this to either sequence end are never seeded.
const SCAN_MARGIN: usize = 64;

/// One cell of the scan grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridCell {
    /// Median-filtered signal, available for seeding and expansion.
    Value(f64),
    /// Covered by an already detected segment of the tagged polarity.
    Masked(Polarity),
}

impl GridCell {
    pub fn is_masked(&self) -> bool {
        matches!(self, GridCell::Masked(_))
    }
}

struct Candidate {
    start: usize,
    end:   usize,
    enter: f64,
    leave: f64,
}

/// Greedy single-polarity segment search over one sequence.
///
/// The detector owns a working copy of the prefiltered grid and mutates it
/// as segments are found, so one instance performs one polarity pass.
pub struct SegmentDetector<'a> {
    sequence: &'a Sequence,
    profile:  &'a NoiseProfile,
    config:   &'a CallingConfig,
    polarity: Polarity,
    grid:     Vec<GridCell>,
}

impl<'a> SegmentDetector<'a> {
    pub fn new(
        sequence: &'a Sequence,
        profile: &'a NoiseProfile,
        grid: &[f64],
        polarity: Polarity,
        config: &'a CallingConfig,
    ) -> Self {
        Self {
            sequence,
            profile,
            config,
            polarity,
            grid: grid.iter().map(|&cell| GridCell::Value(cell)).collect(),
        }
    }

    /// The working grid, exposing which cells detected segments have
    /// masked so far.
    pub fn grid(&self) -> &[GridCell] {
        &self.grid
    }

    /// Runs the full scan, returning the entries in discovery order, which
    /// is descending order of seed extremity.
    pub fn run(&mut self) -> Vec<ReportEntry> {
        if self.config.verbose {
            info!("scanning for {} segments", self.polarity);
        }

        let mut report = Vec::new();
        while let Some(seed) = self.scan() {
            let candidate = self.expand(seed);
            self.mask(candidate.start, candidate.end);
            match self.entry_for(&candidate) {
                Some(entry) => {
                    debug!("found {}", entry);
                    report.push(entry);
                }
                None => trace!(
                    "discarded weak candidate at [{}, {})",
                    candidate.start,
                    candidate.end
                ),
            }
        }
        report
    }

    /// Picks the next seed: the most extreme unmasked grid cell outside
    /// the scan margins, provided it clears the trigger threshold. The
    /// first cell wins ties; NaN cells are never selected.
    fn scan(&self) -> Option<usize> {
        let end = self.grid.len().checked_sub(SCAN_MARGIN)?;
        let mut best: Option<(usize, f64)> = None;
        for index in SCAN_MARGIN..end {
            let GridCell::Value(value) = self.grid[index] else {
                continue;
            };
            if value.is_nan() {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, current)) => match self.polarity {
                    Polarity::Duplication => value > current,
                    Polarity::Deletion => value < current,
                },
            };
            if better {
                best = Some((index, value));
            }
        }

        let (index, value) = best?;
        let triggered = match self.polarity {
            Polarity::Duplication => value >= self.config.trigger_threshold,
            Polarity::Deletion => value <= -self.config.trigger_threshold,
        };
        triggered.then_some(index)
    }

    /// Grows a three-probe region around the seed. Two probes drift
    /// outwards one step per round whether or not the step is taken into
    /// the region; a probe position is only adopted while it improves its
    /// boundary score, and adopting one side snaps the other probe back to
    /// the accepted boundary. Scores always read the raw values; the grid
    /// only gates where probes may drift.
    fn expand(
        &self,
        seed: usize,
    ) -> Candidate {
        let values = self.sequence.values();
        let len = values.len();
        let border = self.config.border_width;
        let max_width = self.config.max_width;

        let mut best_start = seed - 1;
        let mut best_end = seed + 2;
        let radius = best_end - best_start;
        let mut best_enter = enter_score(
            self.profile,
            &values[best_start - radius..best_start],
            &values[best_start..best_end],
            self.polarity,
            self.config,
        );
        let mut best_leave = leave_score(
            self.profile,
            &values[best_start..best_end],
            &values[best_end..best_end + radius],
            self.polarity,
            self.config,
        );

        let mut new_start = best_start;
        let mut new_end = best_end;
        while new_end - best_start < max_width && best_end - new_start < max_width {
            let mut drifted = false;
            if new_start > border && !self.grid[new_start - 1].is_masked() {
                new_start -= 1;
                drifted = true;
            }
            if new_end + border < len && !self.grid[new_end].is_masked() {
                new_end += 1;
                drifted = true;
            }
            if !drifted {
                break;
            }

            let radius = (new_end - best_start).min(new_start).min(len - new_end);

            let enter_left = enter_score(
                self.profile,
                &values[new_start - radius..new_start],
                &values[new_start..best_end],
                self.polarity,
                self.config,
            );
            let leave_left = leave_score(
                self.profile,
                &values[new_start..best_end],
                &values[best_end..best_end + radius],
                self.polarity,
                self.config,
            );
            let enter_right = enter_score(
                self.profile,
                &values[best_start - radius..best_start],
                &values[best_start..new_end],
                self.polarity,
                self.config,
            );
            let leave_right = leave_score(
                self.profile,
                &values[best_start..new_end],
                &values[new_end..new_end + radius],
                self.polarity,
                self.config,
            );

            if best_start != new_start
                && enter_left < best_enter
                && enter_left - best_enter < leave_right - best_leave
            {
                best_start = new_start;
                new_end = best_end;
                best_enter = enter_left;
                best_leave = leave_left;
            }
            else if best_end != new_end && leave_right < best_leave {
                best_end = new_end;
                new_start = best_start;
                best_enter = enter_right;
                best_leave = leave_right;
            }
        }

        Candidate {
            start: best_start,
            end:   best_end,
            enter: best_enter,
            leave: best_leave,
        }
    }

    fn mask(
        &mut self,
        start: usize,
        end: usize,
    ) {
        for cell in &mut self.grid[start..end] {
            *cell = GridCell::Masked(self.polarity);
        }
    }

    /// Builds the report entry for an accepted candidate, or `None` when
    /// the combined score stays below the final threshold.
    fn entry_for(
        &self,
        candidate: &Candidate,
    ) -> Option<ReportEntry> {
        let score_enter = 1.0 - candidate.enter;
        let score_leave = 1.0 - candidate.leave;
        let score_inner = score_enter * score_leave;
        if !(score_inner >= self.config.final_threshold) {
            return None;
        }

        let name_at = |index: usize| {
            self.sequence
                .name_at(index)
                .map(|name| name.as_str())
                .unwrap_or("")
        };
        let start = ProbeName::decompose(name_at(candidate.start));
        let end = ProbeName::decompose(name_at(candidate.end - 1));

        Some(ReportEntry {
            polarity: self.polarity,
            chromosome: start.chromosome,
            start_number: candidate.start,
            end_number: candidate.end - 1,
            start_id: start.id,
            end_id: end.id,
            start_pos: start.position,
            end_pos: end.position,
            score_enter,
            score_leave,
            score_inner,
        })
    }
}

/// Searches one polarity with an explicit random source.
pub fn detect_polarity_with_rng<R: Rng + ?Sized>(
    sequence: &Sequence,
    polarity: Polarity,
    config: &CallingConfig,
    rng: &mut R,
) -> Vec<ReportEntry> {
    let profile = NoiseProfile::analyze(sequence.values(), config.max_width, rng);
    let grid = prefilter(sequence.values());
    SegmentDetector::new(sequence, &profile, &grid, polarity, config).run()
}

/// Searches one polarity, ignoring the enable flags of the configuration.
pub fn detect_polarity(
    sequence: &Sequence,
    polarity: Polarity,
    config: &CallingConfig,
) -> Vec<ReportEntry> {
    detect_polarity_with_rng(sequence, polarity, config, &mut rand::thread_rng())
}

/// Searches for copy number segments with an explicit random source.
///
/// Runs the deletion pass and then the duplication pass as the enable
/// flags of `config` request, concatenating their reports. The noise
/// profile and the prefiltered grid are computed once and shared; each
/// pass works on its own copy of the grid.
///
/// # Arguments
///
/// * `sequence` - the signal track, normally a log R ratio sequence.
/// * `config` - search parameters, see [`CallingConfig`].
/// * `rng` - the random source behind the noise profile; a seeded
///   generator makes the whole search reproducible.
///
/// # Returns
///
/// All accepted segments in pass and discovery order.
pub fn detect_with_rng<R: Rng + ?Sized>(
    sequence: &Sequence,
    config: &CallingConfig,
    rng: &mut R,
) -> Vec<ReportEntry> {
    let profile = NoiseProfile::analyze(sequence.values(), config.max_width, rng);
    let grid = prefilter(sequence.values());

    let mut report = Vec::new();
    for polarity in [Polarity::Deletion, Polarity::Duplication] {
        let enabled = match polarity {
            Polarity::Deletion => config.search_deletions,
            Polarity::Duplication => config.search_duplications,
        };
        if !enabled {
            continue;
        }
        let mut detector =
            SegmentDetector::new(sequence, &profile, &grid, polarity, config);
        report.extend(detector.run());
    }

    info!("detected {} segments", report.len());
    report
}

/// Searches for copy number segments using the thread-local random source.
pub fn detect(
    sequence: &Sequence,
    config: &CallingConfig,
) -> Vec<ReportEntry> {
    detect_with_rng(sequence, config, &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use arcstr::ArcStr;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, Normal};

    use super::*;

    fn synthetic_sequence(
        len: usize,
        blocks: &[(usize, usize, f32)],
    ) -> Sequence {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let noise = Normal::new(0.0f32, 0.05).unwrap();
        let mut sequence = Sequence::with_capacity(len);
        for index in 0..len {
            let shift = blocks
                .iter()
                .find(|(start, end, _)| (*start..*end).contains(&index))
                .map(|(_, _, shift)| *shift)
                .unwrap_or(0.0);
            let name = format!("rs{}/1/{}", index, index * 1000);
            sequence.push(Some(ArcStr::from(name)), shift + noise.sample(&mut rng));
        }
        sequence
    }

    fn test_config() -> CallingConfig {
        CallingConfig {
            max_width: 64,
            ..Default::default()
        }
    }

    #[test]
    fn test_detect_empty_sequence() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let report = detect_with_rng(&Sequence::new(), &test_config(), &mut rng);
        assert!(report.is_empty());
    }

    #[test]
    fn test_detect_short_sequence() {
        let sequence = synthetic_sequence(128, &[(40, 60, 0.58)]);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let report = detect_with_rng(&sequence, &test_config(), &mut rng);
        assert!(report.is_empty());
    }

    #[test]
    fn test_detect_flat_sequence() {
        let sequence = synthetic_sequence(400, &[]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let report = detect_with_rng(&sequence, &test_config(), &mut rng);
        assert!(report.is_empty());
    }

    #[test]
    fn test_detector_masks_accepted_region() {
        let sequence = synthetic_sequence(400, &[(150, 170, 0.58)]);
        let config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let profile =
            NoiseProfile::analyze(sequence.values(), config.max_width, &mut rng);
        let grid = prefilter(sequence.values());

        let mut detector = SegmentDetector::new(
            &sequence,
            &profile,
            &grid,
            Polarity::Duplication,
            &config,
        );
        let report = detector.run();

        assert_eq!(report.len(), 1);
        let entry = &report[0];
        assert_eq!(entry.polarity, Polarity::Duplication);
        assert!(entry.start_number >= 140 && entry.start_number <= 155);
        assert!(entry.end_number >= 165 && entry.end_number <= 180);
        assert!(entry.score_inner >= 0.5);

        for index in entry.start_number..=entry.end_number {
            assert_eq!(
                detector.grid()[index],
                GridCell::Masked(Polarity::Duplication),
                "cell {}",
                index
            );
        }
        for (index, cell) in detector.grid().iter().enumerate() {
            if index < 140 || index > 185 {
                assert!(!cell.is_masked(), "cell {}", index);
            }
        }
    }

    #[test]
    fn test_detect_polarity_ignores_enable_flags() {
        let sequence = synthetic_sequence(400, &[(150, 170, 0.58)]);
        let config = CallingConfig {
            search_duplications: false,
            ..test_config()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let report = detect_polarity_with_rng(
            &sequence,
            Polarity::Duplication,
            &config,
            &mut rng,
        );
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].polarity, Polarity::Duplication);
    }

    #[test]
    fn test_detect_reports_metadata() {
        let sequence = synthetic_sequence(400, &[(150, 170, -0.58)]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let report = detect_with_rng(&sequence, &test_config(), &mut rng);

        assert_eq!(report.len(), 1);
        let entry = &report[0];
        assert_eq!(entry.polarity, Polarity::Deletion);
        assert_eq!(entry.chromosome, crate::data_structs::Chromosome::Autosome(1));
        assert_eq!(entry.start_id, format!("rs{}", entry.start_number));
        assert_eq!(entry.end_id, format!("rs{}", entry.end_number));
        assert_eq!(entry.start_pos as usize, entry.start_number * 1000);
        assert_eq!(entry.end_pos as usize, entry.end_number * 1000);
    }

    #[test]
    fn test_detect_respects_enable_flags() {
        let sequence = synthetic_sequence(400, &[(150, 170, 0.58)]);
        let config = CallingConfig {
            search_duplications: false,
            ..test_config()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let report = detect_with_rng(&sequence, &config, &mut rng);
        assert!(report.is_empty());
    }

    #[test]
    fn test_seeded_detection_is_reproducible() {
        let sequence = synthetic_sequence(600, &[(200, 230, 0.58), (400, 430, -0.58)]);
        let config = test_config();
        let first =
            detect_with_rng(&sequence, &config, &mut ChaCha8Rng::seed_from_u64(7));
        let second =
            detect_with_rng(&sequence, &config, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        // The deletion pass runs first.
        assert_eq!(first[0].polarity, Polarity::Deletion);
    }
}
