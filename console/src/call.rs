use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Args, ValueEnum};
use console::style;
use dialoguer::Confirm;
use indicatif::ProgressBar;
use log::info;
use nfcnv::data_structs::typedef::PosType;
use nfcnv::data_structs::{Chromosome, Sequence};
use nfcnv::io::{native, penncnv};
use nfcnv::tools::calling::{
    detect, detect_with_rng, CallingConfig, Polarity, ReportEntry,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::utils::{expand_wildcards, init_pbar, TrackFormat, UtilsArgs};

#[derive(Args, Debug, Clone)]
pub(crate) struct CallArgs {
    #[arg(
        value_parser,
        num_args = 1..,
        required = true,
        help = "Paths to input tracks. Wildcards are expanded."
    )]
    inputs: Vec<String>,

    #[arg(
        short = 'o',
        long,
        required = true,
        help = "Path for the generated report."
    )]
    output:  PathBuf,

    #[clap(
        short = 'F',
        long,
        value_enum,
        default_value_t = TrackFormat::Penncnv,
        help = "Input track format. PennCNV tables contribute their log R ratio \
                column."
    )]
    format:  TrackFormat,

    #[clap(
        short = 'r',
        long,
        value_enum,
        default_value_t = ReportFormat::Tsv,
        help = "Report output format."
    )]
    report:  ReportFormat,

    #[arg(
        short,
        long,
        required = false,
        default_value_t = false,
        help = "Automatically confirm output overwrite."
    )]
    force:   bool,

    #[arg(
        long,
        help_heading = "DETECTOR ARGS",
        help = "Seed for the noise estimator. Calls are reproducible for a fixed \
                seed and input."
    )]
    seed: Option<u64>,

    #[arg(
        long,
        default_value_t = false,
        help_heading = "DETECTOR ARGS",
        help = "Skip the deletion pass."
    )]
    no_deletions: bool,

    #[arg(
        long,
        default_value_t = false,
        help_heading = "DETECTOR ARGS",
        help = "Skip the duplication pass."
    )]
    no_duplications: bool,

    #[arg(
        long,
        default_value_t = -0.58,
        allow_negative_numbers = true,
        help_heading = "DETECTOR ARGS",
        help = "Expected log R ratio shift of a single copy deletion."
    )]
    deletion_shift: f64,

    #[arg(
        long,
        default_value_t = 0.58,
        help_heading = "DETECTOR ARGS",
        help = "Expected log R ratio shift of a single copy duplication."
    )]
    duplication_shift: f64,

    #[arg(
        long,
        default_value_t = 8,
        help_heading = "DETECTOR ARGS",
        help = "Number of probes a segment boundary keeps clear of the track ends."
    )]
    border_width: usize,

    #[arg(
        long,
        default_value_t = 2048,
        help_heading = "DETECTOR ARGS",
        help = "Maximum width of a reported segment, in probes."
    )]
    max_width: usize,

    #[arg(
        long,
        default_value_t = 0.29,
        help_heading = "DETECTOR ARGS",
        help = "Despiked level at which a probe seeds a candidate segment."
    )]
    trigger_threshold: f64,

    #[arg(
        long,
        default_value_t = 0.5,
        help_heading = "DETECTOR ARGS",
        help = "Minimum combined boundary confidence of a reported segment."
    )]
    final_threshold: f64,
}

#[derive(Debug, Clone, ValueEnum)]
enum ReportFormat {
    Tsv,
    Json,
}

#[derive(Debug, Serialize)]
struct CallRow {
    track:        String,
    polarity:     Polarity,
    copy_number:  u8,
    chromosome:   Chromosome,
    start_id:     String,
    start_pos:    PosType,
    end_id:       String,
    end_pos:      PosType,
    start_number: usize,
    end_number:   usize,
    probes:       usize,
    score_enter:  f64,
    score_leave:  f64,
    score_inner:  f64,
}

impl CallRow {
    fn from_entry(
        path: &Path,
        entry: ReportEntry,
    ) -> Self {
        Self {
            track:        path.display().to_string(),
            polarity:     entry.polarity,
            copy_number:  entry.polarity.copy_number(),
            chromosome:   entry.chromosome,
            probes:       entry.probe_count(),
            start_id:     entry.start_id,
            start_pos:    entry.start_pos,
            end_id:       entry.end_id,
            end_pos:      entry.end_pos,
            start_number: entry.start_number,
            end_number:   entry.end_number,
            score_enter:  entry.score_enter,
            score_leave:  entry.score_leave,
            score_inner:  entry.score_inner,
        }
    }
}

impl CallArgs {
    pub fn run(
        &self,
        utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let paths = expand_wildcards(&self.inputs);
        if paths.is_empty() {
            return Err(anyhow!("No input files matched"));
        }

        for path in paths.iter() {
            if !path.exists() {
                eprintln!("Path {} does not exist.", style(path.display()).red());
            }
            if !path.is_file() {
                eprintln!("Path {} is not a file.", style(path.display()).red());
            }
        }

        if self.output.exists() && !self.force {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Output file {} already exists. Overwrite?",
                    self.output.display()
                ))
                .default(true)
                .interact()
                .unwrap_or(false);

            if !confirmed {
                println!("{}", style("Process aborted by the user.").red());
                return Err(anyhow!("User aborted the process."));
            }
        }

        let config = self.config(utils);
        config.validate()?;

        let progress_bar = if utils.progress {
            init_pbar(paths.len())?
        }
        else {
            ProgressBar::hidden()
        };

        let mut report = Vec::new();
        for path in paths.iter() {
            progress_bar
                .set_message(format!("{}", style(path.display()).blue()));

            let track = load_lrr(path, self.format)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let entries = match self.seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    detect_with_rng(&track, &config, &mut rng)
                },
                None => detect(&track, &config),
            };

            info!(
                "{}: {} calls over {} probes",
                path.display(),
                entries.len(),
                track.len()
            );
            report.extend(
                entries
                    .into_iter()
                    .map(|entry| CallRow::from_entry(path, entry)),
            );
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();

        match self.report {
            ReportFormat::Tsv => write_tsv(&self.output, &report)?,
            ReportFormat::Json => write_json(&self.output, &report)?,
        }

        println!(
            "{}",
            style(format!("Found {} CNVs.", report.len())).green().bold()
        );
        Ok(())
    }

    fn config(
        &self,
        utils: &UtilsArgs,
    ) -> CallingConfig {
        CallingConfig {
            verbose:             utils.verbose,
            search_deletions:    !self.no_deletions,
            search_duplications: !self.no_duplications,
            deletion_shift:      self.deletion_shift,
            duplication_shift:   self.duplication_shift,
            border_width:        self.border_width,
            max_width:           self.max_width,
            trigger_threshold:   self.trigger_threshold,
            final_threshold:     self.final_threshold,
        }
    }
}

fn load_lrr(
    path: &Path,
    format: TrackFormat,
) -> anyhow::Result<Sequence> {
    match format {
        TrackFormat::Penncnv => penncnv::load(path).map(|(lrr, _)| lrr),
        TrackFormat::Native => native::load(path),
    }
}

fn write_tsv(
    path: &Path,
    report: &[CallRow],
) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::default()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for row in report {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(
    path: &Path,
    report: &[CallRow],
) -> anyhow::Result<()> {
    let writer = BufWriter::new(
        File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?,
    );
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}
