use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Args;
use console::style;
use dialoguer::Confirm;
use nfcnv::tools::filter::{self, FilterConfig};

use crate::utils::{expand_wildcards, UtilsArgs};

#[derive(Args, Debug, Clone)]
pub(crate) struct FilterArgs {
    #[arg(
        value_parser,
        num_args = 1..,
        required = true,
        help = "Paths to PennCNV tracks of the cohort. Wildcards are expanded."
    )]
    inputs: Vec<String>,

    #[arg(
        short,
        long,
        required = false,
        default_value_t = false,
        help = "Automatically confirm selected paths."
    )]
    force:  bool,

    #[arg(
        long,
        help_heading = "PROFILE ARGS",
        help = "Load the wave noise profile from a native file instead of \
                computing it from the cohort."
    )]
    wave_profile: Option<PathBuf>,

    #[arg(
        long,
        help_heading = "PROFILE ARGS",
        help = "Load the per-SNP noise profile from a native file instead of \
                computing it from the cohort."
    )]
    per_snp_profile: Option<PathBuf>,

    #[arg(
        long,
        default_value = "wave_profile",
        help_heading = "PROFILE ARGS",
        help = "Path under which a computed wave profile is saved."
    )]
    wave_profile_output: PathBuf,

    #[arg(
        long,
        default_value = "per-snp_profile",
        help_heading = "PROFILE ARGS",
        help = "Path under which a computed per-SNP profile is saved."
    )]
    per_snp_profile_output: PathBuf,

    #[arg(
        long,
        default_value_t = false,
        help_heading = "PROFILE ARGS",
        help = "Stop after computing and saving the noise profiles."
    )]
    only_profiles: bool,

    #[arg(
        long,
        default_value_t = false,
        help = "Keep X chromosome probes. Y, XY and mitochondrial probes are \
                always dropped."
    )]
    use_sex_chromosomes: bool,

    #[arg(
        long,
        default_value_t = 1000.0,
        help = "Period of the low-pass blur separating wave noise from per-probe \
                noise."
    )]
    blur_period: f64,

    #[arg(
        long,
        default_value = ".nf",
        help = "Suffix appended to input paths for the corrected output files."
    )]
    output_suffix: String,

    #[arg(long, help = "Path for a per-track noise statistics table.")]
    stats: Option<PathBuf>,
}

impl FilterArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let paths = expand_wildcards(&self.inputs);
        if paths.is_empty() {
            return Err(anyhow!("No input files matched"));
        }

        if !self.force {
            let prompt = format!(
                "Do you want to proceed with the following paths?\n\n{:?}",
                paths
            );
            let confirmed = Confirm::new()
                .with_prompt(prompt)
                .default(true)
                .interact()
                .unwrap_or(false);

            if !confirmed {
                println!("{}", style("Process aborted by the user.").red());
                return Err(anyhow!("User aborted the process."));
            }
        }

        for path in paths.iter() {
            if !path.exists() {
                eprintln!("Path {} does not exist.", style(path.display()).red());
            }
            if !path.is_file() {
                eprintln!("Path {} is not a file.", style(path.display()).red());
            }
        }

        let config = FilterConfig {
            use_sex_chromosomes:      self.use_sex_chromosomes,
            only_profiles:            self.only_profiles,
            blur_period:              self.blur_period,
            output_suffix:            self.output_suffix.clone(),
            wave_profile:             self.wave_profile.clone(),
            per_probe_profile:        self.per_snp_profile.clone(),
            wave_profile_output:      self.wave_profile_output.clone(),
            per_probe_profile_output: self.per_snp_profile_output.clone(),
        };

        let stats = filter::run(&paths, &config)?;

        if let Some(stats_path) = &self.stats {
            let mut writer = csv::WriterBuilder::default()
                .delimiter(b'\t')
                .has_headers(true)
                .from_path(stats_path)
                .with_context(|| {
                    format!("failed to create {}", stats_path.display())
                })?;
            for row in stats.iter() {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }

        if self.only_profiles {
            println!(
                "{}",
                style(format!(
                    "Computed noise profiles from {} tracks.",
                    paths.len()
                ))
                .green()
                .bold()
            );
        }
        else {
            println!(
                "{}",
                style(format!("Filtered {} tracks.", stats.len()))
                    .green()
                    .bold()
            );
        }
        Ok(())
    }
}
