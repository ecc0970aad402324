use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Args;
use console::style;
use dialoguer::Confirm;
use log::info;
use nfcnv::data_structs::Sequence;
use nfcnv::io::{native, penncnv};

use crate::utils::{TrackFormat, UtilsArgs};

#[derive(Args, Debug, Clone)]
pub(crate) struct ConvertArgs {
    #[arg(required = true, help = "Path to the input track.")]
    input:  PathBuf,

    #[arg(
        short = 'o',
        long,
        required = true,
        help = "Path for the converted file."
    )]
    output: PathBuf,

    #[clap(
        long,
        value_enum,
        default_value_t = TrackFormat::Penncnv,
        help = "Format of the input file."
    )]
    from:   TrackFormat,

    #[clap(
        long,
        value_enum,
        default_value_t = TrackFormat::Native,
        help = "Format of the output file."
    )]
    to:     TrackFormat,

    #[arg(
        long,
        help = "Native B allele frequency track to pair with the log R ratio \
                track. A constant 0.5 column is written when omitted."
    )]
    baf: Option<PathBuf>,

    #[arg(
        long,
        help = "Sample name used in the PennCNV column captions. The output \
                file name is used when omitted."
    )]
    sample: Option<String>,

    #[arg(
        short,
        long,
        required = false,
        default_value_t = false,
        help = "Automatically confirm output overwrite."
    )]
    force:  bool,
}

impl ConvertArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        if self.from == self.to {
            return Err(anyhow!("Input and output formats are the same"));
        }

        if !self.input.is_file() {
            eprintln!(
                "Path {} is not a file.",
                style(self.input.display()).red()
            );
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

        match (self.from, self.to) {
            (TrackFormat::Penncnv, TrackFormat::Native) => {
                let (lrr, _baf) = penncnv::load(&self.input)?;
                native::save(&lrr, &self.output)?;
                info!(
                    "extracted {} log R ratio probes from {}",
                    lrr.len(),
                    self.input.display()
                );
            },
            (TrackFormat::Native, TrackFormat::Penncnv) => {
                let lrr = native::load(&self.input)?;
                let baf = match &self.baf {
                    Some(path) => native::load(path)?,
                    None => constant_baf(&lrr),
                };
                match &self.sample {
                    Some(sample) => {
                        let writer = BufWriter::new(
                            File::create(&self.output).with_context(|| {
                                format!(
                                    "failed to create {}",
                                    self.output.display()
                                )
                            })?,
                        );
                        penncnv::write(&lrr, &baf, sample, writer)?;
                    },
                    None => penncnv::save(&lrr, &baf, &self.output)?,
                }
            },
            _ => unreachable!(),
        }

        println!(
            "{}",
            style(format!("Wrote {}.", self.output.display()))
                .green()
                .bold()
        );
        Ok(())
    }
}

fn constant_baf(lrr: &Sequence) -> Sequence {
    lrr.names()
        .iter()
        .map(|name| (name.clone(), 0.5))
        .collect()
}
