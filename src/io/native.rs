//! The native two-column track format.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use arcstr::ArcStr;
use log::*;

use super::{decode_value, encode_value};
use crate::data_structs::Sequence;

/// Reads a track from the native format.
///
/// Each line carries a probe name and a value separated by spaces or tabs.
/// Anything after the second token is ignored. Lines without a name are
/// skipped; a missing or unparseable value becomes NaN.
pub fn read<R: BufRead>(reader: R) -> Result<Sequence> {
    let mut sequence = Sequence::new();
    for line in reader.lines() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            continue;
        };
        let value = decode_value(tokens.next().unwrap_or(""));
        sequence.push(Some(ArcStr::from(name)), value);
    }
    Ok(sequence)
}

/// Writes a track in the native format, one `name\tvalue` line per probe.
pub fn write<W: Write>(
    sequence: &Sequence,
    mut writer: W,
) -> Result<()> {
    for (name, value) in sequence.iter() {
        let name = name.map(ArcStr::as_str).unwrap_or("");
        writeln!(writer, "{}\t{}", name, encode_value(value))?;
    }
    Ok(())
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Sequence> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let sequence = read(BufReader::new(file))?;
    debug!("loaded {} probes from {}", sequence.len(), path.display());
    Ok(sequence)
}

pub fn save<P: AsRef<Path>>(
    sequence: &Sequence,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write(sequence, &mut writer)?;
    writer.flush()?;
    debug!("saved {} probes to {}", sequence.len(), path.display());
    Ok(())
}
