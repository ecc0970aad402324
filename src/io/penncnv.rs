//! The tab-separated genotyping export format.
//!
//! The header row names the columns. `Name`, `Chr` and `Position` are
//! matched exactly; the two signal columns are matched on the
//! `.Log R Ratio` and `.B Allele Freq` markers in their captions, so
//! `sample7.Log R Ratio` is recognised regardless of the sample name.
//! All five columns are required.
//!
//! Loading composes each probe name as `id/chr/pos` from the raw column
//! text and sorts probes by chromosome, position and name, so tracks from
//! different exports of the same array align probe for probe.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use arcstr::ArcStr;
use log::*;

use super::{decode_value, encode_value};
use crate::data_structs::typedef::{PosType, ValueType};
use crate::data_structs::{compose_name, split_name, Chromosome, PairedIter, Sequence};

const LRR_COLUMN: &str = ".Log R Ratio";
const BAF_COLUMN: &str = ".B Allele Freq";

#[derive(Default)]
struct Columns {
    name:     Option<usize>,
    chr:      Option<usize>,
    position: Option<usize>,
    lrr:      Option<usize>,
    baf:      Option<usize>,
}

impl Columns {
    fn from_header(header: &csv::StringRecord) -> Self {
        let mut columns = Columns::default();
        for (index, caption) in header.iter().enumerate() {
            match caption {
                "Name" => columns.name = Some(index),
                "Chr" => columns.chr = Some(index),
                "Position" => columns.position = Some(index),
                _ if caption.contains(LRR_COLUMN) => columns.lrr = Some(index),
                _ if caption.contains(BAF_COLUMN) => columns.baf = Some(index),
                _ => {}
            }
        }
        columns
    }

    fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.chr.is_some()
            && self.position.is_some()
            && self.lrr.is_some()
            && self.baf.is_some()
    }
}

/// Reads the log R ratio and B allele frequency tracks of one sample.
///
/// Returns `(lrr, baf)`; both sequences carry the same composed probe
/// names. A table missing any of the five required columns yields two
/// empty sequences.
pub fn read<R: Read>(reader: R) -> Result<(Sequence, Sequence)> {
    let mut table = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut records = table.records();
    let Some(header) = records.next().transpose()? else {
        return Ok((Sequence::new(), Sequence::new()));
    };
    let columns = Columns::from_header(&header);
    if !columns.is_complete() {
        warn!("missing Name/Chr/Position/signal columns in header");
        return Ok((Sequence::new(), Sequence::new()));
    }

    let mut rows: Vec<(u8, PosType, ArcStr, ValueType, ValueType)> = Vec::new();
    for record in records {
        let record = record?;
        let field = |index: Option<usize>| {
            index
                .and_then(|index| record.get(index))
                .unwrap_or("")
                .trim_matches(' ')
        };
        let id = field(columns.name);
        let chr = field(columns.chr);
        let pos = field(columns.position);
        let chromosome = chr.parse::<Chromosome>().unwrap_or(Chromosome::Unknown);
        rows.push((
            chromosome.code(),
            crate::data_structs::decode_position(pos),
            ArcStr::from(compose_name(id, chr, pos)),
            decode_value(field(columns.lrr)),
            decode_value(field(columns.baf)),
        ));
    }
    rows.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    let mut lrr = Sequence::with_capacity(rows.len());
    let mut baf = Sequence::with_capacity(rows.len());
    for (_, _, name, lrr_value, baf_value) in rows {
        lrr.push(Some(name.clone()), lrr_value);
        baf.push(Some(name), baf_value);
    }
    Ok((lrr, baf))
}

/// Writes a sample table with one row per name-matched probe pair of the
/// two tracks. Rows use CRLF line endings and the raw `id/chr/pos` parts
/// of each composed probe name.
pub fn write<W: Write>(
    lrr: &Sequence,
    baf: &Sequence,
    sample: &str,
    writer: W,
) -> Result<()> {
    let mut table = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::CRLF)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);

    let lrr_caption = format!("{}{}", sample, LRR_COLUMN);
    let baf_caption = format!("{}{}", sample, BAF_COLUMN);
    table.write_record([
        "Name",
        "Chr",
        "Position",
        lrr_caption.as_str(),
        baf_caption.as_str(),
    ])?;

    for (name, lrr_value, baf_value) in PairedIter::new(lrr, baf) {
        let name = name.map(ArcStr::as_str).unwrap_or("");
        let (id, chr, pos) = split_name(name);
        table.write_record([
            id,
            chr,
            pos,
            encode_value(lrr_value).as_str(),
            encode_value(baf_value).as_str(),
        ])?;
    }
    table.flush()?;
    Ok(())
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<(Sequence, Sequence)> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let (lrr, baf) = read(file)?;
    debug!("loaded {} probes from {}", lrr.len(), path.display());
    Ok((lrr, baf))
}

/// Saves both tracks of one sample. The sample name in the header is the
/// file name of `path`.
pub fn save<P: AsRef<Path>>(
    lrr: &Sequence,
    baf: &Sequence,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let sample = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write(lrr, baf, &sample, file)?;
    debug!("saved {} probes to {}", lrr.len(), path.display());
    Ok(())
}
