use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::typedef::PosType;

/// Compact chromosome encoding carried inside composed probe names.
///
/// Autosomes keep their numeral (0 to 250); the sex chromosomes, the
/// pseudo-autosomal region and the mitochondrial genome occupy the codes
/// above 250, with 255 reserved for anything unrecognized.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord)]
pub enum Chromosome {
    /// Numbered chromosome, 0 to 250.
    Autosome(u8),
    /// X chromosome (code 251).
    X,
    /// Y chromosome (code 252).
    Y,
    /// Pseudo-autosomal region (code 253).
    XY,
    /// Mitochondrial genome (code 254).
    Mito,
    /// Unrecognized chromosome field (code 255).
    Unknown,
}

impl Chromosome {
    pub const fn code(&self) -> u8 {
        match self {
            Chromosome::Autosome(n) => *n,
            Chromosome::X => 251,
            Chromosome::Y => 252,
            Chromosome::XY => 253,
            Chromosome::Mito => 254,
            Chromosome::Unknown => 255,
        }
    }

    pub const fn from_code(code: u8) -> Self {
        match code {
            251 => Chromosome::X,
            252 => Chromosome::Y,
            253 => Chromosome::XY,
            254 => Chromosome::Mito,
            255 => Chromosome::Unknown,
            n => Chromosome::Autosome(n),
        }
    }

    pub const fn is_autosome(&self) -> bool {
        matches!(self, Chromosome::Autosome(_))
    }
}

impl Display for Chromosome {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Chromosome::Autosome(n) => write!(f, "{}", n),
            Chromosome::X => write!(f, "X"),
            Chromosome::Y => write!(f, "Y"),
            Chromosome::XY => write!(f, "XY"),
            Chromosome::Mito => write!(f, "Mt"),
            Chromosome::Unknown => write!(f, "?"),
        }
    }
}

impl FromStr for Chromosome {
    type Err = Infallible;

    /// Accepts plain numerals up to 250 (no leading zeros) and the
    /// case-insensitive letter forms `x`, `y`, `xy`, `mt`. Anything else
    /// parses as [`Chromosome::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let numeral = !s.is_empty()
            && s.len() <= 3
            && s.bytes().all(|b| b.is_ascii_digit())
            && (s.len() == 1 || !s.starts_with('0'));
        if numeral {
            if let Ok(n) = s.parse::<u16>() {
                if n <= 250 {
                    return Ok(Chromosome::Autosome(n as u8));
                }
            }
            return Ok(Chromosome::Unknown);
        }
        Ok(match s.to_uppercase().as_str() {
            "X" => Chromosome::X,
            "Y" => Chromosome::Y,
            "XY" => Chromosome::XY,
            "MT" => Chromosome::Mito,
            _ => Chromosome::Unknown,
        })
    }
}

impl Serialize for Chromosome {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer, {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Chromosome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>, {
        let s = String::deserialize(deserializer)?;
        std::str::FromStr::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// The three fields packed into a composed probe name
/// `id/chromosome/position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeName {
    pub id:         String,
    pub chromosome: Chromosome,
    pub position:   PosType,
}

impl ProbeName {
    /// Splits a composed name into its decoded fields.
    ///
    /// Missing parts keep their defaults: a name without separators keeps an
    /// empty id, and a name with a single separator carries neither
    /// chromosome nor position.
    pub fn decompose(name: &str) -> Self {
        let (id, chr, pos) = split_name(name);
        ProbeName {
            id:         id.to_string(),
            chromosome: chr.parse().unwrap_or(Chromosome::Unknown),
            position:   decode_position(pos),
        }
    }

    pub fn compose(&self) -> String {
        compose_name(
            &self.id,
            &self.chromosome.to_string(),
            &self.position.to_string(),
        )
    }
}

pub fn compose_name(
    id: &str,
    chr: &str,
    pos: &str,
) -> String {
    format!("{}/{}/{}", id, chr, pos)
}

/// Splits a composed probe name into raw `(id, chromosome, position)` slices
/// without decoding them. The chromosome and position fields are populated
/// only when the name carries at least two separators.
pub fn split_name(name: &str) -> (&str, &str, &str) {
    match name.find('/') {
        None => ("", "", ""),
        Some(first) => {
            let id = &name[..first];
            let rest = &name[first + 1..];
            match rest.find('/') {
                None => (id, "", ""),
                Some(second) => (id, &rest[..second], &rest[second + 1..]),
            }
        },
    }
}

/// Decodes a position substring. Any character outside `0..=9` makes the
/// whole substring decode to zero.
pub fn decode_position(s: &str) -> PosType {
    if s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().unwrap_or(0)
    }
    else {
        0
    }
}
