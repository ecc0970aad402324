use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::data_structs::typedef::PosType;
use crate::data_structs::Chromosome;

/// Direction of a copy number change relative to the baseline.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord)]
pub enum Polarity {
    Deletion,
    Duplication,
}

impl Polarity {
    /// The integer copy number conventionally reported for this polarity
    /// (two copies being the baseline).
    pub fn copy_number(&self) -> u8 {
        match self {
            Polarity::Deletion => 1,
            Polarity::Duplication => 3,
        }
    }
}

impl Display for Polarity {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Polarity::Deletion => write!(f, "deletion"),
            Polarity::Duplication => write!(f, "duplication"),
        }
    }
}

impl FromStr for Polarity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deletion" | "del" | "1" => Ok(Polarity::Deletion),
            "duplication" | "dup" | "3" => Ok(Polarity::Duplication),
            _ => Err(anyhow::anyhow!("unknown polarity: {}", s)),
        }
    }
}

impl Serialize for Polarity {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Polarity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Polarity::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// One detected copy number segment.
///
/// Index fields refer to probe positions within the searched sequence;
/// `end_number` is inclusive. The genomic fields are decomposed from the
/// names of the first and last probe of the segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub polarity:     Polarity,
    pub chromosome:   Chromosome,
    pub start_number: usize,
    pub end_number:   usize,
    pub start_id:     String,
    pub end_id:       String,
    pub start_pos:    PosType,
    pub end_pos:      PosType,
    pub score_enter:  f64,
    pub score_leave:  f64,
    pub score_inner:  f64,
}

impl ReportEntry {
    /// Number of probes the segment spans.
    pub fn probe_count(&self) -> usize {
        self.end_number - self.start_number + 1
    }
}

impl Display for ReportEntry {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{} on {} at {}-{} ({} probes, cn={}, score {:.3})",
            self.polarity,
            self.chromosome,
            self.start_pos,
            self.end_pos,
            self.probe_count(),
            self.polarity.copy_number(),
            self.score_inner
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ReportEntry {
        ReportEntry {
            polarity:     Polarity::Deletion,
            chromosome:   Chromosome::Autosome(7),
            start_number: 120,
            end_number:   139,
            start_id:     "rs100".to_string(),
            end_id:       "rs119".to_string(),
            start_pos:    1_500_000,
            end_pos:      1_560_000,
            score_enter:  0.92,
            score_leave:  0.88,
            score_inner:  0.8096,
        }
    }

    #[test]
    fn test_polarity_copy_number() {
        assert_eq!(Polarity::Deletion.copy_number(), 1);
        assert_eq!(Polarity::Duplication.copy_number(), 3);
    }

    #[test]
    fn test_polarity_from_str() {
        assert_eq!("del".parse::<Polarity>().unwrap(), Polarity::Deletion);
        assert_eq!(
            "Duplication".parse::<Polarity>().unwrap(),
            Polarity::Duplication
        );
        assert!("gain".parse::<Polarity>().is_err());
    }

    #[test]
    fn test_entry_serde_round_trip() {
        let entry = entry();
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"polarity\":\"deletion\""));
        assert!(json.contains("\"chromosome\":\"7\""));
        let back: ReportEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_entry_display() {
        let text = entry().to_string();
        assert!(text.contains("deletion on 7"));
        assert!(text.contains("20 probes"));
        assert!(text.contains("cn=1"));
    }
}
