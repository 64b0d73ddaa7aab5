//! GTDB-Tk classification strings and the id munging needed to join them
//! against coverage tables.

use clap::ValueEnum;

pub const NUM_RANKS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Rank {
    Domain,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    pub const ALL: [Rank; NUM_RANKS] = [
        Rank::Domain,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
    ];

    /// Position in a GTDB classification string.
    pub fn index(self) -> usize {
        match self {
            Rank::Domain => 0,
            Rank::Phylum => 1,
            Rank::Class => 2,
            Rank::Order => 3,
            Rank::Family => 4,
            Rank::Genus => 5,
            Rank::Species => 6,
        }
    }

    /// GTDB rank prefix, e.g. `p__` for phylum.
    pub fn prefix(self) -> &'static str {
        match self {
            Rank::Domain => "d__",
            Rank::Phylum => "p__",
            Rank::Class => "c__",
            Rank::Order => "o__",
            Rank::Family => "f__",
            Rank::Genus => "g__",
            Rank::Species => "s__",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::Domain => "Domain",
            Rank::Phylum => "Phylum",
            Rank::Class => "Class",
            Rank::Order => "Order",
            Rank::Family => "Family",
            Rank::Genus => "Genus",
            Rank::Species => "Species",
        }
    }
}

/// A seven-rank lineage parsed from a `d__...;p__...;...;s__...` string.
/// Ranks the classifier left empty are None.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lineage {
    names: [Option<String>; NUM_RANKS],
}

impl Lineage {
    pub fn parse(classification: &str) -> Lineage {
        let mut names: [Option<String>; NUM_RANKS] = Default::default();
        for (pos, token) in classification.split(';').take(NUM_RANKS).enumerate() {
            let token = token.trim();
            let rank = Rank::ALL[pos];
            let name = token.strip_prefix(rank.prefix()).unwrap_or(token);
            if !name.is_empty() {
                names[pos] = Some(name.to_string());
            }
        }
        Lineage { names }
    }

    /// Cleaned name at a rank, without the GTDB prefix.
    pub fn name_at(&self, rank: Rank) -> Option<&str> {
        self.names[rank.index()].as_deref()
    }

    /// Name at a rank with its GTDB prefix restored, as used for Sankey
    /// node labels.
    pub fn token_at(&self, rank: Rank) -> Option<String> {
        self.name_at(rank)
            .map(|name| format!("{}{}", rank.prefix(), name))
    }

    pub fn phylum(&self) -> Option<&str> {
        self.name_at(Rank::Phylum)
    }
}

/// Normalize a coverage-table genome id so it matches GTDB-Tk's
/// `user_genome` ids: dots become underscores and a `_fasta` suffix is
/// ensured.
pub fn normalize_genome_id(id: &str) -> String {
    let s = id.replace('.', "_");
    if s.ends_with("_fasta") {
        s
    } else {
        format!("{}_fasta", s)
    }
}

/// Shorten a CoverM sample column header to a plain sample name: first
/// whitespace-separated token, `.fastq` stripped.
pub fn clean_sample_label(header: &str) -> String {
    header
        .split_whitespace()
        .next()
        .unwrap_or(header)
        .replace(".fastq", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str =
        "d__Bacteria;p__Bacteroidota;c__Bacteroidia;o__Bacteroidales;f__Tannerellaceae;g__Parabacteroides;s__Parabacteroides distasonis";

    #[test]
    fn test_parse_full_lineage() {
        let lineage = Lineage::parse(FULL);
        assert_eq!(lineage.name_at(Rank::Domain), Some("Bacteria"));
        assert_eq!(lineage.phylum(), Some("Bacteroidota"));
        assert_eq!(lineage.name_at(Rank::Species), Some("Parabacteroides distasonis"));
        assert_eq!(lineage.token_at(Rank::Phylum).unwrap(), "p__Bacteroidota");
    }

    #[test]
    fn test_empty_ranks_are_none() {
        let lineage = Lineage::parse("d__Bacteria;p__Patescibacteria;c__;o__;f__;g__;s__");
        assert_eq!(lineage.name_at(Rank::Class), None);
        assert_eq!(lineage.name_at(Rank::Species), None);
    }

    #[test]
    fn test_normalize_genome_id() {
        assert_eq!(normalize_genome_id("bin.1"), "bin_1_fasta");
        assert_eq!(normalize_genome_id("bin_1_fasta"), "bin_1_fasta");
        assert_eq!(normalize_genome_id("bin.2.fasta"), "bin_2_fasta");
    }

    #[test]
    fn test_clean_sample_label() {
        assert_eq!(
            clean_sample_label("sample_A.fastq Relative Abundance (%)"),
            "sample_A"
        );
        assert_eq!(clean_sample_label("s1"), "s1");
    }
}
