//! # Result container
//!
//! The structures returned by a call, shaped for serialization: per-gene
//! calls with their diplotypes, observed variants and diagnostic lists,
//! plus call-level metadata. Serialization format is the caller's concern;
//! everything here round-trips through serde unchanged.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{io::vcf::SampleAllele, match_data::MatchData, matcher::GeneMatches};

/// A named haplotype together with the sample strand sequences it was
/// consistent with. Sequences are kept sorted, so equal calls serialize
/// identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaplotypeMatch {
    pub name: String,
    pub sequences: Vec<String>,
}

/// An unordered pair of matched haplotypes; `haplotype_1` carries the
/// lexicographically smaller name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diplotype {
    pub name: String,
    pub score: u32,
    #[serde(rename = "haplotype1")]
    pub haplotype_1: HaplotypeMatch,
    #[serde(rename = "haplotype2")]
    pub haplotype_2: HaplotypeMatch,
}

/// Everything the matcher has to say about one gene. A gene with no usable
/// sample data still gets a call, with empty diplotypes and its positions
/// listed as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneCall {
    pub gene: String,
    pub chromosome: String,
    pub diplotypes: Vec<Diplotype>,
    pub haplotypes: Vec<HaplotypeMatch>,
    pub variants: Vec<SampleAllele>,
    pub missing_positions: Vec<i64>,
    pub uncallable_haplotypes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub input_filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// The full outcome of one call, owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    pub metadata: Metadata,
    pub gene_calls: Vec<GeneCall>,
}

/// Accumulates per-gene calls for one invocation.
#[derive(Debug)]
pub struct ResultBuilder {
    metadata: Metadata,
    gene_calls: Vec<GeneCall>,
}

impl ResultBuilder {
    pub fn new(input_filename: &str, sample: Option<&str>) -> Self {
        Self {
            metadata: Metadata {
                input_filename: input_filename.to_string(),
                sample: sample.map(str::to_string),
                timestamp: Utc::now(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            gene_calls: Vec::new(),
        }
    }

    /// Assemble one gene's call from its prepared data and search outcome.
    /// Unless `always_show_unmatched` is set, only haplotypes that appear
    /// in a diplotype are listed.
    pub fn add_gene_call(
        &mut self,
        data: &MatchData,
        matches: GeneMatches,
        always_show_unmatched: bool,
    ) {
        let GeneMatches {
            diplotypes,
            haplotypes,
        } = matches;
        let mut haplotypes: Vec<HaplotypeMatch> = if always_show_unmatched {
            haplotypes
        } else {
            haplotypes
                .into_iter()
                .filter(|haplotype| {
                    diplotypes.iter().any(|diplotype| {
                        diplotype.haplotype_1.name == haplotype.name
                            || diplotype.haplotype_2.name == haplotype.name
                    })
                })
                .collect()
        };
        haplotypes.sort_by(|a, b| a.name.cmp(&b.name));

        self.gene_calls.push(GeneCall {
            gene: data.gene.clone(),
            chromosome: data.chromosome.clone(),
            diplotypes,
            haplotypes,
            variants: data.observed_variants(),
            missing_positions: data.missing_positions.clone(),
            uncallable_haplotypes: data.uncallable_haplotypes.clone(),
        });
    }

    pub fn build(self) -> CallResult {
        CallResult {
            metadata: self.metadata,
            gene_calls: self.gene_calls,
        }
    }
}
