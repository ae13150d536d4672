//! # Per-gene match data
//!
//! [`MatchData`] is the working set the diplotype search runs on: the gene's
//! positions, the sample's observations aligned to them, the haplotypes that
//! are still callable given missing data, and every per-strand assignment of
//! the sample's alleles. One `MatchData` is built per gene per call and
//! discarded afterwards.
use std::collections::HashMap;

use itertools::Itertools;
use log::debug;

use crate::{
    definition::{GeneDefinition, VariantLocus},
    io::vcf::SampleAllele,
    matcher::{allele_matches, WILDCARD},
};

/// A haplotype after marshalling: one concrete slot per retained position.
/// Slots a definition left open hold either the reference allele (with
/// assume-reference) or the [`WILDCARD`] token.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedHaplotype {
    pub name: String,
    pub alleles: Vec<String>,
}

/// One strand's allele assignment, rendered both as the canonical
/// `pos:allele;pos:allele` string and as the aligned allele list the
/// matcher compares position by position.
#[derive(Debug, Clone, PartialEq)]
pub struct StrandSeq {
    pub text: String,
    pub alleles: Vec<String>,
}

impl StrandSeq {
    fn new(positions: &[i64], alleles: Vec<String>) -> Self {
        let text = positions
            .iter()
            .zip(alleles.iter())
            .map(|(position, allele)| format!("{position}:{allele}"))
            .join(";");
        Self { text, alleles }
    }
}

/// One concrete assignment of the sample's alleles to two strands.
#[derive(Debug, Clone, PartialEq)]
pub struct StrandPair {
    pub strand_a: StrandSeq,
    pub strand_b: StrandSeq,
}

/// Fully prepared search instance for one gene. Construction never fails;
/// a gene without sample data simply produces no permutations.
#[derive(Debug)]
pub struct MatchData {
    pub gene: String,
    pub chromosome: String,
    /// The gene's positions, copied from the definition in order.
    pub positions: Vec<VariantLocus>,
    /// Sample observation aligned to each position, if any.
    pub sample_at: Vec<Option<SampleAllele>>,
    /// Definition positions with no sample data.
    pub missing_positions: Vec<i64>,
    /// Indices into `positions` that have sample data.
    pub retained: Vec<usize>,
    /// Haplotypes that survive marshalling, concrete at every retained position.
    pub haplotypes: Vec<PreparedHaplotype>,
    /// Names of haplotypes dropped because of missing positions.
    pub uncallable_haplotypes: Vec<String>,
    /// All per-strand assignments of the sample alleles, `2^h` entries for
    /// `h` unphased heterozygous sites.
    pub permutations: Vec<StrandPair>,
}

impl MatchData {
    pub fn new(
        definition: &GeneDefinition,
        sample: &HashMap<String, SampleAllele>,
        assume_reference: bool,
    ) -> Self {
        let mut sample_at = Vec::with_capacity(definition.variants.len());
        let mut missing_positions = Vec::new();
        let mut retained = Vec::new();
        for (i, locus) in definition.variants.iter().enumerate() {
            let key = format!("{}:{}", definition.chromosome, locus.vcf_position);
            match sample.get(&key) {
                Some(observed) => {
                    retained.push(i);
                    let mut observed = observed.clone();
                    observed.rsid = locus.rsid.clone();
                    sample_at.push(Some(observed));
                }
                None => {
                    missing_positions.push(locus.position);
                    sample_at.push(None);
                }
            }
        }

        let (haplotypes, uncallable_haplotypes) =
            marshall_haplotypes(definition, &sample_at, &retained, assume_reference);
        if !uncallable_haplotypes.is_empty() {
            debug!(
                "Gene {}: haplotypes {:?} are uncallable with {} missing position(s)",
                definition.gene,
                uncallable_haplotypes,
                missing_positions.len()
            );
        }

        let permutations = generate_permutations(definition, &sample_at, &retained);

        Self {
            gene: definition.gene.clone(),
            chromosome: definition.chromosome.clone(),
            positions: definition.variants.clone(),
            sample_at,
            missing_positions,
            retained,
            haplotypes,
            uncallable_haplotypes,
            permutations,
        }
    }

    /// The sample observations for this gene, in position order.
    pub fn observed_variants(&self) -> Vec<SampleAllele> {
        self.sample_at.iter().flatten().cloned().collect()
    }

    pub fn has_data(&self) -> bool {
        !self.permutations.is_empty()
    }
}

/// Decide which haplotypes survive the gene's missing positions, and fill
/// the open slots of the survivors. Without assume-reference, a haplotype
/// constraining any missing position is uncallable; with it, only
/// haplotypes declaring a non-reference allele there are.
fn marshall_haplotypes(
    definition: &GeneDefinition,
    sample_at: &[Option<SampleAllele>],
    retained: &[usize],
    assume_reference: bool,
) -> (Vec<PreparedHaplotype>, Vec<String>) {
    let mut haplotypes = Vec::new();
    let mut uncallable = Vec::new();

    'next_haplotype: for named_allele in &definition.named_alleles {
        for (i, locus) in definition.variants.iter().enumerate() {
            if sample_at[i].is_some() {
                continue;
            }
            // a literal wildcard slot constrains nothing, same as an open one
            if let Some(slot) = &named_allele.alleles[i] {
                if slot != WILDCARD
                    && (!assume_reference || !allele_matches(slot, &locus.reference))
                {
                    uncallable.push(named_allele.name.clone());
                    continue 'next_haplotype;
                }
            }
        }

        let alleles = retained
            .iter()
            .map(|&i| match &named_allele.alleles[i] {
                Some(slot) => slot.clone(),
                None if assume_reference => definition.variants[i].reference.clone(),
                None => WILDCARD.to_string(),
            })
            .collect();
        haplotypes.push(PreparedHaplotype {
            name: named_allele.name.clone(),
            alleles,
        });
    }

    (haplotypes, uncallable)
}

/// Expand the sample into per-strand assignments. Phased and homozygous
/// sites contribute one ordered pair, unphased heterozygous sites both
/// orderings; the permutation set is the cross-product over sites.
fn generate_permutations(
    definition: &GeneDefinition,
    sample_at: &[Option<SampleAllele>],
    retained: &[usize],
) -> Vec<StrandPair> {
    if retained.is_empty() {
        return Vec::new();
    }

    let mut site_positions = Vec::with_capacity(retained.len());
    let mut site_choices: Vec<Vec<(String, String)>> = Vec::with_capacity(retained.len());
    for &i in retained {
        let Some(observed) = &sample_at[i] else {
            continue;
        };
        let ordered = (observed.allele_a.clone(), observed.allele_b.clone());
        let choices = if observed.phased || !observed.is_heterozygous() {
            vec![ordered]
        } else {
            let flipped = (observed.allele_b.clone(), observed.allele_a.clone());
            vec![ordered, flipped]
        };
        site_positions.push(definition.variants[i].position);
        site_choices.push(choices);
    }

    site_choices
        .into_iter()
        .multi_cartesian_product()
        .map(|combo| {
            let (strand_a, strand_b): (Vec<String>, Vec<String>) = combo.into_iter().unzip();
            StrandPair {
                strand_a: StrandSeq::new(&site_positions, strand_a),
                strand_b: StrandSeq::new(&site_positions, strand_b),
            }
        })
        .collect()
}
