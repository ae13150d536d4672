//! # Haplotype patterns and the diplotype search
//!
//! Each callable haplotype is compiled into a positionwise pattern over the
//! gene's observed positions, then every sample permutation is tested: a
//! diplotype is an unordered pair of haplotypes where one matches strand a
//! and the other strand b of some permutation. Pairs are scored by how many
//! definition-allowed alleles the two haplotypes rule out.
use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};

use crate::{
    match_data::{MatchData, PreparedHaplotype, StrandSeq},
    results::{Diplotype, HaplotypeMatch},
};

/// Slot token matching any sample allele.
pub const WILDCARD: &str = ".?";

/// IUPAC ambiguity codes a definition may use for single-base slots.
fn iupac_expansion(code: char) -> Option<&'static [&'static str]> {
    match code {
        'R' => Some(&["A", "G"]),
        'Y' => Some(&["C", "T"]),
        'S' => Some(&["C", "G"]),
        'W' => Some(&["A", "T"]),
        'K' => Some(&["G", "T"]),
        'M' => Some(&["A", "C"]),
        'B' => Some(&["C", "G", "T"]),
        'D' => Some(&["A", "G", "T"]),
        'H' => Some(&["A", "C", "T"]),
        'V' => Some(&["A", "C", "G"]),
        'N' => Some(&["A", "C", "G", "T"]),
        _ => None,
    }
}

/// Does a haplotype slot accept an observed allele? The wildcard accepts
/// anything, an ambiguity code accepts its expansion, everything else is
/// literal string equality (indels included).
pub fn allele_matches(slot: &str, observed: &str) -> bool {
    if slot == WILDCARD || slot == observed {
        return true;
    }
    let mut chars = slot.chars();
    if let (Some(code), None) = (chars.next(), chars.next()) {
        if let Some(bases) = iupac_expansion(code) {
            return bases.contains(&observed);
        }
    }
    false
}

/// A haplotype compiled against the observed positions of one gene. The
/// `pattern` string is the regex-style interchange form; matching itself is
/// positionwise comparison, never regex evaluation.
#[derive(Debug, Clone)]
pub struct HaplotypePattern {
    pub name: String,
    pub pattern: String,
    pub score: u32,
    slots: Vec<String>,
}

impl HaplotypePattern {
    pub fn compile(haplotype: &PreparedHaplotype, data: &MatchData) -> Self {
        let mut pattern_parts = Vec::with_capacity(haplotype.alleles.len());
        let mut score = 0u32;

        for (slot, &position_idx) in haplotype.alleles.iter().zip(data.retained.iter()) {
            let locus = &data.positions[position_idx];
            pattern_parts.push(format!("{}:{}", locus.position, render_slot(slot)));
            score += specificity(slot, &locus.alleles);
        }

        Self {
            name: haplotype.name.clone(),
            pattern: pattern_parts.join(";"),
            score,
            slots: haplotype.alleles.clone(),
        }
    }

    pub fn matches(&self, strand: &StrandSeq) -> bool {
        self.slots.len() == strand.alleles.len()
            && self
                .slots
                .iter()
                .zip(strand.alleles.iter())
                .all(|(slot, observed)| allele_matches(slot, observed))
    }
}

fn render_slot(slot: &str) -> String {
    let mut chars = slot.chars();
    if let (Some(code), None) = (chars.next(), chars.next()) {
        if let Some(bases) = iupac_expansion(code) {
            return format!("({})", bases.join("|"));
        }
    }
    slot.to_string()
}

/// The number of definition-allowed alleles at a locus that a slot rules
/// out. A narrow literal at a multi-allelic locus scores high, the wildcard
/// and single-allele loci score zero.
fn specificity(slot: &str, allowed: &[String]) -> u32 {
    if slot == WILDCARD {
        return 0;
    }
    let matched = allowed
        .iter()
        .filter(|allele| allele_matches(slot, allele))
        .count();
    (allowed.len() - matched) as u32
}

/// Everything the search learned about one gene: the surviving diplotypes
/// and, for reporting, every callable haplotype with the strand sequences
/// it was consistent with.
#[derive(Debug)]
pub struct GeneMatches {
    pub diplotypes: Vec<Diplotype>,
    pub haplotypes: Vec<HaplotypeMatch>,
}

/// Run the diplotype search over a prepared gene.
pub fn match_gene(data: &MatchData, top_candidate_only: bool) -> GeneMatches {
    let patterns: Vec<HaplotypePattern> = data
        .haplotypes
        .iter()
        .map(|haplotype| HaplotypePattern::compile(haplotype, data))
        .collect();

    // Distinct strand sequences across all permutations, keyed by canonical text.
    let mut strands: BTreeMap<&str, &StrandSeq> = BTreeMap::new();
    for pair in &data.permutations {
        strands.insert(pair.strand_a.text.as_str(), &pair.strand_a);
        strands.insert(pair.strand_b.text.as_str(), &pair.strand_b);
    }

    let matched_texts: Vec<BTreeSet<&str>> = patterns
        .iter()
        .map(|pattern| {
            strands
                .values()
                .filter(|strand| pattern.matches(strand))
                .map(|strand| strand.text.as_str())
                .collect()
        })
        .collect();

    let haplotype_matches: Vec<HaplotypeMatch> = patterns
        .iter()
        .zip(matched_texts.iter())
        .map(|(pattern, texts)| HaplotypeMatch {
            name: pattern.name.clone(),
            sequences: texts.iter().map(|text| text.to_string()).collect(),
        })
        .collect();

    // Unordered pairs, deduplicated by name pair; the first witnessing
    // permutation is kept for the trace log.
    let mut pairs: BTreeMap<(usize, usize), (String, String)> = BTreeMap::new();
    for pair in &data.permutations {
        for (i, _) in patterns.iter().enumerate() {
            if !matched_texts[i].contains(pair.strand_a.text.as_str()) {
                continue;
            }
            for (j, _) in patterns.iter().enumerate() {
                if !matched_texts[j].contains(pair.strand_b.text.as_str()) {
                    continue;
                }
                let key = if patterns[i].name <= patterns[j].name {
                    (i, j)
                } else {
                    (j, i)
                };
                pairs
                    .entry(key)
                    .or_insert_with(|| (pair.strand_a.text.clone(), pair.strand_b.text.clone()));
            }
        }
    }

    let mut diplotypes: Vec<Diplotype> = pairs
        .into_iter()
        .map(|((i, j), witness)| {
            trace!(
                "Gene {}: {}/{} witnessed by ({}, {})",
                data.gene,
                patterns[i].name,
                patterns[j].name,
                witness.0,
                witness.1
            );
            Diplotype {
                name: format!("{}/{}", patterns[i].name, patterns[j].name),
                score: patterns[i].score + patterns[j].score,
                haplotype_1: haplotype_matches[i].clone(),
                haplotype_2: haplotype_matches[j].clone(),
            }
        })
        .collect();

    diplotypes.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    if top_candidate_only {
        if let Some(max_score) = diplotypes.first().map(|d| d.score) {
            diplotypes.retain(|d| d.score == max_score);
        }
    }
    debug!(
        "Gene {}: {} diplotype(s) from {} permutation(s), {} callable haplotype(s)",
        data.gene,
        diplotypes.len(),
        data.permutations.len(),
        patterns.len()
    );

    GeneMatches {
        diplotypes,
        haplotypes: haplotype_matches,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::definition::tests::{locus, named_allele};
    use crate::definition::GeneDefinition;
    use crate::io::vcf::SampleAllele;

    fn gene(variants: Vec<crate::definition::VariantLocus>, named: Vec<crate::definition::NamedAllele>) -> GeneDefinition {
        GeneDefinition {
            gene: "CYP9Z9".to_string(),
            chromosome: "chr7".to_string(),
            variants,
            named_alleles: named,
        }
    }

    fn site(position: i64, a: &str, b: &str, phased: bool) -> (String, SampleAllele) {
        let sample = SampleAllele {
            chromosome: "chr7".to_string(),
            position,
            rsid: None,
            allele_a: a.to_string(),
            allele_b: b.to_string(),
            phased,
            vcf_alleles: vec![a.to_string(), b.to_string()],
        };
        (sample.key(), sample)
    }

    fn prepare(
        definition: &GeneDefinition,
        sites: Vec<(String, SampleAllele)>,
        assume_reference: bool,
    ) -> MatchData {
        let sample: HashMap<String, SampleAllele> = sites.into_iter().collect();
        MatchData::new(definition, &sample, assume_reference)
    }

    #[test]
    fn wildcard_and_iupac_matching() {
        assert!(allele_matches(WILDCARD, "A"));
        assert!(allele_matches(WILDCARD, "CAT"));
        assert!(allele_matches("Y", "C"));
        assert!(allele_matches("Y", "T"));
        assert!(!allele_matches("Y", "A"));
        assert!(allele_matches("CAT", "CAT"));
        assert!(!allele_matches("A", "T"));
    }

    #[test]
    fn pattern_renders_alternations_and_wildcards() {
        let definition = gene(
            vec![locus(100, "A", &["A", "T"]), locus(200, "C", &["C", "T"])],
            vec![named_allele("*9", &[None, Some("Y")])],
        );
        let data = prepare(
            &definition,
            vec![site(100, "A", "A", true), site(200, "C", "C", true)],
            false,
        );
        let pattern = HaplotypePattern::compile(&data.haplotypes[0], &data);

        assert_eq!("100:.?;200:(C|T)", pattern.pattern);
    }

    #[test]
    fn single_allele_locus_contributes_zero_specificity() {
        let definition = gene(
            vec![locus(100, "A", &["A"]), locus(200, "G", &["G", "C", "T"])],
            vec![named_allele("*1", &[Some("A"), Some("G")])],
        );
        let data = prepare(
            &definition,
            vec![site(100, "A", "A", true), site(200, "G", "G", true)],
            false,
        );
        let pattern = HaplotypePattern::compile(&data.haplotypes[0], &data);

        // 0 from the invariant locus, 2 ruled out at the tri-allelic one
        assert_eq!(2, pattern.score);
    }

    #[test]
    fn reference_only_sample_calls_reference_diplotype() {
        let definition = gene(
            vec![locus(100, "A", &["A", "T"]), locus(200, "G", &["G"])],
            vec![
                named_allele("*1", &[Some("A"), Some("G")]),
                named_allele("*2", &[Some("T"), Some("G")]),
            ],
        );
        let data = prepare(
            &definition,
            vec![site(100, "A", "A", true), site(200, "G", "G", true)],
            false,
        );
        let matches = match_gene(&data, true);

        assert_eq!(1, matches.diplotypes.len());
        let diplotype = &matches.diplotypes[0];
        assert_eq!("*1/*1", diplotype.name);
        // *1 scores 1 at the bi-allelic locus, summed over both strands
        assert_eq!(2, diplotype.score);
        assert!(matches
            .haplotypes
            .iter()
            .find(|h| h.name == "*2")
            .unwrap()
            .sequences
            .is_empty());
    }

    #[test]
    fn unphased_heterozygote_yields_single_unordered_pair() {
        let definition = gene(
            vec![locus(100, "A", &["A", "T"])],
            vec![
                named_allele("*1", &[Some("A")]),
                named_allele("*2", &[Some("T")]),
            ],
        );
        let data = prepare(&definition, vec![site(100, "A", "T", false)], false);
        assert_eq!(2, data.permutations.len());

        let matches = match_gene(&data, true);
        // both orderings witness the same unordered pair exactly once
        assert_eq!(1, matches.diplotypes.len());
        assert_eq!("*1/*2", matches.diplotypes[0].name);
    }

    #[test]
    fn top_candidate_filter_keeps_only_max_score() {
        let definition = gene(
            vec![locus(100, "A", &["A", "T", "G"])],
            vec![
                named_allele("*1", &[Some("A")]),
                named_allele("*4", &[None]),
            ],
        );
        let data = prepare(&definition, vec![site(100, "A", "A", true)], false);

        // *1/*1 scores 4, *1/*4 scores 2, *4/*4 scores 0
        let all = match_gene(&data, false);
        let names: Vec<&str> = all.diplotypes.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(vec!["*1/*1", "*1/*4", "*4/*4"], names);
        let scores: Vec<u32> = all.diplotypes.iter().map(|d| d.score).collect();
        assert_eq!(vec![4, 2, 0], scores);

        let top = match_gene(&data, true);
        assert_eq!(1, top.diplotypes.len());
        assert_eq!("*1/*1", top.diplotypes[0].name);
    }

    #[test]
    fn empty_permutations_produce_no_diplotypes() {
        let definition = gene(
            vec![locus(100, "A", &["A", "T"])],
            vec![named_allele("*1", &[Some("A")])],
        );
        let data = prepare(&definition, Vec::new(), false);
        let matches = match_gene(&data, true);

        assert!(matches.diplotypes.is_empty());
    }

    #[test]
    fn diplotype_order_is_score_then_name() {
        let definition = gene(
            vec![locus(100, "A", &["A", "T", "G"])],
            vec![
                named_allele("*2", &[Some("T")]),
                named_allele("*3", &[Some("G")]),
            ],
        );
        let data = prepare(&definition, vec![site(100, "T", "G", false)], false);
        let matches = match_gene(&data, false);

        // only the heterozygous pair matches either permutation
        assert_eq!(1, matches.diplotypes.len());
        assert_eq!("*2/*3", matches.diplotypes[0].name);
        assert_eq!(4, matches.diplotypes[0].score);
    }
}
