//! # Allele definitions
//!
//! Module containing the structs that describe how star alleles look on the
//! genome. A [`GeneDefinition`] lists the positions a gene depends on
//! ([`VariantLocus`]) and the named haplotypes defined over those positions
//! ([`NamedAllele`]). The [`DefinitionStore`] owns one definition per gene,
//! is built once from a directory of JSON files, and is immutable afterwards.
use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    io::json,
};

/// One genomic position a gene definition depends on. `position` is the
/// coordinate used in canonical sequence strings, `vcf_position` is the
/// coordinate the sample file reports the site at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantLocus {
    pub position: i64,
    #[serde(rename = "vcfPosition")]
    pub vcf_position: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsid: Option<String>,
    #[serde(rename = "ref")]
    pub reference: String,
    /// Every allele the definition allows at this site.
    pub alleles: Vec<String>,
}

/// A named haplotype (e.g. `*1`, `*17`). The `alleles` array is parallel to
/// the gene's position list; `None` means the haplotype does not constrain
/// that position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedAllele {
    pub name: String,
    pub alleles: Vec<Option<String>>,
}

/// Definition of a single gene: its chromosome, the ordered positions it
/// depends on, and its named haplotypes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneDefinition {
    pub gene: String,
    pub chromosome: String,
    pub variants: Vec<VariantLocus>,
    #[serde(rename = "namedAlleles")]
    pub named_alleles: Vec<NamedAllele>,
}

impl GeneDefinition {
    /// Every [`NamedAllele`] must carry exactly one slot per position.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for named_allele in &self.named_alleles {
            if named_allele.alleles.len() != self.variants.len() {
                return Err(format!(
                    "named allele '{}' of gene {} has {} allele slots, expected {}",
                    named_allele.name,
                    self.gene,
                    named_allele.alleles.len(),
                    self.variants.len()
                ));
            }
        }
        Ok(())
    }

    /// `chromosome:vcf_position` keys for every site this gene depends on.
    pub fn location_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.variants
            .iter()
            .map(|locus| format!("{}:{}", self.chromosome, locus.vcf_position))
    }
}

/// All gene definitions known to a caller, keyed by gene name. Iteration
/// order is lexicographic by name, which fixes the gene order of results.
#[derive(Debug, Default)]
pub struct DefinitionStore {
    genes: BTreeMap<String, GeneDefinition>,
}

impl DefinitionStore {
    /// Load every `*.json` definition file in `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::MissingInput {
                path: dir.to_path_buf(),
            });
        }

        let mut store = Self::default();
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        entries.sort();

        for path in entries {
            let definition = json::definition_from_json(&path)?;
            store.insert(definition).map_err(|reason| Error::DefinitionLoad {
                path: path.clone(),
                reason,
            })?;
        }

        info!("Loaded allele definitions for {} gene(s)", store.len());
        Ok(store)
    }

    /// Add a validated definition. Rejects inconsistent allele arrays and
    /// duplicate gene names.
    pub fn insert(&mut self, definition: GeneDefinition) -> std::result::Result<(), String> {
        definition.validate()?;
        if self.genes.contains_key(&definition.gene) {
            return Err(format!("duplicate definition for gene {}", definition.gene));
        }
        self.genes.insert(definition.gene.clone(), definition);
        Ok(())
    }

    pub fn genes(&self) -> impl Iterator<Item = &GeneDefinition> {
        self.genes.values()
    }

    pub fn get(&self, gene: &str) -> Option<&GeneDefinition> {
        self.genes.get(gene)
    }

    pub fn positions_of(&self, gene: &str) -> Option<&[VariantLocus]> {
        self.genes.get(gene).map(|def| def.variants.as_slice())
    }

    pub fn haplotypes_of(&self, gene: &str) -> Option<&[NamedAllele]> {
        self.genes.get(gene).map(|def| def.named_alleles.as_slice())
    }

    pub fn chromosome_of(&self, gene: &str) -> Option<&str> {
        self.genes.get(gene).map(|def| def.chromosome.as_str())
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Union of `chromosome:position` keys across all genes, used to filter
    /// the sample variant file down to the sites the matcher cares about.
    pub fn locations_of_interest(&self) -> HashSet<String> {
        self.genes
            .values()
            .flat_map(|def| def.location_keys())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn locus(position: i64, reference: &str, alleles: &[&str]) -> VariantLocus {
        VariantLocus {
            position,
            vcf_position: position,
            rsid: None,
            reference: reference.to_string(),
            alleles: alleles.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub(crate) fn named_allele(name: &str, alleles: &[Option<&str>]) -> NamedAllele {
        NamedAllele {
            name: name.to_string(),
            alleles: alleles.iter().map(|a| a.map(str::to_string)).collect(),
        }
    }

    pub(crate) fn two_locus_gene() -> GeneDefinition {
        GeneDefinition {
            gene: "CYP9Z9".to_string(),
            chromosome: "chr7".to_string(),
            variants: vec![locus(100, "A", &["A", "T"]), locus(200, "G", &["G", "C"])],
            named_alleles: vec![
                named_allele("*1", &[Some("A"), Some("G")]),
                named_allele("*2", &[Some("T"), None]),
                named_allele("*3", &[Some("A"), Some("C")]),
            ],
        }
    }

    #[test]
    fn validate_accepts_parallel_arrays() {
        assert!(two_locus_gene().validate().is_ok());
    }

    #[test]
    fn validate_rejects_length_mismatch() {
        let mut definition = two_locus_gene();
        definition.named_alleles[1].alleles.push(None);
        let reason = definition.validate().unwrap_err();
        assert!(reason.contains("*2"));
    }

    #[test]
    fn insert_rejects_duplicate_gene() {
        let mut store = DefinitionStore::default();
        store.insert(two_locus_gene()).unwrap();
        assert!(store.insert(two_locus_gene()).is_err());
    }

    #[test]
    fn locations_of_interest_unions_all_genes() {
        let mut store = DefinitionStore::default();
        store.insert(two_locus_gene()).unwrap();
        let mut other = two_locus_gene();
        other.gene = "CYP8X8".to_string();
        other.chromosome = "chr3".to_string();
        store.insert(other).unwrap();

        let locations = store.locations_of_interest();
        assert_eq!(4, locations.len());
        assert!(locations.contains("chr7:100"));
        assert!(locations.contains("chr3:200"));
    }

    #[test]
    fn gene_iteration_is_sorted_by_name() {
        let mut store = DefinitionStore::default();
        let mut zeta = two_locus_gene();
        zeta.gene = "ZGENE".to_string();
        store.insert(zeta).unwrap();
        store.insert(two_locus_gene()).unwrap();

        let names: Vec<&str> = store.genes().map(|def| def.gene.as_str()).collect();
        assert_eq!(vec!["CYP9Z9", "ZGENE"], names);
    }
}
