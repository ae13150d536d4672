//! # Reading sample genotypes from a single-sample VCF
//!
//! Only the sites listed in the caller's positions of interest are kept;
//! everything else in the file is skipped without comment. Genotypes are
//! resolved to literal allele strings (indels included) so the matcher can
//! work on string equality alone.
use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::Read,
    path::Path,
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CHROM_COLUMN: usize = 0;
const POS_COLUMN: usize = 1;
const REF_COLUMN: usize = 3;
const ALT_COLUMN: usize = 4;
const FORMAT_COLUMN: usize = 8;
const SAMPLE_COLUMN: usize = 9;
const MIN_COLUMNS: usize = 10;

/// The sample's observed genotype at one site. `allele_a` and `allele_b` are
/// the two strand alleles as literal strings; `vcf_alleles` preserves the
/// full REF+ALT list the site declared, for provenance. Homozygous calls are
/// always `phased`, heterozygous calls only when the genotype used `|`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleAllele {
    pub chromosome: String,
    pub position: i64,
    /// rsID of the definition position this site was aligned to. Empty as
    /// read from the file; filled in during per-gene projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsid: Option<String>,
    pub allele_a: String,
    pub allele_b: String,
    pub phased: bool,
    pub vcf_alleles: Vec<String>,
}

impl SampleAllele {
    /// Key used to align sample data with definition positions.
    pub fn key(&self) -> String {
        format!("{}:{}", self.chromosome, self.position)
    }

    pub fn is_heterozygous(&self) -> bool {
        self.allele_a != self.allele_b
    }
}

/// Read the single-sample VCF at `path`, keeping only sites whose
/// `chromosome:position` key is in `positions_of_interest`.
pub fn read_sample_alleles<P: AsRef<Path>>(
    path: P,
    positions_of_interest: &HashSet<String>,
) -> Result<HashMap<String, SampleAllele>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingInput {
            path: path.to_path_buf(),
        });
    }
    sample_alleles_from_reader(File::open(path)?, positions_of_interest)
}

/// Same as [`read_sample_alleles`], over any reader.
pub fn sample_alleles_from_reader<R: Read>(
    reader: R,
    positions_of_interest: &HashSet<String>,
) -> Result<HashMap<String, SampleAllele>> {
    let mut vcf_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);

    let mut sample_alleles: HashMap<String, SampleAllele> = HashMap::new();
    for result in vcf_reader.records() {
        let record = result.map_err(|e| Error::VariantParse {
            line: e.position().map_or(0, csv::Position::line),
            reason: e.to_string(),
        })?;
        let line = record.position().map_or(0, csv::Position::line);

        if record.len() < MIN_COLUMNS {
            return Err(parse_error(
                line,
                format!(
                    "expected at least {MIN_COLUMNS} tab-separated columns, found {}",
                    record.len()
                ),
            ));
        }

        let chromosome = &record[CHROM_COLUMN];
        let position: i64 = record[POS_COLUMN].parse().map_err(|_| {
            parse_error(line, format!("invalid position '{}'", &record[POS_COLUMN]))
        })?;

        let key = format!("{chromosome}:{position}");
        if !positions_of_interest.contains(&key) {
            continue;
        }

        let mut vcf_alleles = vec![record[REF_COLUMN].to_string()];
        if &record[ALT_COLUMN] != "." {
            vcf_alleles.extend(record[ALT_COLUMN].split(',').map(str::to_string));
        }

        let gt_field = genotype_field(&record, line)?;
        let Some((allele_a, allele_b, phased)) = resolve_genotype(gt_field, &vcf_alleles, line)?
        else {
            debug!("No genotype called at {key}, treating site as missing");
            continue;
        };

        let sample_allele = SampleAllele {
            chromosome: chromosome.to_string(),
            position,
            rsid: None,
            allele_a,
            allele_b,
            phased,
            vcf_alleles,
        };
        if sample_alleles.insert(key.clone(), sample_allele).is_some() {
            debug!("Duplicate record for {key}, keeping the later one");
        }
    }

    Ok(sample_alleles)
}

fn parse_error(line: u64, reason: String) -> Error {
    Error::VariantParse { line, reason }
}

/// Locate GT in the FORMAT column and pull the matching entry out of the
/// first (only) sample column.
fn genotype_field<'a>(record: &'a csv::StringRecord, line: u64) -> Result<&'a str> {
    let gt_index = record[FORMAT_COLUMN]
        .split(':')
        .position(|field| field == "GT")
        .ok_or_else(|| parse_error(line, "no GT entry in FORMAT column".to_string()))?;

    record[SAMPLE_COLUMN]
        .split(':')
        .nth(gt_index)
        .ok_or_else(|| parse_error(line, "sample column shorter than FORMAT".to_string()))
}

/// Turn a GT field into two strand alleles and a phasing flag. Returns
/// `None` when the genotype is uncalled (`.`, `./.`, `.|.` or half-calls).
/// Haploid genotypes are treated as homozygous, and homozygous calls are
/// phased regardless of separator.
fn resolve_genotype(
    gt_field: &str,
    vcf_alleles: &[String],
    line: u64,
) -> Result<Option<(String, String, bool)>> {
    let indices: Vec<&str> = gt_field.split(['/', '|']).collect();
    if indices.len() > 2 {
        return Err(parse_error(
            line,
            format!("expected a diploid genotype, found '{gt_field}'"),
        ));
    }
    if indices.iter().any(|index| *index == ".") {
        return Ok(None);
    }

    let mut resolved = Vec::with_capacity(2);
    for index in &indices {
        let index: usize = index
            .parse()
            .map_err(|_| parse_error(line, format!("invalid genotype field '{gt_field}'")))?;
        let allele = vcf_alleles.get(index).ok_or_else(|| {
            parse_error(
                line,
                format!("genotype '{gt_field}' indexes allele {index}, but site declares {}", vcf_alleles.len()),
            )
        })?;
        resolved.push(allele.clone());
    }

    let allele_a = resolved[0].clone();
    let allele_b = resolved.get(1).cloned().unwrap_or_else(|| allele_a.clone());
    let phased = allele_a == allele_b || gt_field.contains('|');

    Ok(Some((allele_a, allele_b, phased)))
}
