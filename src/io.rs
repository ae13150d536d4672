//! # Input handling for `starcall`
//!
//! Allele definitions arrive as one JSON file per gene ([`json`]), sample
//! genotypes as a single-sample VCF ([`vcf`]).
pub mod json;
pub mod vcf;
