//! # Command line interface for `starcall`
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use crate::config::{CallerConfig, ReportFormat};

#[derive(Parser)]
#[command(
    name = "starcall",
    author,
    version,
    about = "Star-allele diplotype calling from a single-sample VCF",
    long_about = None
)]
pub struct Cli {
    /// Directory of allele definition files, one JSON file per gene
    #[arg(short, long)]
    pub definitions: String,

    /// Single-sample variant call file to genotype (VCF)
    #[arg(short, long)]
    pub vcf: String,

    /// Sample name to record in the result
    #[arg(short, long)]
    pub sample: Option<String>,

    /// Treat positions without sample data as homozygous reference
    #[arg(long, default_value_t = false)]
    pub assume_reference: bool,

    /// Report every matching diplotype instead of only the top-scoring ones
    #[arg(long, default_value_t = false)]
    pub all_candidates: bool,

    /// List all callable haplotypes per gene, matched or not
    #[arg(long, default_value_t = false)]
    pub show_unmatched: bool,

    /// Format for the downstream report renderer (html or pdf)
    #[arg(long, default_value = "html", value_parser = report_format_in_vocabulary)]
    pub report_format: ReportFormat,
}

impl Cli {
    pub fn caller_config(&self) -> CallerConfig {
        CallerConfig {
            assume_reference: self.assume_reference,
            top_candidate_only: !self.all_candidates,
            always_show_unmatched_haplotypes: self.show_unmatched,
            report_format: self.report_format,
        }
    }

    pub fn sample_name(&self) -> Result<String> {
        if let Some(name) = &self.sample {
            Ok(name.clone())
        } else {
            let name = sample_name_from_path(&self.vcf)?;
            info!("Inferring sample name from filename: {name}");
            Ok(name)
        }
    }
}

fn report_format_in_vocabulary(s: &str) -> Result<ReportFormat, crate::error::Error> {
    s.parse()
}

/// Infer a sample name from the filepath of a variant file
///
/// # Examples
///
/// ```
/// let filepath = "./path/to/NA12878.vcf";
/// let sample_name = starcall::cli::sample_name_from_path(filepath).unwrap();
///
/// assert_eq!("NA12878", sample_name);
/// ```
pub fn sample_name_from_path(filepath: &str) -> Result<String> {
    let context = || format!("Could not infer sample name from path {filepath}");
    let name = Path::new(filepath)
        .file_stem()
        .with_context(context)?
        .to_str()
        .with_context(context)?;

    Ok(String::from(name))
}
