//! # Runtime configuration for the diplotype caller
use std::str::FromStr;

use crate::error::Error;

/// Output format vocabulary understood by the downstream report renderer.
/// The matcher itself never renders anything; it only validates the value
/// so that a bad format fails before any work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Html,
    Pdf,
}

impl ReportFormat {
    pub fn name(&self) -> &str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(ReportFormat::Html),
            "pdf" => Ok(ReportFormat::Pdf),
            _ => Err(Error::Configuration {
                option: "report format",
                value: s.to_string(),
            }),
        }
    }
}

/// Options controlling a call. The matcher is immutable after construction,
/// so one config is shared by every `call()` on the same caller.
#[derive(Debug, Clone)]
pub struct CallerConfig {
    /// Treat positions without sample data as homozygous reference and fill
    /// unconstrained haplotype slots with the reference allele.
    pub assume_reference: bool,
    /// Return only the diplotypes with the maximum score.
    pub top_candidate_only: bool,
    /// List every callable haplotype in a gene call, not only the ones that
    /// appear in a diplotype. Reporting-side only; does not affect the search.
    pub always_show_unmatched_haplotypes: bool,
    /// Format the downstream renderer should produce.
    pub report_format: ReportFormat,
}

impl Default for CallerConfig {
    fn default() -> Self {
        Self {
            assume_reference: false,
            top_candidate_only: true,
            always_show_unmatched_haplotypes: false,
            report_format: ReportFormat::Html,
        }
    }
}
