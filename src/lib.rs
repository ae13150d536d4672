//! # starcall
//!
//! Star-allele diplotype calling for pharmacogenes. Given a library of
//! allele definitions (per gene: the genomic positions it depends on and the
//! named haplotypes defined over them) and a single-sample variant call
//! file, `starcall` enumerates candidate haplotype pairs against the two
//! sample strands, scores them by specificity, and reports the best matches
//! per gene together with diagnostic metadata.
pub mod cli;
pub mod config;
pub mod definition;
pub mod error;
pub mod io;
pub mod match_data;
pub mod matcher;
pub mod results;

use std::path::Path;

use log::{debug, info};

use crate::{
    config::CallerConfig,
    definition::DefinitionStore,
    error::Result,
    match_data::MatchData,
    results::{CallResult, ResultBuilder},
};

/// The matcher itself: an immutable bundle of definitions and configuration.
/// Construction is cheap; a caller may share one instance across threads and
/// run concurrent calls on distinct input files, since every call owns its
/// per-gene working data and its result.
#[derive(Debug)]
pub struct DiplotypeCaller {
    store: DefinitionStore,
    config: CallerConfig,
}

impl DiplotypeCaller {
    pub fn new(store: DefinitionStore, config: CallerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    pub fn config(&self) -> &CallerConfig {
        &self.config
    }

    /// Call diplotypes for every known gene from the single-sample variant
    /// file at `vcf_path`. A gene without usable sample data contributes an
    /// empty call with its positions listed as missing; only I/O and parse
    /// problems are errors.
    pub fn call<P: AsRef<Path>>(&self, vcf_path: P) -> Result<CallResult> {
        self.call_named(vcf_path, None)
    }

    /// Same as [`call`](Self::call), recording `sample` in the result metadata.
    pub fn call_named<P: AsRef<Path>>(
        &self,
        vcf_path: P,
        sample: Option<&str>,
    ) -> Result<CallResult> {
        let vcf_path = vcf_path.as_ref();
        let locations = self.store.locations_of_interest();
        let sample_alleles = io::vcf::read_sample_alleles(vcf_path, &locations)?;
        info!(
            "Read {} of {} site(s) of interest from {}",
            sample_alleles.len(),
            locations.len(),
            vcf_path.display()
        );

        let mut builder = ResultBuilder::new(&vcf_path.to_string_lossy(), sample);
        for definition in self.store.genes() {
            let data = MatchData::new(definition, &sample_alleles, self.config.assume_reference);
            debug!(
                "Gene {}: {} of {} position(s) observed",
                definition.gene,
                data.retained.len(),
                data.positions.len()
            );
            let matches = matcher::match_gene(&data, self.config.top_candidate_only);
            builder.add_gene_call(
                &data,
                matches,
                self.config.always_show_unmatched_haplotypes,
            );
        }

        Ok(builder.build())
    }
}
