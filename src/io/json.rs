use std::{fs::File, io::BufReader, path::Path};

use crate::{
    definition::GeneDefinition,
    error::{Error, Result},
};

/// Read a single gene's allele definition from the json file at `path`.
/// The json holds the gene name, its chromosome, the variant positions and
/// the named haplotypes, e.g.:
/// `
/// {
///     "gene": "CYP2C19",
///     "chromosome": "chr10",
///     "variants": [ {"position": 94781859, "vcfPosition": 94781859, "rsid": "rs4244285", "ref": "G", "alleles": ["G", "A"]} ],
///     "namedAlleles": [ {"name": "*1", "alleles": ["G"]}, {"name": "*2", "alleles": ["A"]} ]
/// }
/// `
pub fn definition_from_json<P: AsRef<Path>>(path: P) -> Result<GeneDefinition> {
    let file = File::open(&path).map_err(|e| Error::DefinitionLoad {
        path: path.as_ref().to_path_buf(),
        reason: format!("could not read file: {e}"),
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| Error::DefinitionLoad {
        path: path.as_ref().to_path_buf(),
        reason: format!("could not deserialize json: {e}"),
    })
}
