use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use starcall::{cli::Cli, definition::DefinitionStore, DiplotypeCaller};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.caller_config();
    let sample_name = cli.sample_name()?;

    let store = DefinitionStore::from_dir(&cli.definitions)
        .with_context(|| format!("Error loading allele definitions from {}", cli.definitions))?;
    info!(
        "Calling diplotypes for sample {sample_name} with report format '{}'",
        config.report_format.name()
    );

    let caller = DiplotypeCaller::new(store, config);
    let result = caller
        .call_named(&cli.vcf, Some(&sample_name))
        .with_context(|| format!("Error calling diplotypes from {}", cli.vcf))?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, &result)?;
    writeln!(handle)?;

    Ok(())
}
