//! Export command implementation

use anyhow::{Context, Result};
use chum_index::PipelineConfig;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::helpers::build_catalog;

/// Writes one search document per package as a JSON array
pub fn cmd_export(config: PipelineConfig, output: Option<PathBuf>, pretty: bool) -> Result<()> {
    let catalog = build_catalog(config)?.catalog;
    let documents = catalog.search_documents();

    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, &documents)?;
    } else {
        serde_json::to_writer(&mut writer, &documents)?;
    }
    writeln!(writer)?;
    writer.flush().context("Failed to write search documents")?;

    if let Some(path) = output {
        log::info!("Wrote {} search documents to {:?}", documents.len(), path);
    }
    Ok(())
}
