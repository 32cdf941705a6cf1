//! JSON-lines export of harvested leads

use crate::extract::LeadRecord;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes one JSON object per lead, one lead per line
pub fn write_leads<W: Write>(leads: &[LeadRecord], writer: W) -> OutputResult<()> {
    let mut writer = BufWriter::new(writer);
    for lead in leads {
        serde_json::to_writer(&mut writer, lead)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes leads to `output_path`, replacing any existing file
pub fn write_leads_jsonl(leads: &[LeadRecord], output_path: &Path) -> OutputResult<()> {
    let file = File::create(output_path)?;
    write_leads(leads, file)?;
    tracing::info!("Wrote {} leads to {}", leads.len(), output_path.display());
    Ok(())
}
