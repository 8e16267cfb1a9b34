use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::Result;
use crate::parser::Severity;

pub const HEADER: [&str; 5] = ["name", "description", "resolution", "exploitation", "references"];
const REFERENCE_SEPARATOR: &str = ", ";

/// One output row: a single vulnerability category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub name: String,
    pub description: String,
    pub resolution: String,
    pub exploitation: Severity,
    pub references: Vec<String>,
}

impl CategoryRecord {
    pub fn references_display(&self) -> String {
        self.references.join(REFERENCE_SEPARATOR)
    }
}

/// Write header + rows as CSV to any writer.
pub fn write_records<W: Write>(writer: W, records: &[CategoryRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for r in records {
        wtr.write_record([
            r.name.as_str(),
            r.description.as_str(),
            r.resolution.as_str(),
            r.exploitation.as_str(),
            r.references_display().as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the CSV next to `path` and rename it into place, so a failed write
/// never leaves a truncated file behind.
pub fn write_csv(path: &Path, records: &[CategoryRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    write_records(tmp.as_file_mut(), records)?;
    tmp.persist(path).map_err(|e| e.error)?;
    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

// ── Tests ──
