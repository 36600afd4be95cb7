//! CSV export of the session history.
//!
//! Writes one row per session with a header row, for spreadsheets and
//! external tracking tools. The export is a copy; the store stays the source
//! of truth.

use crate::{Result, SessionLog};
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    date: String,
    protocol_name: &'a str,
    goal: &'a str,
    total_seconds: u32,
    total_minutes: String,
    cycles_completed: u32,
}

impl<'a> From<&'a SessionLog> for CsvRow<'a> {
    fn from(log: &'a SessionLog) -> Self {
        CsvRow {
            date: log.date.to_rfc3339(),
            protocol_name: &log.protocol_name,
            goal: log.goal.map(|g| g.as_str()).unwrap_or(""),
            total_seconds: log.total_time,
            total_minutes: format!("{:.1}", f64::from(log.total_time) / 60.0),
            cycles_completed: log.cycles_completed,
        }
    }
}

/// Write the history as CSV to any writer
pub fn write_csv<W: Write>(history: &[SessionLog], out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(out);

    for log in history {
        writer.serialize(CsvRow::from(log))?;
    }

    writer.flush()?;
    Ok(())
}

/// Export the history to a CSV file, replacing any existing file
///
/// The file is synced to disk before returning. Returns the number of rows
/// written.
pub fn export_csv(history: &[SessionLog], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(&file);
    write_csv(history, &mut writer)?;
    writer.flush()?;
    drop(writer);
    file.sync_all()?;

    tracing::info!("Exported {} sessions to {:?}", history.len(), path);
    Ok(history.len())
}
