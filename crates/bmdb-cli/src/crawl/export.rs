//! CSV sink for crawled rows.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use bmdb_core::IngestRecord;

/// Writes records as UTF-8 CSV, one header row then one row per record in
/// the given order. The leading byte-order mark keeps the file openable in
/// spreadsheet tools that sniff encoding from it.
pub(crate) fn write_csv(path: &Path, records: &[IngestRecord]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    file.write_all(b"\xEF\xBB\xBF")?;

    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
