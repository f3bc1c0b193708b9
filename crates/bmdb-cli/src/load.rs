//! The load command: replace the `videos` table with the contents of a CSV
//! export.

use std::path::Path;

use anyhow::Context;

use bmdb_core::{AppConfig, IngestRecord};

/// Handler for `bmdb-cli load`.
///
/// # Errors
///
/// Returns an error if the CSV cannot be read or parsed, the database is not
/// configured, or the transactional replace fails.
pub(crate) async fn run_load(config: &AppConfig, csv_path: &Path) -> anyhow::Result<()> {
    let records = read_csv(csv_path)?;
    if records.is_empty() {
        println!("no rows in {}; nothing to load", csv_path.display());
        return Ok(());
    }

    let pool = crate::connect_pool(config).await?;
    bmdb_db::run_migrations(&pool).await?;
    bmdb_db::replace_all_videos(&pool, &records).await?;

    println!("loaded {} rows into videos", records.len());
    Ok(())
}

/// Reads an exported CSV back into records.
///
/// The exporter prefixes the file with a UTF-8 byte-order mark; it has to be
/// stripped here, otherwise the first header parses as `\u{feff}brand` and
/// every row fails with a missing-field error.
pub(crate) fn read_csv(path: &Path) -> anyhow::Result<Vec<IngestRecord>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to open {}", path.display()))?;
    let content = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
    let mut reader = csv::Reader::from_reader(content);

    let mut records = Vec::new();
    for (index, row) in reader.deserialize().enumerate() {
        let record: IngestRecord =
            row.with_context(|| format!("bad row {} in {}", index + 1, path.display()))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::{DateTime, Utc};

    use super::*;

    fn sample_record() -> IngestRecord {
        let published_at: DateTime<Utc> = "2025-06-01T09:30:15Z".parse().expect("timestamp");
        let (published_date, published_time) = IngestRecord::split_published_at(published_at);
        IngestRecord {
            brand: "3CE".to_string(),
            channel_id: "UC123".to_string(),
            channel_name: "3CE Official".to_string(),
            channel_subscribers: 1_200_000,
            video_id: "vid-1".to_string(),
            video_title: "Summer look, part 1".to_string(),
            published_at,
            view_count: 1_000,
            like_count: 40,
            comment_count: 10,
            engagement_rate: "5.00".parse().expect("decimal"),
            duration: "PT5M30S".to_string(),
            tags: "makeup,summer".to_string(),
            category_id: "26".to_string(),
            published_date,
            published_time,
        }
    }

    #[test]
    fn round_trips_a_bom_prefixed_export() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("export.csv");
        let records = vec![sample_record()];

        crate::crawl::export::write_csv(&path, &records).expect("write");

        // A load sees exactly what was crawled, BOM and all.
        let read_back = read_csv(&path).expect("read back");
        assert_eq!(read_back, records);
    }

    #[test]
    fn read_csv_accepts_files_without_a_bom() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("plain.csv");
        let records = vec![sample_record()];

        crate::crawl::export::write_csv(&path, &records).expect("write");
        let bytes = std::fs::read(&path).expect("read");
        std::fs::write(&path, &bytes[3..]).expect("rewrite without BOM");

        let read_back = read_csv(&path).expect("read back");
        assert_eq!(read_back, records);
    }

    #[test]
    fn read_csv_rejects_malformed_rows() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "brand,video_id\n3CE,vid-1").expect("write");

        let result = read_csv(file.path());
        let err = result.expect_err("incomplete rows must not load");
        assert!(err.to_string().contains("bad row 1"));
    }

    #[test]
    fn read_csv_missing_file_mentions_the_path() {
        let result = read_csv(Path::new("/nonexistent/export.csv"));
        let err = result.expect_err("missing file");
        assert!(err.to_string().contains("/nonexistent/export.csv"));
    }
}
