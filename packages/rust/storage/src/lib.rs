//! Delimited-file storage for the partnership table.
//!
//! The [`RecordTable`] holds every row of one CSV file in memory. Columns the
//! pipeline understands map onto [`PartnershipRecord`] fields; any other column
//! is carried through untouched and written back in its original position.
//!
//! Tables are loaded once at the start of a run and written once at the end.

mod export;

use std::fs::File;
use std::path::Path;

use partnerscout_shared::{KnownPairs, PartnershipRecord, Result, ScoutError};
use tracing::{debug, info};

pub use export::{default_output_path, split_table, write_grid, write_rows};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const COL_PARTNER1: &str = "partner1";
pub const COL_PARTNER2: &str = "partner2";
pub const COL_PARTNER3: &str = "partner3";
pub const COL_ANNOUNCED: &str = "When announced";
pub const COL_LINK: &str = "Link";
pub const COL_LINK2: &str = "link 2";
pub const COL_SUMMARY: &str = "summary";
pub const COL_RAW_CONTENT: &str = "raw_content";

/// Header row used for tables created from scratch.
pub const STANDARD_HEADERS: [&str; 8] = [
    COL_PARTNER1,
    COL_PARTNER2,
    COL_PARTNER3,
    COL_ANNOUNCED,
    COL_LINK,
    COL_LINK2,
    COL_SUMMARY,
    COL_RAW_CONTENT,
];

// ---------------------------------------------------------------------------
// RecordTable
// ---------------------------------------------------------------------------

/// An in-memory partnership table plus the header layout it was read with.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    headers: Vec<String>,
    records: Vec<PartnershipRecord>,
}

impl RecordTable {
    /// A table with the standard header layout.
    pub fn from_records(records: Vec<PartnershipRecord>) -> Self {
        Self {
            headers: STANDARD_HEADERS.iter().map(|h| h.to_string()).collect(),
            records,
        }
    }

    /// Read a table from `path`. `partner1` and `partner2` columns are required.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ScoutError::io(path, e))?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| persistence(path, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        for required in [COL_PARTNER1, COL_PARTNER2] {
            if !headers.iter().any(|h| h == required) {
                return Err(ScoutError::validation(format!(
                    "{} is missing required column '{required}'",
                    path.display()
                )));
            }
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| persistence(path, e))?;
            let mut record = PartnershipRecord::default();
            for (i, header) in headers.iter().enumerate() {
                let cell = row.get(i).unwrap_or_default();
                assign(&mut record, header, cell);
            }
            records.push(record);
        }

        info!(path = %path.display(), rows = records.len(), "table loaded");
        Ok(Self { headers, records })
    }

    /// Write the table to `path`, creating parent directories as needed.
    ///
    /// `summary` and `raw_content` columns are always emitted.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScoutError::io(parent, e))?;
        }

        let headers = self.output_headers();
        let mut writer = csv::Writer::from_path(path).map_err(|e| persistence(path, e))?;
        writer
            .write_record(&headers)
            .map_err(|e| persistence(path, e))?;

        for record in &self.records {
            let mut extras = record.extra.iter().map(|(_, value)| value.as_str());
            let row: Vec<&str> = headers
                .iter()
                .map(|h| cell(record, h).unwrap_or_else(|| extras.next().unwrap_or_default()))
                .collect();
            writer.write_record(&row).map_err(|e| persistence(path, e))?;
        }
        writer.flush().map_err(|e| ScoutError::io(path, e))?;

        info!(path = %path.display(), rows = self.records.len(), "table written");
        Ok(())
    }

    /// Unordered, normalized partner pairs present in the table.
    pub fn known_pairs(&self) -> KnownPairs {
        let pairs: KnownPairs = self.records.iter().filter_map(|r| r.pair()).collect();
        debug!(pairs = pairs.len(), "known pairs derived");
        pairs
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[PartnershipRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [PartnershipRecord] {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<PartnershipRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn output_headers(&self) -> Vec<String> {
        let mut headers = self.headers.clone();
        for column in [COL_SUMMARY, COL_RAW_CONTENT] {
            if !headers.iter().any(|h| h == column) {
                headers.push(column.to_string());
            }
        }
        headers
    }
}

fn assign(record: &mut PartnershipRecord, header: &str, value: &str) {
    let optional = || (!value.is_empty()).then(|| value.to_string());
    match header {
        COL_PARTNER1 => record.partner1 = value.to_string(),
        COL_PARTNER2 => record.partner2 = value.to_string(),
        COL_PARTNER3 => record.partner3 = optional(),
        COL_ANNOUNCED => record.announced = optional(),
        COL_LINK => record.link = optional(),
        COL_LINK2 => record.link2 = optional(),
        COL_SUMMARY => record.summary = optional(),
        COL_RAW_CONTENT => record.raw_content = optional(),
        other => record.extra.push((other.to_string(), value.to_string())),
    }
}

/// Value of a column this tool interprets; `None` for passthrough columns,
/// which are written positionally from `record.extra`.
fn cell<'a>(record: &'a PartnershipRecord, header: &str) -> Option<&'a str> {
    let field = match header {
        COL_PARTNER1 => return Some(&record.partner1),
        COL_PARTNER2 => return Some(&record.partner2),
        COL_PARTNER3 => &record.partner3,
        COL_ANNOUNCED => &record.announced,
        COL_LINK => &record.link,
        COL_LINK2 => &record.link2,
        COL_SUMMARY => &record.summary,
        COL_RAW_CONTENT => &record.raw_content,
        _ => return None,
    };
    Some(field.as_deref().unwrap_or_default())
}

pub(crate) fn persistence(path: &Path, err: impl std::fmt::Display) -> ScoutError {
    ScoutError::Persistence(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn read_maps_known_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "partners.csv",
            "partner1,partner2,partner3,When announced,Link,link 2\n\
             Acme,Globex,,Oct-24,https://a.example/1,\n\
             Initech,Hooli,Umbrella,,,https://b.example/2\n",
        );

        let table = RecordTable::read(&path).unwrap();
        assert_eq!(table.len(), 2);

        let first = &table.records()[0];
        assert_eq!(first.partner1, "Acme");
        assert_eq!(first.announced.as_deref(), Some("Oct-24"));
        assert_eq!(first.link.as_deref(), Some("https://a.example/1"));
        assert!(first.partner3.is_none());
        assert!(first.summary.is_none());

        let second = &table.records()[1];
        assert_eq!(second.partner3(), Some("Umbrella"));
        assert!(second.link.is_none());
        assert_eq!(second.link2.as_deref(), Some("https://b.example/2"));
    }

    #[test]
    fn missing_required_column_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.csv", "partner1,Link\nAcme,https://a.example\n");
        let err = RecordTable::read(&path).unwrap_err();
        assert!(matches!(err, ScoutError::Validation { .. }));
        assert!(err.to_string().contains("partner2"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = RecordTable::read(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, ScoutError::Io { .. }));
    }

    #[test]
    fn write_preserves_extra_columns_and_appends_summary() {
        let dir = TempDir::new().unwrap();
        let input = write_file(
            &dir,
            "in.csv",
            "Sector,partner1,partner2,Link\n\
             Cloud,Acme,Globex,https://a.example/1\n",
        );

        let mut table = RecordTable::read(&input).unwrap();
        table.records_mut()[0].summary = Some("Acme and Globex team up, again.".into());

        let output = dir.path().join("out").join("in_updated.csv");
        table.write(&output).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("Sector,partner1,partner2,Link,summary,raw_content")
        );
        assert_eq!(
            lines.next(),
            Some("Cloud,Acme,Globex,https://a.example/1,\"Acme and Globex team up, again.\",")
        );

        let reread = RecordTable::read(&output).unwrap();
        assert_eq!(
            reread.records()[0].extra,
            vec![("Sector".to_string(), "Cloud".to_string())]
        );
        assert_eq!(reread.records(), table.records());
    }

    #[test]
    fn repeated_passthrough_headers_keep_every_value() {
        let dir = TempDir::new().unwrap();
        let input = write_file(
            &dir,
            "dup.csv",
            "partner1,partner2,Notes,Notes,
             Acme,Globex,first,second,third
",
        );

        let table = RecordTable::read(&input).unwrap();
        let output = dir.path().join("dup_updated.csv");
        table.write(&output).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("partner1,partner2,Notes,Notes,,summary,raw_content")
        );
        assert_eq!(lines.next(), Some("Acme,Globex,first,second,third,,"));
    }

    #[test]
    fn known_pairs_are_unordered_and_normalized() {
        let mut a = PartnershipRecord::new("Acme", "Globex");
        a.link = Some("https://a.example".into());
        let b = PartnershipRecord::new(" globex ", "ACME");
        let c = PartnershipRecord::new("Initech", "");
        let table = RecordTable::from_records(vec![a, b, c]);

        let known = table.known_pairs();
        assert_eq!(known.len(), 1);
        assert!(
            known.contains(&partnerscout_shared::PartnershipPair::new("acme", "globex").unwrap())
        );
    }

    #[test]
    fn from_records_uses_standard_headers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.csv");
        RecordTable::from_records(vec![PartnershipRecord::new("Acme", "Globex")])
            .write(&path)
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with(
            "partner1,partner2,partner3,When announced,Link,link 2,summary,raw_content\n"
        ));
    }
}
