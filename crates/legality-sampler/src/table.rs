//! Newline-delimited JSON tables.
//!
//! Every table is one JSON object per line. Readers skip rows that do not
//! decode (logging a warning) so that one damaged line never aborts a run.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use legality_core::{Material, MaterialClass};
use num_bigint::BigUint;
use num_traits::One;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SamplerError};
use crate::observation::SampleObservation;

/// One row of the material table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub id: u64,
    pub white: Material,
    pub black: Material,
    pub total_pieces: u32,
    /// Exact diagram count in decimal.
    #[serde(default)]
    pub diagrams: String,
}

impl From<&MaterialClass> for MaterialRecord {
    fn from(class: &MaterialClass) -> Self {
        Self {
            id: class.id,
            white: class.white,
            black: class.black,
            total_pieces: class.total_pieces,
            diagrams: class.diagram_count.to_string(),
        }
    }
}

impl MaterialRecord {
    /// Diagram count of the row; `1` when the stored string does not parse.
    pub fn diagram_count(&self) -> BigUint {
        match self.diagrams.trim().parse::<BigUint>() {
            Ok(count) => count,
            Err(_) => {
                warn!(
                    event = "diagram_count_fallback",
                    class_id = self.id,
                    diagrams = %self.diagrams,
                    "unparseable diagram count, using 1"
                );
                BigUint::one()
            }
        }
    }

    pub fn into_class(self) -> legality_core::error::Result<MaterialClass> {
        let diagram_count = self.diagram_count();
        MaterialClass::with_diagram_count(self.id, self.white, self.black, diagram_count)
    }
}

/// Buffered row writer for one table file.
#[derive(Debug)]
pub struct TableWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: usize,
}

impl TableWriter {
    /// Creates (or truncates) the table file, creating parent directories.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let file = File::create(path).map_err(|e| SamplerError::io(path, e))?;
        Ok(Self::from_file(path, file))
    }

    /// Opens the table file for appending, creating it when absent.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SamplerError::io(path, e))?;
        Ok(Self::from_file(path, file))
    }

    fn from_file(path: &Path, file: File) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            rows: 0,
        }
    }

    pub fn write<T: Serialize>(&mut self, row: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, row)?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| SamplerError::io(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_all<'a, T: Serialize + 'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a T>,
    ) -> Result<()> {
        for row in rows {
            self.write(row)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| SamplerError::io(&self.path, e))
    }

    /// Rows written through this writer.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes and returns the number of rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.flush()?;
        Ok(self.rows)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| SamplerError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Reads every decodable row of a table.
///
/// A missing file is [`SamplerError::InputMissing`]; blank lines are ignored
/// and undecodable lines are skipped with a warning.
pub fn read_rows<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SamplerError::InputMissing(path.to_path_buf()),
        _ => SamplerError::io(path, e),
    })?;

    let mut rows = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| SamplerError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(row) => rows.push(row),
            Err(err) => warn!(
                event = "row_skipped",
                path = %path.display(),
                line = index + 1,
                error = %err,
            ),
        }
    }
    Ok(rows)
}

/// Writes rows to a fresh table file and returns the row count.
pub fn write_rows<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<usize> {
    let mut writer = TableWriter::create(path)?;
    writer.write_all(rows)?;
    writer.finish()
}

/// Reads the material table, skipping rows whose material is invalid.
pub fn read_material_table(path: impl AsRef<Path>) -> Result<Vec<MaterialClass>> {
    let path = path.as_ref();
    let records: Vec<MaterialRecord> = read_rows(path)?;
    let mut classes = Vec::with_capacity(records.len());
    for record in records {
        let id = record.id;
        match record.into_class() {
            Ok(class) => classes.push(class),
            Err(err) => warn!(
                event = "row_skipped",
                path = %path.display(),
                class_id = id,
                error = %err,
            ),
        }
    }
    Ok(classes)
}

/// Reads an observation table, skipping rows outside the valid ranges.
pub fn read_observation_table(path: impl AsRef<Path>) -> Result<Vec<SampleObservation>> {
    let path = path.as_ref();
    let rows: Vec<SampleObservation> = read_rows(path)?;
    Ok(rows
        .into_iter()
        .filter(|row| {
            let valid = row.sample_size > 0
                && (0.0..=1.0).contains(&row.legal_ratio)
                && row.std_error >= 0.0;
            if !valid {
                warn!(
                    event = "row_skipped",
                    path = %path.display(),
                    class_id = row.class_id,
                    sample_size = row.sample_size,
                    "observation out of range"
                );
            }
            valid
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use legality_test::class;

    #[test]
    fn test_material_table_roundtrip_keeps_exact_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.jsonl");
        let classes = vec![class(1, "K1Q1", "K1"), class(2, "K1Q1R2B2N2P8", "K1Q1R2B2N2P8")];
        let records: Vec<MaterialRecord> = classes.iter().map(MaterialRecord::from).collect();

        assert_eq!(write_rows(&path, &records).unwrap(), 2);
        let read = read_material_table(&path).unwrap();
        assert_eq!(read, classes);
        assert_eq!(records[0].diagrams, "249984");
    }

    #[test]
    fn test_material_row_format() {
        let record = MaterialRecord::from(&class(7, "K1R2", "K1"));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with(r#"{"id":7,"white":{"#));
        assert!(json.contains(r#""total_pieces":4"#));
        assert!(json.ends_with(r#""diagrams":"7624512"}"#));
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.jsonl");
        let good = serde_json::to_string(&MaterialRecord::from(&class(1, "K1", "K1"))).unwrap();
        let contents = format!(
            "{good}\n\
             {{\"id\":2,\"white\":\"{{'K': 1}}\",\"black\":{{\"K\":1}},\"total_pieces\":2,\"diagrams\":\"4032\"}}\n\
             not json\n\
             {{\"id\":3,\"white\":{{\"K\":2}},\"black\":{{\"K\":1}},\"total_pieces\":3,\"diagrams\":\"1\"}}\n\
             \n"
        );
        fs::write(&path, contents).unwrap();

        let classes = read_material_table(&path).unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].id, 1);
    }

    #[test]
    fn test_unparseable_diagram_count_falls_back_to_one() {
        let mut record = MaterialRecord::from(&class(1, "K1Q1", "K1"));
        record.diagrams = "n/a".into();
        assert_eq!(record.into_class().unwrap().diagram_count, BigUint::one());
    }

    #[test]
    fn test_missing_table_is_input_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_observation_table(dir.path().join("absent.jsonl")).unwrap_err();
        assert!(matches!(err, SamplerError::InputMissing(_)));
    }

    #[test]
    fn test_append_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("obs.jsonl");
        let row = |n| SampleObservation {
            class_id: 1,
            sample_size: n,
            legal_ratio: 0.5,
            std_error: 0.01,
        };

        for n in [100, 200] {
            let mut writer = TableWriter::append(&path).unwrap();
            writer.write(&row(n)).unwrap();
            assert_eq!(writer.finish().unwrap(), 1);
        }
        let rows = read_observation_table(&path).unwrap();
        assert_eq!(rows, vec![row(100), row(200)]);
    }

    #[test]
    fn test_out_of_range_observations_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs.jsonl");
        fs::write(
            &path,
            "{\"id\":1,\"sample_size\":100,\"legal_ratio\":0.5,\"std_error\":0.05}\n\
             {\"id\":1,\"sample_size\":0,\"legal_ratio\":0.5,\"std_error\":0.05}\n\
             {\"id\":1,\"sample_size\":200,\"legal_ratio\":1.5,\"std_error\":0.05}\n",
        )
        .unwrap();

        let rows = read_observation_table(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sample_size, 100);
    }
}
