//! Participant logs.
//!
//! Records accumulate in memory and the whole log is rewritten after every
//! completion, so the file on disk is always a prefix of the final log.

use crate::error::LogError;
use readex_core::LogRow;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// In-memory log, one record per completed trial or page, in completion order
#[derive(Debug, Clone)]
pub struct TrialLog<R> {
    rows: Vec<R>,
}

impl<R> Default for TrialLog<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> TrialLog<R> {
    pub fn push(&mut self, row: R) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }
}

pub trait LogWriter {
    /// Makes sure the output location exists. Called once the participant
    /// is confirmed.
    fn prepare(&mut self) -> Result<(), LogError>;

    /// Overwrites the participant's log with `rows`.
    fn save<R: LogRow>(&mut self, participant: &str, rows: &[R]) -> Result<(), LogError>;
}

#[derive(Debug, Clone)]
pub struct CsvLogWriter {
    dir: PathBuf,
    prefix: String,
}

impl CsvLogWriter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, participant: &str) -> PathBuf {
        log_path(&self.dir, &self.prefix, participant)
    }

    fn write_all<R: LogRow>(&self, path: &Path, rows: &[R]) -> Result<(), LogError> {
        let partial = path.with_extension("csv.partial");
        let write_err = |source: csv::Error| LogError::Write {
            path: partial.clone(),
            source,
        };

        let table: Vec<Vec<(String, String)>> = rows.iter().map(LogRow::columns).collect();
        let headers = union_headers(&table);

        let mut wtr = csv::Writer::from_path(&partial).map_err(write_err)?;
        if !headers.is_empty() {
            wtr.write_record(&headers).map_err(write_err)?;
        }
        for row in &table {
            let record = headers.iter().map(|h| {
                row.iter()
                    .find(|(name, _)| name == h)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("")
            });
            wtr.write_record(record).map_err(write_err)?;
        }
        wtr.flush().map_err(|e| write_err(e.into()))?;
        drop(wtr);

        std::fs::rename(&partial, path).map_err(|source| LogError::Replace {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl LogWriter for CsvLogWriter {
    fn prepare(&mut self) -> Result<(), LogError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| LogError::Directory {
            path: self.dir.clone(),
            source,
        })?;
        debug!(dir = %self.dir.display(), "log directory ready");
        Ok(())
    }

    fn save<R: LogRow>(&mut self, participant: &str, rows: &[R]) -> Result<(), LogError> {
        let path = self.path_for(participant);
        let result = match self.write_all(&path, rows) {
            Ok(()) => Ok(()),
            Err(first) => {
                warn!(path = %path.display(), error = %first, "log save failed, retrying");
                self.prepare()?;
                self.write_all(&path, rows)
            }
        };
        if result.is_ok() {
            info!(path = %path.display(), rows = rows.len(), "log saved");
        }
        result
    }
}

/// `<dir>/<prefix>_<participant>.csv`. Characters outside `[A-Za-z0-9._-]`
/// become `_` in the file name only.
pub fn log_path(dir: &Path, prefix: &str, participant: &str) -> PathBuf {
    let safe: String = participant
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{prefix}_{safe}.csv"))
}

/// Column names in first-appearance order across all rows.
fn union_headers(table: &[Vec<(String, String)>]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in table {
        for (name, _) in row {
            if !headers.contains(name) {
                headers.push(name.clone());
            }
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Row(Vec<(&'static str, &'static str)>);

    impl LogRow for Row {
        fn columns(&self) -> Vec<(String, String)> {
            self.0
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }
    }

    #[test]
    fn path_sanitizes_identifier_only() {
        let path = log_path(Path::new("logs"), "EEG_log", "P 07/x");
        assert_eq!(path, PathBuf::from("logs/EEG_log_P_07_x.csv"));
        let path = log_path(Path::new("logs"), "EEG_log", "P007");
        assert_eq!(path, PathBuf::from("logs/EEG_log_P007.csv"));
    }

    #[test]
    fn save_overwrites_with_union_of_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = CsvLogWriter::new(dir.path().join("logs"), "EEG_log");
        writer.prepare().unwrap();

        let first = vec![Row(vec![("a", "1"), ("b", "2")])];
        writer.save("P1", &first).unwrap();

        let both = vec![
            Row(vec![("a", "1"), ("b", "2")]),
            Row(vec![("a", "3"), ("c", "4")]),
        ];
        writer.save("P1", &both).unwrap();

        let text = std::fs::read_to_string(writer.path_for("P1")).unwrap();
        assert_eq!(text, "a,b,c\n1,2,\n3,,4\n");
        assert!(!writer.path_for("P1").with_extension("csv.partial").exists());
    }

    #[test]
    fn save_recreates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let mut writer = CsvLogWriter::new(&logs, "preference_log");
        writer.prepare().unwrap();
        std::fs::remove_dir(&logs).unwrap();

        writer.save("P2", &[Row(vec![("x", "y")])]).unwrap();
        assert!(writer.path_for("P2").exists());
    }

    #[test]
    fn trial_log_counts_rows() {
        let mut log = TrialLog::default();
        assert!(log.is_empty());
        log.push(Row(vec![("a", "1")]));
        assert_eq!(log.len(), 1);
        assert_eq!(log.rows().len(), 1);
    }
}
