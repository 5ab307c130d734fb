//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt data on failure.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::FinanceError;

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, FinanceError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| FinanceError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| FinanceError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, then rename)
///
/// The file is either completely written or not modified at all.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), FinanceError>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let mut staged = StagedWrites::default();
    staged.stage(path.as_ref(), data)?;
    staged.commit()
}

/// A set of files written to temp paths and renamed into place together
///
/// Nothing is renamed until every file has been staged. Dropping the set
/// without committing removes whatever temp files are still pending.
#[derive(Debug, Default)]
pub struct StagedWrites {
    pending: Vec<(PathBuf, PathBuf)>,
}

impl StagedWrites {
    /// Serialize `data` next to `path` without touching `path` itself
    pub fn stage<T>(&mut self, path: &Path, data: &T) -> Result<(), FinanceError>
    where
        T: Serialize + ?Sized,
    {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FinanceError::Storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        // Temp file must live in the same directory for the rename to be atomic
        let temp_path = path.with_extension("json.tmp");
        self.pending.push((temp_path.clone(), path.to_path_buf()));

        let file = File::create(&temp_path)
            .map_err(|e| FinanceError::Storage(format!("Failed to create temp file: {}", e)))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, data)
            .map_err(|e| FinanceError::Storage(format!("Failed to serialize data: {}", e)))?;

        writer
            .flush()
            .map_err(|e| FinanceError::Storage(format!("Failed to flush data: {}", e)))?;

        writer
            .get_ref()
            .sync_all()
            .map_err(|e| FinanceError::Storage(format!("Failed to sync data: {}", e)))?;

        Ok(())
    }

    /// Rename every staged file over its target
    pub fn commit(mut self) -> Result<(), FinanceError> {
        while let Some((temp_path, path)) = self.pending.first() {
            fs::rename(temp_path, path).map_err(|e| {
                FinanceError::Storage(format!("Failed to rename temp file: {}", e))
            })?;
            self.pending.remove(0);
        }
        Ok(())
    }
}

impl Drop for StagedWrites {
    fn drop(&mut self) {
        for (temp_path, _) in &self.pending {
            let _ = fs::remove_file(temp_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Row {
        category: String,
        cents: i64,
    }

    #[test]
    fn test_read_nonexistent_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("expenses.json");

        let rows: Vec<Row> = read_json(&path).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("expenses.json");

        let rows = vec![
            Row {
                category: "Housing".into(),
                cents: 50000,
            },
            Row {
                category: "Food".into(),
                cents: 10000,
            },
        ];

        write_json_atomic(&path, &rows).unwrap();
        let loaded: Vec<Row> = read_json(&path).unwrap();
        assert_eq!(rows, loaded);
    }

    #[test]
    fn test_atomic_write_no_temp_file_left() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("budgets.json");

        write_json_atomic(&path, &Row::default()).unwrap();

        assert!(path.exists());
        assert!(!temp_dir.path().join("budgets.json.tmp").exists());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("nested").join("goals.json");

        write_json_atomic(&path, &Row::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("income.json");
        fs::write(&path, "not json at all").unwrap();

        let err = read_json::<Vec<Row>, _>(&path).unwrap_err();
        assert!(matches!(err, FinanceError::Storage(_)));
    }

    #[test]
    fn test_staged_writes_land_together() {
        let temp_dir = TempDir::new().unwrap();
        let expenses = temp_dir.path().join("expenses.json");
        let income = temp_dir.path().join("income.json");

        let mut staged = StagedWrites::default();
        staged.stage(&expenses, &Row::default()).unwrap();
        staged.stage(&income, &Row::default()).unwrap();
        assert!(!expenses.exists());
        assert!(!income.exists());

        staged.commit().unwrap();
        assert!(expenses.exists());
        assert!(income.exists());
        assert!(!temp_dir.path().join("expenses.json.tmp").exists());
    }

    #[test]
    fn test_dropped_stage_leaves_targets_alone() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("goals.json");
        let original = vec![Row {
            category: "Car".into(),
            cents: 500000,
        }];
        write_json_atomic(&path, &original).unwrap();

        {
            let mut staged = StagedWrites::default();
            staged.stage(&path, &Vec::<Row>::new()).unwrap();
        }

        let loaded: Vec<Row> = read_json(&path).unwrap();
        assert_eq!(loaded, original);
        assert!(!temp_dir.path().join("goals.json.tmp").exists());
    }
}
