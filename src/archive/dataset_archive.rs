use crate::error::{AnalysisError, Result};
use crate::utils::constants::DATASET_EXTENSION;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use zip::ZipArchive;

/// A HYDAT SQLite file unpacked from its distribution zip.
///
/// The extracted copy lives in a temporary directory owned by this value and
/// is removed when it is dropped.
pub struct DatasetArchive {
    temp_dir: TempDir,
    dataset_path: PathBuf,
}

impl DatasetArchive {
    pub fn extract(zip_path: &Path) -> Result<Self> {
        let file = File::open(zip_path)
            .map_err(|e| AnalysisError::unavailable(zip_path, e.to_string()))?;
        let mut archive = ZipArchive::new(file)?;

        let entry_name = archive
            .file_names()
            .find(|name| is_dataset_entry(name))
            .map(str::to_string)
            .ok_or_else(|| {
                AnalysisError::MissingData(format!(
                    "no .{} file in archive '{}'",
                    DATASET_EXTENSION,
                    zip_path.display()
                ))
            })?;

        let temp_dir = TempDir::new().map_err(|e| {
            AnalysisError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to create temporary directory: {}", e),
            ))
        })?;

        // Flatten any directory prefix inside the archive.
        let file_name = Path::new(&entry_name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&entry_name));
        let dataset_path = temp_dir.path().join(file_name);

        let mut zip_file = archive.by_name(&entry_name)?;
        let mut dest_file = File::create(&dataset_path)?;
        let mut writer = BufWriter::new(&mut dest_file);
        let bytes = std::io::copy(&mut zip_file, &mut writer)?;
        writer.flush()?;

        info!(
            "Extracted {} ({:.1} MB) from {}",
            entry_name,
            bytes as f64 / 1_048_576.0,
            zip_path.display()
        );

        Ok(Self {
            temp_dir,
            dataset_path,
        })
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    pub fn temp_dir_path(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Drop for DatasetArchive {
    fn drop(&mut self) {
        debug!("Removing extracted dataset at {}", self.temp_dir.path().display());
    }
}

fn is_dataset_entry(name: &str) -> bool {
    !name.ends_with('/')
        && Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(DATASET_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use zip::{CompressionMethod, ZipWriter};

    fn create_test_zip(entries: &[(&str, &[u8])]) -> Result<NamedTempFile> {
        let file = NamedTempFile::new()?;
        {
            let mut zip = ZipWriter::new(&file);
            for (name, content) in entries {
                zip.start_file(
                    *name,
                    zip::write::FileOptions::default().compression_method(CompressionMethod::Stored),
                )?;
                zip.write_all(content)?;
            }
            zip.finish()?;
        }
        Ok(file)
    }

    #[test]
    fn test_is_dataset_entry() {
        assert!(is_dataset_entry("Hydat.sqlite3"));
        assert!(is_dataset_entry("Hydat_sqlite3_20240716/Hydat.SQLITE3"));
        assert!(!is_dataset_entry("README.txt"));
        assert!(!is_dataset_entry("nested.sqlite3/"));
    }

    #[test]
    fn test_extract_dataset() -> Result<()> {
        let zip = create_test_zip(&[
            ("README.txt", b"HYDAT"),
            ("Hydat_sqlite3_20240716/Hydat.sqlite3", b"SQLite format 3\0"),
        ])?;

        let archive = DatasetArchive::extract(zip.path())?;
        assert!(archive.dataset_path().exists());
        assert!(archive.dataset_path().ends_with("Hydat.sqlite3"));
        assert_eq!(std::fs::read(archive.dataset_path())?, b"SQLite format 3\0");

        Ok(())
    }

    #[test]
    fn test_extracted_copy_removed_on_drop() -> Result<()> {
        let zip = create_test_zip(&[("Hydat.sqlite3", b"data")])?;

        let archive = DatasetArchive::extract(zip.path())?;
        let dir = archive.temp_dir_path().to_path_buf();
        assert!(dir.exists());

        drop(archive);
        assert!(!dir.exists());

        Ok(())
    }

    #[test]
    fn test_archive_without_dataset() -> Result<()> {
        let zip = create_test_zip(&[("README.txt", b"nothing here")])?;

        let result = DatasetArchive::extract(zip.path());
        assert!(matches!(result, Err(AnalysisError::MissingData(_))));

        Ok(())
    }
}
