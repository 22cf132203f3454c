//! Report-folder bookkeeping and collision-free artifact paths.

use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Default folder exported artifacts land in.
pub const REPORT_DIR: &str = "reportes";

/// Create the report folder if needed and return it.
pub fn ensure_report_dir(dir: &Path) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        AppError::export(format!(
            "Failed to create report folder '{}': {e}",
            dir.display()
        ))
    })?;
    Ok(dir.to_path_buf())
}

/// Timestamp suffix shared by all artifacts of one export run.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// `<dir>/<stem>_<ts>.<ext>`, never reusing an existing path: if the file is
/// already there, a numeric suffix is appended instead of overwriting.
pub fn unique_path(dir: &Path, stem: &str, ts: &str, ext: &str) -> PathBuf {
    let candidate = dir.join(format!("{stem}_{ts}.{ext}"));
    if !candidate.exists() {
        return candidate;
    }
    for n in 1.. {
        let candidate = dir.join(format!("{stem}_{ts}-{n}.{ext}"));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("unbounded suffix search");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_path_never_reuses_an_existing_file() {
        let dir = std::env::temp_dir().join("sales-wx-artifact-tests");
        std::fs::create_dir_all(&dir).unwrap();

        let first = unique_path(&dir, "report", "2024-01-01_00-00-00", "csv");
        std::fs::write(&first, "x").unwrap();
        let second = unique_path(&dir, "report", "2024-01-01_00-00-00", "csv");

        assert_ne!(first, second);
        std::fs::remove_file(&first).unwrap();
    }
}
