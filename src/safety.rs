//! Safety utilities to prevent accidental file deletion.
//!
//! `--fresh` deletes the target database before ingesting. These checks make
//! sure the path being deleted really is a database and not part of the dump.

use anyhow::{bail, Result};
use std::path::Path;

/// Extensions accepted for a database that may be deleted and recreated.
pub const DB_EXTENSIONS: &[&str] = &["sqlite", "sqlite3", "db"];

/// Validates that the database path is safe to write (and, with `fresh`,
/// to delete).
///
/// Checks:
/// - Database cannot be the dump path itself
/// - Database cannot live inside the dump directory (it would be walked)
/// - With `fresh`, the filename must carry a database extension
pub fn validate_database_path(db: &Path, dump: &Path, fresh: bool) -> Result<()> {
    if db == dump {
        bail!(
            "Safety check failed: database '{}' cannot be the same as the dump",
            db.display()
        );
    }

    if dump.is_dir() && db.starts_with(dump) {
        bail!(
            "Safety check failed: database '{}' is inside the dump directory '{}'",
            db.display(),
            dump.display()
        );
    }

    if fresh {
        let ext = db
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !DB_EXTENSIONS.contains(&ext.as_str()) {
            bail!(
                "Safety check failed: refusing to delete '{}' without a database extension ({})",
                db.display(),
                DB_EXTENSIONS.join(", ")
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_database_path() {
        let db = PathBuf::from("/tmp/freedb.sqlite3");
        let dump = PathBuf::from("/data/freedb-complete-20230101.tar.bz2");
        assert!(validate_database_path(&db, &dump, true).is_ok());
    }

    #[test]
    fn test_database_equals_dump() {
        let path = PathBuf::from("/data/freedb.db");
        let result = validate_database_path(&path, &path, false);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as the dump"));
    }

    #[test]
    fn test_database_inside_dump_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("freedb.sqlite3");
        let result = validate_database_path(&db, dir.path(), false);
        assert!(result.unwrap_err().to_string().contains("inside the dump directory"));
    }

    #[test]
    fn test_fresh_requires_db_extension() {
        let dump = PathBuf::from("/data/freedb");
        assert!(validate_database_path(Path::new("/tmp/notes.txt"), &dump, true).is_err());
        assert!(validate_database_path(Path::new("/tmp/notes.txt"), &dump, false).is_ok());
        assert!(validate_database_path(Path::new("/tmp/FREEDB.DB"), &dump, true).is_ok());
    }
}
