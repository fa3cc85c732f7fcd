use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use super::ensure_dir;

const TMP_SUFFIX: &str = "tmp";

/// Sibling staging path for `path`: `ledger.json` stages to `ledger.json.tmp`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes `data` to `path` atomically by staging to a temporary file.
///
/// The staged file is synced before the rename and removed again when either
/// step fails, so `path` holds either the old or the new contents.
pub fn write_atomic(path: &Path, data: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    let staged = stage(&tmp, data).and_then(|()| fs::rename(&tmp, path));
    if staged.is_err() && tmp.is_file() {
        let _ = fs::remove_file(&tmp);
    }
    staged
}

fn stage(tmp: &Path, data: &str) -> io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn staging_path_keeps_the_original_extension() {
        assert_eq!(
            tmp_path(Path::new("data/ledger.json")),
            PathBuf::from("data/ledger.json.tmp")
        );
        assert_eq!(tmp_path(Path::new("ledger")), PathBuf::from("ledger.tmp"));
    }

    #[test]
    fn write_replaces_contents_and_leaves_no_staging_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("state.json");
        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn failed_rename_removes_the_staging_file() {
        let temp = TempDir::new().unwrap();
        // A non-empty directory at the target makes the rename fail.
        let path = temp.path().join("state.json");
        fs::create_dir_all(path.join("occupied")).unwrap();

        assert!(write_atomic(&path, "data").is_err());
        assert!(!tmp_path(&path).exists());
        assert!(path.join("occupied").is_dir());
    }
}
