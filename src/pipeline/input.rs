//! Input discovery: collect the `.zip` files a local batch consists of.
//!
//! Two places are scanned: the caller's source path (a single `.zip` file,
//! or a directory searched recursively), and the `tmpzip/` subdirectory of
//! the staging root, where an external batching step places zips it built
//! from loose input files. Discovery only reads the staging area — producing
//! its contents is the collaborator's job.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Name of the staging subdirectory the batching collaborator writes into.
const STAGING_SUBDIR: &str = "tmpzip";

/// Collect every `.zip` under `source`, plus any staged under
/// `<staging_root>/tmpzip/`.
///
/// Returns paths in deterministic order: source files first (sorted), then
/// staged files (sorted). A missing source path is an error; an empty
/// result is not — the orchestrator submits nothing and returns an empty
/// batch.
pub fn discover_zip_inputs(
    source: &Path,
    staging_root: Option<&Path>,
) -> Result<Vec<PathBuf>, ConvertError> {
    if !source.exists() {
        return Err(ConvertError::InputNotFound {
            path: source.to_path_buf(),
        });
    }

    let mut files = if source.is_dir() {
        zips_under(source)
    } else if is_zip(source) {
        vec![source.to_path_buf()]
    } else {
        warn!("'{}' is not a .zip file; nothing to submit from it", source.display());
        Vec::new()
    };
    files.sort();

    if let Some(root) = staging_root {
        let staged_dir = root.join(STAGING_SUBDIR);
        if staged_dir.is_dir() {
            let mut staged = zips_under(&staged_dir);
            staged.sort();
            files.extend(staged);
        }
    }

    debug!("Discovered {} zip input(s)", files.len());
    Ok(files)
}

fn is_zip(path: &Path) -> bool {
    path.extension().map(|e| e.eq_ignore_ascii_case("zip")).unwrap_or(false)
}

fn zips_under(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_zip(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, b"PK\x03\x04").unwrap();
    }

    #[test]
    fn single_zip_file() {
        let dir = tempfile::tempdir().unwrap();
        let zip = dir.path().join("batch.zip");
        touch(&zip);

        let files = discover_zip_inputs(&zip, None).unwrap();
        assert_eq!(files, vec![zip]);
    }

    #[test]
    fn non_zip_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        touch(&txt);

        let files = discover_zip_inputs(&txt, None).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn directory_is_scanned_recursively() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.zip"));
        fs::create_dir_all(dir.path().join("nested/deep")).unwrap();
        touch(&dir.path().join("nested/deep/b.zip"));
        touch(&dir.path().join("nested/readme.md"));

        let files = discover_zip_inputs(dir.path(), None).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn staged_zips_are_appended() {
        let src = tempfile::tempdir().unwrap();
        touch(&src.path().join("a.zip"));
        touch(&src.path().join("b.zip"));
        touch(&src.path().join("c.zip"));

        let staging = tempfile::tempdir().unwrap();
        fs::create_dir_all(staging.path().join("tmpzip")).unwrap();
        touch(&staging.path().join("tmpzip/d.zip"));
        touch(&staging.path().join("tmpzip/e.zip"));

        let files = discover_zip_inputs(src.path(), Some(staging.path())).unwrap();
        assert_eq!(files.len(), 5);
        // Source files come first, staged files after.
        assert!(files[..3].iter().all(|p| p.starts_with(src.path())));
        assert!(files[3..].iter().all(|p| p.starts_with(staging.path())));
    }

    #[test]
    fn missing_source_is_an_error() {
        let err = discover_zip_inputs(Path::new("/definitely/not/here"), None);
        assert!(matches!(err, Err(ConvertError::InputNotFound { .. })));
    }

    #[test]
    fn empty_staging_root_is_fine() {
        let src = tempfile::tempdir().unwrap();
        touch(&src.path().join("a.zip"));
        let staging = tempfile::tempdir().unwrap();
        // no tmpzip/ subdirectory at all
        let files = discover_zip_inputs(src.path(), Some(staging.path())).unwrap();
        assert_eq!(files.len(), 1);
    }
}
