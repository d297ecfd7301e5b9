//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Recursively copy a directory, merging into `dst` if it exists.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        anyhow::bail!("not a directory: {}", src.display());
    }

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.with_context(|| format!("failed to walk {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Every file under `base` with the given extension, sorted.
///
/// A missing `base` yields no files.
pub fn files_with_extension(base: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(base)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_dir_all() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("bin");
        let dst = tmp.path().join("prefix/bin");

        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("yambo"), "#!/bin/sh").unwrap();
        fs::write(src.join("sub/ypp"), "#!/bin/sh").unwrap();

        copy_dir_all(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("yambo")).unwrap(), "#!/bin/sh");
        assert!(dst.join("sub/ypp").exists());
    }

    #[test]
    fn test_copy_missing_dir_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(copy_dir_all(&tmp.path().join("nope"), &tmp.path().join("dst")).is_err());
    }

    #[test]
    fn test_files_with_extension() {
        let tmp = TempDir::new().unwrap();
        write_string(&tmp.path().join("b.toml"), "").unwrap();
        write_string(&tmp.path().join("nested/a.toml"), "").unwrap();
        write_string(&tmp.path().join("readme.md"), "").unwrap();

        let files = files_with_extension(tmp.path(), "toml");
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "toml"));
        assert!(files_with_extension(&tmp.path().join("missing"), "toml").is_empty());
    }
}
