use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// A single file is returned as-is; a directory is walked for `*.json` files,
/// skipping excluded directory names. Results are sorted for stable output.
pub fn collect_json_files(path: &Path, excludes: &[String]) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        bail!("path does not exist: {}", path.display());
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_entry(|entry| should_visit(entry, excludes))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_json(entry.path()))
        .map(DirEntry::into_path)
        .collect();
    files.sort();

    Ok(files)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn should_visit(entry: &DirEntry, excludes: &[String]) -> bool {
    if !entry.file_type().is_dir() || entry.depth() == 0 {
        return true;
    }

    let dir_name = entry.file_name().to_string_lossy();
    !excludes
        .iter()
        .any(|excluded| excluded.eq_ignore_ascii_case(&dir_name))
}
