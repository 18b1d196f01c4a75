//! Input Listing
//!
//! Resolves the operator-supplied input into the unit set: text files for
//! the CPU workload, URLs for the crawl workload.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resolve a path into the CPU unit set.
///
/// A path naming a single file yields that file alone. A directory yields
/// every `.txt` file found recursively, sorted lexicographically by path so
/// the unit set is identical across runs. A missing path yields an empty
/// set, which the caller treats as a configuration error.
pub fn list_text_files(input: &Path) -> io::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.exists() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    collect_txt(input, &mut paths)?;
    paths.sort();
    Ok(paths)
}

fn collect_txt(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_txt(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "txt") {
            out.push(path);
        }
    }
    Ok(())
}

/// Read a URL list: one URL per line, blank lines and `#` comments ignored.
pub fn read_url_list(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
