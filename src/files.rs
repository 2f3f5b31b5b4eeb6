//! DDL source resolution.
//!
//! `--src` is a directory path followed by a file name glob, e.g.
//! `./sql/*.sql`. Only the last segment is a pattern; the directory part is
//! taken literally.

use crate::error::{ModelError, ModelResult, NoMatchKind};
use crate::pattern::compile;
use std::path::{Path, PathBuf};

/// Resolve `src` to the regular files it names, sorted by file name.
///
/// Fails with `InvalidInput` for an empty source and with the
/// `NoMatch(Files)` sentinel when nothing matches.
pub fn match_files(src: &str) -> ModelResult<Vec<PathBuf>> {
    let src = src.trim();
    if src.is_empty() {
        return Err(ModelError::invalid(
            "expected path or path globbing patterns, but nothing found",
        ));
    }

    let path = Path::new(src);
    let (dir, file_pattern) = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => (
            path.parent().filter(|p| !p.as_os_str().is_empty()),
            name,
        ),
        None => {
            return Err(ModelError::invalid(format!(
                "'{}' does not end with a file name or pattern",
                src
            )));
        }
    };
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => PathBuf::from("."),
    };
    let dir = std::path::absolute(&dir)?;

    let pattern = compile(file_pattern)
        .map_err(|e| ModelError::invalid(format!("bad file pattern '{}': {}", file_pattern, e)))?;

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if pattern.matches(name) {
            files.push(dir.join(name));
        }
    }
    files.sort();

    tracing::debug!(src, matched = files.len(), "resolved ddl sources");
    if files.is_empty() {
        return Err(ModelError::NoMatch(NoMatchKind::Files));
    }
    Ok(files)
}
