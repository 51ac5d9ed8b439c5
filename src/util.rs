use crate::model::SHORT_ID_LEN;
use std::path::{Path, PathBuf};

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

pub fn first_line(message: &str) -> &str {
    message.trim().lines().next().unwrap_or("").trim_end()
}

/// Whether `path` passes an optional extension allow-list.
///
/// Entries may be given with or without the leading dot and match
/// case-insensitively.
pub fn matches_extension(path: &str, extensions: Option<&[String]>) -> bool {
    let Some(allowed) = extensions else {
        return true;
    };
    let extension = Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    allowed
        .iter()
        .any(|ext| ext.trim_start_matches('.').to_lowercase() == extension)
}

pub fn is_binary(data: &[u8]) -> bool {
    data.iter().take(8192).any(|&b| b == 0)
}

pub fn count_newlines(data: &[u8]) -> u64 {
    data.iter().filter(|&&b| b == b'\n').count() as u64
}

/// Non-hidden subdirectories of `dir`, sorted by path.
pub fn sorted_subdirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            !path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
        })
        .collect();
    dirs.sort();
    Ok(dirs)
}
