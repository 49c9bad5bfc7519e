use crate::analysis::truncate_chars;
use std::path::Path;
use tracing::debug;

/// Documents longer than this are cut before anything else sees them
pub const MAX_DOCUMENT_CHARS: usize = 150_000;

const README_NAMES: &[&str] = &[
    "README.md",
    "README.rst",
    "README.txt",
    "README",
    "readme.md",
    "readme.rst",
    "readme.txt",
    "readme",
    "Readme.md",
    "Readme.rst",
    "Readme.txt",
    "Readme",
];

/// The repository's README, capped at [`MAX_DOCUMENT_CHARS`]
pub fn read_primary_document(repo: &Path) -> Option<String> {
    README_NAMES.iter().find_map(|name| {
        let content = read_lossy(&repo.join(name))?;
        if content.trim().is_empty() {
            return None;
        }
        debug!("Found README: {} ({} bytes)", name, content.len());
        Some(truncate_chars(&content, MAX_DOCUMENT_CHARS).to_string())
    })
}

/// Read a root-level file, trying case and `.md`/`.txt` variants of `name`
pub fn read_named_file(repo: &Path, name: &str) -> Option<String> {
    let candidates = [
        name.to_string(),
        name.to_uppercase(),
        name.to_lowercase(),
        format!("{}.md", name),
        format!("{}.md", name.to_uppercase()),
        format!("{}.md", name.to_lowercase()),
        format!("{}.txt", name),
        format!("{}.txt", name.to_uppercase()),
        format!("{}.txt", name.to_lowercase()),
    ];
    candidates
        .iter()
        .find_map(|candidate| read_lossy(&repo.join(candidate)))
}

fn read_lossy(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    std::fs::read(path)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}
