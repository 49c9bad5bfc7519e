use crate::analysis::truncate_chars;
use crate::error::DiscoveryError;
use globset::{Glob, GlobMatcher};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// File-name patterns in priority order: entry points, algorithm cores,
/// build and deployment files, then plain sources.
const SAMPLE_PATTERNS: &[&str] = &[
    "main.py",
    "main.cpp",
    "main.c",
    "main.java",
    "*algorithm*",
    "*core*",
    "*engine*",
    "*align*",
    "*search*",
    "*index*",
    "*parse*",
    "Dockerfile",
    "docker-compose.yml",
    "*.dockerfile",
    "environment.yml",
    "conda.yml",
    "requirements.txt",
    "setup.py",
    "setup.cfg",
    "pyproject.toml",
    "Makefile",
    "CMakeLists.txt",
    "test_*.py",
    "*_test.py",
    "test*.sh",
    "*.py",
    "*.cpp",
    "*.c",
    "*.java",
    "*.R",
];

#[derive(Debug, Clone, Copy)]
pub struct SampleLimits {
    pub max_files: usize,
    pub max_chars_per_file: usize,
    pub max_file_bytes: u64,
}

impl Default for SampleLimits {
    fn default() -> Self {
        Self {
            max_files: 8,
            max_chars_per_file: 1_500,
            max_file_bytes: 50_000,
        }
    }
}

fn skipped(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy().to_lowercase();
            name == ".git"
                || name == "__pycache__"
                || name == "doc"
                || name == "docs"
                || name.starts_with("example")
        }
        _ => false,
    })
}

/// Excerpts of the most telling source files, each headed by its path.
/// `None` when nothing suitable was found.
pub fn collect_code_samples(
    repo: &Path,
    limits: &SampleLimits,
) -> Result<Option<String>, DiscoveryError> {
    let matchers = SAMPLE_PATTERNS
        .iter()
        .map(|pattern| {
            Glob::new(pattern)
                .map(|g| g.compile_matcher())
                .map_err(|e| DiscoveryError::GlobPattern {
                    pattern: pattern.to_string(),
                    source: e,
                })
        })
        .collect::<Result<Vec<GlobMatcher>, _>>()?;

    let mut candidates: Vec<PathBuf> = Vec::new();
    let walker = WalkBuilder::new(repo).hidden(true).git_ignore(true).build();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let rel = entry.path().strip_prefix(repo).unwrap_or(entry.path());
        if skipped(rel) {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(u64::MAX);
        if size >= limits.max_file_bytes {
            continue;
        }
        candidates.push(rel.to_path_buf());
    }
    candidates.sort();

    let mut chosen = HashSet::new();
    let mut samples = Vec::new();

    'patterns: for matcher in &matchers {
        for rel in &candidates {
            if samples.len() >= limits.max_files {
                break 'patterns;
            }
            if chosen.contains(rel) {
                continue;
            }
            let Some(file_name) = rel.file_name() else {
                continue;
            };
            if !matcher.is_match(file_name) {
                continue;
            }
            let Ok(bytes) = std::fs::read(repo.join(rel)) else {
                continue;
            };
            let content = String::from_utf8_lossy(&bytes);
            if content.trim().is_empty() {
                continue;
            }

            debug!("Collected code sample {}", rel.display());
            chosen.insert(rel.clone());
            samples.push(format!(
                "=== {} ===\n{}\n",
                rel.display(),
                truncate_chars(&content, limits.max_chars_per_file)
            ));
        }
    }

    if samples.is_empty() {
        Ok(None)
    } else {
        Ok(Some(samples.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_priority_order_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::create_dir_all(root.join("examples")).unwrap();
        fs::write(root.join("src/util.py"), "def helper(): pass").unwrap();
        fs::write(root.join("src/aligner.c"), "x".repeat(3_000)).unwrap();
        fs::write(root.join("main.py"), "print('hi')").unwrap();
        fs::write(root.join("Dockerfile"), "FROM python:3.11").unwrap();
        fs::write(root.join("docs/conf.py"), "project = 'x'").unwrap();
        fs::write(root.join("examples/run.py"), "run()").unwrap();
        fs::write(root.join("empty.py"), "   ").unwrap();
        fs::write(root.join("huge.py"), "y".repeat(60_000)).unwrap();

        let samples = collect_code_samples(root, &SampleLimits::default())
            .unwrap()
            .unwrap();

        let headers: Vec<&str> = samples
            .lines()
            .filter(|l| l.starts_with("=== "))
            .collect();
        let aligner = format!("=== {} ===", Path::new("src").join("aligner.c").display());
        let util = format!("=== {} ===", Path::new("src").join("util.py").display());
        assert_eq!(
            headers,
            vec![
                "=== main.py ===",
                aligner.as_str(),
                "=== Dockerfile ===",
                util.as_str(),
            ]
        );
        assert!(samples.contains(&"x".repeat(1_500)));
        assert!(!samples.contains(&"x".repeat(1_501)));
        assert!(!samples.contains("conf.py"));
        assert!(!samples.contains("run.py"));
        assert!(!samples.contains("huge.py"));
    }

    #[test]
    fn test_max_files_respected() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..12 {
            fs::write(dir.path().join(format!("mod{}.py", i)), "pass").unwrap();
        }
        let limits = SampleLimits {
            max_files: 3,
            ..SampleLimits::default()
        };
        let samples = collect_code_samples(dir.path(), &limits).unwrap().unwrap();
        assert_eq!(samples.matches("=== ").count(), 3);
    }

    #[test]
    fn test_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        assert!(collect_code_samples(dir.path(), &SampleLimits::default())
            .unwrap()
            .is_none());
    }
}
