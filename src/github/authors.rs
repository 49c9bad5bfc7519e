use crate::analysis::AuthorInfo;
use crate::discovery::read_named_file;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;
use tokio::process::Command;
use tracing::debug;

const MAX_AUTHORS: usize = 10;
const GIT_LOG_DEPTH: &str = "100";

fn readme_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)authors?[:\-\s]*([^\n]+)",
            r"(?i)contributors?[:\-\s]*([^\n]+)",
            r"(?i)developed?\s+by[:\-\s]*([^\n]+)",
            r"(?i)created?\s+by[:\-\s]*([^\n]+)",
            r"(?i)maintainers?[:\-\s]*([^\n]+)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").ok())
        .as_ref()
}

/// Collect authors from the README, packaging metadata and recent commits.
/// Deduplicated by case-insensitive name, at most ten.
pub async fn extract_authors(repo: &Path) -> Vec<AuthorInfo> {
    let mut authors = Vec::new();

    if let Some(readme) = read_named_file(repo, "README") {
        authors.extend(authors_from_readme(&readme));
    }
    if let Some(setup) = read_named_file(repo, "setup.py") {
        authors.extend(authors_from_setup_py(&setup));
    }
    if let Some(pyproject) = read_named_file(repo, "pyproject.toml") {
        authors.extend(authors_from_pyproject(&pyproject));
    }
    authors.extend(authors_from_git(repo).await);

    dedupe(authors)
}

pub fn authors_from_readme(readme: &str) -> Vec<AuthorInfo> {
    let mut authors = Vec::new();
    for pattern in readme_patterns() {
        for cap in pattern.captures_iter(readme) {
            let Some(text) = cap.get(1).map(|m| m.as_str().trim()) else {
                continue;
            };
            if text.is_empty() || text.chars().count() >= 100 {
                continue;
            }
            if let Some(author) = parse_author_text(text) {
                authors.push(author);
            }
        }
    }
    authors
}

/// `Jane Doe <jane@uni.edu>` style text to an author
pub fn parse_author_text(text: &str) -> Option<AuthorInfo> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '*' | '[' | ']' | '(' | ')' | '{' | '}'))
        .collect();
    let cleaned = cleaned.trim();

    let email_re = email_regex()?;
    let email = email_re.find(cleaned).map(|m| m.as_str().to_string());
    let name = email_re.replace_all(cleaned, "");
    let name: String = name.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let name = name.trim().trim_end_matches([',', ';']).trim();

    (name.chars().count() > 1).then(|| AuthorInfo {
        name: name.to_string(),
        email,
        github_username: None,
    })
}

pub fn authors_from_setup_py(content: &str) -> Vec<AuthorInfo> {
    static AUTHOR: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = AUTHOR
        .get_or_init(|| Regex::new(r#"author\s*=\s*["']([^"']+)["']"#).ok())
        .as_ref()
    else {
        return Vec::new();
    };

    re.captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| named(m.as_str().trim()))
        .collect()
}

/// Names inside `authors = [{ name = "..." }]` tables
pub fn authors_from_pyproject(content: &str) -> Vec<AuthorInfo> {
    static NAME: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = NAME
        .get_or_init(|| Regex::new(r#"name\s*=\s*["']([^"']+)["']"#).ok())
        .as_ref()
    else {
        return Vec::new();
    };

    let Some(start) = content.find("authors") else {
        return Vec::new();
    };
    let section = &content[start..];
    let end = section.find(']').map(|i| i + 1).unwrap_or(section.len());

    re.captures_iter(&section[..end])
        .filter_map(|cap| cap.get(1))
        .map(|m| named(m.as_str().trim()))
        .collect()
}

async fn authors_from_git(repo: &Path) -> Vec<AuthorInfo> {
    let output = Command::new("git")
        .arg("log")
        .arg("-n")
        .arg(GIT_LOG_DEPTH)
        .arg("--format=%an%x09%ae")
        .current_dir(repo)
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => {
            parse_git_log(&String::from_utf8_lossy(&out.stdout))
        }
        Ok(out) => {
            debug!(
                "git log failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
            Vec::new()
        }
        Err(e) => {
            debug!("Could not run git log: {}", e);
            Vec::new()
        }
    }
}

/// Lines of `name<TAB>email`
pub fn parse_git_log(log: &str) -> Vec<AuthorInfo> {
    let mut seen = HashSet::new();
    log.lines()
        .filter_map(|line| {
            let (name, email) = line.split_once('\t').unwrap_or((line, ""));
            let name = name.trim();
            if name.is_empty() || !seen.insert(name.to_string()) {
                return None;
            }
            Some(AuthorInfo {
                name: name.to_string(),
                email: email.contains('@').then(|| email.trim().to_string()),
                github_username: None,
            })
        })
        .collect()
}

pub fn dedupe(authors: Vec<AuthorInfo>) -> Vec<AuthorInfo> {
    let mut seen = HashSet::new();
    authors
        .into_iter()
        .filter(|a| {
            let key = a.name.trim().to_lowercase();
            key.chars().count() > 1 && seen.insert(key)
        })
        .take(MAX_AUTHORS)
        .collect()
}

fn named(name: &str) -> AuthorInfo {
    AuthorInfo {
        name: name.to_string(),
        email: None,
        github_username: None,
    }
}
