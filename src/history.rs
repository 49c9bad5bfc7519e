use crate::analysis::DispatchPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const HISTORY_DIR: &str = ".biotools";
const HISTORY_FILE: &str = "history.json";

/// Past analyses recorded under the output directory
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct History {
    pub runs: Vec<RunEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    pub id: String,
    pub repo_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_sec: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    pub path: DispatchPath,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub failed_roles: Vec<String>,
    #[serde(default)]
    pub reports: Vec<PathBuf>,
}

impl History {
    /// Load history from the output directory; unreadable files start fresh
    pub fn load(output_dir: &Path) -> Self {
        let path = Self::history_path(output_dir);
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    tracing::warn!("Ignoring corrupt history file {}: {}", path.display(), e);
                    Self::default()
                }),
                Err(_) => Self::default(),
            }
        } else {
            Self::default()
        }
    }

    pub fn save(&self, output_dir: &Path) -> std::io::Result<()> {
        let dir = output_dir.join(HISTORY_DIR);
        fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(HISTORY_FILE), json)
    }

    /// Most recent analysis of `repo_url`
    pub fn last_run(&self, repo_url: &str) -> Option<&RunEntry> {
        let wanted = normalize_url(repo_url);
        self.runs
            .iter()
            .filter(|r| normalize_url(&r.repo_url) == wanted)
            .max_by_key(|r| r.started_at)
    }

    pub fn record(&mut self, entry: RunEntry) {
        self.runs.push(entry);
    }

    fn history_path(output_dir: &Path) -> PathBuf {
        output_dir.join(HISTORY_DIR).join(HISTORY_FILE)
    }
}

fn normalize_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed
        .strip_suffix(".git")
        .unwrap_or(trimmed)
        .to_lowercase()
}
