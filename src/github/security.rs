use crate::analysis::truncate_chars;
use crate::config::SecurityConfig;
use crate::error::ScanError;
use crate::provider::locate_binary;
use ignore::WalkBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

const MAX_DESCRIPTION_CHARS: usize = 200;
const MAX_CODE_ISSUES: usize = 5;
const CONDA_ENV_FILES: &[&str] = &["environment.yml", "environment.yaml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    fn from_label(label: Option<&str>) -> Self {
        match label.map(str::to_uppercase).as_deref() {
            Some("CRITICAL" | "HIGH") => Severity::High,
            Some("MEDIUM" | "MODERATE") => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

/// One auditor finding. `subject` is a package name for dependency
/// audits and `file:line` for code findings.
#[derive(Debug, Clone, PartialEq)]
pub struct Vulnerability {
    pub id: String,
    pub severity: Severity,
    pub subject: String,
    pub installed_version: Option<String>,
    pub fixed_version: Option<String>,
    pub description: String,
}

impl fmt::Display for Vulnerability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.severity, self.id, self.subject)?;
        if let Some(version) = &self.installed_version {
            write!(f, " {}", version)?;
        }
        write!(
            f,
            ": {}",
            truncate_chars(self.description.trim(), MAX_DESCRIPTION_CHARS)
        )?;
        if let Some(fixed) = &self.fixed_version {
            write!(f, " (fix: {})", fixed)?;
        }
        Ok(())
    }
}

/// What pip-audit should read
#[derive(Debug, PartialEq)]
enum AuditTarget {
    /// A `*requirements*.txt` at the repository root
    Requirements(PathBuf),
    /// `pip:` entries of a conda environment file
    CondaPip(Vec<String>),
    /// `pyproject.toml` or `setup.py` project
    Project,
}

/// Runs the installed Python auditors against a checkout.
///
/// Dependencies go through `uv audit` (with `uv.lock`), `safety` (with
/// `poetry.lock`) or `pip-audit`, and Python sources through `bandit`.
/// Tools that are not installed, fail or exceed the deadline contribute
/// nothing.
pub struct SecurityScanner {
    config: SecurityConfig,
    timeout: Duration,
}

impl SecurityScanner {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            config: config.clone(),
            timeout: Duration::from_secs(config.timeout_sec),
        }
    }

    pub async fn scan(&self, repo: &Path) -> Vec<Vulnerability> {
        let (mut found, code) = tokio::join!(self.check_dependencies(repo), self.check_code(repo));
        found.extend(code);
        info!(
            "Security scan found {} issues ({} high)",
            found.len(),
            found.iter().filter(|v| v.severity == Severity::High).count()
        );
        found
    }

    async fn check_dependencies(&self, repo: &Path) -> Vec<Vulnerability> {
        if repo.join("uv.lock").is_file() {
            if let Some(uv) = self.tool("uv", &self.config.uv) {
                match self
                    .run_json::<UvReport, _, _>("uv", &uv, ["audit", "--format", "json"], repo)
                    .await
                {
                    Ok(report) => return report.into_vulnerabilities(),
                    Err(e) => warn!("{}; falling back to pip-audit", e),
                }
            }
        } else if repo.join("poetry.lock").is_file() {
            if let Some(safety) = self.tool("safety", &self.config.safety) {
                match self
                    .run_json::<Vec<SafetyEntry>, _, _>("safety", &safety, ["check", "--json"], repo)
                    .await
                {
                    Ok(entries) => return entries.into_iter().map(SafetyEntry::into_vulnerability).collect(),
                    Err(e) => warn!("{}; falling back to pip-audit", e),
                }
            }
        }
        self.pip_audit(repo).await
    }

    async fn pip_audit(&self, repo: &Path) -> Vec<Vulnerability> {
        let Some(binary) = self.tool("pip-audit", &self.config.pip_audit) else {
            return Vec::new();
        };
        let Some(target) = audit_target(repo) else {
            debug!("No Python dependency manifest in {}", repo.display());
            return Vec::new();
        };

        // The temporary requirements file must outlive the pip-audit run
        let (target_args, _requirements_file): (Vec<OsString>, Option<NamedTempFile>) = match target {
            AuditTarget::Requirements(path) => (vec!["--requirement".into(), path.into()], None),
            AuditTarget::CondaPip(deps) => match write_requirements(&deps) {
                Ok(file) => (vec!["--requirement".into(), file.path().into()], Some(file)),
                Err(e) => {
                    warn!("Dependency audit skipped: {}", e);
                    return Vec::new();
                }
            },
            AuditTarget::Project => (vec![".".into()], None),
        };
        let mut args: Vec<OsString> = vec!["--format=json".into()];
        args.extend(target_args);

        match self
            .run_json::<PipAuditReport, _, _>("pip-audit", &binary, args, repo)
            .await
        {
            Ok(report) => report.into_vulnerabilities(),
            Err(e) => {
                warn!("Dependency audit skipped: {}", e);
                Vec::new()
            }
        }
    }

    async fn check_code(&self, repo: &Path) -> Vec<Vulnerability> {
        let Some(bandit) = self.tool("bandit", &self.config.bandit) else {
            return Vec::new();
        };
        if !has_python_sources(repo) {
            debug!("No Python sources for bandit in {}", repo.display());
            return Vec::new();
        }

        match self
            .run_json::<BanditReport, _, _>("bandit", &bandit, ["-f", "json", "-q", "-r", "."], repo)
            .await
        {
            Ok(report) => report.into_vulnerabilities(),
            Err(e) => {
                warn!("Code scan skipped: {}", e);
                Vec::new()
            }
        }
    }

    fn tool(&self, name: &'static str, configured: &Path) -> Option<PathBuf> {
        let found = locate_binary(configured);
        if found.is_none() {
            info!("{} is not installed; skipping", name);
        }
        found
    }

    async fn run_json<T, I, S>(
        &self,
        tool: &'static str,
        binary: &Path,
        args: I,
        cwd: &Path,
    ) -> Result<T, ScanError>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        debug!("Running {} in {}", tool, cwd.display());
        let mut cmd = Command::new(binary);
        cmd.args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ScanError::Timeout {
                tool,
                timeout: self.timeout,
            })?
            .map_err(|source| ScanError::Spawn { tool, source })?;

        // Auditors exit non-zero when they find something, so only stdout counts
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Err(ScanError::NoOutput {
                tool,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        serde_json::from_str(stdout).map_err(|source| ScanError::Parse { tool, source })
    }
}

fn audit_target(repo: &Path) -> Option<AuditTarget> {
    let mut names: Vec<String> = std::fs::read_dir(repo)
        .ok()?
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    if let Some(requirements) = names
        .iter()
        .find(|n| n.contains("requirements") && n.ends_with(".txt"))
    {
        return Some(AuditTarget::Requirements(PathBuf::from(requirements)));
    }

    for env_file in CONDA_ENV_FILES {
        let Ok(content) = std::fs::read_to_string(repo.join(env_file)) else {
            continue;
        };
        let deps = conda_pip_dependencies(&content);
        if !deps.is_empty() {
            return Some(AuditTarget::CondaPip(deps));
        }
    }

    ["pyproject.toml", "setup.py"]
        .iter()
        .any(|manifest| names.iter().any(|n| n == manifest))
        .then_some(AuditTarget::Project)
}

/// Entries under `dependencies: [- pip: [...]]` of a conda environment file
fn conda_pip_dependencies(content: &str) -> Vec<String> {
    let Ok(env) = serde_yaml::from_str::<serde_yaml::Value>(content) else {
        return Vec::new();
    };
    env.get("dependencies")
        .and_then(serde_yaml::Value::as_sequence)
        .into_iter()
        .flatten()
        .filter_map(|dep| dep.get("pip").and_then(serde_yaml::Value::as_sequence))
        .flatten()
        .filter_map(serde_yaml::Value::as_str)
        .map(str::to_string)
        .collect()
}

fn write_requirements(deps: &[String]) -> Result<NamedTempFile, ScanError> {
    let mut file = tempfile::Builder::new()
        .prefix("conda-pip-")
        .suffix(".txt")
        .tempfile()?;
    writeln!(file, "{}", deps.join("\n"))?;
    file.flush()?;
    Ok(file)
}

fn has_python_sources(repo: &Path) -> bool {
    WalkBuilder::new(repo)
        .hidden(true)
        .build()
        .filter_map(Result::ok)
        .any(|e| e.path().extension().is_some_and(|ext| ext == "py"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PipAuditReport {
    dependencies: Vec<PipAuditDependency>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PipAuditDependency {
    name: String,
    version: Option<String>,
    vulns: Vec<PipAuditVuln>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PipAuditVuln {
    id: String,
    fix_versions: Vec<String>,
    description: String,
    severity: Option<String>,
}

impl PipAuditReport {
    fn into_vulnerabilities(self) -> Vec<Vulnerability> {
        self.dependencies
            .into_iter()
            .flat_map(|dep| {
                let name = dep.name;
                let version = dep.version;
                dep.vulns.into_iter().map(move |vuln| Vulnerability {
                    id: or_unknown(vuln.id),
                    severity: Severity::from_label(vuln.severity.as_deref()),
                    subject: name.clone(),
                    installed_version: version.clone(),
                    fixed_version: (!vuln.fix_versions.is_empty())
                        .then(|| vuln.fix_versions.join(", ")),
                    description: vuln.description,
                })
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UvReport {
    vulnerabilities: Vec<UvVulnerability>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UvVulnerability {
    id: String,
    severity: Option<String>,
    package: String,
    installed_version: Option<String>,
    fixed_version: Option<String>,
    summary: String,
}

impl UvReport {
    fn into_vulnerabilities(self) -> Vec<Vulnerability> {
        self.vulnerabilities
            .into_iter()
            .map(|v| Vulnerability {
                id: or_unknown(v.id),
                severity: Severity::from_label(v.severity.as_deref()),
                subject: v.package,
                installed_version: v.installed_version,
                fixed_version: v.fixed_version,
                description: v.summary,
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SafetyEntry {
    id: String,
    package: String,
    installed_version: Option<String>,
    fixed_version: Option<String>,
    vulnerability: String,
}

impl SafetyEntry {
    // safety does not grade its advisories
    fn into_vulnerability(self) -> Vulnerability {
        Vulnerability {
            id: or_unknown(self.id),
            severity: Severity::High,
            subject: self.package,
            installed_version: self.installed_version,
            fixed_version: self.fixed_version,
            description: self.vulnerability,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BanditReport {
    results: Vec<BanditIssue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BanditIssue {
    test_id: String,
    issue_severity: Option<String>,
    issue_text: String,
    filename: String,
    line_number: Option<u64>,
}

impl BanditReport {
    /// High then medium issues, at most `MAX_CODE_ISSUES`; low ones are noise
    fn into_vulnerabilities(self) -> Vec<Vulnerability> {
        let mut issues: Vec<Vulnerability> = self
            .results
            .into_iter()
            .map(|issue| {
                let location = match issue.line_number {
                    Some(line) => format!("{}:{}", issue.filename.trim_start_matches("./"), line),
                    None => issue.filename.trim_start_matches("./").to_string(),
                };
                Vulnerability {
                    id: or_unknown(issue.test_id),
                    severity: Severity::from_label(issue.issue_severity.as_deref()),
                    subject: location,
                    installed_version: None,
                    fixed_version: None,
                    description: issue.issue_text,
                }
            })
            .filter(|v| v.severity != Severity::Low)
            .collect();
        issues.sort_by_key(|v| v.severity);
        issues.truncate(MAX_CODE_ISSUES);
        issues
    }
}

fn or_unknown(id: String) -> String {
    if id.trim().is_empty() {
        "UNKNOWN".to_string()
    } else {
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    const PIP_AUDIT_OUTPUT: &str = r#"{"dependencies": [
        {"name": "requests", "version": "2.19.0", "vulns": [
            {"id": "PYSEC-2023-74", "fix_versions": ["2.31.0"], "description": "Proxy-Authorization header leaked on redirect"}
        ]},
        {"name": "numpy", "version": "1.26.0", "vulns": []}
    ]}"#;

    fn config(tools: &Path) -> SecurityConfig {
        SecurityConfig {
            enabled: true,
            timeout_sec: 10,
            pip_audit: tools.join("pip-audit"),
            safety: tools.join("safety"),
            uv: tools.join("uv"),
            bandit: tools.join("bandit"),
        }
    }

    #[cfg(unix)]
    fn stub_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::from_label(Some("critical")), Severity::High);
        assert_eq!(Severity::from_label(Some("Moderate")), Severity::Medium);
        assert_eq!(Severity::from_label(Some("low")), Severity::Low);
        assert_eq!(Severity::from_label(None), Severity::Low);
    }

    #[test]
    fn test_pip_audit_report_formatted() {
        let report: PipAuditReport = serde_json::from_str(PIP_AUDIT_OUTPUT).unwrap();
        let found = report.into_vulnerabilities();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].to_string(),
            "LOW PYSEC-2023-74 requests 2.19.0: Proxy-Authorization header leaked on redirect (fix: 2.31.0)"
        );
    }

    #[test]
    fn test_bandit_keeps_most_severe_issues() {
        let mut results = vec![json!({
            "test_id": "B101", "issue_severity": "LOW",
            "issue_text": "assert used", "filename": "./tests/test_a.py", "line_number": 3
        })];
        for line in 1..=6 {
            results.push(json!({
                "test_id": "B108", "issue_severity": "MEDIUM",
                "issue_text": "insecure temp file", "filename": "./pipeline.py", "line_number": line
            }));
        }
        results.push(json!({
            "test_id": "B602", "issue_severity": "HIGH",
            "issue_text": "subprocess call with shell=True", "filename": "./run.py", "line_number": 12
        }));
        let report: BanditReport = serde_json::from_value(json!({"results": results})).unwrap();

        let found = report.into_vulnerabilities();
        assert_eq!(found.len(), MAX_CODE_ISSUES);
        assert_eq!(
            found[0].to_string(),
            "HIGH B602 run.py:12: subprocess call with shell=True"
        );
        assert!(found[1..].iter().all(|v| v.severity == Severity::Medium));
        assert!(found.iter().all(|v| v.id != "B101"));
    }

    #[test]
    fn test_conda_pip_dependencies() {
        let env = "name: tool\ndependencies:\n  - python=3.11\n  - samtools\n  - pip:\n    - pysam==0.22.0\n    - requests\n";
        assert_eq!(
            conda_pip_dependencies(env),
            vec!["pysam==0.22.0".to_string(), "requests".to_string()]
        );
        assert!(conda_pip_dependencies("dependencies: [python]").is_empty());
        assert!(conda_pip_dependencies(": not yaml :").is_empty());
    }

    #[test]
    fn test_audit_target_prefers_requirements() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(audit_target(dir.path()), None);

        fs::write(dir.path().join("pyproject.toml"), "[project]").unwrap();
        assert_eq!(audit_target(dir.path()), Some(AuditTarget::Project));

        fs::write(
            dir.path().join("environment.yml"),
            "dependencies:\n  - pip:\n    - pysam\n",
        )
        .unwrap();
        assert_eq!(
            audit_target(dir.path()),
            Some(AuditTarget::CondaPip(vec!["pysam".to_string()]))
        );

        fs::write(dir.path().join("requirements-dev.txt"), "pytest").unwrap();
        fs::write(dir.path().join("requirements.txt"), "requests").unwrap();
        assert_eq!(
            audit_target(dir.path()),
            Some(AuditTarget::Requirements(PathBuf::from("requirements-dev.txt")))
        );
    }

    #[tokio::test]
    async fn test_missing_tools_are_skipped() {
        let tools = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();
        fs::write(repo.path().join("requirements.txt"), "requests==2.19.0").unwrap();
        fs::write(repo.path().join("run.py"), "import os").unwrap();

        let scanner = SecurityScanner::new(&config(tools.path()));
        assert!(scanner.scan(repo.path()).await.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stubbed_pip_audit_findings_collected() {
        let tools = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();
        fs::write(repo.path().join("requirements.txt"), "requests==2.19.0").unwrap();
        let args_file = tools.path().join("pip-audit.args");
        stub_tool(
            tools.path(),
            "pip-audit",
            &format!(
                "printf '%s\\n' \"$@\" > '{}'\ncat <<'EOF'\n{}\nEOF\nexit 1",
                args_file.display(),
                PIP_AUDIT_OUTPUT
            ),
        );

        let found = SecurityScanner::new(&config(tools.path()))
            .scan(repo.path())
            .await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "PYSEC-2023-74");
        assert_eq!(found[0].fixed_version.as_deref(), Some("2.31.0"));
        let args = fs::read_to_string(&args_file).unwrap();
        assert_eq!(
            args.lines().collect::<Vec<_>>(),
            vec!["--format=json", "--requirement", "requirements.txt"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_uv_audit_falls_back_to_pip_audit() {
        let tools = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();
        fs::write(repo.path().join("uv.lock"), "version = 1").unwrap();
        fs::write(repo.path().join("requirements.txt"), "requests==2.19.0").unwrap();
        stub_tool(tools.path(), "uv", "echo 'error: unrecognized subcommand audit' >&2\nexit 2");
        stub_tool(
            tools.path(),
            "pip-audit",
            &format!("cat <<'EOF'\n{}\nEOF", PIP_AUDIT_OUTPUT),
        );

        let found = SecurityScanner::new(&config(tools.path()))
            .scan(repo.path())
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].subject, "requests");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hanging_tool_hits_deadline() {
        let tools = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();
        fs::write(repo.path().join("run.py"), "import subprocess").unwrap();
        stub_tool(tools.path(), "bandit", "sleep 5");

        let scanner = SecurityScanner {
            config: config(tools.path()),
            timeout: Duration::from_millis(200),
        };
        let start = std::time::Instant::now();
        assert!(scanner.scan(repo.path()).await.is_empty());
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
