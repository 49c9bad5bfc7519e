use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to load env file '{path}': {reason}")]
    EnvFile { path: PathBuf, reason: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process failed with exit code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Agent reported an error: {0}")]
    Agent(String),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Inference backend unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a single extraction task. Always absorbed per task.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("{role}: inference call failed: {source}")]
    Transport {
        role: String,
        #[source]
        source: ProviderError,
    },

    #[error("{role}: response contained no JSON object (preview: {preview:?})")]
    MissingObject { role: String, preview: String },

    #[error("{role}: failed to decode JSON: {source} (preview: {preview:?})")]
    Decode {
        role: String,
        #[source]
        source: serde_json::Error,
        preview: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    Transport,
    Parse,
}

impl ExtractionError {
    pub fn role(&self) -> &str {
        match self {
            ExtractionError::Transport { role, .. }
            | ExtractionError::MissingObject { role, .. }
            | ExtractionError::Decode { role, .. } => role,
        }
    }

    pub fn kind(&self) -> ExtractionErrorKind {
        match self {
            ExtractionError::Transport { .. } => ExtractionErrorKind::Transport,
            ExtractionError::MissingObject { .. } | ExtractionError::Decode { .. } => {
                ExtractionErrorKind::Parse
            }
        }
    }
}

/// Failure of the concurrent wave as a whole, as opposed to one task in it.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Parallel dispatch exceeded its {0:?} deadline")]
    DispatchTimeout(Duration),
}

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("Not a GitHub repository URL: {0}")]
    InvalidUrl(String),

    #[error("Local repository path does not exist: {0}")]
    MissingLocalPath(PathBuf),

    #[error("git clone failed: {0}")]
    Clone(String),

    #[error("git clone timed out after {0:?}")]
    CloneTimeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to build glob pattern '{pattern}': {source}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("{tool} timed out after {timeout:?}")]
    Timeout {
        tool: &'static str,
        timeout: Duration,
    },

    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} produced no output: {stderr}")]
    NoOutput { tool: &'static str, stderr: String },

    #[error("Failed to parse {tool} output: {source}")]
    Parse {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write report: {0}")]
    WriteReport(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Insert rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
