use crate::analysis::RepositoryInfo;
use crate::config::GithubConfig;
use crate::error::GitHubError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Split a GitHub URL into `(owner, repo)`
pub fn parse_github_url(repo_url: &str) -> Result<(String, String), GitHubError> {
    let trimmed = repo_url.trim();
    let invalid = || GitHubError::InvalidUrl(repo_url.to_string());

    let path = if let Some(rest) = trimmed.strip_prefix("git@github.com:") {
        rest.to_string()
    } else {
        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };
        let parsed = url::Url::parse(&with_scheme).map_err(|_| invalid())?;
        match parsed.host_str() {
            Some("github.com") | Some("www.github.com") => parsed.path().to_string(),
            _ => return Err(invalid()),
        }
    };

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next().ok_or_else(invalid)?;
    let repo = segments.next().ok_or_else(invalid)?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return Err(invalid());
    }
    Ok((owner.to_string(), repo.to_string()))
}

/// Last path segment without `.git`; works for any URL or local path
pub fn repo_name_from_url(repo_url: &str) -> String {
    let trimmed = repo_url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: Option<String>,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    license: Option<LicenseResponse>,
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    name: Option<String>,
}

pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &GithubConfig) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("biotools-agent"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Repository metadata. Any failure degrades to name and URL only.
    pub async fn fetch_repository(&self, repo_url: &str) -> RepositoryInfo {
        let name = repo_name_from_url(repo_url);
        let (owner, repo) = match parse_github_url(repo_url) {
            Ok(parts) => parts,
            Err(e) => {
                debug!("Skipping GitHub API lookup: {}", e);
                return RepositoryInfo::basic(name, repo_url);
            }
        };

        match self.get_repo(&owner, &repo).await {
            Ok(Some(data)) => {
                info!("Fetched GitHub metadata: {} stars", data.stargazers_count);
                RepositoryInfo {
                    name: data.name.unwrap_or(repo),
                    url: repo_url.to_string(),
                    description: data.description,
                    language: data.language,
                    stars: data.stargazers_count,
                    forks: data.forks_count,
                    license: data.license.and_then(|l| l.name),
                }
            }
            Ok(None) => RepositoryInfo::basic(repo, repo_url),
            Err(e) => {
                warn!("Failed to fetch repository metadata: {}", e);
                RepositoryInfo::basic(repo, repo_url)
            }
        }
    }

    async fn get_repo(&self, owner: &str, repo: &str) -> Result<Option<RepoResponse>, GitHubError> {
        let url = format!("{}/repos/{}/{}", self.api_base, owner, repo);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }
        let mut response = request.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.token.is_some() {
            warn!("GitHub rejected the token; retrying anonymously");
            response = self.client.get(&url).send().await?;
        }

        if !response.status().is_success() {
            warn!("GitHub API returned {} for {}/{}", response.status(), owner, repo);
            return Ok(None);
        }

        Ok(Some(response.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_github_url_forms() {
        let expected = ("lh3".to_string(), "bwa".to_string());
        assert_eq!(parse_github_url("https://github.com/lh3/bwa").unwrap(), expected);
        assert_eq!(parse_github_url("https://github.com/lh3/bwa.git").unwrap(), expected);
        assert_eq!(parse_github_url("http://github.com/lh3/bwa/").unwrap(), expected);
        assert_eq!(parse_github_url("github.com/lh3/bwa").unwrap(), expected);
        assert_eq!(parse_github_url("git@github.com:lh3/bwa.git").unwrap(), expected);
        assert_eq!(
            parse_github_url("https://github.com/lh3/bwa/tree/master").unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_github_url_rejects_others() {
        assert!(parse_github_url("https://gitlab.com/a/b").is_err());
        assert!(parse_github_url("https://github.com/only-owner").is_err());
        assert!(parse_github_url("file:///tmp/repo").is_err());
    }

    #[test]
    fn test_repo_name_from_url() {
        assert_eq!(repo_name_from_url("https://github.com/lh3/bwa.git"), "bwa");
        assert_eq!(repo_name_from_url("https://github.com/lh3/bwa/"), "bwa");
        assert_eq!(repo_name_from_url("git@github.com:lh3/bwa.git"), "bwa");
        assert_eq!(repo_name_from_url("/tmp/checkouts/my-tool"), "my-tool");
    }

    fn client(server: &MockServer, token: Option<&str>) -> GitHubClient {
        GitHubClient::new(&GithubConfig {
            token: token.map(str::to_string),
            api_base: server.uri(),
            ..GithubConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_repository_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/lh3/bwa"))
            .and(header("authorization", "token ghp_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "bwa",
                "description": "Burrow-Wheeler Aligner",
                "language": "C",
                "stargazers_count": 1500,
                "forks_count": 550,
                "license": {"name": "GNU General Public License v3.0"}
            })))
            .mount(&server)
            .await;

        let info = client(&server, Some("ghp_test"))
            .fetch_repository("https://github.com/lh3/bwa")
            .await;
        assert_eq!(info.stars, 1500);
        assert_eq!(info.language.as_deref(), Some("C"));
        assert_eq!(info.license.as_deref(), Some("GNU General Public License v3.0"));
        assert_eq!(info.url, "https://github.com/lh3/bwa");
    }

    #[tokio::test]
    async fn test_unauthorized_token_retried_anonymously() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"name": "r", "stargazers_count": 3})),
            )
            .mount(&server)
            .await;

        let info = client(&server, Some("bad")).fetch_repository("https://github.com/o/r").await;
        assert_eq!(info.stars, 3);
    }

    #[tokio::test]
    async fn test_api_failure_degrades_to_basic_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let info = client(&server, None).fetch_repository("https://github.com/o/missing.git").await;
        assert_eq!(info, RepositoryInfo::basic("missing", "https://github.com/o/missing.git"));
    }
}
