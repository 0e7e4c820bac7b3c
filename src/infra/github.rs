use crate::app::ports::HttpRequest;
use crate::config::GithubConfig;
use crate::constants::GITHUB_ACCEPT;
use crate::error::{HarvestError, Result};
use crate::infra::http_client::RetryingHttp;
use crate::types::TreeEntry;
use reqwest::Url;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// GitHub REST and raw-content access on top of the retrying client.
pub struct GithubClient {
    http: RetryingHttp,
    api_base: String,
    raw_base: String,
    user_agent: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(http: RetryingHttp, config: &GithubConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            raw_base: config.raw_base.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            token: config.token.clone(),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn api_request(&self, url: &str) -> HttpRequest {
        let request = HttpRequest::get(url)
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", GITHUB_ACCEPT);
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Builds `{base}/{segments...}` with each segment path-encoded.
    fn join_url(base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base)
            .map_err(|e| HarvestError::Config(format!("Invalid base URL '{}': {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| HarvestError::Config(format!("Base URL '{}' cannot hold a path", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self.http.get(&self.api_request(url)).await?;
        serde_json::from_str(&response.body).map_err(|e| {
            HarvestError::invalid_response(url, format!("body is not JSON: {}", e))
        })
    }

    #[instrument(skip(self))]
    pub async fn resolve_branch_head(&self, owner: &str, repo: &str, branch: &str) -> Result<String> {
        let url = Self::join_url(&self.api_base, &["repos", owner, repo, "branches", branch])?;
        let data = self.get_json(url.as_str()).await?;
        let sha = data["commit"]["sha"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| HarvestError::invalid_response(url.as_str(), "commit.sha not found"))?;
        info!(sha, "resolved branch head");
        Ok(sha.to_string())
    }

    #[instrument(skip(self))]
    pub async fn fetch_tree(&self, owner: &str, repo: &str, sha: &str) -> Result<Vec<TreeEntry>> {
        let mut url = Self::join_url(&self.api_base, &["repos", owner, repo, "git", "trees", sha])?;
        url.query_pairs_mut().append_pair("recursive", "1");
        let mut data = self.get_json(url.as_str()).await?;

        if data["truncated"].as_bool().unwrap_or(false) {
            warn!("tree listing was truncated by GitHub; some files will be missed");
        }
        let tree = data
            .get_mut("tree")
            .filter(|t| t.is_array())
            .map(Value::take)
            .ok_or_else(|| HarvestError::invalid_response(url.as_str(), "tree not found"))?;
        let entries: Vec<TreeEntry> = serde_json::from_value(tree)
            .map_err(|e| HarvestError::invalid_response(url.as_str(), e.to_string()))?;
        info!(entries = entries.len(), "fetched repository tree");
        Ok(entries)
    }

    /// Raw file content at `reference` (branch name or commit sha).
    pub async fn fetch_raw(&self, owner: &str, repo: &str, reference: &str, path: &str) -> Result<String> {
        let mut segments = vec![owner, repo, reference];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let url = Self::join_url(&self.raw_base, &segments)?;
        let request = HttpRequest::get(url.as_str()).header("User-Agent", self.user_agent.as_str());
        Ok(self.http.get(&request).await?.body)
    }

    /// Any URL, fetched with the raw-content headers.
    pub async fn fetch_url(&self, url: &str) -> Result<String> {
        let request = HttpRequest::get(url).header("User-Agent", self.user_agent.as_str());
        Ok(self.http.get(&request).await?.body)
    }
}
