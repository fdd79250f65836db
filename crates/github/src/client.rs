//! Authenticated GitHub REST client.

use std::time::Duration;

use async_trait::async_trait;
use model::{
    ApiError, Credentials, Issue, NewIssue, NewPullRequest, PullRequest, Repository,
    RepositoryHost, RepositoryId,
};
use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::ClientError;

/// Public GitHub API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Page size requested when listing repositories (the API maximum).
const PER_PAGE: usize = 100;

/// Default upper bound on pages fetched by one listing.
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// Connection settings for [`GithubClient`].
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API root, e.g. `https://api.github.com` or `https://ghe.example/api/v3`.
    pub base_url: String,
    /// `User-Agent` header value; GitHub rejects requests without one.
    pub user_agent: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Pages of `/user/repos` fetched before a listing fails with
    /// [`ApiError::ListingTruncated`].
    pub max_pages: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: concat!("forkbot/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// GitHub REST client acting as the bot account.
///
/// Every request carries HTTP basic-auth credentials. Non-success statuses
/// become [`ApiError::Status`]; nothing is retried.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    max_pages: u32,
}

impl GithubClient {
    /// Creates a client for `config`, authenticating as `credentials`.
    pub fn new(config: GithubConfig, credentials: Credentials) -> Result<Self, ClientError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|source| ClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
                source,
            })?;
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            http,
            base_url,
            credentials,
            max_pages: config.max_pages.max(1),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|e| ApiError::InvalidRequest {
            message: format!("invalid request URL {raw}: {e}"),
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url).basic_auth(
            self.credentials.user().as_str(),
            Some(self.credentials.password()),
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = send(self.request(Method::GET, url)).await?;
        response.json::<T>().await.map_err(transport_error)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = send(self.request(Method::POST, url).json(body)).await?;
        response.json::<T>().await.map_err(transport_error)
    }
}

#[async_trait]
impl RepositoryHost for GithubClient {
    #[instrument(skip(self))]
    async fn list_repositories(&self) -> Result<Vec<Repository>, ApiError> {
        debug!("fetch repos");
        let mut repos = Vec::new();
        for page in 1..=self.max_pages {
            let mut url = self.endpoint("/user/repos")?;
            url.query_pairs_mut()
                .append_pair("affiliation", "owner")
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());
            let batch: Vec<Repository> = self.get_json(url).await?;
            let last = batch.len() < PER_PAGE;
            repos.extend(batch);
            if last {
                return Ok(repos);
            }
        }
        warn!(pages = self.max_pages, "repository listing truncated");
        Err(ApiError::ListingTruncated {
            pages: self.max_pages,
        })
    }

    #[instrument(skip(self))]
    async fn delete_repository(&self, name: &str) -> Result<(), ApiError> {
        debug!("remove repo");
        let repo = RepositoryId::from_parts(self.credentials.user().as_str(), name).map_err(
            |e| ApiError::InvalidRequest {
                message: e.to_string(),
            },
        )?;
        let url = self.endpoint(&format!("/repos/{}/{}", repo.owner(), repo.short_name()))?;
        send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn create_fork(&self, repo: &RepositoryId) -> Result<(), ApiError> {
        debug!("fork");
        let url = self.endpoint(&format!("/repos/{}/{}/forks", repo.owner(), repo.short_name()))?;
        send(self.request(Method::POST, url).json(&serde_json::json!({}))).await?;
        Ok(())
    }

    #[instrument(skip(self, issue), fields(repo = %repo, title = %issue.title))]
    async fn create_issue(&self, repo: &RepositoryId, issue: &NewIssue) -> Result<Issue, ApiError> {
        debug!("issue");
        self.post_json(
            &format!("/repos/{}/{}/issues", repo.owner(), repo.short_name()),
            issue,
        )
        .await
    }

    #[instrument(skip(self, pull), fields(repo = %repo, head = %pull.head))]
    async fn create_pull_request(
        &self,
        repo: &RepositoryId,
        pull: &NewPullRequest,
    ) -> Result<PullRequest, ApiError> {
        debug!("pull request");
        self.post_json(
            &format!("/repos/{}/{}/pulls", repo.owner(), repo.short_name()),
            pull,
        )
        .await
    }
}

/// Sends `request` and turns any non-2xx status into [`ApiError::Status`].
pub(crate) async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    if !status.is_success() {
        debug!(status = status.as_u16(), "request rejected");
        return Err(ApiError::status(status.as_u16(), status.canonical_reason()));
    }
    Ok(response)
}

pub(crate) fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode {
            message: err.to_string(),
        }
    } else {
        ApiError::Transport {
            message: err.to_string(),
        }
    }
}
