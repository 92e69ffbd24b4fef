use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::core::github::{GithubError, GithubUser, IssuePlatform, IssueRef};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Minimal GitHub REST API client. It deliberately exposes only the calls the core layer needs.
pub struct GithubApiClient {
    client: Client,
    base_url: String,
}

impl GithubApiClient {
    pub fn new(token: Option<String>, base_url: Option<String>) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Accept",
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("User-Agent", HeaderValue::from_static("issue-guard/0.1"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        if let Some(token) = token {
            headers.insert(
                "Authorization",
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| GithubError::Api(e.to_string()))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GithubError::Http(e.to_string()))?;

        let base_url = base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn issue_url(&self, issue: &IssueRef) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}",
            self.base_url, issue.owner, issue.repo, issue.number
        )
    }

    fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, GithubError> {
        let resp = request
            .send()
            .await
            .map_err(|e| GithubError::Http(e.to_string()))?;

        check_status(resp.status(), what)?;
        Ok(resp)
    }
}

/// Map a non-success status to an error.
fn check_status(status: StatusCode, what: &str) -> Result<(), GithubError> {
    if status == StatusCode::FORBIDDEN {
        return Err(GithubError::Api(format!(
            "GitHub API rate limit hit or token missing permission ({})",
            what
        )));
    }
    if !status.is_success() {
        return Err(GithubError::Api(format!(
            "GitHub returned {} for {}",
            status, what
        )));
    }
    Ok(())
}

#[async_trait]
impl IssuePlatform for GithubApiClient {
    async fn get_user(&self, login: &str) -> Result<GithubUser, GithubError> {
        let url = format!("{}/users/{}", self.base_url, login);
        let resp = self.send(self.client.get(url), "user lookup").await?;

        let user: ApiUser = resp
            .json()
            .await
            .map_err(|e| GithubError::Api(e.to_string()))?;

        let created_at = user
            .created_at
            .as_deref()
            .and_then(Self::parse_datetime)
            .ok_or_else(|| GithubError::Api(format!("No valid created_at for user {}", login)))?;

        Ok(GithubUser {
            login: user.login.unwrap_or_else(|| login.to_string()),
            created_at,
        })
    }

    async fn add_labels(&self, issue: &IssueRef, labels: &[String]) -> Result<(), GithubError> {
        let url = format!("{}/labels", self.issue_url(issue));
        self.send(
            self.client.post(url).json(&json!({ "labels": labels })),
            "add labels",
        )
        .await?;
        Ok(())
    }

    async fn create_comment(&self, issue: &IssueRef, body: &str) -> Result<(), GithubError> {
        let url = format!("{}/comments", self.issue_url(issue));
        self.send(
            self.client.post(url).json(&json!({ "body": body })),
            "create comment",
        )
        .await?;
        Ok(())
    }

    async fn close_as_not_planned(&self, issue: &IssueRef) -> Result<(), GithubError> {
        self.send(
            self.client.patch(self.issue_url(issue)).json(&json!({
                "state": "closed",
                "state_reason": "not_planned",
            })),
            "close issue",
        )
        .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: Option<String>,
    created_at: Option<String>,
}
