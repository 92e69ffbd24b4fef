use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by calls against the code-hosting platform.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API error: {0}")]
    Api(String),
    #[error("GitHub request failed: {0}")]
    Http(String),
}

/// Points at one issue in one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl std::fmt::Display for IssueRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// The only user fields moderation cares about.
#[derive(Debug, Clone)]
pub struct GithubUser {
    pub login: String,
    pub created_at: DateTime<Utc>,
}

impl GithubUser {
    /// Fractional days between account creation and `now`.
    pub fn account_age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_milliseconds() as f64 / (1000.0 * 60.0 * 60.0 * 24.0)
    }
}

/// Trait describing the platform operations needed by the moderation service.
#[async_trait]
pub trait IssuePlatform: Send + Sync {
    async fn get_user(&self, login: &str) -> Result<GithubUser, GithubError>;
    async fn add_labels(&self, issue: &IssueRef, labels: &[String]) -> Result<(), GithubError>;
    async fn create_comment(&self, issue: &IssueRef, body: &str) -> Result<(), GithubError>;
    /// Close the issue with `state_reason = "not_planned"`.
    async fn close_as_not_planned(&self, issue: &IssueRef) -> Result<(), GithubError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_account_age_days_is_fractional() {
        let now = Utc::now();
        let user = GithubUser {
            login: "newbie".to_string(),
            created_at: now - Duration::hours(36),
        };

        let age = user.account_age_days(now);
        assert!((age - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_issue_ref_display() {
        let issue = IssueRef {
            owner: "AstrBotDevs".to_string(),
            repo: "AstrBot".to_string(),
            number: 42,
        };
        assert_eq!(issue.to_string(), "AstrBotDevs/AstrBot#42");
    }
}
