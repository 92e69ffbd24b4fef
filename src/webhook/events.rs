// GitHub webhook payloads and their conversion into core moderation events.

use serde::Deserialize;

use super::error::WebhookError;
use crate::core::moderation::{IssueEvent, IssueSnapshot, IssueState};

/// What the receiver should do with one delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    Ping,
    /// Acknowledged but not moderated
    Ignored,
    Moderate(IssueEvent),
}

#[derive(Debug, Deserialize)]
struct IssuesPayload {
    action: String,
    #[serde(default)]
    issue: Option<ApiIssue>,
    #[serde(default)]
    repository: Option<ApiRepository>,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    number: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    user: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    #[serde(default)]
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRepository {
    name: String,
    owner: ApiUser,
}

impl ApiIssue {
    fn into_snapshot(self) -> IssueSnapshot {
        IssueSnapshot {
            number: self.number,
            title: self.title,
            body: self.body,
            state: match self.state.as_deref() {
                Some("closed") => IssueState::Closed,
                _ => IssueState::Open,
            },
            author: self.user.and_then(|u| u.login),
        }
    }
}

/// Decide how to handle a delivery from its `X-GitHub-Event` name and raw body.
///
/// Only `issues` events with action `opened` or `edited` are moderated.
pub fn route_event(event_name: &str, body: &[u8]) -> Result<Routed, WebhookError> {
    match event_name {
        "ping" => return Ok(Routed::Ping),
        "issues" => {}
        _ => return Ok(Routed::Ignored),
    }

    let payload: IssuesPayload =
        serde_json::from_slice(body).map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

    if !matches!(payload.action.as_str(), "opened" | "edited") {
        return Ok(Routed::Ignored);
    }

    let repository = payload
        .repository
        .ok_or_else(|| WebhookError::InvalidPayload("missing repository".into()))?;
    let owner = repository
        .owner
        .login
        .ok_or_else(|| WebhookError::InvalidPayload("missing repository owner".into()))?;

    Ok(Routed::Moderate(IssueEvent {
        owner,
        repo: repository.name,
        issue: payload.issue.map(ApiIssue::into_snapshot),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issues_body(action: &str, issue: serde_json::Value) -> Vec<u8> {
        json!({
            "action": action,
            "issue": issue,
            "repository": {"name": "AstrBot", "owner": {"login": "AstrBotDevs"}},
            "sender": {"login": "octocat"}
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_opened_issue_is_moderated() {
        let body = issues_body(
            "opened",
            json!({
                "number": 3,
                "title": "Crash",
                "body": null,
                "state": "open",
                "user": {"login": "octocat", "id": 1}
            }),
        );

        let routed = route_event("issues", &body).unwrap();
        assert_eq!(
            routed,
            Routed::Moderate(IssueEvent {
                owner: "AstrBotDevs".to_string(),
                repo: "AstrBot".to_string(),
                issue: Some(IssueSnapshot {
                    number: 3,
                    title: Some("Crash".to_string()),
                    body: None,
                    state: IssueState::Open,
                    author: Some("octocat".to_string()),
                }),
            })
        );
    }

    #[test]
    fn test_edited_closed_issue_keeps_closed_state() {
        let body = issues_body(
            "edited",
            json!({"number": 4, "title": "x", "body": "y", "state": "closed", "user": null}),
        );

        let Routed::Moderate(event) = route_event("issues", &body).unwrap() else {
            panic!("expected Moderate");
        };
        let issue = event.issue.unwrap();
        assert_eq!(issue.state, IssueState::Closed);
        assert_eq!(issue.author, None);
    }

    #[test]
    fn test_null_issue_is_passed_through() {
        let body = issues_body("opened", serde_json::Value::Null);

        let Routed::Moderate(event) = route_event("issues", &body).unwrap() else {
            panic!("expected Moderate");
        };
        assert!(event.issue.is_none());
    }

    #[test]
    fn test_other_actions_and_events_are_ignored() {
        let body = issues_body("labeled", json!({"number": 1}));
        assert_eq!(route_event("issues", &body).unwrap(), Routed::Ignored);
        assert_eq!(route_event("push", b"{}").unwrap(), Routed::Ignored);
        assert_eq!(route_event("ping", b"{}").unwrap(), Routed::Ping);
    }

    #[test]
    fn test_garbage_payload_is_rejected() {
        assert!(matches!(
            route_event("issues", b"not json"),
            Err(WebhookError::InvalidPayload(_))
        ));
    }
}
