// Moderation service - the decision pipeline for a single issue event.
//
// This service handles:
// - Skipping events with no issue or an already closed issue
// - Heuristic evaluation (with an optional account age lookup)
// - Classification through the injected classifier
// - Label, comment and close, each attempted independently
//
// NO HTTP or webhook dependencies here - just the platform and classifier traits.

use super::heuristics;
use super::moderation_models::{
    ActionReport, ActionStep, HeuristicConfig, HeuristicResult, IssueEvent, IssueState,
    ModerationDecision, ModerationOutcome, SkipReason,
};
use crate::core::ai::SpamClassifier;
use crate::core::github::{GithubError, IssuePlatform, IssueRef};
use chrono::Utc;

pub const SPAM_LABEL: &str = "spam";

const SPAM_NOTICE: &str = "注意：此 issue 已被自动识别为垃圾信息并已关闭。";
const SPAM_APPEAL: &str = "如认为这是误判，请补充更多有效信息后重新提交或联系维护者。";

/// Build the comment posted on an issue classified as spam.
pub fn compose_spam_comment(decision: &ModerationDecision) -> String {
    let mut lines = vec![SPAM_NOTICE.to_string()];

    if !decision.reason.is_empty() {
        lines.push(format!("原因：{}", decision.reason));
    }

    lines.push(SPAM_APPEAL.to_string());
    lines.join("\n")
}

/// Issue moderation service.
pub struct ModerationService<P: IssuePlatform, C: SpamClassifier> {
    platform: P,
    classifier: C,
    config: HeuristicConfig,
}

impl<P, C> ModerationService<P, C>
where
    P: IssuePlatform,
    C: SpamClassifier,
{
    pub fn new(platform: P, classifier: C, config: HeuristicConfig) -> Self {
        Self {
            platform,
            classifier,
            config,
        }
    }

    /// Days since the author's account was created, or `None` if it can't be determined.
    async fn resolve_account_age(&self, login: Option<&str>) -> Option<f64> {
        let login = login?;

        match self.platform.get_user(login).await {
            Ok(user) => {
                let age = user.account_age_days(Utc::now());
                tracing::debug!(login = %user.login, account_age_days = age, "Resolved account age");
                Some(age)
            }
            Err(err) => {
                tracing::warn!(
                    login = login,
                    error = %err,
                    "Failed to fetch user, skipping account age check"
                );
                None
            }
        }
    }

    /// Run the full pipeline for one `issues.opened` / `issues.edited` event.
    ///
    /// Never returns an error: every failure is logged and folded into the outcome.
    pub async fn handle_issue_event(&self, event: &IssueEvent) -> ModerationOutcome {
        let Some(issue) = event.issue.as_ref() else {
            return ModerationOutcome::Skipped(SkipReason::MissingIssue);
        };

        if issue.state == IssueState::Closed {
            tracing::debug!(issue_number = issue.number, "Issue already closed, ignoring");
            return ModerationOutcome::Skipped(SkipReason::AlreadyClosed);
        }

        let input = issue.input();
        let account_age = self.resolve_account_age(input.author.as_deref()).await;
        let HeuristicResult { signals } = heuristics::evaluate(&self.config, &input, account_age);

        let decision = match self.classifier.classify(&input, &signals).await {
            Ok(Some(decision)) => decision,
            Ok(None) => {
                tracing::error!(
                    issue_number = issue.number,
                    "Could not parse the model verdict, skipping"
                );
                return ModerationOutcome::DecisionUnavailable;
            }
            Err(err) => {
                tracing::error!(
                    issue_number = issue.number,
                    error = %err,
                    "Spam classification failed"
                );
                return ModerationOutcome::ClassificationFailed;
            }
        };

        tracing::info!(
            issue_number = issue.number,
            is_spam = decision.is_spam,
            heuristic_signals = ?signals,
            "AI moderation finished"
        );

        if !decision.is_spam {
            return ModerationOutcome::NotSpam { signals };
        }

        let issue_ref = IssueRef {
            owner: event.owner.clone(),
            repo: event.repo.clone(),
            number: issue.number,
        };
        let reports = self.apply_spam_actions(&issue_ref, &decision).await;

        ModerationOutcome::Acted {
            signals,
            reason: decision.reason,
            reports,
        }
    }

    /// Label, comment and close. A failed step never stops the next one.
    async fn apply_spam_actions(
        &self,
        issue: &IssueRef,
        decision: &ModerationDecision,
    ) -> Vec<ActionReport> {
        let labels = [SPAM_LABEL.to_string()];
        let comment = compose_spam_comment(decision);

        let label = report(
            issue,
            ActionStep::AddLabel,
            self.platform.add_labels(issue, &labels).await,
        );
        let comment = report(
            issue,
            ActionStep::Comment,
            self.platform.create_comment(issue, &comment).await,
        );
        let close = report(
            issue,
            ActionStep::Close,
            self.platform.close_as_not_planned(issue).await,
        );

        let reports = vec![label, comment, close];
        let failed = reports.iter().filter(|r| !r.succeeded()).count();
        tracing::info!(issue = %issue, failed_steps = failed, "Spam actions applied");
        reports
    }
}

/// Turn a step result into a report, logging failures.
fn report(issue: &IssueRef, step: ActionStep, result: Result<(), GithubError>) -> ActionReport {
    let error = match result {
        Ok(()) => None,
        Err(err) => {
            match step {
                ActionStep::AddLabel => tracing::warn!(
                    issue = %issue,
                    step = %step,
                    error = %err,
                    "Failed to add spam label, continuing"
                ),
                ActionStep::Comment | ActionStep::Close => tracing::error!(
                    issue = %issue,
                    step = %step,
                    error = %err,
                    "Spam action failed"
                ),
            }
            Some(err.to_string())
        }
    };

    ActionReport { step, error }
}

// ============================================================================
// TESTS
// ============================================================================
