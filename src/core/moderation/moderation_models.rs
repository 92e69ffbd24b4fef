// Moderation domain models - data structures for the issue spam pipeline.
//
// These are pure domain types with no HTTP or webhook dependencies.
// The webhook layer converts payloads into these before handing them to the service.

/// Thresholds and word lists used by the heuristic engine.
///
/// Built once at startup and shared read-only across deliveries.
#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    /// Accounts younger than this (in days) are suspicious when they post links
    pub min_account_age_days: f64,
    /// More non-trusted URLs than this fires the URL spam rule
    pub max_urls_for_spam: usize,
    /// Minimum non-whitespace length for a post that carries a link
    pub min_body_len_for_links: usize,
    /// Case-insensitive spam phrases
    pub spam_words: Vec<String>,
    /// Bracket-like character count that fires the bracket rule
    pub bracket_max: usize,
    /// Ratio of special characters to total length
    pub special_char_density_threshold: f64,
    /// Phone number pattern, compiled per evaluation
    pub phone_regex: String,
    /// URLs containing any of these substrings are not counted
    pub trusted_domains: Vec<String>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        let spam_words = [
            "call now",
            "zadzwoń",
            "zadzwoń teraz",
            "kontakt",
            "telefon",
            "telefone",
            "contato",
            "suporte",
            "infolinii",
            "click here",
            "buy now",
            "subscribe",
            "visit",
        ];

        Self {
            min_account_age_days: 3.0,
            max_urls_for_spam: 1,
            min_body_len_for_links: 40,
            spam_words: spam_words.iter().map(|w| w.to_string()).collect(),
            bracket_max: 6,
            special_char_density_threshold: 0.12,
            phone_regex: r"\+?[0-9][0-9\-\s\(\)\.]{6,}[0-9]".to_string(),
            trusted_domains: vec!["astrbot.app".to_string(), "github.com".to_string()],
        }
    }
}

/// The issue text as seen by the heuristics and the classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueInput {
    pub title: Option<String>,
    pub body: Option<String>,
    pub author: Option<String>,
}

/// Whether an issue is open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

/// The issue as delivered by an `issues.opened` / `issues.edited` event.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueSnapshot {
    pub number: u64,
    pub title: Option<String>,
    pub body: Option<String>,
    pub state: IssueState,
    pub author: Option<String>,
}

impl IssueSnapshot {
    pub fn input(&self) -> IssueInput {
        IssueInput {
            title: self.title.clone(),
            body: self.body.clone(),
            author: self.author.clone(),
        }
    }
}

/// One delivery handed to the moderation service.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueEvent {
    pub owner: String,
    pub repo: String,
    /// `None` when the payload carried no issue object
    pub issue: Option<IssueSnapshot>,
}

/// Ordered list of triggered heuristic rules.
///
/// Order follows rule evaluation order so logs read the same way every time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeuristicResult {
    pub signals: Vec<String>,
}

/// Validated classifier verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationDecision {
    pub is_spam: bool,
    /// Justification from the model; empty when none was given
    pub reason: String,
}

/// One side effect taken against a spam issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStep {
    AddLabel,
    Comment,
    Close,
}

impl std::fmt::Display for ActionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionStep::AddLabel => write!(f, "add_label"),
            ActionStep::Comment => write!(f, "comment"),
            ActionStep::Close => write!(f, "close"),
        }
    }
}

/// Result of attempting one action step.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReport {
    pub step: ActionStep,
    /// `None` when the step succeeded
    pub error: Option<String>,
}

impl ActionReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Why an event was dropped before evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Payload carried no issue object
    MissingIssue,
    /// Issue was already closed when the event arrived
    AlreadyClosed,
}

/// Terminal state of one moderation run.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationOutcome {
    Skipped(SkipReason),
    /// Classifier raised (missing config or upstream failure)
    ClassificationFailed,
    /// Classifier answered but the answer was unusable
    DecisionUnavailable,
    NotSpam {
        signals: Vec<String>,
    },
    Acted {
        signals: Vec<String>,
        reason: String,
        reports: Vec<ActionReport>,
    },
}

impl ModerationOutcome {
    /// Whether any platform mutation was attempted.
    pub fn acted(&self) -> bool {
        matches!(self, ModerationOutcome::Acted { .. })
    }
}
