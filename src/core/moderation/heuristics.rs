// Heuristic engine - cheap text and account signals computed before the model call.
//
// Each rule is a named predicate plus a message builder over a shared set of
// pre-computed text features. Rules are independent and never short-circuit
// each other, so any subset may fire.

use super::moderation_models::{HeuristicConfig, HeuristicResult, IssueInput};
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+").expect("URL pattern is valid"));

/// Text length below which a high special-character density counts as spam.
const SHORT_TEXT_LEN: usize = 200;

/// Identifies a heuristic rule, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleId {
    UrlSpam,
    NewAccountLink,
    SpamKeyword,
    ShortBodyWithLink,
    BracketDensity,
    SpecialCharDensity,
    PhoneWithBrackets,
}

/// A fired rule together with its human-readable signal.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSignal {
    pub rule: RuleId,
    pub message: String,
}

/// Everything the rules look at, computed once per evaluation.
#[derive(Debug, Clone, Default)]
struct TextFeatures {
    spammy_url_count: usize,
    compact_len: usize,
    matched_words: Vec<String>,
    bracket_count: usize,
    special_char_density: f64,
    combined_len: usize,
    /// `None` when the phone pattern failed to compile
    phone_matches: Option<usize>,
    account_age_days: Option<f64>,
}

struct HeuristicRule {
    id: RuleId,
    predicate: fn(&TextFeatures, &HeuristicConfig) -> bool,
    message: fn(&TextFeatures, &HeuristicConfig) -> String,
}

static RULES: [HeuristicRule; 7] = [
    HeuristicRule {
        id: RuleId::UrlSpam,
        predicate: |f, c| f.spammy_url_count > c.max_urls_for_spam,
        message: |f, c| {
            format!(
                "链接数量 ({}) 超过阈值 {}",
                f.spammy_url_count, c.max_urls_for_spam
            )
        },
    },
    HeuristicRule {
        id: RuleId::NewAccountLink,
        predicate: |f, c| {
            f.spammy_url_count >= 1
                && f.account_age_days
                    .is_some_and(|age| age < c.min_account_age_days)
        },
        message: |f, c| {
            format!(
                "账号年龄约 {:.1} 天，低于阈值 {} 天且包含链接",
                f.account_age_days.unwrap_or_default(),
                c.min_account_age_days
            )
        },
    },
    HeuristicRule {
        id: RuleId::SpamKeyword,
        predicate: |f, _| !f.matched_words.is_empty(),
        message: |f, _| format!("命中垃圾关键词：{}", f.matched_words.join(", ")),
    },
    HeuristicRule {
        id: RuleId::ShortBodyWithLink,
        predicate: |f, c| f.compact_len < c.min_body_len_for_links && f.spammy_url_count >= 1,
        message: |f, c| {
            format!(
                "正文有效字符仅 {}，低于含链接最低要求 {}",
                f.compact_len, c.min_body_len_for_links
            )
        },
    },
    HeuristicRule {
        id: RuleId::BracketDensity,
        predicate: |f, c| f.bracket_count >= c.bracket_max,
        message: |f, c| {
            format!(
                "括号/特殊括号字符数量 {} 超过阈值 {}",
                f.bracket_count, c.bracket_max
            )
        },
    },
    HeuristicRule {
        id: RuleId::SpecialCharDensity,
        predicate: |f, c| {
            f.special_char_density >= c.special_char_density_threshold
                && f.combined_len < SHORT_TEXT_LEN
        },
        message: |f, c| {
            format!(
                "特殊字符密度 {:.3} ≥ {} 且内容少于 {} 字符",
                f.special_char_density, c.special_char_density_threshold, SHORT_TEXT_LEN
            )
        },
    },
    HeuristicRule {
        id: RuleId::PhoneWithBrackets,
        predicate: |f, _| f.phone_matches.is_some_and(|n| n >= 1) && f.bracket_count >= 2,
        message: |_, _| "检测到电话号码模式并伴随多个括号字符".to_string(),
    },
];

/// Characters that show up in decorated spam titles like `【VIP】` or `<<call>>`.
pub fn is_bracket_like(c: char) -> bool {
    matches!(c, '{' | '}' | '[' | ']' | '<' | '>' | '|' | '~' | '^' | '_')
}

/// Anything that is not a letter, digit, CJK/kana/hangul character, or whitespace.
pub fn is_special_char(c: char) -> bool {
    let allowed = c.is_ascii_alphanumeric()
        || ('\u{4e00}'..='\u{9fff}').contains(&c)
        || ('\u{3040}'..='\u{30ff}').contains(&c)
        || ('\u{ac00}'..='\u{d7af}').contains(&c)
        || c.is_whitespace();
    !allowed
}

/// Whether a URL is exempt from spam counting.
pub fn is_trusted_url(url: &str, trusted_domains: &[String]) -> bool {
    let lower = url.to_lowercase();
    trusted_domains
        .iter()
        .any(|domain| lower.contains(&domain.to_lowercase()))
}

/// Count URLs not pointing at a trusted domain.
pub fn count_spammy_urls(text: &str, trusted_domains: &[String]) -> usize {
    URL_REGEX
        .find_iter(text)
        .filter(|m| !is_trusted_url(m.as_str(), trusted_domains))
        .count()
}

/// Spam phrases contained in `text`, lower-cased, in config order.
pub fn matched_spam_words(text: &str, spam_words: &[String]) -> Vec<String> {
    spam_words
        .iter()
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter(|w| text.contains(w.as_str()))
        .collect()
}

fn compile_phone_regex(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!(
                pattern = pattern,
                error = %err,
                "Invalid phone number pattern in heuristic config, rule disabled"
            );
            None
        }
    }
}

fn extract_features(
    config: &HeuristicConfig,
    issue: &IssueInput,
    account_age_days: Option<f64>,
) -> TextFeatures {
    let title = issue.title.as_deref().unwrap_or_default().to_lowercase();
    let body = issue.body.as_deref().unwrap_or_default().to_lowercase();
    let combined = format!("{}\n{}", title, body);

    // Lengths are in chars, not UTF-16 units
    let combined_len = combined.chars().count();
    let special_count = combined.chars().filter(|c| is_special_char(*c)).count();
    let bracket_count = title.chars().filter(|c| is_bracket_like(*c)).count()
        + body.chars().filter(|c| is_bracket_like(*c)).count();

    let phone_matches =
        compile_phone_regex(&config.phone_regex).map(|re| re.find_iter(&combined).count());

    TextFeatures {
        spammy_url_count: count_spammy_urls(&combined, &config.trusted_domains),
        compact_len: combined.chars().filter(|c| !c.is_whitespace()).count(),
        matched_words: matched_spam_words(&combined, &config.spam_words),
        bracket_count,
        special_char_density: special_count as f64 / combined_len.max(1) as f64,
        combined_len,
        phone_matches,
        account_age_days,
    }
}

/// Run every rule and return the fired ones in evaluation order.
pub fn evaluate_rules(
    config: &HeuristicConfig,
    issue: &IssueInput,
    account_age_days: Option<f64>,
) -> Vec<RuleSignal> {
    let features = extract_features(config, issue, account_age_days);

    RULES
        .iter()
        .filter(|rule| (rule.predicate)(&features, config))
        .map(|rule| RuleSignal {
            rule: rule.id,
            message: (rule.message)(&features, config),
        })
        .collect()
}

/// Evaluate an issue against the heuristic rules.
///
/// `account_age_days` is `None` when the author's age could not be resolved;
/// the new-account rule is then skipped.
pub fn evaluate(
    config: &HeuristicConfig,
    issue: &IssueInput,
    account_age_days: Option<f64>,
) -> HeuristicResult {
    let fired = evaluate_rules(config, issue, account_age_days);
    tracing::debug!(
        rules = ?fired.iter().map(|s| s.rule).collect::<Vec<_>>(),
        "Heuristic evaluation finished"
    );

    HeuristicResult {
        signals: fired.into_iter().map(|signal| signal.message).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(title: &str, body: &str) -> IssueInput {
        IssueInput {
            title: Some(title.to_string()),
            body: Some(body.to_string()),
            author: Some("someone".to_string()),
        }
    }

    fn fired(config: &HeuristicConfig, input: &IssueInput, age: Option<f64>) -> Vec<RuleId> {
        evaluate_rules(config, input, age)
            .into_iter()
            .map(|s| s.rule)
            .collect()
    }

    #[test]
    fn test_clean_issue_has_no_signals() {
        let config = HeuristicConfig::default();
        let input = issue(
            "Crash when loading plugin",
            "After upgrading to the latest release the bot crashes on startup.\n\
             Steps to reproduce: install the plugin and restart the service.",
        );

        let result = evaluate(&config, &input, Some(400.0));
        assert!(result.signals.is_empty(), "unexpected signals: {:?}", result.signals);
    }

    #[test]
    fn test_empty_issue_has_no_signals() {
        let config = HeuristicConfig::default();
        let result = evaluate(&config, &IssueInput::default(), None);
        assert!(result.signals.is_empty());
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let config = HeuristicConfig::default();
        let input = issue("Great deal", "BUY NOW before the offer ends, it is a limited time thing for everyone");

        let signals = evaluate_rules(&config, &input, None);
        let keyword = signals
            .iter()
            .find(|s| s.rule == RuleId::SpamKeyword)
            .expect("keyword rule should fire");
        assert!(keyword.message.contains("buy now"));
    }

    #[test]
    fn test_keyword_signal_lists_every_match() {
        let config = HeuristicConfig::default();
        let input = issue("Click Here", "please subscribe and visit");

        let signals = evaluate_rules(&config, &input, None);
        let keyword = signals
            .iter()
            .find(|s| s.rule == RuleId::SpamKeyword)
            .unwrap();
        assert!(keyword.message.contains("click here"));
        assert!(keyword.message.contains("subscribe"));
        assert!(keyword.message.contains("visit"));
    }

    #[test]
    fn test_two_untrusted_urls_fire_url_spam() {
        let config = HeuristicConfig {
            max_urls_for_spam: 1,
            ..Default::default()
        };
        let input = issue(
            "Links",
            "see https://promo.example/a and http://other.example/b for the details of this report",
        );

        assert!(fired(&config, &input, None).contains(&RuleId::UrlSpam));
    }

    #[test]
    fn test_trusted_url_is_not_counted() {
        let config = HeuristicConfig::default();
        let input = issue(
            "Docs link",
            "The guide at https://GitHub.com/AstrBotDevs/AstrBot/wiki explains how it should behave",
        );

        let rules = fired(&config, &input, Some(1.0));
        assert!(!rules.contains(&RuleId::UrlSpam));
        assert!(!rules.contains(&RuleId::NewAccountLink));
        assert!(!rules.contains(&RuleId::ShortBodyWithLink));
    }

    #[test]
    fn test_new_account_with_link() {
        let config = HeuristicConfig::default();
        let input = issue(
            "Question",
            "Is this related to https://promo.example/page in any way? I saw it mentioned somewhere.",
        );

        assert!(fired(&config, &input, Some(1.5)).contains(&RuleId::NewAccountLink));
        assert!(!fired(&config, &input, Some(30.0)).contains(&RuleId::NewAccountLink));
        // Unknown age skips the rule silently
        assert!(!fired(&config, &input, None).contains(&RuleId::NewAccountLink));
    }

    #[test]
    fn test_new_account_without_link_is_fine() {
        let config = HeuristicConfig::default();
        let input = issue("Question", "How do I configure the adapter for my server setup?");

        assert!(!fired(&config, &input, Some(0.1)).contains(&RuleId::NewAccountLink));
    }

    #[test]
    fn test_short_body_threshold() {
        let config = HeuristicConfig {
            min_body_len_for_links: 40,
            ..Default::default()
        };

        // 13 URL chars + 37 letters = 50 non-whitespace characters
        let long_enough = issue("", &format!("http://x.io/a {}", "a".repeat(37)));
        assert!(!fired(&config, &long_enough, None).contains(&RuleId::ShortBodyWithLink));

        // 13 URL chars + 17 letters = 30 non-whitespace characters
        let too_short = issue("", &format!("http://x.io/a {}", "a".repeat(17)));
        assert!(fired(&config, &too_short, None).contains(&RuleId::ShortBodyWithLink));
    }

    #[test]
    fn test_short_body_without_link_does_not_fire() {
        let config = HeuristicConfig::default();
        let input = issue("bug", "it broke");

        assert!(!fired(&config, &input, None).contains(&RuleId::ShortBodyWithLink));
    }

    #[test]
    fn test_bracket_threshold_counts_title_and_body() {
        let config = HeuristicConfig {
            bracket_max: 6,
            ..Default::default()
        };

        let at_limit = issue("[[[", "]]] plus some ordinary words to keep density low enough here");
        assert!(fired(&config, &at_limit, None).contains(&RuleId::BracketDensity));

        let below = issue("[[", "]]] plus some ordinary words to keep density low enough here");
        assert!(!fired(&config, &below, None).contains(&RuleId::BracketDensity));
    }

    #[test]
    fn test_special_char_density_only_for_short_text() {
        let config = HeuristicConfig::default();

        let noisy_short = issue("!!!", "$$$ ???");
        assert!(fired(&config, &noisy_short, None).contains(&RuleId::SpecialCharDensity));

        let noisy_long = issue("!!!", &format!("$$$ ??? {}", "word ".repeat(60)));
        assert!(!fired(&config, &noisy_long, None).contains(&RuleId::SpecialCharDensity));
    }

    #[test]
    fn test_special_char_density_fires_at_exact_threshold() {
        // "ab\ncdef$$g" is 10 chars with 2 special
        let input = issue("ab", "cdef$$g");

        let at_threshold = HeuristicConfig {
            special_char_density_threshold: 0.2,
            ..Default::default()
        };
        assert!(fired(&at_threshold, &input, None).contains(&RuleId::SpecialCharDensity));

        let above = HeuristicConfig {
            special_char_density_threshold: 0.21,
            ..Default::default()
        };
        assert!(!fired(&above, &input, None).contains(&RuleId::SpecialCharDensity));
    }

    #[test]
    fn test_special_char_density_length_cutoff() {
        let config = HeuristicConfig {
            special_char_density_threshold: 0.1,
            ..Default::default()
        };

        // title + newline + body = 200 chars
        let at_cutoff = issue("$", &format!("{}{}", "$".repeat(20), "a".repeat(178)));
        assert!(!fired(&config, &at_cutoff, None).contains(&RuleId::SpecialCharDensity));

        let just_under = issue("$", &format!("{}{}", "$".repeat(20), "a".repeat(177)));
        assert!(fired(&config, &just_under, None).contains(&RuleId::SpecialCharDensity));
    }

    #[test]
    fn test_cjk_text_is_not_special() {
        assert!(!is_special_char('中'));
        assert!(!is_special_char('あ'));
        assert!(!is_special_char('한'));
        assert!(!is_special_char('Z'));
        assert!(is_special_char('$'));
        assert!(is_special_char('【'));

        let config = HeuristicConfig::default();
        let input = issue("插件无法加载", "升级之后插件无法加载 日志里没有报错");
        assert!(!fired(&config, &input, None).contains(&RuleId::SpecialCharDensity));
    }

    #[test]
    fn test_phone_pattern_only_matches_ascii_digits() {
        let config = HeuristicConfig::default();

        let arabic_indic = issue("", "٠١٢٣٤٥٦٧٨٩ ~~");
        assert!(!fired(&config, &arabic_indic, None).contains(&RuleId::PhoneWithBrackets));

        let ascii = issue("", "0123456789 ~~");
        assert!(fired(&config, &ascii, None).contains(&RuleId::PhoneWithBrackets));
    }

    #[test]
    fn test_phone_pattern_with_brackets() {
        let config = HeuristicConfig::default();
        let input = issue(
            "support line",
            "ring +1 555 123 4567 ~~ for any help you may need with your account",
        );

        assert!(fired(&config, &input, None).contains(&RuleId::PhoneWithBrackets));
    }

    #[test]
    fn test_phone_pattern_needs_two_brackets() {
        let config = HeuristicConfig::default();
        let input = issue(
            "support line",
            "ring +1 555 123 4567 ~ for any help you may need with your account",
        );

        assert!(!fired(&config, &input, None).contains(&RuleId::PhoneWithBrackets));
    }

    #[test]
    fn test_invalid_phone_pattern_disables_rule() {
        let config = HeuristicConfig {
            phone_regex: "(unclosed".to_string(),
            ..Default::default()
        };
        let input = issue(
            "support line",
            "ring +1 555 123 4567 ~~ or call now for any help you may need",
        );

        let rules = fired(&config, &input, None);
        assert!(!rules.contains(&RuleId::PhoneWithBrackets));
        // Other rules still run
        assert!(rules.contains(&RuleId::SpamKeyword));
    }

    #[test]
    fn test_signals_follow_rule_order() {
        let config = HeuristicConfig::default();
        let input = issue("FREE MONEY CLICK HERE call now", "http://x.io/$$");

        let rules = fired(&config, &input, Some(0.5));
        assert_eq!(
            rules,
            vec![
                RuleId::NewAccountLink,
                RuleId::SpamKeyword,
                RuleId::ShortBodyWithLink,
                RuleId::SpecialCharDensity,
            ]
        );
    }
}
