use regex::{Regex, RegexBuilder};

use super::{Action, UrlMode};
use crate::{config::RuleConfig, emby::Protocol};

/// A compiled rewrite rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub enabled: bool,
    /// Source text of the pattern, kept for logging.
    pub source: String,
    /// `None` when the pattern failed to compile; such a rule never matches.
    pattern: Option<Regex>,
    pub transcode: bool,
    pub final_url: bool,
    pub mode: UrlMode,
    pub actions: Vec<Action>,
}

impl Rule {
    pub fn compile(config: &RuleConfig) -> Self {
        let pattern = match RegexBuilder::new(&config.pattern)
            .case_insensitive(true)
            .build()
        {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(
                    "Rule pattern {:?} is invalid and will never match: {}",
                    config.pattern,
                    e
                );
                None
            }
        };

        let actions = config
            .actions
            .iter()
            .filter_map(|a| {
                let parsed = Action::parse(a);
                if parsed.is_none() {
                    tracing::warn!(
                        "Ignoring action {:?} with args {:?} in rule {:?}",
                        a.kind,
                        a.args,
                        config.pattern
                    );
                }
                parsed
            })
            .collect();

        Self {
            enabled: config.enable,
            source: config.pattern.clone(),
            pattern,
            transcode: config.transcode,
            final_url: config.final_url,
            mode: config.mode,
            actions,
        }
    }

    /// Whether the rule is enabled and its pattern matches `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.enabled && self.pattern.as_ref().is_some_and(|re| re.is_match(path))
    }
}

/// The effect of every applicable rule folded together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePlan {
    pub transcode: bool,
    pub final_url: bool,
    pub mode: UrlMode,
    pub actions: Vec<Action>,
}

impl RulePlan {
    /// Apply every replace action, in order, to `url`.
    pub fn rewrite_url(&self, url: &str) -> String {
        self.actions
            .iter()
            .fold(url.to_string(), |current, action| action.apply(&current))
    }
}

/// Ordered, read-only rule set.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn compile(configs: &[RuleConfig]) -> Self {
        let rules: Vec<Rule> = configs.iter().map(Rule::compile).collect();
        tracing::info!(
            "Loaded {} rewrite rule(s), {} enabled",
            rules.len(),
            rules.iter().filter(|r| r.enabled).count()
        );
        Self { rules }
    }

    /// Rules applicable to an item path and source protocol, in declared order.
    ///
    /// Only remote (HTTP/HTTPS) sources are ever eligible.
    pub fn matching(&self, path: &str, protocol: &Protocol) -> Vec<&Rule> {
        if !protocol.is_remote() {
            return Vec::new();
        }
        self.rules.iter().filter(|r| r.matches(path)).collect()
    }

    /// Fold the applicable rules into one plan. Later rules override the
    /// flags of earlier ones; actions accumulate in declared order.
    pub fn plan(&self, path: &str, protocol: &Protocol) -> Option<RulePlan> {
        let matched = self.matching(path, protocol);
        let (last, _) = matched.split_last()?;

        Some(RulePlan {
            transcode: last.transcode,
            final_url: last.final_url,
            mode: last.mode,
            actions: matched
                .iter()
                .flat_map(|r| r.actions.iter().cloned())
                .collect(),
        })
    }
}
