//! Priority resolution over a session's rule set
//!
//! Every rule whose metric is present in the sample is evaluated. Among the
//! rules that fire, the highest `priority` wins; equal priorities resolve to
//! the rule declared first. When nothing fires the session's default genre
//! applies (which may itself be absent).

use crate::evaluator::rule_fires;
use cadence_core_model::{Metrics, SessionConfig, SessionStatus, TriggerRule};
use tracing::debug;

/// Outcome of evaluating one sample against a session configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    /// Rules that fired, in declaration order
    pub fired: Vec<&'a TriggerRule>,

    /// Highest-priority fired rule
    pub winner: Option<&'a TriggerRule>,

    /// Genre to activate: the winner's target, else the default genre
    pub target_genre: Option<&'a str>,
}

impl<'a> Resolution<'a> {
    /// `Critical` when any rule fired
    pub fn status(&self) -> SessionStatus {
        if self.winner.is_some() {
            SessionStatus::Critical
        } else {
            SessionStatus::Nominal
        }
    }

    /// Metric of the winning rule
    pub fn active_metric(&self) -> Option<&'a str> {
        self.winner.map(|rule| rule.metric_name.as_str())
    }
}

/// Pick the winning rule from a declaration-ordered list of fired rules
///
/// Strictly-greater comparison keeps the earliest rule on ties.
pub fn highest_priority<'a, I>(fired: I) -> Option<&'a TriggerRule>
where
    I: IntoIterator<Item = &'a TriggerRule>,
{
    fired.into_iter().fold(None, |best, rule| match best {
        Some(current) if current.priority >= rule.priority => Some(current),
        _ => Some(rule),
    })
}

/// Resolve the target genre for a sample
pub fn resolve<'a>(config: &'a SessionConfig, metrics: &Metrics) -> Resolution<'a> {
    let fired: Vec<&TriggerRule> = config
        .rules
        .iter()
        .filter(|rule| {
            metrics
                .get(&rule.metric_name)
                .is_some_and(|value| rule_fires(rule, *value))
        })
        .collect();

    let winner = highest_priority(fired.iter().copied());
    let target_genre = winner
        .map(|rule| rule.target_genre.as_str())
        .or(config.default_genre.as_deref());

    match winner {
        Some(rule) => debug!(
            session_id = %config.session_id,
            fired = fired.len(),
            "Rule won: {}",
            rule
        ),
        None => debug!(
            session_id = %config.session_id,
            "No rule fired, fallback genre: {:?}",
            target_genre
        ),
    }

    Resolution {
        fired,
        winner,
        target_genre,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core_model::TriggerOperator;

    fn metrics(pairs: &[(&str, f64)]) -> Metrics {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn combat_config() -> SessionConfig {
        SessionConfig::new("raid-42")
            .with_rule(TriggerRule::new("hp", TriggerOperator::Lt, 10.0, "funeral"))
            .with_rule(
                TriggerRule::new("energy", TriggerOperator::Gt, 90.0, "battle").with_priority(5),
            )
    }

    #[test]
    fn test_higher_priority_wins() {
        let config = combat_config();
        let resolution = resolve(&config, &metrics(&[("hp", 5.0), ("energy", 95.0)]));

        assert_eq!(resolution.fired.len(), 2);
        assert_eq!(resolution.target_genre, Some("battle"));
        assert_eq!(resolution.active_metric(), Some("energy"));
        assert_eq!(resolution.status(), SessionStatus::Critical);
    }

    #[test]
    fn test_single_rule_fires() {
        let config = combat_config();
        let resolution = resolve(&config, &metrics(&[("hp", 5.0), ("energy", 10.0)]));

        assert_eq!(resolution.fired.len(), 1);
        assert_eq!(resolution.target_genre, Some("funeral"));
        assert_eq!(resolution.active_metric(), Some("hp"));
    }

    #[test]
    fn test_default_genre_when_nothing_fires() {
        let config = combat_config().with_default_genre("exploration");
        let resolution = resolve(&config, &metrics(&[("hp", 50.0), ("energy", 10.0)]));

        assert!(resolution.fired.is_empty());
        assert_eq!(resolution.winner, None);
        assert_eq!(resolution.target_genre, Some("exploration"));
        assert_eq!(resolution.status(), SessionStatus::Nominal);
        assert_eq!(resolution.active_metric(), None);
    }

    #[test]
    fn test_no_target_without_default_genre() {
        let config = combat_config();
        let resolution = resolve(&config, &metrics(&[("hp", 50.0)]));

        assert_eq!(resolution.target_genre, None);
        assert_eq!(resolution.status(), SessionStatus::Nominal);
    }

    #[test]
    fn test_equal_priority_first_declared_wins() {
        let config = SessionConfig::new("raid-42")
            .with_rule(TriggerRule::new("sanity", TriggerOperator::Lt, 20.0, "dark-ambient"))
            .with_rule(TriggerRule::new("stress", TriggerOperator::Gt, 80.0, "industrial"));

        let both = metrics(&[("sanity", 5.0), ("stress", 99.0)]);
        assert_eq!(resolve(&config, &both).target_genre, Some("dark-ambient"));

        // Same rules declared in the opposite order
        let reversed = SessionConfig {
            rules: config.rules.iter().rev().cloned().collect(),
            ..config.clone()
        };
        assert_eq!(resolve(&reversed, &both).target_genre, Some("industrial"));
    }

    #[test]
    fn test_missing_metric_is_skipped() {
        let config = combat_config();
        let resolution = resolve(&config, &metrics(&[("mana", 0.0)]));
        assert!(resolution.fired.is_empty());
    }

    #[test]
    fn test_multiple_rules_on_same_metric() {
        let config = SessionConfig::new("raid-42")
            .with_rule(TriggerRule::new("hp", TriggerOperator::Lt, 50.0, "tense").with_priority(2))
            .with_rule(TriggerRule::new("hp", TriggerOperator::Lt, 10.0, "funeral").with_priority(3));

        assert_eq!(
            resolve(&config, &metrics(&[("hp", 30.0)])).target_genre,
            Some("tense")
        );
        assert_eq!(
            resolve(&config, &metrics(&[("hp", 5.0)])).target_genre,
            Some("funeral")
        );
    }

    #[test]
    fn test_negative_priorities() {
        let low = TriggerRule::new("a", TriggerOperator::Gt, 0.0, "low").with_priority(-3);
        let lower = TriggerRule::new("b", TriggerOperator::Gt, 0.0, "lower").with_priority(-7);
        assert_eq!(highest_priority([&lower, &low]).unwrap().target_genre, "low");
        assert_eq!(highest_priority(std::iter::empty()), None);
    }
}
