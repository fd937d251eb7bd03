//! Ordered rule evaluation.
//!
//! The same rule list is consumed in two deliberately different modes:
//!
//! - **Fold mode** ([`RuleSet::apply_all`]): every matching rule applies
//!   its replacements in configured order; a later rule's replacement for
//!   a field silently supersedes an earlier one's.
//! - **First-match mode** ([`RuleSet::interface_override`]): the first
//!   matching rule decides the lookup, even when it carries no override.
//!
//! Do not collapse the two; their semantics differ on purpose.

use crate::caps::DeviceCaps;
use crate::rule::Rule;

/// Ordered rule list, immutable after construction.
///
/// The set is built once during process configuration and shared (behind
/// an `Arc`) by every query-handling call; because it is never mutated,
/// concurrent readers need no locking.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates a rule set from already-compiled rules, preserving order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Number of active rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fold mode: applies every matching rule's replacements in order.
    ///
    /// Each rule is matched against the current record, including
    /// mutations made by earlier rules in the same pass. Returns whether
    /// at least one rule matched; the flag is used purely for logging.
    pub fn apply_all(&self, caps: &mut DeviceCaps) -> bool {
        let mut matched = false;
        for rule in &self.rules {
            matched |= rule.apply(caps);
        }
        matched
    }

    /// First-match mode: the interface-name override decision for `caps`.
    ///
    /// Returns the override of the **first** rule whose predicates hold
    /// and stops looking. A matching rule that carries no override still
    /// wins the lookup and suppresses any later rule that does carry one;
    /// configuration authors must order rules with this in mind. This is
    /// load-bearing, order-sensitive behavior, not an accident of
    /// implementation.
    pub fn interface_override(&self, caps: &DeviceCaps) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(caps))
            .and_then(Rule::interface_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::DeviceCaps;
    use crate::rule::RuleSpec;

    fn rule(spec: RuleSpec) -> Rule {
        spec.compile().expect("rule should compile")
    }

    #[test]
    fn test_later_rule_wins_per_field() {
        let rules = RuleSet::new(vec![
            rule(RuleSpec {
                replace_name: Some("First".into()),
                ..RuleSpec::default()
            }),
            rule(RuleSpec {
                replace_name: Some("Second".into()),
                ..RuleSpec::default()
            }),
        ]);
        let mut caps = DeviceCaps::input("Original");
        assert!(rules.apply_all(&mut caps));
        assert_eq!(caps.name, "Second");
    }

    #[test]
    fn test_fold_sees_mutations_from_earlier_rules() {
        let rules = RuleSet::new(vec![
            rule(RuleSpec {
                match_name: Some("A".into()),
                replace_name: Some("B".into()),
                ..RuleSpec::default()
            }),
            rule(RuleSpec {
                match_name: Some("B".into()),
                replace_man_id: Some(99),
                ..RuleSpec::default()
            }),
        ]);
        let mut caps = DeviceCaps::input("A");
        assert!(rules.apply_all(&mut caps));
        assert_eq!(caps.name, "B");
        assert_eq!(caps.manufacturer_id, 99);
    }

    #[test]
    fn test_apply_all_reports_no_match() {
        let rules = RuleSet::new(vec![rule(RuleSpec {
            match_name: Some("Nope".into()),
            replace_name: Some("x".into()),
            ..RuleSpec::default()
        })]);
        let mut caps = DeviceCaps::input("Original");
        assert!(!rules.apply_all(&mut caps));
        assert_eq!(caps.name, "Original");
    }

    #[test]
    fn test_matching_rule_without_override_shadows_later_overrides() {
        // First-match short-circuit: rule 1 matches but has no interface
        // override, so rule 2's override must NOT be returned. Changing
        // this is a deliberate, visible behavior change.
        let rules = RuleSet::new(vec![
            rule(RuleSpec {
                replace_name: Some("renamed".into()),
                ..RuleSpec::default()
            }),
            rule(RuleSpec {
                replace_interface_name: Some("X".into()),
                ..RuleSpec::default()
            }),
        ]);
        let caps = DeviceCaps::input("dev");
        assert_eq!(rules.interface_override(&caps), None);
    }

    #[test]
    fn test_first_matching_override_is_returned() {
        let rules = RuleSet::new(vec![
            rule(RuleSpec {
                match_name: Some("other".into()),
                replace_interface_name: Some("wrong".into()),
                ..RuleSpec::default()
            }),
            rule(RuleSpec {
                replace_interface_name: Some("right".into()),
                ..RuleSpec::default()
            }),
        ]);
        let caps = DeviceCaps::input("dev");
        assert_eq!(rules.interface_override(&caps), Some("right"));
    }

    #[test]
    fn test_empty_set() {
        let rules = RuleSet::default();
        assert!(rules.is_empty());
        assert_eq!(rules.len(), 0);
        let mut caps = DeviceCaps::input("dev");
        assert!(!rules.apply_all(&mut caps));
        assert_eq!(rules.interface_override(&caps), None);
    }
}
