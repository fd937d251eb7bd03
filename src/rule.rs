//! Match/replace rules over canonical capability records.
//!
//! A [`RuleSpec`] is the on-disk shape of one rule, using the original
//! config key names; [`RuleSpec::compile`] validates it into a [`Rule`]
//! with the name pattern compiled. Compilation is the only place rules
//! can be rejected; a compiled rule is immutable.

use regex::Regex;
use serde::Deserialize;

use crate::caps::{DeviceCaps, Direction};
use crate::error::RuleError;

/// On-disk shape of one configured rule.
///
/// All keys are optional. Absent match keys never constrain the match;
/// absent replace keys leave the corresponding field untouched. A spec
/// with no replace key at all (including `replace_interface_name`) fails
/// to compile with [`RuleError::NoEffect`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSpec {
    /// Match on device direction, `"in"` or `"out"`.
    pub match_direction: Option<Direction>,
    /// Match the entire product name against this regular expression.
    pub match_name: Option<String>,
    /// Match on exact manufacturer id.
    pub match_man_id: Option<u16>,
    /// Match on exact product id.
    pub match_prod_id: Option<u16>,
    /// Match on exact driver version.
    pub match_driver_version: Option<u32>,
    /// Replacement product name.
    pub replace_name: Option<String>,
    /// Replacement manufacturer id.
    pub replace_man_id: Option<u16>,
    /// Replacement product id.
    pub replace_prod_id: Option<u16>,
    /// Replacement driver version.
    pub replace_driver_version: Option<u32>,
    /// Replacement technology class (output devices only).
    pub replace_technology: Option<u16>,
    /// Replacement voice count (output devices only).
    pub replace_voices: Option<u16>,
    /// Replacement note count (output devices only).
    pub replace_notes: Option<u16>,
    /// Replacement channel mask (output devices only).
    pub replace_channel_mask: Option<u16>,
    /// Replacement support flags (output devices only).
    pub replace_support: Option<u32>,
    /// Override for the separately-queried device interface name. Not
    /// used by capability rewriting.
    pub replace_interface_name: Option<String>,
}

impl RuleSpec {
    fn has_effect(&self) -> bool {
        self.replace_name.is_some()
            || self.replace_man_id.is_some()
            || self.replace_prod_id.is_some()
            || self.replace_driver_version.is_some()
            || self.replace_technology.is_some()
            || self.replace_voices.is_some()
            || self.replace_notes.is_some()
            || self.replace_channel_mask.is_some()
            || self.replace_support.is_some()
            || self.replace_interface_name.is_some()
    }

    /// Validates the spec and compiles the name pattern.
    ///
    /// The pattern is anchored so it must match the entire name, not a
    /// substring.
    ///
    /// # Errors
    ///
    /// [`RuleError::NoEffect`] if no replace key is set;
    /// [`RuleError::InvalidPattern`] if `match_name` does not compile.
    pub fn compile(self) -> Result<Rule, RuleError> {
        if !self.has_effect() {
            return Err(RuleError::NoEffect);
        }
        let match_name = match &self.match_name {
            Some(pattern) => Some(Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                RuleError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                }
            })?),
            None => None,
        };
        Ok(Rule {
            match_direction: self.match_direction,
            match_name,
            match_man_id: self.match_man_id,
            match_prod_id: self.match_prod_id,
            match_driver_version: self.match_driver_version,
            replace_name: self.replace_name,
            replace_man_id: self.replace_man_id,
            replace_prod_id: self.replace_prod_id,
            replace_driver_version: self.replace_driver_version,
            replace_technology: self.replace_technology,
            replace_voices: self.replace_voices,
            replace_notes: self.replace_notes,
            replace_channel_mask: self.replace_channel_mask,
            replace_support: self.replace_support,
            replace_interface_name: self.replace_interface_name,
        })
    }
}

/// One compiled match/replace unit.
#[derive(Debug, Clone)]
pub struct Rule {
    match_direction: Option<Direction>,
    match_name: Option<Regex>,
    match_man_id: Option<u16>,
    match_prod_id: Option<u16>,
    match_driver_version: Option<u32>,
    replace_name: Option<String>,
    replace_man_id: Option<u16>,
    replace_prod_id: Option<u16>,
    replace_driver_version: Option<u32>,
    replace_technology: Option<u16>,
    replace_voices: Option<u16>,
    replace_notes: Option<u16>,
    replace_channel_mask: Option<u16>,
    replace_support: Option<u32>,
    replace_interface_name: Option<String>,
}

impl Rule {
    /// Whether every configured predicate holds for `caps`.
    ///
    /// Absent predicates never constrain the match; the name pattern must
    /// match the entire name.
    pub fn matches(&self, caps: &DeviceCaps) -> bool {
        if let Some(direction) = self.match_direction {
            if direction != caps.direction {
                return false;
            }
        }
        if let Some(pattern) = &self.match_name {
            if !pattern.is_match(&caps.name) {
                return false;
            }
        }
        if let Some(id) = self.match_man_id {
            if id != caps.manufacturer_id {
                return false;
            }
        }
        if let Some(id) = self.match_prod_id {
            if id != caps.product_id {
                return false;
            }
        }
        if let Some(version) = self.match_driver_version {
            if version != caps.driver_version {
                return false;
            }
        }
        true
    }

    /// Applies the rule's replacements in place if the predicates match.
    ///
    /// Output-only replacements are no-ops on records without an output
    /// block. Returns whether the rule matched.
    pub(crate) fn apply(&self, caps: &mut DeviceCaps) -> bool {
        if !self.matches(caps) {
            return false;
        }
        if let Some(name) = &self.replace_name {
            caps.name = name.clone();
        }
        if let Some(id) = self.replace_man_id {
            caps.manufacturer_id = id;
        }
        if let Some(id) = self.replace_prod_id {
            caps.product_id = id;
        }
        if let Some(version) = self.replace_driver_version {
            caps.driver_version = version;
        }
        if let Some(out) = caps.output.as_mut() {
            if let Some(technology) = self.replace_technology {
                out.technology = technology;
            }
            if let Some(voices) = self.replace_voices {
                out.voices = voices;
            }
            if let Some(notes) = self.replace_notes {
                out.notes = notes;
            }
            if let Some(channel_mask) = self.replace_channel_mask {
                out.channel_mask = channel_mask;
            }
            if let Some(support) = self.replace_support {
                out.support = support;
            }
        }
        true
    }

    /// The interface-name override this rule carries, if any.
    pub fn interface_name(&self) -> Option<&str> {
        self.replace_interface_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::OutputCaps;

    fn compiled(spec: RuleSpec) -> Rule {
        spec.compile().expect("rule should compile")
    }

    #[test]
    fn test_empty_rule_is_rejected() {
        let err = RuleSpec::default().compile().unwrap_err();
        assert!(matches!(err, RuleError::NoEffect));
    }

    #[test]
    fn test_match_only_rule_is_rejected() {
        let spec = RuleSpec {
            match_name: Some("USB.*".into()),
            ..RuleSpec::default()
        };
        assert!(matches!(spec.compile().unwrap_err(), RuleError::NoEffect));
    }

    #[test]
    fn test_interface_override_alone_is_enough() {
        let spec = RuleSpec {
            replace_interface_name: Some("\\\\?\\virtual".into()),
            ..RuleSpec::default()
        };
        assert!(spec.compile().is_ok());
    }

    #[test]
    fn test_bad_pattern_is_rejected() {
        let spec = RuleSpec {
            match_name: Some("[unclosed".into()),
            replace_name: Some("x".into()),
            ..RuleSpec::default()
        };
        assert!(matches!(
            spec.compile().unwrap_err(),
            RuleError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_no_predicates_matches_everything() {
        let rule = compiled(RuleSpec {
            replace_name: Some("x".into()),
            ..RuleSpec::default()
        });
        assert!(rule.matches(&DeviceCaps::input("anything")));
        assert!(rule.matches(&DeviceCaps::output("else", OutputCaps::default())));
    }

    #[test]
    fn test_name_pattern_matches_whole_name_only() {
        let rule = compiled(RuleSpec {
            match_name: Some("USB".into()),
            replace_name: Some("x".into()),
            ..RuleSpec::default()
        });
        assert!(rule.matches(&DeviceCaps::input("USB")));
        assert!(!rule.matches(&DeviceCaps::input("USB MIDI")));

        let wildcard = compiled(RuleSpec {
            match_name: Some("USB.*".into()),
            replace_name: Some("x".into()),
            ..RuleSpec::default()
        });
        assert!(wildcard.matches(&DeviceCaps::input("USB MIDI")));
    }

    #[test]
    fn test_direction_predicate() {
        let rule = compiled(RuleSpec {
            match_direction: Some(Direction::Output),
            replace_name: Some("x".into()),
            ..RuleSpec::default()
        });
        assert!(!rule.matches(&DeviceCaps::input("dev")));
        assert!(rule.matches(&DeviceCaps::output("dev", OutputCaps::default())));
    }

    #[test]
    fn test_numeric_predicates_are_exact() {
        let rule = compiled(RuleSpec {
            match_man_id: Some(7),
            match_prod_id: Some(9),
            match_driver_version: Some(0x0102),
            replace_name: Some("x".into()),
            ..RuleSpec::default()
        });
        let caps = DeviceCaps::input("dev").with_ids(7, 9).with_driver_version(0x0102);
        assert!(rule.matches(&caps));
        assert!(!rule.matches(&caps.clone().with_ids(7, 10)));
    }

    #[test]
    fn test_apply_replaces_only_specified_fields() {
        let rule = compiled(RuleSpec {
            replace_name: Some("Renamed".into()),
            replace_man_id: Some(42),
            ..RuleSpec::default()
        });
        let mut caps = DeviceCaps::input("Original").with_ids(1, 2).with_driver_version(3);
        assert!(rule.apply(&mut caps));
        assert_eq!(caps.name, "Renamed");
        assert_eq!(caps.manufacturer_id, 42);
        assert_eq!(caps.product_id, 2);
        assert_eq!(caps.driver_version, 3);
    }

    #[test]
    fn test_output_replacements_are_noops_on_input_records() {
        let rule = compiled(RuleSpec {
            replace_name: Some("Renamed".into()),
            replace_technology: Some(5),
            replace_support: Some(0xFF),
            ..RuleSpec::default()
        });
        let mut caps = DeviceCaps::input("Original");
        assert!(rule.apply(&mut caps));
        assert_eq!(caps.name, "Renamed");
        assert!(caps.output.is_none());
    }

    #[test]
    fn test_output_replacements_apply_to_output_records() {
        let rule = compiled(RuleSpec {
            replace_technology: Some(5),
            replace_voices: Some(32),
            ..RuleSpec::default()
        });
        let mut caps = DeviceCaps::output("Synth", OutputCaps::default());
        assert!(rule.apply(&mut caps));
        let out = caps.output.expect("output block");
        assert_eq!(out.technology, 5);
        assert_eq!(out.voices, 32);
        assert_eq!(out.notes, 0);
    }

    #[test]
    fn test_spec_deserializes_original_key_names() {
        let spec: RuleSpec = serde_json::from_str(
            r#"{
                "match_direction": "out",
                "match_name": "Microsoft GS.*",
                "replace_name": "Hidden Synth",
                "replace_interface_name": "\\\\?\\virtual#synth"
            }"#,
        )
        .expect("valid spec");
        assert_eq!(spec.match_direction, Some(Direction::Output));
        assert_eq!(spec.replace_name.as_deref(), Some("Hidden Synth"));
        assert!(spec.compile().is_ok());
    }
}
