//! Rule set registry and tag resolution.
//!
//! Rules ship grouped into named sets: one per language version plus the
//! thematic sets. A run picks sets by tag; `up-to-phpXY` expands to every
//! version set at or below that version, oldest first, so earlier syntax
//! rewrites feed later ones within a pass.

use std::str::FromStr;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::rule::Rule;
use crate::rules;
use crate::version::PhpVersion;

const UP_TO_PREFIX: &str = "up-to-";

pub struct RuleSet {
    pub tag: String,
    pub rules: Vec<Arc<dyn Rule>>,
}

/// Ordered collection of rule sets, resolvable by tag.
pub struct Registry {
    sets: Vec<RuleSet>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry { sets: Vec::new() }
    }

    /// Everything that ships with the tool.
    pub fn builtin() -> Registry {
        let mut registry = Registry::new();
        for version in PhpVersion::ALL {
            let rules = rules::version_rules(*version);
            if !rules.is_empty() {
                registry.register(version.tag(), rules);
            }
        }
        registry.register("code-quality", rules::quality_rules());
        registry.register("dead-code", rules::dead_code_rules());
        registry.register("type-declaration", rules::type_declaration_rules());
        registry
    }

    pub fn register(&mut self, tag: impl Into<String>, rules: Vec<Arc<dyn Rule>>) {
        self.sets.push(RuleSet {
            tag: tag.into(),
            rules,
        });
    }

    pub fn sets(&self) -> &[RuleSet] {
        &self.sets
    }

    fn set(&self, tag: &str) -> Option<&RuleSet> {
        self.sets.iter().find(|s| s.tag == tag)
    }

    /// Version sets at or below `ceiling`, oldest first. The ceiling itself
    /// only needs to be a known version, not a registered set.
    fn versions_up_to(&self, ceiling: PhpVersion) -> Vec<&RuleSet> {
        PhpVersion::ALL
            .iter()
            .filter(|v| **v <= ceiling)
            .filter_map(|v| self.set(v.tag()))
            .collect()
    }

    /// Flattens the given tags into a rule list, in set order, dropping
    /// duplicate rule ids (the first occurrence wins).
    pub fn resolve(&self, tags: &[String]) -> Result<Vec<Arc<dyn Rule>>, ConfigError> {
        let mut out: Vec<Arc<dyn Rule>> = Vec::new();
        let mut push = |rule: &Arc<dyn Rule>, out: &mut Vec<Arc<dyn Rule>>| {
            if out.iter().all(|r| r.id() != rule.id()) {
                out.push(Arc::clone(rule));
            }
        };
        for tag in tags {
            if let Some(set) = self.set(tag) {
                for rule in &set.rules {
                    push(rule, &mut out);
                }
                continue;
            }
            if let Some(rest) = tag.strip_prefix(UP_TO_PREFIX) {
                if let Ok(ceiling) = PhpVersion::from_str(rest) {
                    for set in self.versions_up_to(ceiling) {
                        for rule in &set.rules {
                            push(rule, &mut out);
                        }
                    }
                    continue;
                }
            }
            return Err(ConfigError::UnknownTag { tag: tag.clone() });
        }
        Ok(out)
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(rules: &[Arc<dyn Rule>]) -> Vec<&'static str> {
        rules.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn builtin_carries_the_shipped_sets() {
        let registry = Registry::builtin();
        let tags: Vec<&str> = registry.sets().iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(
            tags,
            vec![
                "php54",
                "php56",
                "php70",
                "php71",
                "php74",
                "php80",
                "code-quality",
                "dead-code",
                "type-declaration",
            ]
        );
    }

    #[test]
    fn up_to_expands_oldest_first() {
        let registry = Registry::builtin();
        let rules = registry.resolve(&["up-to-php71".to_string()]).unwrap();
        assert_eq!(
            ids(&rules),
            vec![
                "short-array-syntax",
                "pow-to-exponentiation",
                "variadic-parameters",
                "ternary-to-null-coalescing",
                "rand-to-random-int",
                "short-list-syntax",
            ]
        );
    }

    #[test]
    fn up_to_accepts_versions_without_a_set() {
        let registry = Registry::builtin();
        let rules = registry.resolve(&["up-to-php84".to_string()]).unwrap();
        assert!(ids(&rules).contains(&"str-contains"));
    }

    #[test]
    fn duplicate_rules_resolve_once() {
        let registry = Registry::builtin();
        let rules = registry
            .resolve(&["php54".to_string(), "up-to-php54".to_string()])
            .unwrap();
        assert_eq!(ids(&rules), vec!["short-array-syntax"]);
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let registry = Registry::builtin();
        match registry.resolve(&["php99".to_string()]) {
            Err(ConfigError::UnknownTag { tag }) => assert_eq!(tag, "php99"),
            other => panic!("expected UnknownTag, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn bare_unregistered_version_is_an_error() {
        let registry = Registry::builtin();
        assert!(registry.resolve(&["php81".to_string()]).is_err());
    }
}
