//! Tag rules.
//!
//! A rule maps a source attribute (optionally restricted to one value) onto a
//! target tag. Rules are grouped per geometry class; within a class every
//! matching rule contributes a tag, in table order.

mod parse;

pub use parse::{DiagnosticKind, RuleDiagnostic, RuleTable, parse_rules};

use std::fmt;
use std::str::FromStr;

use crate::expr::InclusionPredicate;
use crate::primitive::{PrimitiveKind, Tags};

/// Geometry class a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleClass {
    Point,
    Line,
    Outer,
    Inner,
}

impl RuleClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleClass::Point => "point",
            RuleClass::Line => "line",
            RuleClass::Outer => "outer",
            RuleClass::Inner => "inner",
        }
    }
}

impl FromStr for RuleClass {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "point" => Ok(RuleClass::Point),
            "line" => Ok(RuleClass::Line),
            "outer" => Ok(RuleClass::Outer),
            "inner" => Ok(RuleClass::Inner),
            _ => Err(format!("unknown rule class: {value}")),
        }
    }
}

impl fmt::Display for RuleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single mapping directive.
///
/// `target_key` and `target_value` are stored XML-escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub class: RuleClass,
    pub source_key: String,
    /// `None` matches any value of `source_key`.
    pub source_value: Option<String>,
    pub target_key: String,
    /// `None` passes the source value through.
    pub target_value: Option<String>,
}

impl Rule {
    /// Derive a tag for an attribute, if this rule matches it.
    ///
    /// `escaped_value` is the normalized, XML-escaped attribute value.
    pub fn create_tag(&self, source_key: &str, escaped_value: &str) -> Option<(String, String)> {
        if self.source_key != source_key {
            return None;
        }
        if let Some(expected) = &self.source_value
            && expected != escaped_value
        {
            return None;
        }

        let value = self
            .target_value
            .clone()
            .unwrap_or_else(|| escaped_value.to_string());
        Some((self.target_key.clone(), value))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}={} -> {}={}",
            self.class,
            self.source_key,
            self.source_value.as_deref().unwrap_or("*"),
            self.target_key,
            self.target_value.as_deref().unwrap_or("<source value>")
        )
    }
}

/// Rules for every geometry class plus the inclusion predicate.
///
/// Built once at startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    point: Vec<Rule>,
    line: Vec<Rule>,
    outer: Vec<Rule>,
    inner: Vec<Rule>,
    include: Option<InclusionPredicate>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to the list of its class.
    pub fn push(&mut self, rule: Rule) {
        match rule.class {
            RuleClass::Point => self.point.push(rule),
            RuleClass::Line => self.line.push(rule),
            RuleClass::Outer => self.outer.push(rule),
            RuleClass::Inner => self.inner.push(rule),
        }
    }

    pub fn with_include(mut self, predicate: Option<InclusionPredicate>) -> Self {
        self.include = predicate;
        self
    }

    pub fn rules(&self, class: RuleClass) -> &[Rule] {
        match class {
            RuleClass::Point => &self.point,
            RuleClass::Line => &self.line,
            RuleClass::Outer => &self.outer,
            RuleClass::Inner => &self.inner,
        }
    }

    pub fn len(&self) -> usize {
        self.point.len() + self.line.len() + self.outer.len() + self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inclusion predicate: without an expression everything is accepted.
    pub fn includes(&self, kind: PrimitiveKind, tags: &Tags) -> bool {
        match &self.include {
            Some(predicate) => predicate.accepts(kind, tags),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(source_value: Option<&str>, target_value: Option<&str>) -> Rule {
        Rule {
            class: RuleClass::Line,
            source_key: "highway".into(),
            source_value: source_value.map(Into::into),
            target_key: "highway".into(),
            target_value: target_value.map(Into::into),
        }
    }

    #[test]
    fn wildcard_rule_matches_any_value() {
        let r = rule(None, Some("residential"));
        assert_eq!(
            r.create_tag("highway", "anything"),
            Some(("highway".into(), "residential".into()))
        );
    }

    #[test]
    fn valued_rule_requires_exact_value() {
        let r = rule(Some("A1"), Some("motorway"));
        assert_eq!(r.create_tag("highway", "A2"), None);
        assert!(r.create_tag("highway", "A1").is_some());
    }

    #[test]
    fn pass_through_rule_copies_value() {
        let r = rule(None, None);
        assert_eq!(
            r.create_tag("highway", "Fish &amp; Chips"),
            Some(("highway".into(), "Fish &amp; Chips".into()))
        );
    }

    #[test]
    fn other_key_never_matches() {
        assert_eq!(rule(None, None).create_tag("name", "x"), None);
    }

    #[test]
    fn rule_set_keeps_classes_apart() {
        let mut rules = RuleSet::new();
        rules.push(rule(None, None));
        rules.push(Rule {
            class: RuleClass::Inner,
            ..rule(None, None)
        });

        assert_eq!(rules.rules(RuleClass::Line).len(), 1);
        assert_eq!(rules.rules(RuleClass::Inner).len(), 1);
        assert!(rules.rules(RuleClass::Point).is_empty());
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn rule_set_without_predicate_includes_everything() {
        let rules = RuleSet::new();
        assert!(rules.includes(PrimitiveKind::Node, &Tags::new()));
    }

    #[test]
    fn rule_set_delegates_to_predicate() {
        let predicate = InclusionPredicate::compile("kind == 'way'").unwrap();
        let rules = RuleSet::new().with_include(Some(predicate));

        assert!(rules.includes(PrimitiveKind::Way, &Tags::new()));
        assert!(!rules.includes(PrimitiveKind::Node, &Tags::new()));
    }
}
