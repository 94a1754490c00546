//! Rule table parsing.
//!
//! One rule per line: `class,sourceKey,sourceValue,targetKey,targetValue`.
//! The line is split on at most four commas, so the target value may itself
//! contain commas. Malformed lines are skipped and reported as diagnostics.

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

use super::{Rule, RuleClass, RuleSet};
use crate::utils::escape_xml;

/// Target value meaning "use the source value".
const PASS_THROUGH: &str = "-";

const FIELD_COUNT: usize = 5;

/// Why a rule line was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    FieldCount { found: usize },
    UnknownClass { class: String },
}

/// A skipped rule line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDiagnostic {
    /// 1-based line number.
    pub line: usize,
    pub content: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for RuleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::FieldCount { found } => write!(
                f,
                "Skipped line {}: \"{}\". Had {} pieces and expected {}.",
                self.line, self.content, found, FIELD_COUNT
            ),
            DiagnosticKind::UnknownClass { class } => write!(
                f,
                "Line {}: Unknown type {} in \"{}\"",
                self.line, class, self.content
            ),
        }
    }
}

/// Result of parsing a rule table.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    pub rules: RuleSet,
    pub diagnostics: Vec<RuleDiagnostic>,
}

impl RuleTable {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Rules: Failed to read rule table {:?}", path))?;
        Ok(parse_rules(&text))
    }
}

fn optional(field: &str) -> Option<&str> {
    if field.is_empty() { None } else { Some(field) }
}

fn parse_line(line: &str) -> Result<Rule, DiagnosticKind> {
    let fields: Vec<&str> = line.splitn(FIELD_COUNT, ',').collect();
    let [class, source_key, source_value, target_key, target_value] = fields[..] else {
        return Err(DiagnosticKind::FieldCount {
            found: fields.len(),
        });
    };

    let class: RuleClass = class.parse().map_err(|_| DiagnosticKind::UnknownClass {
        class: class.to_string(),
    })?;

    let target_value = match target_value {
        PASS_THROUGH => None,
        value => Some(escape_xml(value).into_owned()),
    };

    Ok(Rule {
        class,
        source_key: source_key.to_string(),
        source_value: optional(source_value).map(str::to_string),
        target_key: escape_xml(target_key).into_owned(),
        target_value,
    })
}

/// Parse a whole rule table.
///
/// Comment lines (`#`) and blank lines are ignored. Never fails: problems are
/// returned alongside the rules that did parse.
pub fn parse_rules(text: &str) -> RuleTable {
    let mut rules = RuleSet::new();
    let mut diagnostics = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse_line(line) {
            Ok(rule) => rules.push(rule),
            Err(kind) => diagnostics.push(RuleDiagnostic {
                line: index + 1,
                content: line.to_string(),
                kind,
            }),
        }
    }

    RuleTable { rules, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rules_into_their_classes() {
        let table = parse_rules(
            "# comment\n\
             \n\
             point,name,,name,-\n\
             line,highway,,highway,residential\n\
             outer,landuse,park,leisure,park\n\
             inner,kind,lake,natural,water\n",
        );

        assert!(table.diagnostics.is_empty());
        assert_eq!(table.rules.len(), 4);

        let point = &table.rules.rules(RuleClass::Point)[0];
        assert_eq!(point.source_value, None);
        assert_eq!(point.target_value, None);

        let outer = &table.rules.rules(RuleClass::Outer)[0];
        assert_eq!(outer.source_value.as_deref(), Some("park"));
        assert_eq!(outer.target_value.as_deref(), Some("park"));
    }

    #[test]
    fn escapes_targets_at_load_time() {
        let table = parse_rules("line,type,A&B,a<b,Fish & Chips\n");
        let rule = &table.rules.rules(RuleClass::Line)[0];

        assert_eq!(rule.target_key, "a&lt;b");
        assert_eq!(rule.target_value.as_deref(), Some("Fish &amp; Chips"));
        assert_eq!(rule.source_value.as_deref(), Some("A&B"));
    }

    #[test]
    fn target_value_keeps_extra_commas() {
        let table = parse_rules("point,note,,note,a,b,c\n");
        let rule = &table.rules.rules(RuleClass::Point)[0];
        assert_eq!(rule.target_value.as_deref(), Some("a,b,c"));
    }

    #[test]
    fn only_dash_passes_the_value_through() {
        let table = parse_rules("point,name,,name,-\npoint,fixme,,fixme,\n");
        let rules = table.rules.rules(RuleClass::Point);

        assert_eq!(rules[0].target_value, None);
        assert_eq!(rules[1].target_value.as_deref(), Some(""));
        assert_eq!(
            rules[1].create_tag("fixme", "check"),
            Some(("fixme".to_string(), String::new()))
        );
    }

    #[test]
    fn wrong_field_count_is_reported() {
        let table = parse_rules("point,name\nline,highway,,highway,primary\n");

        assert_eq!(table.rules.len(), 1);
        assert_eq!(
            table.diagnostics,
            vec![RuleDiagnostic {
                line: 1,
                content: "point,name".into(),
                kind: DiagnosticKind::FieldCount { found: 2 },
            }]
        );
    }

    #[test]
    fn unknown_class_is_reported() {
        let table = parse_rules("\n\narea,landuse,,landuse,-\n");

        assert!(table.rules.is_empty());
        assert_eq!(table.diagnostics.len(), 1);
        assert_eq!(table.diagnostics[0].line, 3);
        assert_eq!(
            table.diagnostics[0].kind,
            DiagnosticKind::UnknownClass {
                class: "area".into()
            }
        );
        assert!(table.diagnostics[0].to_string().contains("Unknown type area"));
    }

    #[test]
    fn indented_comment_is_skipped() {
        let table = parse_rules("   # point,name,,name,-\n");
        assert!(table.rules.is_empty());
        assert!(table.diagnostics.is_empty());
    }

    #[test]
    fn loads_table_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "line,highway,,highway,-\n").unwrap();

        let table = RuleTable::load(file.path()).unwrap();
        assert_eq!(table.rules.rules(RuleClass::Line).len(), 1);
    }
}
