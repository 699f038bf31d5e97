//! TOML rewrite fixtures.
//!
//! ```toml
//! format = "rewriter-fixtures-v1"
//!
//! [[case]]
//! name = "insert around paragraph"
//! input = "<p>X</p>"
//! expected = "A<p>X</p><b>B</b>"
//!
//! [[case.rule]]
//! selector = "p"
//! action = "before"
//! content = "A"
//! ```
//!
//! A rule without `selector` binds document-wide handlers. `target` defaults
//! to `element` for selector rules.

use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const REWRITE_FIXTURES_FORMAT_V1: &str = "rewriter-fixtures-v1";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RewriteFixtureFile {
    pub format: String,
    #[serde(rename = "case")]
    pub cases: Vec<RewriteCase>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RewriteCase {
    pub name: String,
    pub input: String,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    /// Name of the expected `RewritingError` variant.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "rule")]
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub target: Target,
    pub action: Action,
    #[serde(default)]
    pub content: String,
    /// Insert `content` as HTML instead of escaping it.
    #[serde(default)]
    pub html: bool,
    /// Attribute name for attribute actions.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    #[default]
    Element,
    Comments,
    Text,
    Doctype,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Before,
    After,
    Prepend,
    Append,
    Replace,
    Remove,
    RemoveAndKeepContent,
    SetInnerContent,
    SetAttribute,
    RemoveAttribute,
    SetTagName,
    SetText,
}

pub fn parse_fixture_str(content: &str, origin: &str) -> RewriteFixtureFile {
    let file: RewriteFixtureFile = toml::from_str(content)
        .unwrap_or_else(|err| panic!("failed to parse rewrite fixtures {origin}: {err}"));
    assert_eq!(
        file.format, REWRITE_FIXTURES_FORMAT_V1,
        "unsupported rewrite fixture format in {origin}"
    );
    for case in &file.cases {
        validate_case(case, origin);
    }
    file
}

pub fn load_fixture_file(path: &Path) -> RewriteFixtureFile {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read rewrite fixtures {path:?}: {err}"));
    parse_fixture_str(&content, &path.display().to_string())
}

fn validate_case(case: &RewriteCase, origin: &str) {
    assert!(
        case.expected.is_some() != case.error.is_some(),
        "case '{}' in {origin} needs exactly one of `expected` or `error`",
        case.name
    );
    for rule in &case.rules {
        let document_rule = rule.selector.is_none();
        assert!(
            document_rule || rule.target != Target::Doctype,
            "case '{}' in {origin}: doctype rules cannot have a selector",
            case.name
        );
        assert!(
            !document_rule || rule.target != Target::Element,
            "case '{}' in {origin}: element rules need a selector",
            case.name
        );
        let needs_name = matches!(rule.action, Action::SetAttribute | Action::RemoveAttribute);
        assert!(
            !needs_name || rule.name.is_some(),
            "case '{}' in {origin}: {:?} needs `name`",
            case.name,
            rule.action
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cases_and_rules() {
        let file = parse_fixture_str(
            r#"
format = "rewriter-fixtures-v1"

[[case]]
name = "attr"
input = "<a>"
expected = "<a x=\"1\">"

[[case.rule]]
selector = "a"
action = "set_attribute"
name = "x"
content = "1"

[[case.rule]]
target = "comments"
action = "remove"
"#,
            "inline",
        );
        let case = &file.cases[0];
        assert_eq!(case.rules.len(), 2);
        assert_eq!(case.rules[0].target, Target::Element);
        assert_eq!(case.rules[0].action, Action::SetAttribute);
        assert_eq!(case.rules[1].selector, None);
        assert_eq!(case.rules[1].target, Target::Comments);
    }

    #[test]
    #[should_panic(expected = "needs exactly one of")]
    fn rejects_case_without_expectation() {
        parse_fixture_str(
            "format = \"rewriter-fixtures-v1\"\n[[case]]\nname = \"x\"\ninput = \"\"\n",
            "inline",
        );
    }
}
