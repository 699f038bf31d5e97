#![allow(dead_code)]

use rewriter::{
    Comment, ContentType, Doctype, DocumentContentHandlers, Element, ElementContentHandlers,
    HandlerResult, HtmlRewriterBuilder, RewriterConfig, RewritingError, TextChunk,
};
use rewriter_test_support::chunker::ChunkPlan;
use rewriter_test_support::fixtures::{Action, RewriteCase, Rule, Target};
use rewriter_test_support::{diff_lines, split_markup_lines};

pub fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn content_type(rule: &Rule) -> ContentType {
    if rule.html {
        ContentType::Html
    } else {
        ContentType::Text
    }
}

fn unsupported(rule: &Rule, unit: &str) -> HandlerResult {
    Err(format!("{:?} is not supported on {unit}", rule.action).into())
}

fn apply_element(el: &mut Element<'_>, rule: &Rule) -> HandlerResult {
    let ct = content_type(rule);
    match rule.action {
        Action::Before => el.before(&rule.content, ct),
        Action::After => el.after(&rule.content, ct),
        Action::Prepend => el.prepend(&rule.content, ct),
        Action::Append => el.append(&rule.content, ct),
        Action::Replace => el.replace(&rule.content, ct),
        Action::Remove => el.remove(),
        Action::RemoveAndKeepContent => el.remove_and_keep_content(),
        Action::SetInnerContent => el.set_inner_content(&rule.content, ct),
        Action::SetAttribute => el.set_attribute(attribute_name(rule), &rule.content)?,
        Action::RemoveAttribute => el.remove_attribute(attribute_name(rule)),
        Action::SetTagName => el.set_tag_name(&rule.content)?,
        Action::SetText => return unsupported(rule, "elements"),
    }
    Ok(())
}

fn attribute_name(rule: &Rule) -> &str {
    rule.name.as_deref().unwrap_or_default()
}

fn apply_comment(comment: &mut Comment<'_>, rule: &Rule) -> HandlerResult {
    let ct = content_type(rule);
    match rule.action {
        Action::Before => comment.before(&rule.content, ct),
        Action::After => comment.after(&rule.content, ct),
        Action::Replace => comment.replace(&rule.content, ct),
        Action::Remove => comment.remove(),
        Action::SetText => comment.set_text(&rule.content)?,
        _ => return unsupported(rule, "comments"),
    }
    Ok(())
}

/// Text rules act on whole text nodes so that results do not depend on how
/// the node was split into chunks: `before` applies to the first chunk,
/// `after` to the last, `replace` removes all chunks and writes the
/// replacement in place of the last one.
fn text_rule(rule: &Rule) -> impl FnMut(&mut TextChunk<'_>) -> HandlerResult + '_ {
    let mut at_node_start = true;
    move |chunk: &mut TextChunk<'_>| {
        let first = at_node_start;
        let last = chunk.last_in_text_node();
        at_node_start = last;
        let ct = content_type(rule);
        match rule.action {
            Action::Before if first => chunk.before(&rule.content, ct),
            Action::After if last => chunk.after(&rule.content, ct),
            Action::Before | Action::After => {}
            Action::Replace if last => chunk.replace(&rule.content, ct),
            Action::Replace | Action::Remove => chunk.remove(),
            _ => return unsupported(rule, "text"),
        }
        Ok(())
    }
}

fn apply_doctype(doctype: &mut Doctype<'_>, rule: &Rule) -> HandlerResult {
    let ct = content_type(rule);
    match rule.action {
        Action::Before => doctype.before(&rule.content, ct),
        Action::After => doctype.after(&rule.content, ct),
        Action::Replace => doctype.replace(&rule.content, ct),
        Action::Remove => doctype.remove(),
        _ => return unsupported(rule, "doctypes"),
    }
    Ok(())
}

pub fn builder_for_rules(rules: &[Rule]) -> Result<HtmlRewriterBuilder<'_>, RewritingError> {
    let mut builder = HtmlRewriterBuilder::new();
    for rule in rules {
        match &rule.selector {
            Some(selector) => {
                let handlers = ElementContentHandlers::default();
                let handlers = match rule.target {
                    Target::Element => handlers.element(move |el| apply_element(el, rule)),
                    Target::Comments => handlers.comments(move |c| apply_comment(c, rule)),
                    Target::Text => handlers.text(text_rule(rule)),
                    Target::Doctype => unreachable!("validated by the fixture loader"),
                };
                builder.on(selector, handlers)?;
            }
            None => {
                let handlers = DocumentContentHandlers::default();
                let handlers = match rule.target {
                    Target::Doctype => handlers.doctype(move |d| apply_doctype(d, rule)),
                    Target::Comments => handlers.comments(move |c| apply_comment(c, rule)),
                    Target::Text => handlers.text(text_rule(rule)),
                    Target::Element => unreachable!("validated by the fixture loader"),
                };
                builder.on_document(handlers);
            }
        }
    }
    Ok(builder)
}

pub fn config_for(case: &RewriteCase) -> RewriterConfig {
    match &case.encoding {
        Some(label) => RewriterConfig::with_encoding(label),
        None => RewriterConfig::default(),
    }
}

/// Fixture input in the case's document encoding.
pub fn encoded_input(case: &RewriteCase) -> Vec<u8> {
    let label = case.encoding.as_deref().unwrap_or("utf-8");
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .unwrap_or_else(|| panic!("case '{}': unknown encoding {label}", case.name));
    let (bytes, _, had_errors) = encoding.encode(&case.input);
    assert!(!had_errors, "case '{}': input not representable in {label}", case.name);
    bytes.into_owned()
}

pub fn decoded_output(case: &RewriteCase, output: &[u8]) -> String {
    let label = case.encoding.as_deref().unwrap_or("utf-8");
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .unwrap_or_else(|| panic!("case '{}': unknown encoding {label}", case.name));
    encoding.decode_without_bom_handling(output).0.into_owned()
}

/// Run `chunks` through a rewriter built from `rules`.
pub fn rewrite_chunks<'c>(
    rules: &[Rule],
    config: RewriterConfig,
    chunks: impl IntoIterator<Item = &'c [u8]>,
) -> Result<Vec<u8>, RewritingError> {
    let mut output = Vec::new();
    let builder = builder_for_rules(rules)?;
    let mut rewriter =
        builder.build_with_config(config, |chunk: &[u8]| output.extend_from_slice(chunk))?;
    for chunk in chunks {
        rewriter.write(chunk)?;
    }
    rewriter.end()?;
    Ok(output)
}

pub fn run_case(case: &RewriteCase, plan: Option<&ChunkPlan>) -> Result<Vec<u8>, RewritingError> {
    let input = encoded_input(case);
    let chunks = match plan {
        Some(plan) => plan.chunks(&input),
        None => vec![input.as_slice()],
    };
    rewrite_chunks(&case.rules, config_for(case), chunks)
}

pub fn assert_same_output(label: &str, expected: &[u8], actual: &[u8]) {
    if expected != actual {
        let diff = diff_lines(&split_markup_lines(expected), &split_markup_lines(actual));
        panic!("{label}: output mismatch\n{diff}");
    }
}
