use crate::config::RewriterConfig;
use crate::error::{HandlerResult, RewritingError, TruncatedConstruct};
use crate::handlers::{DocumentContentHandlers, ElementContentHandlers};
use crate::rewritable_units::{ContentType, TextChunk};
use crate::rewriter::HtmlRewriterBuilder;
use std::cell::RefCell;

fn run(
    builder: HtmlRewriterBuilder<'_>,
    config: RewriterConfig,
    chunks: &[&[u8]],
) -> Result<Vec<u8>, RewritingError> {
    let mut output = Vec::new();
    let mut rewriter =
        builder.build_with_config(config, |chunk: &[u8]| output.extend_from_slice(chunk))?;
    for chunk in chunks {
        rewriter.write(chunk)?;
    }
    rewriter.end()?;
    Ok(output)
}

fn rewrite(builder: HtmlRewriterBuilder<'_>, html: &str) -> Result<String, RewritingError> {
    crate::rewrite_str(html, builder)
}

#[test]
fn unmatched_handlers_leave_input_untouched() {
    let input = "<!DOCTYPE html><div class=a>text &amp; more<!--c--></div><br/>";
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "span",
            ElementContentHandlers::default()
                .element(|el| {
                    el.remove();
                    Ok(())
                })
                .comments(|c| {
                    c.remove();
                    Ok(())
                })
                .text(|t| {
                    t.remove();
                    Ok(())
                }),
        )
        .unwrap();
    assert_eq!(rewrite(builder, input).unwrap(), input);
}

#[test]
fn text_handlers_run_document_first_then_outer_to_inner() {
    let log = RefCell::new(Vec::new());
    let record = |label: &'static str| {
        let log = &log;
        move |t: &mut TextChunk<'_>| -> HandlerResult {
            log.borrow_mut().push(format!("{label}:{}", t.as_str()));
            Ok(())
        }
    };
    let mut builder = HtmlRewriterBuilder::new();
    builder.on_document(DocumentContentHandlers::default().text(record("doc")));
    builder
        .on("p", ElementContentHandlers::default().text(record("p")))
        .unwrap();
    builder
        .on("div", ElementContentHandlers::default().text(record("div")))
        .unwrap();
    builder
        .on("div p", ElementContentHandlers::default().text(record("div p")))
        .unwrap();
    rewrite(builder, "<div><p>hi</p></div>").unwrap();
    assert_eq!(
        log.into_inner(),
        vec!["doc:hi", "div:hi", "p:hi", "div p:hi"]
    );
}

#[test]
fn selector_handler_runs_once_per_unit() {
    let count = RefCell::new(0);
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "div",
            ElementContentHandlers::default().text(|_| {
                *count.borrow_mut() += 1;
                Ok(())
            }),
        )
        .unwrap();
    rewrite(builder, "<div><div>x</div></div>").unwrap();
    assert_eq!(count.into_inner(), 1);
}

#[test]
fn comment_handlers_are_scoped_to_matched_elements() {
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "div",
            ElementContentHandlers::default().comments(|c| {
                assert_eq!(c.text(), "b");
                c.remove();
                Ok(())
            }),
        )
        .unwrap();
    assert_eq!(
        rewrite(builder, "<!--a--><div><!--b--></div><!--c-->").unwrap(),
        "<!--a--><div></div><!--c-->"
    );
}

#[test]
fn implicitly_closed_elements_flush_append_and_after() {
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "p",
            ElementContentHandlers::default().element(|el| {
                el.append("!", ContentType::Text);
                el.after("|", ContentType::Text);
                Ok(())
            }),
        )
        .unwrap();
    builder
        .on(
            "span",
            ElementContentHandlers::default().element(|el| {
                el.after("~", ContentType::Text);
                Ok(())
            }),
        )
        .unwrap();
    assert_eq!(
        rewrite(builder, "<div><p>one<span>two</div>after").unwrap(),
        "<div><p>one<span>two~!|</div>after"
    );
}

#[test]
fn unclosed_element_with_required_end_tag_fails() {
    let err = rewrite(HtmlRewriterBuilder::new(), "<div><p>").unwrap_err();
    assert!(matches!(
        err,
        RewritingError::UnexpectedEndOfInput(TruncatedConstruct::UnclosedElement(ref name))
            if name == "div"
    ));
}

#[test]
fn optional_end_tags_may_stay_open() {
    let input = "<html><body><ul><li>one<li>two";
    assert_eq!(
        rewrite(HtmlRewriterBuilder::new(), input)
            .unwrap_err()
            .to_string(),
        "unexpected end of input with element <ul> still open"
    );
    let input = "<html><body><p>one<p>two";
    assert_eq!(rewrite(HtmlRewriterBuilder::new(), input).unwrap(), input);
}

#[test]
fn lenient_end_closes_open_elements() {
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "p",
            ElementContentHandlers::default().element(|el| {
                el.append("x", ContentType::Text);
                Ok(())
            }),
        )
        .unwrap();
    let config = RewriterConfig {
        strict_end_of_input: false,
        ..RewriterConfig::default()
    };
    assert_eq!(run(builder, config, &[b"<div><p>"]).unwrap(), b"<div><p>x");
}

#[test]
fn handlers_inside_replaced_element_run_but_write_nothing() {
    let span_seen = RefCell::new(false);
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "div",
            ElementContentHandlers::default().element(|el| {
                el.replace("X", ContentType::Html);
                Ok(())
            }),
        )
        .unwrap();
    builder
        .on(
            "span",
            ElementContentHandlers::default().element(|el| {
                *span_seen.borrow_mut() = true;
                el.before("B", ContentType::Text);
                Ok(())
            }),
        )
        .unwrap();
    assert_eq!(
        rewrite(builder, "<i><div><span>a</span></div></i>").unwrap(),
        "<i>X</i>"
    );
    assert!(span_seen.into_inner());
}

#[test]
fn rename_rewrites_matching_end_tag() {
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "div.card",
            ElementContentHandlers::default().element(|el| {
                el.set_tag_name("section")?;
                Ok(())
            }),
        )
        .unwrap();
    assert_eq!(
        rewrite(builder, "<div class=card><div>x</div></DIV >").unwrap(),
        "<section class=card><div>x</div></section>"
    );
}

#[test]
fn remove_and_keep_content_and_inner_content() {
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "b",
            ElementContentHandlers::default().element(|el| {
                el.remove_and_keep_content();
                Ok(())
            }),
        )
        .unwrap();
    builder
        .on(
            "section",
            ElementContentHandlers::default().element(|el| {
                el.set_inner_content("<em>new</em>", ContentType::Html);
                Ok(())
            }),
        )
        .unwrap();
    assert_eq!(
        rewrite(builder, "<div><b>x</b></div><section>old<p>a</p></section>").unwrap(),
        "<div>x</div><section><em>new</em></section>"
    );
}

#[test]
fn void_elements_close_with_their_start_tag() {
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "img",
            ElementContentHandlers::default().element(|el| {
                assert!(!el.can_have_content());
                el.after("!", ContentType::Text);
                Ok(())
            }),
        )
        .unwrap();
    builder
        .on(
            "img span",
            ElementContentHandlers::default().element(|el| {
                el.remove();
                Ok(())
            }),
        )
        .unwrap();
    assert_eq!(
        rewrite(builder, "<img src=a><span>s</span><br/>").unwrap(),
        "<img src=a>!<span>s</span><br/>"
    );
}

#[test]
fn doctype_handler_sees_fields() {
    let mut builder = HtmlRewriterBuilder::new();
    builder.on_document(DocumentContentHandlers::default().doctype(|doctype| {
        assert_eq!(doctype.name(), Some("html"));
        assert_eq!(doctype.system_id(), Some("about:legacy-compat"));
        doctype.remove();
        Ok(())
    }));
    assert_eq!(
        rewrite(builder, "<!DOCTYPE HTML SYSTEM \"about:legacy-compat\"><p>x").unwrap(),
        "<p>x"
    );
}

#[test]
fn split_character_is_held_back_for_text_handlers() {
    let chunks = RefCell::new(Vec::new());
    let mut builder = HtmlRewriterBuilder::new();
    builder.on_document(DocumentContentHandlers::default().text(|t| {
        chunks
            .borrow_mut()
            .push((t.as_str().to_string(), t.last_in_text_node()));
        Ok(())
    }));
    let output = run(
        builder,
        RewriterConfig::default(),
        &[b"<p>a\xE2\x82", b"\xAC b</p>"],
    )
    .unwrap();
    assert_eq!(output, "<p>a€ b</p>".as_bytes());
    assert_eq!(
        chunks.into_inner(),
        vec![("a".to_string(), false), ("€ b".to_string(), true)]
    );
}

#[test]
fn legacy_encoding_round_trips_inserted_text() {
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "p",
            ElementContentHandlers::default().text(|t| {
                if t.last_in_text_node() {
                    assert_eq!(t.as_str(), "café");
                    t.after("ü", ContentType::Text);
                }
                Ok(())
            }),
        )
        .unwrap();
    let output = run(
        builder,
        RewriterConfig::with_encoding("windows-1252"),
        &[b"<p>caf\xE9</p>"],
    )
    .unwrap();
    assert_eq!(output, b"<p>caf\xE9\xFC</p>");
}

#[test]
fn handler_error_aborts_the_rewrite() {
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "p",
            ElementContentHandlers::default().element(|_| Err("boom".into())),
        )
        .unwrap();
    let err = rewrite(builder, "<p>x</p>").unwrap_err();
    assert_eq!(err.to_string(), "content handler failed: boom");
}

#[test]
fn stray_end_tags_pass_through() {
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "div",
            ElementContentHandlers::default().element(|el| {
                el.append("+", ContentType::Text);
                Ok(())
            }),
        )
        .unwrap();
    assert_eq!(
        rewrite(builder, "</span><div>x</p></div></br>").unwrap(),
        "</span><div>x</p>+</div></br>"
    );
}

#[test]
fn units_are_built_only_for_present_handler_kinds() {
    let mut output = Vec::new();
    let mut builder = HtmlRewriterBuilder::new();
    builder
        .on(
            "div",
            ElementContentHandlers::default().element(|el| {
                el.set_attribute("data-seen", "1")?;
                Ok(())
            }),
        )
        .unwrap();
    builder.on_document(DocumentContentHandlers::default().comments(|c| {
        c.set_text("C")?;
        Ok(())
    }));
    let mut rewriter = builder
        .build("utf-8", |chunk: &[u8]| output.extend_from_slice(chunk))
        .unwrap();
    rewriter
        .write(b"<div>text<!--c--><p>more</p></div>")
        .unwrap();
    let stats = rewriter.stats();
    assert_eq!(stats.dispatch.elements_matched, 1);
    // The div and the comment; neither text node nor `<p>` becomes a unit.
    assert_eq!(stats.dispatch.units_constructed, 2);
    rewriter.end().unwrap();
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "<div data-seen=\"1\">text<!--C--><p>more</p></div>"
    );
}
