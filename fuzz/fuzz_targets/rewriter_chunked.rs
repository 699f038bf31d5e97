#![no_main]

use libfuzzer_sys::fuzz_target;
use rewriter::{
    ContentType, DocumentContentHandlers, ElementContentHandlers, HtmlRewriterBuilder,
    RewriterConfig, RewritingError,
};

fn run(data: &[u8], split: &[usize], with_handlers: bool) -> Result<Vec<u8>, RewritingError> {
    let mut output = Vec::new();
    let mut builder = HtmlRewriterBuilder::new();
    if with_handlers {
        builder.on(
            "div p",
            ElementContentHandlers::default().element(|el| {
                el.before("<", ContentType::Text);
                el.set_attribute("data-x", "\"")?;
                Ok(())
            }),
        )?;
        builder.on(
            "a > *",
            ElementContentHandlers::default().text(|t| {
                if t.last_in_text_node() {
                    t.after("!", ContentType::Text);
                }
                Ok(())
            }),
        )?;
        builder.on_document(DocumentContentHandlers::default().comments(|c| {
            c.set_text("c")?;
            Ok(())
        }));
    }
    let config = RewriterConfig {
        output_buffer_size: 16,
        strict_end_of_input: false,
        ..RewriterConfig::default()
    };
    let mut rewriter =
        builder.build_with_config(config, |chunk: &[u8]| output.extend_from_slice(chunk))?;
    let mut last = 0usize;
    for &idx in split {
        rewriter.write(&data[last..idx])?;
        last = idx;
    }
    rewriter.write(&data[last..])?;
    rewriter.end()?;
    Ok(output)
}

fuzz_target!(|data: &[u8]| {
    // First byte seeds the split points; the rest is the document.
    let Some((&seed, html)) = data.split_first() else {
        return;
    };
    let mut split = Vec::new();
    if !html.is_empty() {
        let step = usize::from(seed % 17) + 1;
        split.extend((step..html.len()).step_by(step));
    }

    let whole = run(html, &[], false);
    if let Ok(output) = &whole {
        assert_eq!(output.as_slice(), html, "passthrough must be byte-identical");
    }
    let chunked = run(html, &split, false);
    assert_eq!(whole.is_ok(), chunked.is_ok(), "chunking changed the outcome");

    let whole = run(html, &[], true);
    let chunked = run(html, &split, true);
    match (whole, chunked) {
        (Ok(a), Ok(b)) => assert_eq!(a, b, "chunking changed the output"),
        (Err(_), Err(_)) => {}
        (a, b) => panic!("chunking changed the outcome: {a:?} vs {b:?}"),
    }
});
