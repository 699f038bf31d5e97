//! HTML element tables shared by the tokenizer and the dispatcher.
//!
//! All lookups take raw tag-name bytes and compare ASCII case-insensitively.

/// Content model the tokenizer switches to after a start tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TextMode {
    /// Text until the matching end tag (`script`, `style`, `title`, ...).
    /// Character references are not interpreted by the rewriter, so RCDATA
    /// and RAWTEXT tokenize identically.
    RawText(&'static [u8]),
    /// Everything up to end of input is text.
    PlainText,
}

const RAW_TEXT_ELEMENTS: &[&[u8]] = &[
    b"script", b"style", b"xmp", b"iframe", b"noembed", b"noframes", b"noscript",
    b"title", b"textarea",
];

pub(crate) fn text_mode_for(name: &[u8]) -> Option<TextMode> {
    if name.eq_ignore_ascii_case(b"plaintext") {
        return Some(TextMode::PlainText);
    }
    RAW_TEXT_ELEMENTS
        .iter()
        .find(|candidate| name.eq_ignore_ascii_case(candidate))
        .map(|&candidate| TextMode::RawText(candidate))
}

pub(crate) fn is_void_element(name: &[u8]) -> bool {
    const VOID: &[&[u8]] = &[
        b"area", b"base", b"br", b"col", b"embed", b"hr", b"img", b"input", b"link", b"meta",
        b"param", b"source", b"track", b"wbr",
    ];
    VOID.iter().any(|candidate| name.eq_ignore_ascii_case(candidate))
}

/// Elements whose end tag may be omitted; a document that ends with one of
/// these still open is not truncated.
pub(crate) fn has_optional_end_tag(name: &[u8]) -> bool {
    const OPTIONAL_END: &[&[u8]] = &[
        b"html", b"head", b"body", b"p", b"li", b"dt", b"dd", b"option", b"optgroup", b"tr",
        b"td", b"th", b"thead", b"tbody", b"tfoot", b"colgroup", b"caption", b"rt", b"rp",
        b"rb", b"rtc",
    ];
    OPTIONAL_END
        .iter()
        .any(|candidate| name.eq_ignore_ascii_case(candidate))
}
