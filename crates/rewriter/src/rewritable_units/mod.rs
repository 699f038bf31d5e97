//! Content units handed to user handlers, and how they serialize.
//!
//! A unit is built from one lexeme, lives for the duration of the handler
//! calls on it and is serialized before the tokenizer resumes. Untouched
//! units reproduce their source bytes exactly.

use crate::encoding::Charset;
use std::borrow::Cow;

mod attribute;
mod comment;
mod doctype;
mod element;
mod mutations;
mod text_chunk;

pub use attribute::Attribute;
pub use comment::Comment;
pub use doctype::Doctype;
pub use element::Element;
pub use text_chunk::TextChunk;

pub(crate) use element::{EndTag, EndTagPlan};

/// How inserted content is treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    /// Inserted verbatim.
    Html,
    /// `&`, `<` and `>` are escaped.
    Text,
}

pub(crate) fn encode_content(
    content: &str,
    content_type: ContentType,
    charset: Charset,
    out: &mut Vec<u8>,
) {
    match content_type {
        ContentType::Html => charset.encode_into(content, out),
        ContentType::Text => charset.encode_into(&escape_text(content), out),
    }
}

pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let Some(first) = memchr::memchr3(b'&', b'<', b'>', bytes) else {
        return Cow::Borrowed(text);
    };
    let mut out = String::with_capacity(text.len() + 8);
    out.push_str(&text[..first]);
    for ch in text[first..].chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Attribute values are always written double-quoted.
pub(crate) fn escape_attribute_value(value: &str) -> Cow<'_, str> {
    if memchr::memchr(b'"', value.as_bytes()).is_none() {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace('"', "&quot;"))
}
