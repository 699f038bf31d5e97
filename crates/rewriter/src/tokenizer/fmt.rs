//! Deterministic lexeme formatting for tokenizer tests.

use super::{Lexeme, Span, TokenOutline};
use std::fmt::Write;

pub(crate) fn format_lexeme(lexeme: &Lexeme<'_>) -> String {
    let text = |span: Span| escape_text(&String::from_utf8_lossy(lexeme.part(span)));
    let optional = |span: Option<Span>| span.map_or_else(|| "null".to_string(), |s| format!("\"{}\"", text(s)));
    match lexeme.token() {
        TokenOutline::StartTag {
            name,
            attrs,
            self_closing,
        } => {
            let mut out = format!("START name={} attrs=[", text(*name).to_ascii_lowercase());
            for (i, attr) in attrs.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(
                    out,
                    "{}=\"{}\"",
                    text(attr.name).to_ascii_lowercase(),
                    text(attr.value)
                );
            }
            let _ = write!(out, "] self_closing={self_closing}");
            out
        }
        TokenOutline::EndTag { name } => format!("END name={}", text(*name).to_ascii_lowercase()),
        TokenOutline::Comment { text: span } => format!("COMMENT text=\"{}\"", text(*span)),
        TokenOutline::Text { .. } => format!("CHAR text=\"{}\"", text(lexeme.raw_span())),
        TokenOutline::Doctype {
            name,
            public_id,
            system_id,
            force_quirks,
        } => format!(
            "DOCTYPE name={} public_id={} system_id={} force_quirks={force_quirks}",
            name.map_or_else(|| "null".to_string(), |s| text(s).to_ascii_lowercase()),
            optional(*public_id),
            optional(*system_id),
        ),
        TokenOutline::Eof => "EOF".to_string(),
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' || ch == '\u{7f}' => {
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}
