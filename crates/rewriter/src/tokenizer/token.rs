//! Token outlines and the borrowed lexeme view handed to the sink.
//!
//! Outlines only record byte spans. Spans are absolute stream offsets; they
//! are resolved through the `Lexeme` that carries them, which borrows the
//! tokenizer buffer for the duration of one sink call.

/// Half-open byte range `[start, end)` in the input stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end }
    }

    pub fn empty_at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One attribute of a start tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeOutline {
    pub name: Span,
    /// Value without quotes; empty at the end of `name` when absent.
    pub value: Span,
    /// Name through the closing quote of the value.
    pub raw: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenOutline {
    StartTag {
        name: Span,
        attrs: Vec<AttributeOutline>,
        self_closing: bool,
    },
    EndTag {
        name: Span,
    },
    Comment {
        text: Span,
    },
    /// The text itself is the lexeme's raw span.
    Text {
        last_in_text_node: bool,
    },
    Doctype {
        name: Option<Span>,
        public_id: Option<Span>,
        system_id: Option<Span>,
        force_quirks: bool,
    },
    Eof,
}

/// A completed token together with the bytes it was produced from.
#[derive(Clone, Copy, Debug)]
pub struct Lexeme<'i> {
    input: &'i [u8],
    base: usize,
    token: &'i TokenOutline,
    raw: Span,
}

impl<'i> Lexeme<'i> {
    pub(crate) fn new(input: &'i [u8], base: usize, token: &'i TokenOutline, raw: Span) -> Self {
        Self {
            input,
            base,
            token,
            raw,
        }
    }

    pub fn token(&self) -> &'i TokenOutline {
        self.token
    }

    pub fn raw_span(&self) -> Span {
        self.raw
    }

    /// Original bytes of the whole token.
    pub fn raw(&self) -> &'i [u8] {
        self.part(self.raw)
    }

    /// Bytes of a span carried by this lexeme's outline.
    pub fn part(&self, span: Span) -> &'i [u8] {
        &self.input[span.start - self.base..span.end - self.base]
    }
}
