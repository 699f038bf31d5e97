//! Streaming byte-level HTML tokenizer.
//!
//! The tokenizer consumes raw bytes in an ASCII-compatible encoding and emits
//! token outlines (byte spans) to a `TokenSink`. It is an explicit state
//! machine and is resumable at any chunk boundary.
//!
//! Invariants:
//! - Chunk-equivalence: feeding input in one chunk or many chunks yields the
//!   same token sequence, except that a text run may arrive as several chunks.
//! - Span validity: spans are absolute stream offsets and are only resolvable
//!   through the `Lexeme` they arrive in, for the duration of the sink call.
//! - Retention: after each `feed` only the unfinished token (and text held
//!   back by the sink) stays buffered.

use crate::config::DEFAULT_MAX_BUFFERED_BYTES;
use crate::error::RewritingError;
use crate::html::{self, TextMode};
use input::{MatchResult, is_html_whitespace, is_tag_name_stop};
use states::{DoctypeIdKind, TokenizerState};
use std::collections::HashSet;

#[cfg(test)]
pub(crate) mod fmt;
mod input;
mod states;
mod token;

pub use token::{AttributeOutline, Lexeme, Span, TokenOutline};

/// Tags with more attributes than this check duplicates through a set.
const LINEAR_DUPLICATE_SCAN: usize = 8;

/// Receiver of tokenizer output.
pub trait TokenSink {
    /// A completed token. Text lexemes delivered here always end their text
    /// node (`last_in_text_node == true`).
    fn handle_lexeme(&mut self, lexeme: &Lexeme<'_>) -> Result<(), RewritingError>;

    /// Part of a text run that is still open at the end of a `feed`. Returns
    /// how many leading bytes were consumed; the rest is offered again later.
    fn handle_text_chunk(&mut self, lexeme: &Lexeme<'_>) -> Result<usize, RewritingError>;
}

/// Configuration for the tokenizer.
#[derive(Clone, Debug)]
pub struct TokenizerConfig {
    /// Upper bound for bytes retained between feeds.
    pub max_buffered_bytes: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            max_buffered_bytes: DEFAULT_MAX_BUFFERED_BYTES,
        }
    }
}

/// Minimal tokenizer instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub steps: u64,
    pub state_transitions: u64,
    pub lexemes_emitted: u64,
    pub text_chunks_emitted: u64,
    pub peak_buffered_bytes: usize,
}

#[derive(Debug, Default)]
struct TagBuilder {
    is_end: bool,
    name_start: usize,
    name: Span,
    attrs: Vec<AttributeOutline>,
    /// Lowercase names of `attrs`, filled once a tag has more than
    /// `LINEAR_DUPLICATE_SCAN` attributes.
    seen_names: HashSet<Vec<u8>>,
    attr_name_start: usize,
    attr_name: Span,
    attr_value_start: usize,
    self_closing: bool,
}

#[derive(Debug, Default)]
struct DoctypeBuilder {
    name_start: usize,
    name: Option<Span>,
    id_start: usize,
    public_id: Option<Span>,
    system_id: Option<Span>,
    force_quirks: bool,
}

/// Resumable HTML tokenizer.
pub struct Tokenizer {
    config: TokenizerConfig,
    state: TokenizerState,
    buffer: Vec<u8>,
    base: usize,
    cursor: usize,
    /// Start of the text run not yet handed to the sink.
    text_start: Option<usize>,
    /// Part of the current text run was already delivered as a chunk.
    text_chunk_emitted: bool,
    /// Position of the `<` opening the markup in progress.
    markup_start: Option<usize>,
    tag: TagBuilder,
    comment_text_start: usize,
    doctype: DoctypeBuilder,
    finished: bool,
    stats: TokenizerStats,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            config,
            state: TokenizerState::Data,
            buffer: Vec::new(),
            base: 0,
            cursor: 0,
            text_start: None,
            text_chunk_emitted: false,
            markup_start: None,
            tag: TagBuilder::default(),
            comment_text_start: 0,
            doctype: DoctypeBuilder::default(),
            finished: false,
            stats: TokenizerStats::default(),
        }
    }

    /// Append `chunk` and tokenize as far as the available bytes allow.
    ///
    /// Every token completed by this chunk is delivered to `sink` before
    /// `feed` returns; an open text run is offered through
    /// `TokenSink::handle_text_chunk`.
    pub fn feed<S: TokenSink>(&mut self, chunk: &[u8], sink: &mut S) -> Result<(), RewritingError> {
        assert!(
            !self.finished,
            "Tokenizer::feed called after end(); this violates end-of-stream contract"
        );
        self.buffer.try_reserve(chunk.len())?;
        self.buffer.extend_from_slice(chunk);

        self.run(sink)?;
        self.flush_text_chunk(sink)?;
        self.compact();

        self.stats.peak_buffered_bytes = self.stats.peak_buffered_bytes.max(self.buffer.len());
        if self.buffer.len() > self.config.max_buffered_bytes {
            return Err(RewritingError::AllocationFailure(format!(
                "tokenizer retains {} bytes of unfinished markup (limit {})",
                self.buffer.len(),
                self.config.max_buffered_bytes
            )));
        }
        Ok(())
    }

    /// Mark end of input: flush the final text run and emit `Eof`.
    ///
    /// Fails with `UnexpectedEndOfInput` if the stream ends inside a tag,
    /// comment or doctype. A dangling `<` or `</` is text.
    pub fn end<S: TokenSink>(&mut self, sink: &mut S) -> Result<(), RewritingError> {
        assert!(
            !self.finished,
            "Tokenizer::end called twice; this violates end-of-stream contract"
        );
        self.finished = true;
        if let Some(construct) = self.state.truncated_construct() {
            #[cfg(any(test, feature = "debug-stats"))]
            log::trace!(
                target: "rewriter.tokenizer",
                "end of input in state {:?} @{}",
                self.state,
                self.cursor
            );
            return Err(RewritingError::UnexpectedEndOfInput(construct));
        }

        if let Some(markup_start) = self.markup_start.take() {
            self.start_text_at(markup_start);
        }
        let end = self.buffered_end();
        if self.cursor < end {
            self.start_text_at(self.cursor);
        }
        self.cursor = end;
        self.flush_text(end, sink)?;
        self.emit(&TokenOutline::Eof, Span::empty_at(end), sink)
    }

    /// Return a copy of current instrumentation counters.
    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    fn run<S: TokenSink>(&mut self, sink: &mut S) -> Result<(), RewritingError> {
        loop {
            self.stats.steps = self.stats.steps.saturating_add(1);
            match self.step(sink)? {
                Step::Progress => {}
                Step::NeedMoreInput => return Ok(()),
            }
        }
    }

    fn transition_to(&mut self, next: TokenizerState) {
        if self.state == next {
            return;
        }
        #[cfg(any(test, feature = "debug-stats"))]
        {
            log::trace!(
                target: "rewriter.tokenizer",
                "state {:?} -> {:?} @{}",
                self.state,
                next,
                self.cursor
            );
        }
        self.state = next;
        self.stats.state_transitions = self.stats.state_transitions.saturating_add(1);
    }

    fn step<S: TokenSink>(&mut self, sink: &mut S) -> Result<Step, RewritingError> {
        match self.state {
            TokenizerState::Data => Ok(self.step_data()),
            TokenizerState::RawText(end_name) => self.step_raw_text(end_name, sink),
            TokenizerState::PlainText => Ok(self.step_plain_text()),
            TokenizerState::TagOpen => self.step_tag_open(sink),
            TokenizerState::EndTagOpen => self.step_end_tag_open(sink),
            TokenizerState::TagName => self.step_tag_name(sink),
            TokenizerState::BeforeAttributeName => self.step_before_attribute_name(sink),
            TokenizerState::AttributeName => self.step_attribute_name(sink),
            TokenizerState::AfterAttributeName => self.step_after_attribute_name(sink),
            TokenizerState::BeforeAttributeValue => self.step_before_attribute_value(sink),
            TokenizerState::AttributeValueDoubleQuoted => Ok(self.step_attribute_value_quoted(b'"')),
            TokenizerState::AttributeValueSingleQuoted => {
                Ok(self.step_attribute_value_quoted(b'\''))
            }
            TokenizerState::AttributeValueUnquoted => self.step_attribute_value_unquoted(sink),
            TokenizerState::AfterAttributeValueQuoted => {
                self.step_after_attribute_value_quoted(sink)
            }
            TokenizerState::SelfClosingStartTag => self.step_self_closing_start_tag(sink),
            TokenizerState::MarkupDeclarationOpen => Ok(self.step_markup_declaration_open()),
            TokenizerState::CommentStart => self.step_comment_start(sink),
            TokenizerState::CommentStartDash => self.step_comment_start_dash(sink),
            TokenizerState::Comment => Ok(self.step_comment()),
            TokenizerState::CommentEndDash => Ok(self.step_comment_end_dash()),
            TokenizerState::CommentEnd => self.step_comment_end(sink),
            TokenizerState::CommentEndBang => self.step_comment_end_bang(sink),
            TokenizerState::BogusComment => self.step_bogus_comment(sink),
            TokenizerState::Doctype => self.step_doctype(sink),
            TokenizerState::BeforeDoctypeName => self.step_before_doctype_name(sink),
            TokenizerState::DoctypeName => self.step_doctype_name(sink),
            TokenizerState::AfterDoctypeName => self.step_after_doctype_name(sink),
            TokenizerState::AfterDoctypeKeyword(kind) => self.step_after_doctype_keyword(kind, sink),
            TokenizerState::DoctypeIdentifier(kind, quote) => {
                self.step_doctype_identifier(kind, quote, sink)
            }
            TokenizerState::AfterDoctypeIdentifier(kind) => {
                self.step_after_doctype_identifier(kind, sink)
            }
            TokenizerState::BogusDoctype => self.step_bogus_doctype(sink),
        }
    }

    fn step_data(&mut self) -> Step {
        if !self.has_unconsumed_input() {
            return Step::NeedMoreInput;
        }
        match memchr::memchr(b'<', self.remaining()) {
            Some(pos) => {
                if pos > 0 {
                    self.start_text_at(self.cursor);
                    self.advance(pos);
                }
                self.markup_start = Some(self.cursor);
                self.advance(1);
                self.transition_to(TokenizerState::TagOpen);
                Step::Progress
            }
            None => {
                self.start_text_at(self.cursor);
                self.cursor = self.buffered_end();
                Step::NeedMoreInput
            }
        }
    }

    fn step_raw_text<S: TokenSink>(
        &mut self,
        end_name: &'static [u8],
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        if !self.has_unconsumed_input() {
            return Ok(Step::NeedMoreInput);
        }
        let Some(pos) = memchr::memchr(b'<', self.remaining()) else {
            self.start_text_at(self.cursor);
            self.cursor = self.buffered_end();
            return Ok(Step::NeedMoreInput);
        };
        if pos > 0 {
            self.start_text_at(self.cursor);
            self.advance(pos);
        }
        match self.match_raw_text_end(end_name) {
            MatchResult::Matched => {
                self.markup_start = Some(self.cursor);
                self.confirm_markup(sink)?;
                self.advance(2);
                self.begin_tag(true);
                self.transition_to(TokenizerState::TagName);
                Ok(Step::Progress)
            }
            // The cursor stays on `<` so the candidate end tag is rescanned.
            MatchResult::NeedMoreInput => Ok(Step::NeedMoreInput),
            MatchResult::NoMatch => {
                self.start_text_at(self.cursor);
                self.advance(1);
                Ok(Step::Progress)
            }
        }
    }

    fn step_plain_text(&mut self) -> Step {
        if self.has_unconsumed_input() {
            self.start_text_at(self.cursor);
            self.cursor = self.buffered_end();
        }
        Step::NeedMoreInput
    }

    fn step_tag_open<S: TokenSink>(&mut self, sink: &mut S) -> Result<Step, RewritingError> {
        debug_assert_eq!(self.state, TokenizerState::TagOpen);
        let Some(b) = self.peek() else {
            return Ok(Step::NeedMoreInput);
        };
        match b {
            b if b.is_ascii_alphabetic() => {
                self.confirm_markup(sink)?;
                self.begin_tag(false);
                self.transition_to(TokenizerState::TagName);
            }
            b'/' => {
                self.advance(1);
                self.transition_to(TokenizerState::EndTagOpen);
            }
            b'!' => {
                self.confirm_markup(sink)?;
                self.advance(1);
                self.transition_to(TokenizerState::MarkupDeclarationOpen);
            }
            b'?' => {
                // `<?xml ...>` is a bogus comment whose text starts at `?`.
                self.confirm_markup(sink)?;
                self.comment_text_start = self.cursor;
                self.transition_to(TokenizerState::BogusComment);
            }
            _ => {
                self.markup_as_text();
                self.transition_to(TokenizerState::Data);
            }
        }
        Ok(Step::Progress)
    }

    fn step_end_tag_open<S: TokenSink>(&mut self, sink: &mut S) -> Result<Step, RewritingError> {
        debug_assert_eq!(self.state, TokenizerState::EndTagOpen);
        let Some(b) = self.peek() else {
            return Ok(Step::NeedMoreInput);
        };
        match b {
            b if b.is_ascii_alphabetic() => {
                self.confirm_markup(sink)?;
                self.begin_tag(true);
                self.transition_to(TokenizerState::TagName);
            }
            b'>' => {
                // `</>` produces no token; keep its bytes as text.
                self.advance(1);
                self.markup_as_text();
                self.transition_to(TokenizerState::Data);
            }
            _ => {
                self.confirm_markup(sink)?;
                self.comment_text_start = self.cursor;
                self.transition_to(TokenizerState::BogusComment);
            }
        }
        Ok(Step::Progress)
    }

    fn step_tag_name<S: TokenSink>(&mut self, sink: &mut S) -> Result<Step, RewritingError> {
        let Some(stop) = self.consume_until(is_tag_name_stop) else {
            return Ok(Step::NeedMoreInput);
        };
        self.tag.name = Span::new(self.tag.name_start, self.cursor);
        self.advance(1);
        match stop {
            b'>' => self.emit_tag(sink)?,
            b'/' => self.transition_to(TokenizerState::SelfClosingStartTag),
            _ => self.transition_to(TokenizerState::BeforeAttributeName),
        }
        Ok(Step::Progress)
    }

    fn step_before_attribute_name<S: TokenSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        if !self.skip_whitespace() {
            return Ok(Step::NeedMoreInput);
        }
        match self.peek() {
            Some(b'/') => {
                self.advance(1);
                self.transition_to(TokenizerState::SelfClosingStartTag);
            }
            Some(b'>') => {
                self.advance(1);
                self.emit_tag(sink)?;
            }
            Some(_) => self.begin_attribute(),
            None => return Ok(Step::NeedMoreInput),
        }
        Ok(Step::Progress)
    }

    fn step_attribute_name<S: TokenSink>(&mut self, sink: &mut S) -> Result<Step, RewritingError> {
        let Some(stop) = self.consume_until(|b| is_tag_name_stop(b) || b == b'=') else {
            return Ok(Step::NeedMoreInput);
        };
        self.tag.attr_name = Span::new(self.tag.attr_name_start, self.cursor);
        match stop {
            b'=' => {
                self.advance(1);
                self.transition_to(TokenizerState::BeforeAttributeValue);
            }
            b'/' => {
                self.finish_attribute_without_value();
                self.advance(1);
                self.transition_to(TokenizerState::SelfClosingStartTag);
            }
            b'>' => {
                self.finish_attribute_without_value();
                self.advance(1);
                self.emit_tag(sink)?;
            }
            _ => {
                self.advance(1);
                self.transition_to(TokenizerState::AfterAttributeName);
            }
        }
        Ok(Step::Progress)
    }

    fn step_after_attribute_name<S: TokenSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        if !self.skip_whitespace() {
            return Ok(Step::NeedMoreInput);
        }
        match self.peek() {
            Some(b'=') => {
                self.advance(1);
                self.transition_to(TokenizerState::BeforeAttributeValue);
            }
            Some(b'/') => {
                self.finish_attribute_without_value();
                self.advance(1);
                self.transition_to(TokenizerState::SelfClosingStartTag);
            }
            Some(b'>') => {
                self.finish_attribute_without_value();
                self.advance(1);
                self.emit_tag(sink)?;
            }
            Some(_) => {
                self.finish_attribute_without_value();
                self.begin_attribute();
            }
            None => return Ok(Step::NeedMoreInput),
        }
        Ok(Step::Progress)
    }

    fn step_before_attribute_value<S: TokenSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        if !self.skip_whitespace() {
            return Ok(Step::NeedMoreInput);
        }
        match self.peek() {
            Some(b'"') => {
                self.advance(1);
                self.tag.attr_value_start = self.cursor;
                self.transition_to(TokenizerState::AttributeValueDoubleQuoted);
            }
            Some(b'\'') => {
                self.advance(1);
                self.tag.attr_value_start = self.cursor;
                self.transition_to(TokenizerState::AttributeValueSingleQuoted);
            }
            Some(b'>') => {
                // `name=` with the value missing.
                self.finish_attribute_without_value();
                self.advance(1);
                self.emit_tag(sink)?;
            }
            Some(_) => {
                self.tag.attr_value_start = self.cursor;
                self.transition_to(TokenizerState::AttributeValueUnquoted);
            }
            None => return Ok(Step::NeedMoreInput),
        }
        Ok(Step::Progress)
    }

    fn step_attribute_value_quoted(&mut self, quote: u8) -> Step {
        let Some(pos) = memchr::memchr(quote, self.remaining()) else {
            self.cursor = self.buffered_end();
            return Step::NeedMoreInput;
        };
        self.advance(pos);
        let value = Span::new(self.tag.attr_value_start, self.cursor);
        self.advance(1);
        self.finish_attribute(value, self.cursor);
        self.transition_to(TokenizerState::AfterAttributeValueQuoted);
        Step::Progress
    }

    fn step_attribute_value_unquoted<S: TokenSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        let Some(stop) = self.consume_until(|b| is_html_whitespace(b) || b == b'>') else {
            return Ok(Step::NeedMoreInput);
        };
        let value = Span::new(self.tag.attr_value_start, self.cursor);
        self.finish_attribute(value, self.cursor);
        self.advance(1);
        if stop == b'>' {
            self.emit_tag(sink)?;
        } else {
            self.transition_to(TokenizerState::BeforeAttributeName);
        }
        Ok(Step::Progress)
    }

    fn step_after_attribute_value_quoted<S: TokenSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        match self.peek() {
            None => return Ok(Step::NeedMoreInput),
            Some(b'/') => {
                self.advance(1);
                self.transition_to(TokenizerState::SelfClosingStartTag);
            }
            Some(b'>') => {
                self.advance(1);
                self.emit_tag(sink)?;
            }
            Some(b) if is_html_whitespace(b) => {
                self.advance(1);
                self.transition_to(TokenizerState::BeforeAttributeName);
            }
            // Recovery: missing whitespace between attributes.
            Some(_) => self.transition_to(TokenizerState::BeforeAttributeName),
        }
        Ok(Step::Progress)
    }

    fn step_self_closing_start_tag<S: TokenSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        match self.peek() {
            None => return Ok(Step::NeedMoreInput),
            Some(b'>') => {
                self.tag.self_closing = true;
                self.advance(1);
                self.emit_tag(sink)?;
            }
            // Recovery: a stray `/` inside the tag is ignored.
            Some(_) => self.transition_to(TokenizerState::BeforeAttributeName),
        }
        Ok(Step::Progress)
    }

    fn step_markup_declaration_open(&mut self) -> Step {
        // We enter this state after consuming "<!", so cursor is at declaration body.
        match self.match_ascii_prefix(b"--") {
            MatchResult::Matched => {
                self.advance(2);
                self.comment_text_start = self.cursor;
                self.transition_to(TokenizerState::CommentStart);
                return Step::Progress;
            }
            MatchResult::NeedMoreInput => return Step::NeedMoreInput,
            MatchResult::NoMatch => {}
        }
        match self.match_ascii_prefix_ci(b"DOCTYPE") {
            MatchResult::Matched => {
                self.advance(b"DOCTYPE".len());
                self.doctype = DoctypeBuilder::default();
                self.transition_to(TokenizerState::Doctype);
                Step::Progress
            }
            MatchResult::NeedMoreInput => Step::NeedMoreInput,
            MatchResult::NoMatch => {
                // Also covers `<![CDATA[`, which is only meaningful in foreign content.
                self.comment_text_start = self.cursor;
                self.transition_to(TokenizerState::BogusComment);
                Step::Progress
            }
        }
    }

    fn step_comment_start<S: TokenSink>(&mut self, sink: &mut S) -> Result<Step, RewritingError> {
        match self.peek() {
            None => return Ok(Step::NeedMoreInput),
            Some(b'-') => {
                self.advance(1);
                self.transition_to(TokenizerState::CommentStartDash);
            }
            Some(b'>') => {
                // `<!-->`
                self.advance(1);
                self.emit_comment(self.comment_text_start, sink)?;
            }
            Some(_) => self.transition_to(TokenizerState::Comment),
        }
        Ok(Step::Progress)
    }

    fn step_comment_start_dash<S: TokenSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        match self.peek() {
            None => return Ok(Step::NeedMoreInput),
            Some(b'-') => {
                self.advance(1);
                self.transition_to(TokenizerState::CommentEnd);
            }
            Some(b'>') => {
                // `<!--->`
                self.advance(1);
                self.emit_comment(self.comment_text_start, sink)?;
            }
            Some(_) => self.transition_to(TokenizerState::Comment),
        }
        Ok(Step::Progress)
    }

    fn step_comment(&mut self) -> Step {
        match memchr::memchr(b'-', self.remaining()) {
            Some(pos) => {
                self.advance(pos + 1);
                self.transition_to(TokenizerState::CommentEndDash);
                Step::Progress
            }
            None => {
                self.cursor = self.buffered_end();
                Step::NeedMoreInput
            }
        }
    }

    fn step_comment_end_dash(&mut self) -> Step {
        match self.peek() {
            None => return Step::NeedMoreInput,
            Some(b'-') => {
                self.advance(1);
                self.transition_to(TokenizerState::CommentEnd);
            }
            Some(_) => self.transition_to(TokenizerState::Comment),
        }
        Step::Progress
    }

    fn step_comment_end<S: TokenSink>(&mut self, sink: &mut S) -> Result<Step, RewritingError> {
        match self.peek() {
            None => return Ok(Step::NeedMoreInput),
            Some(b'>') => {
                let text_end = self.cursor - 2;
                self.advance(1);
                self.emit_comment(text_end, sink)?;
            }
            Some(b'!') => {
                self.advance(1);
                self.transition_to(TokenizerState::CommentEndBang);
            }
            // `--` run keeps growing; the extra dash belongs to the text.
            Some(b'-') => self.advance(1),
            Some(_) => self.transition_to(TokenizerState::Comment),
        }
        Ok(Step::Progress)
    }

    fn step_comment_end_bang<S: TokenSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        match self.peek() {
            None => return Ok(Step::NeedMoreInput),
            Some(b'>') => {
                let text_end = self.cursor - 3;
                self.advance(1);
                self.emit_comment(text_end, sink)?;
            }
            Some(b'-') => {
                self.advance(1);
                self.transition_to(TokenizerState::CommentEndDash);
            }
            Some(_) => self.transition_to(TokenizerState::Comment),
        }
        Ok(Step::Progress)
    }

    fn step_bogus_comment<S: TokenSink>(&mut self, sink: &mut S) -> Result<Step, RewritingError> {
        let Some(pos) = memchr::memchr(b'>', self.remaining()) else {
            self.cursor = self.buffered_end();
            return Ok(Step::NeedMoreInput);
        };
        self.advance(pos);
        let text_end = self.cursor;
        self.advance(1);
        self.emit_comment(text_end, sink)?;
        Ok(Step::Progress)
    }

    fn step_doctype<S: TokenSink>(&mut self, sink: &mut S) -> Result<Step, RewritingError> {
        match self.peek() {
            None => return Ok(Step::NeedMoreInput),
            Some(b) if is_html_whitespace(b) => {
                self.advance(1);
                self.transition_to(TokenizerState::BeforeDoctypeName);
            }
            Some(b'>') => {
                self.doctype.force_quirks = true;
                self.advance(1);
                self.emit_doctype(sink)?;
            }
            Some(_) => self.transition_to(TokenizerState::BeforeDoctypeName),
        }
        Ok(Step::Progress)
    }

    fn step_before_doctype_name<S: TokenSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        if !self.skip_whitespace() {
            return Ok(Step::NeedMoreInput);
        }
        if self.peek() == Some(b'>') {
            self.doctype.force_quirks = true;
            self.advance(1);
            self.emit_doctype(sink)?;
        } else {
            self.doctype.name_start = self.cursor;
            self.advance(1);
            self.transition_to(TokenizerState::DoctypeName);
        }
        Ok(Step::Progress)
    }

    fn step_doctype_name<S: TokenSink>(&mut self, sink: &mut S) -> Result<Step, RewritingError> {
        let Some(stop) = self.consume_until(|b| is_html_whitespace(b) || b == b'>') else {
            return Ok(Step::NeedMoreInput);
        };
        self.doctype.name = Some(Span::new(self.doctype.name_start, self.cursor));
        self.advance(1);
        if stop == b'>' {
            self.emit_doctype(sink)?;
        } else {
            self.transition_to(TokenizerState::AfterDoctypeName);
        }
        Ok(Step::Progress)
    }

    fn step_after_doctype_name<S: TokenSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        if !self.skip_whitespace() {
            return Ok(Step::NeedMoreInput);
        }
        if self.peek() == Some(b'>') {
            self.advance(1);
            self.emit_doctype(sink)?;
            return Ok(Step::Progress);
        }
        let public = self.match_ascii_prefix_ci(b"PUBLIC");
        let system = self.match_ascii_prefix_ci(b"SYSTEM");
        match (public, system) {
            (MatchResult::Matched, _) => {
                self.advance(b"PUBLIC".len());
                self.transition_to(TokenizerState::AfterDoctypeKeyword(DoctypeIdKind::Public));
            }
            (_, MatchResult::Matched) => {
                self.advance(b"SYSTEM".len());
                self.transition_to(TokenizerState::AfterDoctypeKeyword(DoctypeIdKind::System));
            }
            (MatchResult::NeedMoreInput, _) | (_, MatchResult::NeedMoreInput) => {
                return Ok(Step::NeedMoreInput);
            }
            _ => {
                self.doctype.force_quirks = true;
                self.transition_to(TokenizerState::BogusDoctype);
            }
        }
        Ok(Step::Progress)
    }

    fn step_after_doctype_keyword<S: TokenSink>(
        &mut self,
        kind: DoctypeIdKind,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        if !self.skip_whitespace() {
            return Ok(Step::NeedMoreInput);
        }
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.advance(1);
                self.doctype.id_start = self.cursor;
                self.transition_to(TokenizerState::DoctypeIdentifier(kind, quote));
            }
            Some(b'>') => {
                self.doctype.force_quirks = true;
                self.advance(1);
                self.emit_doctype(sink)?;
            }
            Some(_) => {
                self.doctype.force_quirks = true;
                self.transition_to(TokenizerState::BogusDoctype);
            }
            None => return Ok(Step::NeedMoreInput),
        }
        Ok(Step::Progress)
    }

    fn step_doctype_identifier<S: TokenSink>(
        &mut self,
        kind: DoctypeIdKind,
        quote: u8,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        let Some(stop) = self.consume_until(|b| b == quote || b == b'>') else {
            return Ok(Step::NeedMoreInput);
        };
        let id = Some(Span::new(self.doctype.id_start, self.cursor));
        match kind {
            DoctypeIdKind::Public => self.doctype.public_id = id,
            DoctypeIdKind::System => self.doctype.system_id = id,
        }
        self.advance(1);
        if stop == quote {
            self.transition_to(TokenizerState::AfterDoctypeIdentifier(kind));
        } else {
            self.doctype.force_quirks = true;
            self.emit_doctype(sink)?;
        }
        Ok(Step::Progress)
    }

    fn step_after_doctype_identifier<S: TokenSink>(
        &mut self,
        kind: DoctypeIdKind,
        sink: &mut S,
    ) -> Result<Step, RewritingError> {
        if !self.skip_whitespace() {
            return Ok(Step::NeedMoreInput);
        }
        match self.peek() {
            Some(b'>') => {
                self.advance(1);
                self.emit_doctype(sink)?;
            }
            Some(quote @ (b'"' | b'\'')) if kind == DoctypeIdKind::Public => {
                self.advance(1);
                self.doctype.id_start = self.cursor;
                self.transition_to(TokenizerState::DoctypeIdentifier(
                    DoctypeIdKind::System,
                    quote,
                ));
            }
            Some(_) => self.transition_to(TokenizerState::BogusDoctype),
            None => return Ok(Step::NeedMoreInput),
        }
        Ok(Step::Progress)
    }

    fn step_bogus_doctype<S: TokenSink>(&mut self, sink: &mut S) -> Result<Step, RewritingError> {
        let Some(pos) = memchr::memchr(b'>', self.remaining()) else {
            self.cursor = self.buffered_end();
            return Ok(Step::NeedMoreInput);
        };
        self.advance(pos + 1);
        self.emit_doctype(sink)?;
        Ok(Step::Progress)
    }

    fn start_text_at(&mut self, pos: usize) {
        if self.text_start.is_none() {
            self.text_start = Some(pos);
        }
    }

    /// The pending `<` turned out not to open markup.
    fn markup_as_text(&mut self) {
        if let Some(start) = self.markup_start.take() {
            self.start_text_at(start);
        }
    }

    /// The pending `<` opens markup: the text run before it is complete.
    fn confirm_markup<S: TokenSink>(&mut self, sink: &mut S) -> Result<(), RewritingError> {
        let end = self.markup_start.unwrap_or(self.cursor);
        self.flush_text(end, sink)
    }

    fn begin_tag(&mut self, is_end: bool) {
        self.tag.is_end = is_end;
        self.tag.name_start = self.cursor;
        self.tag.attrs.clear();
        self.tag.seen_names.clear();
        self.tag.self_closing = false;
    }

    fn begin_attribute(&mut self) {
        self.tag.attr_name_start = self.cursor;
        // The first byte is part of the name even if it is `=`.
        self.advance(1);
        self.transition_to(TokenizerState::AttributeName);
    }

    fn finish_attribute_without_value(&mut self) {
        let name_end = self.tag.attr_name.end;
        self.finish_attribute(Span::empty_at(name_end), name_end);
    }

    fn finish_attribute(&mut self, value: Span, raw_end: usize) {
        if self.tag.is_end {
            return;
        }
        let name = self.tag.attr_name;
        let name_bytes = self.bytes(name.start, name.end);
        let duplicate = if self.tag.attrs.len() < LINEAR_DUPLICATE_SCAN {
            self.tag.attrs.iter().any(|attr| {
                self.bytes(attr.name.start, attr.name.end)
                    .eq_ignore_ascii_case(name_bytes)
            })
        } else {
            let lowered = name_bytes.to_ascii_lowercase();
            if self.tag.seen_names.is_empty() {
                let earlier: Vec<Vec<u8>> = self
                    .tag
                    .attrs
                    .iter()
                    .map(|attr| self.bytes(attr.name.start, attr.name.end).to_ascii_lowercase())
                    .collect();
                self.tag.seen_names.extend(earlier);
            }
            !self.tag.seen_names.insert(lowered)
        };
        if duplicate {
            #[cfg(any(test, feature = "debug-stats"))]
            log::trace!(target: "rewriter.tokenizer", "dropping duplicate attribute @{}", name.start);
            return;
        }
        self.tag.attrs.push(AttributeOutline {
            name,
            value,
            raw: Span::new(name.start, raw_end),
        });
    }

    fn emit_tag<S: TokenSink>(&mut self, sink: &mut S) -> Result<(), RewritingError> {
        let raw = Span::new(self.take_markup_start(), self.cursor);
        let name = self.tag.name;
        let outline = if self.tag.is_end {
            TokenOutline::EndTag { name }
        } else {
            TokenOutline::StartTag {
                name,
                attrs: std::mem::take(&mut self.tag.attrs),
                self_closing: self.tag.self_closing,
            }
        };
        self.emit(&outline, raw, sink)?;

        let next = if self.tag.is_end || self.tag.self_closing {
            TokenizerState::Data
        } else {
            match html::text_mode_for(self.bytes(name.start, name.end)) {
                Some(TextMode::RawText(end_name)) => TokenizerState::RawText(end_name),
                Some(TextMode::PlainText) => TokenizerState::PlainText,
                None => TokenizerState::Data,
            }
        };
        if let TokenOutline::StartTag { mut attrs, .. } = outline {
            attrs.clear();
            self.tag.attrs = attrs;
        }
        self.transition_to(next);
        Ok(())
    }

    fn emit_comment<S: TokenSink>(
        &mut self,
        text_end: usize,
        sink: &mut S,
    ) -> Result<(), RewritingError> {
        let raw = Span::new(self.take_markup_start(), self.cursor);
        let text = Span::new(self.comment_text_start, text_end.max(self.comment_text_start));
        self.emit(&TokenOutline::Comment { text }, raw, sink)?;
        self.transition_to(TokenizerState::Data);
        Ok(())
    }

    fn emit_doctype<S: TokenSink>(&mut self, sink: &mut S) -> Result<(), RewritingError> {
        let raw = Span::new(self.take_markup_start(), self.cursor);
        let doctype = std::mem::take(&mut self.doctype);
        let outline = TokenOutline::Doctype {
            name: doctype.name,
            public_id: doctype.public_id,
            system_id: doctype.system_id,
            force_quirks: doctype.force_quirks,
        };
        self.emit(&outline, raw, sink)?;
        self.transition_to(TokenizerState::Data);
        Ok(())
    }

    fn take_markup_start(&mut self) -> usize {
        debug_assert!(self.markup_start.is_some(), "markup emitted without a start");
        self.markup_start.take().unwrap_or(self.cursor)
    }

    /// Deliver the text run ending at `end` as the last chunk of its node.
    fn flush_text<S: TokenSink>(&mut self, end: usize, sink: &mut S) -> Result<(), RewritingError> {
        let Some(start) = self.text_start.take() else {
            return Ok(());
        };
        let chunked = std::mem::take(&mut self.text_chunk_emitted);
        // A node already delivered in chunks still gets an empty last chunk.
        if start == end && !chunked {
            return Ok(());
        }
        self.stats.text_chunks_emitted = self.stats.text_chunks_emitted.saturating_add(1);
        let outline = TokenOutline::Text {
            last_in_text_node: true,
        };
        self.emit(&outline, Span::new(start, end), sink)
    }

    /// Offer the open text run to the sink at a feed boundary.
    fn flush_text_chunk<S: TokenSink>(&mut self, sink: &mut S) -> Result<(), RewritingError> {
        let Some(start) = self.text_start else {
            return Ok(());
        };
        let end = self.markup_start.unwrap_or(self.cursor);
        if end <= start {
            return Ok(());
        }
        let outline = TokenOutline::Text {
            last_in_text_node: false,
        };
        let lexeme = Lexeme::new(&self.buffer, self.base, &outline, Span::new(start, end));
        let consumed = sink.handle_text_chunk(&lexeme)?;
        debug_assert!(consumed <= end - start, "sink consumed more text than offered");
        if consumed > 0 {
            self.text_start = Some(start + consumed.min(end - start));
            self.text_chunk_emitted = true;
            self.stats.text_chunks_emitted = self.stats.text_chunks_emitted.saturating_add(1);
        }
        Ok(())
    }

    fn emit<S: TokenSink>(
        &mut self,
        token: &TokenOutline,
        raw: Span,
        sink: &mut S,
    ) -> Result<(), RewritingError> {
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "rewriter.tokenizer",
            "emit {token:?} @{}..{}",
            raw.start,
            raw.end
        );
        self.stats.lexemes_emitted = self.stats.lexemes_emitted.saturating_add(1);
        let lexeme = Lexeme::new(&self.buffer, self.base, token, raw);
        sink.handle_lexeme(&lexeme)
    }

    /// Drop consumed bytes, keeping the unfinished token and held-back text.
    fn compact(&mut self) {
        let keep_from = [self.text_start, self.markup_start]
            .into_iter()
            .flatten()
            .fold(self.cursor, usize::min);
        let consumed = keep_from - self.base;
        if consumed > 0 {
            self.buffer.drain(..consumed);
            self.base = keep_from;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Progress,
    NeedMoreInput,
}
