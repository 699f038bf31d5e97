//! Tokenizer input helpers.
//!
//! The cursor and every recorded offset are absolute stream positions;
//! `base` is the stream offset of `buffer[0]`.

use super::Tokenizer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum MatchResult {
    Matched,
    NeedMoreInput,
    NoMatch,
}

impl Tokenizer {
    pub(super) fn buffered_end(&self) -> usize {
        self.base + self.buffer.len()
    }

    pub(super) fn has_unconsumed_input(&self) -> bool {
        self.cursor < self.buffered_end()
    }

    pub(super) fn peek(&self) -> Option<u8> {
        self.buffer.get(self.cursor - self.base).copied()
    }

    pub(super) fn remaining(&self) -> &[u8] {
        &self.buffer[self.cursor - self.base..]
    }

    pub(super) fn advance(&mut self, by: usize) {
        debug_assert!(
            self.cursor + by <= self.buffered_end(),
            "advance moved cursor out of bounds"
        );
        self.cursor += by;
    }

    pub(super) fn bytes(&self, start: usize, end: usize) -> &[u8] {
        &self.buffer[start - self.base..end - self.base]
    }

    /// Skip ASCII whitespace; returns `false` when input ran out first.
    pub(super) fn skip_whitespace(&mut self) -> bool {
        let skipped = self
            .remaining()
            .iter()
            .take_while(|b| is_html_whitespace(**b))
            .count();
        self.advance(skipped);
        self.has_unconsumed_input()
    }

    /// Consume bytes until `stop` matches one; returns the stop byte if found.
    pub(super) fn consume_until(&mut self, stop: impl Fn(u8) -> bool) -> Option<u8> {
        match self.remaining().iter().position(|b| stop(*b)) {
            Some(pos) => {
                self.advance(pos);
                self.peek()
            }
            None => {
                self.cursor = self.buffered_end();
                None
            }
        }
    }

    pub(super) fn match_ascii_prefix(&self, seq: &[u8]) -> MatchResult {
        self.match_prefix_with(seq, |a, b| a == b)
    }

    pub(super) fn match_ascii_prefix_ci(&self, seq: &[u8]) -> MatchResult {
        self.match_prefix_with(seq, |a, b| a.eq_ignore_ascii_case(&b))
    }

    fn match_prefix_with(&self, seq: &[u8], eq: impl Fn(u8, u8) -> bool) -> MatchResult {
        let available = self.remaining();
        for (i, expected) in seq.iter().enumerate() {
            match available.get(i) {
                None => return MatchResult::NeedMoreInput,
                Some(actual) if eq(*actual, *expected) => {}
                Some(_) => return MatchResult::NoMatch,
            }
        }
        MatchResult::Matched
    }

    /// Match `</name` plus a terminator at the cursor, as required to leave
    /// a raw text element.
    pub(super) fn match_raw_text_end(&self, name: &[u8]) -> MatchResult {
        match self.match_ascii_prefix(b"</") {
            MatchResult::Matched => {}
            other => return other,
        }
        let available = &self.remaining()[2..];
        for (i, expected) in name.iter().enumerate() {
            match available.get(i) {
                None => return MatchResult::NeedMoreInput,
                Some(actual) if actual.eq_ignore_ascii_case(expected) => {}
                Some(_) => return MatchResult::NoMatch,
            }
        }
        match available.get(name.len()) {
            None => MatchResult::NeedMoreInput,
            Some(b) if is_tag_name_stop(*b) => MatchResult::Matched,
            Some(_) => MatchResult::NoMatch,
        }
    }
}

pub(super) fn is_html_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

pub(super) fn is_tag_name_stop(b: u8) -> bool {
    b == b'>' || b == b'/' || is_html_whitespace(b)
}
