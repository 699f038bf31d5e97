//! Encoding adapter.
//!
//! The tokenizer scans markup delimiters directly in the byte stream, so only
//! ASCII-compatible encodings are accepted. Text is decoded lazily, when a
//! handler asks for it, and content supplied by handlers is encoded back into
//! the document encoding before it reaches the output.

use crate::error::RewritingError;
use encoding_rs::{Decoder, DecoderResult, UTF_8};
use std::borrow::Cow;

/// An incomplete multi-byte sequence is at most this many bytes long.
const MAX_INCOMPLETE_SEQUENCE_LEN: usize = 3;

const VALIDATION_SCRATCH_CAPACITY: usize = 4 * 1024;

/// ASCII-compatible document encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Charset(&'static encoding_rs::Encoding);

impl Charset {
    /// Resolve a WHATWG encoding label.
    pub fn for_label(label: &str) -> Result<Self, RewritingError> {
        let encoding = encoding_rs::Encoding::for_label(label.as_bytes()).ok_or_else(|| {
            RewritingError::UnknownEncoding {
                label: label.to_string(),
                reason: "unknown label",
            }
        })?;
        if !encoding.is_ascii_compatible() {
            return Err(RewritingError::UnknownEncoding {
                label: label.to_string(),
                reason: "encoding is not ASCII-compatible",
            });
        }
        Ok(Self(encoding))
    }

    pub fn utf8() -> Self {
        Self(UTF_8)
    }

    pub fn name(self) -> &'static str {
        self.0.name()
    }

    pub fn is_utf8(self) -> bool {
        self.0 == UTF_8
    }

    /// Decode a complete byte sequence. `offset` is the stream position of
    /// `bytes[0]` and is only used for error reporting.
    pub fn decode<'b>(self, bytes: &'b [u8], offset: usize) -> Result<Cow<'b, str>, RewritingError> {
        if self.is_utf8() {
            return std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|err| self.invalid_input(offset + err.valid_up_to()));
        }
        self.0
            .decode_without_bom_handling_and_without_replacement(bytes)
            .ok_or_else(|| self.invalid_input(offset))
    }

    /// Decode the longest prefix of `bytes` that ends on a character
    /// boundary. Returns the text and the number of bytes it covers; at most
    /// `MAX_INCOMPLETE_SEQUENCE_LEN` trailing bytes are left over.
    pub fn decode_complete_prefix<'b>(
        self,
        bytes: &'b [u8],
        offset: usize,
    ) -> Result<(Cow<'b, str>, usize), RewritingError> {
        if self.is_utf8() {
            return match std::str::from_utf8(bytes) {
                Ok(text) => Ok((Cow::Borrowed(text), bytes.len())),
                Err(err) if err.error_len().is_none() => {
                    let valid = err.valid_up_to();
                    let text = std::str::from_utf8(&bytes[..valid])
                        .map_err(|err| self.invalid_input(offset + err.valid_up_to()))?;
                    Ok((Cow::Borrowed(text), valid))
                }
                Err(err) => Err(self.invalid_input(offset + err.valid_up_to())),
            };
        }
        for held_back in 0..=MAX_INCOMPLETE_SEQUENCE_LEN.min(bytes.len()) {
            let end = bytes.len() - held_back;
            if let Some(text) = self
                .0
                .decode_without_bom_handling_and_without_replacement(&bytes[..end])
            {
                return Ok((text, end));
            }
        }
        Err(self.invalid_input(offset))
    }

    /// Append `text` encoded in the document encoding. Characters the
    /// encoding cannot represent become numeric character references.
    pub fn encode_into(self, text: &str, out: &mut Vec<u8>) {
        if self.is_utf8() || text.is_ascii() {
            out.extend_from_slice(text.as_bytes());
            return;
        }
        let (bytes, _, _) = self.0.encode(text);
        out.extend_from_slice(&bytes);
    }

    fn invalid_input(self, offset: usize) -> RewritingError {
        RewritingError::InvalidEncodedInput {
            encoding: self.name(),
            offset,
        }
    }
}

/// Streaming validator for the raw input.
///
/// Keeps one decoder across `write` calls so sequences split between chunks
/// are checked as a whole. Decoded text is discarded.
pub struct InputValidator {
    charset: Charset,
    decoder: Decoder,
    scratch: String,
    consumed: usize,
}

impl InputValidator {
    pub fn new(charset: Charset) -> Self {
        Self {
            charset,
            decoder: charset.0.new_decoder_without_bom_handling(),
            scratch: String::with_capacity(VALIDATION_SCRATCH_CAPACITY),
            consumed: 0,
        }
    }

    /// Validate the next chunk. With `last` set, an incomplete trailing
    /// sequence is reported as malformed.
    pub fn validate(&mut self, mut bytes: &[u8], last: bool) -> Result<(), RewritingError> {
        loop {
            self.scratch.clear();
            let (result, read) =
                self.decoder
                    .decode_to_string_without_replacement(bytes, &mut self.scratch, last);
            self.consumed += read;
            match result {
                DecoderResult::InputEmpty => return Ok(()),
                DecoderResult::OutputFull => bytes = &bytes[read..],
                DecoderResult::Malformed(bad, extra) => {
                    let offset = self
                        .consumed
                        .saturating_sub(usize::from(bad) + usize::from(extra));
                    return Err(self.charset.invalid_input(offset));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_labels_case_insensitively() {
        assert_eq!(Charset::for_label("UTF-8").unwrap().name(), "UTF-8");
        assert_eq!(Charset::for_label(" latin1 ").unwrap().name(), "windows-1252");
    }

    #[test]
    fn rejects_unknown_and_ascii_incompatible_labels() {
        assert!(matches!(
            Charset::for_label("klingon"),
            Err(RewritingError::UnknownEncoding { reason: "unknown label", .. })
        ));
        assert!(matches!(
            Charset::for_label("utf-16le"),
            Err(RewritingError::UnknownEncoding { .. })
        ));
    }

    #[test]
    fn complete_prefix_holds_back_split_utf8_sequence() {
        let charset = Charset::utf8();
        // "a€" with the last byte of the euro sign missing.
        let (text, consumed) = charset
            .decode_complete_prefix(&[b'a', 0xE2, 0x82], 0)
            .unwrap();
        assert_eq!(text, "a");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn complete_prefix_holds_back_split_legacy_sequence() {
        let charset = Charset::for_label("shift_jis").unwrap();
        // "aあ" is [0x61, 0x82, 0xA0]; drop the trail byte.
        let (text, consumed) = charset.decode_complete_prefix(&[0x61, 0x82], 0).unwrap();
        assert_eq!(text, "a");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn malformed_input_is_reported_with_offset() {
        let charset = Charset::utf8();
        let err = charset.decode(b"ab\xFFcd", 10).unwrap_err();
        assert!(matches!(
            err,
            RewritingError::InvalidEncodedInput { offset: 12, .. }
        ));
    }

    #[test]
    fn validator_accepts_sequences_split_across_chunks() {
        let mut validator = InputValidator::new(Charset::utf8());
        validator.validate(&[b'x', 0xF0, 0x9F], false).unwrap();
        validator.validate(&[0x98, 0x80], false).unwrap();
        validator.validate(&[], true).unwrap();
    }

    #[test]
    fn validator_rejects_truncated_tail_at_end() {
        let mut validator = InputValidator::new(Charset::utf8());
        validator.validate(&[b'x', 0xE2, 0x82], false).unwrap();
        assert!(validator.validate(&[], true).is_err());
    }

    #[test]
    fn encodes_unmappable_characters_as_references() {
        let charset = Charset::for_label("windows-1252").unwrap();
        let mut out = Vec::new();
        charset.encode_into("é☃", &mut out);
        assert_eq!(out, b"\xE9&#9731;");
    }
}
