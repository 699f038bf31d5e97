use super::mutations::{Mutations, impl_mutations};
use crate::encoding::Charset;
use crate::error::{RewritingError, TextContentError};

/// An HTML comment. Bogus comments (`<?x>`, `<!x>`, `</ x>`) are reported
/// as comments too.
pub struct Comment<'r> {
    text: String,
    raw: &'r [u8],
    text_changed: bool,
    mutations: Mutations,
}

impl<'r> Comment<'r> {
    pub(crate) fn new(charset: Charset, text: String, raw: &'r [u8]) -> Self {
        Self {
            text,
            raw,
            text_changed: false,
            mutations: Mutations::new(charset),
        }
    }

    /// Text between the comment delimiters.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the comment text. The comment is then written as
    /// `<!--text-->`.
    pub fn set_text(&mut self, text: &str) -> Result<(), RewritingError> {
        if text.contains("-->") || text.contains("--!>") {
            return Err(TextContentError::CommentTerminator.into());
        }
        self.text = text.to_string();
        self.text_changed = true;
        Ok(())
    }

    pub(crate) fn serialize(&self, out: &mut Vec<u8>) {
        if !self.text_changed {
            self.mutations.serialize(self.raw, out);
            return;
        }
        let mut body = b"<!--".to_vec();
        self.mutations.charset().encode_into(&self.text, &mut body);
        body.extend_from_slice(b"-->");
        self.mutations.serialize(&body, out);
    }
}

impl_mutations!(Comment);
