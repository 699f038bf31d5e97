use super::mutations::{Mutations, impl_mutations};
use crate::encoding::Charset;
use std::borrow::Cow;

/// A run of character data. One text node may arrive as several chunks; the
/// chunk with `last_in_text_node() == true` closes the node and may be empty.
pub struct TextChunk<'r> {
    text: Cow<'r, str>,
    last_in_text_node: bool,
    raw: &'r [u8],
    mutations: Mutations,
}

impl<'r> TextChunk<'r> {
    pub(crate) fn new(
        charset: Charset,
        text: Cow<'r, str>,
        raw: &'r [u8],
        last_in_text_node: bool,
    ) -> Self {
        Self {
            text,
            last_in_text_node,
            raw,
            mutations: Mutations::new(charset),
        }
    }

    /// Decoded text. Character references are not expanded.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn last_in_text_node(&self) -> bool {
        self.last_in_text_node
    }

    pub(crate) fn serialize(&self, out: &mut Vec<u8>) {
        self.mutations.serialize(self.raw, out);
    }
}

impl_mutations!(TextChunk);
