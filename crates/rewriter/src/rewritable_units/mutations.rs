use super::{ContentType, encode_content};
use crate::encoding::Charset;

/// What replaces the unit's own bytes in the output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum Body {
    #[default]
    Original,
    Replaced(Vec<u8>),
    Removed,
}

/// Insertions around a unit plus its body. Content is encoded into the
/// document encoding as soon as it is queued.
#[derive(Debug)]
pub(crate) struct Mutations {
    charset: Charset,
    pub(crate) before: Vec<u8>,
    pub(crate) after: Vec<u8>,
    pub(crate) body: Body,
}

impl Mutations {
    pub(crate) fn new(charset: Charset) -> Self {
        Self {
            charset,
            before: Vec::new(),
            after: Vec::new(),
            body: Body::Original,
        }
    }

    pub(crate) fn charset(&self) -> Charset {
        self.charset
    }

    pub(crate) fn before(&mut self, content: &str, content_type: ContentType) {
        encode_content(content, content_type, self.charset, &mut self.before);
    }

    pub(crate) fn after(&mut self, content: &str, content_type: ContentType) {
        encode_content(content, content_type, self.charset, &mut self.after);
    }

    pub(crate) fn replace(&mut self, content: &str, content_type: ContentType) {
        let mut replacement = Vec::new();
        encode_content(content, content_type, self.charset, &mut replacement);
        self.body = Body::Replaced(replacement);
    }

    pub(crate) fn remove(&mut self) {
        self.body = Body::Removed;
    }

    pub(crate) fn is_removed(&self) -> bool {
        self.body != Body::Original
    }

    /// `before + body + after`, with `original` standing in for an
    /// untouched body.
    pub(crate) fn serialize(&self, original: &[u8], out: &mut Vec<u8>) {
        out.extend_from_slice(&self.before);
        match &self.body {
            Body::Original => out.extend_from_slice(original),
            Body::Replaced(replacement) => out.extend_from_slice(replacement),
            Body::Removed => {}
        }
        out.extend_from_slice(&self.after);
    }
}

/// Adds the insertion and removal API shared by comments, text chunks and
/// doctypes.
macro_rules! impl_mutations {
    ($unit:ident) => {
        impl<'r> $unit<'r> {
            /// Insert `content` before the unit. Repeated calls keep call order.
            pub fn before(&mut self, content: &str, content_type: $crate::rewritable_units::ContentType) {
                self.mutations.before(content, content_type);
            }

            /// Insert `content` after the unit. Repeated calls keep call order.
            pub fn after(&mut self, content: &str, content_type: $crate::rewritable_units::ContentType) {
                self.mutations.after(content, content_type);
            }

            /// Replace the unit with `content`; overrides an earlier `remove`.
            pub fn replace(&mut self, content: &str, content_type: $crate::rewritable_units::ContentType) {
                self.mutations.replace(content, content_type);
            }

            /// Drop the unit; overrides an earlier `replace`. Content queued
            /// with `before` and `after` is still written.
            pub fn remove(&mut self) {
                self.mutations.remove();
            }

            pub fn is_removed(&self) -> bool {
                self.mutations.is_removed()
            }
        }
    };
}

pub(crate) use impl_mutations;
