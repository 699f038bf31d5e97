//! Element unit.
//!
//! An element is handed to handlers when its start tag completes. Output for
//! the start tag and the children region opening is written right after the
//! handlers return; everything that belongs at the end tag is captured in an
//! `EndTagPlan` stored on the open-element stack.

use super::attribute::{is_forbidden_in_name, validate_attribute_name};
use super::mutations::{Body, Mutations};
use super::{Attribute, ContentType, encode_content};
use crate::encoding::Charset;
use crate::error::{RewritingError, TextContentError};

/// What happens to the source end tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum EndTag {
    #[default]
    Keep,
    /// Encoded `</name>` written instead of the source end tag.
    Rename(Vec<u8>),
    Drop,
}

/// Output deferred to the element's end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct EndTagPlan {
    /// Output of the children region is discarded until the end tag.
    pub(crate) suppress_children: bool,
    pub(crate) end_tag: EndTag,
    pub(crate) append: Vec<u8>,
    pub(crate) after: Vec<u8>,
}

/// A start tag and the element it opens.
pub struct Element<'r> {
    raw: &'r [u8],
    tag_name: String,
    tag_name_changed: bool,
    attributes: Vec<Attribute<'r>>,
    attributes_changed: bool,
    self_closing: bool,
    can_have_content: bool,
    mutations: Mutations,
    keep_content_only: bool,
    prepend: Vec<u8>,
    append: Vec<u8>,
    inner_content: Option<Vec<u8>>,
}

impl<'r> Element<'r> {
    pub(crate) fn new(
        charset: Charset,
        raw: &'r [u8],
        tag_name: String,
        attributes: Vec<Attribute<'r>>,
        self_closing: bool,
        can_have_content: bool,
    ) -> Self {
        Self {
            raw,
            tag_name,
            tag_name_changed: false,
            attributes,
            attributes_changed: false,
            self_closing,
            can_have_content,
            mutations: Mutations::new(charset),
            keep_content_only: false,
            prepend: Vec::new(),
            append: Vec::new(),
            inner_content: None,
        }
    }

    /// Lowercase tag name, or the name last passed to `set_tag_name`.
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Rename the element. The end tag, if any, is renamed as well.
    pub fn set_tag_name(&mut self, name: &str) -> Result<(), RewritingError> {
        validate_tag_name(name)?;
        self.tag_name = name.to_string();
        self.tag_name_changed = true;
        Ok(())
    }

    /// Whether the start tag ended with `/>`.
    pub fn is_self_closing(&self) -> bool {
        self.self_closing
    }

    /// `false` for void and self-closing elements, which close immediately.
    pub fn can_have_content(&self) -> bool {
        self.can_have_content
    }

    /// Current attributes: source order, followed by attributes added through
    /// `set_attribute`. Edits made earlier in the same handler, or by an
    /// earlier handler, are visible.
    pub fn attributes(&self) -> std::slice::Iter<'_, Attribute<'r>> {
        self.attributes.iter()
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.find_attribute(name)
            .map(|index| self.attributes[index].value())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.find_attribute(name).is_some()
    }

    /// Overwrite the value in place, or append a new attribute.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), RewritingError> {
        validate_attribute_name(name)?;
        match self.find_attribute(name) {
            Some(index) => self.attributes[index].set_value(value),
            None => self.attributes.push(Attribute::new(name, value)),
        }
        self.attributes_changed = true;
        Ok(())
    }

    /// Remove an attribute by case-insensitive name; absent names are ignored.
    pub fn remove_attribute(&mut self, name: &str) {
        if let Some(index) = self.find_attribute(name) {
            self.attributes.remove(index);
            self.attributes_changed = true;
        }
    }

    pub fn before(&mut self, content: &str, content_type: ContentType) {
        self.mutations.before(content, content_type);
    }

    pub fn after(&mut self, content: &str, content_type: ContentType) {
        self.mutations.after(content, content_type);
    }

    /// Insert `content` right after the start tag. Ignored for elements
    /// that cannot have content.
    pub fn prepend(&mut self, content: &str, content_type: ContentType) {
        if self.can_have_content {
            encode_content(content, content_type, self.mutations.charset(), &mut self.prepend);
        }
    }

    /// Insert `content` right before the end tag. Ignored for elements that
    /// cannot have content.
    pub fn append(&mut self, content: &str, content_type: ContentType) {
        if self.can_have_content {
            encode_content(content, content_type, self.mutations.charset(), &mut self.append);
        }
    }

    /// Replace the element's children with `content`.
    pub fn set_inner_content(&mut self, content: &str, content_type: ContentType) {
        if self.can_have_content {
            let mut inner = Vec::new();
            encode_content(content, content_type, self.mutations.charset(), &mut inner);
            self.inner_content = Some(inner);
        }
    }

    /// Replace the whole element, children included, with `content`.
    pub fn replace(&mut self, content: &str, content_type: ContentType) {
        self.keep_content_only = false;
        self.mutations.replace(content, content_type);
    }

    /// Remove the whole element, children included.
    pub fn remove(&mut self) {
        self.keep_content_only = false;
        self.mutations.remove();
    }

    /// Remove the start and end tags but keep the children.
    pub fn remove_and_keep_content(&mut self) {
        self.mutations.body = Body::Original;
        self.keep_content_only = true;
    }

    pub fn is_removed(&self) -> bool {
        self.keep_content_only || self.mutations.is_removed()
    }

    fn find_attribute(&self, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|attr| attr.name().eq_ignore_ascii_case(name))
    }

    /// Write the output due at the start tag and return what is due at the
    /// end tag.
    pub(crate) fn finish(self, out: &mut Vec<u8>) -> EndTagPlan {
        out.extend_from_slice(&self.mutations.before);
        let after = self.mutations.after.clone();
        match &self.mutations.body {
            Body::Replaced(replacement) => {
                out.extend_from_slice(replacement);
                return EndTagPlan {
                    suppress_children: true,
                    end_tag: EndTag::Drop,
                    append: Vec::new(),
                    after,
                };
            }
            Body::Removed => {
                return EndTagPlan {
                    suppress_children: true,
                    end_tag: EndTag::Drop,
                    append: Vec::new(),
                    after,
                };
            }
            Body::Original => {}
        }

        if !self.keep_content_only {
            self.serialize_start_tag(out);
        }
        if !self.can_have_content {
            return EndTagPlan {
                after,
                ..EndTagPlan::default()
            };
        }

        out.extend_from_slice(&self.prepend);
        if let Some(inner) = &self.inner_content {
            out.extend_from_slice(inner);
        }
        let end_tag = if self.keep_content_only {
            EndTag::Drop
        } else if self.tag_name_changed {
            let charset = self.mutations.charset();
            let mut end_tag = b"</".to_vec();
            charset.encode_into(&self.tag_name, &mut end_tag);
            end_tag.push(b'>');
            EndTag::Rename(end_tag)
        } else {
            EndTag::Keep
        };
        EndTagPlan {
            suppress_children: self.inner_content.is_some(),
            end_tag,
            append: self.append,
            after,
        }
    }

    fn serialize_start_tag(&self, out: &mut Vec<u8>) {
        if !self.tag_name_changed && !self.attributes_changed {
            out.extend_from_slice(self.raw);
            return;
        }
        let charset = self.mutations.charset();
        out.push(b'<');
        charset.encode_into(&self.tag_name, out);
        for attr in &self.attributes {
            out.push(b' ');
            attr.serialize(charset, out);
        }
        if self.self_closing {
            out.extend_from_slice(b" /");
        }
        out.push(b'>');
    }
}

fn validate_tag_name(name: &str) -> Result<(), TextContentError> {
    let first = name.chars().next().ok_or(TextContentError::EmptyTagName)?;
    if !first.is_ascii_alphabetic() {
        return Err(TextContentError::InvalidTagNameStart(first));
    }
    match name.chars().find(|&ch| is_forbidden_in_name(ch)) {
        Some(ch) => Err(TextContentError::ForbiddenTagNameCharacter(ch)),
        None => Ok(()),
    }
}
