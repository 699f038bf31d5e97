use super::escape_attribute_value;
use crate::encoding::Charset;
use crate::error::TextContentError;

/// An attribute of a start tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute<'r> {
    /// Lowercase.
    name: String,
    value: String,
    /// Source bytes while the attribute is unmodified.
    raw: Option<&'r [u8]>,
}

impl<'r> Attribute<'r> {
    pub(crate) fn from_source(name: &str, value: String, raw: &'r [u8]) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value,
            raw: Some(raw),
        }
    }

    pub(crate) fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value: value.to_string(),
            raw: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.raw = None;
    }

    pub(crate) fn serialize(&self, charset: Charset, out: &mut Vec<u8>) {
        if let Some(raw) = self.raw {
            out.extend_from_slice(raw);
            return;
        }
        charset.encode_into(&self.name, out);
        out.extend_from_slice(b"=\"");
        charset.encode_into(&escape_attribute_value(&self.value), out);
        out.push(b'"');
    }
}

pub(crate) fn validate_attribute_name(name: &str) -> Result<(), TextContentError> {
    if name.is_empty() {
        return Err(TextContentError::EmptyAttributeName);
    }
    match name.chars().find(|&ch| is_forbidden_in_name(ch)) {
        Some(ch) => Err(TextContentError::ForbiddenAttributeNameCharacter(ch)),
        None => Ok(()),
    }
}

pub(crate) fn is_forbidden_in_name(ch: char) -> bool {
    ch.is_ascii_whitespace() || matches!(ch, '"' | '\'' | '<' | '>' | '/' | '=' | '\0')
}
