//! Selector syntax and matching.
//!
//! Supported grammar:
//!
//! ```text
//! selector   := compound (combinator compound)*
//! combinator := ws+ | ws* '>' ws*
//! compound   := (tag | '*')? (#id | .class | [attr])*
//! attr       := name ((= | ~= | |= | ^= | $= | *=) (ident | string) ('i')?)?
//! ```
//!
//! Pseudo-classes, selector lists and sibling combinators are rejected.

use crate::error::SelectorError;
use std::str::FromStr;

mod matcher;

pub(crate) use matcher::{AncestorStack, ElementSnapshot, Frame};

/// Index of a selector in registration order.
pub(crate) type SelectorId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttributeOperator {
    /// `[a=v]`
    Equals,
    /// `[a~=v]`: whitespace-separated list contains `v`.
    Includes,
    /// `[a|=v]`: equals `v` or starts with `v-`.
    DashMatch,
    /// `[a^=v]`
    Prefix,
    /// `[a$=v]`
    Suffix,
    /// `[a*=v]`
    Substring,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AttributeSelector {
    /// Lowercase.
    pub(crate) name: String,
    pub(crate) condition: Option<(AttributeOperator, String)>,
    pub(crate) case_insensitive: bool,
}

impl AttributeSelector {
    fn matches(&self, value: &str) -> bool {
        let Some((operator, expected)) = &self.condition else {
            return true;
        };
        let (value, expected) = if self.case_insensitive {
            (value.to_ascii_lowercase(), expected.to_ascii_lowercase())
        } else {
            (value.to_string(), expected.clone())
        };
        match operator {
            AttributeOperator::Equals => value == expected,
            AttributeOperator::Includes => {
                !expected.is_empty() && value.split_ascii_whitespace().any(|item| item == expected)
            }
            AttributeOperator::DashMatch => {
                value == expected
                    || (value.starts_with(expected.as_str())
                        && value.as_bytes().get(expected.len()) == Some(&b'-'))
            }
            AttributeOperator::Prefix => !expected.is_empty() && value.starts_with(&expected),
            AttributeOperator::Suffix => !expected.is_empty() && value.ends_with(&expected),
            AttributeOperator::Substring => !expected.is_empty() && value.contains(&expected),
        }
    }
}

/// One compound selector, e.g. `div.a#b[href]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    /// Lowercase type selector; `None` for `*` or when omitted.
    pub(crate) tag: Option<String>,
    pub(crate) ids: Vec<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attributes: Vec<AttributeSelector>,
}

impl Compound {
    pub(crate) fn matches(&self, element: &ElementSnapshot<'_>) -> bool {
        if let Some(tag) = &self.tag
            && tag != element.name
        {
            return false;
        }
        if !self.ids.is_empty() {
            let Some(id) = element.attribute("id") else {
                return false;
            };
            if self.ids.iter().any(|want| want != id) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let Some(class_list) = element.attribute("class") else {
                return false;
            };
            let has_all = self
                .classes
                .iter()
                .all(|want| class_list.split_ascii_whitespace().any(|c| c == want));
            if !has_all {
                return false;
            }
        }
        self.attributes.iter().all(|selector| {
            element
                .attribute(&selector.name)
                .is_some_and(|value| selector.matches(value))
        })
    }

    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attributes.is_empty()
    }
}

/// A parsed selector: compounds in document order, each joined to the
/// previous one by a combinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    pub(crate) compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` to `compounds[i + 1]`.
    pub(crate) combinators: Vec<Combinator>,
}

impl Selector {
    /// Whether matching needs attribute values, not just the tag name.
    pub(crate) fn uses_attributes(&self) -> bool {
        self.compounds.iter().any(|compound| {
            !compound.ids.is_empty() || !compound.classes.is_empty() || !compound.attributes.is_empty()
        })
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Parser::new(input).parse()
    }
}

struct Parser<'s> {
    input: &'s str,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(input: &'s str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(is_css_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse(mut self) -> Result<Selector, SelectorError> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(SelectorError::Empty);
        }
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let combinator_at = self.pos;
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None => break,
                Some('>') => {
                    self.bump();
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some('+' | '~') => return Err(SelectorError::Unsupported("sibling combinators")),
                Some(',') => return Err(SelectorError::Unsupported("selector lists")),
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(ch) => {
                    return Err(SelectorError::UnexpectedCharacter {
                        ch,
                        offset: self.pos,
                    });
                }
            };
            if self.peek().is_none() {
                return Err(SelectorError::DanglingCombinator(combinator_at));
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(Selector {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut universal = false;
        match self.peek() {
            Some('*') => {
                self.bump();
                universal = true;
            }
            Some(ch) if is_ident_start(ch) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => compound.attributes.push(self.parse_attribute()?),
                Some(':') => return Err(SelectorError::Unsupported("pseudo-classes")),
                _ => break,
            }
        }
        if compound.is_empty() && !universal {
            return Err(match self.peek() {
                Some(',') => SelectorError::Unsupported("selector lists"),
                Some('+' | '~') => SelectorError::Unsupported("sibling combinators"),
                Some(ch) => SelectorError::UnexpectedCharacter {
                    ch,
                    offset: self.pos,
                },
                None => SelectorError::ExpectedIdentifier(self.pos),
            });
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        let mut ident = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\\' {
                self.bump();
                match self.bump() {
                    Some(escaped) => ident.push(escaped),
                    None => return Err(SelectorError::ExpectedIdentifier(self.pos)),
                }
            } else if is_ident_char(ch) {
                self.bump();
                ident.push(ch);
            } else {
                break;
            }
        }
        let escaped_start = self.input[start..].starts_with('\\');
        let valid_start = match ident.chars().next() {
            Some(ch) => escaped_start || is_ident_start(ch) || (ch == '-' && ident.len() > 1),
            None => false,
        };
        if !valid_start {
            return Err(SelectorError::ExpectedIdentifier(start));
        }
        Ok(ident)
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        let open = self.pos;
        self.bump();
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        let operator = match self.bump() {
            Some(']') => {
                return Ok(AttributeSelector {
                    name,
                    condition: None,
                    case_insensitive: false,
                });
            }
            Some('=') => AttributeOperator::Equals,
            Some(ch @ ('~' | '|' | '^' | '$' | '*')) => {
                if self.bump() != Some('=') {
                    return Err(SelectorError::UnterminatedAttribute(open));
                }
                match ch {
                    '~' => AttributeOperator::Includes,
                    '|' => AttributeOperator::DashMatch,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    _ => AttributeOperator::Substring,
                }
            }
            Some(ch) => {
                return Err(SelectorError::UnexpectedCharacter {
                    ch,
                    offset: self.pos - ch.len_utf8(),
                });
            }
            None => return Err(SelectorError::UnterminatedAttribute(open)),
        };
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => self.parse_string(quote)?,
            Some(_) => self.parse_ident()?,
            None => return Err(SelectorError::UnterminatedAttribute(open)),
        };
        self.skip_whitespace();
        let mut case_insensitive = false;
        if matches!(self.peek(), Some('i' | 'I')) {
            self.bump();
            case_insensitive = true;
            self.skip_whitespace();
        }
        if self.bump() != Some(']') {
            return Err(SelectorError::UnterminatedAttribute(open));
        }
        Ok(AttributeSelector {
            name,
            condition: Some((operator, value)),
            case_insensitive,
        })
    }

    fn parse_string(&mut self, quote: char) -> Result<String, SelectorError> {
        let open = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(SelectorError::UnterminatedString(open)),
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(SelectorError::UnterminatedString(open)),
                },
                Some(ch) if ch == quote => return Ok(value),
                Some(ch) => value.push(ch),
            }
        }
    }
}

fn is_css_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || !ch.is_ascii()
}

fn is_ident_char(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit() || ch == '-'
}

#[cfg(test)]
mod tests;
