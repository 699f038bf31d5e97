//! Error types surfaced by the rewriter.
//!
//! Every fallible entry point (`HtmlRewriterBuilder::on`, `build`, `write`,
//! `end` and the unit mutation methods) returns `RewritingError`. There is no
//! ambient "last error" state.

use thiserror::Error;

/// Error returned from a user content handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type of user content handlers.
pub type HandlerResult = Result<(), HandlerError>;

#[derive(Error, Debug)]
pub enum RewritingError {
    #[error("unsupported encoding `{label}`: {reason}")]
    UnknownEncoding { label: String, reason: &'static str },

    #[error("input is not valid {encoding} (near byte offset {offset})")]
    InvalidEncodedInput { encoding: &'static str, offset: usize },

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        selector: String,
        reason: SelectorError,
    },

    #[error("invalid text content: {0}")]
    InvalidTextContent(#[from] TextContentError),

    #[error("unexpected end of input {0}")]
    UnexpectedEndOfInput(TruncatedConstruct),

    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    #[error("content handler failed: {0}")]
    ContentHandler(#[source] HandlerError),

    #[error("rewriter was poisoned by an earlier error and accepts no further input")]
    Poisoned,
}

/// Reason a selector string was rejected.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,
    #[error("combinator at offset {0} is not followed by a compound selector")]
    DanglingCombinator(usize),
    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },
    #[error("expected an identifier at offset {0}")]
    ExpectedIdentifier(usize),
    #[error("unterminated attribute selector starting at offset {0}")]
    UnterminatedAttribute(usize),
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("{0} are not supported")]
    Unsupported(&'static str),
}

/// Reason a mutation was refused; the unit stays unmodified.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum TextContentError {
    #[error("tag name must not be empty")]
    EmptyTagName,
    #[error("tag name must start with an ASCII letter, found {0:?}")]
    InvalidTagNameStart(char),
    #[error("tag name contains forbidden character {0:?}")]
    ForbiddenTagNameCharacter(char),
    #[error("attribute name must not be empty")]
    EmptyAttributeName,
    #[error("attribute name contains forbidden character {0:?}")]
    ForbiddenAttributeNameCharacter(char),
    #[error("comment text must not contain `-->`")]
    CommentTerminator,
}

/// Markup construct left open when the stream ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TruncatedConstruct {
    Tag,
    Comment,
    Doctype,
    UnclosedElement(String),
}

impl std::fmt::Display for TruncatedConstruct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TruncatedConstruct::Tag => f.write_str("inside a tag"),
            TruncatedConstruct::Comment => f.write_str("inside a comment"),
            TruncatedConstruct::Doctype => f.write_str("inside a doctype"),
            TruncatedConstruct::UnclosedElement(name) => {
                write!(f, "with element <{name}> still open")
            }
        }
    }
}

impl From<std::collections::TryReserveError> for RewritingError {
    fn from(err: std::collections::TryReserveError) -> Self {
        RewritingError::AllocationFailure(err.to_string())
    }
}
