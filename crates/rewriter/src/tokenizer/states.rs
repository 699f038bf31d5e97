//! Tokenizer state machine definitions.
//!
//! Every state is resumable: the tokenizer can stop in any of them at a feed
//! boundary and continue once more bytes arrive.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenizerState {
    Data,
    /// Text until `</name` followed by a tag-name terminator.
    RawText(&'static [u8]),
    PlainText,
    TagOpen,
    EndTagOpen,
    TagName,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    AfterAttributeValueQuoted,
    SelfClosingStartTag,
    MarkupDeclarationOpen,
    CommentStart,
    CommentStartDash,
    Comment,
    CommentEndDash,
    CommentEnd,
    CommentEndBang,
    BogusComment,
    Doctype,
    BeforeDoctypeName,
    DoctypeName,
    AfterDoctypeName,
    AfterDoctypeKeyword(DoctypeIdKind),
    DoctypeIdentifier(DoctypeIdKind, u8),
    AfterDoctypeIdentifier(DoctypeIdKind),
    BogusDoctype,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DoctypeIdKind {
    Public,
    System,
}

impl TokenizerState {
    /// Whether a truncated stream in this state leaves unfinished markup.
    pub(crate) fn truncated_construct(self) -> Option<crate::error::TruncatedConstruct> {
        use crate::error::TruncatedConstruct;
        match self {
            TokenizerState::Data
            | TokenizerState::RawText(_)
            | TokenizerState::PlainText
            | TokenizerState::TagOpen
            | TokenizerState::EndTagOpen => None,
            TokenizerState::MarkupDeclarationOpen
            | TokenizerState::CommentStart
            | TokenizerState::CommentStartDash
            | TokenizerState::Comment
            | TokenizerState::CommentEndDash
            | TokenizerState::CommentEnd
            | TokenizerState::CommentEndBang
            | TokenizerState::BogusComment => Some(TruncatedConstruct::Comment),
            TokenizerState::Doctype
            | TokenizerState::BeforeDoctypeName
            | TokenizerState::DoctypeName
            | TokenizerState::AfterDoctypeName
            | TokenizerState::AfterDoctypeKeyword(_)
            | TokenizerState::DoctypeIdentifier(..)
            | TokenizerState::AfterDoctypeIdentifier(_)
            | TokenizerState::BogusDoctype => Some(TruncatedConstruct::Doctype),
            _ => Some(TruncatedConstruct::Tag),
        }
    }
}
