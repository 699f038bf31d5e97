//! User content handlers.
//!
//! Every capability is optional. A missing handler means the matching unit is
//! never constructed and its bytes pass through untouched.

use crate::error::HandlerResult;
use crate::rewritable_units::{Comment, Doctype, Element, TextChunk};

pub type ElementHandler<'h> = Box<dyn FnMut(&mut Element<'_>) -> HandlerResult + 'h>;
pub type CommentHandler<'h> = Box<dyn FnMut(&mut Comment<'_>) -> HandlerResult + 'h>;
pub type TextHandler<'h> = Box<dyn FnMut(&mut TextChunk<'_>) -> HandlerResult + 'h>;
pub type DoctypeHandler<'h> = Box<dyn FnMut(&mut Doctype<'_>) -> HandlerResult + 'h>;

/// Handlers bound to a selector. `comments` and `text` apply to units inside
/// a matched element.
#[derive(Default)]
pub struct ElementContentHandlers<'h> {
    pub(crate) element: Option<ElementHandler<'h>>,
    pub(crate) comments: Option<CommentHandler<'h>>,
    pub(crate) text: Option<TextHandler<'h>>,
}

impl<'h> ElementContentHandlers<'h> {
    pub fn element(mut self, handler: impl FnMut(&mut Element<'_>) -> HandlerResult + 'h) -> Self {
        self.element = Some(Box::new(handler));
        self
    }

    pub fn comments(mut self, handler: impl FnMut(&mut Comment<'_>) -> HandlerResult + 'h) -> Self {
        self.comments = Some(Box::new(handler));
        self
    }

    pub fn text(mut self, handler: impl FnMut(&mut TextChunk<'_>) -> HandlerResult + 'h) -> Self {
        self.text = Some(Box::new(handler));
        self
    }
}

/// Handlers that see every unit of their kind in the document.
#[derive(Default)]
pub struct DocumentContentHandlers<'h> {
    pub(crate) doctype: Option<DoctypeHandler<'h>>,
    pub(crate) comments: Option<CommentHandler<'h>>,
    pub(crate) text: Option<TextHandler<'h>>,
}

impl<'h> DocumentContentHandlers<'h> {
    pub fn doctype(mut self, handler: impl FnMut(&mut Doctype<'_>) -> HandlerResult + 'h) -> Self {
        self.doctype = Some(Box::new(handler));
        self
    }

    pub fn comments(mut self, handler: impl FnMut(&mut Comment<'_>) -> HandlerResult + 'h) -> Self {
        self.comments = Some(Box::new(handler));
        self
    }

    pub fn text(mut self, handler: impl FnMut(&mut TextChunk<'_>) -> HandlerResult + 'h) -> Self {
        self.text = Some(Box::new(handler));
        self
    }
}
