//! Token dispatch: matching, handler invocation and serialization.
//!
//! The dispatcher is the tokenizer's sink. For every lexeme it decides
//! whether any handler can apply; if none can, the raw bytes go straight to
//! the output buffer without decoding.
//!
//! Ordering for comments and text: document handlers first (registration
//! order), then selector handlers of every open element, outermost first and
//! registration order within an element. A selector handler runs at most
//! once per unit.

use crate::encoding::Charset;
use crate::error::{HandlerError, RewritingError, TruncatedConstruct};
use crate::handlers::{DocumentContentHandlers, ElementContentHandlers};
use crate::html;
use crate::output::{OutputBuffer, OutputSink};
use crate::rewritable_units::{
    Attribute, Comment, Doctype, Element, EndTag, EndTagPlan, TextChunk,
};
use crate::selectors::{AncestorStack, ElementSnapshot, Frame, Selector, SelectorId};
use crate::tokenizer::{AttributeOutline, Lexeme, Span, TokenOutline, TokenSink};
use std::borrow::Cow;

/// Per-element state kept until the element closes.
#[derive(Debug, Default)]
pub(crate) struct OpenElement {
    plan: EndTagPlan,
    /// Matched selectors with a text handler.
    text_handlers: usize,
    /// Matched selectors with a comment handler.
    comment_handlers: usize,
}

/// Counters reported through `HtmlRewriter::stats`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub elements_matched: u64,
    pub units_constructed: u64,
    pub passthrough_lexemes: u64,
    pub implicitly_closed: u64,
}

pub(crate) struct Dispatcher<'h, O: OutputSink> {
    charset: Charset,
    document: Vec<DocumentContentHandlers<'h>>,
    scoped: Vec<ElementContentHandlers<'h>>,
    stack: AncestorStack<OpenElement>,
    output: OutputBuffer<O>,
    document_text: bool,
    document_comments: bool,
    document_doctype: bool,
    /// Text handlers of selectors matched on open elements.
    active_text: usize,
    active_comments: usize,
    strict_end_of_input: bool,
    visited: Vec<bool>,
    order: Vec<SelectorId>,
    scratch: Vec<u8>,
    stats: DispatchStats,
}

impl<'h, O: OutputSink> Dispatcher<'h, O> {
    pub(crate) fn new(
        charset: Charset,
        document: Vec<DocumentContentHandlers<'h>>,
        selectors: Vec<Selector>,
        scoped: Vec<ElementContentHandlers<'h>>,
        output: OutputBuffer<O>,
        strict_end_of_input: bool,
    ) -> Self {
        debug_assert_eq!(selectors.len(), scoped.len(), "one handler set per selector");
        let document_text = document.iter().any(|handlers| handlers.text.is_some());
        let document_comments = document.iter().any(|handlers| handlers.comments.is_some());
        let document_doctype = document.iter().any(|handlers| handlers.doctype.is_some());
        let visited = vec![false; selectors.len()];
        Self {
            charset,
            document,
            scoped,
            stack: AncestorStack::new(selectors),
            output,
            document_text,
            document_comments,
            document_doctype,
            active_text: 0,
            active_comments: 0,
            strict_end_of_input,
            visited,
            order: Vec::new(),
            scratch: Vec::new(),
            stats: DispatchStats::default(),
        }
    }

    pub(crate) fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub(crate) fn output_flushes(&self) -> u64 {
        self.output.flushes()
    }

    /// Hand everything still buffered to the sink.
    pub(crate) fn flush(&mut self) {
        self.output.flush();
    }

    fn passthrough(&mut self, lexeme: &Lexeme<'_>) {
        self.stats.passthrough_lexemes = self.stats.passthrough_lexemes.saturating_add(1);
        self.output.write(lexeme.raw());
    }

    fn handle_start_tag(
        &mut self,
        lexeme: &Lexeme<'_>,
        name: Span,
        attrs: &[AttributeOutline],
        self_closing: bool,
    ) -> Result<(), RewritingError> {
        let name_bytes = lexeme.part(name).to_ascii_lowercase();
        let can_have_content = !self_closing && !html::is_void_element(&name_bytes);

        let mut element_parts = None;
        if self.stack.has_selectors() {
            let tag_name = self.charset.decode(&name_bytes, name.start)?.into_owned();
            let attributes = if self.stack.needs_attributes() {
                self.decode_attributes(lexeme, attrs)?
            } else {
                Vec::new()
            };
            let snapshot = ElementSnapshot {
                name: &tag_name,
                attributes: &attributes,
            };
            self.stack.push(
                name_bytes.into_boxed_slice(),
                Some(&snapshot),
                OpenElement::default(),
            );
            element_parts = Some((tag_name, attributes));
        } else {
            self.stack
                .push(name_bytes.into_boxed_slice(), None, OpenElement::default());
        }

        let plan = match element_parts {
            Some((tag_name, attributes)) if self.has_element_handlers() => {
                let attributes = if attributes.is_empty() && !attrs.is_empty() {
                    self.decode_attributes(lexeme, attrs)?
                } else {
                    attributes
                };
                let element = Element::new(
                    self.charset,
                    lexeme.raw(),
                    tag_name,
                    attributes,
                    self_closing,
                    can_have_content,
                );
                self.run_element_handlers(element)?
            }
            _ => {
                self.passthrough(lexeme);
                EndTagPlan::default()
            }
        };

        if can_have_content {
            self.open_element(plan);
        } else {
            // Void and self-closing elements close with their start tag.
            self.stack.pop();
            self.output.write(&plan.after);
        }
        Ok(())
    }

    fn has_element_handlers(&self) -> bool {
        self.stack.frames().last().is_some_and(|frame| {
            frame
                .matched
                .iter()
                .any(|&id| self.scoped[id].element.is_some())
        })
    }

    fn decode_attributes<'i>(
        &self,
        lexeme: &Lexeme<'i>,
        attrs: &[AttributeOutline],
    ) -> Result<Vec<Attribute<'i>>, RewritingError> {
        let mut attributes = Vec::with_capacity(attrs.len());
        for outline in attrs {
            let name = self.charset.decode(lexeme.part(outline.name), outline.name.start)?;
            let value = self
                .charset
                .decode(lexeme.part(outline.value), outline.value.start)?;
            attributes.push(Attribute::from_source(
                &name,
                value.into_owned(),
                lexeme.part(outline.raw),
            ));
        }
        Ok(attributes)
    }

    fn run_element_handlers(&mut self, mut element: Element<'_>) -> Result<EndTagPlan, RewritingError> {
        self.stats.units_constructed = self.stats.units_constructed.saturating_add(1);
        self.stats.elements_matched = self.stats.elements_matched.saturating_add(1);
        let Some(frame) = self.stack.frames().last() else {
            return Ok(EndTagPlan::default());
        };
        for &id in &frame.matched {
            if let Some(handler) = self.scoped[id].element.as_mut() {
                handler(&mut element).map_err(handler_failed)?;
            }
        }
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "rewriter.dispatcher",
            "element <{}> handled, removed={}",
            element.tag_name(),
            element.is_removed()
        );
        self.scratch.clear();
        let plan = element.finish(&mut self.scratch);
        self.output.write(&self.scratch);
        Ok(plan)
    }

    /// Record the end-tag plan and activate scoped handlers of the element
    /// on top of the stack.
    fn open_element(&mut self, plan: EndTagPlan) {
        if plan.suppress_children {
            self.output.suppress();
        }
        let scoped = &self.scoped;
        let Some(frame) = self.stack.top_mut() else {
            return;
        };
        let text_handlers = frame
            .matched
            .iter()
            .filter(|&&id| scoped[id].text.is_some())
            .count();
        let comment_handlers = frame
            .matched
            .iter()
            .filter(|&&id| scoped[id].comments.is_some())
            .count();
        frame.data = OpenElement {
            plan,
            text_handlers,
            comment_handlers,
        };
        self.active_text += text_handlers;
        self.active_comments += comment_handlers;
    }

    /// Write the deferred output of a closing element. `end_tag` is the
    /// source end tag, absent for implicitly closed elements.
    fn close_element(&mut self, frame: Frame<OpenElement>, end_tag: Option<&[u8]>) {
        let OpenElement {
            plan,
            text_handlers,
            comment_handlers,
        } = frame.data;
        self.active_text -= text_handlers;
        self.active_comments -= comment_handlers;
        if plan.suppress_children {
            self.output.unsuppress();
        }
        self.output.write(&plan.append);
        if let Some(raw) = end_tag {
            match &plan.end_tag {
                EndTag::Keep => self.output.write(raw),
                EndTag::Rename(renamed) => self.output.write(renamed),
                EndTag::Drop => {}
            }
        }
        self.output.write(&plan.after);
    }

    fn handle_end_tag(&mut self, lexeme: &Lexeme<'_>, name: Span) {
        let name = lexeme.part(name).to_ascii_lowercase();
        let Some(index) = self.stack.find_open(&name) else {
            #[cfg(any(test, feature = "debug-stats"))]
            log::trace!(
                target: "rewriter.dispatcher",
                "stray end tag @{}",
                lexeme.raw_span().start
            );
            self.passthrough(lexeme);
            return;
        };
        while self.stack.frames().len() > index + 1 {
            if let Some(frame) = self.stack.pop() {
                self.stats.implicitly_closed = self.stats.implicitly_closed.saturating_add(1);
                self.close_element(frame, None);
            }
        }
        if let Some(frame) = self.stack.pop() {
            self.close_element(frame, Some(lexeme.raw()));
        }
    }

    fn handle_eof(&mut self) -> Result<(), RewritingError> {
        if self.strict_end_of_input
            && let Some(frame) = self
                .stack
                .frames()
                .iter()
                .rev()
                .find(|frame| !html::has_optional_end_tag(&frame.name))
        {
            let name = String::from_utf8_lossy(&frame.name).into_owned();
            log::debug!(target: "rewriter.dispatcher", "element <{name}> still open at end of input");
            return Err(RewritingError::UnexpectedEndOfInput(
                TruncatedConstruct::UnclosedElement(name),
            ));
        }
        while let Some(frame) = self.stack.pop() {
            self.stats.implicitly_closed = self.stats.implicitly_closed.saturating_add(1);
            self.close_element(frame, None);
        }
        debug_assert!(!self.output.is_suppressed(), "suppression outlived its element");
        Ok(())
    }

    /// Collect selector handlers that apply to a unit at the current depth.
    fn collect_scoped(&mut self, wants: fn(&ElementContentHandlers<'h>) -> bool) {
        self.order.clear();
        for frame in self.stack.frames() {
            for &id in &frame.matched {
                if !self.visited[id] && wants(&self.scoped[id]) {
                    self.visited[id] = true;
                    self.order.push(id);
                }
            }
        }
        for &id in &self.order {
            self.visited[id] = false;
        }
    }

    fn handle_comment(&mut self, lexeme: &Lexeme<'_>, text: Span) -> Result<(), RewritingError> {
        if !self.document_comments && self.active_comments == 0 {
            self.passthrough(lexeme);
            return Ok(());
        }
        let decoded = self.charset.decode(lexeme.part(text), text.start)?;
        let mut comment = Comment::new(self.charset, decoded.into_owned(), lexeme.raw());
        self.stats.units_constructed = self.stats.units_constructed.saturating_add(1);

        for handlers in &mut self.document {
            if let Some(handler) = handlers.comments.as_mut() {
                handler(&mut comment).map_err(handler_failed)?;
            }
        }
        if self.active_comments > 0 {
            self.collect_scoped(|handlers| handlers.comments.is_some());
            for &id in &self.order {
                if let Some(handler) = self.scoped[id].comments.as_mut() {
                    handler(&mut comment).map_err(handler_failed)?;
                }
            }
        }
        self.scratch.clear();
        comment.serialize(&mut self.scratch);
        self.output.write(&self.scratch);
        Ok(())
    }

    /// Returns the number of raw bytes consumed. A chunk that is not the
    /// last of its text node may leave a split character for later.
    fn handle_text(&mut self, lexeme: &Lexeme<'_>, last: bool) -> Result<usize, RewritingError> {
        let raw = lexeme.raw();
        if !self.document_text && self.active_text == 0 {
            self.passthrough(lexeme);
            return Ok(raw.len());
        }
        let offset = lexeme.raw_span().start;
        let (text, consumed) = if last {
            (self.charset.decode(raw, offset)?, raw.len())
        } else {
            self.charset.decode_complete_prefix(raw, offset)?
        };
        if consumed == 0 && !last {
            return Ok(0);
        }
        let mut chunk = TextChunk::new(self.charset, text, &raw[..consumed], last);
        self.stats.units_constructed = self.stats.units_constructed.saturating_add(1);

        for handlers in &mut self.document {
            if let Some(handler) = handlers.text.as_mut() {
                handler(&mut chunk).map_err(handler_failed)?;
            }
        }
        if self.active_text > 0 {
            self.collect_scoped(|handlers| handlers.text.is_some());
            for &id in &self.order {
                if let Some(handler) = self.scoped[id].text.as_mut() {
                    handler(&mut chunk).map_err(handler_failed)?;
                }
            }
        }
        self.scratch.clear();
        chunk.serialize(&mut self.scratch);
        self.output.write(&self.scratch);
        Ok(consumed)
    }

    fn handle_doctype(
        &mut self,
        lexeme: &Lexeme<'_>,
        fields: [Option<Span>; 3],
        force_quirks: bool,
    ) -> Result<(), RewritingError> {
        if !self.document_doctype {
            self.passthrough(lexeme);
            return Ok(());
        }
        let [name, public_id, system_id] = fields.map(|span| {
            span.map(|span| self.charset.decode(lexeme.part(span), span.start))
                .transpose()
                .map(|text| text.map(Cow::into_owned))
        });
        let mut doctype = Doctype::new(
            self.charset,
            name?,
            public_id?,
            system_id?,
            force_quirks,
            lexeme.raw(),
        );
        self.stats.units_constructed = self.stats.units_constructed.saturating_add(1);
        for handlers in &mut self.document {
            if let Some(handler) = handlers.doctype.as_mut() {
                handler(&mut doctype).map_err(handler_failed)?;
            }
        }
        self.scratch.clear();
        doctype.serialize(&mut self.scratch);
        self.output.write(&self.scratch);
        Ok(())
    }
}

impl<O: OutputSink> TokenSink for Dispatcher<'_, O> {
    fn handle_lexeme(&mut self, lexeme: &Lexeme<'_>) -> Result<(), RewritingError> {
        match lexeme.token() {
            TokenOutline::StartTag {
                name,
                attrs,
                self_closing,
            } => self.handle_start_tag(lexeme, *name, attrs, *self_closing),
            TokenOutline::EndTag { name } => {
                self.handle_end_tag(lexeme, *name);
                Ok(())
            }
            TokenOutline::Comment { text } => self.handle_comment(lexeme, *text),
            TokenOutline::Text { last_in_text_node } => {
                self.handle_text(lexeme, *last_in_text_node).map(|_| ())
            }
            TokenOutline::Doctype {
                name,
                public_id,
                system_id,
                force_quirks,
            } => self.handle_doctype(lexeme, [*name, *public_id, *system_id], *force_quirks),
            TokenOutline::Eof => self.handle_eof(),
        }
    }

    fn handle_text_chunk(&mut self, lexeme: &Lexeme<'_>) -> Result<usize, RewritingError> {
        self.handle_text(lexeme, false)
    }
}

fn handler_failed(err: HandlerError) -> RewritingError {
    log::debug!(target: "rewriter.dispatcher", "content handler failed: {err}");
    RewritingError::ContentHandler(err)
}

#[cfg(test)]
mod tests;
