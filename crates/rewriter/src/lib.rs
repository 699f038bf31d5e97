//! Streaming HTML rewriter.
//!
//! Input is tokenized incrementally, matched against selectors on the stack
//! of open elements and handed to user handlers as short-lived content units.
//! Everything no handler touches is copied to the output byte for byte.
//!
//! ```
//! use rewriter::{ContentType, ElementContentHandlers, HtmlRewriterBuilder, rewrite_str};
//!
//! let mut builder = HtmlRewriterBuilder::new();
//! builder
//!     .on(
//!         "a[href]",
//!         ElementContentHandlers::default().element(|el| {
//!             el.set_attribute("rel", "noopener")?;
//!             el.before("[", ContentType::Text);
//!             Ok(())
//!         }),
//!     )
//!     .unwrap();
//! let html = rewrite_str("<p><a href=/x>x</a></p>", builder).unwrap();
//! assert_eq!(html, "<p>[<a href=/x rel=\"noopener\">x</a></p>");
//! ```

pub mod config;
pub mod encoding;
pub mod error;
pub mod tokenizer;

mod dispatcher;
mod handlers;
mod html;
mod output;
mod rewritable_units;
mod rewriter;
mod selectors;

pub use crate::config::RewriterConfig;
pub use crate::dispatcher::DispatchStats;
pub use crate::error::{
    HandlerError, HandlerResult, RewritingError, SelectorError, TextContentError,
    TruncatedConstruct,
};
pub use crate::handlers::{
    CommentHandler, DoctypeHandler, DocumentContentHandlers, ElementContentHandlers,
    ElementHandler, TextHandler,
};
pub use crate::output::OutputSink;
pub use crate::rewritable_units::{Attribute, Comment, ContentType, Doctype, Element, TextChunk};
pub use crate::rewriter::{HtmlRewriter, HtmlRewriterBuilder, RewriterStats, rewrite_str};
pub use crate::selectors::Selector;
