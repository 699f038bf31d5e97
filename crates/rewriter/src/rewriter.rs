//! Builder and streaming lifecycle.

use crate::config::RewriterConfig;
use crate::dispatcher::{DispatchStats, Dispatcher};
use crate::encoding::{Charset, InputValidator};
use crate::error::RewritingError;
use crate::handlers::{DocumentContentHandlers, ElementContentHandlers};
use crate::output::{OutputBuffer, OutputSink};
use crate::selectors::Selector;
use crate::tokenizer::{Tokenizer, TokenizerConfig, TokenizerStats};

/// Collects handler registrations. Consumed by `build`, after which the
/// handler table is fixed.
#[derive(Default)]
pub struct HtmlRewriterBuilder<'h> {
    document: Vec<DocumentContentHandlers<'h>>,
    selectors: Vec<Selector>,
    scoped: Vec<ElementContentHandlers<'h>>,
}

impl<'h> HtmlRewriterBuilder<'h> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register document-wide handlers. Several sets run in registration
    /// order.
    pub fn on_document(&mut self, handlers: DocumentContentHandlers<'h>) -> &mut Self {
        self.document.push(handlers);
        self
    }

    /// Register handlers for elements matching `selector`.
    pub fn on(
        &mut self,
        selector: &str,
        handlers: ElementContentHandlers<'h>,
    ) -> Result<&mut Self, RewritingError> {
        let parsed = selector
            .parse::<Selector>()
            .map_err(|reason| RewritingError::InvalidSelector {
                selector: selector.to_string(),
                reason,
            })?;
        self.selectors.push(parsed);
        self.scoped.push(handlers);
        Ok(self)
    }

    /// Build a rewriter for `encoding` with default settings otherwise.
    pub fn build<O: OutputSink>(
        self,
        encoding: &str,
        sink: O,
    ) -> Result<HtmlRewriter<'h, O>, RewritingError> {
        self.build_with_config(RewriterConfig::with_encoding(encoding), sink)
    }

    pub fn build_with_config<O: OutputSink>(
        self,
        config: RewriterConfig,
        sink: O,
    ) -> Result<HtmlRewriter<'h, O>, RewritingError> {
        let charset = Charset::for_label(&config.encoding)?;
        log::debug!(
            target: "rewriter",
            "building rewriter: encoding={} selectors={} document_handlers={} validate_input={}",
            charset.name(),
            self.selectors.len(),
            self.document.len(),
            config.validate_input
        );
        let output = OutputBuffer::new(sink, config.output_buffer_size);
        let dispatcher = Dispatcher::new(
            charset,
            self.document,
            self.selectors,
            self.scoped,
            output,
            config.strict_end_of_input,
        );
        let tokenizer = Tokenizer::new(TokenizerConfig {
            max_buffered_bytes: config.max_buffered_bytes,
        });
        Ok(HtmlRewriter {
            tokenizer,
            dispatcher,
            validator: config.validate_input.then(|| InputValidator::new(charset)),
            poisoned: false,
        })
    }
}

/// Counters from every pipeline stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewriterStats {
    pub tokenizer: TokenizerStats,
    pub dispatch: DispatchStats,
    pub output_chunks: u64,
}

/// Streaming rewriter. Feed input with `write`, finish with `end`.
///
/// Any error poisons the instance: later calls fail with
/// `RewritingError::Poisoned` and nothing more reaches the sink.
pub struct HtmlRewriter<'h, O: OutputSink> {
    tokenizer: Tokenizer,
    dispatcher: Dispatcher<'h, O>,
    validator: Option<InputValidator>,
    poisoned: bool,
}

impl<'h, O: OutputSink> HtmlRewriter<'h, O> {
    /// Process the next chunk. Chunk boundaries may fall anywhere, including
    /// inside tags and multi-byte characters.
    pub fn write(&mut self, chunk: &[u8]) -> Result<(), RewritingError> {
        if self.poisoned {
            return Err(RewritingError::Poisoned);
        }
        let result = self.write_chunk(chunk);
        self.check(result)
    }

    /// Finish the stream and flush remaining output.
    pub fn end(mut self) -> Result<(), RewritingError> {
        if self.poisoned {
            return Err(RewritingError::Poisoned);
        }
        let result = self.finish();
        self.check(result)?;
        log::debug!(target: "rewriter", "rewrite finished: {:?}", self.stats());
        Ok(())
    }

    pub fn stats(&self) -> RewriterStats {
        RewriterStats {
            tokenizer: self.tokenizer.stats(),
            dispatch: self.dispatcher.stats(),
            output_chunks: self.dispatcher.output_flushes(),
        }
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), RewritingError> {
        if let Some(validator) = self.validator.as_mut() {
            validator.validate(chunk, false)?;
        }
        self.tokenizer.feed(chunk, &mut self.dispatcher)
    }

    fn finish(&mut self) -> Result<(), RewritingError> {
        if let Some(validator) = self.validator.as_mut() {
            validator.validate(&[], true)?;
        }
        self.tokenizer.end(&mut self.dispatcher)?;
        self.dispatcher.flush();
        Ok(())
    }

    fn check(&mut self, result: Result<(), RewritingError>) -> Result<(), RewritingError> {
        if let Err(err) = &result {
            log::debug!(target: "rewriter", "rewriter poisoned: {err}");
            self.poisoned = true;
        }
        result
    }
}

/// Rewrite a complete UTF-8 document in one call.
pub fn rewrite_str(html: &str, builder: HtmlRewriterBuilder<'_>) -> Result<String, RewritingError> {
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = builder.build("utf-8", |chunk: &[u8]| output.extend_from_slice(chunk))?;
    rewriter.write(html.as_bytes())?;
    rewriter.end()?;
    String::from_utf8(output).map_err(|err| RewritingError::InvalidEncodedInput {
        encoding: "UTF-8",
        offset: err.utf8_error().valid_up_to(),
    })
}
