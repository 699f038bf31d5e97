//! Rewriter configuration.

/// Default size of the output buffer before it is flushed to the sink.
pub const DEFAULT_OUTPUT_BUFFER_SIZE: usize = 8 * 1024;

/// Default cap on bytes the tokenizer may retain for a single unfinished
/// construct (an unterminated tag, comment or doctype).
pub const DEFAULT_MAX_BUFFERED_BYTES: usize = 4 * 1024 * 1024;

/// Configuration for an `HtmlRewriter`.
#[derive(Clone, Debug)]
pub struct RewriterConfig {
    /// Encoding label (WHATWG Encoding Standard), e.g. `utf-8` or
    /// `windows-1251`. Only ASCII-compatible encodings are accepted.
    pub encoding: String,
    /// Output is handed to the sink once this many bytes are pending.
    /// `0` forwards every write immediately.
    pub output_buffer_size: usize,
    /// Upper bound for the tokenizer's retained input. Exceeding it fails
    /// with `AllocationFailure`.
    pub max_buffered_bytes: usize,
    /// Decode every input chunk up front and fail on malformed byte
    /// sequences, even where no handler needs the decoded text.
    pub validate_input: bool,
    /// Treat elements whose end tag is required but still open at `end()`
    /// as truncated input.
    pub strict_end_of_input: bool,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            encoding: "utf-8".to_string(),
            output_buffer_size: DEFAULT_OUTPUT_BUFFER_SIZE,
            max_buffered_bytes: DEFAULT_MAX_BUFFERED_BYTES,
            validate_input: true,
            strict_end_of_input: true,
        }
    }
}

impl RewriterConfig {
    pub fn with_encoding(label: &str) -> Self {
        Self {
            encoding: label.to_string(),
            ..Self::default()
        }
    }
}
