//! Bounded output buffer in front of the user sink.

/// Receiver of rewritten output. Chunks arrive in document order and are
/// only valid for the duration of the call.
pub trait OutputSink {
    fn handle_chunk(&mut self, chunk: &[u8]);
}

impl<F: FnMut(&[u8])> OutputSink for F {
    fn handle_chunk(&mut self, chunk: &[u8]) {
        self(chunk)
    }
}

pub(crate) struct OutputBuffer<O: OutputSink> {
    sink: O,
    buffer: Vec<u8>,
    capacity: usize,
    /// Nesting depth of regions whose output is discarded.
    suppressed: usize,
    flushes: u64,
}

impl<O: OutputSink> OutputBuffer<O> {
    /// `capacity == 0` forwards every write immediately.
    pub(crate) fn new(sink: O, capacity: usize) -> Self {
        Self {
            sink,
            buffer: Vec::with_capacity(capacity),
            capacity,
            suppressed: 0,
            flushes: 0,
        }
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) {
        if self.suppressed > 0 || bytes.is_empty() {
            return;
        }
        if self.buffer.len() + bytes.len() <= self.capacity {
            self.buffer.extend_from_slice(bytes);
            if self.buffer.len() == self.capacity {
                self.flush();
            }
            return;
        }
        self.flush();
        if bytes.len() >= self.capacity {
            self.flushes = self.flushes.saturating_add(1);
            self.sink.handle_chunk(bytes);
        } else {
            self.buffer.extend_from_slice(bytes);
        }
    }

    pub(crate) fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.flushes = self.flushes.saturating_add(1);
        self.sink.handle_chunk(&self.buffer);
        self.buffer.clear();
    }

    pub(crate) fn suppress(&mut self) {
        self.suppressed += 1;
    }

    pub(crate) fn unsuppress(&mut self) {
        debug_assert!(self.suppressed > 0, "unbalanced output suppression");
        self.suppressed = self.suppressed.saturating_sub(1);
    }

    pub(crate) fn is_suppressed(&self) -> bool {
        self.suppressed > 0
    }

    /// Number of chunks handed to the sink so far.
    pub(crate) fn flushes(&self) -> u64 {
        self.flushes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(chunks: &mut Vec<Vec<u8>>) -> impl FnMut(&[u8]) + '_ {
        move |chunk: &[u8]| chunks.push(chunk.to_vec())
    }

    #[test]
    fn small_writes_are_coalesced() {
        let mut chunks = Vec::new();
        let mut output = OutputBuffer::new(recorder(&mut chunks), 4);
        output.write(b"ab");
        output.write(b"c");
        assert_eq!(output.flushes(), 0);
        output.write(b"de");
        output.write(b"f");
        output.flush();
        output.flush();
        assert_eq!(output.flushes(), 2);
        drop(output);
        assert_eq!(chunks, vec![b"abc".to_vec(), b"def".to_vec()]);
    }

    #[test]
    fn large_writes_bypass_the_buffer() {
        let mut chunks = Vec::new();
        let mut output = OutputBuffer::new(recorder(&mut chunks), 4);
        output.write(b"a");
        output.write(b"0123456789");
        output.write(b"b");
        output.flush();
        drop(output);
        assert_eq!(
            chunks,
            vec![b"a".to_vec(), b"0123456789".to_vec(), b"b".to_vec()]
        );
    }

    #[test]
    fn zero_capacity_forwards_every_write() {
        let mut chunks = Vec::new();
        let mut output = OutputBuffer::new(recorder(&mut chunks), 0);
        output.write(b"a");
        output.write(b"");
        output.write(b"b");
        drop(output);
        assert_eq!(chunks, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn suppressed_regions_nest() {
        let mut chunks = Vec::new();
        let mut output = OutputBuffer::new(recorder(&mut chunks), 0);
        output.write(b"1");
        output.suppress();
        output.suppress();
        output.write(b"x");
        output.unsuppress();
        assert!(output.is_suppressed());
        output.write(b"y");
        output.unsuppress();
        output.write(b"2");
        drop(output);
        assert_eq!(chunks, vec![b"1".to_vec(), b"2".to_vec()]);
    }
}
