//! Chunk sinks: where streamed frames go.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Destination for a sequence of self-delimiting binary chunks.
///
/// The controller emits each frame as three chunks (boundary marker,
/// per-frame header, payload) and ends the session with one empty chunk.
/// Anything beyond those byte strings, such as outer HTTP framing, is the
/// sink's concern.
pub trait ChunkSink {
    /// Delivers one chunk. An empty chunk terminates the session.
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;
}

/// Sink that forwards chunks to any [`Write`] implementation and flushes
/// after each one, keeping per-frame latency bounded.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ChunkSink for WriterSink<W> {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.writer.write_all(chunk)?;
        self.writer.flush()
    }
}

/// Sink that records every chunk in memory.
///
/// Clones share the same storage, so a test can hand one handle to the
/// streaming thread and inspect chunks from another.
#[derive(Clone, Default)]
pub struct CollectSink {
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl CollectSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all chunks received so far.
    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of chunks received so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ChunkSink for CollectSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(chunk.to_vec());
        Ok(())
    }
}
