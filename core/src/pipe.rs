//! Bounded in-memory pipe between a body producer and an HTTP consumer.
//!
//! # Design
//! The writer batches bytes into chunks and hands them to the reader over a
//! `sync_channel`, so at most `capacity` chunks are in flight and a slow
//! consumer applies backpressure to the producer. Only `close` is
//! end-of-stream for the reader; `abort`, or dropping the writer without
//! closing it, makes the reader fail, so a consumer never mistakes a
//! truncated body for a complete one. If the reader goes away first, writes
//! fail with `BrokenPipe`.

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};

const CHUNK_SIZE: usize = 16 * 1024;

type Chunk = io::Result<Vec<u8>>;

/// Create a pipe holding at most `capacity` unread chunks.
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (
        PipeWriter {
            tx: Some(tx),
            buf: Vec::with_capacity(CHUNK_SIZE),
        },
        PipeReader {
            rx,
            chunk: Vec::new(),
            pos: 0,
        },
    )
}

/// Producer half.
#[derive(Debug)]
pub struct PipeWriter {
    tx: Option<SyncSender<Chunk>>,
    buf: Vec<u8>,
}

impl PipeWriter {
    fn send(&mut self, chunk: Chunk) -> io::Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))?;
        tx.send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader dropped"))
    }

    /// Flush buffered bytes and signal end-of-stream.
    pub fn close(mut self) -> io::Result<()> {
        self.flush()?;
        self.tx = None;
        Ok(())
    }

    /// Discard buffered bytes and make the reader fail with `err`.
    pub fn abort(mut self, err: io::Error) {
        self.buf.clear();
        // The reader may already be gone; nothing left to tell it then.
        let _ = self.send(Err(err));
        self.tx = None;
    }
}

impl Write for PipeWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.buf.len() >= CHUNK_SIZE {
            self.flush()?;
        }
        let take = data.len().min(CHUNK_SIZE - self.buf.len());
        self.buf.extend_from_slice(&data[..take]);
        Ok(take)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buf, Vec::with_capacity(CHUNK_SIZE));
        self.send(Ok(chunk))
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        if self.tx.is_some() {
            self.buf.clear();
            let _ = self.send(Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "pipe writer dropped before close",
            )));
        }
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct PipeReader {
    rx: Receiver<Chunk>,
    chunk: Vec<u8>,
    pos: usize,
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.chunk.len() {
            match self.rx.recv() {
                Ok(Ok(chunk)) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                Ok(Err(err)) => return Err(err),
                // Writer gone: end of stream.
                Err(_) => return Ok(0),
            }
        }
        let n = out.len().min(self.chunk.len() - self.pos);
        out[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
