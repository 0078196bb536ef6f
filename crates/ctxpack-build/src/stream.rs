//! Bounded in-memory pipe for streaming archives.
//!
//! The producer side blocks once `capacity` chunks are queued, so a large
//! context is never buffered whole. An error written by the producer is
//! returned from the reader's next `read` after the data before it.
//! Dropping the reader makes further writes fail with `BrokenPipe`.

use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvError, SyncSender, sync_channel};

use crate::archive;

/// Size of the chunks handed across the pipe.
const CHUNK_SIZE: usize = 64 * 1024;

type Chunk = io::Result<Vec<u8>>;

/// Create a pipe holding at most `capacity` chunks in flight.
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (tx, rx) = sync_channel(capacity.max(1));
    (
        PipeWriter { tx },
        PipeReader {
            rx,
            chunk: Vec::new(),
            pos: 0,
        },
    )
}

/// Write half of [`pipe`]. Clones share the same channel.
#[derive(Clone)]
pub struct PipeWriter {
    tx: SyncSender<Chunk>,
}

impl PipeWriter {
    /// Deliver `err` to the reader after any data already written.
    pub fn close_with_error(self, err: io::Error) {
        if self.tx.send(Err(err)).is_err() {
            tracing::debug!("pipe reader dropped before error could be delivered");
        }
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .send(Ok(buf.to_vec()))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Read half of [`pipe`]. Reports end of stream once every writer is gone.
pub struct PipeReader {
    rx: Receiver<Chunk>,
    chunk: Vec<u8>,
    pos: usize,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.chunk.len() {
            match self.rx.recv() {
                Ok(Ok(chunk)) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                Ok(Err(e)) => return Err(e),
                // every writer dropped: end of stream
                Err(RecvError) => return Ok(0),
            }
        }

        let n = buf.len().min(self.chunk.len() - self.pos);
        buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Stream a tar of `paths` (see [`archive::create_tar`]) from a producer
/// thread. Failures surface as read errors on the returned reader.
pub fn stream_tar(root: PathBuf, paths: Vec<PathBuf>, capacity: usize) -> PipeReader {
    let (writer, reader) = pipe(capacity);

    std::thread::spawn(move || {
        let errors = writer.clone();
        let result = archive::create_tar(BufWriter::with_capacity(CHUNK_SIZE, writer), &root, &paths)
            .and_then(|buffered| {
                buffered.into_inner().map_err(|e| archive::ArchiveError::Finish {
                    source: e.into_error(),
                })
            });

        match result {
            Ok(_) => tracing::debug!(root = %root.display(), entries = paths.len(), "context stream complete"),
            Err(e) => {
                tracing::debug!(root = %root.display(), error = %e, "context stream failed");
                errors.close_with_error(io::Error::other(e));
            }
        }
    });

    reader
}
