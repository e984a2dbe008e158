//! Time-ordered annotation event streams.
//!
//! A stream binds one or more named annotators of a record. Read sources
//! are merged into a single globally time-ordered run (ties break in source
//! list order); write sources all receive every written event. Delta
//! continuity is tracked per source, so mixing sources never corrupts the
//! encoding.

use std::io::{BufWriter, Read, Write};
use std::sync::Arc;

use tracing::debug;

use crate::codec::{AnnotationCodec, DeltaState, FIXED_BLOCK_LEN, FIXED_PAD};
use crate::codes::CodeTable;
use crate::error::{RecordError, Result};
use crate::resolve::{ByteSink, RecordResolver, ResourceKind};
use crate::types::{Annotation, AnnotationMode, AnnotationSource};

struct ReadSource {
    codec: AnnotationCodec,
    buf: Vec<u8>,
    pos: usize,
    state: DeltaState,
    pending: Option<Annotation>,
    done: bool,
}

struct WriteSource {
    codec: AnnotationCodec,
    sink: BufWriter<Box<dyn ByteSink>>,
    state: DeltaState,
    fixed: bool,
    seqno: u16,
    bytes_written: u64,
}

/// Sequential reader/writer of [`Annotation`] events
///
/// Obtained from
/// [`RecordSession::open_annotations`](crate::RecordSession::open_annotations).
/// Reading yields events in non-decreasing time order across all read
/// sources; writing requires non-decreasing times and fans out to every
/// write source.
pub struct AnnotationStream {
    record: String,
    readers: Vec<ReadSource>,
    writers: Vec<WriteSource>,
    /// Time of the most recently read or written event
    last_time: u64,
    closed: bool,
}

impl AnnotationStream {
    pub(crate) fn open(
        record: &str,
        sources: Vec<AnnotationSource>,
        resolver: &dyn RecordResolver,
        table: Arc<CodeTable>,
    ) -> Result<Self> {
        let mut readers = Vec::new();
        let mut writers = Vec::new();
        for source in sources {
            let label = format!("{}/{}", record, source.name);
            let codec = AnnotationCodec::new(Arc::clone(&table), label);
            match source.mode {
                AnnotationMode::Read => {
                    let mut input =
                        resolver.source(record, ResourceKind::Annotations(&source.name))?;
                    let mut buf = Vec::new();
                    input.read_to_end(&mut buf)?;
                    readers.push(ReadSource {
                        codec,
                        buf,
                        pos: 0,
                        state: DeltaState::default(),
                        pending: None,
                        done: false,
                    });
                }
                AnnotationMode::Write | AnnotationMode::WriteFixed => {
                    let sink = resolver.sink(record, ResourceKind::Annotations(&source.name))?;
                    writers.push(WriteSource {
                        codec,
                        sink: BufWriter::new(sink),
                        state: DeltaState::default(),
                        fixed: source.mode == AnnotationMode::WriteFixed,
                        seqno: 0,
                        bytes_written: 0,
                    });
                }
            }
        }
        debug!(
            record,
            readers = readers.len(),
            writers = writers.len(),
            "opened annotation stream"
        );
        Ok(AnnotationStream {
            record: record.to_string(),
            readers,
            writers,
            last_time: 0,
            closed: false,
        })
    }

    /// Reads the next event in global time order
    ///
    /// Returns `Ok(None)` once every read source is exhausted; further
    /// calls keep returning `Ok(None)`. Ties between sources resolve in
    /// source list order, and insertion order within one source is
    /// preserved.
    pub fn read(&mut self) -> Result<Option<Annotation>> {
        self.ensure_open()?;
        for reader in &mut self.readers {
            if reader.pending.is_none() && !reader.done {
                match reader.codec.decode(&mut reader.state, &reader.buf, reader.pos)? {
                    Some((ann, consumed)) => {
                        reader.pos += consumed;
                        reader.pending = Some(ann);
                    }
                    None => reader.done = true,
                }
            }
        }

        let mut best: Option<(usize, u64)> = None;
        for (index, reader) in self.readers.iter().enumerate() {
            if let Some(pending) = &reader.pending {
                // strict < keeps the earlier source on ties
                if best.map_or(true, |(_, time)| pending.time < time) {
                    best = Some((index, pending.time));
                }
            }
        }

        match best {
            Some((index, time)) => {
                self.last_time = time;
                Ok(self.readers[index].pending.take())
            }
            None => Ok(None),
        }
    }

    /// Encodes and writes one event to every write-mode source
    ///
    /// Fails with `TimeNotMonotonic` if the event time precedes the
    /// previous one written; the stream owns the previous-time continuity.
    pub fn write(&mut self, ann: &Annotation) -> Result<()> {
        self.ensure_open()?;
        if self.writers.is_empty() {
            return Err(RecordError::NoWriteSource(self.record.clone()));
        }
        for writer in &mut self.writers {
            let bytes = if writer.fixed {
                writer.seqno = writer.seqno.wrapping_add(1);
                writer.codec.encode_fixed(&writer.state, writer.seqno, ann)?
            } else {
                writer.codec.encode(&writer.state, ann)?
            };
            writer.sink.write_all(&bytes)?;
            writer.bytes_written += bytes.len() as u64;
            writer.state.advance(ann);
        }
        self.last_time = ann.time;
        Ok(())
    }

    /// Time of the most recently read or written event
    pub fn position(&self) -> u64 {
        self.last_time
    }

    /// Writes stream terminators, flushes and releases all sources
    ///
    /// Idempotent: closing an already-closed stream is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.readers.clear();
        for index in 0..self.writers.len() {
            if let Err(source) = Self::finish_writer(&mut self.writers[index]) {
                let stream = writer_label(&self.writers[index]);
                self.writers.clear();
                return Err(RecordError::FlushFailed { stream, source });
            }
        }
        self.writers.clear();
        debug!(record = self.record, "closed annotation stream");
        Ok(())
    }

    fn finish_writer(writer: &mut WriteSource) -> std::io::Result<()> {
        if writer.fixed {
            // pad the final block so readers see an unambiguous end
            let tail = writer.bytes_written % FIXED_BLOCK_LEN;
            if tail != 0 {
                let pad = vec![FIXED_PAD; (FIXED_BLOCK_LEN - tail) as usize];
                writer.sink.write_all(&pad)?;
            }
        } else {
            // reserved zero word marks the logical end of the stream
            writer.sink.write_all(&[0, 0])?;
        }
        writer.sink.flush()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(RecordError::ClosedStream(self.record.clone()));
        }
        Ok(())
    }
}

fn writer_label(writer: &WriteSource) -> String {
    writer.codec.label().to_string()
}

impl Drop for AnnotationStream {
    fn drop(&mut self) {
        if !self.closed {
            // best effort: an explicit close() reports flush errors
            for writer in &mut self.writers {
                let _ = Self::finish_writer(writer);
            }
            self.closed = true;
        }
    }
}
