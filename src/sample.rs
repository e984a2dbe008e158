//! Multiplexed sample stream over a record's interleaved data.
//!
//! On disk a record is a flat run of frames: one little-endian `i16` per
//! channel in catalog order, no framing bytes. The stream reads and writes
//! whole frames and maps a configurable logical time base onto the native
//! frame rate with a sample-and-hold policy (nearest native sample, no
//! interpolation).

use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::SignalCatalog;
use crate::error::{RecordError, Result};
use crate::resolve::{ByteSink, ByteSource};
use crate::types::{SampleFrame, StreamMode};

/// Bytes per stored sample
const SAMPLE_WIDTH: u64 = 2;

/// Sequential, seekable reader/writer of [`SampleFrame`]s
///
/// Obtained from [`RecordSession::open_signals`](crate::RecordSession::open_signals).
/// One instance owns its cursor exclusively; concurrent use from multiple
/// threads must be serialized by the caller.
///
/// Reading past the end of the data yields `Ok(None)` on every call, never
/// an error.
pub struct SampleStream {
    catalog: Arc<SignalCatalog>,
    mode: StreamMode,
    reader: Option<BufReader<Box<dyn ByteSource>>>,
    writer: Option<BufWriter<Box<dyn ByteSink>>>,
    /// Bound channel count, a prefix of the catalog order
    channels: usize,
    /// Total frames available (read) or written so far (write)
    frames: u64,
    logical_frequency: f64,
    /// Cursor in logical ticks
    cursor: u64,
    closed: bool,
}

impl SampleStream {
    pub(crate) fn open_read(
        catalog: Arc<SignalCatalog>,
        channels: usize,
        source: Box<dyn ByteSource>,
    ) -> Result<Self> {
        let mut reader = BufReader::new(source);
        let stride = catalog.len() as u64 * SAMPLE_WIDTH;
        let derived = reader.seek(SeekFrom::End(0))? / stride;
        reader.seek(SeekFrom::Start(0))?;
        // a header may promise more frames than the data actually holds
        let frames = if catalog.frames() > 0 {
            if derived < catalog.frames() {
                warn!(
                    record = catalog.record(),
                    declared = catalog.frames(),
                    derived,
                    "header declares more frames than the data holds"
                );
            }
            catalog.frames().min(derived)
        } else {
            derived
        };
        debug!(
            record = catalog.record(),
            channels, frames, "opened sample stream for reading"
        );
        Ok(SampleStream {
            logical_frequency: catalog.frame_frequency(),
            catalog,
            mode: StreamMode::Read,
            reader: Some(reader),
            writer: None,
            channels,
            frames,
            cursor: 0,
            closed: false,
        })
    }

    pub(crate) fn open_write(
        catalog: Arc<SignalCatalog>,
        channels: usize,
        sink: Box<dyn ByteSink>,
    ) -> Result<Self> {
        debug!(
            record = catalog.record(),
            channels, "opened sample stream for writing"
        );
        Ok(SampleStream {
            logical_frequency: catalog.frame_frequency(),
            catalog,
            mode: StreamMode::Write,
            reader: None,
            writer: Some(BufWriter::new(sink)),
            channels,
            frames: 0,
            cursor: 0,
            closed: false,
        })
    }

    /// Sets the logical frequency governing `seek`, `read` and `write`
    ///
    /// The default is the catalog frame frequency (the fastest native
    /// channel rate). The current cursor is rescaled so it keeps pointing
    /// at the same instant.
    pub fn set_logical_frequency(&mut self, frequency: f64) -> Result<()> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(RecordError::InvalidFrequency(frequency));
        }
        self.cursor = (self.cursor as f64 * frequency / self.logical_frequency).round() as u64;
        self.logical_frequency = frequency;
        Ok(())
    }

    pub fn logical_frequency(&self) -> f64 {
        self.logical_frequency
    }

    /// Current cursor position in logical ticks
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Number of channels each frame carries
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Frames available for reading, or written so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Repositions the cursor to `time` logical ticks
    ///
    /// Fails with `SeekOutOfRange` if the target lies beyond the underlying
    /// data. Seeking to 0 always succeeds on a non-empty stream.
    pub fn seek(&mut self, time: u64) -> Result<()> {
        self.ensure_open()?;
        match self.mode {
            StreamMode::Read => {
                let target = self.base_frame(time);
                if target >= self.frames {
                    return Err(self.out_of_range(time));
                }
            }
            // the write side is append-only; only the current position is valid
            StreamMode::Write => {
                if time != self.cursor {
                    return Err(self.out_of_range(time));
                }
            }
        }
        self.cursor = time;
        Ok(())
    }

    /// Reads the frame at the cursor and advances one logical tick
    ///
    /// Returns `Ok(None)` once the cursor maps past the last frame; further
    /// calls keep returning `Ok(None)`.
    ///
    /// When the logical frequency is below a channel's native rate, the
    /// nearest native sample is selected for each logical instant; decoded
    /// samples are reused, never interpolated.
    pub fn read(&mut self) -> Result<Option<SampleFrame>> {
        self.ensure_open()?;
        if self.mode != StreamMode::Read {
            return Err(RecordError::ModeMismatch {
                stream: self.catalog.record().to_string(),
                needed: "reading",
            });
        }
        if self.base_frame(self.cursor) >= self.frames {
            return Ok(None);
        }
        let stride = self.catalog.len() as u64 * SAMPLE_WIDTH;
        let mut samples = Vec::with_capacity(self.channels);
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| RecordError::ModeMismatch {
                stream: self.catalog.record().to_string(),
                needed: "reading",
            })?;
        for channel in 0..self.channels {
            let frame = channel_frame(
                &self.catalog,
                self.cursor,
                self.logical_frequency,
                channel,
            )
            .min(self.frames - 1);
            reader.seek(SeekFrom::Start(
                frame * stride + channel as u64 * SAMPLE_WIDTH,
            ))?;
            let mut buf = [0u8; 2];
            reader.read_exact(&mut buf)?;
            samples.push(i16::from_le_bytes(buf) as i32);
        }
        self.cursor += 1;
        Ok(Some(SampleFrame::new(samples)))
    }

    /// Appends a frame at the cursor and advances one logical tick
    ///
    /// Sample values outside the stored 16-bit range saturate.
    pub fn write(&mut self, frame: &SampleFrame) -> Result<()> {
        self.ensure_open()?;
        if frame.len() != self.channels {
            return Err(RecordError::ChannelCountMismatch {
                record: self.catalog.record().to_string(),
                got: frame.len(),
                expected: self.channels,
            });
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| RecordError::ModeMismatch {
                stream: self.catalog.record().to_string(),
                needed: "writing",
            })?;
        for &sample in frame.samples() {
            let clipped = sample.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            writer.write_all(&clipped.to_le_bytes())?;
        }
        self.frames += 1;
        self.cursor += 1;
        Ok(())
    }

    /// Flushes pending writes and releases the underlying handles
    ///
    /// Idempotent: closing an already-closed stream is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.reader = None;
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|source| RecordError::FlushFailed {
                stream: self.catalog.record().to_string(),
                source,
            })?;
        }
        debug!(record = self.catalog.record(), "closed sample stream");
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(RecordError::ClosedStream(
                self.catalog.record().to_string(),
            ));
        }
        Ok(())
    }

    /// Frame index at the catalog frame rate for a logical tick
    fn base_frame(&self, tick: u64) -> u64 {
        (tick as f64 * self.catalog.frame_frequency() / self.logical_frequency).round() as u64
    }

    fn out_of_range(&self, target: u64) -> RecordError {
        RecordError::SeekOutOfRange {
            record: self.catalog.record().to_string(),
            target,
            frames: self.frames,
        }
    }
}

/// Nearest native sample for `channel` at a logical tick, expressed as a
/// frame index
fn channel_frame(catalog: &SignalCatalog, tick: u64, logical: f64, channel: usize) -> u64 {
    let frame_freq = catalog.frame_frequency();
    let native_freq = catalog.signals()[channel].frequency;
    if native_freq == frame_freq {
        return (tick as f64 * frame_freq / logical).round() as u64;
    }
    let native = (tick as f64 * native_freq / logical).round();
    (native * frame_freq / native_freq).round() as u64
}

impl Drop for SampleStream {
    fn drop(&mut self) {
        if !self.closed {
            if let Some(mut writer) = self.writer.take() {
                // best effort: an explicit close() reports flush errors
                let _ = writer.flush();
            }
        }
    }
}
